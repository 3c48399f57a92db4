//! # CLI Behavior
//!
//! This is **one possible UI client** for fittrack, not the application itself.
//! The CLI is the only place that knows about terminal I/O, exit codes and
//! output formatting.
//!
//! ## Naked Execution
//!
//! Running `fittrack` with no arguments lists the last week of activities.
//!
//! ## Referring to Records
//!
//! Listings number their rows. `fittrack edit 2` and `fittrack delete 2` act on
//! the second row of `fittrack list`; `fittrack weight delete 1` on the first
//! row of `fittrack weight list`. A `#` prefix selects by storage id instead
//! (`fittrack delete #42`, or a UUID with the file backend), as printed by
//! `--ids`.
//!
//! ## Sessions
//!
//! With the SQLite backend, `fittrack login` stores the username and a remember
//! token in `session.json` inside the data directory. Every later command
//! re-authenticates with that token. `fittrack logout` revokes it.
//!
//! ## Module Structure
//!
//! - `commands`: dispatch and per-command handlers
//! - `render`: output formatting (listings, colors, messages)
//! - `session`: the login session file
//! - `setup`: argument parsing via clap

mod commands;
mod render;
mod session;
pub mod setup;

pub use commands::run;
