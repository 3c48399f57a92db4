//! # Fittrack CLI
//!
//! The binary is intentionally thin: the CLI lives in `src/cli/`, while this
//! file only invokes `cli::run()` and handles process termination.
//!
//! ## Workspace Structure
//!
//! - `crates/fittrackapp/`: the storage library (JSON files or SQLite)
//! - `crates/fittrack/`: this CLI tool, one client of that library
//!
//! ## Layering
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (crates/fittrack/src/cli/)                       │
//! │  - clap argument parsing (setup.rs)                         │
//! │  - Backend selection + dispatch (commands.rs)               │
//! │  - Login session file (session.rs)                          │
//! │  - Terminal rendering (render.rs)                           │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Library (crates/fittrackapp/)                              │
//! │  - ActivityStore / WeightStore over JSON files or SQLite    │
//! │  - Users, friends and preferences (SQLite only)             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The library never touches the terminal. Everything user facing lives here:
//! argument parsing, the session file, rendering and exit codes.
//!
//! ## Choosing a Backend
//!
//! Without a database URL, data lives in JSON files in the data directory
//! (`--data-dir`, `FITTRACK_DATA_DIR`, or the OS default). With
//! `--database-url sqlite://...` (or `FITTRACK_DATABASE_URL`/`DATABASE_URL`)
//! the SQLite store is used and commands act on behalf of the user that last
//! ran `fittrack login`.
//!
//! ## Testing Approach
//!
//! - **Library (`crates/fittrackapp/`)**: unit tests next to the code plus
//!   integration tests running every backend through the same scenarios.
//! - **CLI (`crates/fittrack/src/cli/`)**: parsing and rendering unit tests.
//! - **End-to-end (`crates/fittrack/tests/`)**: the compiled binary driven with
//!   `assert_cmd` against temporary data directories.

mod cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
