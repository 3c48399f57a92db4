//! # Fittrack Architecture
//!
//! Fittrack is a **UI-agnostic workout and body-weight tracking library**. The
//! `fittrack` binary is one client of it; a web front end or a chart renderer
//! would be others.
//!
//! ## The Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (fittrack crate)                                 │
//! │  - Parses arguments, formats output, handles terminal I/O   │
//! │  - Owns the login session file                              │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Capability Traits (store/mod.rs)                           │
//! │  - ActivityStore, WeightStore                               │
//! │  - Shared validation (validation.rs), periods (period.rs)   │
//! └─────────────────────────────────────────────────────────────┘
//!                    │                         │
//!                    ▼                         ▼
//! ┌───────────────────────────────┐ ┌───────────────────────────┐
//! │  File Store (store/)          │ │  Relational Store (db/)   │
//! │  - JSON documents + cache     │ │  - SQLite, multi-user     │
//! │  - Atomic replace on write    │ │  - One transaction per op │
//! └───────────────────────────────┘ └───────────────────────────┘
//! ```
//!
//! ## Key Principle: No I/O Assumptions in Core
//!
//! Code in this crate:
//! - Takes regular Rust function arguments
//! - Returns `Result<T, FitError>`; the [`error::ErrorKind`] of a failure tells
//!   validation, not-found, conflict, authentication and persistence apart
//! - **Never** writes to stdout/stderr (diagnostics go through `tracing`)
//! - **Never** calls `std::process::exit`
//!
//! Both stores validate with the same functions in [`validation`] before any
//! write, so a rejected input never reaches disk or the database.
//!
//! ## Module Overview
//!
//! - [`model`]: Core data types (`Activity`, `WeightEntry`, `Settings`, `User`)
//! - [`validation`]: Bound checks shared by both stores
//! - [`period`]: Week / Month / Season / All time lookback windows
//! - [`catalog`]: Activity vocabulary, calorie estimates, duration formatting
//! - [`store`]: Capability traits and the JSON file store
//! - [`db`]: SQLite store with users, friendships and remember tokens
//! - [`auth`]: Password hashing and token generation
//! - [`config`]: Configuration management
//! - [`init`]: Backend selection at startup
//! - [`error`]: Error types

pub mod auth;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod init;
pub mod model;
pub mod period;
pub mod store;
pub mod validation;
