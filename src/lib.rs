//! Library crate for userbook.
//!
//! This crate exposes the building blocks of the TUI:
//! - Application state, form controller and update loop (`app`)
//! - Background polling worker (`backend`)
//! - Command line configuration (`cli`)
//! - Gateway error types (`error`)
//! - HTTP client for the `/users` resource (`gateway`)
//! - File logging setup (`logging`)
//! - User record types (`model`)
//! - Derived view: search and sort (`search`)
//! - UI rendering and widgets (`ui`)
//!
//! It is used by the `userbook` binary and by tests.
#![doc = include_str!("../README.md")]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod app;
pub mod backend;
pub mod cli;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod model;
pub mod search;
pub mod ui;

/// Convenient re-exports of the types most callers need.
pub use error::{GatewayError, Result};
pub use model::{User, UserField, UserFields};
