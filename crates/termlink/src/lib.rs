//! # termlink
//!
//! Console front end for termlink sessions.
//!
//! ## Architecture
//!
//! This is Layer 3 - the binary that ties together:
//! - termlink-core: configuration and actions
//! - termlink-connector: local and remote connectors
//! - termlink-session: session pump and action dispatch

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cli;
pub mod console;

pub use cli::CliOptions;
pub use console::{
    find_action, next_line, spawn_line_reader, ConsolePrompt, ConsoleView, SharedLines,
};
