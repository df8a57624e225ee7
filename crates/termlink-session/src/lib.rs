//! # termlink-session
//!
//! Drives connectors for termlink front ends.
//!
//! This crate provides:
//! - [`TerminationMonitor`], a one-shot exit notification for a connector
//! - [`open_connector`], choosing the local or remote backend
//! - [`TerminalSession`], pumping connector output to a single UI consumer
//! - [`ActionRegistry`], routing user actions to their strategies
//!
//! ## Architecture
//!
//! This is Layer 2 in the architecture - it depends on termlink-core and
//! termlink-connector. Blocking connector calls run on tokio's blocking pool;
//! results reach the UI as [`SessionEvent`]s.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod dispatch;
pub mod factory;
pub mod monitor;
pub mod session;

// Re-export commonly used types
pub use dispatch::{
    ActionRegistry, ActionStrategy, CommandStrategy, LayoutStrategy, SshStrategy,
    TerminalPanelStrategy, ThemeStrategy, ViewLayer,
};
pub use factory::open_connector;
pub use monitor::{TerminationCallback, TerminationMonitor};
pub use session::{SessionEvent, SessionId, TerminalSession};
