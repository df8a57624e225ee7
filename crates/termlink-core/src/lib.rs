//! # termlink-core
//!
//! Core types for termlink.
//!
//! This crate contains all fundamental types with **no internal dependencies**
//! on other termlink crates. It provides:
//!
//! - Geometry types (TermSize, PixelSize, PendingGeometry)
//! - Connection parameters and `host[:port]` token parsing
//! - Action types and ordered action catalogs
//! - Configuration loaded from YAML
//! - Platform detection (default shell, invoking account)
//! - Error types
//!
//! ## Architecture
//!
//! This is Layer 0 in the architecture - all other crates depend on this one,
//! but this crate has no dependencies on other termlink crates.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod action;
pub mod config;
pub mod connection;
pub mod error;
pub mod geometry;
pub mod platform;

// Re-export commonly used types
pub use action::{Action, ActionCatalog, ActionCategory, PanelArrangement};
pub use config::{AppConfig, CatalogSettings, LocalSettings, TerminalSettings};
pub use connection::{ConnectionParams, DEFAULT_SSH_PORT};
pub use error::{Error, Result};
pub use geometry::{PendingGeometry, PixelSize, TermSize};
pub use platform::Platform;
