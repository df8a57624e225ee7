//! # termlink-connector
//!
//! Terminal transport connectors for termlink.
//!
//! This crate provides:
//! - The [`TtyConnector`] contract shared by every backend
//! - [`LocalProcessConnector`], a shell spawned in a pseudo-terminal
//! - [`RemoteChannelConnector`], a shell channel opened over a secure transport
//! - The [`SecureTransport`] seam a transport library plugs into
//! - UTF-8 decoding and deferred resize handling shared by both backends
//!
//! ## Architecture
//!
//! This is Layer 1 in the architecture - it depends on termlink-core and is
//! driven by termlink-session.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod connector;
pub mod credentials;
pub mod decode;
pub mod local;
pub mod polling;
pub mod prompt;
pub mod remote;
mod resize;
#[cfg(feature = "ssh")]
pub mod ssh;
mod streams;
pub mod testing;
pub mod transport;

// Re-export commonly used types
pub use connector::{ConnectorState, TtyConnector};
pub use credentials::CredentialResponder;
pub use decode::Utf8Reader;
pub use local::{LocalProcessConnector, LocalShellConfig};
pub use polling::PollingStream;
pub use prompt::PromptSource;
pub use remote::{ChannelSetup, RemoteChannelConnector};
#[cfg(feature = "ssh")]
pub use ssh::SshTransport;
pub use transport::{
    ChannelKind, KeyboardPrompt, NoTransport, SecureTransport, TransportChannel, TransportConfig,
    TransportSession, UserInfo,
};
