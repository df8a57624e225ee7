//! The contract every terminal backend implements.

use std::sync::Arc;

use termlink_core::{PixelSize, Result, TermSize};

use crate::PromptSource;

/// Lifecycle state of a connector.
///
/// `Uninitialized → Authenticating → Connecting → Connected → {Closed | Failed}`.
/// `Authenticating` is skipped when no parameters are missing. `Closed` is
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectorState {
    /// Created, `init` not called yet
    Uninitialized,
    /// Collecting missing connection parameters
    Authenticating,
    /// Opening the underlying handle
    Connecting,
    /// Streams bound, backend running
    Connected,
    /// Torn down by `close`
    Closed,
    /// Opening the handle failed
    Failed,
}

impl ConnectorState {
    /// Whether `init` is still in progress.
    pub fn is_opening(&self) -> bool {
        matches!(
            self,
            ConnectorState::Authenticating | ConnectorState::Connecting
        )
    }
}

/// A byte pipe between a terminal widget and a shell backend.
///
/// Methods take `&self` so that one worker can block in [`read`](Self::read)
/// while another waits for termination or resizes the terminal.
pub trait TtyConnector: Send + Sync {
    /// Establish the backend, prompting for anything missing.
    ///
    /// Never fails past this boundary: errors are shown through `prompt`
    /// and reported as `false`.
    fn init(&self, prompt: Arc<dyn PromptSource>) -> bool;

    /// Copy decoded characters into `buf`.
    ///
    /// Returns the number of characters copied, 0 at end of stream.
    fn read(&self, buf: &mut [char]) -> Result<usize>;

    /// Send raw bytes to the backend. A no-op until the output stream exists.
    fn write(&self, bytes: &[u8]) -> Result<()>;

    /// Send text to the backend, UTF-8 encoded.
    fn write_str(&self, text: &str) -> Result<()> {
        self.write(text.as_bytes())
    }

    /// Request a new terminal size.
    ///
    /// Applied immediately when connected; otherwise kept (latest wins) and
    /// applied once as soon as the backend connects.
    fn resize(&self, term: TermSize, pixels: PixelSize) -> Result<()>;

    /// Whether the backend handle exists and reports itself active.
    fn is_connected(&self) -> bool;

    /// Block until the backend terminates and return its exit status.
    ///
    /// Returns 0 right away if the backend never connected.
    fn wait_for(&self) -> Result<i32>;

    /// Release the backend. Safe to call repeatedly.
    fn close(&self);

    /// Stable display label.
    fn name(&self) -> String;

    /// Current lifecycle state.
    fn state(&self) -> ConnectorState;
}
