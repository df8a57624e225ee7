//! One-shot notification of connector termination.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use termlink_connector::TtyConnector;
use termlink_core::{Error, Result};

/// Receives the exit code of a watched connector.
pub type TerminationCallback = Box<dyn FnOnce(i32) + Send + 'static>;

/// Exit code delivered when waiting failed for a reason other than interruption.
const WAIT_FAILED: i32 = -1;

/// Watches a connector and calls back once when it terminates.
///
/// A single task waits for the connector off the async workers, then takes
/// the callback from a slot of capacity one and invokes it. A callback
/// registered after the connector already exited is still delivered. At most
/// one callback is ever delivered.
pub struct TerminationMonitor {
    slot: mpsc::Sender<TerminationCallback>,
    task: JoinHandle<()>,
}

impl TerminationMonitor {
    /// Start watching `connector` on the runtime behind `handle`.
    pub fn start(connector: Arc<dyn TtyConnector>, handle: &Handle) -> Self {
        let (slot, mut callbacks) = mpsc::channel::<TerminationCallback>(1);
        let name = connector.name();

        let task = handle.spawn(async move {
            let code = loop {
                let waiting = Arc::clone(&connector);
                match tokio::task::spawn_blocking(move || waiting.wait_for()).await {
                    Ok(Ok(code)) => break code,
                    Ok(Err(e)) if e.is_interrupted() => {
                        debug!("Wait on {} interrupted, retrying", name);
                    }
                    Ok(Err(e)) => {
                        warn!("Wait on {} failed: {}", name, e);
                        break WAIT_FAILED;
                    }
                    Err(e) => {
                        error!("Wait task for {} aborted: {}", name, e);
                        return;
                    }
                }
            };

            debug!("{} terminated with code {}, awaiting callback", name, code);
            if let Some(callback) = callbacks.recv().await {
                callback(code);
            }
        });

        Self { slot, task }
    }

    /// Register the termination callback.
    ///
    /// Never blocks. Fails with [`Error::CallbackAlreadyRegistered`] while an
    /// earlier callback is still waiting, and with [`Error::Cancelled`] once the
    /// monitor no longer delivers.
    pub fn register(&self, callback: TerminationCallback) -> Result<()> {
        self.slot.try_send(callback).map_err(|e| match e {
            TrySendError::Full(_) => Error::CallbackAlreadyRegistered,
            TrySendError::Closed(_) => Error::Cancelled("termination monitor finished".to_string()),
        })
    }

    /// Stop watching. A callback not yet delivered never will be.
    pub fn detach(&self) {
        self.task.abort();
    }

    /// Whether the watch task has ended.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl std::fmt::Debug for TerminationMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminationMonitor")
            .field("finished", &self.is_finished())
            .finish()
    }
}
