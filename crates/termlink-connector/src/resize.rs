//! Deferred, coalesced resize application.

use std::sync::{Mutex, PoisonError};

use tracing::debug;

use termlink_core::{PendingGeometry, Result};

#[derive(Debug, Default)]
struct GateState {
    pending: Option<PendingGeometry>,
    open: bool,
}

/// Holds the latest resize request until the backend can take it.
///
/// Both the request path and the open path run under one lock, so a request
/// racing with the transition to connected is applied exactly once.
#[derive(Debug, Default)]
pub(crate) struct ResizeGate {
    state: Mutex<GateState>,
}

impl ResizeGate {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Record `geometry`, applying it right away if the gate is open.
    pub(crate) fn request<F>(&self, geometry: PendingGeometry, apply: F) -> Result<()>
    where
        F: FnOnce(PendingGeometry) -> Result<()>,
    {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.pending = Some(geometry);
        if !state.open {
            debug!("Deferring resize to {} until connected", geometry.term);
            return Ok(());
        }
        Self::flush(&mut state, apply)
    }

    /// Mark the backend ready and apply whatever is pending.
    pub(crate) fn open<F>(&self, apply: F) -> Result<()>
    where
        F: FnOnce(PendingGeometry) -> Result<()>,
    {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.open = true;
        Self::flush(&mut state, apply)
    }

    /// Stop applying requests and drop anything pending.
    pub(crate) fn close(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.open = false;
        state.pending = None;
    }

    pub(crate) fn pending(&self) -> Option<PendingGeometry> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pending
    }

    fn flush<F>(state: &mut GateState, apply: F) -> Result<()>
    where
        F: FnOnce(PendingGeometry) -> Result<()>,
    {
        let Some(geometry) = state.pending.take() else {
            return Ok(());
        };
        if let Err(e) = apply(geometry) {
            // Keep it for the next attempt
            state.pending = Some(geometry);
            return Err(e);
        }
        Ok(())
    }
}
