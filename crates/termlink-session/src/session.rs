//! Terminal session: a connector driven off the UI thread.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::SystemTime;

use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use termlink_connector::{ConnectorState, PromptSource, TtyConnector};
use termlink_core::{PixelSize, Result, TermSize};

use crate::monitor::TerminationMonitor;

/// Characters requested per read.
const READ_BUFFER: usize = 4096;

/// Unique session identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Create a new random session ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Something the UI should apply for a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// `init` succeeded
    Connected,
    /// Text read from the connector, in read order
    Output(String),
    /// Reading failed; the session stops reading
    Error(String),
    /// The connector stopped producing output or never connected
    Inactive,
    /// The connector terminated with this exit code
    Exited(i32),
}

type MonitorSlot = Arc<Mutex<Option<TerminationMonitor>>>;

/// A connector plus the tasks that drive it.
///
/// `init` and the read loop run on the blocking pool. Everything they
/// produce arrives, in order, on the receiver returned by
/// [`start`](Self::start), so a single consumer applies all UI changes.
pub struct TerminalSession {
    id: SessionId,
    connector: Arc<dyn TtyConnector>,
    monitor: MonitorSlot,
    driver: JoinHandle<()>,
    created_at: SystemTime,
}

impl TerminalSession {
    /// Initialize `connector` with `prompt` and start pumping its output.
    pub fn start(
        connector: Arc<dyn TtyConnector>,
        prompt: Arc<dyn PromptSource>,
        handle: &Handle,
    ) -> (Self, UnboundedReceiver<SessionEvent>) {
        let id = SessionId::new();
        let (events, receiver) = mpsc::unbounded_channel();
        let monitor: MonitorSlot = Arc::new(Mutex::new(None));

        info!("Starting session {} ({})", id, connector.name());
        let driver = handle.spawn(drive(
            id,
            Arc::clone(&connector),
            prompt,
            events,
            Arc::clone(&monitor),
        ));

        let session = Self {
            id,
            connector,
            monitor,
            driver,
            created_at: SystemTime::now(),
        };
        (session, receiver)
    }

    /// Session identifier.
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Display name of the connector.
    pub fn name(&self) -> String {
        self.connector.name()
    }

    /// Creation time.
    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }

    /// Lifecycle state of the connector.
    pub fn state(&self) -> ConnectorState {
        self.connector.state()
    }

    /// Whether the connector is connected.
    pub fn is_connected(&self) -> bool {
        self.connector.is_connected()
    }

    /// Send typed text.
    pub fn send_input(&self, text: &str) -> Result<()> {
        self.connector.write_str(text)
    }

    /// Send raw bytes.
    pub fn send_bytes(&self, bytes: &[u8]) -> Result<()> {
        self.connector.write(bytes)
    }

    /// Resize the terminal.
    pub fn resize(&self, term: TermSize, pixels: PixelSize) -> Result<()> {
        self.connector.resize(term, pixels)
    }

    /// Close the connector. `Exited` and `Inactive` follow.
    pub fn close(&self) {
        info!("Closing session {}", self.id);
        self.connector.close();
    }

    /// Stop delivering events. The connector is left open.
    pub fn detach(&self) {
        debug!("Detaching session {}", self.id);
        self.driver.abort();
        if let Some(monitor) = self
            .monitor
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            monitor.detach();
        }
    }
}

impl std::fmt::Debug for TerminalSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalSession")
            .field("id", &self.id)
            .field("name", &self.name())
            .field("state", &self.state())
            .finish()
    }
}

async fn drive(
    id: SessionId,
    connector: Arc<dyn TtyConnector>,
    prompt: Arc<dyn PromptSource>,
    events: UnboundedSender<SessionEvent>,
    monitor_slot: MonitorSlot,
) {
    let opening = Arc::clone(&connector);
    let connected = match tokio::task::spawn_blocking(move || opening.init(prompt)).await {
        Ok(connected) => connected,
        Err(e) => {
            error!("Session {} init task failed: {}", id, e);
            false
        }
    };
    if !connected {
        info!("Session {} did not connect", id);
        let _ = events.send(SessionEvent::Inactive);
        return;
    }
    let _ = events.send(SessionEvent::Connected);

    let monitor = TerminationMonitor::start(Arc::clone(&connector), &Handle::current());
    let exited = events.clone();
    let registered = monitor.register(Box::new(move |code| {
        let _ = exited.send(SessionEvent::Exited(code));
    }));
    if let Err(e) = registered {
        warn!("Session {} exit notification unavailable: {}", id, e);
    }
    *monitor_slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(monitor);

    if let Err(e) = tokio::task::spawn_blocking(move || pump(connector, events)).await {
        error!("Session {} read task failed: {}", id, e);
    }
    debug!("Session {} stopped reading", id);
}

/// Forward reads to `events` until the stream ends or fails.
fn pump(connector: Arc<dyn TtyConnector>, events: UnboundedSender<SessionEvent>) {
    let mut buf = vec!['\0'; READ_BUFFER];
    loop {
        let event = match connector.read(&mut buf) {
            Ok(0) => SessionEvent::Inactive,
            Ok(n) => SessionEvent::Output(buf[..n].iter().collect()),
            Err(e) if e.is_interrupted() => continue,
            Err(_) if connector.state() == ConnectorState::Closed => SessionEvent::Inactive,
            Err(e) => {
                warn!("Read from {} failed: {}", connector.name(), e);
                SessionEvent::Error(format!("session error: {e}"))
            }
        };

        let last = !matches!(event, SessionEvent::Output(_));
        if events.send(event).is_err() {
            debug!("Session event receiver dropped");
            return;
        }
        if last {
            return;
        }
    }
}
