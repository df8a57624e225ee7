//! Connector for a shell spawned in a local pseudo-terminal.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use portable_pty::{native_pty_system, Child, CommandBuilder, MasterPty, PtySize};
use tracing::{debug, error, info, warn};

use termlink_core::{
    Error, LocalSettings, PendingGeometry, PixelSize, Platform, Result, TermSize, TerminalSettings,
};

use crate::resize::ResizeGate;
use crate::streams::Streams;
use crate::{ConnectorState, PromptSource, TtyConnector};

/// Display label of every local connector.
pub const LOCAL_NAME: &str = "Local";

/// Interval between exit checks in `wait_for`.
const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// `EIO`, reported by a pty master once the child side is gone.
#[cfg(unix)]
const EIO: i32 = 5;

/// Map a failed `try_wait`, keeping signal interruptions retryable.
fn wait_error(e: std::io::Error) -> Error {
    if e.kind() == std::io::ErrorKind::Interrupted {
        Error::Interrupted
    } else {
        Error::Io(e)
    }
}

/// How to spawn the local shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalShellConfig {
    /// Program followed by its arguments
    pub command: Vec<String>,
    /// Working directory; inherited when `None`
    pub working_directory: Option<PathBuf>,
    /// Variables added on top of the inherited environment
    pub env: BTreeMap<String, String>,
    /// Initial terminal size
    pub size: TermSize,
    /// TERM value, always set
    pub term: String,
    /// LANG value, set only when the environment has none
    pub locale: String,
}

impl Default for LocalShellConfig {
    fn default() -> Self {
        Self::from_settings(&TerminalSettings::default(), &LocalSettings::default())
    }
}

impl LocalShellConfig {
    /// Build a spawn configuration from application settings.
    pub fn from_settings(terminal: &TerminalSettings, local: &LocalSettings) -> Self {
        let command = match &local.shell {
            Some(shell) if !shell.trim().is_empty() => {
                let mut command = vec![shell.clone()];
                command.extend(local.args.iter().cloned());
                command
            }
            _ => Platform::detect().default_shell(),
        };

        Self {
            command,
            working_directory: local.working_directory.as_ref().map(PathBuf::from),
            env: local.env.clone(),
            size: TermSize::new(terminal.default_cols, terminal.default_rows),
            term: terminal.term.clone(),
            locale: terminal.locale.clone(),
        }
    }

    /// Use `program` with `args` instead of the configured shell.
    pub fn with_command(mut self, program: impl Into<String>, args: &[&str]) -> Self {
        self.command = std::iter::once(program.into())
            .chain(args.iter().map(|a| a.to_string()))
            .collect();
        self
    }

    fn command_builder(&self) -> Result<CommandBuilder> {
        let (program, args) = self
            .command
            .split_first()
            .ok_or_else(|| Error::Pty("empty shell command".to_string()))?;

        let mut cmd = CommandBuilder::new(program);
        cmd.args(args);

        if let Some(dir) = &self.working_directory {
            debug!("Setting working directory to: {}", dir.display());
            cmd.cwd(dir);
        }

        cmd.env("TERM", &self.term);
        let has_lang = self.env.contains_key("LANG")
            || std::env::var_os("LANG").is_some_and(|lang| !lang.is_empty());
        if !has_lang {
            cmd.env("LANG", &self.locale);
        }
        for (key, value) in &self.env {
            cmd.env(key, value);
        }

        Ok(cmd)
    }
}

/// A shell process attached to a local pseudo-terminal.
///
/// The process exists from construction, so the connector starts out
/// connected and resizes apply immediately.
pub struct LocalProcessConnector {
    /// Spawned command line
    command: Vec<String>,
    /// The master PTY end
    master: Mutex<Option<Box<dyn MasterPty + Send>>>,
    /// The child process
    child: Mutex<Option<Box<dyn Child + Send + Sync>>>,
    streams: Streams,
    gate: ResizeGate,
    state: Mutex<ConnectorState>,
    exit_code: Mutex<Option<i32>>,
    /// Every chunk handed out by `read`, in order
    chunks: Mutex<Vec<String>>,
}

impl LocalProcessConnector {
    /// Spawn the configured shell in a new pseudo-terminal.
    pub fn spawn(config: &LocalShellConfig) -> Result<Self> {
        info!(
            "Spawning local shell: command={:?}, size={}, cwd={:?}",
            config.command, config.size, config.working_directory
        );

        let pty_system = native_pty_system();
        let pair = pty_system
            .openpty(PtySize {
                rows: config.size.rows.max(1),
                cols: config.size.cols.max(1),
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| {
                error!("Failed to open PTY: {}", e);
                Error::Pty(format!("Failed to open PTY: {e}"))
            })?;

        let cmd = config.command_builder()?;
        let child = pair.slave.spawn_command(cmd).map_err(|e| {
            error!("Failed to spawn {:?}: {}", config.command, e);
            Error::Pty(format!("Failed to spawn command: {e}"))
        })?;

        let writer = pair
            .master
            .take_writer()
            .map_err(|e| Error::Pty(format!("Failed to take writer: {e}")))?;
        let reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| Error::Pty(format!("Failed to clone reader: {e}")))?;

        let connector = Self {
            command: config.command.clone(),
            master: Mutex::new(Some(pair.master)),
            child: Mutex::new(Some(child)),
            streams: Streams::default(),
            gate: ResizeGate::new(),
            state: Mutex::new(ConnectorState::Connected),
            exit_code: Mutex::new(None),
            chunks: Mutex::new(Vec::new()),
        };
        connector.streams.bind(reader, writer);
        connector.gate.open(|_| Ok(()))?;

        info!("Local shell spawned: command={:?}", config.command);
        Ok(connector)
    }

    /// Copy of every chunk returned by `read` so far, oldest first.
    pub fn chunks(&self) -> Vec<String> {
        self.chunks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Process id of the shell, while it is attached.
    pub fn process_id(&self) -> Option<u32> {
        self.child
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .and_then(|child| child.process_id())
    }

    fn apply_geometry(&self, geometry: PendingGeometry) -> Result<()> {
        let master_lock = self
            .master
            .lock()
            .map_err(|e| Error::Other(format!("Master lock error: {e}")))?;
        let master = master_lock.as_ref().ok_or(Error::NotConnected)?;

        debug!("Resizing local PTY to {}", geometry.term);
        master
            .resize(PtySize {
                rows: geometry.term.rows,
                cols: geometry.term.cols,
                pixel_width: geometry.pixels.width,
                pixel_height: geometry.pixels.height,
            })
            .map_err(|e| Error::Pty(format!("Resize failed: {e}")))
    }

    fn set_state(&self, state: ConnectorState) {
        let mut current = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *current != state {
            debug!("Local connector state: {:?} → {:?}", *current, state);
            *current = state;
        }
    }

    fn record_exit(&self, code: i32) -> i32 {
        *self.exit_code.lock().unwrap_or_else(PoisonError::into_inner) = Some(code);
        code
    }
}

impl TtyConnector for LocalProcessConnector {
    // Spawned at construction
    fn init(&self, _prompt: Arc<dyn PromptSource>) -> bool {
        self.state() == ConnectorState::Connected
    }

    fn read(&self, buf: &mut [char]) -> Result<usize> {
        let n = match self.streams.read(buf) {
            Ok(n) => n,
            #[cfg(unix)]
            Err(Error::Io(e)) if e.raw_os_error() == Some(EIO) => 0,
            Err(e) => return Err(e),
        };

        if n > 0 {
            let chunk: String = buf[..n].iter().collect();
            self.chunks
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(chunk);
        }
        Ok(n)
    }

    fn write(&self, bytes: &[u8]) -> Result<()> {
        self.streams.write(bytes)
    }

    fn resize(&self, term: TermSize, pixels: PixelSize) -> Result<()> {
        self.gate
            .request(PendingGeometry::new(term, pixels), |g| self.apply_geometry(g))
    }

    fn is_connected(&self) -> bool {
        if self.state() != ConnectorState::Connected {
            return false;
        }
        let mut child_lock = self.child.lock().unwrap_or_else(PoisonError::into_inner);
        match child_lock.as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        }
    }

    fn wait_for(&self) -> Result<i32> {
        loop {
            {
                let mut child_lock = self
                    .child
                    .lock()
                    .map_err(|e| Error::Other(format!("Child lock error: {e}")))?;

                let Some(child) = child_lock.as_mut() else {
                    let code = *self.exit_code.lock().unwrap_or_else(PoisonError::into_inner);
                    return Ok(code.unwrap_or(0));
                };

                if let Some(status) = child.try_wait().map_err(wait_error)? {
                    let code = status.exit_code() as i32;
                    debug!("Local shell exited with status {}", code);
                    return Ok(self.record_exit(code));
                }
            }
            std::thread::sleep(EXIT_POLL_INTERVAL);
        }
    }

    fn close(&self) {
        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if *state == ConnectorState::Closed {
                return;
            }
            *state = ConnectorState::Closed;
        }
        info!("Closing local connector: command={:?}", self.command);
        self.gate.close();

        let child = self
            .child
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(mut child) = child {
            if let Err(e) = child.kill() {
                // Already gone
                debug!("Kill child process: {}", e);
            }
            match child.wait() {
                Ok(status) => {
                    self.record_exit(status.exit_code() as i32);
                }
                Err(e) => warn!("Wait for child process: {}", e),
            }
        }

        self.master
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        self.streams.clear();
        self.set_state(ConnectorState::Closed);
    }

    fn name(&self) -> String {
        LOCAL_NAME.to_string()
    }

    fn state(&self) -> ConnectorState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for LocalProcessConnector {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for LocalProcessConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalProcessConnector")
            .field("command", &self.command)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
