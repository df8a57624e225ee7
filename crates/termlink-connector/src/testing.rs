//! In-memory doubles for the transport seam and the prompt source.
//!
//! Used by this crate's tests and by crates that drive connectors without a
//! network.
//!
//! Like a real secure transport, every channel call on a [`MockTransport`]
//! takes one session-wide lock, and the input stream is non-blocking under
//! a [`PollingStream`].

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use termlink_core::{Error, PendingGeometry, PixelSize, Result, TermSize};

use crate::{
    ChannelKind, PollingStream, PromptSource, SecureTransport, TransportChannel, TransportConfig,
    TransportSession, UserInfo,
};

/// Sleep between attempts on the non-blocking input stream.
const IO_POLL_INTERVAL: Duration = Duration::from_millis(2);

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Prompt source answering from a fixed script.
///
/// Every question consumes the next answer; once the script runs out the
/// answer is `None`.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    answers: Mutex<VecDeque<String>>,
    questions: Mutex<Vec<String>>,
    messages: Mutex<Vec<String>>,
}

impl ScriptedPrompt {
    /// Create a prompt that answers with `answers` in order.
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: Mutex::new(answers.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    /// Questions asked so far.
    pub fn questions(&self) -> Vec<String> {
        lock(&self.questions).clone()
    }

    /// Messages shown so far.
    pub fn messages(&self) -> Vec<String> {
        lock(&self.messages).clone()
    }

    fn answer(&self, prompt: &str) -> Option<String> {
        lock(&self.questions).push(prompt.to_string());
        lock(&self.answers).pop_front()
    }
}

impl PromptSource for ScriptedPrompt {
    fn question_visible(&self, prompt: &str, _default: &str) -> Option<String> {
        self.answer(prompt)
    }

    fn question_hidden(&self, prompt: &str) -> Option<String> {
        self.answer(prompt)
    }

    fn show_message(&self, message: &str) {
        lock(&self.messages).push(message.to_string());
    }
}

#[derive(Default)]
struct MockState {
    events: Mutex<Vec<String>>,
    opened: Mutex<Option<(String, String, u16)>>,
    password: Mutex<Option<String>>,
    config: Mutex<Option<TransportConfig>>,
    user_info: Mutex<Option<Box<dyn UserInfo>>>,
    required_password: Mutex<Option<String>>,
    connect_error: Mutex<Option<String>>,
    connect_hold: Mutex<Option<Receiver<()>>>,
    resizes: Mutex<Vec<PendingGeometry>>,
    written: Mutex<Vec<u8>>,
    output_tx: Mutex<Option<Sender<Vec<u8>>>>,
    output_rx: Mutex<Option<Receiver<Vec<u8>>>>,
    exit_status: AtomicI32,
    channel_open: AtomicBool,
    channel_closed: Arc<AtomicBool>,
    session_lock: Mutex<()>,
}

impl MockState {
    fn record(&self, event: impl Into<String>) {
        lock(&self.events).push(event.into());
    }
}

/// Scriptable [`SecureTransport`] that records every call.
///
/// Clones share state, so a test keeps one clone to inspect what the
/// connector did with the other.
#[derive(Clone)]
pub struct MockTransport {
    state: Arc<MockState>,
}

impl MockTransport {
    /// Transport whose sessions connect and whose channels stay open.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        let state = MockState {
            output_tx: Mutex::new(Some(tx)),
            output_rx: Mutex::new(Some(rx)),
            exit_status: AtomicI32::new(-1),
            ..MockState::default()
        };
        Self {
            state: Arc::new(state),
        }
    }

    /// Queue remote output for the channel's input stream.
    pub fn with_output(self, bytes: &[u8]) -> Self {
        self.push_output(bytes);
        self
    }

    /// Queue more remote output. Ignored once the remote side finished.
    pub fn push_output(&self, bytes: &[u8]) {
        if let Some(tx) = lock(&self.state.output_tx).as_ref() {
            let _ = tx.send(bytes.to_vec());
        }
    }

    /// Make session connects fail with `message`.
    pub fn fail_connect(&self, message: &str) {
        *lock(&self.state.connect_error) = Some(message.to_string());
    }

    /// Require authentication with `password`.
    ///
    /// A session without it asks its user info once.
    pub fn require_password(&self, password: &str) {
        *lock(&self.state.required_password) = Some(password.to_string());
    }

    /// Park session connects until the returned sender fires or is dropped.
    ///
    /// The connect is recorded before it parks.
    pub fn hold_connect(&self) -> Sender<()> {
        let (tx, rx) = mpsc::channel();
        *lock(&self.state.connect_hold) = Some(rx);
        tx
    }

    /// Report `code` as the remote exit status, leaving the output open.
    pub fn set_exit_status(&self, code: i32) {
        self.state.exit_status.store(code, Ordering::SeqCst);
    }

    /// End the remote command with `code` and close its output.
    pub fn finish(&self, code: i32) {
        self.set_exit_status(code);
        lock(&self.state.output_tx).take();
    }

    /// Recorded calls, in order.
    pub fn events(&self) -> Vec<String> {
        lock(&self.state.events).clone()
    }

    /// `(user, host, port)` of the last opened session.
    pub fn opened(&self) -> Option<(String, String, u16)> {
        lock(&self.state.opened).clone()
    }

    /// Password handed to the last session.
    pub fn password(&self) -> Option<String> {
        lock(&self.state.password).clone()
    }

    /// Settings handed to the last session.
    pub fn config(&self) -> Option<TransportConfig> {
        lock(&self.state.config).clone()
    }

    /// Whether a user info was attached to the last session.
    pub fn has_user_info(&self) -> bool {
        lock(&self.state.user_info).is_some()
    }

    /// Window-change requests sent on the channel.
    pub fn resizes(&self) -> Vec<PendingGeometry> {
        lock(&self.state.resizes).clone()
    }

    /// Bytes written to the channel.
    pub fn written(&self) -> Vec<u8> {
        lock(&self.state.written).clone()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTransport")
            .field("opened", &self.opened())
            .finish_non_exhaustive()
    }
}

impl SecureTransport for MockTransport {
    type Session = MockSession;

    fn open_session(&self, user: &str, host: &str, port: u16) -> Result<MockSession> {
        self.state
            .record(format!("transport.open_session {user}@{host}:{port}"));
        *lock(&self.state.opened) = Some((user.to_string(), host.to_string(), port));
        *lock(&self.state.password) = None;
        Ok(MockSession {
            state: Arc::clone(&self.state),
            user: user.to_string(),
            host: host.to_string(),
            connected: false,
        })
    }
}

/// Session produced by [`MockTransport`].
pub struct MockSession {
    state: Arc<MockState>,
    user: String,
    host: String,
    connected: bool,
}

impl MockSession {
    fn authenticate(&self) -> Result<()> {
        let Some(required) = lock(&self.state.required_password).clone() else {
            return Ok(());
        };
        if lock(&self.state.password).as_deref() == Some(required.as_str()) {
            return Ok(());
        }

        let message = format!("Password for {}@{}:", self.user, self.host);
        let answer = lock(&self.state.user_info)
            .as_mut()
            .and_then(|info| info.password(&message));
        match answer {
            Some(answer) if answer == required => Ok(()),
            Some(_) => Err(Error::ConnectFailed("Auth fail".to_string())),
            None => Err(Error::Cancelled("authentication declined".to_string())),
        }
    }
}

impl TransportSession for MockSession {
    type Channel = MockChannel;

    fn set_password(&mut self, password: &str) {
        self.state.record("session.set_password");
        *lock(&self.state.password) = Some(password.to_string());
    }

    fn set_user_info(&mut self, user_info: Box<dyn UserInfo>) {
        self.state.record("session.set_user_info");
        *lock(&self.state.user_info) = Some(user_info);
    }

    fn set_config(&mut self, config: &TransportConfig) {
        self.state.record("session.set_config");
        *lock(&self.state.config) = Some(config.clone());
    }

    fn connect(&mut self) -> Result<()> {
        self.state.record("session.connect");
        let hold = lock(&self.state.connect_hold).take();
        if let Some(hold) = hold {
            let _ = hold.recv();
        }
        if let Some(message) = lock(&self.state.connect_error).clone() {
            return Err(Error::ConnectFailed(message));
        }
        self.authenticate()?;
        self.connected = true;
        Ok(())
    }

    fn open_channel(&mut self, kind: ChannelKind) -> Result<MockChannel> {
        self.state.record(format!("session.open_channel {kind:?}"));
        if !self.connected {
            return Err(Error::NotConnected);
        }
        Ok(MockChannel {
            state: Arc::clone(&self.state),
        })
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn disconnect(&mut self) {
        self.state.record("session.disconnect");
        self.connected = false;
    }
}

/// Channel produced by [`MockSession`].
pub struct MockChannel {
    state: Arc<MockState>,
}

impl TransportChannel for MockChannel {
    fn set_pty_type(&mut self, term: &str) {
        self.state.record(format!("channel.pty_type {term}"));
    }

    fn set_env(&mut self, name: &str, value: &str) {
        self.state.record(format!("channel.env {name}={value}"));
    }

    fn input_stream(&mut self) -> Result<Box<dyn Read + Send>> {
        self.state.record("channel.input_stream");
        let rx = lock(&self.state.output_rx)
            .take()
            .ok_or_else(|| Error::Stream("input stream already taken".to_string()))?;
        let input = MockInput {
            state: Arc::clone(&self.state),
            rx,
            pending: Vec::new(),
            pos: 0,
        };
        Ok(Box::new(PollingStream::new(
            input,
            IO_POLL_INTERVAL,
            Arc::clone(&self.state.channel_closed),
        )))
    }

    fn output_stream(&mut self) -> Result<Box<dyn Write + Send>> {
        self.state.record("channel.output_stream");
        let output = MockOutput {
            state: Arc::clone(&self.state),
        };
        Ok(Box::new(PollingStream::new(
            output,
            IO_POLL_INTERVAL,
            Arc::clone(&self.state.channel_closed),
        )))
    }

    fn connect(&mut self) -> Result<()> {
        self.state.record("channel.connect");
        self.state.channel_open.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn set_pty_size(&mut self, term: TermSize, pixels: PixelSize) -> Result<()> {
        self.state.record(format!("channel.set_pty_size {term}"));
        lock(&self.state.resizes).push(PendingGeometry::new(term, pixels));
        Ok(())
    }

    fn exit_status(&self) -> i32 {
        let _session = lock(&self.state.session_lock);
        self.state.exit_status.load(Ordering::SeqCst)
    }

    fn is_connected(&self) -> bool {
        let _session = lock(&self.state.session_lock);
        self.state.channel_open.load(Ordering::SeqCst)
            && self.state.exit_status.load(Ordering::SeqCst) < 0
    }

    fn disconnect(&mut self) {
        self.state.record("channel.disconnect");
        self.state.channel_closed.store(true, Ordering::SeqCst);
        let _session = lock(&self.state.session_lock);
        self.state.channel_open.store(false, Ordering::SeqCst);
        lock(&self.state.output_tx).take();
    }
}

/// Non-blocking read side: `WouldBlock` until output is queued.
struct MockInput {
    state: Arc<MockState>,
    rx: Receiver<Vec<u8>>,
    pending: Vec<u8>,
    pos: usize,
}

impl Read for MockInput {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let _session = lock(&self.state.session_lock);
        while self.pos >= self.pending.len() {
            match self.rx.try_recv() {
                Ok(chunk) => {
                    self.pending = chunk;
                    self.pos = 0;
                }
                Err(TryRecvError::Empty) => return Err(io::ErrorKind::WouldBlock.into()),
                // Sender dropped: remote output closed
                Err(TryRecvError::Disconnected) => return Ok(0),
            }
        }
        let n = buf.len().min(self.pending.len() - self.pos);
        buf[..n].copy_from_slice(&self.pending[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

struct MockOutput {
    state: Arc<MockState>,
}

impl Write for MockOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let _session = lock(&self.state.session_lock);
        lock(&self.state.written).extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
