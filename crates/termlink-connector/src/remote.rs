//! Connector for a shell channel opened over a secure transport.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tracing::{debug, error, info, warn};

use termlink_core::{
    ConnectionParams, Error, PendingGeometry, PixelSize, Platform, Result, TermSize,
};

use crate::resize::ResizeGate;
use crate::streams::Streams;
use crate::{
    ChannelKind, ConnectorState, CredentialResponder, PromptSource, SecureTransport,
    TransportChannel, TransportConfig, TransportSession, TtyConnector,
};

/// Interval between exit checks in `wait_for`.
const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Label used while no host is known.
const UNNAMED_REMOTE: &str = "Remote";

fn closed_while_connecting() -> Error {
    Error::Cancelled("connector closed while connecting".to_string())
}

type OpenChannelFn<S> =
    dyn Fn(&mut S) -> Result<<S as TransportSession>::Channel> + Send + Sync;
type ConfigureChannelFn<S> =
    dyn Fn(&mut <S as TransportSession>::Channel) -> Result<()> + Send + Sync;

/// How a connector opens and prepares its channel.
///
/// The two steps are plain closures so one connector type serves any channel
/// flavour.
pub struct ChannelSetup<S: TransportSession> {
    open: Box<OpenChannelFn<S>>,
    configure: Box<ConfigureChannelFn<S>>,
}

impl<S: TransportSession> ChannelSetup<S> {
    /// Build a setup from an open step and a configure step.
    pub fn new<O, C>(open: O, configure: C) -> Self
    where
        O: Fn(&mut S) -> Result<S::Channel> + Send + Sync + 'static,
        C: Fn(&mut S::Channel) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            open: Box::new(open),
            configure: Box::new(configure),
        }
    }

    /// Interactive shell with an `xterm` pty and `LANG` forwarded.
    pub fn shell(term: impl Into<String>, locale: impl Into<String>) -> Self {
        let term = term.into();
        let locale = locale.into();
        Self::new(
            |session: &mut S| session.open_channel(ChannelKind::Shell),
            move |channel: &mut S::Channel| {
                channel.set_pty_type(&term);
                channel.set_env("LANG", &locale);
                Ok(())
            },
        )
    }
}

impl<S: TransportSession> Default for ChannelSetup<S> {
    fn default() -> Self {
        Self::shell("xterm", "en_US.UTF-8")
    }
}

/// A remote shell reached through a [`SecureTransport`].
///
/// Missing host or user are collected from the prompt source during `init`.
pub struct RemoteChannelConnector<T: SecureTransport> {
    transport: Arc<T>,
    params: Mutex<ConnectionParams>,
    setup: ChannelSetup<T::Session>,
    config: TransportConfig,
    default_user: Option<String>,
    session: Mutex<Option<T::Session>>,
    channel: Mutex<Option<<T::Session as TransportSession>::Channel>>,
    streams: Streams,
    gate: ResizeGate,
    state: Mutex<ConnectorState>,
    exit_status: Mutex<Option<i32>>,
}

impl<T: SecureTransport> RemoteChannelConnector<T> {
    /// Create a connector for `params`, opening a shell channel.
    pub fn new(transport: Arc<T>, params: ConnectionParams) -> Self {
        Self::with_setup(transport, params, ChannelSetup::default())
    }

    /// Create a connector with a custom channel setup.
    pub fn with_setup(
        transport: Arc<T>,
        params: ConnectionParams,
        setup: ChannelSetup<T::Session>,
    ) -> Self {
        Self {
            transport,
            params: Mutex::new(params),
            setup,
            config: TransportConfig::default(),
            default_user: Platform::detect().account_name(),
            session: Mutex::new(None),
            channel: Mutex::new(None),
            streams: Streams::default(),
            gate: ResizeGate::new(),
            state: Mutex::new(ConnectorState::Uninitialized),
            exit_status: Mutex::new(None),
        }
    }

    /// Override the user name used when none is supplied.
    pub fn with_default_user(mut self, user: Option<String>) -> Self {
        self.default_user = user.map(|u| u.trim().to_lowercase()).filter(|u| !u.is_empty());
        self
    }

    /// Snapshot of the connection parameters.
    pub fn params(&self) -> ConnectionParams {
        self.params
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Resize request waiting for the channel, if any.
    pub fn pending_geometry(&self) -> Option<PendingGeometry> {
        self.gate.pending()
    }

    /// Move to `next` unless `close` already ran.
    fn advance(&self, next: ConnectorState) -> bool {
        let mut current = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *current == ConnectorState::Closed {
            return false;
        }
        if *current != next {
            debug!("Remote connector state: {:?} → {:?}", *current, next);
            *current = next;
        }
        true
    }

    /// Fill in host, port and user, prompting until both are usable.
    fn collect_params(&self, prompt: &dyn PromptSource) -> Result<ConnectionParams> {
        let mut params = self.params();

        if params.user.trim().is_empty() {
            if let Some(user) = &self.default_user {
                params.user = user.clone();
            }
        }

        let token = params.host.clone();
        let mut host_ok = !token.trim().is_empty() && params.apply_host_token(&token).is_ok();

        if (!host_ok || params.user.trim().is_empty())
            && !self.advance(ConnectorState::Authenticating)
        {
            return Err(closed_while_connecting());
        }

        while !host_ok {
            let default = params.host.clone();
            let answer = prompt
                .question_visible("host[:port]:", &default)
                .ok_or_else(|| Error::Cancelled("no host given".to_string()))?;
            match params.apply_host_token(&answer) {
                Ok(()) => host_ok = true,
                Err(e) => {
                    debug!("Rejected host token '{}': {}", answer, e);
                    prompt.show_message(&e.to_string());
                }
            }
        }

        while params.user.trim().is_empty() {
            let answer = prompt
                .question_visible("user:", "")
                .ok_or_else(|| Error::Cancelled("no user given".to_string()))?;
            params.user = answer.trim().to_string();
        }

        *self.params.lock().unwrap_or_else(PoisonError::into_inner) = params.clone();
        Ok(params)
    }

    /// Open session and channel, bind streams and go to `Connected`.
    fn open(&self, params: &ConnectionParams, prompt: Arc<dyn PromptSource>) -> Result<()> {
        info!(
            "Opening session: {}@{}:{}",
            params.user, params.host, params.port
        );

        let mut session = self
            .transport
            .open_session(&params.user, &params.host, params.port)?;

        let mut channel = match self.open_channel(&mut session, params, prompt) {
            Ok(channel) => channel,
            Err(e) => {
                session.disconnect();
                return Err(e);
            }
        };

        let streams = channel
            .input_stream()
            .and_then(|input| Ok((input, channel.output_stream()?)));
        let (input, output) = match streams.and_then(|s| channel.connect().map(|()| s)) {
            Ok(s) => s,
            Err(e) => {
                channel.disconnect();
                session.disconnect();
                return Err(e);
            }
        };

        // Bind under the state lock so a concurrent close either sees the
        // handles or makes us drop them
        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if *state == ConnectorState::Closed {
                drop(state);
                channel.disconnect();
                session.disconnect();
                return Err(closed_while_connecting());
            }

            *self.session.lock().unwrap_or_else(PoisonError::into_inner) = Some(session);
            *self.channel.lock().unwrap_or_else(PoisonError::into_inner) = Some(channel);
            self.streams.bind(input, output);
            debug!("Remote connector state: {:?} → Connected", *state);
            *state = ConnectorState::Connected;

            if let Err(e) = self.gate.open(|g| self.apply_geometry(g)) {
                warn!("Failed to apply pending resize: {}", e);
            }
        }

        info!("Remote shell connected: {}@{}", params.user, params.host);
        Ok(())
    }

    fn open_channel(
        &self,
        session: &mut T::Session,
        params: &ConnectionParams,
        prompt: Arc<dyn PromptSource>,
    ) -> Result<<T::Session as TransportSession>::Channel> {
        if let Some(password) = params.password.as_deref().filter(|p| !p.is_empty()) {
            session.set_password(password);
        }
        session.set_user_info(Box::new(CredentialResponder::new(
            params.password.clone(),
            prompt,
        )));
        session.set_config(&self.config);
        session.connect()?;

        let mut channel = (self.setup.open)(session)?;
        if let Err(e) = (self.setup.configure)(&mut channel) {
            channel.disconnect();
            return Err(e);
        }
        Ok(channel)
    }

    fn apply_geometry(&self, geometry: PendingGeometry) -> Result<()> {
        let mut channel_lock = self
            .channel
            .lock()
            .map_err(|e| Error::Other(format!("Channel lock error: {e}")))?;
        let channel = channel_lock.as_mut().ok_or(Error::NotConnected)?;

        debug!("Resizing remote pty to {}", geometry.term);
        channel.set_pty_size(geometry.term, geometry.pixels)
    }

    /// `(running, exit status)` of the bound channel.
    fn channel_status(&self) -> (bool, i32) {
        let channel_lock = self.channel.lock().unwrap_or_else(PoisonError::into_inner);
        match channel_lock.as_ref() {
            Some(channel) => {
                let status = channel.exit_status();
                (status < 0 && channel.is_connected(), status)
            }
            None => (false, self.last_exit_status()),
        }
    }

    fn last_exit_status(&self) -> i32 {
        self.exit_status
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .unwrap_or(0)
    }
}

impl<T: SecureTransport> TtyConnector for RemoteChannelConnector<T> {
    fn init(&self, prompt: Arc<dyn PromptSource>) -> bool {
        match self.state() {
            ConnectorState::Uninitialized => {}
            ConnectorState::Connected => return true,
            state => {
                warn!("init called in state {:?}", state);
                return false;
            }
        }

        let params = match self.collect_params(prompt.as_ref()) {
            Ok(params) => params,
            Err(_) if self.state() == ConnectorState::Closed => {
                debug!("Connector closed while collecting parameters");
                return false;
            }
            Err(e) => {
                warn!("Connection parameters not collected: {}", e);
                prompt.show_message(&e.to_string());
                self.advance(ConnectorState::Failed);
                return false;
            }
        };

        if !self.advance(ConnectorState::Connecting) {
            debug!("Connector closed before connecting");
            return false;
        }
        match self.open(&params, Arc::clone(&prompt)) {
            Ok(()) => true,
            Err(_) if self.state() == ConnectorState::Closed => {
                debug!("Connector closed while connecting to {}", params.host);
                false
            }
            Err(e) => {
                error!(
                    "Failed to connect to {}:{}: {}",
                    params.host, params.port, e
                );
                prompt.show_message(&format!(
                    "Failed to connect to {}:{}: {e}",
                    params.host, params.port
                ));
                self.advance(ConnectorState::Failed);
                false
            }
        }
    }

    fn read(&self, buf: &mut [char]) -> Result<usize> {
        self.streams.read(buf)
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
        self.channel
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|channel| channel.is_connected())
    }

    fn wait_for(&self) -> Result<i32> {
        loop {
            match self.state() {
                ConnectorState::Uninitialized | ConnectorState::Failed => return Ok(0),
                ConnectorState::Closed => return Ok(self.last_exit_status()),
                ConnectorState::Authenticating | ConnectorState::Connecting => {}
                ConnectorState::Connected => {
                    let (running, status) = self.channel_status();
                    if !running {
                        debug!("Remote shell finished with status {}", status);
                        *self.exit_status.lock().unwrap_or_else(PoisonError::into_inner) =
                            Some(status);
                        return Ok(status);
                    }
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
        info!("Closing remote connector: {}", self.name());
        self.gate.close();

        let channel = self
            .channel
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(mut channel) = channel {
            let status = channel.exit_status();
            if status >= 0 {
                *self.exit_status.lock().unwrap_or_else(PoisonError::into_inner) = Some(status);
            }
            channel.disconnect();
        }

        let session = self
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(mut session) = session {
            session.disconnect();
        }

        self.streams.clear();
    }

    fn name(&self) -> String {
        let params = self.params.lock().unwrap_or_else(PoisonError::into_inner);
        match ConnectionParams::parse_host_token(&params.host) {
            Ok((host, _)) => host,
            Err(_) => UNNAMED_REMOTE.to_string(),
        }
    }

    fn state(&self) -> ConnectorState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: SecureTransport> std::fmt::Debug for RemoteChannelConnector<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteChannelConnector")
            .field("params", &self.params())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockTransport, ScriptedPrompt};
    use std::sync::mpsc;
    use std::thread;

    fn connector(
        transport: &MockTransport,
        params: ConnectionParams,
    ) -> RemoteChannelConnector<MockTransport> {
        RemoteChannelConnector::new(Arc::new(transport.clone()), params)
            .with_default_user(None)
    }

    fn no_answers() -> Arc<ScriptedPrompt> {
        Arc::new(ScriptedPrompt::new(Vec::<String>::new()))
    }

    #[test]
    fn test_full_params_skip_prompting() {
        let transport = MockTransport::new();
        let prompt = no_answers();
        let c = connector(
            &transport,
            ConnectionParams::new("localhost:2222", "alice", Some("x".to_string())),
        );

        assert!(c.init(prompt.clone()));
        assert!(prompt.questions().is_empty());
        assert_eq!(
            transport.opened(),
            Some(("alice".to_string(), "localhost".to_string(), 2222))
        );
        assert_eq!(transport.password(), Some("x".to_string()));
        assert_eq!(transport.config(), Some(TransportConfig::default()));
        assert_eq!(c.state(), ConnectorState::Connected);
        assert!(c.is_connected());
        assert_eq!(c.name(), "localhost");
    }

    #[test]
    fn test_channel_is_configured_before_connect() {
        let transport = MockTransport::new();
        let c = connector(&transport, ConnectionParams::new("h", "u", None));
        assert!(c.init(no_answers()));

        let events = transport.events();
        let position = |name: &str| events.iter().position(|e| e.starts_with(name)).unwrap();
        assert!(position("session.connect") < position("session.open_channel"));
        assert!(position("channel.pty_type xterm") < position("channel.connect"));
        assert!(position("channel.input_stream") < position("channel.connect"));
        assert!(events.contains(&"channel.env LANG=en_US.UTF-8".to_string()));
    }

    #[test]
    fn test_missing_user_is_prompted() {
        let transport = MockTransport::new();
        let prompt = Arc::new(ScriptedPrompt::new(["  bob "]));
        let c = connector(&transport, ConnectionParams::new("example.org", "", None));

        assert!(c.init(prompt.clone()));
        assert_eq!(prompt.questions(), vec!["user:".to_string()]);
        assert_eq!(c.params().user, "bob");
        assert_eq!(c.params().port, 22);
    }

    #[test]
    fn test_default_user_used_when_missing() {
        let transport = MockTransport::new();
        let prompt = no_answers();
        let c = RemoteChannelConnector::new(
            Arc::new(transport.clone()),
            ConnectionParams::new("example.org", "", None),
        )
        .with_default_user(Some("Carol".to_string()));

        assert!(c.init(prompt.clone()));
        assert!(prompt.questions().is_empty());
        assert_eq!(c.params().user, "carol");
    }

    #[test]
    fn test_bad_host_reprompts_and_keeps_user() {
        let transport = MockTransport::new();
        let prompt = Arc::new(ScriptedPrompt::new(["still:bad", "good.host:2200"]));
        let c = connector(&transport, ConnectionParams::new("bad:port", "dave", None));

        assert!(c.init(prompt.clone()));
        assert_eq!(
            prompt.questions(),
            vec!["host[:port]:".to_string(), "host[:port]:".to_string()]
        );
        assert_eq!(prompt.messages().len(), 1);
        let params = c.params();
        assert_eq!((params.host.as_str(), params.port), ("good.host", 2200));
        assert_eq!(params.user, "dave");
    }

    #[test]
    fn test_declined_prompt_fails_init() {
        let transport = MockTransport::new();
        let prompt = no_answers();
        let c = connector(&transport, ConnectionParams::new("", "erin", None));

        assert!(!c.init(prompt.clone()));
        assert_eq!(c.state(), ConnectorState::Failed);
        assert_eq!(transport.opened(), None);
        assert_eq!(prompt.messages().len(), 1);
    }

    #[test]
    fn test_connect_failure_reports_message() {
        let transport = MockTransport::new();
        transport.fail_connect("connection refused");
        let prompt = no_answers();
        let c = connector(&transport, ConnectionParams::new("h", "u", None));

        assert!(!c.init(prompt.clone()));
        assert_eq!(c.state(), ConnectorState::Failed);
        assert!(!c.is_connected());
        let messages = prompt.messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("connection refused"));
        assert!(transport.events().contains(&"session.disconnect".to_string()));
        assert_eq!(c.wait_for().unwrap(), 0);
    }

    #[test]
    fn test_missing_password_is_asked_hidden() {
        let transport = MockTransport::new();
        transport.require_password("hunter2");
        let prompt = Arc::new(ScriptedPrompt::new(["hunter2"]));
        let c = connector(&transport, ConnectionParams::new("h", "frank", None));

        assert!(c.init(prompt.clone()));
        assert!(transport.has_user_info());
        assert_eq!(prompt.questions(), vec!["Password for frank@h:".to_string()]);
        assert!(!transport.events().contains(&"session.set_password".to_string()));
    }

    #[test]
    fn test_resize_before_connect_applied_once() {
        let transport = MockTransport::new();
        let c = connector(&transport, ConnectionParams::new("h", "u", None));

        c.resize(TermSize::new(100, 30), PixelSize::new(800, 600)).unwrap();
        c.resize(TermSize::new(80, 24), PixelSize::new(640, 480)).unwrap();
        assert!(transport.resizes().is_empty());
        assert!(c.pending_geometry().is_some());

        assert!(c.init(no_answers()));
        assert_eq!(
            transport.resizes(),
            vec![PendingGeometry::new(TermSize::new(80, 24), PixelSize::new(640, 480))]
        );
        assert_eq!(c.pending_geometry(), None);

        c.resize(TermSize::new(132, 43), PixelSize::default()).unwrap();
        assert_eq!(transport.resizes().len(), 2);
    }

    #[test]
    fn test_read_and_write() {
        let transport = MockTransport::new().with_output("héllo".as_bytes());
        let c = connector(&transport, ConnectionParams::new("h", "u", None));

        // Before connect: writes are dropped
        c.write_str("early").unwrap();
        assert!(c.init(no_answers()));

        c.write_str("ls -la\n").unwrap();
        assert_eq!(transport.written(), b"ls -la\n");

        let mut buf = ['\0'; 16];
        let n = c.read(&mut buf).unwrap();
        assert_eq!(buf[..n].iter().collect::<String>(), "héllo");

        transport.finish(0);
        assert_eq!(c.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_wait_for_returns_exit_status() {
        let transport = MockTransport::new();
        let c = Arc::new(connector(&transport, ConnectionParams::new("h", "u", None)));
        assert!(c.init(no_answers()));

        let waiter = {
            let c = Arc::clone(&c);
            std::thread::spawn(move || c.wait_for())
        };
        std::thread::sleep(Duration::from_millis(150));
        assert!(!waiter.is_finished());

        transport.finish(7);
        assert_eq!(waiter.join().unwrap().unwrap(), 7);
        assert!(!c.is_connected());
    }

    #[test]
    fn test_wait_for_uninitialized_returns_zero() {
        let transport = MockTransport::new();
        let c = connector(&transport, ConnectionParams::new("h", "u", None));
        assert_eq!(c.wait_for().unwrap(), 0);
    }

    #[test]
    fn test_close_is_idempotent() {
        let transport = MockTransport::new();
        let never_opened = connector(&transport, ConnectionParams::new("h", "u", None));
        never_opened.close();
        never_opened.close();
        assert!(!never_opened.is_connected());

        let c = connector(&transport, ConnectionParams::new("h", "u", None));
        assert!(c.init(no_answers()));
        transport.finish(0);
        c.close();
        c.close();
        assert!(!c.is_connected());
        assert_eq!(c.state(), ConnectorState::Closed);
        assert!(c.write(b"ignored").is_ok());
        assert_eq!(c.wait_for().unwrap(), 0);
        assert!(!c.init(no_answers()));
    }

    /// Prompt source that announces each question and waits for the test
    /// to supply the answer.
    struct HeldPrompt {
        asked: Mutex<mpsc::Sender<String>>,
        answers: Mutex<mpsc::Receiver<String>>,
    }

    impl HeldPrompt {
        fn new() -> (Arc<Self>, mpsc::Receiver<String>, mpsc::Sender<String>) {
            let (asked_tx, asked_rx) = mpsc::channel();
            let (answer_tx, answer_rx) = mpsc::channel();
            let prompt = Arc::new(Self {
                asked: Mutex::new(asked_tx),
                answers: Mutex::new(answer_rx),
            });
            (prompt, asked_rx, answer_tx)
        }
    }

    impl PromptSource for HeldPrompt {
        fn question_visible(&self, prompt: &str, _default: &str) -> Option<String> {
            self.asked.lock().unwrap().send(prompt.to_string()).unwrap();
            self.answers.lock().unwrap().recv().ok()
        }

        fn show_message(&self, _message: &str) {}
    }

    #[test]
    fn test_close_while_authenticating_stays_closed() {
        let transport = MockTransport::new();
        let c = Arc::new(connector(&transport, ConnectionParams::new("h", "", None)));
        let (prompt, asked, answer) = HeldPrompt::new();

        let init = {
            let c = Arc::clone(&c);
            thread::spawn(move || c.init(prompt))
        };
        assert_eq!(asked.recv().unwrap(), "user:");
        assert_eq!(c.state(), ConnectorState::Authenticating);

        c.close();
        assert_eq!(c.state(), ConnectorState::Closed);
        answer.send("bob".to_string()).unwrap();

        assert!(!init.join().unwrap());
        assert_eq!(c.state(), ConnectorState::Closed);
        assert!(!c.is_connected());
        assert_eq!(transport.opened(), None);
        assert_eq!(c.wait_for().unwrap(), 0);
    }

    #[test]
    fn test_close_while_connecting_drops_session() {
        let transport = MockTransport::new();
        let release = transport.hold_connect();
        let c = Arc::new(connector(&transport, ConnectionParams::new("h", "u", None)));

        let init = {
            let c = Arc::clone(&c);
            thread::spawn(move || c.init(no_answers()))
        };
        while !transport.events().contains(&"session.connect".to_string()) {
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(c.state(), ConnectorState::Connecting);

        c.close();
        release.send(()).unwrap();

        assert!(!init.join().unwrap());
        assert_eq!(c.state(), ConnectorState::Closed);
        assert!(!c.is_connected());
        let events = transport.events();
        assert!(events.contains(&"channel.disconnect".to_string()));
        assert_eq!(events.last().map(String::as_str), Some("session.disconnect"));
        assert!(matches!(c.read(&mut ['\0'; 4]), Err(Error::NotConnected)));
        assert_eq!(c.wait_for().unwrap(), 0);
    }

    #[test]
    fn test_write_and_wait_for_proceed_while_read_pending() {
        let transport = MockTransport::new();
        let c = Arc::new(connector(&transport, ConnectionParams::new("h", "u", None)));
        assert!(c.init(no_answers()));

        let reader = {
            let c = Arc::clone(&c);
            thread::spawn(move || {
                let mut buf = ['\0'; 16];
                c.read(&mut buf).map(|n| buf[..n].iter().collect::<String>())
            })
        };
        thread::sleep(Duration::from_millis(30));
        assert!(!reader.is_finished());

        c.write_str("echo hi\n").unwrap();
        assert_eq!(transport.written(), b"echo hi\n");
        assert!(c.is_connected());

        transport.set_exit_status(3);
        assert_eq!(c.wait_for().unwrap(), 3);
        assert!(!reader.is_finished());

        c.close();
        assert_eq!(reader.join().unwrap().unwrap(), "");
    }

    #[test]
    fn test_unnamed_remote() {
        let transport = MockTransport::new();
        let c = connector(&transport, ConnectionParams::new("", "u", None));
        assert_eq!(c.name(), "Remote");
    }
}
