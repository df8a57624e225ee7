//! Seam between the remote connector and a secure transport library.
//!
//! The connector only opens a session, hands it credentials and settings,
//! connects it, opens one channel and watches that channel's state. Key
//! exchange, ciphers and authentication mechanics stay in the library.

use std::io::{Read, Write};
use std::time::Duration;

use termlink_core::{Error, PixelSize, Result, TermSize};

/// Settings applied to a session before it connects.
///
/// These are fixed defaults, not user settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    /// Offer zlib compression in both directions
    pub compression: bool,
    /// Give up on the TCP connect and handshake after this long
    pub connect_timeout: Duration,
    /// Keepalive interval; `None` disables keepalives
    pub keepalive: Option<Duration>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            compression: true,
            connect_timeout: Duration::from_secs(30),
            keepalive: None,
        }
    }
}

/// Kind of channel to open on a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    /// Interactive login shell
    Shell,
}

/// One prompt of a keyboard-interactive exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyboardPrompt {
    /// Prompt text sent by the server
    pub text: String,
    /// Whether the answer may be echoed
    pub echo: bool,
}

/// Answers further authentication requests from the remote end.
pub trait UserInfo: Send {
    /// Password for a password (re)try; `None` gives up.
    fn password(&mut self, message: &str) -> Option<String>;

    /// Answers for a keyboard-interactive round, one per prompt.
    fn keyboard_interactive(
        &mut self,
        name: &str,
        instruction: &str,
        prompts: &[KeyboardPrompt],
    ) -> Option<Vec<String>>;

    /// Relay a banner or message from the server.
    fn show_message(&self, message: &str);
}

/// Factory for sessions.
pub trait SecureTransport: Send + Sync + 'static {
    /// Session type produced by this transport.
    type Session: TransportSession;

    /// Create an unconnected session for `user` at `host:port`.
    fn open_session(&self, user: &str, host: &str, port: u16) -> Result<Self::Session>;
}

/// An authenticated connection to a remote host.
pub trait TransportSession: Send + 'static {
    /// Channel type opened on this session.
    type Channel: TransportChannel;

    /// Password to try first.
    fn set_password(&mut self, password: &str);

    /// Fallback for further authentication requests.
    fn set_user_info(&mut self, user_info: Box<dyn UserInfo>);

    /// Apply transport settings.
    fn set_config(&mut self, config: &TransportConfig);

    /// Connect and authenticate.
    fn connect(&mut self) -> Result<()>;

    /// Open a channel of `kind`. The channel still has to be connected.
    fn open_channel(&mut self, kind: ChannelKind) -> Result<Self::Channel>;

    /// Whether the session is still up.
    fn is_connected(&self) -> bool;

    /// Tear the session down.
    fn disconnect(&mut self);
}

/// A duplex stream multiplexed over a session.
pub trait TransportChannel: Send + 'static {
    /// Terminal type requested with the pty.
    fn set_pty_type(&mut self, term: &str);

    /// Environment variable sent before the shell starts.
    fn set_env(&mut self, name: &str, value: &str);

    /// Stream carrying remote output.
    fn input_stream(&mut self) -> Result<Box<dyn Read + Send>>;

    /// Stream carrying local input to the remote end.
    fn output_stream(&mut self) -> Result<Box<dyn Write + Send>>;

    /// Start the channel.
    fn connect(&mut self) -> Result<()>;

    /// Send a window-change request.
    fn set_pty_size(&mut self, term: TermSize, pixels: PixelSize) -> Result<()>;

    /// Exit status of the remote command; negative while it is running.
    fn exit_status(&self) -> i32;

    /// Whether the channel is open.
    fn is_connected(&self) -> bool;

    /// Close the channel.
    fn disconnect(&mut self);
}

/// Transport used when no secure transport library is compiled in.
///
/// Every session request fails, so remote connectors report a connect
/// failure instead of connecting.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTransport;

/// Session type of [`NoTransport`]; never constructed.
#[derive(Debug)]
pub enum NoSession {}

/// Channel type of [`NoTransport`]; never constructed.
#[derive(Debug)]
pub enum NoChannel {}

impl SecureTransport for NoTransport {
    type Session = NoSession;

    fn open_session(&self, _user: &str, _host: &str, _port: u16) -> Result<NoSession> {
        Err(Error::Transport(
            "no secure transport available in this build".to_string(),
        ))
    }
}

impl TransportSession for NoSession {
    type Channel = NoChannel;

    fn set_password(&mut self, _password: &str) {
        match *self {}
    }

    fn set_user_info(&mut self, _user_info: Box<dyn UserInfo>) {
        match *self {}
    }

    fn set_config(&mut self, _config: &TransportConfig) {
        match *self {}
    }

    fn connect(&mut self) -> Result<()> {
        match *self {}
    }

    fn open_channel(&mut self, _kind: ChannelKind) -> Result<NoChannel> {
        match *self {}
    }

    fn is_connected(&self) -> bool {
        match *self {}
    }

    fn disconnect(&mut self) {
        match *self {}
    }
}

impl TransportChannel for NoChannel {
    fn set_pty_type(&mut self, _term: &str) {
        match *self {}
    }

    fn set_env(&mut self, _name: &str, _value: &str) {
        match *self {}
    }

    fn input_stream(&mut self) -> Result<Box<dyn Read + Send>> {
        match *self {}
    }

    fn output_stream(&mut self) -> Result<Box<dyn Write + Send>> {
        match *self {}
    }

    fn connect(&mut self) -> Result<()> {
        match *self {}
    }

    fn set_pty_size(&mut self, _term: TermSize, _pixels: PixelSize) -> Result<()> {
        match *self {}
    }

    fn exit_status(&self) -> i32 {
        match *self {}
    }

    fn is_connected(&self) -> bool {
        match *self {}
    }

    fn disconnect(&mut self) {
        match *self {}
    }
}
