//! [`SecureTransport`] backed by libssh2.
//!
//! libssh2 serializes every call on a session behind one lock. Once the shell
//! is running the session is switched to non-blocking mode and the channel
//! streams are polled, so a pending read never holds that lock while writes
//! or exit-status checks wait for it.

use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use ssh2::{ErrorCode, KeyboardInteractivePrompt, Prompt};
use tracing::{debug, info, warn};

use termlink_core::{Error, PixelSize, Result, TermSize};

use crate::{
    ChannelKind, KeyboardPrompt, PollingStream, SecureTransport, TransportChannel,
    TransportConfig, TransportSession, UserInfo,
};

/// Password prompts offered before giving up.
const MAX_PASSWORD_ATTEMPTS: usize = 3;

/// `LIBSSH2_ERROR_EAGAIN`
const LIBSSH2_ERROR_EAGAIN: i32 = -37;

/// Sleep between attempts on a non-blocking session.
const IO_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Attempts for a non-blocking control request (about five seconds).
const RETRY_LIMIT: u32 = 500;

fn would_block(e: &ssh2::Error) -> bool {
    matches!(e.code(), ErrorCode::Session(code) if code == LIBSSH2_ERROR_EAGAIN)
}

fn transport_error(e: ssh2::Error) -> Error {
    if would_block(&e) {
        Error::Interrupted
    } else {
        Error::Transport(e.to_string())
    }
}

/// Run `op` until the session stops reporting `EAGAIN`, at most `limit` times.
fn retry<T>(
    limit: u32,
    mut op: impl FnMut() -> std::result::Result<T, ssh2::Error>,
) -> Result<T> {
    let mut attempts = 1;
    loop {
        match op() {
            Err(e) if would_block(&e) && attempts < limit => {
                attempts += 1;
                std::thread::sleep(IO_POLL_INTERVAL);
            }
            result => return result.map_err(transport_error),
        }
    }
}

/// SSH transport using the `ssh2` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct SshTransport;

impl SshTransport {
    /// Create the transport.
    pub fn new() -> Self {
        Self
    }
}

impl SecureTransport for SshTransport {
    type Session = SshSession;

    fn open_session(&self, user: &str, host: &str, port: u16) -> Result<SshSession> {
        Ok(SshSession {
            user: user.to_string(),
            host: host.to_string(),
            port,
            password: None,
            user_info: None,
            config: TransportConfig::default(),
            session: None,
        })
    }
}

/// An SSH connection.
pub struct SshSession {
    user: String,
    host: String,
    port: u16,
    password: Option<String>,
    user_info: Option<Box<dyn UserInfo>>,
    config: TransportConfig,
    session: Option<ssh2::Session>,
}

impl SshSession {
    fn tcp_connect(&self) -> Result<TcpStream> {
        let addrs = (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| Error::ConnectFailed(format!("{}: {e}", self.host)))?;

        let mut last_error = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, self.config.connect_timeout) {
                Ok(stream) => return Ok(stream),
                Err(e) => {
                    debug!("TCP connect to {} failed: {}", addr, e);
                    last_error = Some(e);
                }
            }
        }
        Err(Error::ConnectFailed(match last_error {
            Some(e) => e.to_string(),
            None => format!("no address for {}", self.host),
        }))
    }

    fn authenticate(&mut self, session: &ssh2::Session) -> Result<()> {
        let methods = session
            .auth_methods(&self.user)
            .map_err(transport_error)?
            .to_string();
        debug!("Server offers authentication methods: {}", methods);

        if let Some(password) = &self.password {
            if methods.contains("password") {
                if let Err(e) = session.userauth_password(&self.user, password) {
                    debug!("Password authentication failed: {}", e);
                }
            }
        }

        if !session.authenticated() && methods.contains("keyboard-interactive") {
            if let Some(user_info) = self.user_info.as_deref_mut() {
                let mut bridge = InteractiveBridge {
                    user_info,
                    declined: false,
                };
                let result = session.userauth_keyboard_interactive(&self.user, &mut bridge);
                if bridge.declined {
                    return Err(Error::Cancelled("authentication declined".to_string()));
                }
                if let Err(e) = result {
                    debug!("Keyboard-interactive authentication failed: {}", e);
                }
            }
        }

        let mut attempts = 0;
        while !session.authenticated() && methods.contains("password") {
            let Some(user_info) = self.user_info.as_deref_mut() else {
                break;
            };
            if attempts == MAX_PASSWORD_ATTEMPTS {
                break;
            }
            attempts += 1;

            let message = format!("Password for {}@{}:", self.user, self.host);
            let password = user_info
                .password(&message)
                .ok_or_else(|| Error::Cancelled("authentication declined".to_string()))?;
            if let Err(e) = session.userauth_password(&self.user, &password) {
                debug!("Password attempt {} failed: {}", attempts, e);
            }
        }

        if session.authenticated() {
            Ok(())
        } else {
            Err(Error::ConnectFailed(format!(
                "authentication failed for {}@{}",
                self.user, self.host
            )))
        }
    }
}

impl TransportSession for SshSession {
    type Channel = SshChannel;

    fn set_password(&mut self, password: &str) {
        self.password = Some(password.to_string());
    }

    fn set_user_info(&mut self, user_info: Box<dyn UserInfo>) {
        self.user_info = Some(user_info);
    }

    fn set_config(&mut self, config: &TransportConfig) {
        self.config = config.clone();
    }

    fn connect(&mut self) -> Result<()> {
        let tcp = self.tcp_connect()?;

        let mut session = ssh2::Session::new().map_err(transport_error)?;
        session.set_tcp_stream(tcp);
        session.set_compress(self.config.compression);
        session.set_timeout(self.config.connect_timeout.as_millis().min(u32::MAX as u128) as u32);
        session.handshake().map_err(transport_error)?;

        if let (Some(banner), Some(user_info)) = (session.banner(), self.user_info.as_ref()) {
            user_info.show_message(banner);
        }

        self.authenticate(&session)?;

        if let Some(interval) = self.config.keepalive {
            session.set_keepalive(false, interval.as_secs().min(u32::MAX as u64) as u32);
        }

        info!("SSH session authenticated: {}@{}:{}", self.user, self.host, self.port);
        self.session = Some(session);
        Ok(())
    }

    fn open_channel(&mut self, kind: ChannelKind) -> Result<SshChannel> {
        let session = self.session.as_ref().ok_or(Error::NotConnected)?;
        let channel = match kind {
            ChannelKind::Shell => session.channel_session().map_err(transport_error)?,
        };
        Ok(SshChannel {
            channel,
            session: session.clone(),
            closed: Arc::new(AtomicBool::new(false)),
            term: "xterm".to_string(),
            env: Vec::new(),
            size: TermSize::default(),
            pixels: PixelSize::default(),
            open: false,
        })
    }

    fn is_connected(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.authenticated())
    }

    fn disconnect(&mut self) {
        if let Some(session) = self.session.take() {
            let result = retry(RETRY_LIMIT, || session.disconnect(None, "closed by user", None));
            if let Err(e) = result {
                debug!("SSH disconnect: {}", e);
            }
        }
    }
}

/// A shell channel on an [`SshSession`].
pub struct SshChannel {
    channel: ssh2::Channel,
    session: ssh2::Session,
    closed: Arc<AtomicBool>,
    term: String,
    env: Vec<(String, String)>,
    size: TermSize,
    pixels: PixelSize,
    open: bool,
}

impl TransportChannel for SshChannel {
    fn set_pty_type(&mut self, term: &str) {
        self.term = term.to_string();
    }

    fn set_env(&mut self, name: &str, value: &str) {
        self.env.push((name.to_string(), value.to_string()));
    }

    fn input_stream(&mut self) -> Result<Box<dyn Read + Send>> {
        Ok(Box::new(self.polled_stream()))
    }

    fn output_stream(&mut self) -> Result<Box<dyn Write + Send>> {
        Ok(Box::new(self.polled_stream()))
    }

    fn connect(&mut self) -> Result<()> {
        let dims = (
            u32::from(self.size.cols),
            u32::from(self.size.rows),
            u32::from(self.pixels.width),
            u32::from(self.pixels.height),
        );
        self.channel
            .request_pty(&self.term, None, Some(dims))
            .map_err(transport_error)?;

        for (name, value) in &self.env {
            // Servers commonly refuse AcceptEnv for anything not whitelisted
            if let Err(e) = self.channel.setenv(name, value) {
                warn!("Server rejected {}: {}", name, e);
            }
        }

        self.channel.shell().map_err(transport_error)?;
        self.session.set_blocking(false);
        self.open = true;
        Ok(())
    }

    fn set_pty_size(&mut self, term: TermSize, pixels: PixelSize) -> Result<()> {
        self.size = term;
        self.pixels = pixels;
        if !self.open {
            return Ok(());
        }
        retry(RETRY_LIMIT, || {
            self.channel.request_pty_size(
                u32::from(term.cols),
                u32::from(term.rows),
                Some(u32::from(pixels.width)),
                Some(u32::from(pixels.height)),
            )
        })
    }

    fn exit_status(&self) -> i32 {
        if !self.channel.eof() {
            return -1;
        }
        self.channel.exit_status().unwrap_or(0)
    }

    fn is_connected(&self) -> bool {
        self.open && !self.channel.eof()
    }

    fn disconnect(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
        if !self.open {
            return;
        }
        self.open = false;
        if let Err(e) = retry(RETRY_LIMIT, || self.channel.close()) {
            debug!("SSH channel close: {}", e);
        }
    }
}

impl SshChannel {
    fn polled_stream(&self) -> PollingStream<ssh2::Stream> {
        PollingStream::new(
            self.channel.stream(0),
            IO_POLL_INTERVAL,
            Arc::clone(&self.closed),
        )
    }
}

/// Feeds keyboard-interactive rounds to a [`UserInfo`].
struct InteractiveBridge<'a> {
    user_info: &'a mut dyn UserInfo,
    declined: bool,
}

impl KeyboardInteractivePrompt for InteractiveBridge<'_> {
    fn prompt<'p>(
        &mut self,
        username: &str,
        instructions: &str,
        prompts: &[Prompt<'p>],
    ) -> Vec<String> {
        let prompts: Vec<KeyboardPrompt> = prompts
            .iter()
            .map(|p| KeyboardPrompt {
                text: p.text.to_string(),
                echo: p.echo,
            })
            .collect();

        match self
            .user_info
            .keyboard_interactive(username, instructions, &prompts)
        {
            Some(answers) => answers,
            None => {
                self.declined = true;
                Vec::new()
            }
        }
    }
}
