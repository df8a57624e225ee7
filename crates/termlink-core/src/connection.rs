//! Connection parameters for remote sessions.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Port used when a host token carries none.
pub const DEFAULT_SSH_PORT: u16 = 22;

/// Parameters for opening a remote session.
///
/// `host` may hold a combined `host[:port]` token until it is resolved with
/// [`ConnectionParams::apply_host_token`]. An empty host selects the local
/// backend.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionParams {
    /// Host name or `host[:port]` token
    pub host: String,
    /// Remote port
    pub port: u16,
    /// Login name
    pub user: String,
    /// Password, if known up front
    pub password: Option<String>,
}

impl ConnectionParams {
    /// Create parameters from a host token, user and optional password.
    pub fn new(host: impl Into<String>, user: impl Into<String>, password: Option<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_SSH_PORT,
            user: user.into(),
            password,
        }
    }

    /// Parameters that select the local backend.
    pub fn local() -> Self {
        Self::default()
    }

    /// Whether these parameters select the local backend.
    pub fn is_local(&self) -> bool {
        self.host.trim().is_empty()
    }

    /// Split a `host[:port]` token into its parts.
    ///
    /// The port is `None` when the token has no `:` separator.
    pub fn parse_host_token(token: &str) -> Result<(String, Option<u16>)> {
        let token = token.trim();
        if token.is_empty() {
            return Err(Error::InvalidHostToken("empty host".to_string()));
        }

        let Some((host, port)) = token.split_once(':') else {
            return Ok((token.to_string(), None));
        };

        if host.is_empty() {
            return Err(Error::InvalidHostToken(format!("missing host in '{token}'")));
        }

        match port.parse::<u16>() {
            Ok(port) => Ok((host.to_string(), Some(port))),
            Err(_) => Err(Error::InvalidHostToken(format!(
                "invalid port '{port}' in '{token}'"
            ))),
        }
    }

    /// Resolve `token` into `host` and `port`.
    ///
    /// The current port is kept when the token carries none. On error the
    /// parameters are left untouched.
    pub fn apply_host_token(&mut self, token: &str) -> Result<()> {
        let (host, port) = Self::parse_host_token(token)?;
        self.host = host;
        if let Some(port) = port {
            self.port = port;
        }
        Ok(())
    }
}

impl Default for ConnectionParams {
    fn default() -> Self {
        Self::new("", "", None)
    }
}

impl std::fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
