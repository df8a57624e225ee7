//! Choice of connector backend for a connection request.

use std::sync::Arc;

use tracing::info;

use termlink_connector::{
    ChannelSetup, LocalProcessConnector, LocalShellConfig, RemoteChannelConnector,
    SecureTransport, TtyConnector,
};
use termlink_core::{AppConfig, ConnectionParams, Result};

/// Create the connector for `params`.
///
/// A blank host selects a local shell, spawned immediately. Anything else
/// selects a remote shell over `transport`, which connects on `init`.
pub fn open_connector<T: SecureTransport>(
    params: &ConnectionParams,
    transport: Arc<T>,
    config: &AppConfig,
) -> Result<Arc<dyn TtyConnector>> {
    if params.is_local() {
        info!("Opening local shell");
        let shell = LocalShellConfig::from_settings(&config.terminal, &config.local);
        return Ok(Arc::new(LocalProcessConnector::spawn(&shell)?));
    }

    info!("Opening remote shell: {:?}", params);
    let setup = ChannelSetup::shell(config.terminal.term.clone(), config.terminal.locale.clone());
    Ok(Arc::new(RemoteChannelConnector::with_setup(
        transport,
        params.clone(),
        setup,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use termlink_connector::testing::{MockTransport, ScriptedPrompt};
    use termlink_connector::ConnectorState;

    #[test]
    fn test_host_selects_remote() {
        let transport = MockTransport::new();
        let params = ConnectionParams::new("db.internal:2200", "ops", None);
        let connector =
            open_connector(&params, Arc::new(transport.clone()), &AppConfig::default()).unwrap();

        assert_eq!(connector.name(), "db.internal");
        assert_eq!(connector.state(), ConnectorState::Uninitialized);
        assert!(transport.opened().is_none());

        assert!(connector.init(Arc::new(ScriptedPrompt::new(Vec::<String>::new()))));
        assert_eq!(
            transport.opened(),
            Some(("ops".to_string(), "db.internal".to_string(), 2200))
        );
    }

    #[test]
    fn test_remote_uses_configured_terminal() {
        let transport = MockTransport::new();
        let mut config = AppConfig::default();
        config.terminal.term = "xterm-256color".to_string();
        config.terminal.locale = "de_DE.UTF-8".to_string();

        let params = ConnectionParams::new("h", "u", None);
        let connector = open_connector(&params, Arc::new(transport.clone()), &config).unwrap();
        assert!(connector.init(Arc::new(ScriptedPrompt::new(Vec::<String>::new()))));

        let events = transport.events();
        assert!(events.contains(&"channel.pty_type xterm-256color".to_string()));
        assert!(events.contains(&"channel.env LANG=de_DE.UTF-8".to_string()));
    }

    #[cfg(unix)]
    #[test]
    fn test_blank_host_selects_local() {
        let mut config = AppConfig::default();
        config.local.shell = Some("/bin/sh".to_string());

        let params = ConnectionParams::new("   ", "ignored", None);
        let connector =
            open_connector(&params, Arc::new(MockTransport::new()), &config).unwrap();

        assert_eq!(connector.name(), "Local");
        assert!(connector.is_connected());
        connector.close();
        assert!(!connector.is_connected());
    }
}
