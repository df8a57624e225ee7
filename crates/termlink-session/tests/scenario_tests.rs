//! End-to-end connection and dispatch scenarios.

use std::sync::{Arc, Mutex};

use termlink_connector::testing::{MockTransport, ScriptedPrompt};
use termlink_connector::{ConnectorState, TtyConnector};
use termlink_core::{
    Action, AppConfig, ConnectionParams, PanelArrangement, PendingGeometry, PixelSize, TermSize,
};
use termlink_session::{open_connector, ActionRegistry, ViewLayer};

fn silent_prompt() -> Arc<ScriptedPrompt> {
    Arc::new(ScriptedPrompt::new(Vec::<String>::new()))
}

#[test]
fn test_remote_connect_with_full_params() {
    let transport = MockTransport::new();
    let params = ConnectionParams::new("localhost:2222", "alice", Some("x".to_string()));
    let connector =
        open_connector(&params, Arc::new(transport.clone()), &AppConfig::default()).unwrap();

    // Issued before the channel exists
    connector
        .resize(TermSize::new(80, 24), PixelSize::new(640, 480))
        .unwrap();
    assert!(transport.resizes().is_empty());

    let prompt = silent_prompt();
    assert!(connector.init(prompt.clone()));
    assert!(prompt.questions().is_empty());
    assert_eq!(
        transport.opened(),
        Some(("alice".to_string(), "localhost".to_string(), 2222))
    );
    assert_eq!(transport.password(), Some("x".to_string()));
    assert_eq!(
        transport.resizes(),
        vec![PendingGeometry::new(
            TermSize::new(80, 24),
            PixelSize::new(640, 480)
        )]
    );
    assert_eq!(connector.state(), ConnectorState::Connected);

    connector.close();
    connector.close();
    assert!(!connector.is_connected());
    assert_eq!(transport.resizes().len(), 1);
}

#[cfg(unix)]
#[test]
fn test_local_default_shell() {
    use termlink_connector::{LocalProcessConnector, LocalShellConfig};

    let connector = LocalProcessConnector::spawn(&LocalShellConfig::default()).unwrap();
    assert_eq!(connector.name(), "Local");
    assert!(connector.init(silent_prompt()));

    connector
        .write_str("echo \"term=$TERM lang=[$LANG]\"; exit\n")
        .unwrap();

    let mut output = String::new();
    let mut buf = ['\0'; 256];
    loop {
        let n = connector.read(&mut buf).unwrap();
        if n == 0 {
            break;
        }
        output.extend(&buf[..n]);
    }

    assert!(output.contains("term=xterm lang=["), "{output}");
    assert!(!output.contains("lang=[]"), "{output}");
    assert_eq!(connector.chunks().concat(), output);
    assert_eq!(connector.wait_for().unwrap(), 0);
}

#[derive(Default)]
struct RecordingView {
    calls: Mutex<Vec<String>>,
}

impl RecordingView {
    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

impl ViewLayer for RecordingView {
    fn apply_layout(&self, arrangement: &PanelArrangement) {
        self.record(format!("apply_layout {}", arrangement.id));
    }
    fn switch_panel(&self, index: usize) {
        self.record(format!("switch_panel {index}"));
    }
    fn create_connection_tab(&self, params: ConnectionParams) {
        self.record(format!("create_connection_tab {}", params.host));
    }
    fn request_focus(&self) {
        self.record("request_focus".to_string());
    }
    fn apply_theme(&self, theme: &str) {
        self.record(format!("apply_theme {theme}"));
    }
    fn forward_typed_input(&self, text: &str) {
        self.record(format!("forward_typed_input {text}"));
    }
}

#[test]
fn test_command_action_types_input_only() {
    let view = Arc::new(RecordingView::default());
    let registry = ActionRegistry::with_defaults(view.clone(), &AppConfig::default()).unwrap();

    let action = Action::Command {
        name: "List".to_string(),
        command: Some("ls -la".to_string()),
    };
    assert!(registry.dispatch(&action));
    assert_eq!(
        *view.calls.lock().unwrap(),
        vec!["forward_typed_input ls -la".to_string()]
    );
}

#[test]
fn test_configured_catalogs_dispatch() {
    let yaml = r#"
catalogs:
  commands:
    - name: Uptime
      command: uptime
  hosts:
    - name: Build box
      host: build.example.com:2022
      user: ci
"#;
    let config = AppConfig::from_yaml(yaml).unwrap();
    let view = Arc::new(RecordingView::default());
    let registry = ActionRegistry::with_defaults(view.clone(), &config).unwrap();

    let commands = config
        .catalog(termlink_core::ActionCategory::Command)
        .unwrap();
    let hosts = config.catalog(termlink_core::ActionCategory::Ssh).unwrap();
    for action in commands.iter().chain(hosts.iter()) {
        assert!(registry.dispatch(action));
    }

    assert_eq!(
        *view.calls.lock().unwrap(),
        vec![
            "forward_typed_input uptime".to_string(),
            "create_connection_tab build.example.com:2022".to_string(),
            "request_focus".to_string(),
        ]
    );
}
