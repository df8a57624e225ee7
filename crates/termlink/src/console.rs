//! Console implementations of the prompt source and view layer.

use std::io::{BufRead, Write};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use termlink_connector::PromptSource;
use termlink_core::{Action, ActionCategory, AppConfig, ConnectionParams, PanelArrangement};
use termlink_session::ViewLayer;

/// Lines of console input, newline included, shared by every reader.
pub type SharedLines = Arc<Mutex<Receiver<String>>>;

/// Read `input` line by line on a dedicated thread.
///
/// The channel closes at end of input.
pub fn spawn_line_reader<R>(mut input: R) -> SharedLines
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || loop {
        let mut line = String::new();
        match input.read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {
                if tx.send(line).is_err() {
                    break;
                }
            }
            Err(e) => {
                warn!("Console input failed: {}", e);
                break;
            }
        }
    });
    Arc::new(Mutex::new(rx))
}

/// Next line from `lines`, or `None` once input ended.
pub fn next_line(lines: &SharedLines) -> Option<String> {
    lines
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .recv()
        .ok()
}

/// Prompt source answering from console lines.
///
/// Questions go to `output`; end of input answers `None`.
pub struct ConsolePrompt<W> {
    lines: SharedLines,
    output: Mutex<W>,
}

impl<W: Write + Send> ConsolePrompt<W> {
    /// Create a prompt writing questions to `output`.
    pub fn new(lines: SharedLines, output: W) -> Self {
        Self {
            lines,
            output: Mutex::new(output),
        }
    }

    fn ask(&self, question: &str) -> Option<String> {
        {
            let mut output = self.output.lock().unwrap_or_else(PoisonError::into_inner);
            let _ = write!(output, "{question} ");
            let _ = output.flush();
        }

        let answer = next_line(&self.lines);
        if answer.is_none() {
            debug!("Console input ended while asking '{}'", question);
        }
        answer.map(|line| line.trim_end_matches(['\r', '\n']).to_string())
    }
}

impl<W: Write + Send> PromptSource for ConsolePrompt<W> {
    fn question_visible(&self, prompt: &str, default: &str) -> Option<String> {
        let question = if default.is_empty() {
            prompt.to_string()
        } else {
            format!("{prompt} [{default}]")
        };
        let answer = self.ask(&question)?;
        if answer.trim().is_empty() && !default.is_empty() {
            Some(default.to_string())
        } else {
            Some(answer)
        }
    }

    fn question_hidden(&self, prompt: &str) -> Option<String> {
        self.ask(prompt)
    }

    fn show_message(&self, message: &str) {
        let mut output = self.output.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = writeln!(output, "{message}");
    }
}

/// View layer of a single console terminal.
///
/// Typed input goes to the session; everything else is reported, since a
/// console has no panels, tabs or themes.
pub struct ConsoleView {
    input: UnboundedSender<String>,
}

impl ConsoleView {
    /// Forward typed input to `input`.
    pub fn new(input: UnboundedSender<String>) -> Self {
        Self { input }
    }
}

impl ViewLayer for ConsoleView {
    fn apply_layout(&self, arrangement: &PanelArrangement) {
        info!(
            "Layout '{}' requested ({} panel(s))",
            arrangement.id,
            arrangement.panels.len()
        );
    }

    fn switch_panel(&self, index: usize) {
        info!("Panel {} requested", index);
    }

    fn create_connection_tab(&self, params: ConnectionParams) {
        info!(
            "Connection requested: run termlink --host {} --user {}",
            params.host, params.user
        );
    }

    fn request_focus(&self) {}

    fn apply_theme(&self, theme: &str) {
        info!("Theme '{}' requested", theme);
    }

    fn forward_typed_input(&self, text: &str) {
        if self.input.send(format!("{text}\n")).is_err() {
            warn!("Session input closed, dropped: {}", text);
        }
    }
}

/// First action named `name`, searching catalogs in category order.
pub fn find_action(config: &AppConfig, name: &str) -> termlink_core::Result<Option<Action>> {
    for category in ActionCategory::ALL {
        if let Some(action) = config.catalog(category)?.find(name) {
            return Ok(Some(action.clone()));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn prompt(input: &str) -> ConsolePrompt<Vec<u8>> {
        let lines = spawn_line_reader(Cursor::new(input.as_bytes().to_vec()));
        ConsolePrompt::new(lines, Vec::new())
    }

    fn written(prompt: ConsolePrompt<Vec<u8>>) -> String {
        String::from_utf8(prompt.output.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn test_answers_line_by_line() {
        let p = prompt("example.org\r\nbob\n");
        assert_eq!(
            p.question_visible("host[:port]:", ""),
            Some("example.org".to_string())
        );
        assert_eq!(p.question_visible("user:", ""), Some("bob".to_string()));
        assert_eq!(p.question_visible("user:", ""), None);
        assert_eq!(written(p), "host[:port]: user: user: ");
    }

    #[test]
    fn test_empty_answer_takes_default() {
        let p = prompt("\n");
        assert_eq!(
            p.question_visible("host[:port]:", "old.host"),
            Some("old.host".to_string())
        );
        assert_eq!(written(p), "host[:port]: [old.host] ");
    }

    #[test]
    fn test_messages_written() {
        let p = prompt("");
        p.show_message("Failed to connect");
        assert_eq!(p.question_hidden("Password:"), None);
        assert_eq!(written(p), "Failed to connect\nPassword: ");
    }

    #[test]
    fn test_lines_keep_newline() {
        let lines = spawn_line_reader(Cursor::new(b"ls\npwd".to_vec()));
        assert_eq!(next_line(&lines), Some("ls\n".to_string()));
        assert_eq!(next_line(&lines), Some("pwd".to_string()));
        assert_eq!(next_line(&lines), None);
    }

    #[test]
    fn test_typed_input_forwarded_with_newline() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let view = ConsoleView::new(tx);
        view.forward_typed_input("ls -la");
        assert_eq!(rx.try_recv().unwrap(), "ls -la\n");
    }

    #[test]
    fn test_find_action_across_catalogs() {
        let config = AppConfig::default();
        let action = find_action(&config, "Light").unwrap().unwrap();
        assert_eq!(action.category(), ActionCategory::Theme);
        assert!(find_action(&config, "Nope").unwrap().is_none());
    }
}
