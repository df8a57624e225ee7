//! Automatic answers to authentication requests.

use std::sync::Arc;

use tracing::debug;

use crate::{KeyboardPrompt, PromptSource, UserInfo};

/// [`UserInfo`] that answers with a known password and otherwise asks the
/// prompt source.
pub struct CredentialResponder {
    password: Option<String>,
    prompt: Arc<dyn PromptSource>,
}

impl CredentialResponder {
    /// Create a responder. A blank password counts as unknown.
    pub fn new(password: Option<String>, prompt: Arc<dyn PromptSource>) -> Self {
        Self {
            password: password.filter(|p| !p.is_empty()),
            prompt,
        }
    }

    /// Whether requests for secrets are answered without prompting.
    pub fn knows_password(&self) -> bool {
        self.password.is_some()
    }
}

impl UserInfo for CredentialResponder {
    fn password(&mut self, message: &str) -> Option<String> {
        if let Some(password) = &self.password {
            debug!("Answering password request with the supplied password");
            return Some(password.clone());
        }
        self.prompt.question_hidden(message)
    }

    fn keyboard_interactive(
        &mut self,
        name: &str,
        instruction: &str,
        prompts: &[KeyboardPrompt],
    ) -> Option<Vec<String>> {
        debug!(
            "Keyboard-interactive request: name='{}', {} prompt(s)",
            name,
            prompts.len()
        );
        if !instruction.trim().is_empty() {
            self.prompt.show_message(instruction);
        }

        prompts
            .iter()
            .map(|p| match (&self.password, p.echo) {
                (Some(password), false) => Some(password.clone()),
                (_, true) => self.prompt.question_visible(&p.text, ""),
                (None, false) => self.prompt.question_hidden(&p.text),
            })
            .collect()
    }

    fn show_message(&self, message: &str) {
        self.prompt.show_message(message);
    }
}

impl std::fmt::Debug for CredentialResponder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialResponder")
            .field("knows_password", &self.knows_password())
            .finish_non_exhaustive()
    }
}
