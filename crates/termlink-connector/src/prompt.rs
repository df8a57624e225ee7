//! Interactive question/answer capability used while connecting.

/// Source of answers for missing connection parameters.
///
/// Implemented by the UI layer. Answers of `None` mean the user declined.
pub trait PromptSource: Send + Sync {
    /// Ask a question whose answer may be echoed, offering `default`.
    fn question_visible(&self, prompt: &str, default: &str) -> Option<String>;

    /// Ask for a secret.
    fn question_hidden(&self, prompt: &str) -> Option<String> {
        self.question_visible(prompt, "")
    }

    /// Show a message near the prompt.
    fn show_message(&self, message: &str);
}
