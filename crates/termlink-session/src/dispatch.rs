//! Routing of user actions to the objects that carry them out.
//!
//! Every [`ActionCategory`] has one [`ActionStrategy`]. The strategies act
//! on the UI through a [`ViewLayer`].

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use termlink_core::{
    Action, ActionCatalog, ActionCategory, AppConfig, ConnectionParams, PanelArrangement, Result,
};

/// Effects the UI exposes to action strategies.
pub trait ViewLayer: Send + Sync {
    /// Apply `arrangement` and remember it as the current layout.
    fn apply_layout(&self, arrangement: &PanelArrangement);

    /// Make the terminal panel at `index` active.
    fn switch_panel(&self, index: usize);

    /// Open a tab connected with `params`.
    fn create_connection_tab(&self, params: ConnectionParams);

    /// Move keyboard focus to the active terminal.
    fn request_focus(&self);

    /// Apply the theme `theme` and remember it.
    fn apply_theme(&self, theme: &str);

    /// Send `text` to the active terminal as if typed.
    fn forward_typed_input(&self, text: &str);
}

/// Executes actions of one category.
pub trait ActionStrategy: Send + Sync {
    /// Carry out `action`. Returns whether an effect was requested.
    fn execute(&self, action: &Action) -> bool;
}

/// Applies a panel layout.
pub struct LayoutStrategy {
    view: Arc<dyn ViewLayer>,
    arrangements: Vec<PanelArrangement>,
}

impl LayoutStrategy {
    /// Create a strategy choosing among `arrangements`.
    pub fn new(view: Arc<dyn ViewLayer>, arrangements: Vec<PanelArrangement>) -> Self {
        Self { view, arrangements }
    }
}

impl ActionStrategy for LayoutStrategy {
    fn execute(&self, action: &Action) -> bool {
        let Action::Layout { layout, .. } = action else {
            return false;
        };
        match self.arrangements.iter().find(|a| &a.id == layout) {
            Some(arrangement) => {
                self.view.apply_layout(arrangement);
                true
            }
            None => {
                debug!("No panel arrangement for layout '{}'", layout);
                false
            }
        }
    }
}

/// Switches the active terminal panel.
pub struct TerminalPanelStrategy {
    view: Arc<dyn ViewLayer>,
    panels: ActionCatalog,
}

impl TerminalPanelStrategy {
    /// Create a strategy resolving names against `panels`.
    pub fn new(view: Arc<dyn ViewLayer>, panels: ActionCatalog) -> Self {
        Self { view, panels }
    }
}

impl ActionStrategy for TerminalPanelStrategy {
    fn execute(&self, action: &Action) -> bool {
        if action.category() != ActionCategory::TerminalPanel {
            return false;
        }
        // Unknown names land on the first panel
        let index = self.panels.index_of(action.name());
        self.view.switch_panel(index);
        true
    }
}

/// Opens a connection tab and focuses the terminal.
pub struct SshStrategy {
    view: Arc<dyn ViewLayer>,
}

impl SshStrategy {
    /// Create the strategy.
    pub fn new(view: Arc<dyn ViewLayer>) -> Self {
        Self { view }
    }
}

impl ActionStrategy for SshStrategy {
    fn execute(&self, action: &Action) -> bool {
        let Action::Ssh { params, .. } = action else {
            return false;
        };
        if let Some(params) = params {
            self.view.create_connection_tab(params.clone());
        }
        self.view.request_focus();
        true
    }
}

/// Types a literal command into the active terminal.
pub struct CommandStrategy {
    view: Arc<dyn ViewLayer>,
}

impl CommandStrategy {
    /// Create the strategy.
    pub fn new(view: Arc<dyn ViewLayer>) -> Self {
        Self { view }
    }
}

impl ActionStrategy for CommandStrategy {
    fn execute(&self, action: &Action) -> bool {
        match action {
            Action::Command {
                command: Some(command),
                ..
            } => {
                self.view.forward_typed_input(command);
                true
            }
            _ => false,
        }
    }
}

/// Applies a theme.
pub struct ThemeStrategy {
    view: Arc<dyn ViewLayer>,
}

impl ThemeStrategy {
    /// Create the strategy.
    pub fn new(view: Arc<dyn ViewLayer>) -> Self {
        Self { view }
    }
}

impl ActionStrategy for ThemeStrategy {
    fn execute(&self, action: &Action) -> bool {
        let Action::Theme { theme, .. } = action else {
            return false;
        };
        self.view.apply_theme(theme);
        true
    }
}

/// Strategy table keyed by action category.
///
/// Built once at startup and owned by whatever drives dispatch.
#[derive(Default)]
pub struct ActionRegistry {
    strategies: HashMap<ActionCategory, Box<dyn ActionStrategy>>,
}

impl ActionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the five standard strategies, fed from `config`.
    pub fn with_defaults(view: Arc<dyn ViewLayer>, config: &AppConfig) -> Result<Self> {
        let mut registry = Self::new();
        registry.register(
            ActionCategory::Layout,
            Box::new(LayoutStrategy::new(Arc::clone(&view), config.arrangements())),
        );
        registry.register(
            ActionCategory::TerminalPanel,
            Box::new(TerminalPanelStrategy::new(
                Arc::clone(&view),
                config.catalog(ActionCategory::TerminalPanel)?,
            )),
        );
        registry.register(ActionCategory::Ssh, Box::new(SshStrategy::new(Arc::clone(&view))));
        registry.register(
            ActionCategory::Command,
            Box::new(CommandStrategy::new(Arc::clone(&view))),
        );
        registry.register(ActionCategory::Theme, Box::new(ThemeStrategy::new(view)));
        Ok(registry)
    }

    /// Install `strategy` for `category`, replacing any previous one.
    pub fn register(&mut self, category: ActionCategory, strategy: Box<dyn ActionStrategy>) {
        if self.strategies.insert(category, strategy).is_some() {
            debug!("Replaced strategy for {}", category);
        }
    }

    /// Strategy for `category`, if one is registered.
    pub fn strategy(&self, category: ActionCategory) -> Option<&dyn ActionStrategy> {
        self.strategies.get(&category).map(|s| s.as_ref())
    }

    /// Route `action` to its strategy.
    ///
    /// Returns `false` when no strategy is registered for its category or
    /// the strategy requested no effect.
    pub fn dispatch(&self, action: &Action) -> bool {
        let category = action.category();
        let Some(strategy) = self.strategy(category) else {
            debug!("No strategy for {} action '{}'", category, action.name());
            return false;
        };
        info!("Dispatching {} action '{}'", category, action.name());
        strategy.execute(action)
    }

    /// Number of registered strategies.
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    /// Whether no strategy is registered.
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

impl std::fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut categories: Vec<&str> = self.strategies.keys().map(|c| c.name()).collect();
        categories.sort_unstable();
        f.debug_struct("ActionRegistry")
            .field("categories", &categories)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingView {
        calls: Mutex<Vec<String>>,
    }

    impl RecordingView {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    impl ViewLayer for RecordingView {
        fn apply_layout(&self, arrangement: &PanelArrangement) {
            self.record(format!("layout {}", arrangement.id));
        }
        fn switch_panel(&self, index: usize) {
            self.record(format!("panel {index}"));
        }
        fn create_connection_tab(&self, params: ConnectionParams) {
            self.record(format!("tab {}@{}:{}", params.user, params.host, params.port));
        }
        fn request_focus(&self) {
            self.record("focus".to_string());
        }
        fn apply_theme(&self, theme: &str) {
            self.record(format!("theme {theme}"));
        }
        fn forward_typed_input(&self, text: &str) {
            self.record(format!("input {text}"));
        }
    }

    fn registry() -> (Arc<RecordingView>, ActionRegistry) {
        let view = Arc::new(RecordingView::default());
        let mut config = AppConfig::default();
        config.catalogs.panels = vec![
            termlink_core::config::NamedEntry::new("Main", "main"),
            termlink_core::config::NamedEntry::new("Logs", "logs"),
        ];
        let registry = ActionRegistry::with_defaults(view.clone(), &config).unwrap();
        (view, registry)
    }

    #[test]
    fn test_defaults_cover_every_category() {
        let (_, registry) = registry();
        assert_eq!(registry.len(), ActionCategory::ALL.len());
        for category in ActionCategory::ALL {
            assert!(registry.strategy(category).is_some(), "{category}");
        }
    }

    #[test]
    fn test_empty_registry_dispatches_nothing() {
        let registry = ActionRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.strategy(ActionCategory::Theme).is_none());
        assert!(!registry.dispatch(&Action::Theme {
            name: "Dark".to_string(),
            theme: "dark".to_string(),
        }));
    }

    #[test]
    fn test_layout_applies_arrangement() {
        let (view, registry) = registry();
        assert!(registry.dispatch(&Action::Layout {
            name: "Split".to_string(),
            layout: "split".to_string(),
        }));
        assert!(!registry.dispatch(&Action::Layout {
            name: "Grid".to_string(),
            layout: "grid".to_string(),
        }));
        assert_eq!(view.calls(), vec!["layout split".to_string()]);
    }

    #[test]
    fn test_panel_switch_by_name() {
        let (view, registry) = registry();
        let panel = |name: &str| Action::TerminalPanel {
            name: name.to_string(),
            panel: String::new(),
        };

        assert!(registry.dispatch(&panel("Logs")));
        assert!(registry.dispatch(&panel("logs")));
        assert!(registry.dispatch(&panel("Missing")));
        assert_eq!(
            view.calls(),
            vec!["panel 1".to_string(), "panel 0".to_string(), "panel 0".to_string()]
        );
    }

    #[test]
    fn test_ssh_focuses_even_without_params() {
        let (view, registry) = registry();
        assert!(registry.dispatch(&Action::Ssh {
            name: "New".to_string(),
            params: None,
        }));
        assert!(registry.dispatch(&Action::Ssh {
            name: "Box".to_string(),
            params: Some(ConnectionParams::new("box", "root", None)),
        }));
        assert_eq!(
            view.calls(),
            vec![
                "focus".to_string(),
                "tab root@box:22".to_string(),
                "focus".to_string()
            ]
        );
    }

    #[test]
    fn test_command_without_text_does_nothing() {
        let (view, registry) = registry();
        assert!(!registry.dispatch(&Action::Command {
            name: "Empty".to_string(),
            command: None,
        }));
        assert!(view.calls().is_empty());
    }

    #[test]
    fn test_theme_applied() {
        let (view, registry) = registry();
        assert!(registry.dispatch(&Action::Theme {
            name: "Light".to_string(),
            theme: "light".to_string(),
        }));
        assert_eq!(view.calls(), vec!["theme light".to_string()]);
    }

    #[test]
    fn test_strategy_ignores_foreign_action() {
        let view: Arc<dyn ViewLayer> = Arc::new(RecordingView::default());
        let strategy = ThemeStrategy::new(view);
        assert!(!strategy.execute(&Action::Command {
            name: "ls".to_string(),
            command: Some("ls".to_string()),
        }));
    }
}
