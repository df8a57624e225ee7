//! Actions and ordered action catalogs.
//!
//! Menus, tabs and buttons all resolve to an [`Action`]. Actions are grouped
//! into one [`ActionCatalog`] per [`ActionCategory`]; catalog order defines
//! menu and tab order.

use serde::{Deserialize, Serialize};

use crate::{ConnectionParams, Error, Result};

/// Category an action belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionCategory {
    /// Change the panel layout
    Layout,
    /// Switch the active terminal panel
    TerminalPanel,
    /// Open a remote connection
    Ssh,
    /// Type a command into the active terminal
    Command,
    /// Change the look and feel
    Theme,
}

impl ActionCategory {
    /// All categories, in menu order.
    pub const ALL: [ActionCategory; 5] = [
        ActionCategory::Layout,
        ActionCategory::TerminalPanel,
        ActionCategory::Ssh,
        ActionCategory::Command,
        ActionCategory::Theme,
    ];

    /// Lowercase name of the category.
    pub fn name(&self) -> &'static str {
        match self {
            ActionCategory::Layout => "layout",
            ActionCategory::TerminalPanel => "terminal_panel",
            ActionCategory::Ssh => "ssh",
            ActionCategory::Command => "command",
            ActionCategory::Theme => "theme",
        }
    }
}

impl std::fmt::Display for ActionCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Panel arrangement a layout identifier resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelArrangement {
    /// Layout identifier
    pub id: String,
    /// Panels shown by this layout, in display order
    pub panels: Vec<String>,
}

/// A user intent routed through the dispatch registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Apply a panel layout
    Layout {
        /// Display label
        name: String,
        /// Layout identifier
        layout: String,
    },
    /// Switch to a terminal panel
    TerminalPanel {
        /// Display label
        name: String,
        /// Panel identifier
        panel: String,
    },
    /// Open a connection tab
    Ssh {
        /// Display label
        name: String,
        /// Connection parameters, if any
        params: Option<ConnectionParams>,
    },
    /// Send a literal command to the active terminal
    Command {
        /// Display label
        name: String,
        /// Command text, if any
        command: Option<String>,
    },
    /// Apply a theme
    Theme {
        /// Display label
        name: String,
        /// Theme identifier
        theme: String,
    },
}

impl Action {
    /// Category of this action.
    pub fn category(&self) -> ActionCategory {
        match self {
            Action::Layout { .. } => ActionCategory::Layout,
            Action::TerminalPanel { .. } => ActionCategory::TerminalPanel,
            Action::Ssh { .. } => ActionCategory::Ssh,
            Action::Command { .. } => ActionCategory::Command,
            Action::Theme { .. } => ActionCategory::Theme,
        }
    }

    /// Display label of this action.
    pub fn name(&self) -> &str {
        match self {
            Action::Layout { name, .. }
            | Action::TerminalPanel { name, .. }
            | Action::Ssh { name, .. }
            | Action::Command { name, .. }
            | Action::Theme { name, .. } => name,
        }
    }
}

/// Ordered, duplicate-free list of actions of a single category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionCatalog {
    category: ActionCategory,
    actions: Vec<Action>,
}

impl ActionCatalog {
    /// Create an empty catalog.
    pub fn empty(category: ActionCategory) -> Self {
        Self {
            category,
            actions: Vec::new(),
        }
    }

    /// Build a catalog, rejecting duplicate names and foreign categories.
    pub fn new(category: ActionCategory, actions: Vec<Action>) -> Result<Self> {
        let mut catalog = Self::empty(category);
        for action in actions {
            catalog.push(action)?;
        }
        Ok(catalog)
    }

    /// Append an action to the end of the catalog.
    pub fn push(&mut self, action: Action) -> Result<()> {
        if action.category() != self.category {
            return Err(Error::Config(format!(
                "{} action '{}' does not belong in the {} catalog",
                action.category(),
                action.name(),
                self.category
            )));
        }
        if self.actions.iter().any(|a| a.name() == action.name()) {
            return Err(Error::DuplicateAction {
                category: self.category,
                name: action.name().to_string(),
            });
        }
        self.actions.push(action);
        Ok(())
    }

    /// Category of every action in this catalog.
    pub fn category(&self) -> ActionCategory {
        self.category
    }

    /// Position of the action named `name`.
    ///
    /// Matching is exact and case-sensitive. A name that is not in the
    /// catalog yields 0, the same as the first entry; callers must tolerate
    /// that fallback.
    pub fn index_of(&self, name: &str) -> usize {
        self.actions
            .iter()
            .position(|a| a.name() == name)
            .unwrap_or(0)
    }

    /// Action named `name`, if present.
    pub fn find(&self, name: &str) -> Option<&Action> {
        self.actions.iter().find(|a| a.name() == name)
    }

    /// Action at `index`.
    pub fn get(&self, index: usize) -> Option<&Action> {
        self.actions.get(index)
    }

    /// Iterate over actions in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &Action> {
        self.actions.iter()
    }

    /// Names in catalog order.
    pub fn names(&self) -> Vec<&str> {
        self.actions.iter().map(Action::name).collect()
    }

    /// Number of actions.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
