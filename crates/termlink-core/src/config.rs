//! Configuration types for termlink.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::{Action, ActionCatalog, ActionCategory, ConnectionParams, Error, PanelArrangement};

/// Application configuration loaded from a YAML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Terminal settings
    pub terminal: TerminalSettings,
    /// Local shell settings
    pub local: LocalSettings,
    /// Static action catalogs
    pub catalogs: CatalogSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            terminal: TerminalSettings::default(),
            local: LocalSettings::default(),
            catalogs: CatalogSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML string.
    pub fn from_yaml(yaml: &str) -> crate::Result<Self> {
        let config: AppConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> crate::Result<()> {
        if self.terminal.default_rows == 0 || self.terminal.default_cols == 0 {
            return Err(Error::Config("terminal dimensions must be > 0".to_string()));
        }

        if self.terminal.term.trim().is_empty() {
            return Err(Error::Config("terminal.term cannot be empty".to_string()));
        }

        // Building every catalog surfaces duplicate names
        for category in ActionCategory::ALL {
            self.catalog(category)?;
        }

        Ok(())
    }

    /// Build the action catalog for `category` from the configured entries.
    pub fn catalog(&self, category: ActionCategory) -> crate::Result<ActionCatalog> {
        let c = &self.catalogs;
        let actions: Vec<Action> = match category {
            ActionCategory::Layout => c
                .layouts
                .iter()
                .map(|l| Action::Layout {
                    name: l.name.clone(),
                    layout: l.id.clone(),
                })
                .collect(),
            ActionCategory::TerminalPanel => c
                .panels
                .iter()
                .map(|p| Action::TerminalPanel {
                    name: p.name.clone(),
                    panel: p.id.clone(),
                })
                .collect(),
            ActionCategory::Ssh => c
                .hosts
                .iter()
                .map(|h| Action::Ssh {
                    name: h.name.clone(),
                    params: Some(h.to_params()),
                })
                .collect(),
            ActionCategory::Command => c
                .commands
                .iter()
                .map(|cmd| Action::Command {
                    name: cmd.name.clone(),
                    command: Some(cmd.command.clone()),
                })
                .collect(),
            ActionCategory::Theme => c
                .themes
                .iter()
                .map(|t| Action::Theme {
                    name: t.name.clone(),
                    theme: t.id.clone(),
                })
                .collect(),
        };
        ActionCatalog::new(category, actions)
    }

    /// Panel arrangements declared by the layout catalog.
    pub fn arrangements(&self) -> Vec<PanelArrangement> {
        self.catalogs
            .layouts
            .iter()
            .map(|l| PanelArrangement {
                id: l.id.clone(),
                panels: l.panels.clone(),
            })
            .collect()
    }
}

/// Terminal settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalSettings {
    /// Default terminal rows
    pub default_rows: u16,
    /// Default terminal columns
    pub default_cols: u16,
    /// TERM environment variable value for local shells
    pub term: String,
    /// LANG value used when the environment has none
    pub locale: String,
}

impl Default for TerminalSettings {
    fn default() -> Self {
        Self {
            default_rows: 24,
            default_cols: 80,
            term: "xterm".to_string(),
            locale: "en_US.UTF-8".to_string(),
        }
    }
}

/// Local shell settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalSettings {
    /// Shell to spawn instead of the platform default
    pub shell: Option<String>,
    /// Arguments passed to the shell
    pub args: Vec<String>,
    /// Working directory (defaults to the current directory)
    pub working_directory: Option<String>,
    /// Extra environment variables
    pub env: BTreeMap<String, String>,
}

/// Static catalog contents.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSettings {
    /// Panel layouts
    pub layouts: Vec<LayoutEntry>,
    /// Terminal panels
    pub panels: Vec<NamedEntry>,
    /// Themes
    pub themes: Vec<NamedEntry>,
    /// Canned commands
    pub commands: Vec<CommandEntry>,
    /// Saved remote hosts
    pub hosts: Vec<HostEntry>,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            layouts: vec![
                LayoutEntry {
                    name: "Single".to_string(),
                    id: "single".to_string(),
                    panels: vec!["terminal".to_string()],
                },
                LayoutEntry {
                    name: "Split".to_string(),
                    id: "split".to_string(),
                    panels: vec!["terminal".to_string(), "terminal".to_string()],
                },
            ],
            panels: vec![NamedEntry::new("Terminal", "terminal")],
            themes: vec![NamedEntry::new("Dark", "dark"), NamedEntry::new("Light", "light")],
            commands: vec![],
            hosts: vec![],
        }
    }
}

/// Catalog entry with a display name and an identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedEntry {
    /// Display name
    pub name: String,
    /// Identifier passed to the view layer
    pub id: String,
}

impl NamedEntry {
    /// Create a new entry.
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
        }
    }
}

/// Layout catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutEntry {
    /// Display name
    pub name: String,
    /// Layout identifier
    pub id: String,
    /// Panels in display order
    #[serde(default)]
    pub panels: Vec<String>,
}

/// Canned command entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandEntry {
    /// Display name
    pub name: String,
    /// Text typed into the terminal
    pub command: String,
}

/// Saved host entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostEntry {
    /// Display name
    pub name: String,
    /// `host[:port]` token
    pub host: String,
    /// Login name
    #[serde(default)]
    pub user: String,
    /// Password
    #[serde(default)]
    pub password: Option<String>,
}

impl HostEntry {
    /// Connection parameters for this host.
    pub fn to_params(&self) -> ConnectionParams {
        ConnectionParams::new(self.host.clone(), self.user.clone(), self.password.clone())
    }
}
