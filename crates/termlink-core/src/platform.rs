//! Platform detection for shell selection and account lookup.

use serde::{Deserialize, Serialize};

/// Platforms with distinct shell conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Linux
    Linux,
    /// macOS
    MacOS,
    /// Windows
    Windows,
    /// Any other Unix-like system
    Unix,
}

impl Platform {
    /// Detect the current platform at compile time.
    pub fn detect() -> Self {
        if cfg!(target_os = "linux") {
            Platform::Linux
        } else if cfg!(target_os = "macos") {
            Platform::MacOS
        } else if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Unix
        }
    }

    /// Get the platform name as a string.
    pub fn name(&self) -> &'static str {
        match self {
            Platform::Linux => "Linux",
            Platform::MacOS => "macOS",
            Platform::Windows => "Windows",
            Platform::Unix => "Unix",
        }
    }

    /// Check if this is a Unix-like platform.
    pub fn is_unix(&self) -> bool {
        !matches!(self, Platform::Windows)
    }

    /// Default interactive shell command line for this platform.
    ///
    /// - Unix: `$SHELL`, falling back to `/bin/sh`, started as a login shell
    /// - Windows: `%COMSPEC%`, falling back to `cmd.exe`
    pub fn default_shell(&self) -> Vec<String> {
        if self.is_unix() {
            let shell = std::env::var("SHELL")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| "/bin/sh".to_string());
            vec![shell, "-l".to_string()]
        } else {
            let shell = std::env::var("COMSPEC")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| "cmd.exe".to_string());
            vec![shell]
        }
    }

    /// Lower-cased name of the invoking OS account, if known.
    pub fn account_name(&self) -> Option<String> {
        let vars: &[&str] = if self.is_unix() {
            &["USER", "LOGNAME"]
        } else {
            &["USERNAME"]
        };
        vars.iter()
            .filter_map(|var| std::env::var(var).ok())
            .map(|name| name.trim().to_lowercase())
            .find(|name| !name.is_empty())
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
