#![forbid(unsafe_code)]

//! Render loop configuration.
//!
//! [`RenderLoopConfig`] has a default for every field and builder methods
//! for each. With the `config-file` feature it can also be loaded from
//! TOML:
//!
//! ```toml
//! status_bar_height = 1
//! background_code = "\u001b[48;5;235m"
//! autofocus = true
//! tab_navigation = true
//! escape_releases_focus = false
//! status_bar_alignment = "trailing"
//! ```
//!
//! ```rust,ignore
//! let config = RenderLoopConfig::from_toml_file("lumen.toml")?;
//! ```
//!
//! Loaded configs are validated; a config built in code can be checked with
//! [`RenderLoopConfig::validate`].

#[cfg(feature = "config-file")]
use std::path::Path;

#[cfg(feature = "config-file")]
use serde::{Deserialize, Serialize};

use lumen_layout::Alignment;

/// Tallest status bar accepted by [`RenderLoopConfig::validate`].
pub const MAX_STATUS_BAR_HEIGHT: u16 = 16;

/// Settings for a [`RenderLoop`](crate::RenderLoop).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config-file", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-file", serde(default))]
pub struct RenderLoopConfig {
    /// Rows reserved at the bottom for the status bar, when one is set.
    pub status_bar_height: u16,
    /// SGR sequence laid under the main content, or empty.
    pub background_code: String,
    /// Sequence ending every written line.
    pub reset_code: String,
    /// Focus the first focusable control once one appears.
    pub autofocus: bool,
    /// Tab and Shift+Tab move focus when nothing else consumed them.
    pub tab_navigation: bool,
    /// Escape drops focus when nothing else consumed it.
    pub escape_releases_focus: bool,
    /// Start with the main content dimmed.
    pub dim_main_content: bool,
    /// Horizontal placement of status bar content.
    pub status_bar_alignment: Alignment,
}

impl Default for RenderLoopConfig {
    fn default() -> Self {
        Self {
            status_bar_height: 1,
            background_code: String::new(),
            reset_code: "\x1b[0m".into(),
            autofocus: true,
            tab_navigation: true,
            escape_releases_focus: true,
            dim_main_content: false,
            status_bar_alignment: Alignment::Leading,
        }
    }
}

impl RenderLoopConfig {
    #[must_use]
    pub fn status_bar_height(mut self, rows: u16) -> Self {
        self.status_bar_height = rows;
        self
    }

    #[must_use]
    pub fn background_code(mut self, code: impl Into<String>) -> Self {
        self.background_code = code.into();
        self
    }

    #[must_use]
    pub fn reset_code(mut self, code: impl Into<String>) -> Self {
        self.reset_code = code.into();
        self
    }

    #[must_use]
    pub fn autofocus(mut self, enabled: bool) -> Self {
        self.autofocus = enabled;
        self
    }

    #[must_use]
    pub fn tab_navigation(mut self, enabled: bool) -> Self {
        self.tab_navigation = enabled;
        self
    }

    #[must_use]
    pub fn escape_releases_focus(mut self, enabled: bool) -> Self {
        self.escape_releases_focus = enabled;
        self
    }

    #[must_use]
    pub fn dim_main_content(mut self, dimmed: bool) -> Self {
        self.dim_main_content = dimmed;
        self
    }

    #[must_use]
    pub fn status_bar_alignment(mut self, alignment: Alignment) -> Self {
        self.status_bar_alignment = alignment;
        self
    }

    /// Load from a TOML string and validate.
    #[cfg(feature = "config-file")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(ConfigError::Toml)?;
        config.validated()
    }

    /// Load from a TOML file on disk and validate.
    #[cfg(feature = "config-file")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Check every field. An empty list means the config is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.status_bar_height > MAX_STATUS_BAR_HEIGHT {
            errors.push(format!(
                "status_bar_height must be <= {MAX_STATUS_BAR_HEIGHT}, got {}",
                self.status_bar_height
            ));
        }
        if !self.background_code.is_empty() && !is_sgr(&self.background_code) {
            errors.push(format!(
                "background_code must be an SGR sequence (ESC [ ... m), got {:?}",
                self.background_code
            ));
        }
        if self.reset_code.is_empty() {
            errors.push("reset_code must not be empty".into());
        } else if !is_sgr(&self.reset_code) {
            errors.push(format!(
                "reset_code must be an SGR sequence (ESC [ ... m), got {:?}",
                self.reset_code
            ));
        }

        errors
    }

    /// `self` if valid, otherwise the validation errors.
    pub fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

fn is_sgr(code: &str) -> bool {
    code.strip_prefix("\x1b[")
        .and_then(|rest| rest.strip_suffix('m'))
        .is_some_and(|params| params.bytes().all(|b| b.is_ascii_digit() || b == b';' || b == b':'))
}

/// Error loading or validating a [`RenderLoopConfig`].
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    #[cfg(feature = "config-file")]
    Toml(toml::de::Error),
    /// Validation errors.
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            #[cfg(feature = "config-file")]
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            Self::Validation(errors) => {
                write!(f, "validation errors: {}", errors.join("; "))
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            #[cfg(feature = "config-file")]
            Self::Toml(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}
