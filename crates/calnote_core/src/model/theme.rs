//! Theme preference.

use serde::{Deserialize, Serialize};

/// Theme used until the user picks one.
pub const DEFAULT_THEME: &str = "lavender";

/// Named UI theme; rendered as the body class `theme-{name}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Theme(String);

impl Theme {
    /// Builds a theme from a picker value. Blank names map to the default.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            Self::default()
        } else {
            Self(trimmed.to_string())
        }
    }

    pub fn name(&self) -> &str {
        self.0.as_str()
    }

    pub fn css_class(&self) -> String {
        format!("theme-{}", self.0)
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self(DEFAULT_THEME.to_string())
    }
}
