//! Placeholder shown while content is not mounted.

use serde::{Deserialize, Serialize};

/// Default overlay message.
pub const DEFAULT_MESSAGE: &str = "Loading";

/// Description of the loading overlay a render gate shows instead of content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FallbackVisual {
    /// Text under the spinner
    pub message: String,

    /// Overlay is fading out
    pub fade_out: bool,
}

impl FallbackVisual {
    /// Overlay with a custom message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            fade_out: false,
        }
    }

    /// Same overlay, fading out.
    pub fn with_fade_out(mut self) -> Self {
        self.fade_out = true;
        self
    }
}

impl Default for FallbackVisual {
    fn default() -> Self {
        Self::new(DEFAULT_MESSAGE)
    }
}

impl std::fmt::Display for FallbackVisual {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.fade_out {
            write!(f, "[spinner, fading] {}", self.message)
        } else {
            write!(f, "[spinner] {}", self.message)
        }
    }
}
