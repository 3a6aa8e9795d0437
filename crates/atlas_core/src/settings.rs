//! Library Settings
//!
//! Knobs that decide what source text is fed to the compiler for a variant.
//!
//! ```rust,ignore
//! use atlas_core::LibrarySettings;
//!
//! let settings = LibrarySettings {
//!     flag_defines: vec!["USE_SKINNING".into(), "USE_FOG".into()],
//!     ..Default::default()
//! };
//!
//! // or from a JSON project file; missing fields keep their defaults
//! let settings = LibrarySettings::from_json(r#"{ "screen_space_modes": ["fx", "post"] }"#)?;
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// Render mode used when a caller asks for the empty mode.
    pub default_render_mode: String,

    /// Modes whose vertex stage may be omitted. They are compiled against the
    /// built-in full-screen vertex shader.
    pub screen_space_modes: Vec<String>,

    /// Bit `i` of a variant's flags injects `#define flag_defines[i]`.
    pub flag_defines: Vec<String>,

    /// Preload the embedded snippet set into the snippet registry.
    pub builtin_snippets: bool,

    /// Log every assembled source at trace level.
    pub dump_sources: bool,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            default_render_mode: "default".to_string(),
            screen_space_modes: vec!["fx".to_string()],
            flag_defines: Vec::new(),
            builtin_snippets: true,
            dump_sources: false,
        }
    }
}

impl LibrarySettings {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Maps an empty render mode to [`default_render_mode`](Self::default_render_mode).
    #[must_use]
    pub fn resolve_render_mode<'a>(&'a self, render_mode: &'a str) -> &'a str {
        if render_mode.is_empty() {
            &self.default_render_mode
        } else {
            render_mode
        }
    }

    #[must_use]
    pub fn is_screen_space(&self, render_mode: &str) -> bool {
        self.screen_space_modes.iter().any(|m| m == render_mode)
    }

    /// Define names selected by `flags`, in bit order. Bits without a
    /// configured name are ignored.
    pub fn defines_for(&self, flags: u32) -> impl Iterator<Item = &str> + '_ {
        self.flag_defines
            .iter()
            .take(32)
            .enumerate()
            .filter(move |(bit, _)| flags & (1 << bit) != 0)
            .map(|(_, name)| name.as_str())
    }
}
