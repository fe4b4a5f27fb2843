//! Editor configuration.
//!
//! A `Config` travels with every [`Buffer`](crate::buffer::Buffer) and is
//! consulted when the buffer is rendered. It can be built three ways:
//!
//! - `Config::default()`: 8-column tab stops, the terminal convention.
//! - `Config::from_env()`: defaults overridden by environment variables.
//! - Deserialized with serde from any self-describing format; missing
//!   fields fall back to their defaults.
//!
//! | Field       | Env var          | Default |
//! |-------------|------------------|---------|
//! | `tab_width` | `GED_TAB_WIDTH`  | 8       |
//!
//! Tab widths above [`MAX_TAB_WIDTH`] are rejected by the environment and
//! serde paths and clamped by [`Config::tab_stop`].

use std::env;

use serde::{Deserialize, Deserializer, de};

/// Default tab stop width in display columns.
pub const DEFAULT_TAB_WIDTH: usize = 8;

/// Widest tab stop honoured, in display columns.
pub const MAX_TAB_WIDTH: usize = 64;

/// Environment variable read by [`Config::from_env`] for the tab width.
pub const TAB_WIDTH_VAR: &str = "GED_TAB_WIDTH";

/// Per-buffer editor settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Display columns per tab stop. A value of 0 behaves as 1; values
    /// above [`MAX_TAB_WIDTH`] behave as the maximum.
    #[serde(deserialize_with = "tab_width")]
    pub tab_width: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tab_width: DEFAULT_TAB_WIDTH,
        }
    }
}

impl Config {
    /// Defaults, overridden by any well-formed environment variables.
    ///
    /// Malformed values are ignored rather than reported: a typo in the
    /// environment should not keep the editor from starting.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the environment, in production).
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let parsed = lookup(TAB_WIDTH_VAR).and_then(|v| v.trim().parse::<usize>().ok());
        if let Some(width) = parsed.filter(|&w| w <= MAX_TAB_WIDTH) {
            config.tab_width = width;
        }
        config
    }

    /// The effective tab width, in `1..=MAX_TAB_WIDTH`.
    #[inline]
    #[must_use]
    pub fn tab_stop(&self) -> usize {
        self.tab_width.clamp(1, MAX_TAB_WIDTH)
    }

    /// The display column a tab at `col` advances to. Saturates at
    /// `usize::MAX`.
    #[inline]
    #[must_use]
    pub fn next_tab_stop(&self, col: usize) -> usize {
        let w = self.tab_stop();
        (col / w).saturating_add(1).saturating_mul(w)
    }
}

fn tab_width<'de, D: Deserializer<'de>>(deserializer: D) -> Result<usize, D::Error> {
    let width = usize::deserialize(deserializer)?;
    if width > MAX_TAB_WIDTH {
        return Err(de::Error::custom(format!(
            "tab_width {width} exceeds the maximum of {MAX_TAB_WIDTH}"
        )));
    }
    Ok(width)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tab_width_is_eight() {
        assert_eq!(Config::default().tab_width, 8);
    }

    #[test]
    fn next_tab_stop_advances_to_multiple() {
        let config = Config::default();
        assert_eq!(config.next_tab_stop(0), 8);
        assert_eq!(config.next_tab_stop(3), 8);
        assert_eq!(config.next_tab_stop(8), 16);
    }

    #[test]
    fn zero_tab_width_behaves_as_one() {
        let config = Config { tab_width: 0 };
        assert_eq!(config.tab_stop(), 1);
        assert_eq!(config.next_tab_stop(5), 6);
    }

    #[test]
    fn huge_tab_width_is_clamped() {
        let config = Config {
            tab_width: usize::MAX / 2 + 1,
        };
        assert_eq!(config.tab_stop(), MAX_TAB_WIDTH);
        assert_eq!(config.next_tab_stop(0), MAX_TAB_WIDTH);
        assert_eq!(config.next_tab_stop(MAX_TAB_WIDTH + 1), 2 * MAX_TAB_WIDTH);
    }

    #[test]
    fn next_tab_stop_saturates() {
        let config = Config::default();
        assert_eq!(config.next_tab_stop(usize::MAX), usize::MAX);
        assert_eq!(config.next_tab_stop(usize::MAX - 3), usize::MAX);
    }

    // -- Environment --------------------------------------------------------

    #[test]
    fn lookup_overrides_tab_width() {
        let config = Config::from_lookup(|key| (key == TAB_WIDTH_VAR).then(|| " 4 ".to_string()));
        assert_eq!(config.tab_width, 4);
    }

    #[test]
    fn lookup_ignores_malformed_value() {
        let config = Config::from_lookup(|_| Some("wide".to_string()));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn lookup_ignores_oversized_value() {
        let config = Config::from_lookup(|_| Some("100000".to_string()));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn lookup_without_value_is_default() {
        assert_eq!(Config::from_lookup(|_| None), Config::default());
    }

    // -- Deserialization ----------------------------------------------------

    #[test]
    fn deserialize_empty_object_uses_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn deserialize_tab_width() {
        let config: Config = serde_json::from_str(r#"{"tab_width": 2}"#).unwrap();
        assert_eq!(config.tab_width, 2);
    }

    #[test]
    fn deserialize_rejects_oversized_tab_width() {
        let err = serde_json::from_str::<Config>(r#"{"tab_width": 1000}"#).unwrap_err();
        assert!(err.to_string().contains("exceeds the maximum"));
    }
}
