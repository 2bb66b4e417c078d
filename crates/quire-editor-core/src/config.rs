//! Editor configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::error::ConfigError;
use crate::measure::MonospaceMeasure;
use crate::tabs::{self, TabStop};

/// Settings fixed at editor construction. Every field has a default, so a
/// partial JSON object is a valid configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Quiescence window for value and HTML updates, in milliseconds.
    pub debounce: u64,
    /// Distance from the container edge to the content edge, in layout units.
    pub content_inset: f32,
    pub history_max_steps: usize,
    /// Advance of one character for the built-in measurer.
    pub char_width: f32,
    /// Advance of a literal tab for the built-in measurer.
    pub tab_width: f32,
    /// Host scoping classes stripped from the HTML projection.
    pub scope_classes: Vec<SmolStr>,
    /// Initial tab stops.
    pub tab_stops: Vec<TabStop>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        let measure = MonospaceMeasure::default();
        Self {
            debounce: 200,
            content_inset: 16.0,
            history_max_steps: 100,
            char_width: measure.char_width,
            tab_width: measure.tab_width,
            scope_classes: Vec::new(),
            tab_stops: Vec::new(),
        }
    }
}

impl EditorConfig {
    pub fn from_json(input: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.content_inset.is_finite() {
            return Err(ConfigError::Parse(format!(
                "content inset must be finite, got {}",
                self.content_inset
            )));
        }
        tabs::validate(&self.tab_stops)
    }

    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce)
    }

    pub fn measure(&self) -> MonospaceMeasure {
        MonospaceMeasure {
            char_width: self.char_width,
            tab_width: self.tab_width,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_fills_defaults() {
        let config = EditorConfig::from_json(r#"{"debounce": 50, "scopeClasses": ["style-scope"]}"#).unwrap();
        assert_eq!(config.debounce_window(), Duration::from_millis(50));
        assert_eq!(config.content_inset, 16.0);
        assert_eq!(config.history_max_steps, 100);
        assert_eq!(config.scope_classes, vec![SmolStr::new("style-scope")]);
    }

    #[test]
    fn test_bad_tab_stop_rejected() {
        let err = EditorConfig::from_json(r#"{"tabStops": [{"direction": "left", "position": -4}]}"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTabStop { index: 0, .. }));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            EditorConfig::from_json("{"),
            Err(ConfigError::Parse(_))
        ));
    }
}
