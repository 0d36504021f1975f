//! Editor Configuration
//!
//! Feature toggles, timing parameters, prompt markers, and brace pair sets
//! for the editing engine. Every toggle setter returns the previous value so
//! callers can restore state on exit.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Default matching pairs scanned for brace highlighting
pub const DEFAULT_MATCHING_BRACES: &str = "()[]{}";

/// Default pairs completed on insertion
pub const DEFAULT_INSERTION_BRACES: &str = "()[]{}\"\"''";

/// Configuration for the editing engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub multiline: bool,
    pub beep: bool,
    pub color: bool,
    pub history_duplicates: bool,
    pub auto_tab: bool,
    pub completion_preview: bool,
    pub multiline_indent: bool,
    pub inline_help: bool,
    pub hint: bool,
    pub highlight: bool,
    pub brace_matching: bool,
    pub brace_insertion: bool,
    /// Delay before an inline hint becomes visible, in milliseconds
    pub hint_delay_ms: u64,
    /// How long to wait for a byte following a lone ESC
    pub esc_initial_delay_ms: u64,
    /// How long to wait between bytes inside an escape sequence
    pub esc_followup_delay_ms: u64,
    pub prompt_marker: String,
    /// Marker shown on continuation lines; `None` reuses the prompt marker
    pub continuation_marker: Option<String>,
    pub matching_braces: Vec<(char, char)>,
    pub insertion_braces: Vec<(char, char)>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            multiline: true,
            beep: true,
            color: true,
            history_duplicates: false,
            auto_tab: false,
            completion_preview: true,
            multiline_indent: true,
            inline_help: true,
            hint: true,
            highlight: true,
            brace_matching: true,
            brace_insertion: true,
            hint_delay_ms: 400,
            esc_initial_delay_ms: 100,
            esc_followup_delay_ms: 10,
            prompt_marker: "> ".to_string(),
            continuation_marker: None,
            matching_braces: parse_brace_pairs(DEFAULT_MATCHING_BRACES),
            insertion_braces: parse_brace_pairs(DEFAULT_INSERTION_BRACES),
        }
    }
}

impl Config {
    /// Create a configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Save the configuration to a JSON file
    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_json::to_string_pretty(self)?;
        fs::write(path, data)?;
        Ok(())
    }

    pub fn enable_multiline(&mut self, on: bool) -> bool {
        std::mem::replace(&mut self.multiline, on)
    }

    pub fn enable_beep(&mut self, on: bool) -> bool {
        std::mem::replace(&mut self.beep, on)
    }

    pub fn enable_color(&mut self, on: bool) -> bool {
        std::mem::replace(&mut self.color, on)
    }

    pub fn enable_history_duplicates(&mut self, on: bool) -> bool {
        std::mem::replace(&mut self.history_duplicates, on)
    }

    pub fn enable_auto_tab(&mut self, on: bool) -> bool {
        std::mem::replace(&mut self.auto_tab, on)
    }

    pub fn enable_completion_preview(&mut self, on: bool) -> bool {
        std::mem::replace(&mut self.completion_preview, on)
    }

    pub fn enable_multiline_indent(&mut self, on: bool) -> bool {
        std::mem::replace(&mut self.multiline_indent, on)
    }

    pub fn enable_inline_help(&mut self, on: bool) -> bool {
        std::mem::replace(&mut self.inline_help, on)
    }

    pub fn enable_hint(&mut self, on: bool) -> bool {
        std::mem::replace(&mut self.hint, on)
    }

    pub fn enable_highlight(&mut self, on: bool) -> bool {
        std::mem::replace(&mut self.highlight, on)
    }

    pub fn enable_brace_matching(&mut self, on: bool) -> bool {
        std::mem::replace(&mut self.brace_matching, on)
    }

    pub fn enable_brace_insertion(&mut self, on: bool) -> bool {
        std::mem::replace(&mut self.brace_insertion, on)
    }

    /// Set the hint delay and return the previous value
    pub fn set_hint_delay(&mut self, ms: u64) -> u64 {
        std::mem::replace(&mut self.hint_delay_ms, ms)
    }

    /// Set the escape sequence disambiguation delays
    pub fn set_tty_esc_delay(&mut self, initial_ms: u64, followup_ms: u64) {
        self.esc_initial_delay_ms = initial_ms;
        self.esc_followup_delay_ms = followup_ms;
    }

    /// Set the prompt marker and optional continuation marker
    pub fn set_prompt_marker(&mut self, marker: &str, continuation_marker: Option<&str>) {
        self.prompt_marker = marker.to_string();
        self.continuation_marker = continuation_marker.map(|m| m.to_string());
    }

    /// Marker shown in front of continuation lines
    pub fn continuation_marker(&self) -> &str {
        self.continuation_marker
            .as_deref()
            .unwrap_or(&self.prompt_marker)
    }

    /// Set the pairs scanned for brace matching; `None` restores the default
    pub fn set_matching_braces(&mut self, pairs: Option<&str>) {
        self.matching_braces = parse_brace_pairs(pairs.unwrap_or(DEFAULT_MATCHING_BRACES));
    }

    /// Set the pairs completed on insertion; `None` restores the default
    pub fn set_insertion_braces(&mut self, pairs: Option<&str>) {
        self.insertion_braces = parse_brace_pairs(pairs.unwrap_or(DEFAULT_INSERTION_BRACES));
    }
}

/// Parse a flat pair string like `"()[]{}"` into opener/closer tuples
///
/// A trailing unpaired character is ignored.
pub fn parse_brace_pairs(pairs: &str) -> Vec<(char, char)> {
    let chars: Vec<char> = pairs.chars().collect();
    chars.chunks_exact(2).map(|c| (c[0], c[1])).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.multiline);
        assert!(!config.history_duplicates);
        assert_eq!(config.prompt_marker, "> ");
        assert_eq!(config.continuation_marker(), "> ");
        assert_eq!(config.matching_braces.len(), 3);
        assert_eq!(config.insertion_braces.len(), 5);
    }

    #[test]
    fn test_toggle_returns_previous_value() {
        let mut config = Config::default();
        assert!(config.enable_hint(false));
        assert!(!config.enable_hint(true));
        assert!(config.hint);
    }

    #[test]
    fn test_set_hint_delay_returns_previous() {
        let mut config = Config::default();
        let previous = config.set_hint_delay(1000);
        assert_eq!(previous, 400);
        assert_eq!(config.hint_delay_ms, 1000);
    }

    #[test]
    fn test_parse_brace_pairs() {
        let pairs = parse_brace_pairs("(){}");
        assert_eq!(pairs, vec![('(', ')'), ('{', '}')]);

        // Odd trailing character is dropped
        let pairs = parse_brace_pairs("()<");
        assert_eq!(pairs, vec![('(', ')')]);
    }

    #[test]
    fn test_custom_braces_and_reset() {
        let mut config = Config::default();
        config.set_matching_braces(Some("<>"));
        assert_eq!(config.matching_braces, vec![('<', '>')]);
        config.set_matching_braces(None);
        assert_eq!(config.matching_braces.len(), 3);
    }

    #[test]
    fn test_config_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("editor.json");

        let mut config = Config::default();
        config.enable_multiline(false);
        config.set_prompt_marker(">> ", Some(".. "));
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert!(!loaded.multiline);
        assert_eq!(loaded.prompt_marker, ">> ");
        assert_eq!(loaded.continuation_marker(), ".. ");
    }
}
