//! Public Engine Surface
//!
//! The `Readline` handle owns the configuration, style registry, history,
//! and registered callbacks, and runs one interactive session per `readline`
//! call. When stdin is not an interactive terminal every call degrades to a
//! plain buffered line read with markup stripped from the prompt.

use std::io::{self, Write};
use std::path::PathBuf;

use crate::color::{detect_color_capability, ColorCapability};
use crate::complete::Completer;
use crate::config::Config;
use crate::error::Result;
use crate::highlight::Highlighter;
use crate::history::{History, DEFAULT_MAX_ENTRIES};
use crate::markup::{parse_markup, render_ansi, strip_markup};
use crate::session::{Session, SessionEnv};
use crate::style::{Style, StyleRegistry};
use crate::term::{self, RawModeGuard, TtyInput};

/// Line editing engine
///
/// One instance owns all editing state. Calls to `readline` are strictly
/// sequential; the engine is not re-entrant.
pub struct Readline {
    config: Config,
    styles: StyleRegistry,
    history: History,
    completer: Option<Box<dyn Completer>>,
    highlighter: Option<Box<dyn Highlighter>>,
    /// Styles opened by `style_open`, innermost last
    session_styles: Vec<Style>,
    capability: ColorCapability,
}

impl Readline {
    /// Create an engine with default configuration
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create an engine with an explicit configuration
    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            styles: StyleRegistry::new(),
            history: History::new(DEFAULT_MAX_ENTRIES),
            completer: None,
            highlighter: None,
            session_styles: Vec::new(),
            capability: detect_color_capability(),
        }
    }

    /// Read one input from the user
    ///
    /// The prompt may contain style markup. Returns `Ok(None)` when the user
    /// cancelled or the input stream ended.
    pub fn readline(&mut self, prompt: &str) -> Result<Option<String>> {
        self.readline_with_initial(prompt, "")
    }

    /// Read one input with the buffer pre-seeded with `initial`
    pub fn readline_with_initial(
        &mut self,
        prompt: &str,
        initial: &str,
    ) -> Result<Option<String>> {
        if !term::is_interactive() {
            return self.read_plain(prompt);
        }

        let mut guard = RawModeGuard::new()?;
        let result = {
            let env = SessionEnv {
                config: &self.config,
                styles: &self.styles,
                history: &mut self.history,
                completer: self.completer.as_deref_mut(),
                highlighter: self.highlighter.as_deref_mut(),
                capability: self.capability,
                // The session re-reads the terminal width every frame
                width: None,
            };
            let session = Session::new(env, prompt, initial);
            let mut input = TtyInput;
            let mut out = io::stdout().lock();
            session.run(&mut input, &mut out)
        };
        guard.restore();

        if let Ok(Some(line)) = &result {
            if !line.is_empty() {
                self.history.add(line, self.config.history_duplicates);
            }
        }
        result
    }

    /// Plain line read for non-interactive streams
    fn read_plain(&mut self, prompt: &str) -> Result<Option<String>> {
        let mut out = io::stdout().lock();
        out.write_all(strip_markup(prompt, &self.styles).as_bytes())?;
        out.write_all(self.config.prompt_marker.as_bytes())?;
        out.flush()?;
        drop(out);

        let line = term::read_line_fallback()?;
        if let Some(line) = &line {
            if !line.is_empty() {
                self.history.add(line, self.config.history_duplicates);
            }
        }
        Ok(line)
    }

    /// Print text with style markup applied
    ///
    /// Tags left open at the end of the text are closed; styles opened with
    /// `style_open` persist across calls.
    pub fn print(&self, text: &str) {
        self.write_markup(text);
    }

    /// Print text with style markup applied, followed by a newline
    pub fn println(&self, text: &str) {
        self.write_markup(text);
        let mut out = io::stdout().lock();
        let _ = out.write_all(b"\n");
        let _ = out.flush();
    }

    fn write_markup(&self, text: &str) {
        let segments = parse_markup(text, &self.styles, self.session_base());
        let ansi = render_ansi(&segments, self.capability, self.config.color);
        let mut out = io::stdout().lock();
        let _ = out.write_all(ansi.as_bytes());
        let _ = out.flush();
    }

    /// The merged style of the open `style_open` stack
    fn session_base(&self) -> Style {
        self.session_styles
            .iter()
            .fold(Style::plain(), |base, s| base.merge(*s))
    }

    /// Define or redefine a named style from a format string
    pub fn style_def(&mut self, name: &str, fmt: &str) {
        self.styles.define(name, fmt);
    }

    /// Push a style that applies to all subsequent `print` output
    pub fn style_open(&mut self, fmt: &str) {
        let style = self.styles.parse(fmt);
        self.session_styles.push(style);
    }

    /// Pop the innermost style pushed by `style_open`
    pub fn style_close(&mut self) {
        self.session_styles.pop();
    }

    /// Attach a history file, loading existing entries from it
    ///
    /// `None` keeps history in memory only. A missing or unreadable file is
    /// not an error.
    pub fn set_history(&mut self, path: Option<PathBuf>, max_entries: usize) {
        self.history.set_file(path, max_entries);
    }

    /// Add an entry to the history without an interactive session
    pub fn history_add(&mut self, entry: &str) {
        self.history.add(entry, self.config.history_duplicates);
    }

    /// Remove the most recently added history entry
    pub fn history_remove_last(&mut self) {
        self.history.remove_last();
    }

    /// Remove all history entries
    pub fn history_clear(&mut self) {
        self.history.clear();
    }

    /// Register the completion callback
    pub fn set_completer(&mut self, completer: Option<Box<dyn Completer>>) {
        self.completer = completer;
    }

    /// Register the syntax highlighting callback
    pub fn set_highlighter(&mut self, highlighter: Option<Box<dyn Highlighter>>) {
        self.highlighter = highlighter;
    }

    /// Set the prompt marker and optional continuation marker
    pub fn set_prompt_marker(&mut self, marker: &str, continuation_marker: Option<&str>) {
        self.config.set_prompt_marker(marker, continuation_marker);
    }

    pub fn enable_multiline(&mut self, on: bool) -> bool {
        self.config.enable_multiline(on)
    }

    pub fn enable_beep(&mut self, on: bool) -> bool {
        self.config.enable_beep(on)
    }

    pub fn enable_color(&mut self, on: bool) -> bool {
        self.config.enable_color(on)
    }

    pub fn enable_history_duplicates(&mut self, on: bool) -> bool {
        self.config.enable_history_duplicates(on)
    }

    pub fn enable_auto_tab(&mut self, on: bool) -> bool {
        self.config.enable_auto_tab(on)
    }

    pub fn enable_completion_preview(&mut self, on: bool) -> bool {
        self.config.enable_completion_preview(on)
    }

    pub fn enable_multiline_indent(&mut self, on: bool) -> bool {
        self.config.enable_multiline_indent(on)
    }

    pub fn enable_inline_help(&mut self, on: bool) -> bool {
        self.config.enable_inline_help(on)
    }

    pub fn enable_hint(&mut self, on: bool) -> bool {
        self.config.enable_hint(on)
    }

    pub fn enable_highlight(&mut self, on: bool) -> bool {
        self.config.enable_highlight(on)
    }

    pub fn enable_brace_matching(&mut self, on: bool) -> bool {
        self.config.enable_brace_matching(on)
    }

    pub fn enable_brace_insertion(&mut self, on: bool) -> bool {
        self.config.enable_brace_insertion(on)
    }

    /// Set the hint delay in milliseconds, returning the previous value
    pub fn set_hint_delay(&mut self, ms: u64) -> u64 {
        self.config.set_hint_delay(ms)
    }

    /// Set the escape sequence disambiguation delays
    pub fn set_tty_esc_delay(&mut self, initial_ms: u64, followup_ms: u64) {
        self.config.set_tty_esc_delay(initial_ms, followup_ms);
    }

    /// Set the pairs scanned for brace matching; `None` restores the default
    pub fn set_matching_braces(&mut self, pairs: Option<&str>) {
        self.config.set_matching_braces(pairs);
    }

    /// Set the pairs completed on insertion; `None` restores the default
    pub fn set_insertion_braces(&mut self, pairs: Option<&str>) {
        self.config.set_insertion_braces(pairs);
    }

    /// The active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl Default for Readline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggles_return_previous_value() {
        let mut rl = Readline::new();
        assert!(rl.enable_multiline(false));
        assert!(!rl.enable_multiline(true));
    }

    #[test]
    fn test_style_stack_merges() {
        let mut rl = Readline::new();
        rl.style_open("bold");
        rl.style_open("red");
        let base = rl.session_base();
        assert!(base.attrs().contains(crate::style::Attrs::BOLD));
        assert!(base.fg.is_some());

        rl.style_close();
        assert!(rl.session_base().fg.is_none());
        rl.style_close();
        assert_eq!(rl.session_base(), Style::plain());
    }

    #[test]
    fn test_history_surface() {
        let mut rl = Readline::new();
        rl.history_add("one");
        rl.history_add("two");
        rl.history_remove_last();
        rl.history_add("one");
        // Duplicate suppression is on by default
        assert_eq!(rl.history.len(), 1);

        rl.history_clear();
        assert!(rl.history.is_empty());
    }

    #[test]
    fn test_style_def_redefines() {
        let mut rl = Readline::new();
        rl.style_def("warning", "bold color=#e8a000");
        let style = rl.styles.get("warning").unwrap();
        assert!(style.attrs().contains(crate::style::Attrs::BOLD));
    }
}
