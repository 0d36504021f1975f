//! Session Controller
//!
//! Runs one `readline` call: an event loop that decodes keys, updates the
//! edit buffer, consults the completion engine and highlighter, and drives
//! the renderer until an accept, cancel, or end-of-input key. The loop is
//! single threaded; callbacks run synchronously between key events.

use std::io::Write;
use std::time::Duration;

use crossterm::cursor::MoveTo;
use crossterm::terminal::{Clear, ClearType};
use crossterm::Command;

use crate::braces::{self, BraceHighlight};
use crate::buffer::EditBuffer;
use crate::color::ColorCapability;
use crate::complete::{common_prefix, Candidate, Completer, Completions};
use crate::config::Config;
use crate::error::Result;
use crate::highlight::{Highlighter, StyleSpans};
use crate::history::History;
use crate::input::{Decoder, Key};
use crate::markup::{parse_markup, Segment};
use crate::render::{compose, Renderer, Screen};
use crate::style::{Attrs, Style, StyleRegistry};
use crate::term::{beep, terminal_width, ByteSource};

/// Most candidates shown in the completion menu at once
const MENU_PAGE: usize = 10;

/// Retained undo snapshots per session
const UNDO_LIMIT: usize = 200;

/// How a session ended
enum Outcome {
    Accepted,
    Cancelled,
    EndOfInput,
}

/// Open completion menu state
struct Menu {
    candidates: Vec<Candidate>,
    selected: usize,
}

/// Incremental history search state
struct SearchState {
    query: String,
    found: Option<usize>,
}

/// Everything a session borrows from the engine
pub(crate) struct SessionEnv<'a> {
    pub config: &'a Config,
    pub styles: &'a StyleRegistry,
    pub history: &'a mut History,
    pub completer: Option<&'a mut (dyn Completer + 'static)>,
    pub highlighter: Option<&'a mut (dyn Highlighter + 'static)>,
    pub capability: ColorCapability,
    /// Fixed width override; `None` tracks the live terminal width
    pub width: Option<usize>,
}

pub(crate) struct Session<'a> {
    env: SessionEnv<'a>,
    buffer: EditBuffer,
    undo: Vec<EditBuffer>,
    menu: Option<Menu>,
    search: Option<SearchState>,
    hint: Option<Segment>,
    hint_pending: bool,
    /// Width the last frame was composed at
    last_width: usize,
    renderer: Renderer,
    prompt: Vec<Segment>,
    continuation: Vec<Segment>,
}

impl<'a> Session<'a> {
    pub fn new(env: SessionEnv<'a>, prompt: &str, initial: &str) -> Self {
        let mut prompt_segments = parse_markup(prompt, env.styles, Style::plain());
        prompt_segments.push(Segment {
            text: env.config.prompt_marker.clone(),
            style: Style::plain(),
        });
        let continuation = vec![Segment {
            text: env.config.continuation_marker().to_string(),
            style: Style::plain(),
        }];
        let renderer = Renderer::new(env.capability, env.config.color);

        Self {
            buffer: EditBuffer::from_text(initial),
            undo: Vec::new(),
            menu: None,
            search: None,
            hint: None,
            hint_pending: false,
            last_width: 0,
            renderer,
            prompt: prompt_segments,
            continuation,
            env,
        }
    }

    /// Run the event loop to completion
    pub fn run(
        mut self,
        source: &mut dyn ByteSource,
        out: &mut dyn Write,
    ) -> Result<Option<String>> {
        let mut decoder = Decoder::new(
            source,
            self.env.config.esc_initial_delay_ms,
            self.env.config.esc_followup_delay_ms,
        );

        loop {
            self.render(out)?;

            let timeout = if self.hint_pending {
                Some(Duration::from_millis(self.env.config.hint_delay_ms))
            } else {
                None
            };
            let key = match decoder.next_key(timeout)? {
                Some(key) => key,
                None => {
                    // Quiet long enough for the hint to appear
                    self.hint_pending = false;
                    self.compute_hint();
                    continue;
                }
            };

            let outcome = if self.search.is_some() {
                self.handle_search_key(key)
            } else {
                self.handle_edit_key(key, out)?
            };

            if let Some(outcome) = outcome {
                self.menu = None;
                self.hint = None;
                self.hint_pending = false;
                self.search = None;
                self.render(out)?;
                self.renderer.finish(out)?;
                self.env.history.reset_navigation();

                return Ok(match outcome {
                    Outcome::Accepted => Some(self.buffer.text()),
                    Outcome::Cancelled | Outcome::EndOfInput => None,
                });
            }
        }
    }

    fn handle_edit_key(&mut self, key: Key, out: &mut dyn Write) -> Result<Option<Outcome>> {
        self.hint = None;

        match key {
            Key::Char(ch) => {
                self.close_menu();
                self.push_undo();
                braces::insert_char(&mut self.buffer, ch, self.env.config);
                self.arm_hint();
            }
            Key::Enter => {
                if self.menu.is_some() {
                    self.apply_selected();
                } else if self.continuation_pending() {
                    self.push_undo();
                    self.buffer
                        .insert_newline(self.env.config.multiline_indent);
                } else {
                    return Ok(Some(Outcome::Accepted));
                }
            }
            Key::AltEnter | Key::Ctrl('j') => {
                if self.env.config.multiline {
                    self.close_menu();
                    self.push_undo();
                    self.buffer
                        .insert_newline(self.env.config.multiline_indent);
                } else {
                    return Ok(Some(Outcome::Accepted));
                }
            }
            Key::Tab => {
                if self.menu.is_some() {
                    self.menu_step(1);
                } else {
                    self.trigger_completion(out);
                }
            }
            Key::Esc => {
                self.close_menu();
            }
            Key::Backspace => {
                self.close_menu();
                self.push_undo();
                self.buffer.delete_back();
                self.arm_hint();
            }
            Key::Delete | Key::Ctrl('d') if key == Key::Delete || !self.buffer.is_empty() => {
                self.close_menu();
                self.push_undo();
                self.buffer.delete_forward();
            }
            Key::Ctrl('d') => return Ok(Some(Outcome::EndOfInput)),
            Key::Eof => return Ok(Some(Outcome::EndOfInput)),
            Key::Ctrl('c') => return Ok(Some(Outcome::Cancelled)),
            Key::Left | Key::Ctrl('b') => {
                self.close_menu();
                self.buffer.move_left();
            }
            Key::Right | Key::Ctrl('f') => {
                self.close_menu();
                self.buffer.move_right();
            }
            Key::Home | Key::Ctrl('a') => {
                self.close_menu();
                self.buffer.move_home();
            }
            Key::End | Key::Ctrl('e') => {
                self.close_menu();
                self.buffer.move_end();
            }
            Key::WordLeft => {
                self.close_menu();
                self.buffer.move_word_left();
            }
            Key::WordRight => {
                self.close_menu();
                self.buffer.move_word_right();
            }
            Key::Up => {
                if self.menu.is_some() {
                    self.menu_step(-1);
                } else if !self.buffer.move_up() {
                    self.history_previous();
                }
            }
            Key::Down => {
                if self.menu.is_some() {
                    self.menu_step(1);
                } else if !self.buffer.move_down() {
                    self.history_next();
                }
            }
            Key::Ctrl('p') => self.history_previous(),
            Key::Ctrl('n') => self.history_next(),
            Key::PageUp => {
                if self.menu.is_some() {
                    self.menu_step(-(MENU_PAGE as isize));
                } else {
                    self.buffer.move_first_line();
                }
            }
            Key::PageDown => {
                if self.menu.is_some() {
                    self.menu_step(MENU_PAGE as isize);
                } else {
                    self.buffer.move_last_line();
                }
            }
            Key::Ctrl('k') => {
                self.push_undo();
                self.buffer.delete_to_end();
            }
            Key::Ctrl('u') => {
                self.push_undo();
                self.buffer.delete_line();
            }
            Key::Ctrl('w') => {
                self.push_undo();
                self.buffer.delete_word_back();
                self.arm_hint();
            }
            Key::Ctrl('l') => {
                let mut ansi = String::new();
                let _ = Clear(ClearType::All).write_ansi(&mut ansi);
                let _ = MoveTo(0, 0).write_ansi(&mut ansi);
                out.write_all(ansi.as_bytes())?;
                self.renderer.invalidate();
            }
            Key::Ctrl('r') => {
                self.close_menu();
                self.search = Some(SearchState {
                    query: String::new(),
                    found: None,
                });
            }
            Key::Ctrl('z') | Key::Ctrl('_') => {
                if let Some(previous) = self.undo.pop() {
                    self.buffer = previous;
                }
            }
            _ => {}
        }
        Ok(None)
    }

    fn handle_search_key(&mut self, key: Key) -> Option<Outcome> {
        let Some(search) = self.search.as_mut() else {
            return None;
        };
        match key {
            Key::Char(ch) => {
                search.query.push(ch);
                search.found = self
                    .env
                    .history
                    .search_backward(&search.query, None)
                    .map(|(i, _)| i);
            }
            Key::Ctrl('r') => {
                search.found = self
                    .env
                    .history
                    .search_backward(&search.query, search.found)
                    .map(|(i, _)| i)
                    .or(search.found);
            }
            Key::Backspace => {
                search.query.pop();
                search.found = self
                    .env
                    .history
                    .search_backward(&search.query, None)
                    .map(|(i, _)| i);
            }
            Key::Enter => {
                let entry = search
                    .found
                    .and_then(|found| self.env.history.entries().nth(found))
                    .map(|e| e.to_string());
                if let Some(entry) = entry {
                    self.push_undo();
                    self.buffer = EditBuffer::from_text(&entry);
                }
                self.search = None;
            }
            Key::Ctrl('c') => return Some(Outcome::Cancelled),
            Key::Eof => return Some(Outcome::EndOfInput),
            _ => {
                // Any other key leaves search with the buffer untouched
                self.search = None;
            }
        }
        None
    }

    /// Whether Enter should continue the input instead of accepting
    fn continuation_pending(&self) -> bool {
        if !self.env.config.multiline {
            return false;
        }
        let (row, _) = self.buffer.cursor();
        self.buffer.lines()[row].ends_with('\\')
    }

    fn push_undo(&mut self) {
        if self.undo.len() >= UNDO_LIMIT {
            self.undo.remove(0);
        }
        self.undo.push(self.buffer.clone());
    }

    fn arm_hint(&mut self) {
        self.hint_pending = self.env.config.hint
            && self.env.completer.is_some()
            && self.menu.is_none()
            && !self.buffer.is_empty();
    }

    fn close_menu(&mut self) {
        self.menu = None;
    }

    fn history_previous(&mut self) {
        if self.env.history.is_empty() {
            return;
        }
        self.env.history.store_pending_line(&self.buffer.text());
        if let Some(entry) = self.env.history.previous() {
            self.push_undo();
            self.buffer = EditBuffer::from_text(&entry);
        }
    }

    fn history_next(&mut self) {
        if let Some(entry) = self.env.history.next() {
            self.push_undo();
            self.buffer = EditBuffer::from_text(&entry);
        }
    }

    /// Run the completer and apply the completion policy
    fn trigger_completion(&mut self, out: &mut dyn Write) {
        let Some(completer) = self.env.completer.as_deref_mut() else {
            return;
        };
        let mut env = Completions::new(&self.buffer.text(), self.buffer.cursor_offset());
        completer.complete(&mut env);
        let candidates = env.into_candidates();

        match candidates.len() {
            0 => {
                if self.env.config.beep {
                    beep(out);
                }
            }
            1 if self.env.config.auto_tab => {
                self.apply_candidate(&candidates[0]);
            }
            _ => {
                let candidates = self.insert_common_prefix(candidates);
                self.menu = Some(Menu {
                    candidates,
                    selected: 0,
                });
            }
        }
    }

    /// Insert a shared prefix that extends the current input, keeping the
    /// menu open for a further trigger
    fn insert_common_prefix(&mut self, candidates: Vec<Candidate>) -> Vec<Candidate> {
        // A lone candidate is a menu entry, not a prefix to force in
        if candidates.len() < 2 {
            return candidates;
        }
        let same_span = candidates.windows(2).all(|pair| {
            pair[0].delete_before == pair[1].delete_before
                && pair[0].delete_after == pair[1].delete_after
        });
        if !same_span {
            return candidates;
        }

        let prefix = common_prefix(&candidates);
        let prefix_len = prefix.chars().count();
        let before = candidates[0].delete_before;
        let after = candidates[0].delete_after;
        if prefix_len <= before {
            return candidates;
        }

        self.push_undo();
        self.buffer.replace_around_cursor(before, after, &prefix);
        candidates
            .into_iter()
            .map(|mut candidate| {
                candidate.delete_before = prefix_len;
                candidate.delete_after = 0;
                candidate
            })
            .collect()
    }

    fn apply_selected(&mut self) {
        if let Some(menu) = self.menu.take() {
            let candidate = menu.candidates[menu.selected].clone();
            self.apply_candidate(&candidate);
        }
    }

    fn apply_candidate(&mut self, candidate: &Candidate) {
        self.push_undo();
        self.buffer.replace_around_cursor(
            candidate.delete_before,
            candidate.delete_after,
            &candidate.replacement,
        );
    }

    fn menu_step(&mut self, delta: isize) {
        if let Some(menu) = self.menu.as_mut() {
            let count = menu.candidates.len() as isize;
            let selected = menu.selected as isize + delta;
            menu.selected = selected.rem_euclid(count) as usize;
        }
    }

    /// Compute the inline hint: the unambiguous continuation of the input
    fn compute_hint(&mut self) {
        let Some(completer) = self.env.completer.as_deref_mut() else {
            return;
        };
        let mut env = Completions::new(&self.buffer.text(), self.buffer.cursor_offset());
        completer.complete(&mut env);
        let candidates = env.into_candidates();
        if candidates.len() != 1 {
            return;
        }
        if let Some(text) = continuation_of(&candidates[0]) {
            self.hint = Some(Segment {
                text,
                style: self.hint_style(),
            });
        }
    }

    fn hint_style(&self) -> Style {
        self.env
            .styles
            .get("hint")
            .unwrap_or_else(|| Style::fg(crate::color::Color::Ansi(8)))
    }

    /// One style per code point of the buffer text, with overlays applied
    fn char_styles(&mut self, text: &str) -> Vec<Style> {
        let total = text.chars().count();
        let mut styles = vec![Style::plain(); total];

        if self.env.config.highlight {
            if let Some(highlighter) = self.env.highlighter.as_deref_mut() {
                let mut spans = StyleSpans::new(text);
                highlighter.highlight(text, &mut spans);
                for span in spans.iter() {
                    for style in styles.iter_mut().skip(span.start).take(span.len) {
                        *style = style.merge(span.style);
                    }
                }
            }
        }

        if self.env.config.brace_matching {
            let matched = self.env.styles.get("bracematch").unwrap_or_default();
            let error = self.env.styles.get("error").unwrap_or_default();
            match braces::find_highlight(&self.buffer, &self.env.config.matching_braces) {
                Some(BraceHighlight::Matched { open, close }) => {
                    for pos in [open, close] {
                        if let Some(offset) = self.offset_of(pos) {
                            styles[offset] = styles[offset].merge(matched);
                        }
                    }
                }
                Some(BraceHighlight::Unmatched(pos)) => {
                    if let Some(offset) = self.offset_of(pos) {
                        styles[offset] = styles[offset].merge(error);
                    }
                }
                None => {}
            }
        }

        styles
    }

    fn offset_of(&self, (row, col): (usize, usize)) -> Option<usize> {
        let lines = self.buffer.lines();
        if row >= lines.len() || col >= lines[row].chars().count() {
            return None;
        }
        let before: usize = lines[..row].iter().map(|l| l.chars().count() + 1).sum();
        Some(before + col)
    }

    /// Rows rendered below the input: completion menu or search status
    fn extra_rows(&self) -> Vec<Vec<Segment>> {
        if let Some(search) = &self.search {
            let found = search
                .found
                .and_then(|i| self.env.history.entries().nth(i))
                .unwrap_or("");
            let label = if search.found.is_some() || search.query.is_empty() {
                "(reverse-search)"
            } else {
                "(failed reverse-search)"
            };
            return vec![vec![Segment {
                text: format!("{} `{}': {}", label, search.query, found),
                style: self.hint_style(),
            }]];
        }

        let Some(menu) = &self.menu else {
            return Vec::new();
        };
        let page_start = (menu.selected / MENU_PAGE) * MENU_PAGE;
        let mut rows = Vec::new();
        for (index, candidate) in menu
            .candidates
            .iter()
            .enumerate()
            .skip(page_start)
            .take(MENU_PAGE)
        {
            let selected = index == menu.selected;
            let style = if selected {
                Style::attr(Attrs::REVERSE)
            } else {
                Style::plain()
            };
            let mut row = vec![Segment {
                text: format!("  {}", candidate.display_text()),
                style,
            }];
            if selected && self.env.config.inline_help {
                if let Some(help) = &candidate.help {
                    row.push(Segment {
                        text: format!("  {}", help),
                        style: self.hint_style(),
                    });
                }
            }
            rows.push(row);
        }
        if menu.candidates.len() > MENU_PAGE {
            rows.push(vec![Segment {
                text: format!(
                    "  ({}/{} candidates)",
                    menu.selected + 1,
                    menu.candidates.len()
                ),
                style: self.hint_style(),
            }]);
        }
        rows
    }

    /// The inline segment at the cursor: completion preview or hint
    fn inline_segment(&self) -> Option<Segment> {
        if let Some(menu) = &self.menu {
            if self.env.config.completion_preview {
                let candidate = &menu.candidates[menu.selected];
                if let Some(text) = continuation_of(candidate) {
                    return Some(Segment {
                        text,
                        style: self.hint_style(),
                    });
                }
            }
            return None;
        }
        self.hint.clone()
    }

    fn render(&mut self, out: &mut dyn Write) -> Result<()> {
        let width = self.env.width.unwrap_or_else(terminal_width);
        if width != self.last_width {
            // A resize redraws from scratch; the row diff is meaningless
            self.renderer.invalidate();
            self.last_width = width;
        }
        let text = self.buffer.text();
        let styles = self.char_styles(&text);
        let inline = self.inline_segment();
        let extra = self.extra_rows();
        let screen: Screen = compose(
            &self.prompt,
            &self.continuation,
            &self.buffer,
            &styles,
            inline.as_ref(),
            &extra,
            width,
        );
        self.renderer.draw(out, &screen)?;
        Ok(())
    }
}

/// The part of a candidate's replacement that extends the typed text
fn continuation_of(candidate: &Candidate) -> Option<String> {
    let text: String = candidate
        .replacement
        .chars()
        .skip(candidate.delete_before)
        .collect();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::{ByteEvent, ScriptedInput};

    struct Fixture {
        config: Config,
        styles: StyleRegistry,
        history: History,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                config: Config::default(),
                styles: StyleRegistry::new(),
                history: History::new(50),
            }
        }

        fn run(&mut self, input: ScriptedInput) -> Option<String> {
            self.run_with(input, None)
        }

        fn run_with(
            &mut self,
            mut input: ScriptedInput,
            completer: Option<&mut (dyn Completer + 'static)>,
        ) -> Option<String> {
            let env = SessionEnv {
                config: &self.config,
                styles: &self.styles,
                history: &mut self.history,
                completer,
                highlighter: None,
                capability: ColorCapability::Monochrome,
                width: Some(80),
            };
            let session = Session::new(env, "", "");
            let mut out = Vec::new();
            session.run(&mut input, &mut out).unwrap()
        }
    }

    #[test]
    fn test_simple_line_accept() {
        let mut fixture = Fixture::new();
        let result = fixture.run(ScriptedInput::bytes(b"hello\r"));
        assert_eq!(result.as_deref(), Some("hello"));
    }

    #[test]
    fn test_ctrl_c_cancels() {
        let mut fixture = Fixture::new();
        let result = fixture.run(ScriptedInput::bytes(b"hello\x03"));
        assert_eq!(result, None);
    }

    #[test]
    fn test_ctrl_d_on_empty_is_end_of_input() {
        let mut fixture = Fixture::new();
        let result = fixture.run(ScriptedInput::bytes(b"\x04"));
        assert_eq!(result, None);
    }

    #[test]
    fn test_ctrl_d_with_text_deletes_forward() {
        let mut fixture = Fixture::new();
        // Home then Ctrl-D removes the first character
        let result = fixture.run(ScriptedInput::bytes(b"abc\x01\x04\r"));
        assert_eq!(result.as_deref(), Some("bc"));
    }

    #[test]
    fn test_stream_end_yields_none() {
        let mut fixture = Fixture::new();
        let result = fixture.run(ScriptedInput::bytes(b"partial"));
        assert_eq!(result, None);
    }

    #[test]
    fn test_brace_insertion_in_session() {
        let mut fixture = Fixture::new();
        // '(' auto-closes; typing ')' steps over the inserted one
        let result = fixture.run(ScriptedInput::bytes(b"f(x)\r"));
        assert_eq!(result.as_deref(), Some("f(x)"));
    }

    #[test]
    fn test_multiline_with_alt_enter() {
        let mut fixture = Fixture::new();
        let result = fixture.run(ScriptedInput::bytes(b"one\x1b\rtwo\r"));
        assert_eq!(result.as_deref(), Some("one\ntwo"));
    }

    #[test]
    fn test_trailing_backslash_continues() {
        let mut fixture = Fixture::new();
        let result = fixture.run(ScriptedInput::bytes(b"a\\\rb\r"));
        assert_eq!(result.as_deref(), Some("a\\\nb"));
    }

    #[test]
    fn test_history_navigation() {
        let mut fixture = Fixture::new();
        fixture.history.add("older", true);
        fixture.history.add("newer", true);
        // Up Up Down accepts "older" -> "newer"? Up:newer, Up:older, Down:newer
        let result = fixture.run(ScriptedInput::bytes(b"\x1b[A\x1b[A\x1b[B\r"));
        assert_eq!(result.as_deref(), Some("newer"));
    }

    #[test]
    fn test_history_pending_line_restored() {
        let mut fixture = Fixture::new();
        fixture.history.add("entry", true);
        // Type, go up into history, come back down to the typed line
        let result = fixture.run(ScriptedInput::bytes(b"draft\x1b[A\x1b[B\r"));
        assert_eq!(result.as_deref(), Some("draft"));
    }

    #[test]
    fn test_undo_restores_buffer() {
        let mut fixture = Fixture::new();
        let result = fixture.run(ScriptedInput::bytes(b"ab\x1a\r"));
        assert_eq!(result.as_deref(), Some("a"));
    }

    #[test]
    fn test_kill_line_and_word() {
        let mut fixture = Fixture::new();
        let result = fixture.run(ScriptedInput::bytes(b"one two\x17\r"));
        assert_eq!(result.as_deref(), Some("one "));

        let result = fixture.run(ScriptedInput::bytes(b"scrap\x15kept\r"));
        assert_eq!(result.as_deref(), Some("kept"));
    }

    #[test]
    fn test_completion_single_candidate_auto_tab() {
        let mut fixture = Fixture::new();
        fixture.config.enable_auto_tab(true);
        let mut completer = |env: &mut Completions| {
            env.add_word_completions(&["hello"], |c: char| c.is_alphanumeric());
        };
        let result = fixture.run_with(
            ScriptedInput::bytes(b"hel\t\r"),
            Some(&mut completer),
        );
        assert_eq!(result.as_deref(), Some("hello"));
    }

    #[test]
    fn test_completion_common_prefix_insertion() {
        let mut fixture = Fixture::new();
        let mut completer = |env: &mut Completions| {
            env.add_word_completions(&["insert", "inspect"], |c: char| c.is_alphanumeric());
        };
        // Tab inserts the shared "ins", Ctrl-C abandons the menu
        let result = fixture.run_with(
            ScriptedInput::bytes(b"i\t\x03"),
            Some(&mut completer),
        );
        assert_eq!(result, None);
    }

    #[test]
    fn test_completion_menu_selection() {
        let mut fixture = Fixture::new();
        let mut completer = |env: &mut Completions| {
            env.add(Candidate::replacing("alpha", 1, 0));
            env.add(Candidate::replacing("album", 1, 0));
        };
        // Open the menu, step to the second candidate, accept it
        let result = fixture.run_with(
            ScriptedInput::bytes(b"a\t\t\r\r"),
            Some(&mut completer),
        );
        assert_eq!(result.as_deref(), Some("album"));
    }

    #[test]
    fn test_completion_applied_span() {
        let mut fixture = Fixture::new();
        fixture.config.enable_auto_tab(true);
        let mut completer = |env: &mut Completions| {
            env.add(Candidate::replacing("food", 3, 0));
        };
        // Buffer "foobar" with cursor after "foo"
        let result = fixture.run_with(
            ScriptedInput::bytes(b"foobar\x1b[D\x1b[D\x1b[D\t\r"),
            Some(&mut completer),
        );
        assert_eq!(result.as_deref(), Some("foodbar"));
    }

    #[test]
    fn test_single_candidate_lists_without_auto_tab() {
        let mut fixture = Fixture::new();
        let mut completer = |env: &mut Completions| {
            env.add_word_completions(&["hello"], |c: char| c.is_alphanumeric());
        };
        // auto-tab is off by default: Tab opens the list instead of applying,
        // Esc drops it, and the typed text is untouched
        let result = fixture.run_with(
            ScriptedInput::events(vec![
                ByteEvent::Byte(b'h'),
                ByteEvent::Byte(b'e'),
                ByteEvent::Byte(b'l'),
                ByteEvent::Byte(b'\t'),
                ByteEvent::Byte(0x1b),
                ByteEvent::TimedOut,
                ByteEvent::Byte(b'\r'),
            ]),
            Some(&mut completer),
        );
        assert_eq!(result.as_deref(), Some("hel"));
    }

    #[test]
    fn test_width_change_forces_full_repaint() {
        let mut fixture = Fixture::new();
        let env = SessionEnv {
            config: &fixture.config,
            styles: &fixture.styles,
            history: &mut fixture.history,
            completer: None,
            highlighter: None,
            capability: ColorCapability::Monochrome,
            width: Some(80),
        };
        let mut session = Session::new(env, "", "hello");

        let mut out = Vec::new();
        session.render(&mut out).unwrap();
        assert!(String::from_utf8_lossy(&out).contains("hello"));

        // Nothing changed: the diff rewrites no rows
        let mut out = Vec::new();
        session.render(&mut out).unwrap();
        assert!(!String::from_utf8_lossy(&out).contains("hello"));

        // A new width rewraps everything, so the frame repaints in full
        session.env.width = Some(20);
        let mut out = Vec::new();
        session.render(&mut out).unwrap();
        assert!(String::from_utf8_lossy(&out).contains("hello"));
    }

    #[test]
    fn test_hint_shown_after_quiet_period() {
        let mut fixture = Fixture::new();
        let mut completer = |env: &mut Completions| {
            env.add_word_completions(&["hello"], |c: char| c.is_alphanumeric());
        };
        let env = SessionEnv {
            config: &fixture.config,
            styles: &fixture.styles,
            history: &mut fixture.history,
            completer: Some(&mut completer),
            highlighter: None,
            capability: ColorCapability::Monochrome,
            width: Some(80),
        };
        let session = Session::new(env, "", "");
        let mut input = ScriptedInput::events(vec![
            ByteEvent::Byte(b'h'),
            ByteEvent::TimedOut,
            ByteEvent::Byte(b'\r'),
        ]);
        let mut out = Vec::new();
        let result = session.run(&mut input, &mut out).unwrap();
        // The unambiguous continuation appears, but is not part of the result
        assert!(String::from_utf8_lossy(&out).contains("ello"));
        assert_eq!(result.as_deref(), Some("h"));
    }

    #[test]
    fn test_no_candidates_beeps() {
        let mut fixture = Fixture::new();
        let mut completer = |_env: &mut Completions| {};
        let env = SessionEnv {
            config: &fixture.config,
            styles: &fixture.styles,
            history: &mut fixture.history,
            completer: Some(&mut completer),
            highlighter: None,
            capability: ColorCapability::Monochrome,
            width: Some(80),
        };
        let session = Session::new(env, "", "");
        let mut input = ScriptedInput::bytes(b"x\t\r");
        let mut out = Vec::new();
        session.run(&mut input, &mut out).unwrap();
        assert!(out.contains(&0x07));
    }

    #[test]
    fn test_history_search_loads_match() {
        let mut fixture = Fixture::new();
        fixture.history.add("git status", true);
        fixture.history.add("ls -la", true);
        // Ctrl-R, type "git", Enter loads the match, Enter accepts
        let result = fixture.run(ScriptedInput::bytes(b"\x12git\r\r"));
        assert_eq!(result.as_deref(), Some("git status"));
    }

    #[test]
    fn test_history_search_escape_keeps_buffer() {
        let mut fixture = Fixture::new();
        fixture.history.add("something", true);
        let result = fixture.run(ScriptedInput::events(
            b"typed\x12so"
                .iter()
                .map(|b| ByteEvent::Byte(*b))
                .chain([
                    ByteEvent::Byte(0x1b),
                    ByteEvent::TimedOut,
                    ByteEvent::Byte(b'\r'),
                ])
                .collect(),
        ));
        assert_eq!(result.as_deref(), Some("typed"));
    }

    #[test]
    fn test_seeded_initial_text() {
        let mut fixture = Fixture::new();
        let env = SessionEnv {
            config: &fixture.config,
            styles: &fixture.styles,
            history: &mut fixture.history,
            completer: None,
            highlighter: None,
            capability: ColorCapability::Monochrome,
            width: Some(80),
        };
        let session = Session::new(env, "", "seed");
        let mut input = ScriptedInput::bytes(b"ed\r");
        let mut out = Vec::new();
        let result = session.run(&mut input, &mut out).unwrap();
        assert_eq!(result.as_deref(), Some("seeded"));
    }
}
