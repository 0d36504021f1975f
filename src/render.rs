//! Render Engine
//!
//! Recomputes the logical screen (prompt, wrapped buffer with style
//! overlays, hint, and any rows below the input) on every state change and
//! diffs it against the previously painted screen, rewriting only the rows
//! that changed. Full repaints happen only on the first paint and after an
//! explicit invalidation (resize, clear-screen).

use std::io::{self, Write};

use crossterm::cursor::{MoveDown, MoveToColumn, MoveUp};
use crossterm::terminal::{Clear, ClearType};
use crossterm::Command;
use unicode_width::UnicodeWidthChar;

use crate::buffer::EditBuffer;
use crate::color::ColorCapability;
use crate::markup::{render_ansi, Segment};
use crate::style::Style;

/// A fully computed logical screen
#[derive(Debug, Clone, PartialEq)]
pub struct Screen {
    /// Rows of styled segments, top to bottom
    pub rows: Vec<Vec<Segment>>,
    /// Cursor as (row index, display column)
    pub cursor: (usize, usize),
}

/// Compose the logical screen for the current editor state
///
/// `styles` holds one style per code point of `buffer.text()` (newlines
/// included). `hint` is inserted at the cursor; `extra_rows` (completion
/// menu, search status) are appended below the buffer. Rows are hard-wrapped
/// at `width` display columns.
pub fn compose(
    prompt: &[Segment],
    continuation: &[Segment],
    buffer: &EditBuffer,
    styles: &[Style],
    hint: Option<&Segment>,
    extra_rows: &[Vec<Segment>],
    width: usize,
) -> Screen {
    let width = width.max(8);
    let (cursor_row, cursor_col) = buffer.cursor();
    let mut rows = Vec::new();
    let mut cursor = (0, 0);

    let mut offset = 0; // flattened code-point offset of the line start
    for (row, line) in buffer.lines().iter().enumerate() {
        let prefix = if row == 0 { prompt } else { continuation };
        let mut chars: Vec<(char, Style)> = segment_chars(prefix);
        let prefix_len = chars.len();

        for (col, ch) in line.chars().enumerate() {
            let style = styles.get(offset + col).copied().unwrap_or_default();
            chars.push((ch, style));
        }

        let mut cursor_index = None;
        if row == cursor_row {
            let mut index = prefix_len + cursor_col.min(line.chars().count());
            if let Some(hint) = hint {
                // The hint renders between the text before and after the cursor
                let at = index;
                let hint_chars: Vec<(char, Style)> =
                    hint.text.chars().map(|c| (c, hint.style)).collect();
                chars.splice(at..at, hint_chars);
                index = at;
            }
            cursor_index = Some(index);
        }

        let (wrapped, mapped) = wrap_row(&chars, cursor_index, width);
        if let Some((wrap_row, wrap_col)) = mapped {
            cursor = (rows.len() + wrap_row, wrap_col);
        }
        rows.extend(wrapped);
        offset += line.chars().count() + 1;
    }

    for extra in extra_rows {
        let chars = segment_chars(extra);
        let (wrapped, _) = wrap_row(&chars, None, width);
        rows.extend(wrapped);
    }

    Screen { rows, cursor }
}

fn segment_chars(segments: &[Segment]) -> Vec<(char, Style)> {
    segments
        .iter()
        .flat_map(|s| s.text.chars().map(move |c| (c, s.style)))
        .collect()
}

/// Hard-wrap one logical row, mapping a char index to (row, display column)
fn wrap_row(
    chars: &[(char, Style)],
    cursor_index: Option<usize>,
    width: usize,
) -> (Vec<Vec<Segment>>, Option<(usize, usize)>) {
    let mut rows = Vec::new();
    let mut current: Vec<Segment> = Vec::new();
    let mut col = 0;
    let mut mapped = None;

    for (i, (ch, style)) in chars.iter().enumerate() {
        let ch_width = ch.width().unwrap_or(0);
        if col + ch_width > width && col > 0 {
            rows.push(std::mem::take(&mut current));
            col = 0;
        }
        if cursor_index == Some(i) {
            mapped = Some((rows.len(), col));
        }
        push_char(&mut current, *ch, *style);
        col += ch_width;
    }
    if cursor_index == Some(chars.len()) {
        // Cursor past the last character wraps with it
        if col >= width {
            rows.push(std::mem::take(&mut current));
            col = 0;
        }
        mapped = Some((rows.len(), col));
    }
    rows.push(current);
    (rows, mapped)
}

fn push_char(segments: &mut Vec<Segment>, ch: char, style: Style) {
    match segments.last_mut() {
        Some(last) if last.style == style => last.text.push(ch),
        _ => segments.push(Segment {
            text: ch.to_string(),
            style,
        }),
    }
}

/// Paints screens with minimal terminal writes
pub struct Renderer {
    capability: ColorCapability,
    color: bool,
    /// ANSI text of the rows currently on screen
    painted: Vec<String>,
    /// Frame row the terminal cursor is on
    cursor_row: usize,
}

impl Renderer {
    pub fn new(capability: ColorCapability, color: bool) -> Self {
        Self {
            capability,
            color,
            painted: Vec::new(),
            cursor_row: 0,
        }
    }

    /// Forget the painted state, forcing the next draw to repaint fully
    pub fn invalidate(&mut self) {
        self.painted.clear();
        self.cursor_row = 0;
    }

    /// Reconcile the terminal with `screen`
    pub fn draw(&mut self, out: &mut dyn Write, screen: &Screen) -> io::Result<()> {
        let mut ansi = String::new();
        let rendered: Vec<String> = screen
            .rows
            .iter()
            .map(|row| render_ansi(row, self.capability, self.color))
            .collect();

        let total = rendered.len().max(self.painted.len());
        for row in 0..total {
            let new = rendered.get(row).map(|s| s.as_str()).unwrap_or("");
            let old = self.painted.get(row).map(|s| s.as_str());
            if old == Some(new) {
                continue;
            }
            self.move_to_row(&mut ansi, row);
            let _ = MoveToColumn(0).write_ansi(&mut ansi);
            ansi.push_str(new);
            let _ = Clear(ClearType::UntilNewLine).write_ansi(&mut ansi);
        }

        // Park the cursor where the screen wants it
        self.move_to_row(&mut ansi, screen.cursor.0);
        let _ = MoveToColumn(screen.cursor.1 as u16).write_ansi(&mut ansi);

        out.write_all(ansi.as_bytes())?;
        out.flush()?;
        self.painted = rendered;
        Ok(())
    }

    /// Emit cursor motion to a frame row, creating rows below as needed
    fn move_to_row(&mut self, ansi: &mut String, row: usize) {
        if row < self.cursor_row {
            let _ = MoveUp((self.cursor_row - row) as u16).write_ansi(ansi);
        }
        while row > self.cursor_row {
            if self.cursor_row + 1 < self.painted.len().max(1) {
                let _ = MoveDown(1).write_ansi(ansi);
                self.cursor_row += 1;
            } else {
                // Past the painted area: a real newline scrolls if needed
                ansi.push_str("\r\n");
                self.cursor_row += 1;
                self.painted.push(String::new());
            }
        }
        self.cursor_row = row;
    }

    /// Leave the input area: cursor to the end of the last row, then newline
    pub fn finish(&mut self, out: &mut dyn Write) -> io::Result<()> {
        let mut ansi = String::new();
        let last = self.painted.len().saturating_sub(1);
        self.move_to_row(&mut ansi, last);
        ansi.push_str("\r\n");
        out.write_all(ansi.as_bytes())?;
        out.flush()?;
        self.invalidate();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{Attrs, Style};

    fn plain(text: &str) -> Vec<Segment> {
        vec![Segment {
            text: text.to_string(),
            style: Style::plain(),
        }]
    }

    fn screen_text(screen: &Screen) -> Vec<String> {
        screen
            .rows
            .iter()
            .map(|row| row.iter().map(|s| s.text.as_str()).collect())
            .collect()
    }

    #[test]
    fn test_compose_single_line() {
        let buffer = EditBuffer::from_text("hello");
        let styles = vec![Style::plain(); 5];
        let screen = compose(&plain("> "), &plain("| "), &buffer, &styles, None, &[], 80);
        assert_eq!(screen_text(&screen), vec!["> hello"]);
        assert_eq!(screen.cursor, (0, 7));
    }

    #[test]
    fn test_compose_multiline_markers() {
        let buffer = EditBuffer::from_text("one\ntwo");
        let styles = vec![Style::plain(); 7];
        let screen = compose(&plain("> "), &plain("| "), &buffer, &styles, None, &[], 80);
        assert_eq!(screen_text(&screen), vec!["> one", "| two"]);
        assert_eq!(screen.cursor, (1, 5));
    }

    #[test]
    fn test_compose_wraps_long_lines() {
        let buffer = EditBuffer::from_text("abcdefghij");
        let styles = vec![Style::plain(); 10];
        let screen = compose(&plain("> "), &plain("| "), &buffer, &styles, None, &[], 8);
        assert_eq!(screen_text(&screen), vec!["> abcdef", "ghij"]);
        assert_eq!(screen.cursor, (1, 4));
    }

    #[test]
    fn test_compose_hint_at_cursor() {
        let buffer = EditBuffer::from_text("he");
        let styles = vec![Style::plain(); 2];
        let hint = Segment {
            text: "llo".to_string(),
            style: Style::attr(Attrs::REVERSE),
        };
        let screen = compose(
            &plain("> "),
            &plain("| "),
            &buffer,
            &styles,
            Some(&hint),
            &[],
            80,
        );
        assert_eq!(screen_text(&screen), vec!["> hello"]);
        // Cursor stays before the hint text
        assert_eq!(screen.cursor, (0, 4));
    }

    #[test]
    fn test_compose_extra_rows() {
        let buffer = EditBuffer::from_text("x");
        let styles = vec![Style::plain(); 1];
        let menu = vec![plain("item-one"), plain("item-two")];
        let screen = compose(&plain("> "), &plain("| "), &buffer, &styles, None, &menu, 80);
        assert_eq!(
            screen_text(&screen),
            vec!["> x", "item-one", "item-two"]
        );
        assert_eq!(screen.cursor, (0, 3));
    }

    #[test]
    fn test_wide_characters_in_columns() {
        let buffer = EditBuffer::from_text("日本");
        let styles = vec![Style::plain(); 2];
        let screen = compose(&plain("> "), &plain("| "), &buffer, &styles, None, &[], 80);
        // Two double-width chars after a two-column prompt
        assert_eq!(screen.cursor, (0, 6));
    }

    #[test]
    fn test_renderer_diffs_unchanged_rows() {
        let mut renderer = Renderer::new(ColorCapability::Monochrome, false);
        let screen1 = Screen {
            rows: vec![plain("> one"), plain("menu")],
            cursor: (0, 5),
        };
        let mut out = Vec::new();
        renderer.draw(&mut out, &screen1).unwrap();
        let first = String::from_utf8(out).unwrap();
        assert!(first.contains("> one"));
        assert!(first.contains("menu"));

        // Same first row: only the second should be rewritten
        let screen2 = Screen {
            rows: vec![plain("> one"), plain("menu2")],
            cursor: (0, 5),
        };
        let mut out = Vec::new();
        renderer.draw(&mut out, &screen2).unwrap();
        let second = String::from_utf8(out).unwrap();
        assert!(!second.contains("> one"));
        assert!(second.contains("menu2"));
    }

    #[test]
    fn test_renderer_clears_removed_rows() {
        let mut renderer = Renderer::new(ColorCapability::Monochrome, false);
        let mut out = Vec::new();
        renderer
            .draw(
                &mut out,
                &Screen {
                    rows: vec![plain("a"), plain("b")],
                    cursor: (0, 1),
                },
            )
            .unwrap();

        let mut out = Vec::new();
        renderer
            .draw(
                &mut out,
                &Screen {
                    rows: vec![plain("a")],
                    cursor: (0, 1),
                },
            )
            .unwrap();
        let ansi = String::from_utf8(out).unwrap();
        // The vacated second row is cleared, not left behind
        assert!(ansi.contains("\x1b[K"));
    }
}
