//! Edit Buffer and Cursor Model
//!
//! Multiline text storage with a single cursor. Lines never contain a line
//! terminator; the cursor column counts Unicode code points and is clamped
//! back into range after every mutation. Horizontal motion steps over whole
//! grapheme clusters while storage stays code-point granular.

use unicode_segmentation::UnicodeSegmentation;

/// Multiline edit buffer with cursor management
#[derive(Debug, Clone, PartialEq)]
pub struct EditBuffer {
    lines: Vec<String>,
    row: usize,
    col: usize,
}

impl EditBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self {
            lines: vec![String::new()],
            row: 0,
            col: 0,
        }
    }

    /// Create a buffer from existing text, cursor at the end
    pub fn from_text(text: &str) -> Self {
        let lines: Vec<String> = if text.is_empty() {
            vec![String::new()]
        } else {
            let mut lines: Vec<String> = text.split('\n').map(|s| s.to_string()).collect();
            if lines.is_empty() {
                lines.push(String::new());
            }
            lines
        };
        let row = lines.len() - 1;
        let col = char_count(&lines[row]);
        Self { lines, row, col }
    }

    /// The complete text content
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Line contents, in order
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Cursor position as (line index, column in code points)
    pub fn cursor(&self) -> (usize, usize) {
        (self.row, self.col)
    }

    /// Move the cursor to a position, clamping into range
    pub fn set_cursor(&mut self, row: usize, col: usize) {
        self.row = row.min(self.lines.len() - 1);
        self.col = col.min(char_count(&self.lines[self.row]));
    }

    pub fn is_empty(&self) -> bool {
        self.lines.len() == 1 && self.lines[0].is_empty()
    }

    /// Cursor position as a code-point offset into `text()`
    pub fn cursor_offset(&self) -> usize {
        let before: usize = self.lines[..self.row]
            .iter()
            .map(|l| char_count(l) + 1)
            .sum();
        before + self.col
    }

    /// Move the cursor to a code-point offset into `text()`
    pub fn set_cursor_offset(&mut self, offset: usize) {
        let mut remaining = offset;
        for (row, line) in self.lines.iter().enumerate() {
            let len = char_count(line);
            if remaining <= len {
                self.row = row;
                self.col = remaining;
                return;
            }
            remaining -= len + 1;
        }
        self.row = self.lines.len() - 1;
        self.col = char_count(&self.lines[self.row]);
    }

    /// Character at the cursor, if any
    pub fn char_at_cursor(&self) -> Option<char> {
        self.lines[self.row].chars().nth(self.col)
    }

    /// Character immediately before the cursor on the same line
    pub fn char_before_cursor(&self) -> Option<char> {
        if self.col == 0 {
            return None;
        }
        self.lines[self.row].chars().nth(self.col - 1)
    }

    /// Insert a character at the cursor
    ///
    /// Newlines are routed through `insert_newline` so no line ever holds a
    /// terminator.
    pub fn insert_char(&mut self, ch: char) {
        if ch == '\n' {
            self.insert_newline(false);
            return;
        }
        let byte = byte_index(&self.lines[self.row], self.col);
        self.lines[self.row].insert(byte, ch);
        self.col += 1;
    }

    /// Split the current line at the cursor
    ///
    /// With `indent` the continuation line is pre-padded with the leading
    /// whitespace of the line it came from.
    pub fn insert_newline(&mut self, indent: bool) {
        let byte = byte_index(&self.lines[self.row], self.col);
        let rest = self.lines[self.row].split_off(byte);
        let pad = if indent {
            leading_whitespace(&self.lines[self.row])
        } else {
            String::new()
        };
        let pad_len = char_count(&pad);
        self.lines.insert(self.row + 1, pad + &rest);
        self.row += 1;
        self.col = pad_len;
    }

    /// Insert text, honoring embedded newlines
    pub fn insert_str(&mut self, text: &str, indent: bool) {
        for ch in text.chars() {
            if ch == '\n' {
                self.insert_newline(indent);
            } else {
                self.insert_char(ch);
            }
        }
    }

    /// Delete the character before the cursor, joining lines at column zero
    pub fn delete_back(&mut self) -> bool {
        if self.col > 0 {
            let byte = byte_index(&self.lines[self.row], self.col - 1);
            self.lines[self.row].remove(byte);
            self.col -= 1;
            true
        } else if self.row > 0 {
            let line = self.lines.remove(self.row);
            self.row -= 1;
            self.col = char_count(&self.lines[self.row]);
            self.lines[self.row].push_str(&line);
            true
        } else {
            false
        }
    }

    /// Delete the character at the cursor, joining lines at end of line
    pub fn delete_forward(&mut self) -> bool {
        let len = char_count(&self.lines[self.row]);
        if self.col < len {
            let byte = byte_index(&self.lines[self.row], self.col);
            self.lines[self.row].remove(byte);
            true
        } else if self.row < self.lines.len() - 1 {
            let next = self.lines.remove(self.row + 1);
            self.lines[self.row].push_str(&next);
            true
        } else {
            false
        }
    }

    /// Delete the word before the cursor
    pub fn delete_word_back(&mut self) {
        if self.col == 0 {
            self.delete_back();
            return;
        }
        let chars: Vec<char> = self.lines[self.row].chars().collect();
        let mut new_col = self.col;
        while new_col > 0 && chars[new_col - 1].is_whitespace() {
            new_col -= 1;
        }
        while new_col > 0 && !chars[new_col - 1].is_whitespace() {
            new_col -= 1;
        }
        let start = byte_index(&self.lines[self.row], new_col);
        let end = byte_index(&self.lines[self.row], self.col);
        self.lines[self.row].drain(start..end);
        self.col = new_col;
    }

    /// Delete from the cursor to the end of the line
    pub fn delete_to_end(&mut self) {
        let byte = byte_index(&self.lines[self.row], self.col);
        self.lines[self.row].truncate(byte);
    }

    /// Clear the current line
    pub fn delete_line(&mut self) {
        self.lines[self.row].clear();
        self.col = 0;
    }

    /// Move left by one grapheme cluster, wrapping to the previous line
    pub fn move_left(&mut self) {
        if self.col > 0 {
            let byte = byte_index(&self.lines[self.row], self.col);
            let before = &self.lines[self.row][..byte];
            if let Some(grapheme) = before.graphemes(true).next_back() {
                self.col -= char_count(grapheme);
            }
        } else if self.row > 0 {
            self.row -= 1;
            self.col = char_count(&self.lines[self.row]);
        }
    }

    /// Move right by one grapheme cluster, wrapping to the next line
    pub fn move_right(&mut self) {
        let len = char_count(&self.lines[self.row]);
        if self.col < len {
            let byte = byte_index(&self.lines[self.row], self.col);
            let after = &self.lines[self.row][byte..];
            if let Some(grapheme) = after.graphemes(true).next() {
                self.col += char_count(grapheme);
            }
        } else if self.row < self.lines.len() - 1 {
            self.row += 1;
            self.col = 0;
        }
    }

    /// Move up one line, clamping the column
    pub fn move_up(&mut self) -> bool {
        if self.row == 0 {
            return false;
        }
        self.row -= 1;
        self.col = self.col.min(char_count(&self.lines[self.row]));
        true
    }

    /// Move down one line, clamping the column
    pub fn move_down(&mut self) -> bool {
        if self.row >= self.lines.len() - 1 {
            return false;
        }
        self.row += 1;
        self.col = self.col.min(char_count(&self.lines[self.row]));
        true
    }

    pub fn move_home(&mut self) {
        self.col = 0;
    }

    pub fn move_end(&mut self) {
        self.col = char_count(&self.lines[self.row]);
    }

    /// Move to the first line, keeping the column where possible
    pub fn move_first_line(&mut self) {
        self.row = 0;
        self.col = self.col.min(char_count(&self.lines[0]));
    }

    /// Move to the last line, keeping the column where possible
    pub fn move_last_line(&mut self) {
        self.row = self.lines.len() - 1;
        self.col = self.col.min(char_count(&self.lines[self.row]));
    }

    /// Move to the very end of the buffer
    pub fn move_to_end(&mut self) {
        self.row = self.lines.len() - 1;
        self.col = char_count(&self.lines[self.row]);
    }

    /// Move to the start of the previous word
    pub fn move_word_left(&mut self) {
        if self.col == 0 {
            self.move_left();
            return;
        }
        let chars: Vec<char> = self.lines[self.row].chars().collect();
        let mut col = self.col;
        while col > 0 && !is_word_char(chars[col - 1]) {
            col -= 1;
        }
        while col > 0 && is_word_char(chars[col - 1]) {
            col -= 1;
        }
        self.col = col;
    }

    /// Move past the end of the next word
    pub fn move_word_right(&mut self) {
        let chars: Vec<char> = self.lines[self.row].chars().collect();
        if self.col >= chars.len() {
            self.move_right();
            return;
        }
        let mut col = self.col;
        while col < chars.len() && !is_word_char(chars[col]) {
            col += 1;
        }
        while col < chars.len() && is_word_char(chars[col]) {
            col += 1;
        }
        self.col = col;
    }

    /// Replace a span of characters around the cursor
    ///
    /// Deletes up to `before` code points left of the cursor and `after`
    /// right of it (both clamped to the buffer bounds, newlines included),
    /// inserts `replacement`, and leaves the cursor after the insertion.
    pub fn replace_around_cursor(&mut self, before: usize, after: usize, replacement: &str) {
        let text = self.text();
        let chars: Vec<char> = text.chars().collect();
        let offset = self.cursor_offset();
        let before = before.min(offset);
        let after = after.min(chars.len() - offset);

        let mut new_text: String = chars[..offset - before].iter().collect();
        new_text.push_str(replacement);
        new_text.extend(&chars[offset + after..]);

        let target = offset - before + char_count(replacement);
        *self = Self::from_text(&new_text);
        self.set_cursor_offset(target);
    }
}

impl Default for EditBuffer {
    fn default() -> Self {
        Self::new()
    }
}

fn char_count(s: &str) -> usize {
    s.chars().count()
}

fn byte_index(line: &str, col: usize) -> usize {
    line.char_indices()
        .nth(col)
        .map(|(i, _)| i)
        .unwrap_or(line.len())
}

fn leading_whitespace(line: &str) -> String {
    line.chars().take_while(|c| c.is_whitespace()).collect()
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}
