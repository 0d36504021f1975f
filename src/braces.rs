//! Brace Matching and Auto-Insertion
//!
//! Auto-inserts the closing half of a configured pair when its opener is
//! typed, types over an existing closer instead of duplicating it, and
//! locates the nearest enclosing pair around the cursor for highlighting.

use crate::buffer::EditBuffer;
use crate::config::Config;

/// Result of scanning for a brace pair around the cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BraceHighlight {
    /// Both members of the nearest pair, as (line, column) positions
    Matched {
        open: (usize, usize),
        close: (usize, usize),
    },
    /// A brace at/near the cursor with no partner
    Unmatched((usize, usize)),
}

/// Insert a character, applying the brace insertion rules
///
/// With brace insertion enabled: typing an opener from the insertion set
/// also inserts its closer after the cursor; typing a closer that already
/// sits at the cursor advances past it instead of inserting a duplicate.
pub fn insert_char(buffer: &mut EditBuffer, ch: char, config: &Config) {
    if config.brace_insertion {
        // Type-over takes priority so symmetric pairs (quotes) don't grow
        if is_closer(ch, &config.insertion_braces) && buffer.char_at_cursor() == Some(ch) {
            buffer.move_right();
            return;
        }
        if let Some(&(_, close)) = config
            .insertion_braces
            .iter()
            .find(|(open, _)| *open == ch)
        {
            buffer.insert_char(ch);
            buffer.insert_char(close);
            buffer.move_left();
            return;
        }
    }
    buffer.insert_char(ch);
}

/// Find the nearest pair from the matching set around the cursor
///
/// Prefers a brace directly at or before the cursor, then the nearest
/// enclosing opener. Returns `None` when no brace is in reach.
pub fn find_highlight(buffer: &EditBuffer, pairs: &[(char, char)]) -> Option<BraceHighlight> {
    if pairs.is_empty() {
        return None;
    }
    let chars = flatten(buffer);
    let offset = buffer.cursor_offset();

    let anchor = [offset, offset.wrapping_sub(1)]
        .into_iter()
        .find(|&i| i < chars.len() && is_brace(chars[i].0, pairs))
        .or_else(|| enclosing_opener(&chars, offset, pairs))?;

    let (ch, pos) = chars[anchor];
    let matched = if is_opener(ch, pairs) {
        scan_forward(&chars, anchor, pairs)
    } else {
        scan_backward(&chars, anchor, pairs)
    };

    Some(match matched {
        Some(partner) => {
            let (open, close) = if is_opener(ch, pairs) {
                (pos, chars[partner].1)
            } else {
                (chars[partner].1, pos)
            };
            BraceHighlight::Matched { open, close }
        }
        None => BraceHighlight::Unmatched(pos),
    })
}

fn is_opener(ch: char, pairs: &[(char, char)]) -> bool {
    pairs.iter().any(|(open, _)| *open == ch)
}

fn is_closer(ch: char, pairs: &[(char, char)]) -> bool {
    pairs.iter().any(|(_, close)| *close == ch)
}

fn is_brace(ch: char, pairs: &[(char, char)]) -> bool {
    is_opener(ch, pairs) || is_closer(ch, pairs)
}

fn partner_of(ch: char, pairs: &[(char, char)]) -> char {
    pairs
        .iter()
        .find_map(|&(open, close)| {
            if open == ch {
                Some(close)
            } else if close == ch {
                Some(open)
            } else {
                None
            }
        })
        .unwrap_or(ch)
}

/// Buffer text as (char, position) with newlines as separators
fn flatten(buffer: &EditBuffer) -> Vec<(char, (usize, usize))> {
    let mut chars = Vec::new();
    for (row, line) in buffer.lines().iter().enumerate() {
        if row > 0 {
            chars.push(('\n', (row, 0)));
        }
        for (col, ch) in line.chars().enumerate() {
            chars.push((ch, (row, col)));
        }
    }
    chars
}

/// Walk backward from the cursor to the nearest opener that encloses it
fn enclosing_opener(
    chars: &[(char, (usize, usize))],
    offset: usize,
    pairs: &[(char, char)],
) -> Option<usize> {
    let mut depth = 0i32;
    for i in (0..offset.min(chars.len())).rev() {
        let ch = chars[i].0;
        if is_closer(ch, pairs) && !is_opener(ch, pairs) {
            depth += 1;
        } else if is_opener(ch, pairs) {
            if depth == 0 {
                return Some(i);
            }
            depth -= 1;
        }
    }
    None
}

fn scan_forward(
    chars: &[(char, (usize, usize))],
    anchor: usize,
    pairs: &[(char, char)],
) -> Option<usize> {
    let open = chars[anchor].0;
    let close = partner_of(open, pairs);
    let mut depth = 0;
    for (i, &(ch, _)) in chars.iter().enumerate().skip(anchor + 1) {
        if ch == open && open != close {
            depth += 1;
        } else if ch == close {
            if depth == 0 {
                return Some(i);
            }
            depth -= 1;
        }
    }
    None
}

fn scan_backward(
    chars: &[(char, (usize, usize))],
    anchor: usize,
    pairs: &[(char, char)],
) -> Option<usize> {
    let close = chars[anchor].0;
    let open = partner_of(close, pairs);
    let mut depth = 0;
    for i in (0..anchor).rev() {
        let ch = chars[i].0;
        if ch == close && open != close {
            depth += 1;
        } else if ch == open {
            if depth == 0 {
                return Some(i);
            }
            depth -= 1;
        }
    }
    None
}
