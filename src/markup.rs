//! Bbcode Markup Engine
//!
//! Parses bbcode-like markup (`[name prop=val ...]...[/name]`, `[/]` closes
//! the innermost tag) into styled text segments. Every tag opened during a
//! parse is closed by its end, explicitly or not, so a single `print` call
//! can never leak style state into the next one.

use crate::color::ColorCapability;
use crate::style::{Attrs, Style, StyleRegistry};

/// Longest bracket body considered as a potential tag
const MAX_TAG_LEN: usize = 64;

/// A run of text with one resolved style
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub text: String,
    pub style: Style,
}

/// Parse markup into styled segments
///
/// `base` is the style active outside any tag (the session style for
/// `print`, plain for prompts). Brackets that do not form a recognized tag
/// are kept as literal text. Unmatched closers are ignored; unclosed tags
/// are closed automatically at end of input.
pub fn parse_markup(text: &str, registry: &StyleRegistry, base: Style) -> Vec<Segment> {
    let mut segments: Vec<Segment> = Vec::new();
    let mut stack: Vec<(String, Style)> = Vec::new();
    let mut current = String::new();
    let mut chars = text.char_indices().peekable();

    let style_of = |stack: &Vec<(String, Style)>| stack.last().map(|(_, s)| *s).unwrap_or(base);

    while let Some((i, ch)) = chars.next() {
        if ch != '[' {
            current.push(ch);
            continue;
        }

        match scan_tag(&text[i..]) {
            Some((body, consumed)) => {
                let active = style_of(&stack);
                if let Some(name) = body.strip_prefix('/') {
                    if close_tag(&mut stack, name.trim()) {
                        flush(&mut segments, &mut current, active);
                        for _ in 0..consumed - 1 {
                            chars.next();
                        }
                    } else {
                        // Unmatched closer, keep it as literal text
                        current.push(ch);
                    }
                } else if let Some(style) = open_style(body, registry, active) {
                    flush(&mut segments, &mut current, active);
                    let name = tag_name(body);
                    stack.push((name, style));
                    for _ in 0..consumed - 1 {
                        chars.next();
                    }
                } else {
                    current.push(ch);
                }
            }
            None => current.push(ch),
        }
    }

    // Auto-close whatever is still open
    flush(&mut segments, &mut current, style_of(&stack));
    segments
}

/// Markup stripped down to its plain text
pub fn strip_markup(text: &str, registry: &StyleRegistry) -> String {
    parse_markup(text, registry, Style::plain())
        .into_iter()
        .map(|s| s.text)
        .collect()
}

/// Scan a bracket body starting at `[`; returns (body, chars consumed)
fn scan_tag(text: &str) -> Option<(&str, usize)> {
    let inner = text.strip_prefix('[')?;
    let mut len = 0;
    for (count, ch) in inner.chars().enumerate() {
        if ch == ']' {
            return Some((&inner[..len], count + 2));
        }
        if ch == '[' || ch == '\n' || count >= MAX_TAG_LEN {
            return None;
        }
        len += ch.len_utf8();
    }
    None
}

/// Resolve an open tag body to a style, or `None` if nothing in it is known
fn open_style(body: &str, registry: &StyleRegistry, active: Style) -> Option<Style> {
    if body.trim().is_empty() {
        return None;
    }
    let mut recognized = false;
    for token in body.split_whitespace() {
        if token.eq_ignore_ascii_case("on")
            || token.contains('=')
            || registry.get(&token.to_lowercase()).is_some()
        {
            recognized = true;
            break;
        }
    }
    if !recognized {
        return None;
    }
    Some(active.merge(registry.parse(body)))
}

/// Pop the stack for a close tag; `name` is empty for `[/]`
fn close_tag(stack: &mut Vec<(String, Style)>, name: &str) -> bool {
    if stack.is_empty() {
        return false;
    }
    if name.is_empty() {
        stack.pop();
        return true;
    }
    if let Some(pos) = stack.iter().rposition(|(n, _)| n == name) {
        stack.truncate(pos);
        return true;
    }
    false
}

fn tag_name(body: &str) -> String {
    let first = body.split_whitespace().next().unwrap_or("");
    first.split('=').next().unwrap_or("").to_lowercase()
}

fn flush(segments: &mut Vec<Segment>, current: &mut String, style: Style) {
    if current.is_empty() {
        return;
    }
    let text = std::mem::take(current);
    match segments.last_mut() {
        Some(last) if last.style == style => last.text.push_str(&text),
        _ => segments.push(Segment { text, style }),
    }
}

/// Render segments to an ANSI escape string for the given capability
///
/// Each segment is written with a full reset-and-apply so segment order
/// never matters; the output always ends with a reset.
pub fn render_ansi(segments: &[Segment], capability: ColorCapability, color: bool) -> String {
    let mut out = String::new();
    for segment in segments {
        if segment.text.is_empty() {
            continue;
        }
        if color {
            out.push_str("\x1b[0m");
            write_sgr(&mut out, segment.style, capability);
        }
        out.push_str(&segment.text);
    }
    if color {
        out.push_str("\x1b[0m");
    }
    out
}

fn write_sgr(out: &mut String, style: Style, capability: ColorCapability) {
    use crossterm::style::{Attribute, Color as CtColor, SetAttribute, SetBackgroundColor,
                           SetForegroundColor};
    use crossterm::Command;

    let attrs = style.attrs();
    if attrs.contains(Attrs::BOLD) {
        let _ = SetAttribute(Attribute::Bold).write_ansi(out);
    }
    if attrs.contains(Attrs::ITALIC) {
        let _ = SetAttribute(Attribute::Italic).write_ansi(out);
    }
    if attrs.contains(Attrs::UNDERLINE) {
        let _ = SetAttribute(Attribute::Underlined).write_ansi(out);
    }
    if attrs.contains(Attrs::REVERSE) {
        let _ = SetAttribute(Attribute::Reverse).write_ansi(out);
    }
    if let Some(fg) = style.fg {
        let c = fg.quantize(capability).to_crossterm();
        if c != CtColor::Reset {
            let _ = SetForegroundColor(c).write_ansi(out);
        }
    }
    if let Some(bg) = style.bg {
        let c = bg.quantize(capability).to_crossterm();
        if c != CtColor::Reset {
            let _ = SetBackgroundColor(c).write_ansi(out);
        }
    }
}
