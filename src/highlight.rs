//! Syntax Highlighting Protocol
//!
//! The engine does not parse any language itself. A caller-registered
//! highlighter receives the buffer text on every render and reports style
//! spans over it; out-of-range spans are clamped rather than rejected so a
//! misbehaving callback cannot break the session.

use crate::style::Style;

/// A styled region of the input, in code-point offsets
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StyleSpan {
    pub start: usize,
    pub len: usize,
    pub style: Style,
}

/// Collector for highlight spans produced by a highlighter
#[derive(Debug, Default)]
pub struct StyleSpans {
    spans: Vec<StyleSpan>,
    input_len: usize,
}

impl StyleSpans {
    pub(crate) fn new(input: &str) -> Self {
        Self {
            spans: Vec::new(),
            input_len: input.chars().count(),
        }
    }

    /// Style `len` code points starting at `start`; clamped to the input
    pub fn add(&mut self, start: usize, len: usize, style: Style) {
        if start >= self.input_len || len == 0 {
            return;
        }
        let len = len.min(self.input_len - start);
        self.spans.push(StyleSpan { start, len, style });
    }

    pub fn iter(&self) -> impl Iterator<Item = &StyleSpan> {
        self.spans.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}

/// Produces style spans for the current input
pub trait Highlighter {
    fn highlight(&mut self, input: &str, spans: &mut StyleSpans);
}

impl<F: FnMut(&str, &mut StyleSpans)> Highlighter for F {
    fn highlight(&mut self, input: &str, spans: &mut StyleSpans) {
        self(input, spans)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::Attrs;

    #[test]
    fn test_spans_are_clamped() {
        let mut spans = StyleSpans::new("hello");
        spans.add(3, 10, Style::attr(Attrs::BOLD));
        let collected: Vec<_> = spans.iter().copied().collect();
        assert_eq!(collected[0].start, 3);
        assert_eq!(collected[0].len, 2);
    }

    #[test]
    fn test_out_of_range_span_is_dropped() {
        let mut spans = StyleSpans::new("hi");
        spans.add(5, 1, Style::plain());
        spans.add(0, 0, Style::plain());
        assert!(spans.is_empty());
    }

    #[test]
    fn test_closure_highlighter() {
        let mut highlighter = |input: &str, spans: &mut StyleSpans| {
            spans.add(0, input.chars().count(), Style::attr(Attrs::BOLD));
        };
        let mut spans = StyleSpans::new("abc");
        highlighter.highlight("abc", &mut spans);
        assert!(!spans.is_empty());
    }
}
