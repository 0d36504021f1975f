//! Completion Engine
//!
//! Callback-driven candidate generation. The registered completer receives a
//! `Completions` environment exposing the input, the cursor, candidate
//! addition with span clamping, and convenience helpers for filename and
//! word completion. Candidates are applied to the edit buffer by the session
//! controller.

use std::fs;
use std::path::Path;

/// A proposed replacement for text around the cursor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Text inserted in place of the deleted span
    pub replacement: String,
    /// What the completion menu shows; defaults to the replacement
    pub display: Option<String>,
    /// Optional inline help shown next to the highlighted candidate
    pub help: Option<String>,
    /// Code points to delete before the cursor
    pub delete_before: usize,
    /// Code points to delete after the cursor
    pub delete_after: usize,
}

impl Candidate {
    /// Candidate that plainly inserts text at the cursor
    pub fn new(replacement: &str) -> Self {
        Self {
            replacement: replacement.to_string(),
            display: None,
            help: None,
            delete_before: 0,
            delete_after: 0,
        }
    }

    /// Candidate replacing a span around the cursor
    pub fn replacing(replacement: &str, delete_before: usize, delete_after: usize) -> Self {
        Self {
            delete_before,
            delete_after,
            ..Self::new(replacement)
        }
    }

    pub fn with_display(mut self, display: &str) -> Self {
        self.display = Some(display.to_string());
        self
    }

    pub fn with_help(mut self, help: &str) -> Self {
        self.help = Some(help.to_string());
        self
    }

    /// Text shown in the completion menu
    pub fn display_text(&self) -> &str {
        self.display.as_deref().unwrap_or(&self.replacement)
    }
}

/// Suggests candidates for the current input
pub trait Completer {
    fn complete(&mut self, env: &mut Completions);
}

impl<F: FnMut(&mut Completions)> Completer for F {
    fn complete(&mut self, env: &mut Completions) {
        self(env)
    }
}

/// Environment handed to the completer callback
///
/// Only the operations a completer legally needs: query input and cursor,
/// add candidates, and signal early stop. Spans of added candidates are
/// clamped to the buffer bounds so a misbehaving callback cannot corrupt
/// the session.
pub struct Completions {
    input: String,
    cursor: usize,
    candidates: Vec<Candidate>,
    stopped: bool,
}

impl Completions {
    pub(crate) fn new(input: &str, cursor: usize) -> Self {
        Self {
            input: input.to_string(),
            cursor,
            candidates: Vec::new(),
            stopped: false,
        }
    }

    /// The full buffer text
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Cursor position as a code-point offset into `input`
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The text before the cursor
    pub fn before_cursor(&self) -> String {
        self.input.chars().take(self.cursor).collect()
    }

    /// Add a candidate, clamping its span to the buffer bounds
    ///
    /// Ignored once the environment has been stopped.
    pub fn add(&mut self, mut candidate: Candidate) {
        if self.stopped {
            return;
        }
        let total = self.input.chars().count();
        candidate.delete_before = candidate.delete_before.min(self.cursor);
        candidate.delete_after = candidate.delete_after.min(total - self.cursor);
        self.candidates.push(candidate);
    }

    /// Add a plain insertion candidate
    pub fn add_text(&mut self, replacement: &str) {
        self.add(Candidate::new(replacement));
    }

    /// Complete the word before the cursor from a fixed candidate list
    ///
    /// The word boundary is decided by the caller-supplied predicate.
    pub fn add_word_completions<F>(&mut self, words: &[&str], is_word_char: F)
    where
        F: Fn(char) -> bool,
    {
        let before = self.before_cursor();
        let word: String = before
            .chars()
            .rev()
            .take_while(|c| is_word_char(*c))
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        let word_len = word.chars().count();

        for candidate in words {
            if candidate.starts_with(&word) && candidate.chars().count() > word_len {
                self.add(Candidate::replacing(candidate, word_len, 0));
            }
        }
    }

    /// Complete the (possibly quoted) path under the cursor from the
    /// file system, rooted at the current directory
    pub fn add_filename_completions(&mut self) {
        let before = self.before_cursor();
        let word: String = before
            .chars()
            .rev()
            .take_while(|c| !c.is_whitespace())
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        let word_len = word.chars().count();

        let quoted = word.starts_with('"');
        let path_part = if quoted { &word[1..] } else { word.as_str() };

        let (dir, prefix) = match path_part.rfind('/') {
            Some(i) => (&path_part[..i + 1], &path_part[i + 1..]),
            None => ("", path_part),
        };
        let read_dir = if dir.is_empty() { Path::new(".") } else { Path::new(dir) };

        let Ok(entries) = fs::read_dir(read_dir) else {
            return;
        };
        let mut matches: Vec<(String, bool)> = entries
            .flatten()
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().to_string();
                let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
                let hidden = name.starts_with('.');
                if name.starts_with(prefix) && (!hidden || prefix.starts_with('.')) {
                    Some((name, is_dir))
                } else {
                    None
                }
            })
            .collect();

        // Directories first, then case-insensitive by name
        matches.sort_by(|a, b| match (a.1, b.1) {
            (true, false) => std::cmp::Ordering::Less,
            (false, true) => std::cmp::Ordering::Greater,
            _ => a.0.to_lowercase().cmp(&b.0.to_lowercase()),
        });

        for (name, is_dir) in matches {
            let mut path = format!("{}{}", dir, name);
            if is_dir {
                path.push('/');
            }
            let replacement = if quoted || path.contains(char::is_whitespace) {
                format!("\"{}\"", path)
            } else {
                path.clone()
            };
            self.add(
                Candidate::replacing(&replacement, word_len, 0).with_display(&if is_dir {
                    format!("{}/", name)
                } else {
                    name
                }),
            );
        }
    }

    /// Stop generating candidates
    ///
    /// The engine invokes the completer at most once per trigger; stopping
    /// discards any candidates added afterwards, including by the
    /// convenience helpers.
    pub fn stop(&mut self) {
        self.stopped = true;
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub(crate) fn into_candidates(self) -> Vec<Candidate> {
        self.candidates
    }
}

/// Longest replacement prefix shared by all candidates
///
/// Only meaningful when all candidates replace the same span; the session
/// checks that before using the prefix.
pub(crate) fn common_prefix(candidates: &[Candidate]) -> String {
    let Some(first) = candidates.first() else {
        return String::new();
    };
    let mut prefix: Vec<char> = first.replacement.chars().collect();
    for candidate in &candidates[1..] {
        let shared = candidate
            .replacement
            .chars()
            .zip(prefix.iter())
            .take_while(|(a, b)| a == *b)
            .count();
        prefix.truncate(shared);
    }
    prefix.into_iter().collect()
}
