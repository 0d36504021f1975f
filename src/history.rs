//! History Manager
//!
//! Ordered store of committed inputs with optional file persistence and
//! navigation. The backing file is strictly line oriented: embedded newlines
//! and backslashes are escaped on write and restored on load. Persistence
//! failures are never fatal; the store falls back to memory only.

use std::collections::VecDeque;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

/// Default maximum number of retained entries
pub const DEFAULT_MAX_ENTRIES: usize = 200;

/// Ordered history store, oldest entry first
#[derive(Debug)]
pub struct History {
    entries: VecDeque<String>,
    max_entries: usize,
    file: Option<PathBuf>,
    nav_index: Option<usize>,
    /// The line being typed before navigation started
    pending_line: Option<String>,
}

impl History {
    /// Create an in-memory history
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            max_entries: max_entries.max(1),
            file: None,
            nav_index: None,
            pending_line: None,
        }
    }

    /// Attach a backing file, loading any existing entries from it
    ///
    /// A missing or unreadable file is not an error; the store starts empty
    /// and the path stays armed for subsequent commits. `None` detaches the
    /// file and keeps history in memory only.
    pub fn set_file(&mut self, path: Option<PathBuf>, max_entries: usize) {
        self.max_entries = max_entries.max(1);
        self.entries.clear();
        self.reset_navigation();
        self.file = path;

        let Some(path) = self.file.clone() else {
            return;
        };
        match fs::read_to_string(&path) {
            Ok(data) => {
                for line in data.lines() {
                    let entry = unescape_entry(line);
                    if !entry.is_empty() {
                        self.entries.push_back(entry);
                    }
                }
                while self.entries.len() > self.max_entries {
                    self.entries.pop_front();
                }
            }
            Err(e) => {
                log::warn!("history file {:?} not loaded: {}", path, e);
            }
        }
    }

    /// Add a committed entry
    ///
    /// With duplicate suppression (`allow_duplicates` false) an entry equal
    /// to an existing one is moved to the most-recent position instead of
    /// being stored twice.
    pub fn add(&mut self, entry: &str, allow_duplicates: bool) {
        self.reset_navigation();
        if entry.is_empty() {
            return;
        }

        let mut trimmed_file = false;
        if !allow_duplicates {
            if let Some(pos) = self.entries.iter().position(|e| e == entry) {
                self.entries.remove(pos);
                trimmed_file = true;
            }
        }
        if self.entries.len() >= self.max_entries {
            self.entries.pop_front();
            trimmed_file = true;
        }
        self.entries.push_back(entry.to_string());

        // A plain append keeps the common case cheap; reordering or
        // trimming needs the whole file rewritten.
        if trimmed_file {
            self.rewrite_file();
        } else {
            self.append_to_file(entry);
        }
    }

    /// Remove the most recently added entry
    pub fn remove_last(&mut self) {
        self.reset_navigation();
        if self.entries.pop_back().is_some() {
            self.rewrite_file();
        }
    }

    /// Remove all entries
    pub fn clear(&mut self) {
        self.reset_navigation();
        self.entries.clear();
        self.rewrite_file();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in chronological order, oldest first
    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|s| s.as_str())
    }

    /// Remember the line being typed so navigation can return to it
    pub fn store_pending_line(&mut self, line: &str) {
        if self.nav_index.is_none() {
            self.pending_line = Some(line.to_string());
        }
    }

    /// Step to the previous (older) entry
    pub fn previous(&mut self) -> Option<String> {
        if self.entries.is_empty() {
            return None;
        }
        match self.nav_index {
            None => {
                self.nav_index = Some(self.entries.len() - 1);
                self.entries.back().cloned()
            }
            Some(idx) if idx > 0 => {
                self.nav_index = Some(idx - 1);
                self.entries.get(idx - 1).cloned()
            }
            Some(_) => self.entries.front().cloned(),
        }
    }

    /// Step to the next (newer) entry, returning the pending line past the end
    pub fn next(&mut self) -> Option<String> {
        match self.nav_index {
            None => None,
            Some(idx) if idx + 1 < self.entries.len() => {
                self.nav_index = Some(idx + 1);
                self.entries.get(idx + 1).cloned()
            }
            Some(_) => {
                self.nav_index = None;
                Some(self.pending_line.clone().unwrap_or_default())
            }
        }
    }

    /// Leave navigation mode
    pub fn reset_navigation(&mut self) {
        self.nav_index = None;
        self.pending_line = None;
    }

    /// Find the most recent entry containing `pattern`, starting strictly
    /// before `before` (or from the newest entry when `None`)
    pub fn search_backward(&self, pattern: &str, before: Option<usize>) -> Option<(usize, &str)> {
        let end = before.unwrap_or(self.entries.len());
        self.entries
            .iter()
            .enumerate()
            .take(end)
            .rev()
            .find(|(_, e)| e.contains(pattern))
            .map(|(i, e)| (i, e.as_str()))
    }

    fn append_to_file(&self, entry: &str) {
        let Some(path) = &self.file else {
            return;
        };
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .and_then(|mut f| writeln!(f, "{}", escape_entry(entry)));
        if let Err(e) = result {
            log::warn!("history append to {:?} failed: {}", path, e);
        }
    }

    fn rewrite_file(&self) {
        let Some(path) = &self.file else {
            return;
        };
        let mut data = String::new();
        for entry in &self.entries {
            data.push_str(&escape_entry(entry));
            data.push('\n');
        }
        if let Err(e) = fs::write(path, data) {
            log::warn!("history rewrite of {:?} failed: {}", path, e);
        }
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}

/// Escape an entry so the history file stays one entry per line
fn escape_entry(entry: &str) -> String {
    let mut out = String::with_capacity(entry.len());
    for ch in entry.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            _ => out.push(ch),
        }
    }
    out
}

fn unescape_entry(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_trim() {
        let mut history = History::new(3);
        for entry in ["a", "b", "c", "d"] {
            history.add(entry, true);
        }
        assert_eq!(history.len(), 3);
        let entries: Vec<_> = history.entries().collect();
        assert_eq!(entries, vec!["b", "c", "d"]);
    }

    #[test]
    fn test_duplicate_suppression_moves_to_front() {
        let mut history = History::new(10);
        history.add("first", false);
        history.add("second", false);
        history.add("first", false);

        assert_eq!(history.len(), 2);
        let entries: Vec<_> = history.entries().collect();
        assert_eq!(entries, vec!["second", "first"]);
    }

    #[test]
    fn test_duplicates_allowed() {
        let mut history = History::new(10);
        history.add("same", true);
        history.add("same", true);
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_navigation_with_pending_line() {
        let mut history = History::new(10);
        history.add("first", true);
        history.add("second", true);

        history.store_pending_line("typing...");
        assert_eq!(history.previous().unwrap(), "second");
        assert_eq!(history.previous().unwrap(), "first");
        // Past the oldest entry stays put
        assert_eq!(history.previous().unwrap(), "first");

        assert_eq!(history.next().unwrap(), "second");
        assert_eq!(history.next().unwrap(), "typing...");
        assert!(history.next().is_none());
    }

    #[test]
    fn test_search_backward() {
        let mut history = History::new(10);
        history.add("git status", true);
        history.add("ls -la", true);
        history.add("git push", true);

        let (idx, entry) = history.search_backward("git", None).unwrap();
        assert_eq!(entry, "git push");
        let (_, older) = history.search_backward("git", Some(idx)).unwrap();
        assert_eq!(older, "git status");
        assert!(history.search_backward("xyz", None).is_none());
    }

    #[test]
    fn test_escape_round_trip() {
        let entry = "line one\nline two \\ end";
        assert_eq!(unescape_entry(&escape_entry(entry)), entry);
        assert!(!escape_entry(entry).contains('\n'));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.txt");

        let mut history = History::new(10);
        history.set_file(Some(path.clone()), 10);
        history.add("plain", false);
        history.add("multi\nline", false);
        history.add("back\\slash", false);

        let mut reloaded = History::new(10);
        reloaded.set_file(Some(path), 10);
        let entries: Vec<_> = reloaded.entries().collect();
        assert_eq!(entries, vec!["plain", "multi\nline", "back\\slash"]);
    }

    #[test]
    fn test_remove_last_and_clear_touch_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.txt");

        let mut history = History::new(10);
        history.set_file(Some(path.clone()), 10);
        history.add("one", false);
        history.add("two", false);
        history.remove_last();

        let mut reloaded = History::new(10);
        reloaded.set_file(Some(path.clone()), 10);
        assert_eq!(reloaded.entries().collect::<Vec<_>>(), vec!["one"]);

        history.clear();
        let mut reloaded = History::new(10);
        reloaded.set_file(Some(path), 10);
        assert!(reloaded.is_empty());
    }

    #[test]
    fn test_missing_file_is_not_fatal() {
        let mut history = History::new(10);
        history.set_file(Some(PathBuf::from("/no/such/dir/history.txt")), 10);
        assert!(history.is_empty());
        // Adding still works, silently in memory only
        history.add("entry", false);
        assert_eq!(history.len(), 1);
    }
}
