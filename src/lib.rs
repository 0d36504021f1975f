//! promptline - embeddable rich line editing for terminal programs
//!
//! This library replaces a plain buffered line read with a full editing
//! session: multiline input, persistent history, completion, inline hints,
//! syntax highlighting, and bbcode-style text markup, all rendered through
//! an incremental diff so redraws stay cheap on slow terminals.
//!
//! # Features
//!
//! - **Multiline Editing**: Alt-Enter inserts a line break, a trailing
//!   backslash continues the input, and arrow keys move through lines
//! - **History**: navigation, incremental reverse search, duplicate
//!   suppression, and optional file persistence
//! - **Completion**: callback driven, with a menu, common-prefix insertion,
//!   and word/filename helpers
//! - **Highlighting and Hints**: a highlighter callback styles the input on
//!   every render; a single remaining completion shows as an inline hint
//! - **Markup**: prompts and output accept tags like `[b]`, `[red]`, and
//!   `[color=#e80]`, degraded automatically to the terminal's color depth
//! - **Graceful Fallback**: on a non-interactive stream every call becomes a
//!   plain line read, so piped usage keeps working
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use promptline::{Completions, Readline};
//!
//! let mut rl = Readline::new();
//! rl.set_history(Some("history.txt".into()), 200);
//! rl.set_completer(Some(Box::new(|env: &mut Completions| {
//!     env.add_word_completions(&["open", "close", "quit"], |c| c.is_alphanumeric());
//! })));
//!
//! while let Ok(Some(line)) = rl.readline("[b]app[/b]") {
//!     if line == "quit" {
//!         break;
//!     }
//!     rl.println(&format!("[green]ok:[/green] {}", line));
//! }
//! ```

pub mod braces;
pub mod buffer;
pub mod color;
pub mod complete;
pub mod config;
pub mod error;
pub mod highlight;
pub mod history;
pub mod input;
pub mod markup;
pub mod readline;
pub mod render;
mod session;
pub mod style;
pub mod term;

// Re-export commonly used types for convenience
pub use color::{Color, ColorCapability};
pub use complete::{Candidate, Completer, Completions};
pub use config::Config;
pub use error::{Error, Result};
pub use highlight::{Highlighter, StyleSpan, StyleSpans};
pub use history::History;
pub use readline::Readline;
pub use style::{Attrs, Style, StyleRegistry};
