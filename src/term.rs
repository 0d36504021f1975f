//! Terminal I/O Layer
//!
//! Raw-mode control scoped by a guard, timed byte-level reads from the
//! terminal, and interactivity sensing. When the input stream has no editing
//! capability (non-terminal stdin or a `dumb` terminal) the session uses the
//! plain line-mode read in this module, bypassing escape decoding and
//! rendering entirely.

use std::io::{self, BufRead, Write};
use std::time::Duration;

use crossterm::terminal;

/// Outcome of a timed byte read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteEvent {
    Byte(u8),
    TimedOut,
    Eof,
}

/// Timed byte-level input
///
/// The decoder depends only on this, so sessions can run against scripted
/// input in tests. `timeout` of `None` blocks until a byte or end of stream.
pub trait ByteSource {
    fn read_byte(&mut self, timeout: Option<Duration>) -> io::Result<ByteEvent>;
}

/// Scoped raw-mode handle; restores the terminal on every exit path
pub struct RawModeGuard {
    active: bool,
}

impl RawModeGuard {
    pub fn new() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self { active: true })
    }

    /// Restore early, before the guard drops
    pub fn restore(&mut self) {
        if self.active {
            let _ = terminal::disable_raw_mode();
            self.active = false;
        }
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        self.restore();
    }
}

/// Byte reads from the process stdin
pub struct TtyInput;

#[cfg(unix)]
impl ByteSource for TtyInput {
    fn read_byte(&mut self, timeout: Option<Duration>) -> io::Result<ByteEvent> {
        let timeout_ms: libc::c_int = match timeout {
            Some(t) => t.as_millis().min(i32::MAX as u128) as libc::c_int,
            None => -1,
        };
        let mut fds = libc::pollfd {
            fd: libc::STDIN_FILENO,
            events: libc::POLLIN,
            revents: 0,
        };
        loop {
            let ready = unsafe { libc::poll(&mut fds, 1, timeout_ms) };
            if ready < 0 {
                let err = io::Error::last_os_error();
                if err.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(err);
            }
            if ready == 0 {
                return Ok(ByteEvent::TimedOut);
            }
            let mut byte = 0u8;
            let n = unsafe {
                libc::read(libc::STDIN_FILENO, &mut byte as *mut u8 as *mut libc::c_void, 1)
            };
            return match n {
                1 => Ok(ByteEvent::Byte(byte)),
                0 => Ok(ByteEvent::Eof),
                _ => {
                    let err = io::Error::last_os_error();
                    if err.kind() == io::ErrorKind::Interrupted {
                        continue;
                    }
                    Err(err)
                }
            };
        }
    }
}

#[cfg(not(unix))]
impl ByteSource for TtyInput {
    fn read_byte(&mut self, _timeout: Option<Duration>) -> io::Result<ByteEvent> {
        // Without poll(2) reads block; escape timing degrades gracefully
        use std::io::Read;
        let mut byte = [0u8; 1];
        match io::stdin().read(&mut byte)? {
            0 => Ok(ByteEvent::Eof),
            _ => Ok(ByteEvent::Byte(byte[0])),
        }
    }
}

/// Whether stdin supports interactive editing
///
/// A `dumb` terminal, a non-terminal stdin, or an attached debugger all
/// route the session into line mode.
pub fn is_interactive() -> bool {
    let term = std::env::var("TERM").unwrap_or_default();
    if term == "dumb" {
        return false;
    }
    if debugger_attached() {
        return false;
    }
    stdin_is_tty()
}

#[cfg(target_os = "linux")]
fn debugger_attached() -> bool {
    std::fs::read_to_string("/proc/self/status")
        .ok()
        .and_then(|status| tracer_pid(&status))
        .map(|pid| pid != 0)
        .unwrap_or(false)
}

#[cfg(not(target_os = "linux"))]
fn debugger_attached() -> bool {
    false
}

/// The `TracerPid` field of a `/proc/<pid>/status` dump
#[cfg(target_os = "linux")]
fn tracer_pid(status: &str) -> Option<u32> {
    status
        .lines()
        .find_map(|line| line.strip_prefix("TracerPid:"))
        .and_then(|value| value.trim().parse().ok())
}

#[cfg(unix)]
fn stdin_is_tty() -> bool {
    unsafe { libc::isatty(libc::STDIN_FILENO) == 1 }
}

#[cfg(not(unix))]
fn stdin_is_tty() -> bool {
    crossterm::tty::IsTty::is_tty(&io::stdin())
}

/// Line-mode fallback: one plain line, no escape decoding, no rendering
///
/// Returns `None` at end of stream.
pub fn read_line_fallback() -> io::Result<Option<String>> {
    let mut line = String::new();
    let n = io::stdin().lock().read_line(&mut line)?;
    if n == 0 {
        return Ok(None);
    }
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }
    Ok(Some(line))
}

/// Current terminal width in columns, with a sane fallback
pub fn terminal_width() -> usize {
    terminal::size().map(|(w, _)| w as usize).unwrap_or(80).max(8)
}

/// Sound the terminal bell
pub fn beep(out: &mut dyn Write) {
    let _ = out.write_all(b"\x07");
    let _ = out.flush();
}

#[cfg(all(test, target_os = "linux"))]
mod tests {
    use super::*;

    #[test]
    fn test_tracer_pid_parsing() {
        let status = "Name:\tcat\nState:\tR (running)\nTracerPid:\t1234\nUid:\t0\n";
        assert_eq!(tracer_pid(status), Some(1234));

        let status = "Name:\tcat\nTracerPid:\t0\n";
        assert_eq!(tracer_pid(status), Some(0));
        assert_eq!(tracer_pid("Name:\tcat\n"), None);
    }
}

/// Scripted byte source for decoder and session tests
#[cfg(test)]
pub struct ScriptedInput {
    events: std::collections::VecDeque<ByteEvent>,
}

#[cfg(test)]
impl ScriptedInput {
    /// Build from raw bytes, ending in EOF
    pub fn bytes(bytes: &[u8]) -> Self {
        Self {
            events: bytes.iter().map(|b| ByteEvent::Byte(*b)).collect(),
        }
    }

    /// Build from an explicit event script
    pub fn events(events: Vec<ByteEvent>) -> Self {
        Self {
            events: events.into(),
        }
    }
}

#[cfg(test)]
impl ByteSource for ScriptedInput {
    fn read_byte(&mut self, _timeout: Option<Duration>) -> io::Result<ByteEvent> {
        Ok(self.events.pop_front().unwrap_or(ByteEvent::Eof))
    }
}
