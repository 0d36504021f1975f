//! Input Event Decoder
//!
//! Turns raw terminal bytes into logical key events. A lone ESC is
//! disambiguated from the start of an escape sequence by timing: after ESC
//! the decoder waits `esc_initial_delay_ms` for a following byte, then
//! `esc_followup_delay_ms` between bytes inside a sequence. A sequence that
//! stalls is abandoned and its bytes are re-interpreted individually.

use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use crate::term::{ByteEvent, ByteSource};

/// A logical key event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    /// Control chord, lowercase letter or `'_'`
    Ctrl(char),
    /// ESC-prefixed printable (Alt chord)
    Alt(char),
    Enter,
    /// Alt+Enter / ESC Enter, inserts a newline in multiline mode
    AltEnter,
    Tab,
    Esc,
    Backspace,
    Delete,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    WordLeft,
    WordRight,
    /// End of the input stream
    Eof,
}

/// Decodes bytes from a `ByteSource` into `Key` events
pub struct Decoder<'a> {
    source: &'a mut dyn ByteSource,
    initial_delay: Duration,
    followup_delay: Duration,
    /// Bytes from an abandoned sequence, replayed before new reads
    pending: VecDeque<u8>,
}

impl<'a> Decoder<'a> {
    pub fn new(
        source: &'a mut dyn ByteSource,
        initial_delay_ms: u64,
        followup_delay_ms: u64,
    ) -> Self {
        Self {
            source,
            initial_delay: Duration::from_millis(initial_delay_ms),
            followup_delay: Duration::from_millis(followup_delay_ms),
            pending: VecDeque::new(),
        }
    }

    /// Read the next key event
    ///
    /// `first_timeout` bounds the wait for the first byte only (used for the
    /// hint delay); `Ok(None)` reports that it elapsed with no input.
    pub fn next_key(&mut self, first_timeout: Option<Duration>) -> io::Result<Option<Key>> {
        loop {
            let byte = match self.next_byte(first_timeout)? {
                ByteEvent::Byte(b) => b,
                ByteEvent::TimedOut => return Ok(None),
                ByteEvent::Eof => return Ok(Some(Key::Eof)),
            };
            if let Some(key) = self.decode_byte(byte)? {
                return Ok(Some(key));
            }
        }
    }

    fn next_byte(&mut self, timeout: Option<Duration>) -> io::Result<ByteEvent> {
        if let Some(byte) = self.pending.pop_front() {
            return Ok(ByteEvent::Byte(byte));
        }
        self.source.read_byte(timeout)
    }

    /// Read a byte inside a sequence, bounded by the given delay
    fn seq_byte(&mut self, delay: Duration) -> io::Result<Option<u8>> {
        match self.next_byte(Some(delay))? {
            ByteEvent::Byte(b) => Ok(Some(b)),
            _ => Ok(None),
        }
    }

    fn decode_byte(&mut self, byte: u8) -> io::Result<Option<Key>> {
        let key = match byte {
            b'\r' | b'\n' => Key::Enter,
            b'\t' => Key::Tab,
            0x7f | 0x08 => Key::Backspace,
            0x1b => return self.decode_escape(),
            0x1c => Key::Ctrl('\\'),
            0x1d => Key::Ctrl(']'),
            0x1e => Key::Ctrl('^'),
            0x1f => Key::Ctrl('_'),
            0x01..=0x1a => Key::Ctrl((b'a' + byte - 1) as char),
            0x00 => return Ok(None),
            b if b < 0x80 => Key::Char(b as char),
            b => return self.decode_utf8(b),
        };
        Ok(Some(key))
    }

    /// Decode after a lone ESC byte
    fn decode_escape(&mut self) -> io::Result<Option<Key>> {
        let Some(byte) = self.seq_byte(self.initial_delay)? else {
            return Ok(Some(Key::Esc));
        };
        let key = match byte {
            b'[' => return self.decode_csi(),
            b'O' => return self.decode_ss3(),
            b'\r' | b'\n' => Key::AltEnter,
            b'b' => Key::WordLeft,
            b'f' => Key::WordRight,
            0x7f | 0x08 => Key::Ctrl('w'),
            0x1b => Key::Esc,
            b if (0x20..0x7f).contains(&b) => Key::Alt(b as char),
            _ => Key::Esc,
        };
        Ok(Some(key))
    }

    /// Decode a CSI sequence (`ESC [ params final`)
    fn decode_csi(&mut self) -> io::Result<Option<Key>> {
        let mut params = Vec::new();
        loop {
            let Some(byte) = self.seq_byte(self.followup_delay)? else {
                // Stalled sequence: replay what we saw as individual bytes
                self.pending.push_back(b'[');
                for b in &params {
                    self.pending.push_back(*b);
                }
                return Ok(Some(Key::Esc));
            };
            if (0x40..0x7f).contains(&byte) {
                return Ok(csi_key(&params, byte));
            }
            params.push(byte);
            if params.len() > 16 {
                log::debug!("discarding overlong CSI sequence");
                return Ok(None);
            }
        }
    }

    /// Decode an SS3 sequence (`ESC O final`)
    fn decode_ss3(&mut self) -> io::Result<Option<Key>> {
        let Some(byte) = self.seq_byte(self.followup_delay)? else {
            self.pending.push_back(b'O');
            return Ok(Some(Key::Esc));
        };
        Ok(match byte {
            b'A' => Some(Key::Up),
            b'B' => Some(Key::Down),
            b'C' => Some(Key::Right),
            b'D' => Some(Key::Left),
            b'H' => Some(Key::Home),
            b'F' => Some(Key::End),
            _ => None,
        })
    }

    /// Gather the continuation bytes of a UTF-8 character
    fn decode_utf8(&mut self, first: u8) -> io::Result<Option<Key>> {
        let len = match first {
            0xc0..=0xdf => 2,
            0xe0..=0xef => 3,
            0xf0..=0xf7 => 4,
            _ => return Ok(None),
        };
        let mut bytes = vec![first];
        for _ in 1..len {
            match self.seq_byte(self.followup_delay)? {
                Some(b) if (0x80..0xc0).contains(&b) => bytes.push(b),
                _ => {
                    log::debug!("discarding malformed UTF-8 input");
                    return Ok(None);
                }
            }
        }
        match std::str::from_utf8(&bytes) {
            Ok(s) => Ok(s.chars().next().map(Key::Char)),
            Err(_) => Ok(None),
        }
    }
}

fn csi_key(params: &[u8], final_byte: u8) -> Option<Key> {
    let params = std::str::from_utf8(params).ok()?;
    let modified_word = |plain: Key, word: Key| {
        // Parameter 1;5 (ctrl) or 1;3 (alt) selects word motion
        if params == "1;5" || params == "1;3" {
            word
        } else {
            plain
        }
    };
    match final_byte {
        b'A' => Some(Key::Up),
        b'B' => Some(Key::Down),
        b'C' => Some(modified_word(Key::Right, Key::WordRight)),
        b'D' => Some(modified_word(Key::Left, Key::WordLeft)),
        b'H' => Some(Key::Home),
        b'F' => Some(Key::End),
        b'Z' => Some(Key::Tab),
        b'~' => match params.split(';').next().unwrap_or("") {
            "1" | "7" => Some(Key::Home),
            "4" | "8" => Some(Key::End),
            "3" => Some(Key::Delete),
            "5" => Some(Key::PageUp),
            "6" => Some(Key::PageDown),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::ScriptedInput;

    fn decode_all(mut input: ScriptedInput) -> Vec<Key> {
        let mut decoder = Decoder::new(&mut input, 100, 10);
        let mut keys = Vec::new();
        loop {
            match decoder.next_key(None).unwrap() {
                Some(Key::Eof) | None => break,
                Some(key) => keys.push(key),
            }
        }
        keys
    }

    #[test]
    fn test_printable_and_control() {
        let keys = decode_all(ScriptedInput::bytes(b"a\x01\x0b\t\r"));
        assert_eq!(
            keys,
            vec![
                Key::Char('a'),
                Key::Ctrl('a'),
                Key::Ctrl('k'),
                Key::Tab,
                Key::Enter
            ]
        );
    }

    #[test]
    fn test_high_control_bytes_are_chords() {
        // 0x1c-0x1f must not leak into the buffer as raw characters
        let keys = decode_all(ScriptedInput::bytes(b"\x1c\x1d\x1e\x1f"));
        assert_eq!(
            keys,
            vec![
                Key::Ctrl('\\'),
                Key::Ctrl(']'),
                Key::Ctrl('^'),
                Key::Ctrl('_')
            ]
        );
    }

    #[test]
    fn test_arrow_keys() {
        let keys = decode_all(ScriptedInput::bytes(b"\x1b[A\x1b[B\x1b[C\x1b[D"));
        assert_eq!(keys, vec![Key::Up, Key::Down, Key::Right, Key::Left]);
    }

    #[test]
    fn test_home_end_delete_variants() {
        let keys = decode_all(ScriptedInput::bytes(b"\x1b[H\x1b[1~\x1b[4~\x1b[3~\x1bOF"));
        assert_eq!(
            keys,
            vec![Key::Home, Key::Home, Key::End, Key::Delete, Key::End]
        );
    }

    #[test]
    fn test_ctrl_arrow_word_motion() {
        let keys = decode_all(ScriptedInput::bytes(b"\x1b[1;5C\x1b[1;5D"));
        assert_eq!(keys, vec![Key::WordRight, Key::WordLeft]);
    }

    #[test]
    fn test_lone_escape_times_out_as_esc() {
        let input = ScriptedInput::events(vec![ByteEvent::Byte(0x1b), ByteEvent::TimedOut]);
        let keys = decode_all(input);
        assert_eq!(keys, vec![Key::Esc]);
    }

    #[test]
    fn test_stalled_csi_replays_bytes() {
        // ESC [ then silence: the '[' must come back as a literal character
        let input = ScriptedInput::events(vec![
            ByteEvent::Byte(0x1b),
            ByteEvent::Byte(b'['),
            ByteEvent::TimedOut,
        ]);
        let keys = decode_all(input);
        assert_eq!(keys, vec![Key::Esc, Key::Char('[')]);
    }

    #[test]
    fn test_alt_chords() {
        let keys = decode_all(ScriptedInput::bytes(b"\x1bb\x1bf\x1bx\x1b\r"));
        assert_eq!(
            keys,
            vec![Key::WordLeft, Key::WordRight, Key::Alt('x'), Key::AltEnter]
        );
    }

    #[test]
    fn test_utf8_decoding() {
        let keys = decode_all(ScriptedInput::bytes("é€".as_bytes()));
        assert_eq!(keys, vec![Key::Char('é'), Key::Char('€')]);
    }

    #[test]
    fn test_timeout_on_first_byte_returns_none() {
        let mut input = ScriptedInput::events(vec![ByteEvent::TimedOut]);
        let mut decoder = Decoder::new(&mut input, 100, 10);
        assert_eq!(decoder.next_key(Some(Duration::from_millis(50))).unwrap(), None);
    }
}
