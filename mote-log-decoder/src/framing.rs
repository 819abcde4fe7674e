//! HDLC-style frame deframer
//!
//! Motes delimit every serial record with a flag byte and protect literal
//! flag/escape bytes inside the payload with two-byte escape sequences.
//! This module converts a raw byte stream back into frame payloads.
//!
//! ## Wire format
//! - Frame delimiter: 0x7E at start and end
//! - Escape byte: 0x7D; 0x7D 0x5E decodes to a literal 0x7E,
//!   0x7D 0x5D decodes to a literal 0x7D
//!
//! The deframer is a two-state machine fed one byte at a time. It holds no
//! cross-frame state beyond the accumulation buffer and the last byte seen,
//! so one instance per byte source is cheap and pipelines stay independent.

/// Frame delimiter
pub const HDLC_FLAG: u8 = 0x7E;
/// Escape byte
pub const HDLC_ESCAPE: u8 = 0x7D;
/// Escaped form of a literal flag byte
pub const HDLC_FLAG_ESCAPED: u8 = 0x5E;
/// Escaped form of a literal escape byte
pub const HDLC_ESCAPE_ESCAPED: u8 = 0x5D;

/// Framing-level statistics, folded into the pipeline's fault counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FramingStats {
    /// Complete frames emitted
    pub frames: u64,
    /// Frames still open when the source ended (dropped)
    pub unterminated_frames: u64,
    /// Escape bytes not followed by a valid marker (copied literally)
    pub stray_escapes: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// No open frame
    Idle,
    /// Accumulating bytes of an open frame
    InFrame,
}

/// Incremental flag-delimited deframer
#[derive(Debug)]
pub struct Deframer {
    state: State,
    /// Raw accumulation buffer, flags included until finalization
    buf: Vec<u8>,
    /// Last byte examined. Starts as the flag byte so a stream that begins
    /// mid-way (implicit leading flag) still opens a frame on its first
    /// data byte.
    last_byte: u8,
    stats: FramingStats,
}

impl Deframer {
    /// Create a deframer in the idle state
    pub fn new() -> Self {
        Self {
            state: State::Idle,
            buf: Vec::new(),
            last_byte: HDLC_FLAG,
            stats: FramingStats::default(),
        }
    }

    /// Feed one byte; returns a complete, escape-resolved payload when this
    /// byte closed a frame
    pub fn push(&mut self, byte: u8) -> Option<Vec<u8>> {
        let emitted = match self.state {
            State::Idle => {
                if byte != HDLC_FLAG && self.last_byte == HDLC_FLAG {
                    // Start of frame: the flag and this byte both buffer
                    self.buf.push(HDLC_FLAG);
                    self.buf.push(byte);
                    self.state = State::InFrame;
                }
                // A flag while idle (back-to-back delimiters) is a no-op;
                // a non-flag byte with no preceding flag is inter-frame
                // garbage and is dropped
                None
            }
            State::InFrame => {
                self.buf.push(byte);
                if byte == HDLC_FLAG {
                    self.state = State::Idle;
                    self.stats.frames += 1;
                    Some(self.finalize())
                } else {
                    None
                }
            }
        };
        self.last_byte = byte;
        emitted
    }

    /// Strip the outer flags and resolve escape sequences
    fn finalize(&mut self) -> Vec<u8> {
        debug_assert!(self.buf.len() >= 2);
        let trimmed = &self.buf[1..self.buf.len() - 1];
        let payload = unescape(trimmed, &mut self.stats.stray_escapes);
        self.buf.clear();
        payload
    }

    /// True if a frame is currently open
    pub fn in_frame(&self) -> bool {
        self.state == State::InFrame
    }

    /// Signal end of the byte source. Any partially buffered frame is
    /// dropped and counted; the deframer resets to idle.
    pub fn finish(&mut self) -> FramingStats {
        if self.in_frame() {
            log::warn!(
                "byte source ended inside a frame; dropping {} buffered bytes",
                self.buf.len()
            );
            self.stats.unterminated_frames += 1;
            self.buf.clear();
            self.state = State::Idle;
        }
        self.last_byte = HDLC_FLAG;
        self.stats
    }

    /// Current framing statistics
    pub fn stats(&self) -> FramingStats {
        self.stats
    }
}

impl Default for Deframer {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve escape sequences left to right, as independent non-overlapping
/// substitutions.
///
/// An escape byte followed by anything but the two markers (or ending the
/// input) is undefined on the wire; it is copied literally and counted
/// rather than dropped.
fn unescape(raw: &[u8], stray_escapes: &mut u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == HDLC_ESCAPE {
            match raw.get(i + 1) {
                Some(&HDLC_FLAG_ESCAPED) => {
                    out.push(HDLC_FLAG);
                    i += 2;
                    continue;
                }
                Some(&HDLC_ESCAPE_ESCAPED) => {
                    out.push(HDLC_ESCAPE);
                    i += 2;
                    continue;
                }
                _ => {
                    log::debug!("stray escape byte at offset {} in frame", i);
                    *stray_escapes += 1;
                }
            }
        }
        out.push(raw[i]);
        i += 1;
    }
    out
}

/// Wrap a payload in flags, escaping literal flag/escape bytes.
///
/// Inverse of the deframer; used to synthesize capture fixtures and to
/// check the round-trip property.
pub fn escape(payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 2);
    out.push(HDLC_FLAG);
    for &b in payload {
        match b {
            HDLC_FLAG => {
                out.push(HDLC_ESCAPE);
                out.push(HDLC_FLAG_ESCAPED);
            }
            HDLC_ESCAPE => {
                out.push(HDLC_ESCAPE);
                out.push(HDLC_ESCAPE_ESCAPED);
            }
            _ => out.push(b),
        }
    }
    out.push(HDLC_FLAG);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Run a whole byte slice through a fresh deframer
    fn deframe_all(bytes: &[u8]) -> (Vec<Vec<u8>>, FramingStats) {
        let mut deframer = Deframer::new();
        let mut frames = Vec::new();
        for &b in bytes {
            if let Some(payload) = deframer.push(b) {
                frames.push(payload);
            }
        }
        let stats = deframer.finish();
        (frames, stats)
    }

    #[test]
    fn test_simple_frame() {
        let (frames, stats) = deframe_all(&[0x7E, 0x53, 0x01, 0x02, 0x00, 0x7E]);
        assert_eq!(frames, vec![vec![0x53, 0x01, 0x02, 0x00]]);
        assert_eq!(stats.frames, 1);
        assert_eq!(stats.unterminated_frames, 0);
    }

    #[test]
    fn test_implicit_leading_flag() {
        // Stream starts mid-way: first data byte opens a frame anyway
        let (frames, _) = deframe_all(&[0x53, 0x01, 0x02, 0x00, 0x7E]);
        assert_eq!(frames, vec![vec![0x53, 0x01, 0x02, 0x00]]);
    }

    #[test]
    fn test_back_to_back_frames_share_no_state() {
        let (frames, stats) =
            deframe_all(&[0x7E, 0x41, 0x42, 0x7E, 0x7E, 0x43, 0x7E]);
        assert_eq!(frames, vec![vec![0x41, 0x42], vec![0x43]]);
        assert_eq!(stats.frames, 2);
    }

    #[test]
    fn test_repeated_flags_emit_nothing() {
        let (frames, stats) = deframe_all(&[0x7E, 0x7E, 0x7E, 0x7E]);
        assert!(frames.is_empty());
        assert_eq!(stats.frames, 0);
        assert_eq!(stats.unterminated_frames, 0);
    }

    #[test]
    fn test_escaped_flag_is_not_a_boundary() {
        // 7D 5E inside the frame decodes to a literal 7E in the payload
        let (frames, _) = deframe_all(&[0x7E, 0x41, 0x7D, 0x5E, 0x42, 0x7E]);
        assert_eq!(frames, vec![vec![0x41, 0x7E, 0x42]]);
    }

    #[test]
    fn test_escaped_escape() {
        let (frames, _) = deframe_all(&[0x7E, 0x7D, 0x5D, 0x41, 0x7E]);
        assert_eq!(frames, vec![vec![0x7D, 0x41]]);
    }

    #[test]
    fn test_stray_escape_copied_literally() {
        let (frames, stats) = deframe_all(&[0x7E, 0x7D, 0x41, 0x7E]);
        assert_eq!(frames, vec![vec![0x7D, 0x41]]);
        assert_eq!(stats.stray_escapes, 1);
    }

    #[test]
    fn test_in_frame_tracking() {
        let mut deframer = Deframer::new();
        assert!(!deframer.in_frame());

        assert_eq!(deframer.push(0x41), None); // opens a frame (implicit leading flag)
        assert!(deframer.in_frame());

        assert_eq!(deframer.push(HDLC_FLAG), Some(vec![0x41]));
        assert!(!deframer.in_frame());

        assert_eq!(deframer.push(HDLC_FLAG), None); // idle delimiter
        assert!(!deframer.in_frame());
    }

    #[test]
    fn test_unterminated_tail_dropped() {
        let (frames, stats) = deframe_all(&[0x7E, 0x41, 0x42, 0x7E, 0x43, 0x44]);
        assert_eq!(frames, vec![vec![0x41, 0x42]]);
        assert_eq!(stats.unterminated_frames, 1);
    }

    #[test]
    fn test_escape_round_trip() {
        let payloads: Vec<Vec<u8>> = vec![
            vec![],
            vec![0x00],
            vec![0x53, 0x7E, 0x7D, 0xFF, 0x5E, 0x5D],
            (0u8..=255).collect(),
        ];
        for payload in payloads {
            let wire = escape(&payload);
            let (frames, stats) = deframe_all(&wire);
            if payload.is_empty() {
                // An empty payload escapes to 7E 7E, which carries no frame
                assert!(frames.is_empty());
            } else {
                assert_eq!(frames, vec![payload]);
            }
            assert_eq!(stats.stray_escapes, 0);
        }
    }

    #[test]
    fn test_unescape_idempotent_on_clean_payload() {
        // A payload with no remaining escape pairs passes through unchanged
        let clean = vec![0x53, 0x01, 0x02, 0x00, 0x7E, 0x41];
        let mut strays = 0;
        let once = unescape(&clean, &mut strays);
        // 0x7E survives (it is data at this level), 0x7D pairs are gone
        assert_eq!(once, clean);
    }
}
