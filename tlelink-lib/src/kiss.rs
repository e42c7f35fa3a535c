//! Recover a [Payload] from a frame captured off the KISS link.
//!
//! A captured frame is a fixed-length header, the escaped payload and a trailer. The
//! link escapes `DB` as `DB DD` and `C0` as `C0 00`, so every escape lengthens the
//! frame by one byte; the number of such appended bytes is the difference between the
//! captured length and the nominal frame length. Only those two escapes are undone.
use tracing::{debug, trace};

use crate::error::FrameError;
use crate::Payload;

/// Escaped frame-escape sequence and its replacement, as hex text.
const ESCAPED_FESC: (&str, &str) = ("DBDD", "DB");
/// Escaped frame-end sequence and its replacement, as hex text.
const ESCAPED_FEND: (&str, &str) = ("C000", "C0");

/// Framing of link frames. Lengths are in bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkOpts {
    /// Bytes preceding the payload
    pub header_len: usize,
    /// Length of a frame containing no escapes
    pub frame_len: usize,
    /// Length of the payload once unescaped
    pub payload_len: usize,
}

impl Default for LinkOpts {
    fn default() -> Self {
        LinkOpts {
            header_len: 24,
            frame_len: 106,
            payload_len: Payload::LEN,
        }
    }
}

impl LinkOpts {
    /// Create options for frames of `frame_len` bytes with the default header and
    /// payload lengths.
    #[must_use]
    pub fn new(frame_len: usize) -> Self {
        LinkOpts {
            frame_len,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_header_len(&self, header_len: usize) -> Self {
        let mut slf = self.clone();
        slf.header_len = header_len;
        slf
    }

    #[must_use]
    pub fn with_payload_len(&self, payload_len: usize) -> Self {
        let mut slf = self.clone();
        slf.payload_len = payload_len;
        slf
    }

    /// Bytes following the payload in a frame containing no escapes.
    #[must_use]
    pub fn trailer_len(&self) -> usize {
        self.frame_len
            .saturating_sub(self.header_len + self.payload_len)
    }
}

/// Undo the two link escapes in hex `text`.
///
/// Replacement works on the text, not on byte boundaries, and is applied left to right
/// without overlap: first `DBDD` becomes `DB`, then `C000` becomes `C0`. `text` should
/// already be upper-case.
#[must_use]
pub fn unescape(text: &str) -> String {
    let fesc = text.matches(ESCAPED_FESC.0).count();
    let text = text.replace(ESCAPED_FESC.0, ESCAPED_FESC.1);
    let fend = text.matches(ESCAPED_FEND.0).count();
    if fesc + fend > 0 {
        debug!(fesc, fend, "unescaped");
    }
    text.replace(ESCAPED_FEND.0, ESCAPED_FEND.1)
}

/// De-escape a hex encoded capture using the default [LinkOpts].
///
/// # Errors
/// See [deescape_with].
pub fn deescape(text: &str) -> Result<Payload, FrameError> {
    deescape_with(text, &LinkOpts::default())
}

/// De-escape a hex encoded capture of a single link frame.
///
/// The payload window starts after the header and is extended by one byte for every
/// byte the capture is longer than [LinkOpts::frame_len]. Text is case-insensitive and
/// surrounding whitespace is ignored.
///
/// # Errors
/// [FrameError::InvalidHex] if `text` is not an even number of hex digits,
/// [FrameError::ShortFrame] if the capture is shorter than a nominal frame, and
/// [FrameError::BadWidth] if the unescaped window is not exactly one payload.
pub fn deescape_with(text: &str, opts: &LinkOpts) -> Result<Payload, FrameError> {
    let text = text.trim();
    if let Some(c) = text.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(FrameError::InvalidHex(format!("invalid character {c:?}")));
    }
    if text.len() % 2 != 0 {
        return Err(FrameError::InvalidHex(format!(
            "odd number of digits: {}",
            text.len()
        )));
    }
    let captured = text.len() / 2;
    if captured < opts.frame_len {
        return Err(FrameError::ShortFrame {
            actual: captured,
            minimum: opts.frame_len,
        });
    }

    let appended = captured - opts.frame_len;
    if appended > 0 {
        debug!(appended, "frame contains escapes");
    }
    let start = opts.header_len * 2;
    let end = ((opts.header_len + opts.payload_len + appended) * 2).min(text.len());
    let window = text[start.min(end)..end].to_ascii_uppercase();
    trace!(window = %window, "payload window");

    let unescaped = unescape(&window);
    if unescaped.len() != Payload::LEN * 2 {
        return Err(FrameError::BadWidth {
            digits: unescaped.len(),
        });
    }
    Payload::from_hex(&unescaped)
}

/// De-escape raw captured frame bytes, e.g., as read from the soundmodem KISS port.
///
/// # Errors
/// See [deescape_with].
pub fn deescape_capture(bytes: &[u8], opts: &LinkOpts) -> Result<Payload, FrameError> {
    deescape_with(&hex::encode_upper(bytes), opts)
}
