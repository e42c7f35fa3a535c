use std::fmt;
use std::str::FromStr;

use derive_more::From;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::FrameError;

/// The 256-bit packed form of an [ElementSet](crate::ElementSet) as exchanged over the
/// radio link.
///
/// Bytes are stored big-endian, so bit 255 is the most significant bit of byte 0 and
/// bit 0 is the least significant bit of byte 31.
///
/// # Example
/// ```
/// use tlelink::Payload;
///
/// let payload: Payload = "0x2d225b1d5d2800124e3087f4b3318f78302c90017d3680c190ea10db4177feab"
///     .parse()
///     .unwrap();
/// assert_eq!(payload.bits(212, 44), 0x2d225b1d5d2);
/// assert_eq!(payload.words()[3], [0x90, 0xea, 0x10, 0xdb, 0x41, 0x77, 0xfe, 0xab]);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, From)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Payload([u8; 32]);

impl Payload {
    /// Length in bytes
    pub const LEN: usize = 32;
    /// Length in bits
    pub const BITS: u32 = 256;
    /// Length of a single uplink data word in bytes
    pub const WORD_LEN: usize = 8;

    #[must_use]
    pub fn from_be_bytes(bytes: [u8; Self::LEN]) -> Self {
        Payload(bytes)
    }

    #[must_use]
    pub fn to_be_bytes(&self) -> [u8; Self::LEN] {
        self.0
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Parse exactly 64 hex digits, optionally prefixed with `0x`. Case-insensitive.
    ///
    /// # Errors
    /// [FrameError::BadWidth] if there are not exactly 64 digits, [FrameError::InvalidHex]
    /// if any character is not a hex digit.
    pub fn from_hex(text: &str) -> Result<Self, FrameError> {
        let text = text.trim();
        let digits = text
            .strip_prefix("0x")
            .or_else(|| text.strip_prefix("0X"))
            .unwrap_or(text);
        if digits.len() != Self::LEN * 2 {
            return Err(FrameError::BadWidth {
                digits: digits.len(),
            });
        }
        let mut buf = [0u8; Self::LEN];
        hex::decode_to_slice(digits, &mut buf)
            .map_err(|err| FrameError::InvalidHex(err.to_string()))?;
        Ok(Payload(buf))
    }

    /// Read `width` bits whose least significant bit is at bit `offset`.
    ///
    /// # Panics
    /// If `width` is greater than 64 or the range extends beyond bit 255.
    #[must_use]
    pub fn bits(&self, offset: u32, width: u32) -> u64 {
        assert!(
            width <= 64 && offset + width <= Self::BITS,
            "bit range {offset}+{width} out of bounds"
        );
        (offset..offset + width)
            .rev()
            .fold(0u64, |acc, bit| (acc << 1) | u64::from(self.bit(bit)))
    }

    /// Write the low `width` bits of `value` starting at bit `offset`. Bits of `value`
    /// above `width` are ignored.
    ///
    /// # Panics
    /// If `width` is greater than 64 or the range extends beyond bit 255.
    pub fn set_bits(&mut self, offset: u32, width: u32, value: u64) {
        assert!(
            width <= 64 && offset + width <= Self::BITS,
            "bit range {offset}+{width} out of bounds"
        );
        for i in 0..width {
            let (idx, mask) = Self::locate(offset + i);
            if (value >> i) & 0x1 == 1 {
                self.0[idx] |= mask;
            } else {
                self.0[idx] &= !mask;
            }
        }
    }

    /// The payload split into four 8-byte words, most significant first.
    #[must_use]
    pub fn words(&self) -> [[u8; Self::WORD_LEN]; 4] {
        let mut words = [[0u8; Self::WORD_LEN]; 4];
        for (word, chunk) in words.iter_mut().zip(self.0.chunks_exact(Self::WORD_LEN)) {
            word.copy_from_slice(chunk);
        }
        words
    }

    fn bit(&self, bit: u32) -> bool {
        let (idx, mask) = Self::locate(bit);
        self.0[idx] & mask != 0
    }

    fn locate(bit: u32) -> (usize, u8) {
        (Self::LEN - 1 - (bit / 8) as usize, 1 << (bit % 8))
    }
}

impl FromStr for Payload {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::LowerHex for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            f.write_str("0x")?;
        }
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::UpperHex for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            f.write_str("0x")?;
        }
        f.write_str(&hex::encode_upper(self.0))
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:#x}")
    }
}
