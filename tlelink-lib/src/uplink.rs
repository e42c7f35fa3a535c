//! Framing of a [Payload] into telecommand words for upload to the spacecraft.
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::Payload;

/// Command group shared by all element set commands.
pub const COMMAND_GROUP: [u8; 2] = [0x51, 0x00];
/// Command id of the first payload word; the remaining words follow consecutively.
pub const FIRST_WORD_ID: u8 = 0x31;
/// Command id requesting the stored element set be transmitted.
pub const DOWNLINK_REQUEST_ID: u8 = 0x35;

const DOWNLINK_REQUEST_DATA: [u8; 8] = [0x04, 0xb0, 0x00, 0x00, 0x01, 0x00, 0x00, 0x01];

/// A single 11-byte command: 2-byte group, 1-byte id and 8 data bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CommandWord {
    pub id: u8,
    pub data: [u8; Payload::WORD_LEN],
}

impl CommandWord {
    pub const LEN: usize = 11;

    #[must_use]
    pub fn new(id: u8, data: [u8; Payload::WORD_LEN]) -> Self {
        CommandWord { id, data }
    }

    /// Request to read back the element set stored at address `04 B0 00 00`.
    #[must_use]
    pub fn downlink_request() -> Self {
        CommandWord::new(DOWNLINK_REQUEST_ID, DOWNLINK_REQUEST_DATA)
    }

    #[must_use]
    pub fn to_bytes(&self) -> [u8; Self::LEN] {
        let mut buf = [0u8; Self::LEN];
        buf[..2].copy_from_slice(&COMMAND_GROUP);
        buf[2] = self.id;
        buf[3..].copy_from_slice(&self.data);
        buf
    }
}

impl fmt::Display for CommandWord {
    /// Space separated upper-case hex bytes, e.g., `51 00 35 04 B0 00 00 01 00 00 01`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, b) in self.to_bytes().iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{b:02X}")?;
        }
        Ok(())
    }
}

/// Split `payload` into the four commands that upload it, most significant word first.
#[must_use]
pub fn uplink_commands(payload: &Payload) -> [CommandWord; 4] {
    let words = payload.words();
    std::array::from_fn(|i| CommandWord::new(FIRST_WORD_ID + i as u8, words[i]))
}
