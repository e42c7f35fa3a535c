#![doc = include_str!("../README.md")]

mod codec;
mod elements;
mod error;
mod payload;

pub mod kiss;
pub mod layout;
pub mod tle;
pub mod uplink;

mod prelude {
    pub(crate) use crate::error::{Error, Result};
}

pub use codec::{decode, encode};
pub use elements::{
    Angle, DragTerm, Eccentricity, ElementSet, EpochDay, MeanMotion, MeanMotionDerivative,
};
pub use error::{Error, FieldError, FormatError, FrameError, Result};
pub use kiss::{deescape, deescape_capture, deescape_with, LinkOpts};
pub use payload::Payload;
pub use tle::{checksum, Identity, TleRecord};
pub use uplink::{uplink_commands, CommandWord};
