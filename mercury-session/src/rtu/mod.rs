//! RTU framing module

pub mod crc;
pub mod frame;

pub use crc::{checksum, Crc16};
pub use frame::{build_frame, parse_frame, RtuFrame, MAX_FRAME_LENGTH, MIN_FRAME_LENGTH};
