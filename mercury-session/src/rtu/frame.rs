//! RTU frame structure and encoding/decoding
//!
//! Wire format: `[address][command][data...][crc_lo][crc_hi]`, with the
//! CRC-16/Modbus computed over everything before it.

use crate::rtu::crc::{checksum, Crc16};
use mercury_core::FrameError;
use std::fmt;

/// Address and command byte plus two checksum bytes
pub const MIN_FRAME_LENGTH: usize = 4;

/// Upper bound for a frame assembled from the line
pub const MAX_FRAME_LENGTH: usize = 256;

/// Build a request frame
pub fn build_frame(address: u8, command: u8, payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(payload.len() + MIN_FRAME_LENGTH);
    frame.push(address);
    frame.push(command);
    frame.extend_from_slice(payload);

    let mut crc = Crc16::new();
    crc.update_bytes(&frame);
    frame.extend_from_slice(&crc.to_le_bytes());
    frame
}

/// Parse and validate a received frame
///
/// Checks are applied in order: length, checksum, address.
pub fn parse_frame(bytes: &[u8], expected_address: u8) -> Result<RtuFrame, FrameError> {
    if bytes.len() < MIN_FRAME_LENGTH {
        return Err(FrameError::TooShort { len: bytes.len() });
    }

    let (content, trailer) = bytes.split_at(bytes.len() - 2);
    let received = u16::from_le_bytes([trailer[0], trailer[1]]);
    let calculated = checksum(content);
    if received != calculated {
        return Err(FrameError::Checksum {
            received,
            calculated,
        });
    }

    let address = content[0];
    if address != expected_address {
        return Err(FrameError::AddressMismatch {
            expected: expected_address,
            actual: address,
        });
    }

    Ok(RtuFrame {
        address,
        body: content[1..].to_vec(),
    })
}

/// A validated RTU frame without its checksum
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtuFrame {
    address: u8,
    /// Command byte followed by the data bytes
    body: Vec<u8>,
}

impl RtuFrame {
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Byte in the command position
    pub fn command(&self) -> u8 {
        self.body[0]
    }

    /// Bytes between the command byte and the checksum
    pub fn data(&self) -> &[u8] {
        &self.body[1..]
    }

    /// Everything between address and checksum
    ///
    /// Meter replies do not echo the request code, so for responses this is
    /// the whole reply payload.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Re-encode the frame including a fresh checksum
    pub fn encode(&self) -> Vec<u8> {
        build_frame(self.address, self.body[0], &self.body[1..])
    }
}

impl fmt::Display for RtuFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RtuFrame(address={}, command=0x{:02X}, data_len={})",
            self.address,
            self.command(),
            self.data().len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_frame_layout() {
        let frame = build_frame(0x2F, 0x00, &[]);
        assert_eq!(frame, [0x2F, 0x00, 0x1D, 0x80]);

        let frame = build_frame(0x01, 0x03, &[0x00, 0x00, 0x00, 0x0A]);
        assert_eq!(frame, [0x01, 0x03, 0x00, 0x00, 0x00, 0x0A, 0xC5, 0xCD]);
    }

    #[test]
    fn test_round_trip() {
        let payloads: [&[u8]; 3] = [&[], &[0x42], &[0x30, 0x05, 0xFF, 0x00, 0x7E]];
        for address in 0..=255u8 {
            for command in [0x00u8, 0x01, 0x05, 0x08, 0x7F, 0xFF] {
                for payload in payloads {
                    let frame = parse_frame(&build_frame(address, command, payload), address).unwrap();
                    assert_eq!(frame.address(), address);
                    assert_eq!(frame.command(), command);
                    assert_eq!(frame.data(), payload);
                }
            }
        }
        for command in 0..=255u8 {
            let frame = parse_frame(&build_frame(0x2F, command, &[1, 2]), 0x2F).unwrap();
            assert_eq!(frame.command(), command);
            assert_eq!(frame.data(), &[1, 2]);
        }
    }

    #[test]
    fn test_short_frames_are_framing_errors() {
        for len in 0..MIN_FRAME_LENGTH {
            let bytes = vec![0u8; len];
            assert_eq!(
                parse_frame(&bytes, 0),
                Err(FrameError::TooShort { len })
            );
        }
    }

    #[test]
    fn test_any_single_bit_flip_is_detected() {
        let frame = build_frame(0x2F, 0x05, &[0x31, 0x00]);
        for byte in 0..frame.len() {
            for bit in 0..8 {
                let mut corrupted = frame.clone();
                corrupted[byte] ^= 1 << bit;
                match parse_frame(&corrupted, 0x2F) {
                    Err(FrameError::Checksum { .. }) => {}
                    other => panic!("byte {} bit {}: expected checksum error, got {:?}", byte, bit, other),
                }
            }
        }
    }

    #[test]
    fn test_address_mismatch_with_valid_checksum() {
        let frame = build_frame(0x2F, 0x00, &[]);
        assert_eq!(
            parse_frame(&frame, 0x30),
            Err(FrameError::AddressMismatch {
                expected: 0x30,
                actual: 0x2F
            })
        );
    }

    #[test]
    fn test_encode_matches_build() {
        let bytes = build_frame(0x10, 0x08, &[0x05]);
        let frame = parse_frame(&bytes, 0x10).unwrap();
        assert_eq!(frame.encode(), bytes);
        assert_eq!(frame.body(), &[0x08, 0x05]);
    }
}
