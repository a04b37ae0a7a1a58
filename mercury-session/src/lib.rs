//! Session layer module for the Mercury-230 meter protocol
//!
//! This crate provides RTU frame construction and validation with the
//! CRC-16/Modbus checksum. It knows nothing about what a payload means.

pub mod rtu;

pub use mercury_core::{FrameError, MercuryError, MercuryResult};
pub use rtu::*;
