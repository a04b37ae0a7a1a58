//! Core types and utilities for the Mercury-230 meter protocol
//!
//! This crate provides the error taxonomy, address and month validation and
//! the typed records decoded from meter responses.

pub mod address;
pub mod energy;
pub mod error;
pub mod passport;

pub use address::{ArchiveMonth, IntoMeterAddress, MeterAddress};
pub use energy::{Energy, EnergyPair, EnergyTariffSet, Tariff, ENERGY_RESPONSE_LENGTH};
pub use error::{status_description, ErrorKind, FrameError, MercuryError, MercuryResult};
pub use passport::{
    decode_network_address, BuildDate, FirmwareVersion, PassportRecord, SerialBlock,
    TransformRatios,
};
