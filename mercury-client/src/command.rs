//! Mercury-230 command set
//!
//! Every supported request is a variant of [`Command`], which knows its
//! command code, how to encode its request data and how to decode the
//! reply body into a [`Response`].

use crate::config::{AccessLevel, Password};
use mercury_core::{
    decode_network_address, ArchiveMonth, EnergyPair, FirmwareVersion, MercuryError,
    MercuryResult, SerialBlock, Tariff, TransformRatios,
};
use std::fmt;

/// Command codes
pub mod code {
    pub const TEST_LINK: u8 = 0x00;
    pub const OPEN_CHANNEL: u8 = 0x01;
    pub const READ_ENERGY: u8 = 0x05;
    pub const READ_PARAMETER: u8 = 0x08;
}

/// Sub-codes of the parameter read command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parameter {
    /// Serial number and manufacture date
    SerialBlock,
    TransformRatios,
    FirmwareVersion,
    NetworkAddress,
    /// Meter variant (hardware options) word
    Variant,
}

impl Parameter {
    pub fn code(&self) -> u8 {
        match self {
            Parameter::SerialBlock => 0x00,
            Parameter::TransformRatios => 0x02,
            Parameter::FirmwareVersion => 0x03,
            Parameter::NetworkAddress => 0x05,
            Parameter::Variant => 0x12,
        }
    }
}

/// Accumulation period of an energy read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnergyPeriod {
    /// Cumulative since the last counter reset
    FromReset,
    /// Month archive
    Month(ArchiveMonth),
}

impl EnergyPeriod {
    /// Period byte: array number in the high nibble, month in the low nibble
    pub fn code(&self) -> u8 {
        match self {
            EnergyPeriod::FromReset => 0x00,
            EnergyPeriod::Month(month) => 0x30 | month.value(),
        }
    }
}

impl fmt::Display for EnergyPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnergyPeriod::FromReset => f.write_str("from reset"),
            EnergyPeriod::Month(month) => write!(f, "month {}", month),
        }
    }
}

/// Supported meter requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    TestLink,
    OpenChannel {
        level: AccessLevel,
        password: Password,
    },
    ReadParameter(Parameter),
    ReadEnergy {
        period: EnergyPeriod,
        tariff: Tariff,
    },
}

/// Decoded reply to a [`Command`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Status-only reply with status 0
    Ack,
    SerialBlock(SerialBlock),
    TransformRatios(TransformRatios),
    FirmwareVersion(FirmwareVersion),
    NetworkAddress(u8),
    Variant(Vec<u8>),
    Energy(EnergyPair),
}

impl Command {
    pub fn code(&self) -> u8 {
        match self {
            Command::TestLink => code::TEST_LINK,
            Command::OpenChannel { .. } => code::OPEN_CHANNEL,
            Command::ReadParameter(_) => code::READ_PARAMETER,
            Command::ReadEnergy { .. } => code::READ_ENERGY,
        }
    }

    /// Request data following the command byte
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Command::TestLink => Vec::new(),
            Command::OpenChannel { level, password } => {
                let mut data = Vec::with_capacity(1 + Password::LENGTH);
                data.push(level.code());
                data.extend_from_slice(password.as_bytes());
                data
            }
            Command::ReadParameter(parameter) => vec![parameter.code()],
            Command::ReadEnergy { period, tariff } => vec![period.code(), tariff.code()],
        }
    }

    /// Decode the reply body (everything between address and checksum)
    pub fn decode(&self, body: &[u8]) -> MercuryResult<Response> {
        match self {
            Command::TestLink | Command::OpenChannel { .. } => match body {
                [0x00] => Ok(Response::Ack),
                _ => Err(MercuryError::Decode(format!(
                    "expected a one-byte status reply to command 0x{:02X}, got {} byte(s)",
                    self.code(),
                    body.len()
                ))),
            },
            Command::ReadParameter(parameter) => match parameter {
                Parameter::SerialBlock => SerialBlock::decode(body).map(Response::SerialBlock),
                Parameter::TransformRatios => {
                    TransformRatios::decode(body).map(Response::TransformRatios)
                }
                Parameter::FirmwareVersion => {
                    FirmwareVersion::decode(body).map(Response::FirmwareVersion)
                }
                Parameter::NetworkAddress => {
                    decode_network_address(body).map(Response::NetworkAddress)
                }
                Parameter::Variant => Ok(Response::Variant(body.to_vec())),
            },
            Command::ReadEnergy { .. } => EnergyPair::decode(body).map(Response::Energy),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::TestLink => f.write_str("test link"),
            Command::OpenChannel { level, .. } => write!(f, "open channel ({:?})", level),
            Command::ReadParameter(parameter) => write!(f, "read parameter {:?}", parameter),
            Command::ReadEnergy { period, tariff } => {
                write!(f, "read energy {} tariff {}", period, tariff)
            }
        }
    }
}
