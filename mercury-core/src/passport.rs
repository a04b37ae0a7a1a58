//! Meter passport (identification) data

use crate::error::{MercuryError, MercuryResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Manufacture date as stored by the meter (day, month, two-digit year)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BuildDate {
    year: u16,
    month: u8,
    day: u8,
}

impl BuildDate {
    /// Create a date, `None` if it is not a valid calendar date
    pub fn new(year: u16, month: u8, day: u8) -> Option<Self> {
        if !(1..=12).contains(&month) || day == 0 || day > days_in_month(year, month) {
            return None;
        }
        Some(Self { year, month, day })
    }

    /// Decode `[day, month, year - 2000]`
    pub fn from_bytes(day: u8, month: u8, year: u8) -> Option<Self> {
        Self::new(2000 + u16::from(year), month, day)
    }

    pub fn year(&self) -> u16 {
        self.year
    }

    pub fn month(&self) -> u8 {
        self.month
    }

    pub fn day(&self) -> u8 {
        self.day
    }
}

fn days_in_month(year: u16, month: u8) -> u8 {
    match month {
        4 | 6 | 9 | 11 => 30,
        2 if (year % 4 == 0 && year % 100 != 0) || year % 400 == 0 => 29,
        2 => 28,
        _ => 31,
    }
}

/// ISO 8601 (`YYYY-MM-DD`)
impl fmt::Display for BuildDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// Meter firmware version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirmwareVersion {
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
}

impl FirmwareVersion {
    pub fn decode(body: &[u8]) -> MercuryResult<Self> {
        match body {
            [major, minor, patch, ..] => Ok(Self {
                major: *major,
                minor: *minor,
                patch: *patch,
            }),
            _ => Err(MercuryError::Decode(format!(
                "firmware version requires 3 bytes, got {}",
                body.len()
            ))),
        }
    }
}

impl fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Voltage and current transformer ratios configured in the meter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformRatios {
    pub voltage: u16,
    pub current: u16,
}

impl TransformRatios {
    /// Decode `[ku_hi, ku_lo, ki_hi, ki_lo]`
    pub fn decode(body: &[u8]) -> MercuryResult<Self> {
        match body {
            [u_hi, u_lo, i_hi, i_lo, ..] => Ok(Self {
                voltage: u16::from_be_bytes([*u_hi, *u_lo]),
                current: u16::from_be_bytes([*i_hi, *i_lo]),
            }),
            _ => Err(MercuryError::Decode(format!(
                "transformation ratios require 4 bytes, got {}",
                body.len()
            ))),
        }
    }
}

/// Serial number and manufacture date block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialBlock {
    /// Four raw serial number bytes
    pub raw: [u8; 4],
    /// Each raw byte rendered as two decimal digits
    pub serial_number: String,
    pub build_date: Option<BuildDate>,
}

impl SerialBlock {
    /// Decode `[s0, s1, s2, s3, day, month, year]`
    ///
    /// Some firmware revisions omit the date; a missing or impossible date
    /// yields `build_date: None` rather than an error.
    pub fn decode(body: &[u8]) -> MercuryResult<Self> {
        let raw: [u8; 4] = match body.get(0..4) {
            Some(bytes) => [bytes[0], bytes[1], bytes[2], bytes[3]],
            None => {
                return Err(MercuryError::Decode(format!(
                    "serial number block requires at least 4 bytes, got {}",
                    body.len()
                )));
            }
        };
        let serial_number = raw.iter().map(|b| format!("{:02}", b)).collect();
        let build_date = match body.get(4..7) {
            Some([day, month, year]) => BuildDate::from_bytes(*day, *month, *year),
            _ => None,
        };
        Ok(Self {
            raw,
            serial_number,
            build_date,
        })
    }
}

/// Decode the network address reply `[status, address]`
pub fn decode_network_address(body: &[u8]) -> MercuryResult<u8> {
    match body {
        [_, address, ..] => Ok(*address),
        _ => Err(MercuryError::Decode(format!(
            "network address reply requires 2 bytes, got {}",
            body.len()
        ))),
    }
}

/// Passport of a meter collected from several parameter reads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassportRecord {
    pub network_address: u8,
    pub serial_number: String,
    pub serial_raw: [u8; 4],
    pub build_date: Option<BuildDate>,
    pub firmware_version: FirmwareVersion,
    pub transform_ratios: TransformRatios,
}
