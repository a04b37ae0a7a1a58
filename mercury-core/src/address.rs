//! Meter network address and archive month

use crate::error::{MercuryError, MercuryResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Network address of a meter on a shared line (0-255)
///
/// Addresses are written in decimal on the meter's display and in
/// configuration files, so string input is parsed strictly as a decimal
/// numeral: `"47"` is accepted while `"0x2F"`, `"+47"` or `"4 7"` are not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MeterAddress(u8);

impl MeterAddress {
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    fn from_wide(value: i64) -> MercuryResult<Self> {
        u8::try_from(value).map(Self).map_err(|_| {
            MercuryError::InvalidArgument(format!("address must be in range 0..255, got {}", value))
        })
    }
}

impl From<u8> for MeterAddress {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

impl FromStr for MeterAddress {
    type Err = MercuryError;

    fn from_str(s: &str) -> MercuryResult<Self> {
        let text = s.trim();
        if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
            return Err(MercuryError::InvalidArgument(format!(
                "address must be a decimal number (for example: 47), got {:?}",
                s
            )));
        }
        // Long digit strings overflow i64 but are out of range either way
        let value = text.parse::<i64>().unwrap_or(i64::MAX);
        Self::from_wide(value)
    }
}

impl fmt::Display for MeterAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Conversion of caller input into a validated [`MeterAddress`]
pub trait IntoMeterAddress {
    fn into_meter_address(self) -> MercuryResult<MeterAddress>;
}

impl IntoMeterAddress for MeterAddress {
    fn into_meter_address(self) -> MercuryResult<MeterAddress> {
        Ok(self)
    }
}

impl IntoMeterAddress for &str {
    fn into_meter_address(self) -> MercuryResult<MeterAddress> {
        self.parse()
    }
}

impl IntoMeterAddress for String {
    fn into_meter_address(self) -> MercuryResult<MeterAddress> {
        self.parse()
    }
}

impl IntoMeterAddress for &String {
    fn into_meter_address(self) -> MercuryResult<MeterAddress> {
        self.parse()
    }
}

macro_rules! impl_into_meter_address {
    ($($t:ty),*) => {
        $(
            impl IntoMeterAddress for $t {
                fn into_meter_address(self) -> MercuryResult<MeterAddress> {
                    MeterAddress::from_wide(i64::from(self))
                }
            }
        )*
    };
}

impl_into_meter_address!(u8, u16, u32, i8, i16, i32, i64);

/// Month of the energy archive (1 = January .. 12 = December)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArchiveMonth(u8);

impl ArchiveMonth {
    pub fn new(month: u8) -> MercuryResult<Self> {
        if (1..=12).contains(&month) {
            Ok(Self(month))
        } else {
            Err(MercuryError::InvalidArgument(format!(
                "month must be in range 1..12, got {}",
                month
            )))
        }
    }

    /// All twelve months in calendar order
    pub fn all() -> impl Iterator<Item = ArchiveMonth> {
        (1..=12).map(ArchiveMonth)
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for ArchiveMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_address_from_integers() {
        assert_eq!(47u8.into_meter_address().unwrap().value(), 47);
        assert_eq!(255i32.into_meter_address().unwrap().value(), 255);
        assert_eq!(0u32.into_meter_address().unwrap().value(), 0);

        let err = 256u32.into_meter_address().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!((-1i64).into_meter_address().is_err());
    }

    #[test]
    fn test_address_from_decimal_strings() {
        assert_eq!("47".into_meter_address().unwrap(), MeterAddress::new(47));
        assert_eq!(" 47 ".into_meter_address().unwrap(), MeterAddress::new(47));
        assert_eq!("007".into_meter_address().unwrap(), MeterAddress::new(7));
        assert_eq!(String::from("255").into_meter_address().unwrap().value(), 255);
    }

    #[test]
    fn test_address_rejects_other_formats() {
        for input in ["", "  ", "0x2F", "2F", "+47", "-1", "4 7", "256", "99999999999999999999999"] {
            let err = input.into_meter_address().unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument, "input {:?}", input);
        }
    }

    #[test]
    fn test_archive_month_range() {
        assert!(ArchiveMonth::new(0).is_err());
        assert!(ArchiveMonth::new(13).is_err());
        assert_eq!(ArchiveMonth::new(3).unwrap().value(), 3);
        let months: Vec<u8> = ArchiveMonth::all().map(|m| m.value()).collect();
        assert_eq!(months, (1..=12).collect::<Vec<u8>>());
    }
}
