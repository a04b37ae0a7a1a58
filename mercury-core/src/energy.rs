//! Energy counters as exact fixed-point values

use crate::error::{MercuryError, MercuryResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Energy counter value in the meter's native resolution
///
/// The meter reports energy as an integer number of watt-hours (or
/// var-hours for reactive energy). The value is kept as that integer and
/// only turned into a kilo-unit decimal (`SCALE` fractional digits) when
/// displayed, so no rounding ever happens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Energy(u32);

impl Energy {
    /// Number of decimal digits between the raw unit and the kilo unit
    pub const SCALE: u32 = 3;
    const DIVISOR: u32 = 10u32.pow(Self::SCALE);

    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw counter value (Wh or varh)
    pub fn raw(&self) -> u32 {
        self.0
    }

    /// Whole kilo units (kWh or kvarh)
    pub fn whole(&self) -> u32 {
        self.0 / Self::DIVISOR
    }

    /// Fractional part in raw units (0..999)
    pub fn fraction(&self) -> u32 {
        self.0 % Self::DIVISOR
    }

    /// Decode one 4-byte counter in the meter's byte order
    ///
    /// The two 16-bit words are sent high word first, each word low byte
    /// first: `[b1, b0, b3, b2]` for a big-endian `b0..b3`.
    pub fn from_register(bytes: &[u8]) -> MercuryResult<Self> {
        match bytes {
            [w0, w1, w2, w3] => Ok(Self(u32::from_be_bytes([*w1, *w0, *w3, *w2]))),
            _ => Err(MercuryError::Decode(format!(
                "energy register must contain 4 bytes, got {}",
                bytes.len()
            ))),
        }
    }

    /// Encode into the meter's byte order, the inverse of [`Energy::from_register`]
    pub fn to_register(&self) -> [u8; 4] {
        let [b0, b1, b2, b3] = self.0.to_be_bytes();
        [b1, b0, b3, b2]
    }
}

impl fmt::Display for Energy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:03}", self.whole(), self.fraction())
    }
}

/// Active and reactive energy of one tariff bucket
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnergyPair {
    /// Active import (A+), Wh
    pub active: Energy,
    /// Reactive import (R+), varh
    pub reactive: Energy,
}

/// Length of a complete energy response (A+, A-, R+, R-)
pub const ENERGY_RESPONSE_LENGTH: usize = 16;

/// Minimum length carrying both A+ and R+
const ENERGY_RESPONSE_MIN_LENGTH: usize = 12;

impl EnergyPair {
    pub fn new(active: Energy, reactive: Energy) -> Self {
        Self { active, reactive }
    }

    /// Decode an energy read response body
    pub fn decode(body: &[u8]) -> MercuryResult<Self> {
        if body.len() < ENERGY_RESPONSE_MIN_LENGTH {
            return Err(MercuryError::Decode(format!(
                "energy response too short: expected at least {} bytes, got {}",
                ENERGY_RESPONSE_MIN_LENGTH,
                body.len()
            )));
        }
        Ok(Self {
            active: Energy::from_register(&body[0..4])?,
            reactive: Energy::from_register(&body[8..12])?,
        })
    }
}

/// Tariff bucket of an energy read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tariff {
    Sum,
    T1,
    T2,
    T3,
    T4,
    Loss,
}

impl Tariff {
    pub const ALL: [Tariff; 6] = [
        Tariff::Sum,
        Tariff::T1,
        Tariff::T2,
        Tariff::T3,
        Tariff::T4,
        Tariff::Loss,
    ];

    /// Tariff byte sent in the energy read request
    pub fn code(&self) -> u8 {
        match self {
            Tariff::Sum => 0,
            Tariff::T1 => 1,
            Tariff::T2 => 2,
            Tariff::T3 => 3,
            Tariff::T4 => 4,
            Tariff::Loss => 5,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tariff::Sum => "sum",
            Tariff::T1 => "t1",
            Tariff::T2 => "t2",
            Tariff::T3 => "t3",
            Tariff::T4 => "t4",
            Tariff::Loss => "loss",
        }
    }
}

impl fmt::Display for Tariff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Energy of all tariff buckets for one period
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnergyTariffSet {
    pub sum: EnergyPair,
    pub t1: EnergyPair,
    pub t2: EnergyPair,
    pub t3: EnergyPair,
    pub t4: EnergyPair,
    pub loss: EnergyPair,
}

impl EnergyTariffSet {
    pub fn get(&self, tariff: Tariff) -> &EnergyPair {
        match tariff {
            Tariff::Sum => &self.sum,
            Tariff::T1 => &self.t1,
            Tariff::T2 => &self.t2,
            Tariff::T3 => &self.t3,
            Tariff::T4 => &self.t4,
            Tariff::Loss => &self.loss,
        }
    }

    pub fn set(&mut self, tariff: Tariff, pair: EnergyPair) {
        match tariff {
            Tariff::Sum => self.sum = pair,
            Tariff::T1 => self.t1 = pair,
            Tariff::T2 => self.t2 = pair,
            Tariff::T3 => self.t3 = pair,
            Tariff::T4 => self.t4 = pair,
            Tariff::Loss => self.loss = pair,
        }
    }

    /// Buckets in request order
    pub fn iter(&self) -> impl Iterator<Item = (Tariff, &EnergyPair)> + '_ {
        Tariff::ALL.into_iter().map(move |tariff| (tariff, self.get(tariff)))
    }
}
