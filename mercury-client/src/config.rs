//! Session configuration for the meter client

use mercury_core::{MercuryError, MercuryResult, MeterAddress};
use std::fmt;
use std::time::Duration;

/// Default time to wait for a reply per attempt
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);
/// Default number of additional attempts after the first
pub const DEFAULT_RETRIES: u32 = 1;
/// Default pause between attempts
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(20);
/// Default RS-485 baud rate of Mercury meters
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Access level requested when opening the meter's communication channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessLevel {
    /// Read-only access (factory password 111111)
    User,
    /// Configuration access (factory password 222222)
    Admin,
}

impl AccessLevel {
    pub fn code(&self) -> u8 {
        match self {
            AccessLevel::User => 0x01,
            AccessLevel::Admin => 0x02,
        }
    }

    pub fn default_password(&self) -> Password {
        match self {
            AccessLevel::User => Password::new([0x01; Password::LENGTH]),
            AccessLevel::Admin => Password::new([0x02; Password::LENGTH]),
        }
    }
}

/// Six-digit channel password
///
/// The meter expects each digit as a raw byte value (`"111111"` is sent as
/// `01 01 01 01 01 01`), not as ASCII.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Password([u8; Password::LENGTH]);

impl Password {
    pub const LENGTH: usize = 6;

    pub const fn new(bytes: [u8; Password::LENGTH]) -> Self {
        Self(bytes)
    }

    /// Parse a password written as six decimal digits
    pub fn from_digits(digits: &str) -> MercuryResult<Self> {
        let invalid = || {
            MercuryError::InvalidArgument(format!(
                "password must contain exactly {} decimal digits",
                Password::LENGTH
            ))
        };
        let values: Vec<u8> = digits
            .chars()
            .map(|c| c.to_digit(10).map(|d| d as u8).ok_or_else(invalid))
            .collect::<MercuryResult<_>>()?;
        let bytes: [u8; Password::LENGTH] = values.try_into().map_err(|_| invalid())?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(******)")
    }
}

/// Meter session configuration
#[derive(Debug, Clone)]
pub struct MeterConfig {
    /// Network address of the meter
    pub address: MeterAddress,
    /// Time to wait for a complete reply, per attempt
    pub timeout: Duration,
    /// Additional attempts after the first one
    pub retries: u32,
    /// Constant pause before each repeated attempt
    pub retry_delay: Duration,
    pub user_password: Password,
    pub admin_password: Password,
}

impl MeterConfig {
    /// Configuration with default timing and factory passwords
    pub fn new(address: MeterAddress) -> Self {
        Self {
            address,
            timeout: DEFAULT_TIMEOUT,
            retries: DEFAULT_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
            user_password: AccessLevel::User.default_password(),
            admin_password: AccessLevel::Admin.default_password(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn password(&self, level: AccessLevel) -> Password {
        match level {
            AccessLevel::User => self.user_password,
            AccessLevel::Admin => self.admin_password,
        }
    }

    /// Total number of attempts per request
    pub fn attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }

    pub fn validate(&self) -> MercuryResult<()> {
        if self.timeout.is_zero() {
            return Err(MercuryError::InvalidArgument(
                "timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
