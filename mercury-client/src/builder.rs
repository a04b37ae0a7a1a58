//! Meter client builder
//!
//! # Usage Example
//!
//! ```rust,no_run
//! use mercury_client::MeterClientBuilder;
//! use std::time::Duration;
//!
//! // Meter behind a transparent TCP gateway
//! let mut meter = MeterClientBuilder::new()
//!     .tcp("10.0.31.202", 2222)
//!     .try_address("47")?
//!     .timeout(Duration::from_millis(800))
//!     .retries(2)
//!     .build()?;
//!
//! // Meter on a local RS-485 adapter
//! let mut meter = MeterClientBuilder::new()
//!     .serial("/dev/ttyUSB0", 9600)
//!     .try_address(47)?
//!     .build()?;
//! # Ok::<(), mercury_core::MercuryError>(())
//! ```

use crate::client::MeterClient;
use crate::config::{AccessLevel, MeterConfig, Password};
use mercury_core::{IntoMeterAddress, MercuryError, MercuryResult, MeterAddress};
use mercury_transport::{SerialChannel, SerialSettings, TcpChannel, TcpSettings};
use std::time::Duration;

/// Builder for [`MeterClient`]
///
/// Transport and meter address are required; timing and passwords default
/// to the values of [`MeterConfig::new`].
#[derive(Debug, Clone)]
pub struct MeterClientBuilder {
    transport_type: TransportType,
    address: Option<MeterAddress>,
    timeout: Option<Duration>,
    retries: Option<u32>,
    retry_delay: Option<Duration>,
    user_password: Option<Password>,
    admin_password: Option<Password>,
}

/// Transport type configuration
#[derive(Debug, Clone)]
enum TransportType {
    Tcp { host: String, port: u16 },
    Serial { port_name: String, baud_rate: u32 },
    /// Not configured
    None,
}

impl MeterClientBuilder {
    pub fn new() -> Self {
        Self {
            transport_type: TransportType::None,
            address: None,
            timeout: None,
            retries: None,
            retry_delay: None,
            user_password: None,
            admin_password: None,
        }
    }

    /// Use a transparent TCP gateway
    pub fn tcp(mut self, host: &str, port: u16) -> Self {
        self.transport_type = TransportType::Tcp {
            host: host.to_string(),
            port,
        };
        self
    }

    /// Use a local serial port (8N1, no flow control)
    ///
    /// # Arguments
    /// * `port_name` - Serial port name (e.g., "/dev/ttyUSB0" or "COM2")
    /// * `baud_rate` - Baud rate (Mercury meters ship with 9600)
    pub fn serial(mut self, port_name: &str, baud_rate: u32) -> Self {
        self.transport_type = TransportType::Serial {
            port_name: port_name.to_string(),
            baud_rate,
        };
        self
    }

    pub fn address(mut self, address: MeterAddress) -> Self {
        self.address = Some(address);
        self
    }

    /// Set the address from an integer or a decimal string
    pub fn try_address(mut self, address: impl IntoMeterAddress) -> MercuryResult<Self> {
        self.address = Some(address.into_meter_address()?);
        Ok(self)
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = Some(retries);
        self
    }

    pub fn retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = Some(retry_delay);
        self
    }

    /// Override the channel password of one access level
    pub fn password(mut self, level: AccessLevel, password: Password) -> Self {
        match level {
            AccessLevel::User => self.user_password = Some(password),
            AccessLevel::Admin => self.admin_password = Some(password),
        }
        self
    }

    /// Session configuration described by this builder
    ///
    /// # Errors
    /// Returns `InvalidArgument` if no address was set or the timeout is zero.
    pub fn config(&self) -> MercuryResult<MeterConfig> {
        let address = self.address.ok_or_else(|| {
            MercuryError::InvalidArgument("Meter address must be configured".to_string())
        })?;

        let mut config = MeterConfig::new(address);
        if let Some(timeout) = self.timeout {
            config = config.with_timeout(timeout);
        }
        if let Some(retries) = self.retries {
            config = config.with_retries(retries);
        }
        if let Some(retry_delay) = self.retry_delay {
            config = config.with_retry_delay(retry_delay);
        }
        if let Some(password) = self.user_password {
            config.user_password = password;
        }
        if let Some(password) = self.admin_password {
            config.admin_password = password;
        }
        config.validate()?;
        Ok(config)
    }

    /// Open the transport and create the client
    ///
    /// The configuration is validated before the transport is touched.
    pub fn build(self) -> MercuryResult<MeterClient> {
        let config = self.config()?;
        match self.transport_type {
            TransportType::Tcp { host, port } => {
                let channel =
                    TcpChannel::connect(TcpSettings::with_timeout(host, port, config.timeout))?;
                MeterClient::new(Box::new(channel), config)
            }
            TransportType::Serial {
                port_name,
                baud_rate,
            } => {
                let settings = SerialSettings::with_timeout(port_name, baud_rate, config.timeout);
                let channel = SerialChannel::open(settings)?;
                MeterClient::new(Box::new(channel), config)
            }
            TransportType::None => Err(MercuryError::InvalidArgument(
                "Transport type must be configured (TCP or Serial)".to_string(),
            )),
        }
    }
}

impl Default for MeterClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
