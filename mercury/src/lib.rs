//! Mercury-230 electricity meter client
//!
//! This library polls Mercury-230 meters over RS-485 serial lines or
//! transparent TCP gateways.
//!
//! # Architecture
//!
//! This library is organized as a workspace with multiple crates:
//!
//! - `mercury-core`: Error taxonomy, address validation, decoded records
//! - `mercury-transport`: Byte channels (Serial, transparent TCP)
//! - `mercury-session`: RTU framing and CRC-16/Modbus
//! - `mercury-client`: Command set, configuration and the meter client
//!
//! # Usage
//!
//! ```no_run
//! use mercury::client::MeterClientBuilder;
//!
//! let mut meter = MeterClientBuilder::new()
//!     .serial("/dev/ttyUSB0", 9600)
//!     .try_address(47)?
//!     .build()?;
//! let passport = meter.read_passport()?;
//! println!("{}", passport.serial_number);
//! # Ok::<(), mercury::MercuryError>(())
//! ```

// Re-export core types
pub use mercury_core::*;

// Re-export framing
pub mod session {
    pub use mercury_session::*;
}

// Re-export transports
pub mod transport {
    pub use mercury_transport::*;
}

// Re-export client API
pub mod client {
    pub use mercury_client::*;
}
