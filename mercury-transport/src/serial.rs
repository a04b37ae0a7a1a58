//! Serial port (RS-485) byte channel

use crate::stream::{not_connected, ByteChannel, READ_CHUNK_SIZE};
use mercury_core::{MercuryError, MercuryResult};
use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::fmt;
use std::io::{self, Read, Write};
use std::ops::{Deref, DerefMut};
use std::time::Duration;

/// Wrapper for a boxed SerialPort that implements Debug
struct DebugSerialPort(Box<dyn SerialPort>);

impl fmt::Debug for DebugSerialPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerialPort")
            .field("name", &self.0.name())
            .finish()
    }
}

impl Deref for DebugSerialPort {
    type Target = Box<dyn SerialPort>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for DebugSerialPort {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

/// Serial port settings
///
/// Mercury meters talk 8N1 without flow control; only the port name and
/// the baud rate usually need changing.
#[derive(Debug, Clone)]
pub struct SerialSettings {
    pub port_name: String,
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub stop_bits: StopBits,
    pub parity: Parity,
    pub flow_control: FlowControl,
    pub timeout: Duration,
}

impl SerialSettings {
    /// Create new serial settings with default parameters
    pub fn new(port_name: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            port_name: port_name.into(),
            baud_rate,
            data_bits: DataBits::Eight,
            stop_bits: StopBits::One,
            parity: Parity::None,
            flow_control: FlowControl::None,
            timeout: Duration::from_secs(1),
        }
    }

    /// Create serial settings with timeout
    pub fn with_timeout(port_name: impl Into<String>, baud_rate: u32, timeout: Duration) -> Self {
        Self {
            timeout,
            ..Self::new(port_name, baud_rate)
        }
    }
}

/// Serial port byte channel
#[derive(Debug)]
pub struct SerialChannel {
    port: Option<DebugSerialPort>,
    settings: SerialSettings,
}

impl SerialChannel {
    /// Open the serial port described by `settings`
    pub fn open(settings: SerialSettings) -> MercuryResult<Self> {
        let port = serialport::new(settings.port_name.as_str(), settings.baud_rate)
            .data_bits(settings.data_bits)
            .stop_bits(settings.stop_bits)
            .parity(settings.parity)
            .flow_control(settings.flow_control)
            .timeout(settings.timeout)
            .open()
            .map_err(|e| {
                MercuryError::Connection(io::Error::new(
                    io::ErrorKind::Other,
                    format!("Failed to open serial port {}: {}", settings.port_name, e),
                ))
            })?;

        log::info!(
            "Opened serial port {} at {} baud",
            settings.port_name,
            settings.baud_rate
        );
        Ok(Self {
            port: Some(DebugSerialPort(port)),
            settings,
        })
    }

    pub fn settings(&self) -> &SerialSettings {
        &self.settings
    }

    fn port(&mut self) -> MercuryResult<&mut DebugSerialPort> {
        self.port.as_mut().ok_or_else(|| not_connected("Serial port"))
    }
}

impl ByteChannel for SerialChannel {
    fn write(&mut self, data: &[u8]) -> MercuryResult<()> {
        let port = self.port()?;
        port.write_all(data)?;
        port.flush()?;
        Ok(())
    }

    fn read_available(&mut self, max_wait: Duration) -> MercuryResult<Vec<u8>> {
        let port = self.port()?;
        if max_wait.is_zero() {
            return Ok(Vec::new());
        }
        port.set_timeout(max_wait).map_err(io::Error::from)?;

        let mut buf = [0u8; READ_CHUNK_SIZE];
        match port.read(&mut buf) {
            Ok(n) => Ok(buf[..n].to_vec()),
            Err(e) if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) => {
                Ok(Vec::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn discard_input(&mut self) -> MercuryResult<()> {
        let port = self.port()?;
        port.clear(ClearBuffer::Input).map_err(io::Error::from)?;
        Ok(())
    }

    fn close(&mut self) -> MercuryResult<()> {
        if let Some(mut port) = self.port.take() {
            let _ = port.flush();
            log::info!("Closed serial port {}", self.settings.port_name);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serial_settings() {
        let settings = SerialSettings::new("/dev/ttyUSB0", 9600);
        assert_eq!(settings.port_name, "/dev/ttyUSB0");
        assert_eq!(settings.baud_rate, 9600);
        assert_eq!(settings.data_bits, DataBits::Eight);
        assert_eq!(settings.parity, Parity::None);
        assert_eq!(settings.stop_bits, StopBits::One);
    }

    #[test]
    fn test_serial_settings_with_timeout() {
        let settings = SerialSettings::with_timeout("COM2", 19200, Duration::from_millis(300));
        assert_eq!(settings.timeout, Duration::from_millis(300));
        assert_eq!(settings.flow_control, FlowControl::None);
    }

    #[test]
    fn test_open_missing_port_fails() {
        let settings = SerialSettings::new("/dev/this-port-does-not-exist", 9600);
        let err = SerialChannel::open(settings).unwrap_err();
        assert_eq!(err.kind(), mercury_core::ErrorKind::Transport);
    }
}
