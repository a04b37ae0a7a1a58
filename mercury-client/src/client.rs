//! Mercury-230 meter client
//!
//! A [`MeterClient`] owns one byte channel for its whole lifetime. Every
//! operation is a blocking call made of one or more request/response
//! exchanges; each exchange is retried on silence or on a corrupted reply.
//!
//! # Usage Example
//!
//! ```rust,no_run
//! use mercury_client::MeterClient;
//! use std::time::Duration;
//!
//! let mut meter = MeterClient::from_tcp("10.0.31.202", 2222, 47, Duration::from_secs(1), 1)?;
//! let passport = meter.read_passport()?;
//! let energy = meter.read_energy_from_reset()?;
//! println!("{}: {} kWh", passport.serial_number, energy.sum.active);
//! # Ok::<(), mercury_core::MercuryError>(())
//! ```

use crate::command::{Command, EnergyPeriod, Parameter, Response};
use crate::config::{AccessLevel, MeterConfig, DEFAULT_BAUD_RATE};
use bytes::BytesMut;
use mercury_core::{
    ArchiveMonth, EnergyPair, EnergyTariffSet, FirmwareVersion, IntoMeterAddress, MercuryError,
    MercuryResult, MeterAddress, PassportRecord, SerialBlock, Tariff, TransformRatios,
};
use mercury_session::{build_frame, parse_frame, RtuFrame, MAX_FRAME_LENGTH};
use mercury_transport::{ByteChannel, SerialChannel, SerialSettings, TcpChannel, TcpSettings};
use std::collections::BTreeMap;
use std::thread;
use std::time::{Duration, Instant};

/// Polling session bound to one meter and one byte channel
///
/// The channel is closed exactly once: by [`MeterClient::close`] or, if that
/// was never called, when the client is dropped.
pub struct MeterClient {
    channel: Box<dyn ByteChannel>,
    config: MeterConfig,
    closed: bool,
}

impl MeterClient {
    /// Create a session over an already opened channel
    pub fn new(channel: Box<dyn ByteChannel>, config: MeterConfig) -> MercuryResult<Self> {
        config.validate()?;
        Ok(Self {
            channel,
            config,
            closed: false,
        })
    }

    /// Open a serial port and create a session on it
    ///
    /// # Arguments
    /// * `port` - Serial port name (e.g., "/dev/ttyUSB0" or "COM2")
    /// * `address` - Meter address, decimal integer or decimal string
    /// * `baud_rate` - Baud rate, usually [`DEFAULT_BAUD_RATE`]
    /// * `timeout` - Reply timeout per attempt
    /// * `retries` - Additional attempts after the first
    pub fn from_serial(
        port: &str,
        address: impl IntoMeterAddress,
        baud_rate: u32,
        timeout: Duration,
        retries: u32,
    ) -> MercuryResult<Self> {
        let config = MeterConfig::new(address.into_meter_address()?)
            .with_timeout(timeout)
            .with_retries(retries);
        config.validate()?;
        let channel = SerialChannel::open(SerialSettings::with_timeout(port, baud_rate, timeout))?;
        log::info!("Meter {} on serial port {} at {} baud", config.address, port, baud_rate);
        Self::new(Box::new(channel), config)
    }

    /// Serial session at [`DEFAULT_BAUD_RATE`]
    pub fn from_serial_default(
        port: &str,
        address: impl IntoMeterAddress,
        timeout: Duration,
        retries: u32,
    ) -> MercuryResult<Self> {
        Self::from_serial(port, address, DEFAULT_BAUD_RATE, timeout, retries)
    }

    /// Connect to a transparent TCP gateway and create a session on it
    pub fn from_tcp(
        host: &str,
        port: u16,
        address: impl IntoMeterAddress,
        timeout: Duration,
        retries: u32,
    ) -> MercuryResult<Self> {
        let config = MeterConfig::new(address.into_meter_address()?)
            .with_timeout(timeout)
            .with_retries(retries);
        config.validate()?;
        let channel = TcpChannel::connect(TcpSettings::with_timeout(host, port, timeout))?;
        log::info!("Meter {} via TCP gateway {}:{}", config.address, host, port);
        Self::new(Box::new(channel), config)
    }

    pub fn config(&self) -> &MeterConfig {
        &self.config
    }

    pub fn address(&self) -> MeterAddress {
        self.config.address
    }

    /// Close the channel and end the session
    pub fn close(mut self) -> MercuryResult<()> {
        self.release()
    }

    fn release(&mut self) -> MercuryResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        log::info!("Closing channel of meter {}", self.config.address);
        self.channel.close()
    }

    /// Link check (command 0x00)
    pub fn test_link(&mut self) -> MercuryResult<()> {
        self.expect_ack(Command::TestLink)
    }

    /// Open the meter's communication channel at `level`
    pub fn open_channel(&mut self, level: AccessLevel) -> MercuryResult<()> {
        let password = self.config.password(level);
        self.expect_ack(Command::OpenChannel { level, password })
    }

    pub fn read_network_address(&mut self) -> MercuryResult<u8> {
        match self.transact(&Command::ReadParameter(Parameter::NetworkAddress))? {
            Response::NetworkAddress(address) => Ok(address),
            other => Err(unexpected(other)),
        }
    }

    pub fn read_serial_block(&mut self) -> MercuryResult<SerialBlock> {
        match self.transact(&Command::ReadParameter(Parameter::SerialBlock))? {
            Response::SerialBlock(block) => Ok(block),
            other => Err(unexpected(other)),
        }
    }

    pub fn read_firmware_version(&mut self) -> MercuryResult<FirmwareVersion> {
        match self.transact(&Command::ReadParameter(Parameter::FirmwareVersion))? {
            Response::FirmwareVersion(version) => Ok(version),
            other => Err(unexpected(other)),
        }
    }

    pub fn read_transform_ratios(&mut self) -> MercuryResult<TransformRatios> {
        match self.transact(&Command::ReadParameter(Parameter::TransformRatios))? {
            Response::TransformRatios(ratios) => Ok(ratios),
            other => Err(unexpected(other)),
        }
    }

    pub fn read_variant(&mut self) -> MercuryResult<Vec<u8>> {
        match self.transact(&Command::ReadParameter(Parameter::Variant))? {
            Response::Variant(variant) => Ok(variant),
            other => Err(unexpected(other)),
        }
    }

    /// Read one energy register
    pub fn read_energy(&mut self, period: EnergyPeriod, tariff: Tariff) -> MercuryResult<EnergyPair> {
        match self.transact(&Command::ReadEnergy { period, tariff })? {
            Response::Energy(pair) => Ok(pair),
            other => Err(unexpected(other)),
        }
    }

    /// Read the meter passport
    ///
    /// Checks the link, opens the channel with admin rights, then reads the
    /// network address, serial number block, firmware version and
    /// transformation ratios.
    pub fn read_passport(&mut self) -> MercuryResult<PassportRecord> {
        self.test_link()?;
        self.open_channel(AccessLevel::Admin)?;

        let network_address = self.read_network_address()?;
        let serial = self.read_serial_block()?;
        let firmware_version = self.read_firmware_version()?;
        let transform_ratios = self.read_transform_ratios()?;

        Ok(PassportRecord {
            network_address,
            serial_number: serial.serial_number,
            serial_raw: serial.raw,
            build_date: serial.build_date,
            firmware_version,
            transform_ratios,
        })
    }

    /// Cumulative energy since the last counter reset, all tariffs
    pub fn read_energy_from_reset(&mut self) -> MercuryResult<EnergyTariffSet> {
        self.prepare_energy_session()?;
        self.read_tariff_set(EnergyPeriod::FromReset)
    }

    /// Energy archive of one month (1-12), all tariffs
    pub fn read_energy_for_month(&mut self, month: u8) -> MercuryResult<EnergyTariffSet> {
        let month = ArchiveMonth::new(month)?;
        self.prepare_energy_session()?;
        self.read_tariff_set(EnergyPeriod::Month(month))
    }

    /// Energy archive of all twelve months
    ///
    /// The first month that fails aborts the whole batch with its error.
    pub fn read_energy_all_months(&mut self) -> MercuryResult<BTreeMap<u8, EnergyTariffSet>> {
        self.prepare_energy_session()?;
        let mut archive = BTreeMap::new();
        for month in ArchiveMonth::all() {
            let set = self
                .read_tariff_set(EnergyPeriod::Month(month))
                .inspect_err(|e| {
                    log::warn!(
                        "Meter {}: reading archive month {} failed: {}",
                        self.config.address,
                        month,
                        e
                    )
                })?;
            archive.insert(month.value(), set);
        }
        Ok(archive)
    }

    fn prepare_energy_session(&mut self) -> MercuryResult<()> {
        self.open_channel(AccessLevel::User)?;
        let variant = self.read_variant()?;
        log::debug!(
            "Meter {} variant {}",
            self.config.address,
            hex::encode_upper(&variant)
        );
        Ok(())
    }

    fn read_tariff_set(&mut self, period: EnergyPeriod) -> MercuryResult<EnergyTariffSet> {
        let mut set = EnergyTariffSet::default();
        for tariff in Tariff::ALL {
            let pair = self.read_energy(period, tariff)?;
            set.set(tariff, pair);
        }
        Ok(set)
    }

    fn expect_ack(&mut self, command: Command) -> MercuryResult<()> {
        match self.transact(&command)? {
            Response::Ack => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    /// Send `command` and decode its reply, retrying transport failures
    ///
    /// Decode errors are returned at once; retrying cannot fix them.
    fn transact(&mut self, command: &Command) -> MercuryResult<Response> {
        if self.closed {
            return Err(MercuryError::Connection(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "Meter session is closed",
            )));
        }

        let address = self.config.address.value();
        let request = build_frame(address, command.code(), &command.encode());
        let attempts = self.config.attempts();
        let mut last_error = None;

        for attempt in 1..=attempts {
            if attempt > 1 && !self.config.retry_delay.is_zero() {
                thread::sleep(self.config.retry_delay);
            }

            match self.exchange(&request, command.code(), attempt) {
                Ok(frame) => return command.decode(frame.body()),
                Err(e) if e.is_retryable() => {
                    log::warn!(
                        "Meter {}: {} attempt {}/{} failed: {}",
                        address,
                        command,
                        attempt,
                        attempts,
                        e
                    );
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or(MercuryError::NoResponse {
            address,
            command: command.code(),
            attempts,
        }))
    }

    /// One write/read cycle
    ///
    /// Reads until a valid frame addressed to this session is assembled, the
    /// channel stays silent for a read window, or the attempt deadline passes.
    fn exchange(&mut self, request: &[u8], command: u8, attempt: u32) -> MercuryResult<RtuFrame> {
        let address = self.config.address.value();

        self.channel.discard_input()?;
        log::debug!("TX {}", hex::encode_upper(request));
        self.channel.write(request)?;

        let deadline = Instant::now() + self.config.timeout;
        let mut rx = BytesMut::with_capacity(MAX_FRAME_LENGTH);
        let mut last_error = None;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            let chunk = self.channel.read_available(remaining)?;
            if chunk.is_empty() {
                break;
            }
            rx.extend_from_slice(&chunk);

            match parse_frame(&rx, address) {
                Ok(frame) => {
                    log::debug!("RX {}", hex::encode_upper(&rx));
                    // a lone non-zero byte is the meter's status reply
                    if let [status] = *frame.body() {
                        if status != 0x00 {
                            return Err(MercuryError::Rejected { command, status });
                        }
                    }
                    return Ok(frame);
                }
                Err(e) => last_error = Some(e),
            }

            if rx.len() >= MAX_FRAME_LENGTH {
                break;
            }
        }

        if rx.is_empty() {
            return Err(MercuryError::NoResponse {
                address,
                command,
                attempts: attempt,
            });
        }

        log::debug!("RX {} (invalid)", hex::encode_upper(&rx));
        Err(match last_error {
            Some(e) => e.into(),
            None => MercuryError::UnexpectedResponse(format!(
                "invalid response to command 0x{:02X}: {}",
                command,
                hex::encode_upper(&rx)
            )),
        })
    }
}

impl Drop for MeterClient {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            log::warn!("Failed to close channel of meter {}: {}", self.config.address, e);
        }
    }
}

fn unexpected(response: Response) -> MercuryError {
    MercuryError::UnexpectedResponse(format!("{:?}", response))
}
