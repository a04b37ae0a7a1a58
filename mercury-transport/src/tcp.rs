//! Transparent TCP byte channel
//!
//! RTU frames are tunnelled as-is: no MBAP header or any other envelope is
//! added, the socket is a plain byte pipe to an RS-485 gateway.

use crate::stream::{not_connected, ByteChannel, READ_CHUNK_SIZE};
use mercury_core::{MercuryError, MercuryResult};
use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

/// Smallest read timeout handed to the socket; zero would mean "block forever"
const MIN_READ_TIMEOUT: Duration = Duration::from_millis(1);

/// TCP transport settings
#[derive(Debug, Clone)]
pub struct TcpSettings {
    pub host: String,
    pub port: u16,
    pub connect_timeout: Duration,
}

impl TcpSettings {
    /// Create new TCP settings
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            connect_timeout: Duration::from_secs(1),
        }
    }

    /// Create TCP settings with timeout
    pub fn with_timeout(host: impl Into<String>, port: u16, timeout: Duration) -> Self {
        Self {
            connect_timeout: timeout,
            ..Self::new(host, port)
        }
    }

    fn resolve(&self) -> MercuryResult<Vec<SocketAddr>> {
        let addrs: Vec<SocketAddr> = (self.host.as_str(), self.port).to_socket_addrs()?.collect();
        if addrs.is_empty() {
            return Err(MercuryError::InvalidArgument(format!(
                "Invalid TCP address: {}:{}",
                self.host, self.port
            )));
        }
        Ok(addrs)
    }
}

/// TCP byte channel
#[derive(Debug)]
pub struct TcpChannel {
    stream: Option<TcpStream>,
    settings: TcpSettings,
}

impl TcpChannel {
    /// Connect to the gateway described by `settings`
    ///
    /// Every resolved address is tried in turn; the last connect error is
    /// returned if none succeeds.
    pub fn connect(settings: TcpSettings) -> MercuryResult<Self> {
        let mut last_error = None;
        for addr in settings.resolve()? {
            match TcpStream::connect_timeout(&addr, settings.connect_timeout) {
                Ok(stream) => {
                    stream.set_nodelay(true)?;
                    log::info!("Connected to {} ({}:{})", addr, settings.host, settings.port);
                    return Ok(Self::from_connected_stream(stream, settings));
                }
                Err(e) => {
                    log::debug!("Connect to {} failed: {}", addr, e);
                    last_error = Some(e);
                }
            }
        }
        Err(last_error
            .map(MercuryError::Connection)
            .unwrap_or_else(|| not_connected("TCP stream")))
    }

    /// Create a TCP channel from an already-connected stream
    pub fn from_connected_stream(stream: TcpStream, settings: TcpSettings) -> Self {
        Self {
            stream: Some(stream),
            settings,
        }
    }

    pub fn settings(&self) -> &TcpSettings {
        &self.settings
    }

    fn stream(&mut self) -> MercuryResult<&mut TcpStream> {
        self.stream.as_mut().ok_or_else(|| not_connected("TCP stream"))
    }

    fn peer_closed() -> MercuryError {
        MercuryError::Connection(io::Error::new(
            io::ErrorKind::ConnectionAborted,
            "TCP peer closed the connection",
        ))
    }
}

impl ByteChannel for TcpChannel {
    fn write(&mut self, data: &[u8]) -> MercuryResult<()> {
        let stream = self.stream()?;
        stream.write_all(data)?;
        stream.flush()?;
        Ok(())
    }

    fn read_available(&mut self, max_wait: Duration) -> MercuryResult<Vec<u8>> {
        let stream = self.stream()?;
        if max_wait.is_zero() {
            return Ok(Vec::new());
        }
        stream.set_read_timeout(Some(max_wait.max(MIN_READ_TIMEOUT)))?;

        let mut buf = [0u8; READ_CHUNK_SIZE];
        match stream.read(&mut buf) {
            Ok(0) => {
                self.stream = None;
                Err(Self::peer_closed())
            }
            Ok(n) => Ok(buf[..n].to_vec()),
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                Ok(Vec::new())
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn discard_input(&mut self) -> MercuryResult<()> {
        let stream = self.stream()?;
        stream.set_nonblocking(true)?;
        let mut buf = [0u8; READ_CHUNK_SIZE];
        let result = loop {
            match stream.read(&mut buf) {
                Ok(0) => break Err(Self::peer_closed()),
                Ok(n) => log::debug!("Discarded {} stale byte(s)", n),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break Ok(()),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => break Err(e.into()),
            }
        };
        stream.set_nonblocking(false)?;
        result
    }

    fn close(&mut self) -> MercuryResult<()> {
        if let Some(stream) = self.stream.take() {
            match stream.shutdown(Shutdown::Both) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotConnected => {}
                Err(e) => return Err(e.into()),
            }
            log::info!("Closed TCP connection to {}:{}", self.settings.host, self.settings.port);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::thread;

    #[test]
    fn test_tcp_settings() {
        let settings = TcpSettings::new("10.0.31.202", 2222);
        assert_eq!(settings.host, "10.0.31.202");
        assert_eq!(settings.port, 2222);
        assert_eq!(settings.connect_timeout, Duration::from_secs(1));
    }

    #[test]
    fn test_bytes_pass_through_unchanged() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = thread::spawn(move || {
            let (mut socket, _) = listener.accept().unwrap();
            let mut request = [0u8; 4];
            socket.read_exact(&mut request).unwrap();
            socket.write_all(&[0x2F, 0x00, 0x1D, 0x80]).unwrap();
            request
        });

        let mut channel = TcpChannel::connect(TcpSettings::new("127.0.0.1", port)).unwrap();
        channel.write(&[0x2F, 0x00, 0x1D, 0x80]).unwrap();

        let mut received = Vec::new();
        while received.len() < 4 {
            let chunk = channel.read_available(Duration::from_secs(2)).unwrap();
            assert!(!chunk.is_empty(), "gateway reply did not arrive");
            received.extend_from_slice(&chunk);
        }
        assert_eq!(received, [0x2F, 0x00, 0x1D, 0x80]);
        assert_eq!(server.join().unwrap(), [0x2F, 0x00, 0x1D, 0x80]);

        channel.close().unwrap();
        channel.close().unwrap();
        assert!(channel.write(&[0x00]).is_err());
    }

    #[test]
    fn test_silent_peer_yields_empty_read() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = thread::spawn(move || {
            let (socket, _) = listener.accept().unwrap();
            thread::sleep(Duration::from_millis(200));
            drop(socket);
        });

        let mut channel = TcpChannel::connect(TcpSettings::new("127.0.0.1", port)).unwrap();
        let chunk = channel.read_available(Duration::from_millis(20)).unwrap();
        assert!(chunk.is_empty());
        channel.close().unwrap();
        server.join().unwrap();
    }
}
