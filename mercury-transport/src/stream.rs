//! Byte channel trait for the transport layer

use mercury_core::MercuryResult;
use std::time::Duration;

/// Largest chunk returned by a single `read_available` call
pub const READ_CHUNK_SIZE: usize = 256;

/// Byte channel interface to a physical link to a meter
///
/// Implementations are dumb pipes: they neither frame nor interpret the
/// bytes. A channel is owned by exactly one session and is never shared.
pub trait ByteChannel: Send {
    /// Write all data to the channel
    ///
    /// # Errors
    ///
    /// Returns a connection error if the transport fails
    fn write(&mut self, data: &[u8]) -> MercuryResult<()>;

    /// Read whatever arrives within `max_wait`
    ///
    /// Blocks until at least one byte is available or `max_wait` elapses.
    /// An empty vector means nothing arrived in time.
    fn read_available(&mut self, max_wait: Duration) -> MercuryResult<Vec<u8>>;

    /// Drop stale bytes left over from an earlier exchange
    fn discard_input(&mut self) -> MercuryResult<()> {
        Ok(())
    }

    /// Close the channel
    ///
    /// Closing an already closed channel is a no-op.
    fn close(&mut self) -> MercuryResult<()>;
}

impl<T: ByteChannel + ?Sized> ByteChannel for Box<T> {
    fn write(&mut self, data: &[u8]) -> MercuryResult<()> {
        (**self).write(data)
    }

    fn read_available(&mut self, max_wait: Duration) -> MercuryResult<Vec<u8>> {
        (**self).read_available(max_wait)
    }

    fn discard_input(&mut self) -> MercuryResult<()> {
        (**self).discard_input()
    }

    fn close(&mut self) -> MercuryResult<()> {
        (**self).close()
    }
}

pub(crate) fn not_connected(what: &str) -> mercury_core::MercuryError {
    mercury_core::MercuryError::Connection(std::io::Error::new(
        std::io::ErrorKind::NotConnected,
        format!("{} not connected", what),
    ))
}
