//! Transport layer for the Mercury-230 meter protocol
//!
//! This crate provides the byte channel abstraction and its Serial and
//! transparent TCP implementations.

pub mod serial;
pub mod stream;
pub mod tcp;

pub use mercury_core::{MercuryError, MercuryResult};
pub use serial::{SerialChannel, SerialSettings};
pub use stream::{ByteChannel, READ_CHUNK_SIZE};
pub use tcp::{TcpChannel, TcpSettings};
