use thiserror::Error;

/// Structural failures detected while parsing a received frame
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("Frame too short: {len} byte(s), at least 4 required")]
    TooShort { len: usize },

    #[error("Bad checksum: got 0x{received:04X}, expected 0x{calculated:04X}")]
    Checksum { received: u16, calculated: u16 },

    #[error("Unexpected address: got {actual}, expected {expected}")]
    AddressMismatch { expected: u8, actual: u8 },
}

/// Coarse classification of a [`MercuryError`]
///
/// Callers use the kind to decide whether polling the meter again later can
/// help (`NoResponse`, `Transport`) or whether the failure is permanent for
/// the given request (`Decode`, `InvalidArgument`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Nothing was received within the timeout
    NoResponse,
    /// Bytes were received but did not form a valid frame, or the channel failed
    Transport,
    /// A valid frame carried a payload of the wrong shape
    Decode,
    /// Caller-supplied parameter outside the contract
    InvalidArgument,
}

/// Main error type for Mercury meter operations
#[derive(Error, Debug)]
pub enum MercuryError {
    #[error("Connection error: {0}")]
    Connection(#[from] std::io::Error),

    #[error("No response from meter {address} to command 0x{command:02X} after {attempts} attempt(s)")]
    NoResponse { address: u8, command: u8, attempts: u32 },

    #[error("Frame invalid: {0}")]
    Frame(#[from] FrameError),

    #[error("Meter rejected command 0x{command:02X}: {}", status_description(*status))]
    Rejected { command: u8, status: u8 },

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl MercuryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MercuryError::NoResponse { .. } => ErrorKind::NoResponse,
            MercuryError::Connection(_)
            | MercuryError::Frame(_)
            | MercuryError::Rejected { .. }
            | MercuryError::UnexpectedResponse(_) => ErrorKind::Transport,
            MercuryError::Decode(_) => ErrorKind::Decode,
            MercuryError::InvalidArgument(_) => ErrorKind::InvalidArgument,
        }
    }

    /// Whether re-issuing the identical request may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::NoResponse | ErrorKind::Transport)
    }
}

/// Human readable text for the status byte a meter returns in a one-byte reply
pub fn status_description(status: u8) -> &'static str {
    match status {
        0x00 => "ok",
        0x01 => "invalid command or parameter",
        0x02 => "internal meter error",
        0x03 => "insufficient access level",
        0x04 => "internal clock already corrected today",
        0x05 => "communication channel not open",
        _ => "unknown status",
    }
}

/// Result type alias for Mercury meter operations
pub type MercuryResult<T> = Result<T, MercuryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let no_response = MercuryError::NoResponse { address: 47, command: 0x00, attempts: 2 };
        assert_eq!(no_response.kind(), ErrorKind::NoResponse);
        assert!(no_response.is_retryable());

        let frame: MercuryError = FrameError::TooShort { len: 2 }.into();
        assert_eq!(frame.kind(), ErrorKind::Transport);
        assert!(frame.is_retryable());

        let io: MercuryError = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone").into();
        assert_eq!(io.kind(), ErrorKind::Transport);

        assert!(!MercuryError::Decode("short".into()).is_retryable());
        assert!(!MercuryError::InvalidArgument("month".into()).is_retryable());
    }

    #[test]
    fn test_rejected_message() {
        let err = MercuryError::Rejected { command: 0x01, status: 0x03 };
        assert_eq!(
            err.to_string(),
            "Meter rejected command 0x01: insufficient access level"
        );
        assert_eq!(status_description(0x7F), "unknown status");
    }

    #[test]
    fn test_checksum_message() {
        let err = FrameError::Checksum { received: 0x1234, calculated: 0xABCD };
        assert_eq!(err.to_string(), "Bad checksum: got 0x1234, expected 0xABCD");
    }
}
