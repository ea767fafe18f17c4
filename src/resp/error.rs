use std::io;

use thiserror::Error;

/**
 * Framing errors: the peer sent bytes that are not valid RESP
 */
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("unknown type byte {:?}", char::from(*.0))]
    UnknownType(u8),

    #[error("invalid length line {0:?}")]
    MalformedLength(String),

    #[error("invalid integer line {0:?}")]
    MalformedInteger(String),

    #[error("stream ended in the middle of a message")]
    Truncated,

    #[error("expected CRLF after bulk payload")]
    MissingTerminator,

    #[error("simple line is not valid UTF-8")]
    InvalidText,

    #[error("line longer than {0} bytes")]
    LineTooLong(usize),

    #[error("nesting deeper than {0} arrays")]
    TooDeep(usize),

    #[error("declared length {len} exceeds limit {max}")]
    TooLarge { len: i64, max: usize },
}

#[derive(Debug, Error)]
pub enum RESPError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// No bytes arrived within the caller's limit.
    /// `mid_unit` is set when part of a value had already been consumed and is now lost.
    #[error("{}", timeout_message(*.mid_unit))]
    TimedOut { mid_unit: bool },
}

impl RESPError {
    pub fn is_truncated(&self) -> bool {
        matches!(self, RESPError::Protocol(ProtocolError::Truncated))
    }

    /**
     * Stream failure while reading a unit, an abrupt EOF after its first byte is a truncation
     */
    pub(crate) fn from_io(err: io::Error, mid_unit: bool) -> RESPError {
        if mid_unit && err.kind() == io::ErrorKind::UnexpectedEof {
            RESPError::Protocol(ProtocolError::Truncated)
        } else {
            RESPError::Io(err)
        }
    }
}

fn timeout_message(mid_unit: bool) -> &'static str {
    if mid_unit {
        "stalled in the middle of a request"
    } else {
        "timed out waiting for request"
    }
}

/**
 * Text for simple strings and errors may not contain CR or LF
 */
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("simple text may not contain CR or LF: {0:?}")]
pub struct InvalidText(pub String);
