//! Errors.
//!
//! [`Error`] is what every fallible call returns. [`DecodeErrorKind`] and
//! [`OidErrorKind`] say what was wrong with bytes or an OID, and
//! [`ErrorStatus`] is the agent's own verdict from a RESPONSE.
//!
//! # Status versus failure
//!
//! Protocol-level errors (a non-zero `error-status` in a RESPONSE) are not
//! raised automatically: every operation hands back the parsed
//! [`Response`](crate::message::Response). Call
//! [`Response::check`](crate::message::Response::check) to turn them into
//! [`Error::Snmp`].
//!
//! ```no_run
//! use snmp_stream::{Client, Error, ErrorStatus, Value, oid};
//!
//! # async fn example() -> snmp_stream::Result<()> {
//! let client = Client::builder().connect("10.0.0.5:3000").await?;
//!
//! match client.set(&oid!(1, 3, 6, 1, 4, 1, 7779, 3, 1, 1, 5, 0), Value::Integer(0)).await?.check() {
//!     Ok(response) => println!("set acknowledged: {}", response.request_id),
//!     Err(Error::Snmp { status: ErrorStatus::NotWritable, .. }) => println!("read-only"),
//!     Err(e) => println!("SET failed: {}", e),
//! }
//! # Ok(())
//! # }
//! ```

use std::net::SocketAddr;
use std::time::Duration;

/// Result type alias using the library's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// What went wrong while decoding BER.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeErrorKind {
    /// A different tag was required here.
    UnexpectedTag { expected: u8, actual: u8 },
    /// A value tag this client has no decoder for (Counter32, IpAddress, ...).
    UnsupportedTag(u8),
    /// Input ended inside a header.
    TruncatedData,
    /// Length octet `0x80`; SNMP only uses definite lengths.
    IndefiniteLength,
    /// Integer does not fit its target type.
    IntegerOverflow,
    /// INTEGER with no content octets.
    ZeroLengthInteger,
    /// Version field is neither v1 nor v2c.
    UnknownVersion(i32),
    /// Tag is not a PDU type this client knows.
    UnknownPduType(u8),
    /// Constructed OCTET STRING (tag 0x24).
    ConstructedOctetString,
    /// NULL carrying content.
    InvalidNull,
    /// Long-form length with more than four length octets.
    LengthTooLong { octets: usize },
    /// Declared length above [`MAX_LENGTH`](crate::ber::MAX_LENGTH).
    LengthExceedsMax { length: usize, max: usize },
    /// Counter64 content longer than nine octets.
    Integer64TooLong { length: usize },
    /// A TLV claims more content than its parent holds.
    TlvOverflow,
    /// A read wanted more bytes than remain.
    InsufficientData { needed: usize, available: usize },
    /// OID with more than [`MAX_OID_LEN`](crate::oid::MAX_OID_LEN) arcs.
    OidTooLong { count: usize, max: usize },
    /// Bytes left over after a complete element.
    TrailingData { remaining: usize },
}

impl DecodeErrorKind {
    /// Whether this error only means the input stopped early.
    ///
    /// Used by the reassembler to tell "wait for the next fragment" apart
    /// from a malformed message.
    pub fn is_truncation(&self) -> bool {
        matches!(
            self,
            Self::TruncatedData | Self::InsufficientData { .. } | Self::TlvOverflow
        )
    }
}

impl std::fmt::Display for DecodeErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnexpectedTag { expected, actual } => {
                write!(f, "tag 0x{:02X} where 0x{:02X} was required", actual, expected)
            }
            Self::UnsupportedTag(t) => write!(f, "unsupported tag 0x{:02X}", t),
            Self::TruncatedData => f.write_str("input ends inside a header"),
            Self::IndefiniteLength => f.write_str("indefinite length"),
            Self::IntegerOverflow => f.write_str("integer out of range"),
            Self::ZeroLengthInteger => f.write_str("empty INTEGER"),
            Self::UnknownVersion(v) => write!(f, "version {} is not v1 or v2c", v),
            Self::UnknownPduType(t) => write!(f, "unknown PDU type 0x{:02X}", t),
            Self::ConstructedOctetString => f.write_str("constructed OCTET STRING"),
            Self::InvalidNull => f.write_str("NULL has content"),
            Self::LengthTooLong { octets } => write!(f, "{} length octets", octets),
            Self::LengthExceedsMax { length, max } => {
                write!(f, "length {} over the {} limit", length, max)
            }
            Self::Integer64TooLong { length } => write!(f, "{}-octet Counter64", length),
            Self::TlvOverflow => f.write_str("TLV runs past its parent"),
            Self::InsufficientData { needed, available } => {
                write!(f, "wanted {} bytes, {} left", needed, available)
            }
            Self::OidTooLong { count, max } => write!(f, "{} OID arcs, limit {}", count, max),
            Self::TrailingData { remaining } => write!(f, "{} bytes after element", remaining),
        }
    }
}

/// Why an OID was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OidErrorKind {
    /// A dotted component is not a `u32`.
    InvalidArc,
    /// First arc above 2.
    InvalidFirstArc(u32),
    /// Second arc out of range for the first.
    InvalidSecondArc { first: u32, second: u32 },
    /// More than [`MAX_OID_LEN`](crate::oid::MAX_OID_LEN) arcs.
    TooManyArcs { count: usize, max: usize },
    /// Fewer than [`MIN_OID_LEN`](crate::oid::MIN_OID_LEN) arcs; cannot be sent.
    TooFewArcs { count: usize, min: usize },
}

impl std::fmt::Display for OidErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidArc => f.write_str("arc is not a 32-bit unsigned number"),
            Self::InvalidFirstArc(v) => write!(f, "first arc {} is above 2", v),
            Self::InvalidSecondArc { first, second } => {
                write!(f, "second arc {} out of range under {}", second, first)
            }
            Self::TooFewArcs { count, min } => write!(f, "{} arcs, need {}", count, min),
            Self::TooManyArcs { count, max } => write!(f, "{} arcs, limit {}", count, max),
        }
    }
}

/// `error-status` of a RESPONSE PDU (RFC 3416).
///
/// The gateway sets it on failed SETs. GET-style requests report `NoError`
/// and mark missing objects with exception values instead.
///
/// ```
/// use snmp_stream::ErrorStatus;
///
/// let status = ErrorStatus::from_i32(17);
/// assert_eq!(status, ErrorStatus::NotWritable);
/// assert_eq!(status.as_i32(), 17);
/// assert_eq!(status.to_string(), "notWritable");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorStatus {
    NoError,
    TooBig,
    NoSuchName,
    BadValue,
    ReadOnly,
    GenErr,
    NoAccess,
    WrongType,
    WrongLength,
    WrongEncoding,
    WrongValue,
    NoCreation,
    InconsistentValue,
    ResourceUnavailable,
    CommitFailed,
    UndoFailed,
    AuthorizationError,
    NotWritable,
    InconsistentName,
    /// A code outside 0..=18.
    Unknown(i32),
}

// Indexed by status code.
const STATUS_TABLE: [(ErrorStatus, &str); 19] = [
    (ErrorStatus::NoError, "noError"),
    (ErrorStatus::TooBig, "tooBig"),
    (ErrorStatus::NoSuchName, "noSuchName"),
    (ErrorStatus::BadValue, "badValue"),
    (ErrorStatus::ReadOnly, "readOnly"),
    (ErrorStatus::GenErr, "genErr"),
    (ErrorStatus::NoAccess, "noAccess"),
    (ErrorStatus::WrongType, "wrongType"),
    (ErrorStatus::WrongLength, "wrongLength"),
    (ErrorStatus::WrongEncoding, "wrongEncoding"),
    (ErrorStatus::WrongValue, "wrongValue"),
    (ErrorStatus::NoCreation, "noCreation"),
    (ErrorStatus::InconsistentValue, "inconsistentValue"),
    (ErrorStatus::ResourceUnavailable, "resourceUnavailable"),
    (ErrorStatus::CommitFailed, "commitFailed"),
    (ErrorStatus::UndoFailed, "undoFailed"),
    (ErrorStatus::AuthorizationError, "authorizationError"),
    (ErrorStatus::NotWritable, "notWritable"),
    (ErrorStatus::InconsistentName, "inconsistentName"),
];

impl ErrorStatus {
    /// Map a wire code; unlisted codes become `Unknown`.
    pub fn from_i32(value: i32) -> Self {
        usize::try_from(value)
            .ok()
            .and_then(|i| STATUS_TABLE.get(i))
            .map_or(Self::Unknown(value), |&(status, _)| status)
    }

    /// The wire code.
    pub fn as_i32(&self) -> i32 {
        match self {
            Self::Unknown(code) => *code,
            known => STATUS_TABLE
                .iter()
                .position(|(status, _)| status == known)
                .map_or(-1, |i| i as i32),
        }
    }

    /// `true` for anything other than `NoError`.
    pub fn is_error(&self) -> bool {
        !matches!(self, Self::NoError)
    }
}

impl std::fmt::Display for ErrorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = usize::try_from(self.as_i32())
            .ok()
            .and_then(|i| STATUS_TABLE.get(i))
            .filter(|(status, _)| status == self);
        match name {
            Some((_, name)) => f.write_str(name),
            None => write!(f, "unknown({})", self.as_i32()),
        }
    }
}

/// Everything a client call can fail with.
///
/// ```
/// use snmp_stream::Error;
///
/// fn should_reconnect(error: &Error) -> bool {
///     matches!(
///         error,
///         Error::Io { .. } | Error::ConnectionClosed | Error::IllegalState { .. }
///     )
/// }
/// ```
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Operation attempted while the transport is not open.
    #[error("illegal state: {reason}")]
    IllegalState { reason: &'static str },

    /// Reading or writing the stream failed.
    #[error("I/O failed{}: {source}", target.map(|t| format!(" (peer {})", t)).unwrap_or_default())]
    Io {
        target: Option<SocketAddr>,
        #[source]
        source: std::io::Error,
    },

    /// The connection closed (or the pending table was cleared) before a
    /// response arrived.
    #[error("connection closed before a response arrived")]
    ConnectionClosed,

    /// No response within the configured timeout.
    #[error("request {request_id} got no response within {elapsed:?}")]
    Timeout { elapsed: Duration, request_id: i32 },

    /// Non-zero `error-status`, produced by [`Response::check`](crate::message::Response::check).
    #[error("agent reported {status} (error-index {index})")]
    Snmp {
        status: ErrorStatus,
        index: u32,
        oid: Option<crate::oid::Oid>,
    },

    /// OID refused before sending, or unparsable text.
    #[error("bad OID: {kind}")]
    InvalidOid {
        kind: OidErrorKind,
        input: Option<Box<str>>, // set by Oid::parse
    },

    /// Malformed BER; `offset` is from the start of the message.
    #[error("decode error at offset {offset}: {kind}")]
    Decode {
        offset: usize,
        kind: DecodeErrorKind,
    },

    /// A frame larger than `max_message_size` was announced.
    #[error("{size}-byte message over the {max}-byte limit")]
    MessageTooLarge { size: usize, max: usize },

    /// Rejected builder settings or target address.
    #[error("bad configuration: {0}")]
    Config(String),
}

impl Error {
    /// Shorthand for [`Error::Decode`].
    pub fn decode(offset: usize, kind: DecodeErrorKind) -> Self {
        Self::Decode { offset, kind }
    }

    /// [`Error::InvalidOid`] without input text.
    pub fn invalid_oid(kind: OidErrorKind) -> Self {
        Self::InvalidOid { kind, input: None }
    }

    /// [`Error::InvalidOid`] naming the text that failed to parse.
    pub fn invalid_oid_with_input(kind: OidErrorKind, input: impl Into<Box<str>>) -> Self {
        Self::InvalidOid {
            kind,
            input: Some(input.into()),
        }
    }

    /// Shorthand for [`Error::Io`].
    pub fn io(target: Option<SocketAddr>, source: std::io::Error) -> Self {
        Self::Io { target, source }
    }

    /// The kind, for [`Error::Decode`].
    pub fn decode_kind(&self) -> Option<DecodeErrorKind> {
        match self {
            Self::Decode { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// The peer, for I/O errors that know it.
    pub fn target(&self) -> Option<SocketAddr> {
        match self {
            Self::Io { target, .. } => *target,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_roundtrip() {
        for code in 0..=18 {
            assert_eq!(ErrorStatus::from_i32(code).as_i32(), code);
        }
        assert_eq!(ErrorStatus::from_i32(99), ErrorStatus::Unknown(99));
        assert_eq!(ErrorStatus::from_i32(-1), ErrorStatus::Unknown(-1));
        assert_eq!(ErrorStatus::Unknown(99).as_i32(), 99);
    }

    #[test]
    fn test_truncation_kinds() {
        assert!(DecodeErrorKind::TruncatedData.is_truncation());
        assert!(
            DecodeErrorKind::InsufficientData {
                needed: 4,
                available: 1
            }
            .is_truncation()
        );
        assert!(!DecodeErrorKind::UnsupportedTag(0x44).is_truncation());
        assert!(!DecodeErrorKind::IndefiniteLength.is_truncation());
    }

    #[test]
    fn test_display() {
        let err = Error::decode(7, DecodeErrorKind::UnsupportedTag(0x41));
        assert_eq!(err.to_string(), "decode error at offset 7: unsupported tag 0x41");
        assert_eq!(ErrorStatus::from_i32(5).to_string(), "genErr");
        assert_eq!(ErrorStatus::from_i32(-3).to_string(), "unknown(-3)");

        let err = Error::IllegalState {
            reason: "transport is not open",
        };
        assert_eq!(err.to_string(), "illegal state: transport is not open");
    }
}
