//! SNMP value types.
//!
//! [`Value`] covers the types the gateway puts on the wire: INTEGER,
//! OCTET STRING, NULL, OBJECT IDENTIFIER, TimeTicks, Counter64 and the three
//! SNMPv2 exception markers. Any other tag fails the decode with
//! [`DecodeErrorKind::UnsupportedTag`].

use crate::ber::{Decoder, EncodeBuf, tag};
use crate::error::{DecodeErrorKind, Error, Result};
use crate::oid::Oid;
use bytes::Bytes;

/// SNMP value.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Value {
    /// INTEGER (signed 32-bit, two's complement on the wire)
    Integer(i32),

    /// OCTET STRING (arbitrary bytes).
    ///
    /// Gateway strings are single-byte text; see [`Value::as_latin1`].
    OctetString(Bytes),

    /// NULL, the placeholder value in GET-style requests.
    Null,

    /// OBJECT IDENTIFIER
    ObjectIdentifier(Oid),

    /// TimeTicks (hundredths of seconds)
    TimeTicks(u32),

    /// Counter64 (unsigned 64-bit, wrapping)
    Counter64(u64),

    /// noSuchObject exception
    NoSuchObject,

    /// noSuchInstance exception
    NoSuchInstance,

    /// endOfMibView exception
    EndOfMibView,
}

impl Value {
    /// The BER tag this value is encoded with.
    pub fn tag(&self) -> u8 {
        match self {
            Value::Integer(_) => tag::universal::INTEGER,
            Value::OctetString(_) => tag::universal::OCTET_STRING,
            Value::Null => tag::universal::NULL,
            Value::ObjectIdentifier(_) => tag::universal::OBJECT_IDENTIFIER,
            Value::TimeTicks(_) => tag::application::TIMETICKS,
            Value::Counter64(_) => tag::application::COUNTER64,
            Value::NoSuchObject => tag::context::NO_SUCH_OBJECT,
            Value::NoSuchInstance => tag::context::NO_SUCH_INSTANCE,
            Value::EndOfMibView => tag::context::END_OF_MIB_VIEW,
        }
    }

    /// Try to get as i32.
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as u32 (TimeTicks, or a non-negative INTEGER).
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Value::TimeTicks(v) => Some(*v),
            Value::Integer(v) => u32::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Try to get as u64 (Counter64, TimeTicks, or a non-negative INTEGER).
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Counter64(v) => Some(*v),
            other => other.as_u32().map(u64::from),
        }
    }

    /// Try to get the raw bytes of an OCTET STRING.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::OctetString(data) => Some(data),
            _ => None,
        }
    }

    /// OCTET STRING as text, one character per byte.
    ///
    /// Each byte maps to the code point of the same value (ISO-8859-1). No
    /// multi-byte decoding is attempted, so this never fails.
    ///
    /// ```
    /// use snmp_stream::Value;
    /// use bytes::Bytes;
    ///
    /// let v = Value::OctetString(Bytes::from_static(b"caf\xE9"));
    /// assert_eq!(v.as_latin1().as_deref(), Some("café"));
    /// ```
    pub fn as_latin1(&self) -> Option<String> {
        self.as_bytes().map(latin1)
    }

    /// Try to get as OID.
    pub fn as_oid(&self) -> Option<&Oid> {
        match self {
            Value::ObjectIdentifier(oid) => Some(oid),
            _ => None,
        }
    }

    /// `true` for NULL and the three exception markers.
    ///
    /// All four carry "no value" to the application.
    pub fn is_null(&self) -> bool {
        matches!(
            self,
            Value::Null | Value::NoSuchObject | Value::NoSuchInstance | Value::EndOfMibView
        )
    }

    /// `true` for noSuchObject, noSuchInstance and endOfMibView.
    pub fn is_exception(&self) -> bool {
        matches!(
            self,
            Value::NoSuchObject | Value::NoSuchInstance | Value::EndOfMibView
        )
    }

    /// Encode to BER.
    pub fn encode(&self, buf: &mut EncodeBuf) {
        match self {
            Value::Integer(v) => buf.push_integer(*v),
            Value::OctetString(data) => buf.push_octet_string(data),
            Value::Null => buf.push_null(),
            Value::ObjectIdentifier(oid) => buf.push_oid(oid),
            Value::TimeTicks(v) => buf.push_unsigned32(tag::application::TIMETICKS, *v),
            Value::Counter64(v) => buf.push_integer64(*v),
            Value::NoSuchObject | Value::NoSuchInstance | Value::EndOfMibView => {
                buf.push_length(0);
                buf.push_tag(self.tag());
            }
        }
    }

    /// Decode from BER.
    pub fn decode(decoder: &mut Decoder) -> Result<Self> {
        let tag_offset = decoder.offset();
        let tag = decoder.read_tag()?;
        let len = decoder.read_length()?;

        match tag {
            tag::universal::INTEGER => {
                let value = decoder.read_integer_value(len)?;
                Ok(Value::Integer(value))
            }
            tag::universal::OCTET_STRING => {
                let data = decoder.read_bytes(len)?;
                Ok(Value::OctetString(data))
            }
            tag::universal::OBJECT_IDENTIFIER => {
                let oid = decoder.read_oid_value(len)?;
                Ok(Value::ObjectIdentifier(oid))
            }
            tag::application::TIMETICKS => {
                let value = decoder.read_unsigned32_value(len)?;
                Ok(Value::TimeTicks(value))
            }
            tag::application::COUNTER64 => {
                let value = decoder.read_integer64_value(len)?;
                Ok(Value::Counter64(value))
            }
            // NULL and the exceptions carry no content; any bytes present are skipped.
            tag::universal::NULL
            | tag::context::NO_SUCH_OBJECT
            | tag::context::NO_SUCH_INSTANCE
            | tag::context::END_OF_MIB_VIEW => {
                if len != 0 {
                    decoder.read_bytes(len)?;
                }
                Ok(match tag {
                    tag::context::NO_SUCH_OBJECT => Value::NoSuchObject,
                    tag::context::NO_SUCH_INSTANCE => Value::NoSuchInstance,
                    tag::context::END_OF_MIB_VIEW => Value::EndOfMibView,
                    _ => Value::Null,
                })
            }
            tag::universal::OCTET_STRING_CONSTRUCTED => {
                tracing::debug!(target: "snmp_stream::ber", { snmp.offset = %tag_offset, kind = %DecodeErrorKind::ConstructedOctetString }, "constructed OCTET STRING");
                Err(Error::decode(
                    tag_offset,
                    DecodeErrorKind::ConstructedOctetString,
                ))
            }
            other => {
                tracing::debug!(target: "snmp_stream::ber", { snmp.offset = %tag_offset, kind = %DecodeErrorKind::UnsupportedTag(other) }, "no decoder for value tag");
                Err(Error::decode(
                    tag_offset,
                    DecodeErrorKind::UnsupportedTag(other),
                ))
            }
        }
    }
}

/// Map each byte to the code point of the same value.
pub(crate) fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "{}", v),
            Value::OctetString(data) => write!(f, "{}", latin1(data)),
            Value::Null => write!(f, "NULL"),
            Value::ObjectIdentifier(oid) => write!(f, "{}", oid),
            Value::TimeTicks(v) => {
                let secs = v / 100;
                let hours = secs / 3600;
                write!(f, "{}:{:02}:{:02}.{:02}", hours, (secs % 3600) / 60, secs % 60, v % 100)
            }
            Value::Counter64(v) => write!(f, "{}", v),
            Value::NoSuchObject => write!(f, "noSuchObject"),
            Value::NoSuchInstance => write!(f, "noSuchInstance"),
            Value::EndOfMibView => write!(f, "endOfMibView"),
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::OctetString(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<Bytes> for Value {
    fn from(data: Bytes) -> Self {
        Value::OctetString(data)
    }
}

impl From<Oid> for Value {
    fn from(oid: Oid) -> Self {
        Value::ObjectIdentifier(oid)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Counter64(v)
    }
}
