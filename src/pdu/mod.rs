//! SNMP Protocol Data Units (PDUs).
//!
//! PDUs represent the different SNMP operations. Besides the RFC 3416 types
//! the client uses, two gateway extensions are supported: GET-SUBTREE (0xAB),
//! which returns every object under the requested roots, and the notification
//! subscribe PDU (0xAA), which has an empty body.

use crate::ber::{Decoder, EncodeBuf, tag};
use crate::error::{DecodeErrorKind, Error, ErrorStatus, Result};
use crate::oid::Oid;
use crate::value::Value;
use crate::varbind::{VarBind, decode_varbind_list, encode_varbind_list};

/// PDU type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PduType {
    GetRequest = 0xA0,
    Response = 0xA2,
    SetRequest = 0xA3,
    GetBulkRequest = 0xA5,
    InformRequest = 0xA6,
    TrapV2 = 0xA7,
    Subscribe = 0xAA,
    GetSubtree = 0xAB,
}

impl PduType {
    /// Create from tag byte.
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            tag::pdu::GET_REQUEST => Some(Self::GetRequest),
            tag::pdu::RESPONSE => Some(Self::Response),
            tag::pdu::SET_REQUEST => Some(Self::SetRequest),
            tag::pdu::GET_BULK_REQUEST => Some(Self::GetBulkRequest),
            tag::pdu::INFORM_REQUEST => Some(Self::InformRequest),
            tag::pdu::TRAP_V2 => Some(Self::TrapV2),
            tag::pdu::SUBSCRIBE => Some(Self::Subscribe),
            tag::pdu::GET_SUBTREE => Some(Self::GetSubtree),
            _ => None,
        }
    }

    /// Get the tag byte.
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Whether the PDU carries the standard request-id/error/varbind body.
    pub fn has_body(self) -> bool {
        !matches!(self, Self::Subscribe)
    }
}

impl std::fmt::Display for PduType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GetRequest => write!(f, "GetRequest"),
            Self::Response => write!(f, "Response"),
            Self::SetRequest => write!(f, "SetRequest"),
            Self::GetBulkRequest => write!(f, "GetBulkRequest"),
            Self::InformRequest => write!(f, "InformRequest"),
            Self::TrapV2 => write!(f, "TrapV2"),
            Self::Subscribe => write!(f, "Subscribe"),
            Self::GetSubtree => write!(f, "GetSubtree"),
        }
    }
}

/// Generic PDU structure for request/response operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pdu {
    /// PDU type
    pub pdu_type: PduType,
    /// Request ID for correlating requests and responses
    pub request_id: i32,
    /// Error status (0 for requests, error code for responses).
    /// Holds non-repeaters for GETBULK.
    pub error_status: i32,
    /// Error index (1-based index of problematic varbind).
    /// Holds max-repetitions for GETBULK.
    pub error_index: i32,
    /// Variable bindings
    pub varbinds: Vec<VarBind>,
}

impl Pdu {
    fn with_null_varbinds(pdu_type: PduType, request_id: i32, oids: &[Oid]) -> Self {
        Self {
            pdu_type,
            request_id,
            error_status: 0,
            error_index: 0,
            varbinds: oids.iter().cloned().map(VarBind::null).collect(),
        }
    }

    /// Create a new GET request PDU.
    pub fn get_request(request_id: i32, oids: &[Oid]) -> Self {
        Self::with_null_varbinds(PduType::GetRequest, request_id, oids)
    }

    /// Create a GET-SUBTREE request PDU.
    ///
    /// Same body as GET; the gateway answers with every object under each OID.
    pub fn get_subtree_request(request_id: i32, oids: &[Oid]) -> Self {
        Self::with_null_varbinds(PduType::GetSubtree, request_id, oids)
    }

    /// Create a SET request PDU for a single object.
    pub fn set_request(request_id: i32, oid: Oid, value: Value) -> Self {
        Self {
            pdu_type: PduType::SetRequest,
            request_id,
            error_status: 0,
            error_index: 0,
            varbinds: vec![VarBind::new(oid, value)],
        }
    }

    /// Create a GETBULK request PDU.
    ///
    /// `non_repeaters` below zero is sent as 0.
    pub fn get_bulk(
        request_id: i32,
        non_repeaters: i32,
        max_repetitions: i32,
        oids: &[Oid],
    ) -> Self {
        Self {
            error_status: non_repeaters.max(0),
            error_index: max_repetitions,
            ..Self::with_null_varbinds(PduType::GetBulkRequest, request_id, oids)
        }
    }

    /// Create the notification subscribe PDU.
    ///
    /// It has no body, so the request ID and error fields are not sent.
    pub fn subscribe() -> Self {
        Self::with_null_varbinds(PduType::Subscribe, 0, &[])
    }

    /// Encode to BER.
    pub fn encode(&self, buf: &mut EncodeBuf) {
        buf.push_constructed(self.pdu_type.tag(), |buf| {
            if !self.pdu_type.has_body() {
                return;
            }
            encode_varbind_list(buf, &self.varbinds);
            buf.push_integer(self.error_index);
            buf.push_integer(self.error_status);
            buf.push_integer(self.request_id);
        });
    }

    /// Decode from BER, starting at the PDU tag.
    pub fn decode(decoder: &mut Decoder) -> Result<Self> {
        let tag_offset = decoder.offset();
        let tag = decoder.read_tag()?;
        let pdu_type = PduType::from_tag(tag)
            .ok_or_else(|| Error::decode(tag_offset, DecodeErrorKind::UnknownPduType(tag)))?;

        let len = decoder.read_length()?;
        let mut pdu_decoder = decoder.sub_decoder(len)?;

        if !pdu_type.has_body() {
            pdu_decoder.expect_end()?;
            return Ok(Self::subscribe());
        }

        let request_id = pdu_decoder.read_integer()?;
        let error_status = pdu_decoder.read_integer()?;
        let error_index = pdu_decoder.read_integer()?;
        let varbinds = decode_varbind_list(&mut pdu_decoder)?;

        Ok(Pdu {
            pdu_type,
            request_id,
            error_status,
            error_index,
            varbinds,
        })
    }

    /// Check if this is an error response.
    pub fn is_error(&self) -> bool {
        self.error_status != 0
    }

    /// Get the error status as an enum.
    pub fn error_status_enum(&self) -> ErrorStatus {
        ErrorStatus::from_i32(self.error_status)
    }

    /// Build the RESPONSE that acknowledges this PDU (INFORM handling).
    ///
    /// Copies the request ID and variable bindings and zeroes the error fields.
    pub fn to_response(&self) -> Self {
        Self {
            pdu_type: PduType::Response,
            request_id: self.request_id,
            error_status: 0,
            error_index: 0,
            varbinds: self.varbinds.clone(),
        }
    }

    /// Check if this is a notification PDU (TrapV2 or Inform).
    pub fn is_notification(&self) -> bool {
        matches!(self.pdu_type, PduType::TrapV2 | PduType::InformRequest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid;

    fn encode(pdu: &Pdu) -> bytes::Bytes {
        let mut buf = EncodeBuf::new();
        pdu.encode(&mut buf);
        buf.finish()
    }

    #[test]
    fn test_get_request_roundtrip() {
        let pdu = Pdu::get_request(12345, &[oid!(1, 3, 6, 1, 2, 1, 1, 3, 0)]);
        let decoded = Pdu::decode(&mut Decoder::new(encode(&pdu))).unwrap();
        assert_eq!(decoded, pdu);
        assert_eq!(decoded.varbinds[0].value, Value::Null);
    }

    #[test]
    fn test_get_request_bytes() {
        let pdu = Pdu::get_request(1, &[oid!(1, 3, 6, 1)]);
        assert_eq!(
            &encode(&pdu)[..],
            &[
                0xA0, 0x14, // GET
                0x02, 0x01, 0x01, // request-id
                0x02, 0x01, 0x00, // error-status
                0x02, 0x01, 0x00, // error-index
                0x30, 0x09, 0x30, 0x07, 0x06, 0x03, 0x2B, 0x06, 0x01, 0x05, 0x00,
            ]
        );
    }

    #[test]
    fn test_get_subtree_uses_vendor_tag() {
        let pdu = Pdu::get_subtree_request(7, &[oid!(1, 3, 6, 1, 4, 1, 7779)]);
        let bytes = encode(&pdu);
        assert_eq!(bytes[0], 0xAB);

        // Same body as GET
        let get = encode(&Pdu::get_request(7, &[oid!(1, 3, 6, 1, 4, 1, 7779)]));
        assert_eq!(&bytes[1..], &get[1..]);

        let decoded = Pdu::decode(&mut Decoder::new(bytes)).unwrap();
        assert_eq!(decoded.pdu_type, PduType::GetSubtree);
    }

    #[test]
    fn test_get_bulk_clamps_non_repeaters() {
        let pdu = Pdu::get_bulk(9, -3, 25, &[oid!(1, 3, 6, 1, 2, 1, 2, 2)]);
        assert_eq!(pdu.error_status, 0);
        assert_eq!(pdu.error_index, 25);

        let bytes = encode(&pdu);
        assert_eq!(bytes[0], 0xA5);
        // request-id 9, non-repeaters 0, max-repetitions 25
        assert_eq!(&bytes[2..11], &[0x02, 0x01, 0x09, 0x02, 0x01, 0x00, 0x02, 0x01, 0x19]);
    }

    #[test]
    fn test_set_request_integer_zero() {
        let pdu = Pdu::set_request(3, oid!(1, 3, 6, 1, 4, 1, 7779, 5, 0), Value::Integer(0));
        let bytes = encode(&pdu);
        assert_eq!(bytes[0], 0xA3);
        assert_eq!(&bytes[bytes.len() - 3..], &[0x02, 0x01, 0x00]);
        assert_eq!(Pdu::decode(&mut Decoder::new(bytes)).unwrap(), pdu);
    }

    #[test]
    fn test_subscribe_is_empty() {
        let bytes = encode(&Pdu::subscribe());
        assert_eq!(&bytes[..], &[0xAA, 0x00]);
        let decoded = Pdu::decode(&mut Decoder::new(bytes)).unwrap();
        assert_eq!(decoded.pdu_type, PduType::Subscribe);
        assert!(decoded.varbinds.is_empty());
    }

    #[test]
    fn test_unknown_pdu_tag() {
        // GetNextRequest is not part of this client's PDU set
        let err = Pdu::decode(&mut Decoder::from_slice(&[0xA1, 0x00])).unwrap_err();
        assert_eq!(err.decode_kind(), Some(DecodeErrorKind::UnknownPduType(0xA1)));
    }

    #[test]
    fn test_to_response() {
        let inform = Pdu {
            pdu_type: PduType::InformRequest,
            request_id: 77,
            error_status: 0,
            error_index: 0,
            varbinds: vec![VarBind::new(oid!(1, 3, 6, 1, 2, 1, 1, 3, 0), Value::TimeTicks(5))],
        };
        assert!(inform.is_notification());

        let response = inform.to_response();
        assert_eq!(response.pdu_type, PduType::Response);
        assert_eq!(response.request_id, 77);
        assert_eq!(response.varbinds, inform.varbinds);
        assert!(!response.is_error());
    }

    #[test]
    fn test_error_status_enum() {
        let pdu = Pdu {
            pdu_type: PduType::Response,
            request_id: 1,
            error_status: 17,
            error_index: 1,
            varbinds: Vec::new(),
        };
        assert!(pdu.is_error());
        assert_eq!(pdu.error_status_enum(), ErrorStatus::NotWritable);
    }
}
