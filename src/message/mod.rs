//! SNMP message wrappers.
//!
//! - [`CommunityMessage`] - the framed `SEQUENCE { version, community, PDU }`
//! - [`Incoming`] - a received message classified by PDU type
//! - [`Response`] - the parsed result handed to request callers

mod community;

pub use community::CommunityMessage;

use std::collections::BTreeMap;

use crate::ber::{Decoder, tag};
use crate::error::{Error, ErrorStatus, Result};
use crate::notification::Notification;
use crate::oid::Oid;
use crate::pdu::{Pdu, PduType};
use crate::value::{Value, latin1};
use crate::varbind::into_value_map;
use crate::version::Version;
use bytes::Bytes;

/// Parsed RESPONSE PDU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Request ID the gateway echoed
    pub request_id: i32,
    /// Community string the gateway sent
    pub community: Bytes,
    /// Error status (`NoError` on success)
    pub error_status: ErrorStatus,
    /// 1-based index of the varbind the error refers to, 0 if none
    pub error_index: u32,
    /// Returned values keyed by OID
    pub values: BTreeMap<Oid, Value>,
    error_oid: Option<Oid>,
}

impl Response {
    /// Build from a decoded RESPONSE PDU.
    pub fn from_pdu(community: Bytes, pdu: Pdu) -> Self {
        let error_index = u32::try_from(pdu.error_index).unwrap_or(0);
        let error_oid = (error_index as usize)
            .checked_sub(1)
            .and_then(|i| pdu.varbinds.get(i))
            .map(|vb| vb.oid.clone());
        Self {
            request_id: pdu.request_id,
            community,
            error_status: pdu.error_status_enum(),
            error_index,
            values: into_value_map(pdu.varbinds),
            error_oid,
        }
    }

    /// Whether the gateway reported an error.
    pub fn is_error(&self) -> bool {
        self.error_status.is_error()
    }

    /// The OID at `error_index`, if the index names a returned varbind.
    pub fn error_oid(&self) -> Option<&Oid> {
        self.error_oid.as_ref()
    }

    /// Look up a single value.
    pub fn get(&self, oid: &Oid) -> Option<&Value> {
        self.values.get(oid)
    }

    /// Community as text, one character per byte.
    pub fn community_str(&self) -> String {
        latin1(&self.community)
    }

    /// Turn a non-zero error status into [`Error::Snmp`].
    ///
    /// ```
    /// use snmp_stream::{Error, ErrorStatus};
    /// use snmp_stream::message::Response;
    /// use snmp_stream::pdu::{Pdu, PduType};
    ///
    /// let pdu = Pdu { pdu_type: PduType::Response, request_id: 1, error_status: 5, error_index: 0, varbinds: vec![] };
    /// let err = Response::from_pdu("public".into(), pdu).check().unwrap_err();
    /// assert!(matches!(err, Error::Snmp { status: ErrorStatus::GenErr, .. }));
    /// ```
    pub fn check(self) -> Result<Self> {
        if self.is_error() {
            return Err(Error::Snmp {
                status: self.error_status,
                index: self.error_index,
                oid: self.error_oid,
            });
        }
        Ok(self)
    }
}

/// A received message, classified by PDU type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    /// RESPONSE (0xA2), routed by request ID
    Response(Response),
    /// TRAP-V2 (0xA7) or INFORM (0xA6), routed to the notification sink
    Notification(Notification),
    /// Any other PDU type; logged and dropped by the dispatcher
    Unhandled {
        /// Message version
        version: Version,
        /// PDU tag byte
        pdu_tag: u8,
    },
    /// A well-framed message whose version is neither v1 nor v2c (v3, say).
    /// The rest of the message is not parsed; the dispatcher drops it.
    UnsupportedVersion {
        /// Version number as received
        version: i32,
    },
}

impl Incoming {
    /// Decode one complete message.
    ///
    /// The PDU body is only parsed for RESPONSE, TRAP-V2 and INFORM; other
    /// PDU types are skipped without inspecting their content.
    pub fn decode(data: Bytes) -> Result<Self> {
        let mut decoder = Decoder::new(data);
        let mut seq = decoder.read_sequence()?;
        let version_num = seq.read_integer()?;
        let Some(version) = Version::from_i32(version_num) else {
            return Ok(Incoming::UnsupportedVersion {
                version: version_num,
            });
        };
        let community = seq.read_octet_string()?;

        let pdu_tag = seq.peek_tag().unwrap_or(0);
        match pdu_tag {
            tag::pdu::RESPONSE | tag::pdu::TRAP_V2 | tag::pdu::INFORM_REQUEST => {
                let pdu = Pdu::decode(&mut seq)?;
                if pdu.pdu_type == PduType::Response {
                    return Ok(Incoming::Response(Response::from_pdu(community, pdu)));
                }
                let msg = CommunityMessage {
                    version,
                    community,
                    pdu,
                };
                match Notification::from_message(msg) {
                    Some(notification) => Ok(Incoming::Notification(notification)),
                    None => Ok(Incoming::Unhandled { version, pdu_tag }),
                }
            }
            _ => {
                seq.skip_tlv()?;
                Ok(Incoming::Unhandled { version, pdu_tag })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::NotificationKind;
    use crate::oid;
    use crate::varbind::VarBind;

    fn response_pdu(error_status: i32, error_index: i32) -> Pdu {
        Pdu {
            pdu_type: PduType::Response,
            request_id: 9,
            error_status,
            error_index,
            varbinds: vec![
                VarBind::new(oid!(1, 3, 6, 1, 2, 1, 1, 3, 0), Value::TimeTicks(12345)),
                VarBind::new(oid!(1, 3, 6, 1, 4, 1, 7779, 1, 0), Value::Integer(-7)),
            ],
        }
    }

    #[test]
    fn test_decode_response() {
        let msg = CommunityMessage::v2c(Bytes::from_static(b"public"), response_pdu(0, 0));
        let Incoming::Response(response) = Incoming::decode(msg.encode()).unwrap() else {
            panic!("expected response");
        };
        assert_eq!(response.request_id, 9);
        assert_eq!(response.error_status, ErrorStatus::NoError);
        assert_eq!(response.community_str(), "public");
        assert_eq!(
            response.get(&oid!(1, 3, 6, 1, 2, 1, 1, 3, 0)),
            Some(&Value::TimeTicks(12345))
        );
        assert_eq!(
            response.get(&oid!(1, 3, 6, 1, 4, 1, 7779, 1, 0)),
            Some(&Value::Integer(-7))
        );
        assert!(response.check().is_ok());
    }

    #[test]
    fn test_response_check_reports_oid() {
        let response = Response::from_pdu(Bytes::new(), response_pdu(17, 2));
        assert_eq!(response.error_oid(), Some(&oid!(1, 3, 6, 1, 4, 1, 7779, 1, 0)));
        match response.check() {
            Err(Error::Snmp { status, index, oid }) => {
                assert_eq!(status, ErrorStatus::NotWritable);
                assert_eq!(index, 2);
                assert_eq!(oid, Some(oid!(1, 3, 6, 1, 4, 1, 7779, 1, 0)));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_response_error_index_out_of_range() {
        let response = Response::from_pdu(Bytes::new(), response_pdu(5, 9));
        assert_eq!(response.error_oid(), None);
        let response = Response::from_pdu(Bytes::new(), response_pdu(5, -1));
        assert_eq!(response.error_index, 0);
    }

    #[test]
    fn test_decode_notification() {
        let mut pdu = response_pdu(0, 0);
        pdu.pdu_type = PduType::TrapV2;
        let msg = CommunityMessage::v2c(Bytes::from_static(b"public"), pdu);
        match Incoming::decode(msg.encode()).unwrap() {
            Incoming::Notification(n) => {
                assert_eq!(n.kind, NotificationKind::TrapV2);
                assert_eq!(n.uptime(), Some(12345));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unhandled_pdu_skipped() {
        // A GET arriving from the gateway is not something the client handles.
        let msg = CommunityMessage::v2c(
            Bytes::from_static(b"public"),
            Pdu::get_request(1, &[oid!(1, 3, 6, 1)]),
        );
        assert_eq!(
            Incoming::decode(msg.encode()).unwrap(),
            Incoming::Unhandled {
                version: Version::V2c,
                pdu_tag: 0xA0
            }
        );

        // Unknown tag with arbitrary body
        let bytes = Bytes::from_static(&[
            0x30, 0x0A, 0x02, 0x01, 0x01, 0x04, 0x00, 0xBF, 0x03, 0x01, 0x02, 0x03,
        ]);
        assert!(matches!(
            Incoming::decode(bytes).unwrap(),
            Incoming::Unhandled { pdu_tag: 0xBF, .. }
        ));
    }

    #[test]
    fn test_unknown_version_classified() {
        // version 3, then a msgGlobalData SEQUENCE where a community would be
        let bytes = Bytes::from_static(&[
            0x30, 0x0A, 0x02, 0x01, 0x03, 0x30, 0x05, 0x02, 0x01, 0x01, 0x04, 0x00,
        ]);
        assert_eq!(
            Incoming::decode(bytes).unwrap(),
            Incoming::UnsupportedVersion { version: 3 }
        );

        // The strict message decoder still refuses it
        let bytes = CommunityMessage::new(
            Version::V2c,
            Bytes::from_static(b"public"),
            response_pdu(0, 0),
        )
        .encode();
        let mut raw = bytes.to_vec();
        raw[4] = 0x07;
        assert!(matches!(
            CommunityMessage::decode(Bytes::from(raw.clone())).unwrap_err().decode_kind(),
            Some(crate::error::DecodeErrorKind::UnknownVersion(7))
        ));
        assert_eq!(
            Incoming::decode(Bytes::from(raw)).unwrap(),
            Incoming::UnsupportedVersion { version: 7 }
        );
    }

    #[test]
    fn test_unsupported_value_fails_message() {
        // RESPONSE carrying a Counter32 (0x41) value
        let bytes = Bytes::from_static(&[
            0x30, 0x1A, 0x02, 0x01, 0x01, 0x04, 0x00, 0xA2, 0x13, 0x02, 0x01, 0x01, 0x02, 0x01,
            0x00, 0x02, 0x01, 0x00, 0x30, 0x08, 0x30, 0x06, 0x06, 0x01, 0x2B, 0x41, 0x01, 0x05,
        ]);
        let err = Incoming::decode(bytes).unwrap_err();
        assert_eq!(
            err.decode_kind(),
            Some(crate::error::DecodeErrorKind::UnsupportedTag(0x41))
        );
    }
}
