//! Wire-format tests against hand-assembled byte vectors.

use bytes::Bytes;
use snmp_stream::ber::{Decoder, EncodeBuf, encode_length};
use snmp_stream::message::{CommunityMessage, Incoming};
use snmp_stream::pdu::{Pdu, PduType};
use snmp_stream::transport::{MockTransport, ResponseBuilder};
use snmp_stream::{Client, ClientConfig, DecodeErrorKind, Error, Value, oid};

fn wire_length(len: usize) -> Vec<u8> {
    let (bytes, n) = encode_length(len);
    bytes[..n].iter().rev().copied().collect()
}

#[test]
fn short_form_lengths() {
    for len in 0..=127usize {
        assert_eq!(wire_length(len), vec![len as u8]);
    }
}

#[test]
fn long_form_lengths() {
    assert_eq!(wire_length(128), vec![0x81, 0x80]);
    assert_eq!(wire_length(255), vec![0x81, 0xFF]);
    assert_eq!(wire_length(256), vec![0x82, 0x01, 0x00]);
    assert_eq!(wire_length(0x01_0000), vec![0x83, 0x01, 0x00, 0x00]);
}

#[test]
fn integer_encoding() {
    let cases: &[(i32, &[u8])] = &[
        (0, &[0x02, 0x01, 0x00]),
        (127, &[0x02, 0x01, 0x7F]),
        (128, &[0x02, 0x02, 0x00, 0x80]),
        (-1, &[0x02, 0x01, 0xFF]),
        (-129, &[0x02, 0x02, 0xFF, 0x7F]),
    ];
    for (value, expected) in cases {
        let mut buf = EncodeBuf::new();
        buf.push_integer(*value);
        assert_eq!(&buf.finish()[..], *expected, "encoding {}", value);
    }
}

#[test]
fn sequence_wraps_contents() {
    let mut buf = EncodeBuf::new();
    buf.push_sequence(|buf| {
        buf.push_integer(0);
        buf.push_null();
    });
    assert_eq!(&buf.finish()[..], &[0x30, 0x05, 0x02, 0x01, 0x00, 0x05, 0x00]);
}

#[test]
fn set_integer_zero_message() {
    let pdu = Pdu::set_request(1, oid!(1, 3, 6, 1, 4, 1, 7779, 3, 1, 1, 5, 0), Value::Integer(0));
    let bytes = CommunityMessage::v2c(Bytes::from_static(b"public"), pdu).encode();

    #[rustfmt::skip]
    let expected: &[u8] = &[
        0x30, 0x2B,
            0x02, 0x01, 0x01,                                   // version 1 (v2c)
            0x04, 0x06, b'p', b'u', b'b', b'l', b'i', b'c',     // community
            0xA3, 0x1E,                                         // SET
                0x02, 0x01, 0x01,                               // request-id
                0x02, 0x01, 0x00,                               // error-status
                0x02, 0x01, 0x00,                               // error-index
                0x30, 0x13,
                    0x30, 0x11,
                        0x06, 0x0C, 0x2B, 0x06, 0x01, 0x04, 0x01, 0xBC, 0x63, 0x03, 0x01, 0x01, 0x05, 0x00,
                        0x02, 0x01, 0x00,
    ];
    assert_eq!(&bytes[..], expected);
}

#[test]
fn subscribe_has_empty_body() {
    let bytes = CommunityMessage::v2c(Bytes::from_static(b"public"), Pdu::subscribe()).encode();
    assert_eq!(&bytes[bytes.len() - 2..], &[0xAA, 0x00]);

    let decoded = CommunityMessage::decode(bytes).unwrap();
    assert_eq!(decoded.pdu.pdu_type, PduType::Subscribe);
}

#[test]
fn oid_arcs_with_continuation_bytes() {
    // 7779 = 0x1E63 -> 0xBC 0x63; 2^32-1 needs five octets
    let oid = oid!(1, 3, 6, 1, 4, 1, 7779, 4294967295);
    let encoded = oid.to_ber();
    assert_eq!(
        encoded,
        vec![0x2B, 0x06, 0x01, 0x04, 0x01, 0xBC, 0x63, 0x8F, 0xFF, 0xFF, 0xFF, 0x7F]
    );
    assert_eq!(snmp_stream::Oid::from_ber(&encoded).unwrap(), oid);
}

#[test]
fn response_values_decode() {
    let bytes = ResponseBuilder::new(7)
        .varbind(oid!(1, 3, 6, 1, 2, 1, 1, 1, 0), Value::OctetString(Bytes::from_static(b"gw")))
        .varbind(oid!(1, 3, 6, 1, 2, 1, 1, 3, 0), Value::TimeTicks(4_000_000_000))
        .varbind(oid!(1, 3, 6, 1, 2, 1, 31, 1, 1, 1, 6, 1), Value::Counter64(u64::MAX))
        .varbind(oid!(1, 3, 6, 1, 2, 1, 1, 9, 0), Value::NoSuchInstance)
        .build_v2c(b"public");

    let Incoming::Response(response) = Incoming::decode(bytes).unwrap() else {
        panic!("expected response");
    };
    assert_eq!(response.request_id, 7);
    assert_eq!(response.values.len(), 4);
    assert_eq!(
        response.get(&oid!(1, 3, 6, 1, 2, 1, 1, 3, 0)),
        Some(&Value::TimeTicks(4_000_000_000))
    );
    assert_eq!(
        response.get(&oid!(1, 3, 6, 1, 2, 1, 31, 1, 1, 1, 6, 1)),
        Some(&Value::Counter64(u64::MAX))
    );
    assert_eq!(
        response.get(&oid!(1, 3, 6, 1, 2, 1, 1, 9, 0)),
        Some(&Value::NoSuchInstance)
    );
}

#[test]
fn negative_integer_decodes_signed() {
    let mut decoder = Decoder::new(Bytes::from_static(&[0x02, 0x02, 0xFF, 0x7F]));
    assert_eq!(decoder.read_integer().unwrap(), -129);
}

#[test]
fn padded_request_id_still_matches() {
    #[rustfmt::skip]
    let bytes: &[u8] = &[
        0x30, 0x1C,
            0x02, 0x01, 0x01,
            0x04, 0x06, b'p', b'u', b'b', b'l', b'i', b'c',
            0xA2, 0x0F,
                0x02, 0x05, 0x00, 0x00, 0x00, 0x00, 0x05,       // request-id, five octets
                0x02, 0x01, 0x00,
                0x02, 0x01, 0x00,
                0x30, 0x00,
    ];
    let Incoming::Response(response) = Incoming::decode(Bytes::from_static(bytes)).unwrap() else {
        panic!("expected response");
    };
    assert_eq!(response.request_id, 5);
}

#[test]
fn indefinite_length_rejected() {
    let err = Incoming::decode(Bytes::from_static(&[0x30, 0x80, 0x00, 0x00])).unwrap_err();
    assert_eq!(err.decode_kind(), Some(DecodeErrorKind::IndefiniteLength));
}

#[test]
fn decode_error_reports_offset() {
    // Version INTEGER with zero length at offset 2
    let err = Incoming::decode(Bytes::from_static(&[0x30, 0x02, 0x02, 0x00])).unwrap_err();
    assert!(matches!(
        err,
        Error::Decode {
            offset: 4,
            kind: DecodeErrorKind::ZeroLengthInteger
        }
    ));
}

/// A GET for sysUpTime.0 from request to parsed response.
#[tokio::test]
async fn sys_uptime_get() {
    let mock = MockTransport::new();
    let client = Client::new(mock.clone(), ClientConfig::default());
    let mut inbound = client.inbound();

    let task = {
        let client = client.clone();
        tokio::spawn(async move { client.get(&[oid!(1, 3, 6, 1, 2, 1, 1, 3, 0)]).await })
    };
    while mock.requests().is_empty() {
        tokio::task::yield_now().await;
    }

    #[rustfmt::skip]
    let expected_request: &[u8] = &[
        0x30, 0x26,
            0x02, 0x01, 0x01,
            0x04, 0x06, b'p', b'u', b'b', b'l', b'i', b'c',
            0xA0, 0x19,
                0x02, 0x01, 0x01,
                0x02, 0x01, 0x00,
                0x02, 0x01, 0x00,
                0x30, 0x0E,
                    0x30, 0x0C,
                        0x06, 0x08, 0x2B, 0x06, 0x01, 0x02, 0x01, 0x01, 0x03, 0x00,
                        0x05, 0x00,
    ];
    assert_eq!(&mock.last_request().unwrap().data[..], expected_request);

    #[rustfmt::skip]
    let response: &[u8] = &[
        0x30, 0x29,
            0x02, 0x01, 0x01,
            0x04, 0x06, b'p', b'u', b'b', b'l', b'i', b'c',
            0xA2, 0x1C,
                0x02, 0x01, 0x01,
                0x02, 0x01, 0x00,
                0x02, 0x01, 0x00,
                0x30, 0x11,
                    0x30, 0x0F,
                        0x06, 0x08, 0x2B, 0x06, 0x01, 0x02, 0x01, 0x01, 0x03, 0x00,
                        0x43, 0x03, 0x01, 0xE2, 0x40,
    ];
    inbound.on_fragment(response).await.unwrap();

    let response = task.await.unwrap().unwrap();
    assert!(!response.is_error());
    assert_eq!(
        response.get(&oid!(1, 3, 6, 1, 2, 1, 1, 3, 0)),
        Some(&Value::TimeTicks(123_456))
    );
}
