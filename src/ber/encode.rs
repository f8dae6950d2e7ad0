//! BER encoding.
//!
//! [`EncodeBuf`] builds a message back to front. Each element's content is
//! pushed first; the tag and length are prepended once the content length is
//! known, so constructed types never need a second pass or a reserved header.
//! Because of that, callers push the *last* field of a structure first.
//!
//! ```
//! use snmp_stream::ber::EncodeBuf;
//!
//! let mut buf = EncodeBuf::new();
//! buf.push_sequence(|buf| {
//!     buf.push_integer(2);
//!     buf.push_integer(1);
//! });
//! assert_eq!(&buf.finish()[..], &[0x30, 0x06, 0x02, 0x01, 0x01, 0x02, 0x01, 0x02]);
//! ```

use super::length::encode_length;
use super::tag;
use crate::oid::Oid;
use bytes::Bytes;

/// Reverse-building BER encoder.
#[derive(Debug, Default)]
pub struct EncodeBuf {
    // Stored back to front; reversed by `finish`.
    buf: Vec<u8>,
}

impl EncodeBuf {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::with_capacity(128)
    }

    /// Create an empty buffer with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Finish encoding and return the bytes in wire order.
    pub fn finish(mut self) -> Bytes {
        self.buf.reverse();
        Bytes::from(self.buf)
    }

    /// Prepend a single tag byte.
    pub fn push_tag(&mut self, tag: u8) {
        self.buf.push(tag);
    }

    /// Prepend a definite-form length.
    pub fn push_length(&mut self, len: usize) {
        let (bytes, n) = encode_length(len);
        // encode_length already returns the octets reversed
        self.buf.extend_from_slice(&bytes[..n]);
    }

    /// Prepend raw bytes, preserving their order on the wire.
    pub fn push_bytes(&mut self, data: &[u8]) {
        self.buf.extend(data.iter().rev());
    }

    /// Prepend a complete INTEGER TLV.
    ///
    /// Two's complement, minimal length. Zero is one content octet.
    pub fn push_integer(&mut self, value: i32) {
        let bytes = value.to_be_bytes();
        let mut start = 0;
        // Drop redundant leading 0x00/0xFF octets while the sign bit survives.
        while start < 3 {
            let (lead, next) = (bytes[start], bytes[start + 1]);
            if (lead == 0x00 && next & 0x80 == 0) || (lead == 0xFF && next & 0x80 != 0) {
                start += 1;
            } else {
                break;
            }
        }
        let content = &bytes[start..];
        self.push_bytes(content);
        self.push_length(content.len());
        self.push_tag(tag::universal::INTEGER);
    }

    /// Prepend a Counter64 TLV.
    pub fn push_integer64(&mut self, value: u64) {
        let len = self.push_unsigned_content(&value.to_be_bytes());
        self.push_length(len);
        self.push_tag(tag::application::COUNTER64);
    }

    /// Prepend an unsigned 32-bit value with the given application tag
    /// (TimeTicks here).
    pub fn push_unsigned32(&mut self, tag: u8, value: u32) {
        let len = self.push_unsigned_content(&value.to_be_bytes());
        self.push_length(len);
        self.push_tag(tag);
    }

    /// Minimal unsigned content: leading zero octets removed, one 0x00 added
    /// back when the top bit would otherwise read as a sign.
    fn push_unsigned_content(&mut self, be: &[u8]) -> usize {
        let first = be
            .iter()
            .position(|&b| b != 0)
            .unwrap_or(be.len() - 1);
        let content = &be[first..];
        self.push_bytes(content);
        if content[0] & 0x80 != 0 {
            self.buf.push(0x00);
            content.len() + 1
        } else {
            content.len()
        }
    }

    /// Prepend an OCTET STRING TLV.
    pub fn push_octet_string(&mut self, data: &[u8]) {
        self.push_bytes(data);
        self.push_length(data.len());
        self.push_tag(tag::universal::OCTET_STRING);
    }

    /// Prepend a NULL TLV.
    pub fn push_null(&mut self) {
        self.push_length(0);
        self.push_tag(tag::universal::NULL);
    }

    /// Prepend an OBJECT IDENTIFIER TLV.
    pub fn push_oid(&mut self, oid: &Oid) {
        let content = oid.to_ber_smallvec();
        self.push_bytes(&content);
        self.push_length(content.len());
        self.push_tag(tag::universal::OBJECT_IDENTIFIER);
    }

    /// Prepend a SEQUENCE whose content is written by `f`.
    ///
    /// Inside `f`, push the sequence's elements last to first.
    pub fn push_sequence(&mut self, f: impl FnOnce(&mut Self)) {
        self.push_constructed(tag::universal::SEQUENCE, f);
    }

    /// Prepend a constructed element with an arbitrary tag.
    pub fn push_constructed(&mut self, tag: u8, f: impl FnOnce(&mut Self)) {
        let before = self.buf.len();
        f(self);
        let content_len = self.buf.len() - before;
        self.push_length(content_len);
        self.push_tag(tag);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(f: impl FnOnce(&mut EncodeBuf)) -> Vec<u8> {
        let mut buf = EncodeBuf::new();
        f(&mut buf);
        buf.finish().to_vec()
    }

    #[test]
    fn test_integer_zero_is_one_octet() {
        assert_eq!(encode(|b| b.push_integer(0)), [0x02, 0x01, 0x00]);
    }

    #[test]
    fn test_integer_minimal() {
        assert_eq!(encode(|b| b.push_integer(127)), [0x02, 0x01, 0x7F]);
        assert_eq!(encode(|b| b.push_integer(128)), [0x02, 0x02, 0x00, 0x80]);
        assert_eq!(encode(|b| b.push_integer(256)), [0x02, 0x02, 0x01, 0x00]);
        assert_eq!(encode(|b| b.push_integer(-1)), [0x02, 0x01, 0xFF]);
        assert_eq!(encode(|b| b.push_integer(-128)), [0x02, 0x01, 0x80]);
        assert_eq!(encode(|b| b.push_integer(-129)), [0x02, 0x02, 0xFF, 0x7F]);
        assert_eq!(
            encode(|b| b.push_integer(i32::MAX)),
            [0x02, 0x04, 0x7F, 0xFF, 0xFF, 0xFF]
        );
        assert_eq!(
            encode(|b| b.push_integer(i32::MIN)),
            [0x02, 0x04, 0x80, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn test_counter64() {
        assert_eq!(encode(|b| b.push_integer64(0)), [0x46, 0x01, 0x00]);
        assert_eq!(encode(|b| b.push_integer64(0x80)), [0x46, 0x02, 0x00, 0x80]);
        let mut expected = vec![0x46, 0x09, 0x00];
        expected.extend_from_slice(&[0xFF; 8]);
        assert_eq!(encode(|b| b.push_integer64(u64::MAX)), expected);
    }

    #[test]
    fn test_timeticks() {
        assert_eq!(
            encode(|b| b.push_unsigned32(tag::application::TIMETICKS, 12345)),
            [0x43, 0x02, 0x30, 0x39]
        );
        assert_eq!(
            encode(|b| b.push_unsigned32(tag::application::TIMETICKS, u32::MAX)),
            [0x43, 0x05, 0x00, 0xFF, 0xFF, 0xFF, 0xFF]
        );
    }

    #[test]
    fn test_octet_string_and_null() {
        assert_eq!(
            encode(|b| b.push_octet_string(b"public")),
            [0x04, 0x06, b'p', b'u', b'b', b'l', b'i', b'c']
        );
        assert_eq!(encode(|b| b.push_null()), [0x05, 0x00]);
    }

    #[test]
    fn test_oid() {
        let oid = Oid::from_slice(&[1, 3, 6, 1, 2, 1, 1, 3, 0]);
        assert_eq!(
            encode(|b| b.push_oid(&oid)),
            [0x06, 0x08, 0x2B, 0x06, 0x01, 0x02, 0x01, 0x01, 0x03, 0x00]
        );
    }

    #[test]
    fn test_sequence_wrapping_size() {
        for k in [0usize, 1, 127, 128, 255, 256, 1000] {
            let inner = vec![0xABu8; k];
            let out = encode(|b| b.push_sequence(|b| b.push_bytes(&inner)));
            let (len_bytes, n) = encode_length(k);
            assert_eq!(out.len(), k + 1 + n, "k={}", k);
            assert_eq!(out[0], 0x30);
            let mut header: Vec<u8> = len_bytes[..n].to_vec();
            header.reverse();
            assert_eq!(&out[1..1 + n], &header[..]);
            assert_eq!(&out[1 + n..], &inner[..]);
        }
    }

    #[test]
    fn test_long_form_sequence_header() {
        let inner = vec![0u8; 128];
        let out = encode(|b| b.push_sequence(|b| b.push_bytes(&inner)));
        assert_eq!(&out[..3], &[0x30, 0x81, 0x80]);

        let inner = vec![0u8; 256];
        let out = encode(|b| b.push_sequence(|b| b.push_bytes(&inner)));
        assert_eq!(&out[..4], &[0x30, 0x82, 0x01, 0x00]);
    }

    #[test]
    fn test_constructed_empty() {
        assert_eq!(
            encode(|b| b.push_constructed(tag::pdu::SUBSCRIBE, |_| {})),
            [0xAA, 0x00]
        );
    }

    #[test]
    fn test_fields_pushed_in_reverse() {
        let out = encode(|b| {
            b.push_sequence(|b| {
                b.push_octet_string(b"x");
                b.push_integer(1);
            })
        });
        assert_eq!(out, [0x30, 0x06, 0x02, 0x01, 0x01, 0x04, 0x01, b'x']);
    }
}
