//! Definite-form BER lengths (X.690 8.1.3).
//!
//! Lengths up to 127 take one octet. Longer ones take a count octet
//! (`0x80 | n`) and `n` big-endian octets, at most four here. The
//! indefinite form `0x80` never appears in SNMP and is refused.

use crate::error::{DecodeErrorKind, Error, Result};

/// Largest content length a single TLV may declare.
///
/// GET-SUBTREE replies from the gateway reach a few hundred kilobytes, so
/// anything over 2 MiB is taken as garbage rather than buffered.
pub const MAX_LENGTH: usize = 2 * 1024 * 1024;

/// Encode `len` for [`EncodeBuf`](super::EncodeBuf), which builds back to front.
///
/// The returned octets are reversed: `buf[..n]` is the wire form read from
/// the end. Always minimal.
pub fn encode_length(len: usize) -> ([u8; 5], usize) {
    let mut buf = [0u8; 5];
    if len < 0x80 {
        buf[0] = len as u8;
        return (buf, 1);
    }

    let mut rest = len;
    let mut n = 0;
    while rest != 0 && n < 4 {
        buf[n] = rest as u8;
        rest >>= 8;
        n += 1;
    }
    buf[n] = 0x80 | n as u8;
    (buf, n + 1)
}

/// Decode the length octets at the start of `data`.
///
/// Returns the content length and how many octets the length took. Error
/// offsets are `base_offset`, the position of `data` in the whole message.
/// Non-minimal long forms are accepted.
pub fn decode_length(data: &[u8], base_offset: usize) -> Result<(usize, usize)> {
    let fail = |kind: DecodeErrorKind| Error::decode(base_offset, kind);

    let Some(&first) = data.first() else {
        return Err(fail(DecodeErrorKind::TruncatedData));
    };
    let octets = match first {
        0x00..=0x7F => return Ok((first as usize, 1)),
        0x80 => return Err(fail(DecodeErrorKind::IndefiniteLength)),
        _ => (first & 0x7F) as usize,
    };
    if octets > 4 {
        return Err(fail(DecodeErrorKind::LengthTooLong { octets }));
    }

    let digits = data
        .get(1..=octets)
        .ok_or_else(|| fail(DecodeErrorKind::TruncatedData))?;
    let len = digits
        .iter()
        .fold(0usize, |acc, &b| (acc << 8) | b as usize);
    if len > MAX_LENGTH {
        return Err(fail(DecodeErrorKind::LengthExceedsMax {
            length: len,
            max: MAX_LENGTH,
        }));
    }
    Ok((len, 1 + octets))
}

/// Number of octets `encode_length` produces for `len`.
pub fn encoded_length_len(len: usize) -> usize {
    encode_length(len).1
}

/// Inspect the TLV header at the start of `data` without consuming it.
///
/// Returns `Ok(None)` if the header itself is not complete yet, otherwise
/// `(header_len, content_len)`. Used by the stream reassembler to find frame
/// boundaries before attempting a full decode.
pub fn peek_header(data: &[u8]) -> Result<Option<(usize, usize)>> {
    if data.len() < 2 {
        return Ok(None);
    }
    match decode_length(&data[1..], 1) {
        Ok((len, consumed)) => Ok(Some((1 + consumed, len))),
        Err(e) if e.decode_kind().is_some_and(|k| k.is_truncation()) => Ok(None),
        Err(e) => Err(e),
    }
}
