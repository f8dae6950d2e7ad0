//! BER (Basic Encoding Rules) codec for the SNMP subset this crate speaks.
//!
//! - [`EncodeBuf`] builds messages back to front
//! - [`Decoder`] is a zero-copy cursor over [`bytes::Bytes`]
//! - [`tag`] holds the tag constants, including the two gateway PDU extensions

mod decode;
mod encode;
mod length;
pub mod tag;

pub use decode::Decoder;
pub use encode::EncodeBuf;
pub use length::{MAX_LENGTH, decode_length, encode_length, encoded_length_len, peek_header};
