//! Stream reassembly.
//!
//! A stream transport delivers bytes in whatever chunks the network produced.
//! [`ReceiveBuffer`] accumulates them and cuts complete SNMP messages out
//! using the outer SEQUENCE's BER length; no extra framing is involved.
//!
//! ```text
//! +------+--------+------------+
//! | 0x30 | Length |  Content   |
//! +------+--------+------------+
//!   Tag   1-5 bytes  N bytes
//! ```
//!
//! A frame that fails to decode stays at the head of the buffer. There is no
//! resynchronisation: every later `feed` stops on the same bytes until the
//! connection is torn down.

use bytes::{Buf, BytesMut};

use crate::ber::peek_header;
use crate::error::{Error, Result};
use crate::message::Incoming;

/// Default initial capacity of the receive buffer.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 8 * 1024;

/// Default limit on buffered bytes.
///
/// Real SNMP messages are a few hundred bytes to a few KB; this only stops a
/// peer that claims or sends an enormous message.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 10 * 1024 * 1024;

/// Result of one [`ReceiveBuffer::feed`] pass.
#[derive(Debug, Default)]
pub struct Drained {
    /// Messages completed by this pass, in arrival order
    pub messages: Vec<Incoming>,
    /// The decode failure that stopped the pass, if any
    pub error: Option<Error>,
}

/// Accumulates stream fragments and yields complete messages.
#[derive(Debug)]
pub struct ReceiveBuffer {
    buf: BytesMut,
    max_message_size: usize,
}

impl ReceiveBuffer {
    /// Create a buffer with default capacity and limit.
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_READ_BUFFER_SIZE, DEFAULT_MAX_MESSAGE_SIZE)
    }

    /// Create a buffer with the given initial capacity and size limit.
    pub fn with_limits(capacity: usize, max_message_size: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
            max_message_size,
        }
    }

    /// Bytes waiting for the rest of their message (or stuck on a bad one).
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Drop everything buffered.
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Append a fragment and decode every message it completes.
    ///
    /// Decode failures are reported in [`Drained::error`] alongside whatever
    /// decoded before them. `Err` is only returned when the buffer limit is
    /// exceeded, which the caller should treat as fatal for the connection.
    pub fn feed(&mut self, fragment: &[u8]) -> Result<Drained> {
        self.buf.extend_from_slice(fragment);
        let mut drained = Drained::default();

        while !self.buf.is_empty() {
            let (header_len, content_len) = match peek_header(&self.buf) {
                Ok(Some(header)) => header,
                Ok(None) => {
                    tracing::trace!(target: "snmp_stream::reassembly", { buffered = self.buf.len() }, "incomplete header");
                    break;
                }
                Err(e) => {
                    drained.error = Some(e);
                    break;
                }
            };

            let frame_len = header_len + content_len;
            if frame_len > self.max_message_size {
                return Err(Error::MessageTooLarge {
                    size: frame_len,
                    max: self.max_message_size,
                });
            }
            if self.buf.len() < frame_len {
                tracing::trace!(target: "snmp_stream::reassembly", { buffered = self.buf.len(), frame_len }, "incomplete frame");
                break;
            }

            let frame = self.buf.split_to(frame_len).freeze();
            match Incoming::decode(frame.clone()) {
                Ok(msg) => drained.messages.push(msg),
                Err(e) => {
                    // Put the frame back so the buffer still starts at it.
                    let mut restored = BytesMut::with_capacity(frame.len() + self.buf.len());
                    restored.extend_from_slice(&frame);
                    restored.extend_from_slice(&self.buf);
                    self.buf = restored;
                    drained.error = Some(e);
                    break;
                }
            }
        }

        if self.buf.len() > self.max_message_size {
            return Err(Error::MessageTooLarge {
                size: self.buf.len(),
                max: self.max_message_size,
            });
        }

        if !drained.messages.is_empty() {
            tracing::trace!(target: "snmp_stream::reassembly", { count = drained.messages.len(), remaining = self.buf.len() }, "drained messages");
        }
        Ok(drained)
    }

    /// Skip `n` bytes at the head of the buffer.
    ///
    /// Hosts that can identify garbage on their own may use this to get past
    /// a frame that keeps failing; the client itself never does.
    pub fn discard(&mut self, n: usize) {
        let n = n.min(self.buf.len());
        self.buf.advance(n);
    }
}

impl Default for ReceiveBuffer {
    fn default() -> Self {
        Self::new()
    }
}
