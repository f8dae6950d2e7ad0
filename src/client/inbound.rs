//! Inbound message handling.
//!
//! [`Inbound`] turns raw fragments into dispatched messages: responses go to
//! their waiters, notifications to the subscriber, anything else is logged
//! and dropped. INFORM acknowledgments are queued to a writer task so the
//! reader never waits on the send path.

use std::sync::Arc;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;

use super::correlator::Correlator;
use crate::error::Result;
use crate::message::Incoming;
use crate::notification::Notification;
use crate::transport::{AckChannel, ReceiveBuffer, StreamTransport, Transport};

/// Receive side of a client connection.
///
/// One `Inbound` serves one connection; `on_fragment` takes `&mut self`, so
/// fragments are processed strictly in order.
pub struct Inbound {
    buffer: ReceiveBuffer,
    correlator: Arc<Correlator>,
    ack: Arc<dyn AckChannel>,
    // Started on the first INFORM; ends once this sender is dropped.
    ack_queue: Option<mpsc::UnboundedSender<(i32, Bytes)>>,
}

impl Inbound {
    pub(crate) fn new(
        correlator: Arc<Correlator>,
        ack: Arc<dyn AckChannel>,
        read_buffer_size: usize,
        max_message_size: usize,
    ) -> Self {
        Self {
            buffer: ReceiveBuffer::with_limits(read_buffer_size, max_message_size),
            correlator,
            ack,
            ack_queue: None,
        }
    }

    /// Feed one fragment received from the connection.
    ///
    /// A message that fails to decode is logged and stops processing of the
    /// rest of the buffer; it is not reported here. `Err` means the buffer
    /// limit was exceeded and the connection should be closed.
    pub async fn on_fragment(&mut self, fragment: &[u8]) -> Result<()> {
        let drained = self.buffer.feed(fragment)?;

        for msg in drained.messages {
            self.dispatch(msg);
        }

        if let Some(e) = drained.error {
            tracing::warn!(target: "snmp_stream::reassembly", { error = %e, buffered = self.buffer.buffered() }, "failed to decode message");
        }
        Ok(())
    }

    /// Bytes currently waiting in the receive buffer.
    pub fn buffered(&self) -> usize {
        self.buffer.buffered()
    }

    fn dispatch(&mut self, msg: Incoming) {
        match msg {
            Incoming::Response(response) => {
                tracing::trace!(target: "snmp_stream::client", { snmp.request_id = response.request_id, snmp.error_status = %response.error_status, snmp.varbind_count = response.values.len() }, "received response");
                self.correlator.dispatch_response(response);
            }
            Incoming::Notification(notification) => self.on_notification(notification),
            Incoming::Unhandled { version, pdu_tag } => {
                tracing::debug!(target: "snmp_stream::client", { snmp.version = %version, snmp.pdu_tag = pdu_tag }, "ignoring unhandled PDU type 0x{:02X}", pdu_tag);
            }
            Incoming::UnsupportedVersion { version } => {
                tracing::debug!(target: "snmp_stream::client", { snmp.version = version }, "ignoring message with unsupported version");
            }
        }
    }

    fn on_notification(&mut self, notification: Notification) {
        tracing::debug!(target: "snmp_stream::notification", { kind = %notification.kind, snmp.request_id = notification.request_id, trap_oid = ?notification.trap_oid() }, "received notification");

        if notification.is_confirmed() {
            let ack = notification.ack_message().encode();
            self.queue_ack(notification.request_id, ack);
        }

        self.correlator.dispatch_notification(notification);
    }

    fn queue_ack(&mut self, request_id: i32, ack: Bytes) {
        let queue = self.ack_queue.get_or_insert_with(|| {
            let (tx, rx) = mpsc::unbounded_channel();
            tokio::spawn(write_acks(self.ack.clone(), rx));
            tx
        });
        if queue.send((request_id, ack)).is_err() {
            tracing::warn!(target: "snmp_stream::notification", { snmp.request_id = request_id }, "ack writer gone, dropping inform acknowledgment");
        }
    }

    /// Read the connection until EOF, an I/O error, an oversize buffer, or
    /// the transport closing.
    ///
    /// On exit the transport is closed and every pending request is failed.
    pub(crate) async fn run<R>(
        mut self,
        mut reader: R,
        transport: StreamTransport,
        read_buffer_size: usize,
    ) where
        R: AsyncRead + Unpin,
    {
        let shutdown = transport.shutdown_token();
        let peer = transport.peer_addr();
        let mut buf = vec![0u8; read_buffer_size];

        loop {
            let read = tokio::select! {
                _ = shutdown.cancelled() => break,
                read = reader.read(&mut buf) => read,
            };
            match read {
                Ok(0) => {
                    tracing::debug!(target: "snmp_stream::transport", { snmp.target = ?peer }, "connection closed by peer");
                    break;
                }
                Ok(n) => {
                    tracing::trace!(target: "snmp_stream::transport", { snmp.target = ?peer, bytes = n }, "received fragment");
                    if let Err(e) = self.on_fragment(&buf[..n]).await {
                        tracing::warn!(target: "snmp_stream::transport", { snmp.target = ?peer, error = %e }, "closing connection");
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!(target: "snmp_stream::transport", { snmp.target = ?peer, error = %e }, "read failed");
                    break;
                }
            }
        }

        transport.close().await;
        self.correlator.clear();
    }
}

/// Drain queued acknowledgments in arrival order.
async fn write_acks(
    channel: Arc<dyn AckChannel>,
    mut queue: mpsc::UnboundedReceiver<(i32, Bytes)>,
) {
    while let Some((request_id, ack)) = queue.recv().await {
        match channel.send_ack(ack).await {
            Ok(()) => {
                tracing::trace!(target: "snmp_stream::notification", { snmp.request_id = request_id }, "sent inform acknowledgment");
            }
            Err(e) => {
                tracing::warn!(target: "snmp_stream::notification", { snmp.request_id = request_id, error = %e }, "failed to acknowledge inform");
            }
        }
    }
}

impl std::fmt::Debug for Inbound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Inbound")
            .field("buffered", &self.buffer.buffered())
            .field("correlator", &self.correlator)
            .finish()
    }
}
