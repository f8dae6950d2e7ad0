//! Mock transport for testing.
//!
//! Records what the client sends and lets tests inject send failures or a
//! closed state without a real connection. Inbound traffic is simulated by
//! feeding bytes built with [`ResponseBuilder`] or [`NotificationBuilder`] to
//! the client's [`Inbound`](crate::client::Inbound).

use super::Transport;
use crate::error::{Error, Result};
use crate::message::CommunityMessage;
use crate::oid::Oid;
use crate::pdu::{Pdu, PduType};
use crate::value::Value;
use crate::varbind::VarBind;
use crate::version::Version;
use bytes::Bytes;
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

/// A message sent through the mock transport.
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    /// The raw message bytes
    pub data: Bytes,
    /// The decoded message, if it decoded
    pub message: Option<CommunityMessage>,
}

impl RecordedRequest {
    /// Request ID of the recorded PDU.
    pub fn request_id(&self) -> Option<i32> {
        self.message.as_ref().map(|m| m.pdu.request_id)
    }

    /// PDU type of the recorded message.
    pub fn pdu_type(&self) -> Option<PduType> {
        self.message.as_ref().map(|m| m.pdu.pdu_type)
    }
}

struct MockTransportInner {
    target: Option<SocketAddr>,
    open: bool,
    requests: Vec<RecordedRequest>,
    send_errors: VecDeque<String>,
    closes: usize,
}

/// Mock transport for testing client functionality.
///
/// # Example
///
/// ```rust
/// use snmp_stream::transport::{MockTransport, Transport};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let mock = MockTransport::new();
/// mock.send(bytes::Bytes::from_static(&[0x30, 0x00])).await.unwrap();
/// assert_eq!(mock.requests().len(), 1);
///
/// mock.set_open(false);
/// assert!(!mock.is_open());
/// # }
/// ```
#[derive(Clone)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

impl MockTransport {
    /// Create an open mock transport.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockTransportInner {
                target: None,
                open: true,
                requests: Vec::new(),
                send_errors: VecDeque::new(),
                closes: 0,
            })),
        }
    }

    /// Create a mock that reports a peer address.
    pub fn with_peer(target: SocketAddr) -> Self {
        let mock = Self::new();
        mock.inner.lock().unwrap().target = Some(target);
        mock
    }

    /// Force the open state.
    pub fn set_open(&self, open: bool) {
        self.inner.lock().unwrap().open = open;
    }

    /// Make the next send fail with an I/O error.
    pub fn queue_send_error(&self, msg: impl Into<String>) {
        self.inner.lock().unwrap().send_errors.push_back(msg.into());
    }

    /// Every message sent so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.inner.lock().unwrap().requests.clone()
    }

    /// The most recent message sent.
    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.inner.lock().unwrap().requests.last().cloned()
    }

    /// Clear recorded requests.
    pub fn clear_requests(&self) {
        self.inner.lock().unwrap().requests.clear();
    }

    /// How many times `close` was called.
    pub fn close_count(&self) -> usize {
        self.inner.lock().unwrap().closes
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for MockTransport {
    async fn send(&self, data: Bytes) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.open {
            return Err(Error::IllegalState {
                reason: "transport is closed",
            });
        }
        if let Some(msg) = inner.send_errors.pop_front() {
            return Err(Error::io(inner.target, std::io::Error::other(msg)));
        }
        let message = CommunityMessage::decode(data.clone()).ok();
        inner.requests.push(RecordedRequest { data, message });
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.inner.lock().unwrap().open
    }

    async fn close(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.open = false;
        inner.closes += 1;
    }

    fn peer_addr(&self) -> Option<SocketAddr> {
        self.inner.lock().unwrap().target
    }
}

/// Builder for SNMP response messages in tests.
pub struct ResponseBuilder {
    request_id: i32,
    varbinds: Vec<VarBind>,
    error_status: i32,
    error_index: i32,
}

impl ResponseBuilder {
    /// Create a new response builder with the given request ID.
    pub fn new(request_id: i32) -> Self {
        Self {
            request_id,
            varbinds: Vec::new(),
            error_status: 0,
            error_index: 0,
        }
    }

    /// Add a varbind to the response.
    pub fn varbind(mut self, oid: Oid, value: Value) -> Self {
        self.varbinds.push(VarBind::new(oid, value));
        self
    }

    /// Set the error status.
    pub fn error_status(mut self, status: i32) -> Self {
        self.error_status = status;
        self
    }

    /// Set the error index.
    pub fn error_index(mut self, index: i32) -> Self {
        self.error_index = index;
        self
    }

    /// Build a v2c response message.
    pub fn build_v2c(self, community: &[u8]) -> Bytes {
        let pdu = Pdu {
            pdu_type: PduType::Response,
            request_id: self.request_id,
            error_status: self.error_status,
            error_index: self.error_index,
            varbinds: self.varbinds,
        };
        CommunityMessage::new(Version::V2c, Bytes::copy_from_slice(community), pdu).encode()
    }
}

/// Builder for TRAP-V2 and INFORM messages in tests.
///
/// Starts with the sysUpTime.0 and snmpTrapOID.0 varbinds every v2c
/// notification carries.
pub struct NotificationBuilder {
    pdu_type: PduType,
    request_id: i32,
    varbinds: Vec<VarBind>,
}

impl NotificationBuilder {
    /// A TRAP-V2 with the given uptime and trap OID.
    pub fn trap(request_id: i32, uptime: u32, trap_oid: Oid) -> Self {
        Self::with_type(PduType::TrapV2, request_id, uptime, trap_oid)
    }

    /// An INFORM with the given uptime and trap OID.
    pub fn inform(request_id: i32, uptime: u32, trap_oid: Oid) -> Self {
        Self::with_type(PduType::InformRequest, request_id, uptime, trap_oid)
    }

    fn with_type(pdu_type: PduType, request_id: i32, uptime: u32, trap_oid: Oid) -> Self {
        use crate::notification::oids;
        Self {
            pdu_type,
            request_id,
            varbinds: vec![
                VarBind::new(oids::sys_uptime(), Value::TimeTicks(uptime)),
                VarBind::new(oids::snmp_trap_oid(), Value::ObjectIdentifier(trap_oid)),
            ],
        }
    }

    /// Add a payload varbind.
    pub fn varbind(mut self, oid: Oid, value: Value) -> Self {
        self.varbinds.push(VarBind::new(oid, value));
        self
    }

    /// Build a v2c notification message.
    pub fn build_v2c(self, community: &[u8]) -> Bytes {
        let pdu = Pdu {
            pdu_type: self.pdu_type,
            request_id: self.request_id,
            error_status: 0,
            error_index: 0,
            varbinds: self.varbinds,
        };
        CommunityMessage::new(Version::V2c, Bytes::copy_from_slice(community), pdu).encode()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Incoming;
    use crate::notification::NotificationKind;
    use crate::oid;

    #[tokio::test]
    async fn test_mock_transport_records_requests() {
        let mock = MockTransport::new();
        let get = CommunityMessage::v2c(
            Bytes::from_static(b"public"),
            Pdu::get_request(7, &[oid!(1, 3, 6, 1)]),
        );

        mock.send(get.encode()).await.unwrap();
        mock.send(Bytes::from_static(b"junk")).await.unwrap();

        let requests = mock.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].request_id(), Some(7));
        assert_eq!(requests[0].pdu_type(), Some(PduType::GetRequest));
        assert!(requests[1].message.is_none());
    }

    #[tokio::test]
    async fn test_mock_transport_send_error() {
        let mock = MockTransport::with_peer("127.0.0.1:3000".parse().unwrap());
        mock.queue_send_error("broken pipe");

        let err = mock.send(Bytes::from_static(&[0x30, 0x00])).await.unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
        assert_eq!(err.target(), mock.peer_addr());
        assert!(mock.requests().is_empty());

        mock.send(Bytes::from_static(&[0x30, 0x00])).await.unwrap();
    }

    #[tokio::test]
    async fn test_mock_transport_close() {
        let mock = MockTransport::new();
        mock.close().await;
        assert!(!mock.is_open());
        assert_eq!(mock.close_count(), 1);
        assert!(mock.send(Bytes::new()).await.is_err());
    }

    #[test]
    fn test_builders_decode() {
        let bytes = ResponseBuilder::new(3)
            .varbind(oid!(1, 3, 6, 1, 2, 1, 1, 3, 0), Value::TimeTicks(1))
            .error_status(2)
            .error_index(1)
            .build_v2c(b"public");
        match Incoming::decode(bytes).unwrap() {
            Incoming::Response(r) => {
                assert_eq!(r.request_id, 3);
                assert_eq!(r.error_index, 1);
            }
            other => panic!("unexpected {:?}", other),
        }

        let bytes = NotificationBuilder::inform(4, 100, oid!(1, 3, 6, 1, 4, 1, 7779, 0, 1))
            .varbind(oid!(1, 3, 6, 1, 4, 1, 7779, 3, 1), Value::Integer(1))
            .build_v2c(b"public");
        match Incoming::decode(bytes).unwrap() {
            Incoming::Notification(n) => {
                assert_eq!(n.kind, NotificationKind::Inform);
                assert_eq!(n.varbinds.len(), 3);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
