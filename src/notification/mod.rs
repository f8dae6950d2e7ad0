//! Unsolicited notifications (TRAP-V2 and INFORM).
//!
//! After [`Client::subscribe_notifications`](crate::Client::subscribe_notifications)
//! the gateway pushes notifications over the same stream as responses.
//! They are delivered through [`Notifications`], a [`futures_core::Stream`].
//! INFORMs are acknowledged automatically; the ack is queued and does not
//! hold up delivery.
//!
//! Turning a trap OID into an application record (membership change,
//! session open/close, ...) is left to the caller; this module only exposes
//! the raw values and the well-known header fields.
//!
//! # Example
//!
//! ```rust,no_run
//! use snmp_stream::Client;
//! use snmp_stream::notification::oids;
//!
//! # async fn example() -> snmp_stream::Result<()> {
//! let client = Client::builder().connect("10.0.0.5:3000").await?;
//! let mut notifications = client.subscribe_notifications().await?;
//!
//! while let Some(n) = notifications.recv().await {
//!     println!("{} {:?} uptime={:?}", n.kind, n.trap_oid(), n.uptime());
//!     for (oid, value) in &n.values {
//!         println!("  {} = {}", oid, value);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use tokio::sync::mpsc;

use crate::message::CommunityMessage;
use crate::oid::Oid;
use crate::pdu::{Pdu, PduType};
use crate::value::{Value, latin1};
use crate::varbind::{VarBind, into_value_map};
use crate::version::Version;

/// Well-known OIDs for notification varbinds.
pub mod oids {
    use crate::oid;

    /// sysUpTime.0 - first varbind in v2c notifications
    pub fn sys_uptime() -> crate::Oid {
        oid!(1, 3, 6, 1, 2, 1, 1, 3, 0)
    }

    /// snmpTrapOID.0 - second varbind, names the notification type
    pub fn snmp_trap_oid() -> crate::Oid {
        oid!(1, 3, 6, 1, 6, 3, 1, 1, 4, 1, 0)
    }
}

/// Whether a notification must be acknowledged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    /// SNMPv2-Trap (0xA7), unconfirmed
    TrapV2,
    /// InformRequest (0xA6), acknowledged with a RESPONSE
    Inform,
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TrapV2 => write!(f, "trapV2"),
            Self::Inform => write!(f, "inform"),
        }
    }
}

/// A decoded TRAP-V2 or INFORM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Trap or inform
    pub kind: NotificationKind,
    /// Message version, echoed in the acknowledgment
    pub version: Version,
    /// Request ID from the PDU (echoed in the INFORM acknowledgment)
    pub request_id: i32,
    /// Community string the gateway sent
    pub community: Bytes,
    /// Variable bindings in wire order
    pub varbinds: Vec<VarBind>,
    /// Variable bindings keyed by OID
    pub values: BTreeMap<Oid, Value>,
}

impl Notification {
    /// Build from a decoded message, or `None` if it is not a notification.
    pub fn from_message(msg: CommunityMessage) -> Option<Self> {
        let kind = match msg.pdu.pdu_type {
            PduType::TrapV2 => NotificationKind::TrapV2,
            PduType::InformRequest => NotificationKind::Inform,
            _ => return None,
        };
        let values = into_value_map(msg.pdu.varbinds.clone());
        Some(Self {
            kind,
            version: msg.version,
            request_id: msg.pdu.request_id,
            community: msg.community,
            varbinds: msg.pdu.varbinds,
            values,
        })
    }

    /// The snmpTrapOID.0 value naming this notification's type.
    pub fn trap_oid(&self) -> Option<&Oid> {
        self.values.get(&oids::snmp_trap_oid())?.as_oid()
    }

    /// The sysUpTime.0 value, in hundredths of a second.
    pub fn uptime(&self) -> Option<u32> {
        match self.values.get(&oids::sys_uptime())? {
            Value::TimeTicks(t) => Some(*t),
            other => other.as_u32(),
        }
    }

    /// Whether the sender expects an acknowledgment.
    pub fn is_confirmed(&self) -> bool {
        self.kind == NotificationKind::Inform
    }

    /// Community as text, one character per byte.
    pub fn community_str(&self) -> String {
        latin1(&self.community)
    }

    /// The RESPONSE PDU acknowledging this notification.
    ///
    /// Echoes the request ID and variable bindings with zero error fields.
    pub fn to_ack(&self) -> Pdu {
        Pdu {
            pdu_type: PduType::Response,
            request_id: self.request_id,
            error_status: 0,
            error_index: 0,
            varbinds: self.varbinds.clone(),
        }
    }

    /// The complete acknowledgment message, ready for the ack channel.
    pub fn ack_message(&self) -> CommunityMessage {
        CommunityMessage::new(self.version, self.community.clone(), self.to_ack())
    }
}

/// Stream of notifications from a subscribed client.
///
/// Ends when the client clears its pending table (close or disconnect) or
/// when a newer subscription replaces this one.
#[derive(Debug)]
pub struct Notifications {
    rx: mpsc::UnboundedReceiver<Notification>,
}

impl Notifications {
    pub(crate) fn new(rx: mpsc::UnboundedReceiver<Notification>) -> Self {
        Self { rx }
    }

    /// Wait for the next notification.
    pub async fn recv(&mut self) -> Option<Notification> {
        self.rx.recv().await
    }

    /// Take a notification if one is already queued.
    pub fn try_recv(&mut self) -> Option<Notification> {
        self.rx.try_recv().ok()
    }
}

impl futures_core::Stream for Notifications {
    type Item = Notification;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid;

    fn inform() -> CommunityMessage {
        CommunityMessage::v2c(
            Bytes::from_static(b"public"),
            Pdu {
                pdu_type: PduType::InformRequest,
                request_id: 42,
                error_status: 0,
                error_index: 0,
                varbinds: vec![
                    VarBind::new(oids::sys_uptime(), Value::TimeTicks(11111)),
                    VarBind::new(
                        oids::snmp_trap_oid(),
                        Value::ObjectIdentifier(oid!(1, 3, 6, 1, 4, 1, 7779, 0, 3)),
                    ),
                    VarBind::new(oid!(1, 3, 6, 1, 4, 1, 7779, 3, 1), Value::from("node-2")),
                ],
            },
        )
    }

    #[test]
    fn test_inform_fields() {
        let n = Notification::from_message(inform()).unwrap();
        assert_eq!(n.kind, NotificationKind::Inform);
        assert!(n.is_confirmed());
        assert_eq!(n.request_id, 42);
        assert_eq!(n.uptime(), Some(11111));
        assert_eq!(n.trap_oid(), Some(&oid!(1, 3, 6, 1, 4, 1, 7779, 0, 3)));
        assert_eq!(n.values.len(), 3);
        assert_eq!(n.community_str(), "public");
    }

    #[test]
    fn test_trap_is_unconfirmed() {
        let mut msg = inform();
        msg.pdu.pdu_type = PduType::TrapV2;
        let n = Notification::from_message(msg).unwrap();
        assert_eq!(n.kind, NotificationKind::TrapV2);
        assert!(!n.is_confirmed());
        assert_eq!(n.kind.to_string(), "trapV2");
    }

    #[test]
    fn test_non_notification_rejected() {
        let mut msg = inform();
        msg.pdu.pdu_type = PduType::Response;
        assert!(Notification::from_message(msg).is_none());
    }

    #[test]
    fn test_ack_echoes_request() {
        let msg = inform();
        let n = Notification::from_message(msg.clone()).unwrap();
        let ack = n.ack_message();
        assert_eq!(ack.pdu, msg.pdu.to_response());
        assert_eq!(ack.community, msg.community);

        let decoded = CommunityMessage::decode(ack.encode()).unwrap();
        assert_eq!(decoded.pdu.pdu_type, PduType::Response);
        assert_eq!(decoded.pdu.request_id, 42);
    }

    #[test]
    fn test_missing_header_fields() {
        let mut msg = inform();
        msg.pdu.varbinds.truncate(0);
        let n = Notification::from_message(msg).unwrap();
        assert_eq!(n.uptime(), None);
        assert_eq!(n.trap_oid(), None);
    }

    #[tokio::test]
    async fn test_stream_ends_when_sender_dropped() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut notifications = Notifications::new(rx);
        tx.send(Notification::from_message(inform()).unwrap()).unwrap();
        drop(tx);
        assert_eq!(notifications.recv().await.map(|n| n.request_id), Some(42));
        assert!(notifications.recv().await.is_none());
    }
}
