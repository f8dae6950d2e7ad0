//! Request/response correlation.
//!
//! Every outstanding request owns a slot keyed by its request ID. The
//! notification sink lives in the reserved slot 0, which no request ever
//! uses and which dispatch never removes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{mpsc, oneshot};

use crate::message::Response;
use crate::notification::Notification;

/// Slot reserved for the notification sink.
pub const NOTIFICATION_SLOT: i32 = 0;

/// Request ID generator.
///
/// Clients built with the same `RequestIds` (or clones of it) draw from one
/// sequence; clients built without one each get their own. IDs start at 1
/// and never yield 0; after `i32::MAX` the sequence continues at 1.
#[derive(Debug, Clone)]
pub struct RequestIds {
    next: Arc<AtomicI32>,
}

impl RequestIds {
    /// A fresh sequence starting at 1.
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// A fresh sequence starting at `first` (0 or negative is treated as 1).
    pub fn starting_at(first: i32) -> Self {
        Self {
            next: Arc::new(AtomicI32::new(first.max(1))),
        }
    }

    /// Take the next ID.
    pub fn next_id(&self) -> i32 {
        self.next
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |id| {
                Some(id.checked_add(1).unwrap_or(1))
            })
            .unwrap_or_else(|id| id)
    }
}

impl Default for RequestIds {
    fn default() -> Self {
        Self::new()
    }
}

enum Slot {
    Request(oneshot::Sender<Response>),
    Notifications(mpsc::UnboundedSender<Notification>),
}

/// Pending-request table.
///
/// The lock is held only for a single insert, lookup or removal; delivery
/// through the channels happens after it is released.
#[derive(Default)]
pub struct Correlator {
    slots: Mutex<HashMap<i32, Slot>>,
}

impl Correlator {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<i32, Slot>> {
        // A panic while holding the lock cannot leave the map half-updated.
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a waiter for `request_id`.
    ///
    /// Registering an ID that is already pending replaces the old waiter,
    /// whose receiver then reports the channel closed.
    pub fn register(&self, request_id: i32) -> oneshot::Receiver<Response> {
        let (tx, rx) = oneshot::channel();
        if self
            .slots()
            .insert(request_id, Slot::Request(tx))
            .is_some()
        {
            tracing::warn!(target: "snmp_stream::client", { snmp.request_id = request_id }, "request id reused while pending");
        }
        rx
    }

    /// Remove the waiter for `request_id`, if any.
    pub fn deregister(&self, request_id: i32) -> bool {
        let mut slots = self.slots();
        match slots.get(&request_id) {
            Some(Slot::Request(_)) => slots.remove(&request_id).is_some(),
            _ => false,
        }
    }

    /// Store the notification sink in slot 0, replacing any previous one.
    pub fn set_notification_sink(&self, tx: mpsc::UnboundedSender<Notification>) {
        self.slots()
            .insert(NOTIFICATION_SLOT, Slot::Notifications(tx));
    }

    /// Remove the notification sink, but only if it is still `tx`.
    ///
    /// A later subscribe may already have replaced it; that sink is left alone.
    pub fn remove_notification_sink(&self, tx: &mpsc::UnboundedSender<Notification>) -> bool {
        let mut slots = self.slots();
        match slots.get(&NOTIFICATION_SLOT) {
            Some(Slot::Notifications(current)) if current.same_channel(tx) => {
                slots.remove(&NOTIFICATION_SLOT);
                true
            }
            _ => false,
        }
    }

    /// Deliver a response to its waiter.
    ///
    /// Returns `false` when nothing was waiting (duplicate, late, or
    /// unsolicited response); the response is dropped.
    pub fn dispatch_response(&self, response: Response) -> bool {
        let request_id = response.request_id;
        let tx = {
            let mut slots = self.slots();
            match slots.get(&request_id) {
                Some(Slot::Request(_)) => match slots.remove(&request_id) {
                    Some(Slot::Request(tx)) => tx,
                    _ => return false,
                },
                _ => {
                    tracing::trace!(target: "snmp_stream::client", { snmp.request_id = request_id }, "dropping unmatched response");
                    return false;
                }
            }
        };

        if tx.send(response).is_err() {
            // The caller gave up (timeout or dropped future).
            tracing::trace!(target: "snmp_stream::client", { snmp.request_id = request_id }, "waiter gone");
            return false;
        }
        true
    }

    /// Deliver a notification to the sink in slot 0.
    ///
    /// The slot stays registered. Returns `false` when there is no live sink.
    pub fn dispatch_notification(&self, notification: Notification) -> bool {
        let tx = match self.slots().get(&NOTIFICATION_SLOT) {
            Some(Slot::Notifications(tx)) => tx.clone(),
            _ => {
                tracing::debug!(target: "snmp_stream::notification", { kind = %notification.kind, snmp.request_id = notification.request_id }, "no subscriber, dropping notification");
                return false;
            }
        };
        tx.send(notification).is_ok()
    }

    /// Drop every waiter and the notification sink.
    ///
    /// Pending callers observe a closed channel; notification streams end.
    pub fn clear(&self) -> usize {
        let drained: Vec<Slot> = self.slots().drain().map(|(_, slot)| slot).collect();
        let requests = drained
            .iter()
            .filter(|slot| matches!(slot, Slot::Request(_)))
            .count();
        if !drained.is_empty() {
            tracing::debug!(target: "snmp_stream::client", { pending = requests }, "cleared pending requests");
        }
        requests
    }

    /// Number of outstanding requests (slot 0 not counted).
    pub fn pending_count(&self) -> usize {
        self.slots()
            .values()
            .filter(|slot| matches!(slot, Slot::Request(_)))
            .count()
    }

    /// Whether a notification sink is registered.
    pub fn has_notification_sink(&self) -> bool {
        matches!(
            self.slots().get(&NOTIFICATION_SLOT),
            Some(Slot::Notifications(_))
        )
    }
}

impl std::fmt::Debug for Correlator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Correlator")
            .field("pending", &self.pending_count())
            .field("notifications", &self.has_notification_sink())
            .finish()
    }
}
