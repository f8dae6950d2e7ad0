//! SNMP client implementation.
//!
//! A [`Client`] multiplexes any number of outstanding requests over one
//! connection. Each request gets a fresh ID from [`RequestIds`], a waiter in
//! the [`Correlator`], and completes when the matching RESPONSE arrives
//! through [`Inbound`].

mod builder;
mod correlator;
mod inbound;

pub use builder::ClientBuilder;
pub use correlator::{Correlator, NOTIFICATION_SLOT, RequestIds};
pub use inbound::Inbound;

use crate::error::{Error, Result};
use crate::message::{CommunityMessage, Response};
use crate::notification::Notifications;
use crate::oid::Oid;
use crate::pdu::Pdu;
use crate::transport::{
    AckChannel, DEFAULT_MAX_MESSAGE_SIZE, DEFAULT_READ_BUFFER_SIZE, StreamTransport, Transport,
};
use crate::value::Value;
use crate::version::Version;
use bytes::Bytes;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tracing::{Span, instrument};

impl Client<StreamTransport> {
    /// Create a new client builder.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use snmp_stream::{Client, oid};
    /// use std::time::Duration;
    ///
    /// # async fn example() -> snmp_stream::Result<()> {
    /// let client = Client::builder()
    ///     .community("private")
    ///     .timeout(Duration::from_secs(5))
    ///     .connect("10.0.0.5:3000")
    ///     .await?;
    ///
    /// let response = client.get(&[oid!(1, 3, 6, 1, 2, 1, 1, 3, 0)]).await?.check()?;
    /// println!("{:?}", response.values);
    /// # Ok(())
    /// # }
    /// ```
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Create a client over an already-connected byte stream.
    ///
    /// Spawns the reader task, so this must be called inside a Tokio runtime.
    pub fn from_stream<S>(stream: S, peer: Option<SocketAddr>, config: ClientConfig) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        Self::spawn_stream(stream, peer, config, RequestIds::new(), None)
    }

    pub(crate) fn spawn_stream<S>(
        stream: S,
        peer: Option<SocketAddr>,
        config: ClientConfig,
        request_ids: RequestIds,
        ack: Option<Arc<dyn AckChannel>>,
    ) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (reader, transport) = StreamTransport::split(stream, peer);
        let read_buffer_size = config.read_buffer_size;
        let client = Self::from_parts(transport.clone(), config, request_ids, ack);
        tokio::spawn(client.inbound().run(reader, transport, read_buffer_size));
        client
    }
}

/// SNMP client.
///
/// Generic over the transport; [`StreamTransport`] is the default. Cheap to
/// clone, clones share the connection and pending table.
pub struct Client<T: Transport = StreamTransport> {
    inner: Arc<ClientInner<T>>,
}

impl<T: Transport> Clone for Client<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

struct ClientInner<T: Transport> {
    transport: Arc<T>,
    config: ClientConfig,
    request_ids: RequestIds,
    correlator: Arc<Correlator>,
    ack: Arc<dyn AckChannel>,
}

/// Client configuration.
///
/// Most users should use [`ClientBuilder`] rather than constructing this directly.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// SNMP version (default: V2c)
    pub version: Version,
    /// Community string (default: "public")
    pub community: Bytes,
    /// Per-request timeout (default: none, wait until the connection closes)
    pub timeout: Option<Duration>,
    /// Limit on buffered inbound bytes (default: 10 MiB)
    pub max_message_size: usize,
    /// Read chunk size and initial receive buffer capacity (default: 8 KiB)
    pub read_buffer_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            version: Version::V2c,
            community: Bytes::from_static(b"public"),
            timeout: None,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
        }
    }
}

/// Removes the waiter when the request does not complete normally.
struct PendingGuard<'a> {
    correlator: &'a Correlator,
    request_id: i32,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        // No-op when dispatch already removed the slot.
        self.correlator.deregister(self.request_id);
    }
}

impl<T: Transport> Client<T> {
    /// Create a client with its own request ID sequence.
    ///
    /// Nothing reads the transport: feed inbound bytes to [`Client::inbound`].
    pub fn new(transport: T, config: ClientConfig) -> Self {
        Self::from_parts(transport, config, RequestIds::new(), None)
    }

    pub(crate) fn from_parts(
        transport: T,
        config: ClientConfig,
        request_ids: RequestIds,
        ack: Option<Arc<dyn AckChannel>>,
    ) -> Self {
        let transport = Arc::new(transport);
        let ack = match ack {
            Some(ack) => ack,
            None => transport.clone() as Arc<dyn AckChannel>,
        };
        Self {
            inner: Arc::new(ClientInner {
                transport,
                config,
                request_ids,
                correlator: Arc::new(Correlator::new()),
                ack,
            }),
        }
    }

    /// Receive side for hosts that read the connection themselves.
    ///
    /// Each call returns a fresh reassembly buffer sharing this client's
    /// pending table; use one per connection.
    pub fn inbound(&self) -> Inbound {
        Inbound::new(
            self.inner.correlator.clone(),
            self.inner.ack.clone(),
            self.inner.config.read_buffer_size,
            self.inner.config.max_message_size,
        )
    }

    /// The client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.inner.transport
    }

    /// Get the peer address, when the transport has one.
    ///
    /// Named to match [`std::net::TcpStream::peer_addr()`].
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.inner.transport.peer_addr()
    }

    /// Whether requests can currently be sent.
    pub fn is_open(&self) -> bool {
        self.inner.transport.is_open()
    }

    /// Number of requests waiting for a response.
    pub fn pending_count(&self) -> usize {
        self.inner.correlator.pending_count()
    }

    /// Fail every pending request with [`Error::ConnectionClosed`] and end
    /// the notification stream. Returns how many requests were pending.
    pub fn clear_pending(&self) -> usize {
        self.inner.correlator.clear()
    }

    /// Close the transport and fail everything pending.
    pub async fn close(&self) {
        self.inner.transport.close().await;
        self.clear_pending();
    }

    fn ensure_open(&self) -> Result<()> {
        if self.inner.transport.is_open() {
            return Ok(());
        }
        tracing::warn!(target: "snmp_stream::client", { snmp.target = ?self.peer_addr() }, "request attempted while transport is not open");
        Err(Error::IllegalState {
            reason: "transport is not open",
        })
    }

    fn encode(&self, pdu: Pdu) -> Bytes {
        CommunityMessage::new(
            self.inner.config.version,
            self.inner.config.community.clone(),
            pdu,
        )
        .encode()
    }

    /// Send a request and wait for its response.
    ///
    /// Order matters: the open check happens before an ID is minted, and the
    /// waiter is registered before the bytes go out so a fast response can
    /// never miss it.
    async fn send_request(&self, build: impl FnOnce(i32) -> Pdu) -> Result<Response> {
        self.ensure_open()?;

        let request_id = self.inner.request_ids.next_id();
        Span::current().record("snmp.request_id", request_id);
        let pdu = build(request_id);
        tracing::debug!(target: "snmp_stream::client", { snmp.pdu_type = %pdu.pdu_type, snmp.varbind_count = pdu.varbinds.len() }, "sending {} request", pdu.pdu_type);
        let data = self.encode(pdu);

        let correlator = &*self.inner.correlator;
        let rx = correlator.register(request_id);
        let _guard = PendingGuard {
            correlator,
            request_id,
        };

        self.inner.transport.send(data).await?;

        let received = match self.inner.config.timeout {
            Some(limit) => match tokio::time::timeout(limit, rx).await {
                Ok(received) => received,
                Err(_) => {
                    tracing::debug!(target: "snmp_stream::client", { snmp.request_id = request_id, elapsed = ?limit }, "request timed out");
                    return Err(Error::Timeout {
                        elapsed: limit,
                        request_id,
                    });
                }
            },
            None => rx.await,
        };

        let response = received.map_err(|_| Error::ConnectionClosed)?;
        tracing::debug!(target: "snmp_stream::client", { snmp.error_status = %response.error_status, snmp.error_index = response.error_index, snmp.varbind_count = response.values.len() }, "received response");
        Ok(response)
    }

    /// GET the given objects.
    ///
    /// An error status in the response is returned as data; call
    /// [`Response::check`] to turn it into an error.
    #[instrument(level = "debug", skip(self, oids), err, fields(snmp.target = ?self.peer_addr(), snmp.oid_count = oids.len(), snmp.request_id = tracing::field::Empty))]
    pub async fn get(&self, oids: &[Oid]) -> Result<Response> {
        validate_oids(oids)?;
        self.send_request(|id| Pdu::get_request(id, oids)).await
    }

    /// GET-SUBTREE: every object under each of the given roots.
    ///
    /// This is a gateway extension (PDU tag 0xAB); standard agents reject it.
    #[instrument(level = "debug", skip(self, oids), err, fields(snmp.target = ?self.peer_addr(), snmp.oid_count = oids.len(), snmp.request_id = tracing::field::Empty))]
    pub async fn get_subtree(&self, oids: &[Oid]) -> Result<Response> {
        validate_oids(oids)?;
        self.send_request(|id| Pdu::get_subtree_request(id, oids))
            .await
    }

    /// GETBULK.
    ///
    /// The first `non_repeaters` OIDs are fetched once; the rest are walked
    /// for up to `max_repetitions` successors each. Negative `non_repeaters`
    /// is sent as 0.
    #[instrument(level = "debug", skip(self, oids), err, fields(snmp.target = ?self.peer_addr(), snmp.oid_count = oids.len(), snmp.request_id = tracing::field::Empty))]
    pub async fn get_bulk(
        &self,
        oids: &[Oid],
        max_repetitions: i32,
        non_repeaters: i32,
    ) -> Result<Response> {
        validate_oids(oids)?;
        self.send_request(|id| Pdu::get_bulk(id, non_repeaters, max_repetitions, oids))
            .await
    }

    /// SET a single object.
    #[instrument(level = "debug", skip(self, value), err, fields(snmp.target = ?self.peer_addr(), snmp.oid = %oid, snmp.request_id = tracing::field::Empty))]
    pub async fn set(&self, oid: &Oid, value: Value) -> Result<Response> {
        oid.validate_all()?;
        self.send_request(|id| Pdu::set_request(id, oid.clone(), value))
            .await
    }

    /// Ask the gateway to push notifications over this connection.
    ///
    /// The subscribe PDU has no request ID and gets no response; the returned
    /// stream starts receiving as soon as the gateway begins sending.
    /// Subscribing again replaces (and ends) the previous stream.
    #[instrument(level = "debug", skip(self), err, fields(snmp.target = ?self.peer_addr()))]
    pub async fn subscribe_notifications(&self) -> Result<Notifications> {
        self.ensure_open()?;

        // Installed before sending so nothing pushed right after the
        // subscribe is missed; withdrawn again if the send fails.
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.correlator.set_notification_sink(tx.clone());
        if let Err(e) = self.inner.transport.send(self.encode(Pdu::subscribe())).await {
            self.inner.correlator.remove_notification_sink(&tx);
            return Err(e);
        }

        tracing::debug!(target: "snmp_stream::notification", "subscribed to notifications");
        Ok(Notifications::new(rx))
    }
}

impl<T: Transport> std::fmt::Debug for Client<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("peer", &self.peer_addr())
            .field("open", &self.is_open())
            .field("config", &self.inner.config)
            .field("correlator", &self.inner.correlator)
            .finish()
    }
}

fn validate_oids(oids: &[Oid]) -> Result<()> {
    oids.iter().try_for_each(Oid::validate_all)
}
