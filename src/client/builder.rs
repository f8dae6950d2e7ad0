//! Client builder.
//!
//! [`ClientBuilder`] collects a [`ClientConfig`] plus the two injectable
//! collaborators (request ID sequence and INFORM ack channel), validates
//! them, and produces a [`Client`] over TCP, an existing stream, or any
//! [`Transport`].

use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::client::{ClientConfig, RequestIds};
use crate::error::{Error, Result};
use crate::transport::{AckChannel, StreamTransport, Transport, connect_tcp};
use crate::version::Version;

use super::Client;

/// Builder for constructing SNMP clients.
///
/// # Example
///
/// ```rust,no_run
/// use snmp_stream::{ClientBuilder, RequestIds};
/// use std::time::Duration;
///
/// # async fn example() -> snmp_stream::Result<()> {
/// // Two clients drawing request IDs from one sequence
/// let ids = RequestIds::new();
/// let a = ClientBuilder::new().request_ids(ids.clone()).connect("10.0.0.5:3000").await?;
/// let b = ClientBuilder::new()
///     .request_ids(ids)
///     .timeout(Duration::from_secs(10))
///     .connect("10.0.0.6:3000")
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder {
    config: ClientConfig,
    request_ids: Option<RequestIds>,
    ack: Option<Arc<dyn AckChannel>>,
}

impl ClientBuilder {
    /// Create a builder with default settings (v2c, community "public").
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
            request_ids: None,
            ack: None,
        }
    }

    /// Set the community string (default: "public").
    pub fn community(mut self, community: impl AsRef<[u8]>) -> Self {
        self.config.community = Bytes::copy_from_slice(community.as_ref());
        self
    }

    /// Set the SNMP version (default: V2c).
    pub fn version(mut self, version: Version) -> Self {
        self.config.version = version;
        self
    }

    /// Set a per-request timeout (default: none).
    ///
    /// Also bounds the TCP connect in [`connect`](Self::connect). Requests are
    /// never retried.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    /// Set the limit on buffered inbound bytes (default: 10 MiB).
    ///
    /// A peer that exceeds it gets its connection closed.
    pub fn max_message_size(mut self, size: usize) -> Self {
        self.config.max_message_size = size;
        self
    }

    /// Set the read chunk size (default: 8 KiB).
    pub fn read_buffer_size(mut self, size: usize) -> Self {
        self.config.read_buffer_size = size;
        self
    }

    /// Draw request IDs from a shared sequence.
    ///
    /// Without this each client gets its own sequence starting at 1.
    pub fn request_ids(mut self, ids: RequestIds) -> Self {
        self.request_ids = Some(ids);
        self
    }

    /// Send INFORM acknowledgments somewhere other than the client's
    /// own transport.
    pub fn ack_channel(mut self, ack: Arc<dyn AckChannel>) -> Self {
        self.ack = Some(ack);
        self
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<()> {
        if self.config.community.is_empty() {
            return Err(Error::Config("community must not be empty".into()));
        }
        if self.config.max_message_size == 0 {
            return Err(Error::Config("max_message_size must be greater than 0".into()));
        }
        if self.config.read_buffer_size == 0 {
            return Err(Error::Config("read_buffer_size must be greater than 0".into()));
        }
        Ok(())
    }

    fn resolve_target(target: &str) -> Result<SocketAddr> {
        target
            .to_socket_addrs()
            .map_err(|e| Error::Config(format!("could not resolve address '{}': {}", target, e)))?
            .next()
            .ok_or_else(|| Error::Config(format!("could not resolve address '{}'", target)))
    }

    /// Build a client over any transport.
    ///
    /// Nothing reads the connection; the host feeds inbound bytes to
    /// [`Client::inbound`].
    pub fn build<T: Transport>(self, transport: T) -> Result<Client<T>> {
        self.validate()?;
        Ok(Client::from_parts(
            transport,
            self.config,
            self.request_ids.unwrap_or_default(),
            self.ack,
        ))
    }

    /// Build a client over an existing byte stream and spawn its reader.
    pub fn build_with_stream<S>(self, stream: S, peer: Option<SocketAddr>) -> Result<Client>
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        self.validate()?;
        Ok(Client::spawn_stream(
            stream,
            peer,
            self.config,
            self.request_ids.unwrap_or_default(),
            self.ack,
        ))
    }

    /// Connect over TCP and spawn the reader.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the address does not
    /// resolve, or the connection fails.
    pub async fn connect(self, target: &str) -> Result<Client<StreamTransport>> {
        self.validate()?;
        let addr = Self::resolve_target(target)?;
        let stream = connect_tcp(addr, self.config.timeout).await?;
        Ok(Client::spawn_stream(
            stream,
            Some(addr),
            self.config,
            self.request_ids.unwrap_or_default(),
            self.ack,
        ))
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
