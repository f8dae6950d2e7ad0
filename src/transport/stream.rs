//! Stream transport for SNMP clients.
//!
//! [`StreamTransport`] owns the write half of any `AsyncRead + AsyncWrite`
//! byte stream: a TCP connection in production, `tokio::io::duplex` in tests.
//! The read half is handed back to the caller (normally the client, which
//! spawns the reader task) so inbound fragments can be fed to a
//! [`ReceiveBuffer`](super::ReceiveBuffer).
//!
//! Unlike a request/response transport, sends are not serialized against
//! receives: any number of requests may be outstanding and responses are
//! matched by request ID.
//!
//! # Example
//!
//! ```rust,no_run
//! use snmp_stream::transport::{StreamTransport, Transport};
//! use std::time::Duration;
//!
//! # async fn example() -> snmp_stream::Result<()> {
//! let (reader, transport) = StreamTransport::connect(
//!     "10.0.0.5:3000".parse().unwrap(),
//!     Some(Duration::from_secs(5)),
//! )
//! .await?;
//! assert!(transport.is_open());
//! # drop(reader);
//! # Ok(())
//! # }
//! ```

use super::Transport;
use crate::error::{Error, Result};
use bytes::Bytes;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, ReadHalf};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

type Writer = Box<dyn AsyncWrite + Send + Unpin>;

/// Write side of a client connection.
///
/// Cheap to clone; clones share the connection.
#[derive(Clone)]
pub struct StreamTransport {
    inner: Arc<StreamTransportInner>,
}

struct StreamTransportInner {
    writer: Mutex<Writer>,
    open: AtomicBool,
    peer: Option<SocketAddr>,
    /// Cancelled on close so the reader task stops too
    shutdown: CancellationToken,
}

impl StreamTransport {
    /// Wrap a write half.
    pub fn new<W>(writer: W, peer: Option<SocketAddr>) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self {
            inner: Arc::new(StreamTransportInner {
                writer: Mutex::new(Box::new(writer)),
                open: AtomicBool::new(true),
                peer,
                shutdown: CancellationToken::new(),
            }),
        }
    }

    /// Split a bidirectional stream into its read half and a transport.
    pub fn split<S>(stream: S, peer: Option<SocketAddr>) -> (ReadHalf<S>, Self)
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (reader, writer) = tokio::io::split(stream);
        (reader, Self::new(writer, peer))
    }

    /// Open a TCP connection and split it.
    pub async fn connect(
        target: SocketAddr,
        connect_timeout: Option<Duration>,
    ) -> Result<(ReadHalf<TcpStream>, Self)> {
        let stream = connect_tcp(target, connect_timeout).await?;
        Ok(Self::split(stream, Some(target)))
    }

    /// Token cancelled when this transport closes.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.inner.shutdown.clone()
    }
}

/// Open a TCP connection with `TCP_NODELAY` set.
pub async fn connect_tcp(
    target: SocketAddr,
    connect_timeout: Option<Duration>,
) -> Result<TcpStream> {
    let stream = match connect_timeout {
        Some(t) => timeout(t, TcpStream::connect(target))
            .await
            .map_err(|_| Error::Timeout {
                elapsed: t,
                request_id: 0,
            })?
            .map_err(|e| Error::io(Some(target), e))?,
        None => TcpStream::connect(target)
            .await
            .map_err(|e| Error::io(Some(target), e))?,
    };
    stream
        .set_nodelay(true)
        .map_err(|e| Error::io(Some(target), e))?;

    tracing::debug!(target: "snmp_stream::transport", { snmp.target = %target }, "connected");
    Ok(stream)
}

impl std::fmt::Debug for StreamTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamTransport")
            .field("peer", &self.inner.peer)
            .field("open", &self.is_open())
            .finish()
    }
}

impl Transport for StreamTransport {
    async fn send(&self, data: Bytes) -> Result<()> {
        if !self.is_open() {
            return Err(Error::IllegalState {
                reason: "transport is closed",
            });
        }

        let target = self.inner.peer;
        let mut writer = self.inner.writer.lock().await;
        writer
            .write_all(&data)
            .await
            .map_err(|e| Error::io(target, e))?;
        writer.flush().await.map_err(|e| Error::io(target, e))?;

        tracing::trace!(target: "snmp_stream::transport", { snmp.target = ?target, bytes = data.len() }, "sent");
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.inner.open.load(Ordering::Acquire)
    }

    async fn close(&self) {
        let was_open = self.inner.open.swap(false, Ordering::AcqRel);
        self.inner.shutdown.cancel();
        if !was_open {
            return;
        }

        let mut writer = self.inner.writer.lock().await;
        if let Err(e) = writer.shutdown().await {
            tracing::debug!(target: "snmp_stream::transport", { snmp.target = ?self.inner.peer, error = %e }, "shutdown failed");
        }
        tracing::debug!(target: "snmp_stream::transport", { snmp.target = ?self.inner.peer }, "transport closed");
    }

    fn peer_addr(&self) -> Option<SocketAddr> {
        self.inner.peer
    }
}
