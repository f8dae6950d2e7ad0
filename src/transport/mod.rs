//! Transport layer abstraction.
//!
//! Provides the [`Transport`] trait used to send requests, the [`AckChannel`]
//! used to acknowledge INFORMs, the [`StreamTransport`] implementation over
//! any async byte stream, and the [`ReceiveBuffer`] that reassembles what the
//! stream delivers.

mod reassembly;
mod stream;

#[cfg(any(test, feature = "testing"))]
mod mock;

pub use reassembly::*;
pub use stream::*;

#[cfg(any(test, feature = "testing"))]
pub use mock::*;

use crate::error::Result;
use bytes::Bytes;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;

/// Boxed future used where a trait must stay object-safe.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Client-side transport abstraction.
///
/// The transport only sends; inbound bytes reach the client through
/// [`Inbound::on_fragment`](crate::client::Inbound::on_fragment), fed either
/// by the reader task spawned for a [`StreamTransport`] or by a host that
/// receives fragments itself.
pub trait Transport: Send + Sync + 'static {
    /// Send one encoded message.
    fn send(&self, data: Bytes) -> impl Future<Output = Result<()>> + Send;

    /// Whether the transport can currently send.
    ///
    /// The client checks this before minting a request ID, so nothing is
    /// registered for a request that could never go out.
    fn is_open(&self) -> bool;

    /// Close the transport. Idempotent.
    fn close(&self) -> impl Future<Output = ()> + Send;

    /// The peer address, when the underlying stream has one.
    ///
    /// Named to match [`std::net::TcpStream::peer_addr()`].
    fn peer_addr(&self) -> Option<SocketAddr>;
}

/// Where INFORM acknowledgments are sent.
///
/// Kept separate from [`Transport`] so a host can route acknowledgments over
/// a different path than requests. Every `Transport` is an `AckChannel`, and
/// the client uses its own transport unless told otherwise.
pub trait AckChannel: Send + Sync {
    /// Send one encoded acknowledgment.
    fn send_ack(&self, data: Bytes) -> BoxFuture<'_, Result<()>>;
}

impl<T: Transport> AckChannel for T {
    fn send_ack(&self, data: Bytes) -> BoxFuture<'_, Result<()>> {
        Box::pin(self.send(data))
    }
}
