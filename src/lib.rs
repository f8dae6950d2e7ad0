// Allow large error types - the Error enum includes OIDs inline for debugging convenience.
#![allow(clippy::result_large_err)]

//! # snmp-stream
//!
//! Async SNMP client for gateways that speak community-based SNMP over a
//! persistent byte stream instead of UDP.
//!
//! ## Features
//!
//! - Zero-copy BER encoding/decoding for the SNMP subset the gateway uses
//! - Any number of concurrent requests on one connection, matched by request ID
//! - Stream reassembly: messages split across or packed into reads are handled
//! - Pushed TRAP-V2/INFORM notifications as a `Stream`, with INFORMs acknowledged
//! - Gateway extensions: GET-SUBTREE (0xAB) and notification subscribe (0xAA)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use snmp_stream::{Client, Value, oid};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), snmp_stream::Error> {
//!     let client = Client::builder()
//!         .community("public")
//!         .connect("10.0.0.5:3000")
//!         .await?;
//!
//!     let response = client.get(&[oid!(1, 3, 6, 1, 2, 1, 1, 3, 0)]).await?.check()?;
//!     println!("sysUpTime: {:?}", response.values);
//!
//!     client
//!         .set(&oid!(1, 3, 6, 1, 4, 1, 7779, 3, 1, 1, 5, 0), Value::Integer(0))
//!         .await?
//!         .check()?;
//!
//!     Ok(())
//! }
//! ```

pub mod ber;
pub mod client;
pub mod error;
pub mod message;
pub mod notification;
pub mod oid;
pub mod pdu;
pub mod transport;
pub mod value;
pub mod varbind;
pub mod version;

// Re-exports for convenience
pub use client::{Client, ClientBuilder, ClientConfig, Inbound, RequestIds};
pub use error::{DecodeErrorKind, Error, ErrorStatus, OidErrorKind, Result};
pub use message::Response;
pub use notification::{Notification, NotificationKind, Notifications};
pub use oid::Oid;
pub use pdu::{Pdu, PduType};
pub use transport::{AckChannel, StreamTransport, Transport};
pub use value::Value;
pub use varbind::VarBind;
pub use version::Version;
