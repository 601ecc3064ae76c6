//! The three wire transport drivers.
//!
//! Every driver satisfies the same contract: hand it one serialized JSON-RPC
//! request and get back the peer's raw reply body. The persistent drivers
//! (WebSocket, IPC) additionally split inbound traffic into replies and
//! server-initiated subscription notifications.

mod http;
mod ipc;
pub(crate) mod router;
mod tls;
mod ws;

pub use http::HttpTransport;
pub use ipc::{DEFAULT_IPC_CHUNK_SIZE, IpcTransport};
pub use ws::WsTransport;

use async_trait::async_trait;
use serde_json::value::RawValue;

use crate::error::TransportError;

/// A wire transport able to move one framed JSON-RPC request and hand back
/// the peer's reply.
///
/// At most one request may be in flight per transport at any time. The
/// persistent drivers treat the next routed reply as the completion of the
/// latest send (a LIFO pickup), so concurrent senders on a single transport
/// must serialize themselves.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends one serialized request body and returns the raw reply body.
    async fn send_rpc_request(&self, body: String) -> Result<Box<RawValue>, TransportError>;
}

/// A persistent transport that also carries server-initiated subscription
/// notifications.
#[async_trait]
pub trait DuplexTransport: Transport {
    /// Waits for the next subscription notification frame.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Disconnected`] once the connection is gone.
    async fn next_notification(&self) -> Result<Box<RawValue>, TransportError>;

    /// Tears the connection down and wakes every blocked consumer with
    /// [`TransportError::Disconnected`].
    fn shutdown(&self);
}
