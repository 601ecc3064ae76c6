#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Transport-interchangeable Ethereum JSON-RPC provider.
//!
//! This crate exposes a single logical [`Provider`] over three wire
//! transports — pooled HTTP(S), WebSocket, and Unix-domain-socket IPC — with
//! unified request framing, bounded retry on rate-limiting, subscription
//! dispatch for the persistent transports, and a typed wrapper for the
//! standard `eth_*`, `net_*`, `web3_*`, and `txpool_*` method surface.
//!
//! # Modules
//!
//! - [`config`] - Immutable per-network configuration shared by every provider
//! - [`endpoint`] - URI/socket-path endpoint parsing and validation
//! - [`error`] - The closed error taxonomy of the client boundary
//! - [`fees`] - Fee estimation against current chain state
//! - [`jsonrpc`] - JSON-RPC 2.0 request/response envelope
//! - [`provider`] - The typed method surface
//! - [`transport`] - The three wire transport drivers and the frame router
//!
//! # Example
//!
//! ```no_run
//! use ethrpc::{Endpoint, NetworkConfig, Provider};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let network = NetworkConfig::new(Endpoint::parse("http://localhost:8545")?, 1);
//! let provider = Provider::connect_http(network)?;
//! let chain_id = provider.get_chain_id().await?;
//! assert_eq!(chain_id, 1);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod endpoint;
pub mod error;
pub mod fees;
pub mod jsonrpc;
pub mod provider;
mod retry;
pub mod transport;

pub use config::{EnsContracts, MULTICALL3_ADDRESS, NetworkConfig, OpStackContracts};
pub use endpoint::Endpoint;
pub use error::{ProviderError, RpcErrorKind, RpcErrorPayload, TransportError};
pub use fees::{FeeEstimate, FeeRequest, FeeShape};
pub use jsonrpc::RpcMethod;
pub use provider::{Provider, SubscriptionKind, SubscriptionNotification};
pub use transport::{DuplexTransport, HttpTransport, IpcTransport, Transport, WsTransport};
