//! The closed error taxonomy of the client boundary.
//!
//! Errors are layered the way the client is: [`TransportError`] covers
//! everything below the JSON-RPC envelope (endpoint validation, connecting,
//! the WebSocket handshake and framing rules, HTTP statuses),
//! [`RpcErrorKind`] classifies the `error.code` of a JSON-RPC error reply,
//! and [`ProviderError`] is what the method surface returns.
//!
//! Exactly two signals are retryable: an HTTP 429
//! ([`TransportError::TooManyRequests`]) and the `-32005` rate-limit family
//! ([`RpcErrorKind::LimitExceeded`]). Everything else surfaces immediately.

use serde::Deserialize;

/// Errors raised below the JSON-RPC envelope.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum TransportError {
    /// The endpoint variant does not match the transport kind (a URI handed
    /// to the IPC driver, or a socket path handed to HTTP/WebSocket).
    #[error("endpoint kind does not match the transport kind")]
    InvalidEndpointConfig,

    /// The URI scheme is not one the transport accepts.
    #[error("unsupported endpoint scheme `{0}`")]
    UnsupportedSchema(String),

    /// Connecting kept failing past the configured attempt bound.
    #[error("failed to connect to `{endpoint}` after {attempts} attempts")]
    FailedToConnect {
        /// The peer that refused us.
        endpoint: String,
        /// How many attempts were made.
        attempts: u32,
    },

    /// The HTTP peer answered with a status that is neither 200 nor 429, or
    /// with a body past the size cap.
    #[error("unexpected server response (HTTP status {status})")]
    UnexpectedServerResponse {
        /// The offending status code.
        status: u16,
    },

    /// The peer is rate-limiting us (HTTP 429). Consumed by the retry
    /// wrapper; callers only see it once retries are exhausted.
    #[error("server rejected the request with HTTP 429")]
    TooManyRequests,

    /// The WebSocket handshake response was not a well-formed 101 upgrade.
    #[error("malformed websocket handshake response")]
    InvalidHandshakeMessage,

    /// The `Sec-WebSocket-Accept` header was missing or did not match the
    /// key we sent.
    #[error("websocket handshake key mismatch")]
    InvalidHandshakeKey,

    /// A handshake header that must appear once appeared twice.
    #[error("duplicate `{0}` header in websocket handshake response")]
    DuplicateHandshakeHeader(&'static str),

    /// The server set the mask bit on an inbound frame; servers must not
    /// mask.
    #[error("server sent a masked frame")]
    MaskedServerMessage,

    /// RSV bits were set although no extension was negotiated.
    #[error("reserved frame bits set without a negotiated extension")]
    UnnegotiatedReservedBits,

    /// A control frame carried more than 125 payload bytes.
    #[error("control frame payload exceeds 125 bytes")]
    ControlFrameTooBig,

    /// A control frame arrived fragmented.
    #[error("fragmented control frame")]
    FragmentedControl,

    /// A continuation frame arrived with no fragmented message pending, or a
    /// new data frame interrupted one.
    #[error("unexpected fragment sequencing")]
    UnexpectedFragment,

    /// A text payload failed UTF-8 validation.
    #[error("text frame payload is not valid UTF-8")]
    InvalidUtf8Payload,

    /// An opcode outside the RFC 6455 set.
    #[error("unsupported websocket opcode {0:#x}")]
    UnsupportedOpcode(u8),

    /// A 64-bit frame length does not fit the platform address space.
    #[error("frame length does not fit the platform address space")]
    MessageSizeOverflow,

    /// The connection is gone; blocked queue consumers are woken with this.
    #[error("connection closed")]
    Disconnected,

    /// The TLS server name could not be derived from the endpoint host.
    #[error("invalid tls server name")]
    InvalidServerName,

    /// Byte-level I/O failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// HTTP client failure.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// The peer sent something that is not JSON.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Classification of a JSON-RPC `error.code`.
///
/// Codes follow EIP-1474 (`-32xxx`) and EIP-1193 (`4xxx`); everything
/// unrecognized lands in [`RpcErrorKind::UnexpectedRpcErrorCode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum RpcErrorKind {
    /// `-32700`: the peer could not parse our request.
    ParseError,
    /// `-32600`: the request object was invalid.
    InvalidRequest,
    /// `-32601`: unknown method.
    MethodNotFound,
    /// `-32602`: invalid method parameters.
    InvalidParams,
    /// `-32603`: internal JSON-RPC error.
    UnexpectedErrorFound,
    /// `-32000`: invalid input.
    InvalidInput,
    /// `-32001`: requested resource not found.
    ResourceNotFound,
    /// `-32002`: requested resource unavailable.
    ResourceUnavailable,
    /// `-32003`: transaction rejected.
    TransactionRejected,
    /// `-32004`: method not supported.
    MethodNotSupported,
    /// `-32005`: the rate-limit family. The only retryable RPC code.
    LimitExceeded,
    /// `-32006`: JSON-RPC version not supported.
    RpcVersionNotSupported,
    /// `3`: the call reverted in the EVM.
    EvmFailedToExecute,
    /// `4001`: the user rejected the request.
    UserRejectedRequest,
    /// `4100`: the requested account/method is not authorized.
    Unauthorized,
    /// `4200`: the provider does not support the method.
    UnsupportedMethod,
    /// `4900`: the provider is disconnected from all chains.
    Disconnected,
    /// `4901`: the provider is disconnected from the requested chain.
    ChainDisconnected,
    /// Any code outside the closed set above.
    UnexpectedRpcErrorCode(i64),
}

impl RpcErrorKind {
    /// Maps a wire error code onto the closed kind set.
    #[must_use]
    pub const fn from_code(code: i64) -> Self {
        match code {
            -32700 => Self::ParseError,
            -32600 => Self::InvalidRequest,
            -32601 => Self::MethodNotFound,
            -32602 => Self::InvalidParams,
            -32603 => Self::UnexpectedErrorFound,
            -32000 => Self::InvalidInput,
            -32001 => Self::ResourceNotFound,
            -32002 => Self::ResourceUnavailable,
            -32003 => Self::TransactionRejected,
            -32004 => Self::MethodNotSupported,
            -32005 => Self::LimitExceeded,
            -32006 => Self::RpcVersionNotSupported,
            3 => Self::EvmFailedToExecute,
            4001 => Self::UserRejectedRequest,
            4100 => Self::Unauthorized,
            4200 => Self::UnsupportedMethod,
            4900 => Self::Disconnected,
            4901 => Self::ChainDisconnected,
            other => Self::UnexpectedRpcErrorCode(other),
        }
    }

    /// Whether this kind is the rate-limit signal the retry wrapper acts on.
    #[must_use]
    pub const fn is_rate_limited(self) -> bool {
        matches!(self, Self::LimitExceeded)
    }
}

/// The raw `error` object of a JSON-RPC error reply.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcErrorPayload {
    /// Signed wire code.
    pub code: i64,
    /// Human-readable message from the peer.
    pub message: String,
    /// Optional structured payload (revert data, usually).
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

/// Errors returned by the typed method surface.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ProviderError {
    /// Failure below the JSON-RPC envelope.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The peer answered with a JSON-RPC error.
    #[error("rpc error {kind:?} (code {}): {}", .payload.code, .payload.message)]
    Rpc {
        /// Classified error kind.
        kind: RpcErrorKind,
        /// The raw error object.
        payload: RpcErrorPayload,
    },

    /// The call reverted in the EVM (wire code 3).
    #[error("execution reverted: {}", .payload.message)]
    EvmFailedToExecute {
        /// The raw error object, with revert data when the peer provides it.
        payload: RpcErrorPayload,
    },

    /// Rate-limited on every attempt up to the configured bound.
    #[error("request retries exhausted while rate limited")]
    ReachedMaxRetryLimit,

    /// `eth_getTransactionByHash` answered `null`.
    #[error("transaction not found")]
    TransactionNotFound,

    /// `eth_getTransactionReceipt` answered `null`.
    #[error("transaction receipt not found")]
    TransactionReceiptNotFound,

    /// A block lookup by hash answered `null`.
    #[error("no block with the given hash")]
    InvalidBlockHash,

    /// A block lookup by number answered `null`.
    #[error("no block at the given number")]
    InvalidBlockNumber,

    /// A transaction lookup by block hash and index answered `null`.
    #[error("no transaction at the given block hash and index")]
    InvalidBlockHashOrIndex,

    /// A transaction lookup by block number and index answered `null`.
    #[error("no transaction at the given block number and index")]
    InvalidBlockNumberOrIndex,

    /// A filter poll answered `null`; the filter id is unknown to the peer.
    #[error("no installed filter with the given id")]
    InvalidFilterId,

    /// The latest block carries no `baseFeePerGas` to estimate against.
    #[error("latest block carries no base fee")]
    UnableToFetchFeeInfoFromBlock,

    /// A caller-provided max fee is below the computed priority fee.
    #[error("max fee per gas is lower than the priority fee")]
    MaxFeePerGasUnderflow,

    /// The receipt did not arrive within the polling budget.
    #[error("transaction receipt did not arrive within the polling budget")]
    FailedToGetReceipt,

    /// Request or response (de)serialization failure on our side.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl ProviderError {
    /// Classifies a wire error payload into the matching variant.
    pub(crate) fn from_rpc(payload: RpcErrorPayload) -> Self {
        match RpcErrorKind::from_code(payload.code) {
            RpcErrorKind::EvmFailedToExecute => Self::EvmFailedToExecute { payload },
            kind => Self::Rpc { kind, payload },
        }
    }

    /// Whether this error is the rate-limit signal.
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        match self {
            Self::Transport(TransportError::TooManyRequests) => true,
            Self::Rpc { kind, .. } => kind.is_rate_limited(),
            _ => false,
        }
    }
}
