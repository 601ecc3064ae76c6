//! HTTP(S) transport driver.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, header};
use serde_json::value::RawValue;
use url::Url;

use crate::endpoint::Endpoint;
use crate::error::TransportError;
use crate::transport::Transport;

/// Cap on the response body; anything larger is treated as a server fault.
pub(crate) const MAX_BODY_BYTES: usize = 5 * 1024 * 1024;

/// JSON-RPC over pooled HTTP/1.1.
///
/// Each request is one POST with a JSON body; connection pooling lives
/// inside the HTTP client. A 429 surfaces as
/// [`TransportError::TooManyRequests`] for the provider's retry wrapper;
/// any other non-200 status is fatal.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    url: Url,
}

impl HttpTransport {
    /// Builds the driver for an `http`/`https` endpoint.
    ///
    /// # Errors
    ///
    /// [`TransportError::InvalidEndpointConfig`] for socket-path endpoints,
    /// [`TransportError::UnsupportedSchema`] for other URI schemes.
    pub fn new(endpoint: &Endpoint) -> Result<Self, TransportError> {
        let url = endpoint.require_uri(&["http", "https"])?.clone();
        Ok(Self {
            client: Client::new(),
            url,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send_rpc_request(&self, body: String) -> Result<Box<RawValue>, TransportError> {
        let mut response = self
            .client
            .post(self.url.clone())
            .header(header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(TransportError::TooManyRequests);
        }
        if status != StatusCode::OK {
            return Err(TransportError::UnexpectedServerResponse {
                status: status.as_u16(),
            });
        }

        let mut buffer: Vec<u8> = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if buffer.len() + chunk.len() > MAX_BODY_BYTES {
                return Err(TransportError::UnexpectedServerResponse {
                    status: status.as_u16(),
                });
            }
            buffer.extend_from_slice(&chunk);
        }

        let text = String::from_utf8(buffer).map_err(|_| TransportError::InvalidUtf8Payload)?;
        Ok(RawValue::from_string(text)?)
    }
}
