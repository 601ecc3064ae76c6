//! RFC 6455 opening handshake, client side.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use sha1::{Digest, Sha1};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use url::Url;

use crate::error::TransportError;

const WS_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";
const MAX_RESPONSE_BYTES: usize = 8 * 1024;

/// Fresh base64 nonce for `Sec-WebSocket-Key`.
pub(crate) fn generate_key() -> String {
    BASE64.encode(rand::random::<[u8; 16]>())
}

/// The `Sec-WebSocket-Accept` value the server must echo for `key`.
pub(crate) fn accept_for(key: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(key.as_bytes());
    hasher.update(WS_GUID.as_bytes());
    BASE64.encode(hasher.finalize())
}

/// Serializes the upgrade request for `url` under `key`.
pub(crate) fn request_bytes(url: &Url, key: &str) -> Result<Vec<u8>, TransportError> {
    let host = url.host_str().ok_or(TransportError::InvalidEndpointConfig)?;
    let port = url.port_or_known_default().unwrap_or(80);
    let path = match url.query() {
        Some(query) => format!("{}?{query}", url.path()),
        None => url.path().to_owned(),
    };
    Ok(format!(
        "GET {path} HTTP/1.1\r\n\
         Host: {host}:{port}\r\n\
         Connection: Upgrade\r\n\
         Upgrade: websocket\r\n\
         Sec-WebSocket-Version: 13\r\n\
         Sec-WebSocket-Key: {key}\r\n\r\n"
    )
    .into_bytes())
}

/// Runs the opening handshake on a fresh stream.
pub(crate) async fn perform<S>(stream: &mut S, url: &Url) -> Result<(), TransportError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let key = generate_key();
    stream.write_all(&request_bytes(url, &key)?).await?;
    stream.flush().await?;
    let response = read_response(stream).await?;
    validate_response(&response, &key)
}

/// Reads the upgrade response byte by byte up to the header terminator, so
/// no frame bytes are consumed past it.
async fn read_response<S>(stream: &mut S) -> Result<String, TransportError>
where
    S: AsyncRead + Unpin,
{
    let mut buffer = Vec::new();
    let mut byte = [0u8; 1];
    while !buffer.ends_with(b"\r\n\r\n") {
        if buffer.len() >= MAX_RESPONSE_BYTES {
            return Err(TransportError::InvalidHandshakeMessage);
        }
        stream.read_exact(&mut byte).await?;
        buffer.push(byte[0]);
    }
    String::from_utf8(buffer).map_err(|_| TransportError::InvalidHandshakeMessage)
}

/// Checks the 101 status line, the upgrade headers, and the accept key.
pub(crate) fn validate_response(response: &str, key: &str) -> Result<(), TransportError> {
    let mut lines = response.split("\r\n");
    let status = lines.next().ok_or(TransportError::InvalidHandshakeMessage)?;
    if !status.starts_with("HTTP/1.1 101") {
        return Err(TransportError::InvalidHandshakeMessage);
    }

    let mut accept: Option<&str> = None;
    let mut upgraded = false;
    for line in lines {
        if line.is_empty() {
            break;
        }
        let Some((name, value)) = line.split_once(':') else {
            return Err(TransportError::InvalidHandshakeMessage);
        };
        let value = value.trim();
        if name.eq_ignore_ascii_case("sec-websocket-accept") {
            if accept.is_some() {
                return Err(TransportError::DuplicateHandshakeHeader(
                    "Sec-WebSocket-Accept",
                ));
            }
            accept = Some(value);
        } else if name.eq_ignore_ascii_case("upgrade") {
            upgraded = value.eq_ignore_ascii_case("websocket");
        }
    }

    if !upgraded {
        return Err(TransportError::InvalidHandshakeMessage);
    }
    match accept {
        Some(value) if value == accept_for(key) => Ok(()),
        _ => Err(TransportError::InvalidHandshakeKey),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // The worked example from RFC 6455 §1.3.
    const RFC_KEY: &str = "dGhlIHNhbXBsZSBub25jZQ==";
    const RFC_ACCEPT: &str = "s3pPLMBiTxaQ9kYGzzhZRbK+xOo=";

    fn response_for(key: &str) -> String {
        format!(
            "HTTP/1.1 101 Switching Protocols\r\n\
             Upgrade: websocket\r\n\
             Connection: Upgrade\r\n\
             Sec-WebSocket-Accept: {}\r\n\r\n",
            accept_for(key)
        )
    }

    #[test]
    fn accept_matches_rfc_vector() {
        assert_eq!(accept_for(RFC_KEY), RFC_ACCEPT);
    }

    #[test]
    fn accepts_well_formed_response() {
        assert!(validate_response(&response_for(RFC_KEY), RFC_KEY).is_ok());
    }

    #[test]
    fn rejects_non_101_status() {
        let response = "HTTP/1.1 200 OK\r\n\r\n";
        assert!(matches!(
            validate_response(response, RFC_KEY),
            Err(TransportError::InvalidHandshakeMessage)
        ));
    }

    #[test]
    fn rejects_wrong_accept_key() {
        let response = response_for("c29tZSBvdGhlciBub25jZSE=");
        assert!(matches!(
            validate_response(&response, RFC_KEY),
            Err(TransportError::InvalidHandshakeKey)
        ));
    }

    #[test]
    fn rejects_missing_accept_header() {
        let response = "HTTP/1.1 101 Switching Protocols\r\nUpgrade: websocket\r\n\r\n";
        assert!(matches!(
            validate_response(response, RFC_KEY),
            Err(TransportError::InvalidHandshakeKey)
        ));
    }

    #[test]
    fn rejects_duplicate_accept_header() {
        let accept = accept_for(RFC_KEY);
        let response = format!(
            "HTTP/1.1 101 Switching Protocols\r\n\
             Upgrade: websocket\r\n\
             Sec-WebSocket-Accept: {accept}\r\n\
             Sec-WebSocket-Accept: {accept}\r\n\r\n"
        );
        assert!(matches!(
            validate_response(&response, RFC_KEY),
            Err(TransportError::DuplicateHandshakeHeader(_))
        ));
    }

    #[test]
    fn request_targets_the_endpoint() {
        let url = Url::parse("ws://node.example.org:8546/rpc?token=a").unwrap();
        let request = String::from_utf8(request_bytes(&url, RFC_KEY).unwrap()).unwrap();
        assert!(request.starts_with("GET /rpc?token=a HTTP/1.1\r\n"));
        assert!(request.contains("Host: node.example.org:8546\r\n"));
        assert!(request.contains("Sec-WebSocket-Version: 13\r\n"));
        assert!(request.ends_with("\r\n\r\n"));
    }
}
