//! Endpoint parsing and per-transport validation.

use std::path::{Path, PathBuf};

use url::Url;

use crate::error::TransportError;

/// Location of a JSON-RPC peer.
///
/// HTTP and WebSocket transports require a [`Endpoint::Uri`]; the IPC
/// transport requires a [`Endpoint::Path`]. Handing the wrong variant to a
/// driver is a startup error, not a runtime one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// An `http`, `https`, `ws`, or `wss` URI.
    Uri(Url),
    /// The filesystem path of a Unix-domain socket.
    Path(PathBuf),
}

impl Endpoint {
    /// Parses a raw endpoint string.
    ///
    /// Strings carrying a scheme separator are parsed as URIs and must use
    /// one of `http`, `https`, `ws`, `wss`; anything else is treated as a
    /// socket path.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::UnsupportedSchema`] for unknown URI schemes
    /// and [`TransportError::InvalidEndpointConfig`] for malformed URIs.
    pub fn parse(raw: &str) -> Result<Self, TransportError> {
        if raw.contains("://") {
            let url = Url::parse(raw).map_err(|_| TransportError::InvalidEndpointConfig)?;
            match url.scheme() {
                "http" | "https" | "ws" | "wss" => Ok(Self::Uri(url)),
                other => Err(TransportError::UnsupportedSchema(other.to_owned())),
            }
        } else {
            Ok(Self::Path(PathBuf::from(raw)))
        }
    }

    /// Returns the URI if this endpoint is one and its scheme is allowed.
    pub(crate) fn require_uri(&self, schemes: &[&str]) -> Result<&Url, TransportError> {
        match self {
            Self::Uri(url) if schemes.contains(&url.scheme()) => Ok(url),
            Self::Uri(url) => Err(TransportError::UnsupportedSchema(url.scheme().to_owned())),
            Self::Path(_) => Err(TransportError::InvalidEndpointConfig),
        }
    }

    /// Returns the socket path if this endpoint is one.
    pub(crate) fn require_path(&self) -> Result<&Path, TransportError> {
        match self {
            Self::Path(path) => Ok(path),
            Self::Uri(_) => Err(TransportError::InvalidEndpointConfig),
        }
    }
}

impl From<Url> for Endpoint {
    fn from(url: Url) -> Self {
        Self::Uri(url)
    }
}

impl From<PathBuf> for Endpoint {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_http_uri() {
        let endpoint = Endpoint::parse("http://localhost:8545").unwrap();
        assert!(matches!(endpoint, Endpoint::Uri(_)));
        assert!(endpoint.require_uri(&["http", "https"]).is_ok());
    }

    #[test]
    fn parses_socket_path() {
        let endpoint = Endpoint::parse("/tmp/reth.ipc").unwrap();
        assert_eq!(endpoint, Endpoint::Path(PathBuf::from("/tmp/reth.ipc")));
        assert!(endpoint.require_path().is_ok());
    }

    #[test]
    fn rejects_unknown_scheme() {
        let result = Endpoint::parse("ftp://localhost");
        assert!(matches!(result, Err(TransportError::UnsupportedSchema(s)) if s == "ftp"));
    }

    #[test]
    fn rejects_scheme_mismatch() {
        let endpoint = Endpoint::parse("ws://localhost:8546").unwrap();
        assert!(matches!(
            endpoint.require_uri(&["http", "https"]),
            Err(TransportError::UnsupportedSchema(_))
        ));
    }

    #[test]
    fn rejects_kind_mismatch() {
        let uri = Endpoint::parse("http://localhost:8545").unwrap();
        assert!(matches!(
            uri.require_path(),
            Err(TransportError::InvalidEndpointConfig)
        ));

        let path = Endpoint::parse("/var/run/geth.ipc").unwrap();
        assert!(matches!(
            path.require_uri(&["http", "https"]),
            Err(TransportError::InvalidEndpointConfig)
        ));
    }

    #[test]
    fn default_ports_are_known() {
        let Endpoint::Uri(url) = Endpoint::parse("wss://mainnet.example.org").unwrap() else {
            panic!("expected a uri endpoint");
        };
        assert_eq!(url.port_or_known_default(), Some(443));
    }
}
