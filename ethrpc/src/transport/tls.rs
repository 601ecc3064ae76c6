//! Process-wide TLS client configuration for `wss` endpoints.

use std::sync::{Arc, OnceLock};

use rustls::{ClientConfig, RootCertStore};
use tokio_rustls::TlsConnector;

static TLS_CONFIG: OnceLock<Arc<ClientConfig>> = OnceLock::new();

/// Returns a connector over the shared client configuration.
///
/// The native root-certificate store is scanned exactly once per process;
/// certificates that fail to parse are skipped.
pub(crate) fn connector() -> TlsConnector {
    let config = TLS_CONFIG.get_or_init(|| {
        let mut roots = RootCertStore::empty();
        for cert in rustls_native_certs::load_native_certs().certs {
            let _ = roots.add(cert);
        }
        Arc::new(
            ClientConfig::builder()
                .with_root_certificates(roots)
                .with_no_client_auth(),
        )
    });
    TlsConnector::from(Arc::clone(config))
}
