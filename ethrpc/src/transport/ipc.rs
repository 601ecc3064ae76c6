//! Unix-domain-socket transport driver.
//!
//! IPC peers stream raw bytes with no framing layer, so messages are
//! delimited by top-level JSON object brace balance: the reader keeps a
//! `{…}` depth counter (string- and escape-aware) and emits one message
//! every time the depth returns to zero.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::value::RawValue;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::config::NetworkConfig;
use crate::error::TransportError;
use crate::retry::backoff_delay;
use crate::transport::router::MessageRouter;
use crate::transport::{DuplexTransport, Transport};

/// Default read-buffer growth step.
pub const DEFAULT_IPC_CHUNK_SIZE: usize = 64 * 1024;

/// JSON-RPC over a Unix-domain socket.
#[derive(Debug)]
pub struct IpcTransport {
    writer: Mutex<OwnedWriteHalf>,
    router: Arc<MessageRouter>,
    read_task: JoinHandle<()>,
}

impl IpcTransport {
    /// Connects to the endpoint's socket path with the default chunk size.
    pub async fn connect(config: &NetworkConfig) -> Result<Self, TransportError> {
        Self::connect_with_chunk_size(config, DEFAULT_IPC_CHUNK_SIZE).await
    }

    /// Connects with a custom read-buffer growth step.
    ///
    /// # Errors
    ///
    /// [`TransportError::InvalidEndpointConfig`] for URI endpoints; connect
    /// failures retry with backoff up to `config.retries` before
    /// [`TransportError::FailedToConnect`].
    pub async fn connect_with_chunk_size(
        config: &NetworkConfig,
        chunk_size: usize,
    ) -> Result<Self, TransportError> {
        let path = config.endpoint.require_path()?;

        let mut attempt = 0u32;
        let stream = loop {
            match UnixStream::connect(path).await {
                Ok(stream) => break stream,
                Err(_) if attempt < config.retries => {
                    tokio::time::sleep(backoff_delay(attempt)).await;
                    attempt += 1;
                }
                Err(_) => {
                    return Err(TransportError::FailedToConnect {
                        endpoint: path.display().to_string(),
                        attempts: config.retries + 1,
                    });
                }
            }
        };

        let (read_half, write_half) = stream.into_split();
        let router = Arc::new(MessageRouter::new());
        let read_task = spawn_read_loop(read_half, Arc::clone(&router), chunk_size.max(1));

        Ok(Self {
            writer: Mutex::new(write_half),
            router,
            read_task,
        })
    }
}

fn spawn_read_loop(
    mut reader: OwnedReadHalf,
    router: Arc<MessageRouter>,
    chunk_size: usize,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(error) = read_loop(&mut reader, &router, chunk_size).await {
            tracing::debug!(%error, "ipc read loop terminated");
        }
        router.close();
    })
}

async fn read_loop(
    reader: &mut OwnedReadHalf,
    router: &MessageRouter,
    chunk_size: usize,
) -> Result<(), TransportError> {
    let mut scanner = MessageScanner::default();
    let mut chunk = vec![0u8; chunk_size];
    loop {
        let read = reader.read(&mut chunk).await?;
        if read == 0 {
            return Ok(());
        }
        scanner.extend(&chunk[..read]);
        while let Some(message) = scanner.next_message() {
            let text =
                String::from_utf8(message).map_err(|_| TransportError::InvalidUtf8Payload)?;
            router.route(RawValue::from_string(text)?).await;
        }
    }
}

#[async_trait]
impl Transport for IpcTransport {
    async fn send_rpc_request(&self, body: String) -> Result<Box<RawValue>, TransportError> {
        {
            let mut writer = self.writer.lock().await;
            writer.write_all(body.as_bytes()).await?;
            writer.flush().await?;
        }
        self.router.pop_reply().await
    }
}

#[async_trait]
impl DuplexTransport for IpcTransport {
    async fn next_notification(&self) -> Result<Box<RawValue>, TransportError> {
        self.router.pop_notification().await
    }

    fn shutdown(&self) {
        self.read_task.abort();
        self.router.close();
    }
}

impl Drop for IpcTransport {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Brace-balance delimiter over an accumulating byte buffer.
///
/// Bytes outside any top-level object (stray whitespace, newlines) are
/// discarded. Braces inside string literals do not count toward the depth.
#[derive(Debug, Default)]
pub(crate) struct MessageScanner {
    buffer: Vec<u8>,
    cursor: usize,
    depth: usize,
    in_string: bool,
    escaped: bool,
    message_start: Option<usize>,
}

impl MessageScanner {
    pub(crate) fn extend(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// Pops the next complete top-level object, if the buffer holds one.
    pub(crate) fn next_message(&mut self) -> Option<Vec<u8>> {
        while self.cursor < self.buffer.len() {
            let position = self.cursor;
            let byte = self.buffer[position];
            self.cursor += 1;

            if self.in_string {
                if self.escaped {
                    self.escaped = false;
                } else if byte == b'\\' {
                    self.escaped = true;
                } else if byte == b'"' {
                    self.in_string = false;
                }
                continue;
            }

            match byte {
                b'"' if self.depth > 0 => self.in_string = true,
                b'{' => {
                    if self.depth == 0 {
                        self.message_start = Some(position);
                    }
                    self.depth += 1;
                }
                b'}' => {
                    self.depth = self.depth.saturating_sub(1);
                    if self.depth == 0 {
                        if let Some(start) = self.message_start.take() {
                            let message = self.buffer[start..=position].to_vec();
                            self.buffer.drain(..=position);
                            self.cursor = 0;
                            return Some(message);
                        }
                    }
                }
                _ => {}
            }
        }

        // Nothing complete; drop consumed garbage outside any message.
        if self.depth == 0 && self.message_start.is_none() && self.cursor > 0 {
            self.buffer.drain(..self.cursor);
            self.cursor = 0;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::Endpoint;
    use tokio::net::UnixListener;

    #[test]
    fn emits_one_message_per_balanced_object() {
        let mut scanner = MessageScanner::default();
        scanner.extend(br#"{"id":1,"result":{"nested":true}}{"id":2,"result":null}"#);
        assert_eq!(
            scanner.next_message().unwrap(),
            br#"{"id":1,"result":{"nested":true}}"#.to_vec()
        );
        assert_eq!(
            scanner.next_message().unwrap(),
            br#"{"id":2,"result":null}"#.to_vec()
        );
        assert!(scanner.next_message().is_none());
    }

    #[test]
    fn messages_split_across_chunks_are_reassembled() {
        let mut scanner = MessageScanner::default();
        scanner.extend(br#"{"id":1,"res"#);
        assert!(scanner.next_message().is_none());
        scanner.extend(br#"ult":"0x1"}"#);
        assert_eq!(
            scanner.next_message().unwrap(),
            br#"{"id":1,"result":"0x1"}"#.to_vec()
        );
    }

    #[test]
    fn braces_inside_strings_do_not_delimit() {
        let mut scanner = MessageScanner::default();
        scanner.extend(br#"{"message":"a } inside \" and {"}"#);
        assert_eq!(
            scanner.next_message().unwrap(),
            br#"{"message":"a } inside \" and {"}"#.to_vec()
        );
    }

    #[test]
    fn interstitial_noise_is_discarded() {
        let mut scanner = MessageScanner::default();
        scanner.extend(b"\n \n{\"id\":1}\n\n{\"id\":2}\n");
        assert_eq!(scanner.next_message().unwrap(), br#"{"id":1}"#.to_vec());
        assert_eq!(scanner.next_message().unwrap(), br#"{"id":2}"#.to_vec());
        assert!(scanner.next_message().is_none());
    }

    #[test]
    fn delimiter_never_splits_a_message() {
        // The first closing brace that balances the message delimits exactly
        // one message; trailing bytes stay buffered for the next one.
        let mut scanner = MessageScanner::default();
        scanner.extend(br#"{"a":{"b":1}}{"c":"#);
        assert_eq!(scanner.next_message().unwrap(), br#"{"a":{"b":1}}"#.to_vec());
        assert!(scanner.next_message().is_none());
        scanner.extend(br#"2}"#);
        assert_eq!(scanner.next_message().unwrap(), br#"{"c":2}"#.to_vec());
    }

    async fn scripted_listener() -> (UnixListener, NetworkConfig, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("node.ipc");
        let listener = UnixListener::bind(&path).unwrap();
        let config = NetworkConfig::new(Endpoint::Path(path), 1);
        (listener, config, dir)
    }

    #[tokio::test]
    async fn request_reply_round_trip() {
        let (listener, config, _dir) = scripted_listener().await;
        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buffer = vec![0u8; 1024];
            let read = stream.read(&mut buffer).await.unwrap();
            assert!(buffer[..read].starts_with(b"{"));
            stream
                .write_all(br#"{"jsonrpc":"2.0","id":1,"result":"0x1"}"#)
                .await
                .unwrap();
            stream
        });

        let transport = IpcTransport::connect(&config).await.unwrap();
        let reply = transport
            .send_rpc_request(r#"{"jsonrpc":"2.0","id":1,"method":"eth_chainId","params":[]}"#.into())
            .await
            .unwrap();
        assert!(reply.get().contains("\"result\":\"0x1\""));
        drop(server.await.unwrap());
    }

    #[tokio::test]
    async fn reply_split_across_writes_is_reassembled() {
        let (listener, config, _dir) = scripted_listener().await;
        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buffer = vec![0u8; 1024];
            let _ = stream.read(&mut buffer).await.unwrap();
            stream.write_all(br#"{"jsonrpc":"2.0","#).await.unwrap();
            stream.flush().await.unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            stream.write_all(br#""id":1,"result":"0x2a"}"#).await.unwrap();
            stream
        });

        let transport = IpcTransport::connect_with_chunk_size(&config, 8).await.unwrap();
        let reply = transport.send_rpc_request("{}".into()).await.unwrap();
        assert!(reply.get().contains("\"result\":\"0x2a\""));
        drop(server.await.unwrap());
    }

    #[tokio::test]
    async fn notification_and_reply_in_one_write_are_split() {
        let (listener, config, _dir) = scripted_listener().await;
        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buffer = vec![0u8; 1024];
            let _ = stream.read(&mut buffer).await.unwrap();
            stream
                .write_all(
                    br#"{"jsonrpc":"2.0","method":"eth_subscription","params":{"subscription":"0x5","result":{}}}{"jsonrpc":"2.0","id":1,"result":"0x1"}"#,
                )
                .await
                .unwrap();
            stream
        });

        let transport = IpcTransport::connect(&config).await.unwrap();
        let reply = transport.send_rpc_request("{}".into()).await.unwrap();
        assert!(reply.get().contains("\"result\":\"0x1\""));
        let notification = transport.next_notification().await.unwrap();
        assert!(notification.get().contains("\"subscription\":\"0x5\""));
        drop(server.await.unwrap());
    }

    #[tokio::test]
    async fn rejects_uri_endpoints() {
        let config = NetworkConfig::new(Endpoint::parse("http://localhost:8545").unwrap(), 1);
        let result = IpcTransport::connect(&config).await;
        assert!(matches!(
            result,
            Err(TransportError::InvalidEndpointConfig)
        ));
    }
}
