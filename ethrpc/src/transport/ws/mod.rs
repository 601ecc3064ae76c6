//! WebSocket transport driver.
//!
//! One long-lived connection per transport, with a read loop task that
//! validates frames, answers pings, reassembles fragmented messages, and
//! routes parsed payloads into the reply stack or the subscription queue.

mod frame;
mod handshake;

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use async_trait::async_trait;
use serde_json::value::RawValue;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf, ReadHalf, WriteHalf};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_rustls::client::TlsStream;
use url::Url;

use crate::config::NetworkConfig;
use crate::error::TransportError;
use crate::retry::backoff_delay;
use crate::transport::router::MessageRouter;
use crate::transport::{DuplexTransport, Transport, tls};

use frame::Opcode;

/// A plain or TLS-wrapped TCP stream.
#[derive(Debug)]
enum WsStream {
    Plain(TcpStream),
    Tls(Box<TlsStream<TcpStream>>),
}

impl AsyncRead for WsStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_read(cx, buf),
            Self::Tls(stream) => Pin::new(stream.as_mut()).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for WsStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_write(cx, buf),
            Self::Tls(stream) => Pin::new(stream.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_flush(cx),
            Self::Tls(stream) => Pin::new(stream.as_mut()).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_shutdown(cx),
            Self::Tls(stream) => Pin::new(stream.as_mut()).poll_shutdown(cx),
        }
    }
}

/// JSON-RPC over a single RFC 6455 connection.
#[derive(Debug)]
pub struct WsTransport {
    writer: Arc<Mutex<WriteHalf<WsStream>>>,
    router: Arc<MessageRouter>,
    read_task: JoinHandle<()>,
}

impl WsTransport {
    /// Connects to a `ws`/`wss` endpoint, performs the opening handshake,
    /// and spawns the read loop.
    ///
    /// # Errors
    ///
    /// Endpoint-shape errors surface immediately; connect failures retry
    /// with backoff up to `config.retries` before
    /// [`TransportError::FailedToConnect`].
    pub async fn connect(config: &NetworkConfig) -> Result<Self, TransportError> {
        let url = config.endpoint.require_uri(&["ws", "wss"])?.clone();
        let mut stream = connect_stream(&url, config.retries).await?;
        handshake::perform(&mut stream, &url).await?;

        let (read_half, write_half) = tokio::io::split(stream);
        let writer = Arc::new(Mutex::new(write_half));
        let router = Arc::new(MessageRouter::new());
        let read_task = spawn_read_loop(read_half, Arc::clone(&writer), Arc::clone(&router));

        Ok(Self {
            writer,
            router,
            read_task,
        })
    }
}

async fn connect_stream(url: &Url, retries: u32) -> Result<WsStream, TransportError> {
    let host = url.host_str().ok_or(TransportError::InvalidEndpointConfig)?;
    let port = url.port_or_known_default().unwrap_or(80);

    let mut attempt = 0u32;
    let tcp = loop {
        match TcpStream::connect((host, port)).await {
            Ok(stream) => break stream,
            Err(_) if attempt < retries => {
                tokio::time::sleep(backoff_delay(attempt)).await;
                attempt += 1;
            }
            Err(_) => {
                return Err(TransportError::FailedToConnect {
                    endpoint: url.to_string(),
                    attempts: retries + 1,
                });
            }
        }
    };

    if url.scheme() == "wss" {
        let name = rustls::pki_types::ServerName::try_from(host.to_owned())
            .map_err(|_| TransportError::InvalidServerName)?;
        let stream = tls::connector().connect(name, tcp).await?;
        Ok(WsStream::Tls(Box::new(stream)))
    } else {
        Ok(WsStream::Plain(tcp))
    }
}

fn spawn_read_loop(
    mut reader: ReadHalf<WsStream>,
    writer: Arc<Mutex<WriteHalf<WsStream>>>,
    router: Arc<MessageRouter>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(error) = read_loop(&mut reader, &writer, &router).await {
            tracing::debug!(%error, "websocket read loop terminated");
        }
        router.close();
    })
}

async fn read_loop(
    reader: &mut ReadHalf<WsStream>,
    writer: &Mutex<WriteHalf<WsStream>>,
    router: &MessageRouter,
) -> Result<(), TransportError> {
    let mut pending: Option<Vec<u8>> = None;
    loop {
        let frame = frame::read_frame(reader).await?;
        match frame.opcode {
            Opcode::Text | Opcode::Binary => {
                if pending.is_some() {
                    return Err(TransportError::UnexpectedFragment);
                }
                if frame.fin {
                    deliver(router, frame.payload).await?;
                } else {
                    pending = Some(frame.payload);
                }
            }
            Opcode::Continuation => {
                let Some(mut buffer) = pending.take() else {
                    return Err(TransportError::UnexpectedFragment);
                };
                buffer.extend_from_slice(&frame.payload);
                if frame.fin {
                    deliver(router, buffer).await?;
                } else {
                    pending = Some(buffer);
                }
            }
            Opcode::Ping => {
                let mut writer = writer.lock().await;
                frame::write_frame(&mut *writer, Opcode::Pong, &frame.payload, rand::random())
                    .await?;
            }
            Opcode::Pong => {}
            Opcode::Close => {
                // Echo the close and tear down gracefully.
                let mut writer = writer.lock().await;
                let _ =
                    frame::write_frame(&mut *writer, Opcode::Close, &frame.payload, rand::random())
                        .await;
                return Ok(());
            }
        }
    }
}

async fn deliver(router: &MessageRouter, payload: Vec<u8>) -> Result<(), TransportError> {
    let text = String::from_utf8(payload).map_err(|_| TransportError::InvalidUtf8Payload)?;
    router.route(RawValue::from_string(text)?).await;
    Ok(())
}

#[async_trait]
impl Transport for WsTransport {
    async fn send_rpc_request(&self, body: String) -> Result<Box<RawValue>, TransportError> {
        {
            let mut writer = self.writer.lock().await;
            frame::write_frame(&mut *writer, Opcode::Text, body.as_bytes(), rand::random())
                .await?;
        }
        self.router.pop_reply().await
    }
}

#[async_trait]
impl DuplexTransport for WsTransport {
    async fn next_notification(&self) -> Result<Box<RawValue>, TransportError> {
        self.router.pop_notification().await
    }

    fn shutdown(&self) {
        self.read_task.abort();
        self.router.close();
    }
}

impl Drop for WsTransport {
    fn drop(&mut self) {
        self.shutdown();
    }
}
