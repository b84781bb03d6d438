//! WebSocket transport for MCP
//!
//! rmcp ships no WebSocket transport, so JSON-RPC messages are framed over
//! tokio-tungstenite here: one message per text frame.

use std::marker::PhantomData;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::{Sink, Stream};
use rmcp::service::{RxJsonRpcMessage, ServiceRole, TxJsonRpcMessage};
use tokio_tungstenite::{tungstenite, MaybeTlsStream, WebSocketStream};

use crate::error::{Error, Result};

/// Client side WebSocket stream as returned by [`connect`]
pub type ClientStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

pin_project_lite::pin_project! {
    /// Adapts a WebSocket stream to rmcp's `Stream + Sink` transport shape.
    ///
    /// Outgoing messages become text frames. Incoming text frames are parsed
    /// as JSON-RPC; control frames, binary frames and unparseable text are
    /// skipped. A close frame ends the stream.
    pub struct WebSocketTransport<R, S, E> {
        #[pin]
        stream: S,
        marker: PhantomData<(fn() -> E, fn() -> R)>
    }
}

impl<R, S, E> WebSocketTransport<R, S, E> {
    /// Create a new WebSocket transport from any compatible stream
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            marker: PhantomData,
        }
    }
}

impl<R, S, E> Stream for WebSocketTransport<R, S, E>
where
    S: Stream<Item = std::result::Result<tungstenite::Message, E>>,
    R: ServiceRole,
    E: std::fmt::Display,
{
    type Item = RxJsonRpcMessage<R>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();
        loop {
            let frame = match this.stream.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(frame))) => frame,
                Poll::Ready(Some(Err(e))) => {
                    tracing::warn!(error = %e, "WebSocket error");
                    continue;
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            };
            let text = match frame {
                tungstenite::Message::Text(text) => text,
                tungstenite::Message::Close(reason) => {
                    tracing::debug!(?reason, "WebSocket closed by peer");
                    return Poll::Ready(None);
                }
                _ => continue,
            };
            match serde_json::from_str::<RxJsonRpcMessage<R>>(&text) {
                Ok(message) => return Poll::Ready(Some(message)),
                Err(e) => tracing::warn!(error = %e, "Failed to parse JSON-RPC message from WebSocket"),
            }
        }
    }
}

impl<R, S, E> Sink<TxJsonRpcMessage<R>> for WebSocketTransport<R, S, E>
where
    S: Sink<tungstenite::Message, Error = E>,
    R: ServiceRole,
    E: std::fmt::Display,
{
    type Error = Error;

    fn poll_ready(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<()>> {
        self.project().stream.poll_ready(cx).map_err(transport_error)
    }

    fn start_send(self: Pin<&mut Self>, item: TxJsonRpcMessage<R>) -> Result<()> {
        let json = serde_json::to_string(&item)?;
        self.project()
            .stream
            .start_send(tungstenite::Message::Text(json.into()))
            .map_err(transport_error)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<()>> {
        self.project().stream.poll_flush(cx).map_err(transport_error)
    }

    fn poll_close(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<()>> {
        self.project().stream.poll_close(cx).map_err(transport_error)
    }
}

fn transport_error(e: impl std::fmt::Display) -> Error {
    Error::Transport(format!("WebSocket error: {}", e))
}

/// Connect to a WebSocket MCP server
///
/// The returned transport can be passed to rmcp's `serve()`.
#[cfg(feature = "client")]
pub async fn connect(
    url: &str,
) -> Result<WebSocketTransport<rmcp::RoleClient, ClientStream, tungstenite::Error>> {
    let (stream, response) = tokio_tungstenite::connect_async(url)
        .await
        .map_err(|e| Error::Transport(format!("WebSocket connection failed: {}", e)))?;

    if response.status() != tungstenite::http::StatusCode::SWITCHING_PROTOCOLS {
        return Err(Error::Transport(format!(
            "WebSocket upgrade failed with status: {}",
            response.status()
        )));
    }

    Ok(WebSocketTransport::new(stream))
}
