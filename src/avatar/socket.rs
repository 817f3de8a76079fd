//! Avatar vendor WebSocket transport

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::{connect_async, tungstenite};

use crate::{Error, Result};

/// An open socket to the avatar vendor
#[async_trait]
pub trait AvatarSocket: Send + Sync {
    /// Send one text frame
    async fn send_text(&self, text: String) -> Result<()>;

    /// Close the socket. Must tolerate repeated calls.
    fn close(&self);
}

/// Opens avatar sockets
#[async_trait]
pub trait SocketConnector: Send + Sync {
    async fn connect(&self, endpoint: &str, token: Option<&str>) -> Result<Box<dyn AvatarSocket>>;
}

/// [`SocketConnector`] over `tokio-tungstenite`
#[derive(Debug, Clone, Copy, Default)]
pub struct TungsteniteConnector;

#[async_trait]
impl SocketConnector for TungsteniteConnector {
    async fn connect(&self, endpoint: &str, token: Option<&str>) -> Result<Box<dyn AvatarSocket>> {
        let mut request = endpoint.into_client_request()?;
        if let Some(token) = token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| Error::WebSocket(format!("invalid access token: {e}")))?;
            request.headers_mut().insert("authorization", value);
        }

        let (stream, _) = connect_async(request).await.map_err(|e| match &e {
            tungstenite::Error::Http(resp) if matches!(resp.status().as_u16(), 401 | 403) => {
                Error::Api {
                    status: resp.status().as_u16(),
                    message: "avatar socket rejected credentials".to_string(),
                }
            }
            _ => Error::from(e),
        })?;
        tracing::debug!(endpoint, "avatar socket connected");

        let (mut sink, mut source) = stream.split();
        let (tx, mut rx) = mpsc::unbounded_channel::<tungstenite::Message>();

        let writer = tokio::spawn(async move {
            while let Some(msg) = rx.recv().await {
                let closing = matches!(msg, tungstenite::Message::Close(_));
                if let Err(e) = sink.send(msg).await {
                    tracing::warn!(error = %e, "avatar socket send failed");
                    break;
                }
                if closing {
                    break;
                }
            }
            let _ = sink.close().await;
        });

        let reader = tokio::spawn(async move {
            while let Some(msg) = source.next().await {
                match msg {
                    Ok(tungstenite::Message::Text(text)) => {
                        tracing::trace!(bytes = text.len(), "avatar socket event");
                    }
                    Ok(tungstenite::Message::Close(frame)) => {
                        match frame {
                            Some(frame) => tracing::info!(
                                code = %frame.code,
                                reason = %frame.reason,
                                "avatar socket closed by vendor"
                            ),
                            None => tracing::info!("avatar socket closed by vendor"),
                        }
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!(error = %e, "avatar socket error");
                        break;
                    }
                }
            }
        });

        Ok(Box::new(TungsteniteSocket { tx, writer, reader }))
    }
}

struct TungsteniteSocket {
    tx: mpsc::UnboundedSender<tungstenite::Message>,
    writer: JoinHandle<()>,
    reader: JoinHandle<()>,
}

#[async_trait]
impl AvatarSocket for TungsteniteSocket {
    async fn send_text(&self, text: String) -> Result<()> {
        if self.writer.is_finished() {
            return Err(Error::WebSocket("avatar socket is closed".to_string()));
        }
        self.tx
            .send(tungstenite::Message::Text(text.into()))
            .map_err(|_| Error::WebSocket("avatar socket is closed".to_string()))
    }

    fn close(&self) {
        // the writer exits after flushing the close frame
        let _ = self.tx.send(tungstenite::Message::Close(None));
        self.reader.abort();
    }
}

impl Drop for TungsteniteSocket {
    fn drop(&mut self) {
        self.close();
    }
}
