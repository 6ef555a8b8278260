use async_trait::async_trait;
use futures::{ SinkExt, StreamExt };
use tokio::net::TcpStream;
use tokio_tungstenite::{ connect_async, MaybeTlsStream, WebSocketStream };
use tracing::{ debug, info, trace };
use tungstenite::protocol::Message;
use url::Url;

use super::feed::{ FeedError, QuoteFeed };

/// Websocket quote feed against a single endpoint
pub struct WsQuoteFeed {
    endpoint: Url,
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsQuoteFeed {
    pub async fn connect(endpoint: &Url) -> Result<Self, FeedError> {
        info!("Connecting to quote feed: {}", endpoint);

        let (stream, _) = connect_async(endpoint.as_str()).await.map_err(|e| FeedError::Connect {
            endpoint: endpoint.to_string(),
            source: Box::new(e),
        })?;

        info!("Connected to quote feed");

        Ok(Self { endpoint: endpoint.clone(), stream })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl QuoteFeed for WsQuoteFeed {
    async fn next_frame(&mut self) -> Option<Result<String, FeedError>> {
        loop {
            let message = match self.stream.next().await? {
                Ok(message) => message,
                Err(e) => {
                    return Some(Err(FeedError::Transport(Box::new(e))));
                }
            };

            match message {
                Message::Text(text) => {
                    return Some(Ok(text.as_str().to_owned()));
                }
                Message::Ping(data) => {
                    trace!("Ping received, replying with pong");
                    if let Err(e) = self.stream.send(Message::Pong(data)).await {
                        return Some(Err(FeedError::Transport(Box::new(e))));
                    }
                }
                Message::Close(frame) => {
                    info!(?frame, "Quote feed closed by server");
                    return None;
                }
                Message::Binary(data) => {
                    debug!(len = data.len(), "Ignoring binary frame");
                }
                _ => {}
            }
        }
    }
}
