use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("failed to connect to {endpoint}: {source}")] Connect {
        endpoint: String,
        #[source]
        source: Box<tungstenite::Error>,
    },
    #[error("transport error: {0}")] Transport(#[from] Box<tungstenite::Error>),
}

/// Source of raw quote frames.
///
/// Frames arrive in send order per symbol but unordered across symbols.
/// `None` means the feed has closed; an error is terminal as well.
#[async_trait]
pub trait QuoteFeed: Send {
    async fn next_frame(&mut self) -> Option<Result<String, FeedError>>;
}

/// In-memory feed backed by a channel, used for replay and tests
pub struct ChannelFeed {
    frames: mpsc::Receiver<String>,
}

impl ChannelFeed {
    pub fn new(frames: mpsc::Receiver<String>) -> Self {
        Self { frames }
    }

    /// Feed plus the sender that drives it. Dropping the sender closes the feed.
    pub fn channel(buffer: usize) -> (mpsc::Sender<String>, Self) {
        let (tx, rx) = mpsc::channel(buffer);
        (tx, Self::new(rx))
    }
}

#[async_trait]
impl QuoteFeed for ChannelFeed {
    async fn next_frame(&mut self) -> Option<Result<String, FeedError>> {
        self.frames.recv().await.map(Ok)
    }
}
