pub mod decode;
pub mod feed;
pub mod ws_client;

pub use decode::{ decode_frame, DecodeError };
pub use feed::{ ChannelFeed, FeedError, QuoteFeed };
pub use ws_client::WsQuoteFeed;
