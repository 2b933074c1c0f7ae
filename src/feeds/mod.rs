pub mod http;
pub mod ics;
pub mod normalize;
pub mod traits;
pub mod types;

pub use http::HttpFeedClient;
pub use ics::{fetch_and_parse, parse_feed};
pub use normalize::normalize;
pub use traits::FeedSource;
pub use types::{ParsedFeed, RawOccurrence};
