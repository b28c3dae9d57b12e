//! Feed document fetching and parsing.
//!
//! - `parser` turns a JSON feed document into [`Post`](crate::post::Post)
//!   records, skipping entries it cannot decode
//! - `client` issues the single GET for the document and hands the body to
//!   the parser
//!
//! # Example
//!
//! ```ignore
//! use postfeed::feed::FeedClient;
//!
//! let client = FeedClient::new(http, "http://petty.hol.es/volley", "/social_media.json");
//! let report = client.fetch_feed().await?;
//! println!("{} posts, {} skipped", report.posts.len(), report.errors.len());
//! ```

mod client;
mod parser;

pub use client::{FeedClient, FetchError};
pub use parser::{parse, parse_report, ParseError, ParseReport};
