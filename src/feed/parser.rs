use crate::post::Post;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Problems found while turning a feed document into posts.
///
/// None of these abort a parse: a `MalformedFeed` yields an empty result and a
/// `MalformedPostEntry` drops only the offending element.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The document has no `items` array.
    #[error("Malformed feed: {0}")]
    MalformedFeed(String),
    /// One element of `items` is not an object with the three string fields.
    #[error("Malformed post entry at index {index}: {reason}")]
    MalformedPostEntry { index: usize, reason: String },
}

/// Posts recovered from a feed document plus everything that was skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseReport {
    pub posts: Vec<Post>,
    pub errors: Vec<ParseError>,
}

/// Parse a feed document into posts, in source order.
///
/// Never fails: see [`parse_report`] for the recorded problems.
pub fn parse(raw: &Value) -> Vec<Post> {
    parse_report(raw).posts
}

/// Parse a feed document, keeping track of what could not be decoded.
///
/// Each element of `items` is decoded on its own so one bad entry does not
/// take the rest of the feed with it. Every problem is logged where it is found.
pub fn parse_report(raw: &Value) -> ParseReport {
    let items = match raw.get("items") {
        Some(Value::Array(items)) => items,
        Some(other) => {
            let error = ParseError::MalformedFeed(format!(
                "`items` is {}, expected an array",
                json_kind(other)
            ));
            tracing::warn!(error = %error, "Feed parse failed");
            return ParseReport {
                posts: Vec::new(),
                errors: vec![error],
            };
        }
        None => {
            let error = ParseError::MalformedFeed("missing `items` field".to_string());
            tracing::warn!(error = %error, "Feed parse failed");
            return ParseReport {
                posts: Vec::new(),
                errors: vec![error],
            };
        }
    };

    let mut report = ParseReport {
        posts: Vec::with_capacity(items.len()),
        errors: Vec::new(),
    };

    for (index, item) in items.iter().enumerate() {
        match decode_entry(item) {
            Ok(post) => report.posts.push(post),
            Err(reason) => {
                tracing::warn!(index, reason = %reason, "Skipping malformed post entry");
                report
                    .errors
                    .push(ParseError::MalformedPostEntry { index, reason });
            }
        }
    }

    tracing::debug!(
        posts = report.posts.len(),
        skipped = report.errors.len(),
        "Parsed feed"
    );
    report
}

fn decode_entry(item: &Value) -> Result<Post, String> {
    if !item.is_object() {
        return Err(format!("entry is {}, expected an object", json_kind(item)));
    }
    Post::deserialize(item).map_err(|e| e.to_string())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
