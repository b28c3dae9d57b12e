use crate::feed::parser::{parse_report, ParseReport};
use futures::StreamExt;
use thiserror::Error;

const MAX_FEED_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Errors that can occur while fetching the feed document.
///
/// Any of these leaves the adapter's backing sequence untouched.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Response body exceeded the 10MB size limit
    #[error("Response too large")]
    ResponseTooLarge,
    /// Response was incomplete (received fewer bytes than Content-Length)
    #[error("Incomplete response: expected {expected} bytes, received {received}")]
    IncompleteResponse { expected: u64, received: usize },
    /// Body is not JSON at all
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// Body is JSON but the top level is not an object
    #[error("Feed document is not a JSON object")]
    NotAnObject,
}

/// Fetches and parses the feed document at `base_url + path`.
///
/// Cloning is cheap: the underlying `reqwest::Client` shares its pool.
#[derive(Debug, Clone)]
pub struct FeedClient {
    http: reqwest::Client,
    base_url: String,
    path: String,
}

impl FeedClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            path: path.into(),
        }
    }

    /// The feed document URL. Base and path are concatenated as-is.
    pub fn url(&self) -> String {
        format!("{}{}", self.base_url, self.path)
    }

    /// Issues exactly one GET for the feed document and parses it.
    ///
    /// There is no retry and no timeout beyond what the HTTP client was built
    /// with. A document without a usable `items` array is not an error here:
    /// it comes back as an empty [`ParseReport`] carrying a `MalformedFeed`.
    ///
    /// # Errors
    ///
    /// - [`FetchError::Network`] - Connection or TLS errors
    /// - [`FetchError::HttpStatus`] - Non-2xx HTTP response
    /// - [`FetchError::ResponseTooLarge`] / [`FetchError::IncompleteResponse`] - Body problems
    /// - [`FetchError::Json`] / [`FetchError::NotAnObject`] - Top-level document is unusable
    pub async fn fetch_feed(&self) -> Result<ParseReport, FetchError> {
        let url = self.url();
        tracing::debug!(url = %url, "Fetching feed");

        let response = self.http.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(FetchError::HttpStatus(response.status().as_u16()));
        }

        let bytes = read_limited_bytes(response, MAX_FEED_SIZE).await?;
        let document: serde_json::Value = serde_json::from_slice(&bytes)?;
        if !document.is_object() {
            return Err(FetchError::NotAnObject);
        }

        let report = parse_report(&document);
        tracing::info!(
            url = %url,
            posts = report.posts.len(),
            skipped = report.errors.len(),
            "Feed fetched"
        );
        Ok(report)
    }
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    let expected_length = response.content_length();

    // Fast path: check Content-Length header
    if let Some(len) = expected_length {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    if let Some(expected) = expected_length {
        if (bytes.len() as u64) < expected {
            return Err(FetchError::IncompleteResponse {
                expected,
                received: bytes.len(),
            });
        }
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::ParseError;
    use crate::post::Post;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ONE_POST: &str =
        r#"{"items":[{"titulo":"A","descripcion":"B","imagen":"/a.png"}]}"#;

    fn client_for(server: &MockServer) -> FeedClient {
        FeedClient::new(
            reqwest::Client::new(),
            format!("{}/volley", server.uri()),
            "/social_media.json",
        )
    }

    #[test]
    fn test_url_is_plain_concatenation() {
        let client = FeedClient::new(
            reqwest::Client::new(),
            "http://petty.hol.es/volley",
            "/social_media.json",
        );
        assert_eq!(client.url(), "http://petty.hol.es/volley/social_media.json");
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/volley/social_media.json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(ONE_POST)
                    .insert_header("Content-Type", "application/json"),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let report = client_for(&mock_server).fetch_feed().await.unwrap();
        assert_eq!(report.posts, vec![Post::new("A", "B", "/a.png")]);
        assert!(report.errors.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_404_error_not_retried() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&mock_server)
            .await;

        match client_for(&mock_server).fetch_feed().await {
            Err(FetchError::HttpStatus(404)) => {}
            other => panic!("Expected HttpStatus(404), got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_500_error_not_retried() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&mock_server)
            .await;

        let result = client_for(&mock_server).fetch_feed().await;
        assert!(matches!(result, Err(FetchError::HttpStatus(500))));
    }

    #[tokio::test]
    async fn test_invalid_json_is_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
            .mount(&mock_server)
            .await;

        let result = client_for(&mock_server).fetch_feed().await;
        assert!(matches!(result, Err(FetchError::Json(_))));
    }

    #[tokio::test]
    async fn test_top_level_array_is_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
            .mount(&mock_server)
            .await;

        let result = client_for(&mock_server).fetch_feed().await;
        assert!(matches!(result, Err(FetchError::NotAnObject)));
    }

    #[tokio::test]
    async fn test_missing_items_yields_empty_report() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"data":[]}"#))
            .mount(&mock_server)
            .await;

        let report = client_for(&mock_server).fetch_feed().await.unwrap();
        assert!(report.posts.is_empty());
        assert!(matches!(report.errors[..], [ParseError::MalformedFeed(_)]));
    }

    #[tokio::test]
    async fn test_oversized_body_rejected() {
        let mock_server = MockServer::start().await;
        let body = format!(r#"{{"items":[],"pad":"{}"}}"#, "x".repeat(MAX_FEED_SIZE));
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&mock_server)
            .await;

        let result = client_for(&mock_server).fetch_feed().await;
        assert!(matches!(result, Err(FetchError::ResponseTooLarge)));
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        // Nothing listens on port 1
        let client = FeedClient::new(reqwest::Client::new(), "http://127.0.0.1:1", "/feed.json");
        let result = client.fetch_feed().await;
        assert!(matches!(result, Err(FetchError::Network(_))));
    }
}
