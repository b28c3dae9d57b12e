//! The shared HTTP client.
//!
//! One `reqwest::Client` is built per process and cloned into the feed client
//! and the image loader, so both share a connection pool. No request timeout
//! is set; requests run until the transport gives up.

use crate::config::Config;
use reqwest::redirect::Policy;

/// Limits redirects to 5 hops and stops on loops.
fn create_redirect_policy() -> Policy {
    Policy::custom(|attempt| {
        if attempt.previous().len() >= 5 {
            return attempt.error("Too many redirects (max 5)");
        }

        let url = attempt.url();
        if attempt.previous().iter().any(|prev| prev.as_str() == url.as_str()) {
            return attempt.error("Redirect loop detected");
        }

        tracing::debug!(
            from = %attempt.previous().last().map(|u| u.as_str()).unwrap_or("initial"),
            to = %url,
            hop = attempt.previous().len() + 1,
            "Following redirect"
        );

        attempt.follow()
    })
}

pub fn build_client(config: &Config) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(config.user_agent.as_str())
        .redirect(create_redirect_policy())
        .pool_max_idle_per_host(4)
        .pool_idle_timeout(std::time::Duration::from_secs(30))
        .tcp_keepalive(std::time::Duration::from_secs(60))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_client_sends_user_agent() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("user-agent", "postfeed-test"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let config = Config {
            user_agent: "postfeed-test".to_string(),
            ..Config::default()
        };
        let client = build_client(&config).unwrap();
        let response = client.get(mock_server.uri()).send().await.unwrap();
        assert!(response.status().is_success());
    }

    #[tokio::test]
    async fn test_redirect_loop_rejected() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/a"))
            .respond_with(
                ResponseTemplate::new(302).insert_header("Location", "/b"),
            )
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/b"))
            .respond_with(
                ResponseTemplate::new(302).insert_header("Location", "/a"),
            )
            .mount(&mock_server)
            .await;

        let client = build_client(&Config::default()).unwrap();
        let result = client.get(format!("{}/a", mock_server.uri())).send().await;
        assert!(result.is_err());
    }
}
