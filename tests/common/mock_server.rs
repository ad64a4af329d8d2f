//! Mock HTTP server serving reference tables.

use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

/// Wrapper around wiremock MockServer with convenience methods
pub struct MockPaletteServer {
    pub server: MockServer,
}

impl MockPaletteServer {
    /// Start a new mock HTTP server
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        Self { server }
    }

    /// Get URL for a specific path
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.server.uri(), path)
    }

    /// Serve a CSV table at `endpoint`, expecting exactly `calls` fetches.
    ///
    /// The expectation is verified when the server is dropped.
    pub async fn mock_csv(&self, endpoint: &str, csv: &str, calls: u64) {
        Mock::given(method("GET"))
            .and(path(endpoint))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(csv)
                    .insert_header("content-type", "text/csv"),
            )
            .expect(calls)
            .mount(&self.server)
            .await;
    }

    /// Mock a GET endpoint returning a bare status code
    pub async fn mock_status(&self, endpoint: &str, status: u16) {
        Mock::given(method("GET"))
            .and(path(endpoint))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }
}
