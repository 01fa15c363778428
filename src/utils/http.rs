//! HTTP client utilities.

use reqwest::{Client, RequestBuilder};
use std::sync::Arc;
use std::time::Duration;

/// Request timeout for the resolver service. Kept short: when the network
/// transport stalls, the local-process fallback is the recovery path, so a
/// hung request only delays the fallback.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Shared HTTP client used by every transport
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Arc<Client>,
}

impl HttpClient {
    /// Client with the default user agent and timeouts
    pub fn new() -> Self {
        Self::with_timeout(REQUEST_TIMEOUT)
    }

    /// Client with a custom request timeout
    pub fn with_timeout(timeout: Duration) -> Self {
        let user_agent = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client: Arc::new(client),
        }
    }

    /// Start a GET request
    pub fn get(&self, url: &str) -> RequestBuilder {
        self.client.get(url)
    }

    /// Start a POST request
    pub fn post(&self, url: &str) -> RequestBuilder {
        self.client.post(url)
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}
