//! HTTP invocation.

use crate::core::error::{HarnessError, HarnessResult};
use std::time::{Duration, Instant};

/// Capability to issue a blocking HTTP GET and return the response body.
pub trait HttpClient {
    /// Fetch `url`. Connection failures, timeouts and non-2xx statuses are
    /// all reported as [`HarnessError::Network`].
    fn get_text(&self, url: &str) -> HarnessResult<String>;
}

/// [`HttpClient`] backed by a `ureq` agent with a fixed overall timeout.
pub struct UreqClient {
    agent: ureq::Agent,
    timeout: Duration,
}

impl UreqClient {
    /// Create a client whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self { agent, timeout }
    }

    /// Timeout applied to each request.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl std::fmt::Debug for UreqClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UreqClient")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl HttpClient for UreqClient {
    fn get_text(&self, url: &str) -> HarnessResult<String> {
        let start = Instant::now();
        let network = |detail: String| HarnessError::Network {
            url: url.to_string(),
            detail,
        };

        let response = self.agent.get(url).call().map_err(|err| match err {
            ureq::Error::Status(code, _) => network(format!("HTTP status {code}")),
            ureq::Error::Transport(transport) => network(transport.to_string()),
        })?;
        let body = response
            .into_string()
            .map_err(|err| network(format!("reading body: {err}")))?;

        log::debug!("GET {} -> {} bytes in {}ms", url, body.len(), start.elapsed().as_millis());
        Ok(body)
    }
}
