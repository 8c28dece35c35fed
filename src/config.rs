use std::time::Duration;

use crate::template::JobTemplate;

/// Default ComfyUI address.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8188/";

/// Configuration for a [`ComfyClient`](crate::ComfyClient).
///
/// Use [`ClientConfig::builder()`] for ergonomic construction, or
/// [`ClientConfig::default()`] for the local server with the stock template.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the ComfyUI server.
    pub endpoint: String,

    /// Per-request timeout. `None` leaves it to the transport.
    pub request_timeout: Option<Duration>,

    /// Job template loaded into the client.
    pub template: JobTemplate,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_timeout: None,
            template: JobTemplate::default(),
        }
    }
}

impl ClientConfig {
    /// Start building a config with the builder pattern.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }
}

/// Builder for [`ClientConfig`].
#[derive(Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = endpoint.into();
        self
    }

    /// Bound each HTTP request. Polling cadence is separate, see [`PollPolicy`](crate::PollPolicy).
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = Some(timeout);
        self
    }

    pub fn with_template(mut self, template: JobTemplate) -> Self {
        self.config.template = template;
        self
    }

    /// Build the final [`ClientConfig`].
    pub fn build(self) -> ClientConfig {
        self.config
    }
}
