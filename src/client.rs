use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use std::time::Duration;
use uuid::Uuid;

use crate::config::{ClientConfig, DEFAULT_ENDPOINT};
use crate::error::{ComfyError, Result};
use crate::poll::PollPolicy;
use crate::template::JobTemplate;
use crate::types::*;

fn normalize(endpoint: String) -> String {
    endpoint.trim_end_matches('/').to_string()
}

/// Async client for one ComfyUI server and one job template.
///
/// Each operation issues a single request and returns once it has been
/// answered; nothing runs in the background and nothing is retried.
/// Polling is either done by the caller with [`query_job`](Self::query_job)
/// or through [`wait_for_completion`](Self::wait_for_completion) with an
/// explicit [`PollPolicy`].
///
/// The template is owned by the client and mutated through `&mut self`,
/// so a client has a single writer at a time.
///
/// # Example
/// ```no_run
/// use comfyui_job_client::{ComfyClient, GenerationOutcome, PollPolicy};
///
/// # async fn example() -> comfyui_job_client::Result<()> {
/// let mut client = ComfyClient::default();
/// client.set_positive("A tiger.")?;
/// let prompt_id = client.submit_job().await?;
///
/// if let GenerationOutcome::Completed(history) =
///     client.wait_for_completion(&prompt_id, &PollPolicy::default()).await?
/// {
///     for output in client.get_job_outputs(&history).await? {
///         std::fs::write(&output.filename, &output.data).unwrap();
///     }
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ComfyClient {
    http: Client,
    endpoint: String,
    request_timeout: Option<Duration>,
    template: JobTemplate,
}

impl Default for ComfyClient {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT)
    }
}

impl ComfyClient {
    /// Create a new client pointing at the given ComfyUI endpoint, loaded
    /// with the default template.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            endpoint: normalize(endpoint.into()),
            request_timeout: None,
            template: JobTemplate::default(),
        }
    }

    pub fn from_config(config: ClientConfig) -> Self {
        Self {
            http: Client::new(),
            endpoint: normalize(config.endpoint),
            request_timeout: config.request_timeout,
            template: config.template,
        }
    }

    /// Use a custom `reqwest::Client` (for connection pooling, proxies, TLS).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// Replace the job template.
    pub fn with_template(mut self, template: JobTemplate) -> Self {
        self.template = template;
        self
    }

    /// Returns the configured endpoint URL, without a trailing slash.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn template(&self) -> &JobTemplate {
        &self.template
    }

    pub fn template_mut(&mut self) -> &mut JobTemplate {
        &mut self.template
    }

    // ── Template fields ─────────────────────────────────────────────

    pub fn width(&self) -> Option<u32> {
        self.template.width()
    }

    pub fn set_width(&mut self, width: u32) -> Result<()> {
        self.template.set_width(width)
    }

    pub fn height(&self) -> Option<u32> {
        self.template.height()
    }

    pub fn set_height(&mut self, height: u32) -> Result<()> {
        self.template.set_height(height)
    }

    pub fn seed(&self) -> Option<i64> {
        self.template.seed()
    }

    pub fn set_seed(&mut self, seed: i64) -> Result<()> {
        self.template.set_seed(seed)
    }

    pub fn positive(&self) -> Option<&str> {
        self.template.positive()
    }

    pub fn set_positive(&mut self, text: &str) -> Result<()> {
        self.template.set_positive(text)
    }

    pub fn negative(&self) -> Option<&str> {
        self.template.negative()
    }

    pub fn set_negative(&mut self, text: &str) -> Result<()> {
        self.template.set_negative(text)
    }

    // ── Prompt ──────────────────────────────────────────────────────

    /// Submit the current template. Returns the `prompt_id`.
    ///
    /// A successful response without a `prompt_id` is logged and yields an
    /// empty string rather than an error.
    #[tracing::instrument(skip(self), fields(endpoint = %self.endpoint))]
    pub async fn submit_job(&self) -> Result<String> {
        let client_id = Uuid::new_v4().to_string();
        tracing::debug!(%client_id, "submitting job");

        let url = format!("{}/prompt", self.endpoint);
        let body = serde_json::json!({
            "prompt": self.template.as_value(),
            "client_id": client_id,
        });

        let resp = self
            .timed(self.http.post(&url).json(&body))
            .send()
            .await
            .map_err(|e| ComfyError::Network {
                context: format!(
                    "Cannot connect to ComfyUI at {} (is the service running?)",
                    self.endpoint
                ),
                source: e,
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body_text = resp.text().await.unwrap_or_default();
            tracing::debug!(status = status.as_u16(), body = %body_text, "submit rejected");
            return Err(ComfyError::Http {
                status: status.as_u16(),
                body: body_text,
            });
        }

        let json: Value = resp.json().await.map_err(|e| ComfyError::Network {
            context: "Failed to parse ComfyUI /prompt response".into(),
            source: e,
        })?;

        if let Some(errors) = json.get("node_errors").and_then(|v| v.as_object()) {
            if !errors.is_empty() {
                tracing::warn!(nodes = ?errors.keys().collect::<Vec<_>>(), "ComfyUI reported node errors");
            }
        }

        let prompt_id = json
            .get("prompt_id")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        if prompt_id.is_empty() {
            tracing::warn!(
                status = status.as_u16(),
                "submission succeeded but no prompt_id was returned"
            );
        }

        tracing::debug!(%client_id, %prompt_id, "job submitted");
        Ok(prompt_id)
    }

    // ── History ─────────────────────────────────────────────────────

    /// Fetch the history record for a prompt.
    ///
    /// ComfyUI only lists a prompt once it has started executing, so
    /// [`ComfyError::NotFound`] is expected while a job is still queued.
    #[tracing::instrument(skip(self), fields(endpoint = %self.endpoint))]
    pub async fn query_job(&self, prompt_id: &str) -> Result<PromptHistory> {
        let url = format!("{}/history/{}", self.endpoint, prompt_id);
        let resp = self
            .timed(self.http.get(&url))
            .send()
            .await
            .map_err(|e| ComfyError::Network {
                context: "Failed to fetch ComfyUI history".into(),
                source: e,
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body_text = resp.text().await.unwrap_or_default();
            return Err(ComfyError::Http {
                status,
                body: body_text,
            });
        }

        let mut json: Value = resp.json().await.map_err(|e| ComfyError::Network {
            context: "Failed to parse ComfyUI history response".into(),
            source: e,
        })?;

        match json.get_mut(prompt_id).map(Value::take) {
            Some(entry) => Ok(PromptHistory::new(entry)),
            None => {
                tracing::debug!(
                    returned = ?json.as_object().map(|m| m.keys().collect::<Vec<_>>()),
                    "prompt_id not in history"
                );
                Err(ComfyError::NotFound(prompt_id.to_string()))
            }
        }
    }

    // ── Output download ─────────────────────────────────────────────

    /// Download one output file. `subfolder` defaults to `""` and
    /// `folder_type` to `"output"`.
    #[tracing::instrument(skip(self), fields(endpoint = %self.endpoint))]
    pub async fn download_output(
        &self,
        filename: &str,
        subfolder: Option<&str>,
        folder_type: Option<&str>,
    ) -> Result<Vec<u8>> {
        let url = reqwest::Url::parse_with_params(
            &format!("{}/view", self.endpoint),
            &[
                ("filename", filename),
                ("subfolder", subfolder.unwrap_or("")),
                ("type", folder_type.unwrap_or("output")),
            ],
        )
        .map_err(|e| ComfyError::InvalidResponse(format!("Bad image URL: {}", e)))?;

        let resp = self
            .timed(self.http.get(url))
            .send()
            .await
            .map_err(|e| ComfyError::Network {
                context: format!("Failed to fetch {} from ComfyUI", filename),
                source: e,
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body_text = resp.text().await.unwrap_or_default();
            return Err(ComfyError::Http {
                status,
                body: body_text,
            });
        }

        let bytes = resp.bytes().await.map_err(|e| ComfyError::Network {
            context: "Failed to read output bytes".into(),
            source: e,
        })?;
        tracing::debug!(len = bytes.len(), "downloaded output");
        Ok(bytes.to_vec())
    }

    /// Download an output by reference.
    pub async fn image(&self, img: &ImageRef) -> Result<Vec<u8>> {
        self.download_output(&img.filename, Some(&img.subfolder), Some(&img.img_type))
            .await
    }

    /// Download every image referenced by a history record, in order.
    pub async fn get_job_outputs(&self, history: &PromptHistory) -> Result<Vec<JobOutput>> {
        let refs = history.image_refs()?;
        let mut outputs = Vec::with_capacity(refs.len());
        for img in refs {
            let data = self.image(&img).await?;
            outputs.push(JobOutput {
                folder_type: img.img_type,
                subfolder: img.subfolder,
                filename: img.filename,
                data,
            });
        }
        tracing::debug!(count = outputs.len(), "collected job outputs");
        Ok(outputs)
    }

    // ── Completion waiting ──────────────────────────────────────────

    /// Poll `/history` under `policy` until the prompt settles.
    ///
    /// A prompt missing from history counts as still pending. Any other
    /// error ends the wait immediately.
    #[tracing::instrument(skip(self, policy), fields(endpoint = %self.endpoint))]
    pub async fn wait_for_completion(
        &self,
        prompt_id: &str,
        policy: &PollPolicy,
    ) -> Result<GenerationOutcome> {
        let start = tokio::time::Instant::now();
        for attempt in 0..policy.max_attempts {
            let delay = policy.delay_for(attempt);
            if let Some(timeout) = policy.timeout {
                if start.elapsed().saturating_add(delay) > timeout {
                    return Ok(GenerationOutcome::TimedOut { attempts: attempt });
                }
            }
            tokio::time::sleep(delay).await;

            match self.query_job(prompt_id).await {
                Ok(history) if history.is_success() => {
                    return Ok(GenerationOutcome::Completed(history));
                }
                Ok(history) if history.is_error() || history.completed() => {
                    return Ok(GenerationOutcome::Failed(history));
                }
                Ok(history) => {
                    tracing::debug!(attempt, status = ?history.status_str(), "still running");
                }
                Err(ComfyError::NotFound(_)) => {
                    tracing::debug!(attempt, "not in history yet");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(GenerationOutcome::TimedOut {
            attempts: policy.max_attempts,
        })
    }

    fn timed(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.request_timeout {
            Some(timeout) => builder.timeout(timeout),
            None => builder,
        }
    }
}
