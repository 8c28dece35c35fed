use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ComfyError, Result};

/// Reference to an image stored in ComfyUI's output directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub filename: String,
    pub subfolder: String,
    #[serde(rename = "type")]
    pub img_type: String,
}

impl ImageRef {
    /// A reference in the top-level `output` folder.
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            subfolder: String::new(),
            img_type: "output".to_string(),
        }
    }
}

/// One downloaded artifact: `(folder_type, subfolder, filename, bytes)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutput {
    pub folder_type: String,
    pub subfolder: String,
    pub filename: String,
    pub data: Vec<u8>,
}

/// History record for a single prompt, as returned by `/history/{prompt_id}`.
///
/// Kept as raw JSON; the helpers only read `status` and `outputs`.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptHistory(Value);

impl PromptHistory {
    pub fn new(record: Value) -> Self {
        Self(record)
    }

    pub fn raw(&self) -> &Value {
        &self.0
    }

    pub fn into_raw(self) -> Value {
        self.0
    }

    /// `status.completed`, false when absent.
    pub fn completed(&self) -> bool {
        self.0
            .pointer("/status/completed")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// `status.status_str`, e.g. `"success"` or `"error"`.
    pub fn status_str(&self) -> Option<&str> {
        self.0.pointer("/status/status_str").and_then(Value::as_str)
    }

    pub fn is_success(&self) -> bool {
        self.completed() && self.status_str() == Some("success")
    }

    pub fn is_error(&self) -> bool {
        self.status_str() == Some("error")
    }

    /// Every image referenced under `outputs`, in document order.
    ///
    /// Output nodes without an `images` list and image entries without a
    /// `filename` are logged and skipped.
    pub fn image_refs(&self) -> Result<Vec<ImageRef>> {
        let outputs = self
            .0
            .get("outputs")
            .and_then(Value::as_object)
            .ok_or_else(|| {
                ComfyError::InvalidInput("'outputs' key not found in history".into())
            })?;

        let mut refs = Vec::new();
        for (node_id, node_output) in outputs {
            tracing::debug!(node_id = %node_id, "scanning history outputs");
            let Some(images) = node_output.get("images").and_then(Value::as_array) else {
                tracing::warn!(node_id = %node_id, "'images' key not found in history outputs");
                continue;
            };
            for image in images {
                let Some(filename) = image.get("filename").and_then(Value::as_str) else {
                    tracing::warn!(node_id = %node_id, "'filename' key not found in image entry, skipping");
                    continue;
                };
                let subfolder = image
                    .get("subfolder")
                    .and_then(Value::as_str)
                    .unwrap_or("");
                let img_type = image
                    .get("type")
                    .and_then(Value::as_str)
                    .unwrap_or("output");
                refs.push(ImageRef {
                    filename: filename.to_string(),
                    subfolder: subfolder.to_string(),
                    img_type: img_type.to_string(),
                });
            }
        }
        Ok(refs)
    }
}

/// Outcome of polling a prompt until it settles.
#[derive(Debug, Clone)]
pub enum GenerationOutcome {
    /// The job completed with `status_str == "success"`.
    Completed(PromptHistory),
    /// ComfyUI reported an error, or completed without success.
    Failed(PromptHistory),
    /// The poll policy ran out before the job settled.
    TimedOut { attempts: u32 },
}
