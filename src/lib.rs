//! # comfyui-job-client
//!
//! Thin async client for a [ComfyUI](https://github.com/comfyanonymous/ComfyUI)
//! server: edit a job template through typed accessors, submit it, query
//! its history, and download the images it produced.
//!
//! The client never retries on its own. Poll with
//! [`ComfyClient::query_job`] yourself, or hand a [`PollPolicy`] to
//! [`ComfyClient::wait_for_completion`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use comfyui_job_client::{ComfyClient, GenerationOutcome, PollPolicy};
//! use std::time::Duration;
//!
//! # async fn example() -> comfyui_job_client::Result<()> {
//! let mut client = ComfyClient::new("http://127.0.0.1:8188");
//! client.set_positive("a sunset over mountains")?;
//! client.set_width(768)?;
//!
//! let prompt_id = client.submit_job().await?;
//! let policy = PollPolicy::builder()
//!     .with_interval(Duration::from_secs(2))
//!     .with_max_attempts(60)
//!     .build();
//!
//! match client.wait_for_completion(&prompt_id, &policy).await? {
//!     GenerationOutcome::Completed(history) => {
//!         for out in client.get_job_outputs(&history).await? {
//!             println!("{}/{}/{}: {} bytes", out.folder_type, out.subfolder, out.filename, out.data.len());
//!         }
//!     }
//!     GenerationOutcome::Failed(history) => eprintln!("failed: {:?}", history.status_str()),
//!     GenerationOutcome::TimedOut { attempts } => eprintln!("gave up after {} polls", attempts),
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod poll;
pub mod template;
pub mod types;
pub mod workflow;

pub use client::ComfyClient;
pub use config::{ClientConfig, DEFAULT_ENDPOINT};
pub use error::{ComfyError, Result};
pub use poll::{Backoff, PollPolicy};
pub use template::{FieldMap, FieldPath, JobTemplate};
pub use types::{GenerationOutcome, ImageRef, JobOutput, PromptHistory};
pub use workflow::Txt2ImgRequest;
