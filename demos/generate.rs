//! Submit the default template with a custom prompt, poll until done, and
//! save the first image.
//!
//! Requires a running ComfyUI instance (`COMFYUI_ENDPOINT`, default
//! http://127.0.0.1:8188/) with the default checkpoint installed.
//!
//! ```sh
//! cargo run --example generate -- "A tiger."
//! ```

use comfyui_job_client::{ComfyClient, GenerationOutcome, PollPolicy, DEFAULT_ENDPOINT};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("debug,hyper=warn,reqwest=warn")),
        )
        .init();

    let endpoint = std::env::var("COMFYUI_ENDPOINT").unwrap_or_else(|_| DEFAULT_ENDPOINT.into());
    let prompt = std::env::args().nth(1).unwrap_or_else(|| "A tiger.".into());

    let mut client = ComfyClient::new(endpoint);
    client.set_positive(&prompt)?;
    let seed = client.template_mut().randomize_seed()?;
    println!("Seed: {}", seed);

    let prompt_id = client.submit_job().await?;
    if prompt_id.is_empty() {
        eprintln!("ComfyUI accepted the job but returned no prompt_id");
        return Ok(());
    }
    println!("Queued prompt: {}", prompt_id);

    match client
        .wait_for_completion(&prompt_id, &PollPolicy::default())
        .await?
    {
        GenerationOutcome::Completed(history) => {
            let outputs = client.get_job_outputs(&history).await?;
            let Some(first) = outputs.first() else {
                eprintln!("Job finished without images");
                return Ok(());
            };
            println!("{} {:?} {}", first.folder_type, first.subfolder, first.filename);
            std::fs::write("output.png", &first.data)?;
            println!("Saved: output.png");
        }
        GenerationOutcome::Failed(history) => {
            eprintln!("Generation failed: {:?}", history.status_str())
        }
        GenerationOutcome::TimedOut { attempts } => {
            eprintln!("Still waiting after {} polls, giving up", attempts)
        }
    }

    Ok(())
}
