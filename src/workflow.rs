use rand::Rng;
use serde_json::{json, Map};

use crate::template::JobTemplate;

/// Builder for a txt2img ComfyUI job template.
///
/// Constructs the stock 7-node pipeline: CheckpointLoader → CLIP encoders
/// → KSampler → VAEDecode → SaveImage, numbered the same way as
/// [`default_workflow`](crate::template::default_workflow) so the default
/// [`FieldMap`](crate::template::FieldMap) applies.
///
/// # Example
/// ```
/// use comfyui_job_client::Txt2ImgRequest;
///
/// let (template, seed) = Txt2ImgRequest::new("a cat in space", "dreamshaper_8.safetensors")
///     .negative("lowres, blurry")
///     .size(512, 768)
///     .steps(25)
///     .cfg_scale(7.5)
///     .build();
///
/// assert!(seed > 0);
/// assert_eq!(template.positive(), Some("a cat in space"));
/// assert_eq!(template.seed(), Some(seed));
/// ```
#[derive(Debug, Clone)]
pub struct Txt2ImgRequest {
    pub positive_prompt: String,
    pub negative_prompt: String,
    pub checkpoint: String,
    pub width: u32,
    pub height: u32,
    pub steps: u32,
    pub cfg_scale: f64,
    pub sampler: String,
    pub scheduler: String,
    pub seed: i64,
    pub batch_size: u32,
    pub filename_prefix: String,
}

impl Txt2ImgRequest {
    /// Create a new request with a prompt and checkpoint. Uses sensible defaults
    /// for all other parameters (512x768, 25 steps, cfg 7.5, dpmpp_2m/karras).
    pub fn new(prompt: impl Into<String>, checkpoint: impl Into<String>) -> Self {
        Self {
            positive_prompt: prompt.into(),
            negative_prompt: String::new(),
            checkpoint: checkpoint.into(),
            width: 512,
            height: 768,
            steps: 25,
            cfg_scale: 7.5,
            sampler: "dpmpp_2m".to_string(),
            scheduler: "karras".to_string(),
            seed: -1,
            batch_size: 1,
            filename_prefix: "ComfyUI".to_string(),
        }
    }

    /// Set the negative prompt.
    pub fn negative(mut self, prompt: impl Into<String>) -> Self {
        self.negative_prompt = prompt.into();
        self
    }

    /// Set output dimensions.
    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn steps(mut self, steps: u32) -> Self {
        self.steps = steps;
        self
    }

    /// Set the classifier-free guidance scale.
    pub fn cfg_scale(mut self, cfg: f64) -> Self {
        self.cfg_scale = cfg;
        self
    }

    /// Set the sampler algorithm (e.g. "euler", "dpmpp_2m", "dpmpp_sde").
    pub fn sampler(mut self, sampler: impl Into<String>) -> Self {
        self.sampler = sampler.into();
        self
    }

    /// Set the noise scheduler (e.g. "normal", "karras", "exponential").
    pub fn scheduler(mut self, scheduler: impl Into<String>) -> Self {
        self.scheduler = scheduler.into();
        self
    }

    /// Set a specific seed. Any value below 1 (the default is -1) means random.
    pub fn seed(mut self, seed: i64) -> Self {
        self.seed = seed;
        self
    }

    pub fn batch_size(mut self, size: u32) -> Self {
        self.batch_size = size;
        self
    }

    /// Set the output filename prefix in ComfyUI.
    pub fn filename_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.filename_prefix = prefix.into();
        self
    }

    /// Build the job template and resolve the seed.
    ///
    /// Returns `(template, actual_seed)`. When `seed` is not positive, a
    /// random positive seed is generated and returned so it can be stored
    /// with the image.
    pub fn build(&self) -> (JobTemplate, i64) {
        let seed = if self.seed < 1 {
            rand::rng().random_range(1..i64::MAX)
        } else {
            self.seed
        };

        let mut nodes = Map::new();
        nodes.insert(
            "3".into(),
            json!({
                "class_type": "KSampler",
                "inputs": {
                    "seed": seed,
                    "steps": self.steps,
                    "cfg": self.cfg_scale,
                    "sampler_name": self.sampler,
                    "scheduler": self.scheduler,
                    "denoise": 1.0,
                    "model": ["4", 0],
                    "positive": ["6", 0],
                    "negative": ["7", 0],
                    "latent_image": ["5", 0]
                }
            }),
        );
        nodes.insert(
            "4".into(),
            json!({
                "class_type": "CheckpointLoaderSimple",
                "inputs": {
                    "ckpt_name": self.checkpoint
                }
            }),
        );
        nodes.insert(
            "5".into(),
            json!({
                "class_type": "EmptyLatentImage",
                "inputs": {
                    "width": self.width,
                    "height": self.height,
                    "batch_size": self.batch_size
                }
            }),
        );
        nodes.insert(
            "6".into(),
            json!({
                "class_type": "CLIPTextEncode",
                "inputs": {
                    "text": self.positive_prompt,
                    "clip": ["4", 1]
                }
            }),
        );
        nodes.insert(
            "7".into(),
            json!({
                "class_type": "CLIPTextEncode",
                "inputs": {
                    "text": self.negative_prompt,
                    "clip": ["4", 1]
                }
            }),
        );
        nodes.insert(
            "8".into(),
            json!({
                "class_type": "VAEDecode",
                "inputs": {
                    "samples": ["3", 0],
                    "vae": ["4", 2]
                }
            }),
        );
        nodes.insert(
            "9".into(),
            json!({
                "class_type": "SaveImage",
                "inputs": {
                    "filename_prefix": self.filename_prefix,
                    "images": ["8", 0]
                }
            }),
        );

        (JobTemplate::from_object(nodes), seed)
    }
}
