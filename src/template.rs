use rand::Rng;
use serde_json::{json, Map, Value};

use crate::error::{ComfyError, Result};

/// Location of a single scalar inside a job template: `document[node]["inputs"][input]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    pub node: String,
    pub input: String,
}

impl FieldPath {
    pub fn new(node: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            input: input.into(),
        }
    }
}

impl std::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.inputs.{}", self.node, self.input)
    }
}

/// Where the named fields of a template live.
///
/// The default matches [`default_workflow`]. Custom templates with a
/// different node numbering supply their own map via
/// [`JobTemplate::with_fields`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMap {
    pub width: FieldPath,
    pub height: FieldPath,
    pub seed: FieldPath,
    pub positive: FieldPath,
    pub negative: FieldPath,
}

impl Default for FieldMap {
    fn default() -> Self {
        Self {
            width: FieldPath::new("5", "width"),
            height: FieldPath::new("5", "height"),
            seed: FieldPath::new("3", "seed"),
            positive: FieldPath::new("6", "text"),
            negative: FieldPath::new("7", "text"),
        }
    }
}

/// The stock ComfyUI txt2img API workflow.
///
/// `3` KSampler, `4` CheckpointLoaderSimple, `5` EmptyLatentImage,
/// `6`/`7` positive/negative CLIPTextEncode, `8` VAEDecode, `9` SaveImage.
pub fn default_workflow() -> Value {
    json!({
        "3": {
            "class_type": "KSampler",
            "inputs": {
                "cfg": 8,
                "denoise": 1,
                "latent_image": ["5", 0],
                "model": ["4", 0],
                "negative": ["7", 0],
                "positive": ["6", 0],
                "sampler_name": "euler",
                "scheduler": "normal",
                "seed": 8566257,
                "steps": 20
            }
        },
        "4": {
            "class_type": "CheckpointLoaderSimple",
            "inputs": {
                "ckpt_name": "v1-5-pruned-emaonly.safetensors"
            }
        },
        "5": {
            "class_type": "EmptyLatentImage",
            "inputs": {
                "batch_size": 1,
                "height": 512,
                "width": 512
            }
        },
        "6": {
            "class_type": "CLIPTextEncode",
            "inputs": {
                "clip": ["4", 1],
                "text": "masterpiece best quality girl"
            }
        },
        "7": {
            "class_type": "CLIPTextEncode",
            "inputs": {
                "clip": ["4", 1],
                "text": "bad hands"
            }
        },
        "8": {
            "class_type": "VAEDecode",
            "inputs": {
                "samples": ["3", 0],
                "vae": ["4", 2]
            }
        },
        "9": {
            "class_type": "SaveImage",
            "inputs": {
                "filename_prefix": "ComfyUI",
                "images": ["8", 0]
            }
        }
    })
}

/// A ComfyUI API-format workflow with typed accessors over a few named fields.
///
/// The document itself is opaque: it is submitted verbatim and only the
/// paths listed in its [`FieldMap`] are ever read or written. Setters
/// validate first and leave the document untouched on error.
#[derive(Debug, Clone, PartialEq)]
pub struct JobTemplate {
    document: Value,
    fields: FieldMap,
}

impl Default for JobTemplate {
    fn default() -> Self {
        Self {
            document: default_workflow(),
            fields: FieldMap::default(),
        }
    }
}

impl JobTemplate {
    /// Wrap an API-format workflow. The document must be a JSON object.
    pub fn from_value(document: Value) -> Result<Self> {
        if !document.is_object() {
            return Err(ComfyError::InvalidInput(
                "job template must be a JSON object keyed by node id".into(),
            ));
        }
        Ok(Self {
            document,
            fields: FieldMap::default(),
        })
    }

    /// Wrap an already-validated node map.
    pub fn from_object(nodes: Map<String, Value>) -> Self {
        Self {
            document: Value::Object(nodes),
            fields: FieldMap::default(),
        }
    }

    /// Parse an API-format workflow from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        Self::from_value(serde_json::from_str(text)?)
    }

    /// Replace the field map used by the accessors.
    pub fn with_fields(mut self, fields: FieldMap) -> Self {
        self.fields = fields;
        self
    }

    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    pub fn as_value(&self) -> &Value {
        &self.document
    }

    pub fn into_value(self) -> Value {
        self.document
    }

    // ── Getters ─────────────────────────────────────────────────────

    pub fn width(&self) -> Option<u32> {
        self.get(&self.fields.width)
            .and_then(Value::as_u64)
            .and_then(|v| u32::try_from(v).ok())
    }

    pub fn height(&self) -> Option<u32> {
        self.get(&self.fields.height)
            .and_then(Value::as_u64)
            .and_then(|v| u32::try_from(v).ok())
    }

    pub fn seed(&self) -> Option<i64> {
        self.get(&self.fields.seed).and_then(Value::as_i64)
    }

    pub fn positive(&self) -> Option<&str> {
        self.get(&self.fields.positive).and_then(Value::as_str)
    }

    pub fn negative(&self) -> Option<&str> {
        self.get(&self.fields.negative).and_then(Value::as_str)
    }

    // ── Setters ─────────────────────────────────────────────────────

    pub fn set_width(&mut self, width: u32) -> Result<()> {
        if width == 0 {
            return Err(ComfyError::InvalidArgument(format!(
                "width must be positive: {}",
                width
            )));
        }
        inputs_mut(&mut self.document, &self.fields.width)?
            .insert(self.fields.width.input.clone(), json!(width));
        Ok(())
    }

    pub fn set_height(&mut self, height: u32) -> Result<()> {
        if height == 0 {
            return Err(ComfyError::InvalidArgument(format!(
                "height must be positive: {}",
                height
            )));
        }
        inputs_mut(&mut self.document, &self.fields.height)?
            .insert(self.fields.height.input.clone(), json!(height));
        Ok(())
    }

    pub fn set_seed(&mut self, seed: i64) -> Result<()> {
        if seed <= 0 {
            return Err(ComfyError::InvalidArgument(format!(
                "seed must be positive: {}",
                seed
            )));
        }
        inputs_mut(&mut self.document, &self.fields.seed)?
            .insert(self.fields.seed.input.clone(), json!(seed));
        Ok(())
    }

    /// Set the positive prompt. Blank or whitespace-only text is rejected.
    pub fn set_positive(&mut self, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Err(ComfyError::InvalidArgument(
                "positive prompt must have content".into(),
            ));
        }
        inputs_mut(&mut self.document, &self.fields.positive)?
            .insert(self.fields.positive.input.clone(), json!(text));
        Ok(())
    }

    /// Set the negative prompt. Any text, including empty, is accepted.
    pub fn set_negative(&mut self, text: &str) -> Result<()> {
        inputs_mut(&mut self.document, &self.fields.negative)?
            .insert(self.fields.negative.input.clone(), json!(text));
        Ok(())
    }

    /// Write a fresh random positive seed and return it.
    pub fn randomize_seed(&mut self) -> Result<i64> {
        let seed = rand::rng().random_range(1..i64::MAX);
        self.set_seed(seed)?;
        Ok(seed)
    }

    fn get(&self, path: &FieldPath) -> Option<&Value> {
        self.document
            .get(&path.node)?
            .get("inputs")?
            .get(&path.input)
    }
}

fn inputs_mut<'a>(document: &'a mut Value, path: &FieldPath) -> Result<&'a mut Map<String, Value>> {
    document
        .get_mut(&path.node)
        .and_then(|node| node.get_mut("inputs"))
        .and_then(Value::as_object_mut)
        .ok_or_else(|| {
            ComfyError::InvalidInput(format!("template has no inputs object for {}", path))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_template_fields() {
        let t = JobTemplate::default();
        assert_eq!(t.width(), Some(512));
        assert_eq!(t.height(), Some(512));
        assert_eq!(t.seed(), Some(8566257));
        assert_eq!(t.positive(), Some("masterpiece best quality girl"));
        assert_eq!(t.negative(), Some("bad hands"));
    }

    #[test]
    fn test_positive_values_round_trip() {
        let mut t = JobTemplate::default();
        for v in [1u32, 64, 768, 2048, u32::MAX] {
            t.set_width(v).unwrap();
            t.set_height(v).unwrap();
            assert_eq!(t.width(), Some(v));
            assert_eq!(t.height(), Some(v));
        }
        for s in [1i64, 42, 8566257, i64::MAX] {
            t.set_seed(s).unwrap();
            assert_eq!(t.seed(), Some(s));
        }
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        let mut t = JobTemplate::default();
        t.set_width(640).unwrap();
        t.set_height(480).unwrap();

        assert!(matches!(t.set_width(0), Err(ComfyError::InvalidArgument(_))));
        assert!(matches!(t.set_height(0), Err(ComfyError::InvalidArgument(_))));
        assert_eq!(t.width(), Some(640));
        assert_eq!(t.height(), Some(480));
    }

    #[test]
    fn test_non_positive_seed_rejected() {
        let mut t = JobTemplate::default();
        t.set_seed(7).unwrap();
        for s in [0i64, -1, i64::MIN] {
            assert!(matches!(t.set_seed(s), Err(ComfyError::InvalidArgument(_))));
            assert_eq!(t.seed(), Some(7));
        }
    }

    #[test]
    fn test_positive_prompt() {
        let mut t = JobTemplate::default();
        t.set_positive("A tiger.").unwrap();
        assert_eq!(t.positive(), Some("A tiger."));

        for blank in ["", " ", "\t\n  "] {
            assert!(matches!(
                t.set_positive(blank),
                Err(ComfyError::InvalidArgument(_))
            ));
        }
        assert_eq!(t.positive(), Some("A tiger."));
    }

    #[test]
    fn test_negative_prompt_accepts_blank() {
        let mut t = JobTemplate::default();
        t.set_negative("").unwrap();
        assert_eq!(t.negative(), Some(""));
        t.set_negative("   ").unwrap();
        assert_eq!(t.negative(), Some("   "));
    }

    #[test]
    fn test_setter_writes_into_document() {
        let mut t = JobTemplate::default();
        t.set_width(1024).unwrap();
        t.set_positive("a lighthouse").unwrap();
        let doc = t.as_value();
        assert_eq!(doc["5"]["inputs"]["width"], 1024);
        assert_eq!(doc["6"]["inputs"]["text"], "a lighthouse");
        // untouched neighbours
        assert_eq!(doc["5"]["inputs"]["batch_size"], 1);
        assert_eq!(doc["6"]["inputs"]["clip"], json!(["4", 1]));
    }

    #[test]
    fn test_custom_field_map() {
        let doc = json!({
            "10": {"inputs": {"w": 256, "h": 128}},
            "11": {"inputs": {"noise_seed": 3}},
            "12": {"inputs": {"prompt": "pos"}},
            "13": {"inputs": {"prompt": "neg"}}
        });
        let fields = FieldMap {
            width: FieldPath::new("10", "w"),
            height: FieldPath::new("10", "h"),
            seed: FieldPath::new("11", "noise_seed"),
            positive: FieldPath::new("12", "prompt"),
            negative: FieldPath::new("13", "prompt"),
        };
        let mut t = JobTemplate::from_value(doc).unwrap().with_fields(fields);
        assert_eq!(t.width(), Some(256));
        assert_eq!(t.height(), Some(128));
        assert_eq!(t.seed(), Some(3));
        assert_eq!(t.positive(), Some("pos"));

        t.set_seed(99).unwrap();
        assert_eq!(t.as_value()["11"]["inputs"]["noise_seed"], 99);
    }

    #[test]
    fn test_missing_node_is_invalid_input() {
        let mut t = JobTemplate::from_json(r#"{"1": {"inputs": {}}}"#).unwrap();
        assert_eq!(t.width(), None);
        assert!(matches!(t.set_width(10), Err(ComfyError::InvalidInput(_))));
        // validation runs before the path lookup
        assert!(matches!(t.set_width(0), Err(ComfyError::InvalidArgument(_))));
        assert_eq!(t.as_value(), &json!({"1": {"inputs": {}}}));
    }

    #[test]
    fn test_non_object_template_rejected() {
        assert!(matches!(
            JobTemplate::from_value(json!([1, 2, 3])),
            Err(ComfyError::InvalidInput(_))
        ));
        assert!(matches!(
            JobTemplate::from_json("not json"),
            Err(ComfyError::Json(_))
        ));
    }

    #[test]
    fn test_randomize_seed() {
        let mut t = JobTemplate::default();
        let seed = t.randomize_seed().unwrap();
        assert!(seed > 0);
        assert_eq!(t.seed(), Some(seed));
    }

    #[test]
    fn test_field_path_display() {
        assert_eq!(FieldPath::new("5", "width").to_string(), "5.inputs.width");
    }
}
