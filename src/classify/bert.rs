// src/classify/bert.rs
//! BERT sequence-classification backend on candle.
//!
//! Resolves config/tokenizer/weights from the Hugging Face hub (or a local
//! model directory), then runs the standard classification forward pass:
//! encoder → CLS pooler (tanh) → classification head → softmax.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use candle_core::{DType, Device, IndexOp, Tensor, D};
use candle_nn::{Linear, Module, VarBuilder};
use candle_transformers::models::bert::{BertModel, Config};
use hf_hub::{api::sync::Api, Repo, RepoType};
use tokenizers::{Tokenizer, TruncationParams};
use tracing::info;

use crate::error::ClassifyError;

use super::{ModelConfig, RawPrediction, ScoringModel};

/// Token-level truncation applied by the tokenizer, independent of the
/// character-level bound checked upstream.
pub const MODEL_MAX_TOKENS: usize = 512;

/// Minimal view of the hub `config.json` for the label mapping; the model
/// architecture itself is parsed by candle's `Config`.
#[derive(Debug, serde::Deserialize)]
struct LabelConfig {
    #[serde(default)]
    id2label: Option<HashMap<String, String>>,
}

pub struct BertScorer {
    bert: BertModel,
    pooler: Linear,
    classifier: Linear,
    tokenizer: Tokenizer,
    device: Device,
    id2label: HashMap<String, String>,
}

impl BertScorer {
    /// One-time model load. May fail fatally (missing files, bad weights);
    /// the caller logs and re-raises.
    pub fn load(cfg: &ModelConfig) -> Result<Self> {
        let device = if cfg.use_cpu {
            Device::Cpu
        } else {
            Device::cuda_if_available(0)?
        };

        info!(model = %cfg.model_id, "loading classification model");

        let (config_path, tokenizer_path, weights_path, use_pth) =
            resolve_model_files(&cfg.model_id)?;

        let config_raw = std::fs::read_to_string(&config_path)
            .with_context(|| format!("reading model config {config_path}"))?;
        let config: Config = serde_json::from_str(&config_raw)?;
        let labels: LabelConfig = serde_json::from_str(&config_raw)?;
        let id2label = labels.id2label.unwrap_or_default();
        let num_labels = id2label.len().max(2);

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("loading tokenizer: {e}"))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MODEL_MAX_TOKENS,
                ..Default::default()
            }))
            .map_err(|e| anyhow!("configuring truncation: {e}"))?;

        let vb = if use_pth {
            VarBuilder::from_pth(&weights_path, DType::F32, &device)?
        } else {
            unsafe {
                VarBuilder::from_mmaped_safetensors(&[weights_path.clone()], DType::F32, &device)?
            }
        };

        let bert = BertModel::load(vb.pp("bert"), &config)?;

        let pooler = {
            let weight = vb.get(
                (config.hidden_size, config.hidden_size),
                "bert.pooler.dense.weight",
            )?;
            let bias = vb.get(config.hidden_size, "bert.pooler.dense.bias")?;
            Linear::new(weight, Some(bias))
        };

        let classifier = {
            let weight = vb.get((num_labels, config.hidden_size), "classifier.weight")?;
            let bias = vb.get(num_labels, "classifier.bias")?;
            Linear::new(weight, Some(bias))
        };

        info!(device = device_name(&device), "classification model loaded");

        Ok(Self {
            bert,
            pooler,
            classifier,
            tokenizer,
            device,
            id2label,
        })
    }

    fn forward(&self, input_ids: &Tensor, type_ids: &Tensor, mask: &Tensor) -> candle_core::Result<Vec<f32>> {
        let hidden = self.bert.forward(input_ids, type_ids, Some(mask))?;

        // CLS embedding through pooler (tanh) and classification head.
        let cls = hidden.i((.., 0))?;
        let pooled = self.pooler.forward(&cls)?.tanh()?;
        let logits = self.classifier.forward(&pooled)?;

        let probabilities = candle_nn::ops::softmax(&logits, D::Minus1)?;
        probabilities.squeeze(0)?.to_vec1::<f32>()
    }

    fn label_for(&self, idx: usize) -> String {
        self.id2label
            .get(&idx.to_string())
            .cloned()
            .unwrap_or_else(|| format!("LABEL_{idx}"))
    }
}

impl ScoringModel for BertScorer {
    fn score(&self, text: &str) -> Result<RawPrediction, ClassifyError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| ClassifyError::Inference(format!("tokenization: {e}")))?;

        let run = || -> candle_core::Result<Vec<f32>> {
            let input_ids = Tensor::new(encoding.get_ids(), &self.device)?.unsqueeze(0)?;
            let type_ids = Tensor::new(encoding.get_type_ids(), &self.device)?.unsqueeze(0)?;
            let mask = Tensor::new(encoding.get_attention_mask(), &self.device)?.unsqueeze(0)?;
            self.forward(&input_ids, &type_ids, &mask)
        };
        let probs = run().map_err(|e| ClassifyError::Inference(e.to_string()))?;

        let (idx, score) = probs
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(i, p)| (i, *p))
            .unwrap_or((0, 0.0));

        Ok(RawPrediction {
            label: self.label_for(idx),
            score,
        })
    }

    fn device_label(&self) -> &'static str {
        device_name(&self.device)
    }
}

fn device_name(device: &Device) -> &'static str {
    if device.is_cuda() {
        "cuda"
    } else {
        "cpu"
    }
}

/// Resolve model files from a local directory or the Hugging Face hub.
/// Safetensors are preferred; PyTorch checkpoints are the fallback.
fn resolve_model_files(model_id: &str) -> Result<(String, String, String, bool)> {
    let local = Path::new(model_id);
    if local.exists() {
        let config = local.join("config.json");
        let tokenizer = local.join("tokenizer.json");
        let (weights, use_pth) = if local.join("model.safetensors").exists() {
            (local.join("model.safetensors"), false)
        } else if local.join("pytorch_model.bin").exists() {
            (local.join("pytorch_model.bin"), true)
        } else {
            return Err(anyhow!("no model weights found in {model_id}"));
        };
        return Ok((
            config.to_string_lossy().to_string(),
            tokenizer.to_string_lossy().to_string(),
            weights.to_string_lossy().to_string(),
            use_pth,
        ));
    }

    let repo = Repo::with_revision(model_id.to_string(), RepoType::Model, "main".to_string());
    let api = Api::new()?.repo(repo);
    let config = api.get("config.json")?;
    let tokenizer = api.get("tokenizer.json")?;
    let (weights, use_pth) = match api.get("model.safetensors") {
        Ok(w) => (w, false),
        Err(_) => (api.get("pytorch_model.bin")?, true),
    };

    Ok((
        config.to_string_lossy().to_string(),
        tokenizer.to_string_lossy().to_string(),
        weights.to_string_lossy().to_string(),
        use_pth,
    ))
}
