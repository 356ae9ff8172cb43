use anyhow::{anyhow, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::info;

/// Load `model.safetensors` when present, else the pickled `pytorch_model.bin`.
pub fn load_var_builder(model_dir: &Path, device: &Device) -> Result<VarBuilder<'static>> {
    let safetensors = model_dir.join("model.safetensors");
    let weights_map: HashMap<String, Tensor> = if safetensors.exists() {
        info!(path = %safetensors.display(), "loading safetensors weights");
        candle_core::safetensors::load(&safetensors, device)?
    } else {
        let pickle = model_dir.join("pytorch_model.bin");
        if !pickle.exists() {
            return Err(anyhow!("No model.safetensors or pytorch_model.bin in {}", model_dir.display()));
        }
        info!(path = %pickle.display(), "loading pytorch weights");
        candle_core::pickle::read_all(&pickle)?.into_iter().collect()
    };
    Ok(VarBuilder::from_tensors(weights_map, DType::F32, device))
}

/// Locate a local model checkout.
///
/// Order: explicit setting, `env_var`, `models/<name>`, `../models/<name>`
/// where `<name>` is the last path segment of the hub id.
pub fn resolve_model_dir(explicit: Option<&str>, env_var: &str, model_name: &str) -> Result<PathBuf> {
    if let Some(dir) = explicit {
        let p = lexrag_core::config::expand_path(dir);
        if p.exists() { info!("Using configured model dir: {}", p.display()); return Ok(p); }
        return Err(anyhow!("Configured model directory {} does not exist", p.display()));
    }
    if let Ok(dir) = std::env::var(env_var) {
        let p = PathBuf::from(&dir);
        if p.exists() { info!("Using {}: {}", env_var, p.display()); return Ok(p); }
    }
    let short = model_name.rsplit('/').next().unwrap_or(model_name);
    for root in ["models", "../models"] {
        let p = Path::new(root).join(short);
        if p.exists() { info!("Using model dir: {}", p.display()); return Ok(p); }
    }
    Err(anyhow!("Could not locate model directory for {}", model_name))
}
