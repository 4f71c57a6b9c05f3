use metapath_core::{MetapathError, MetapathResult, TrainConfig};
use std::fs;
use std::path::Path;

/// Load a training config from JSON. Absent fields keep their defaults.
pub fn load_config<P: AsRef<Path>>(path: P) -> MetapathResult<TrainConfig> {
    let path = path.as_ref();
    let json = fs::read_to_string(path)?;
    serde_json::from_str(&json)
        .map_err(|e| MetapathError::config(format!("{}: {}", path.display(), e)))
}

/// Save a training config as pretty-printed JSON.
pub fn save_config<P: AsRef<Path>>(config: &TrainConfig, path: P) -> MetapathResult<()> {
    let json = serde_json::to_string_pretty(config)
        .map_err(|e| MetapathError::config(e.to_string()))?;
    fs::write(path, json)?;
    Ok(())
}
