use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// What gets recorded after a successful post
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitmentRecord {
    pub commitment: String,
    pub batches: usize,
    pub aggregate_digest: String,
    pub posted_at: u64, // Unix timestamp in seconds
}

/// Save commitment record to file
pub fn save_commitment(dir: &Path, record: &CommitmentRecord) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join("commitment.json");
    let json = serde_json::to_string_pretty(record)?;
    fs::write(&path, json)?;
    Ok(path)
}

/// Write each batch to `batch_NNNN.bin`
pub fn save_batches(dir: &Path, batches: &[Vec<u8>]) -> anyhow::Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    batches
        .iter()
        .enumerate()
        .map(|(i, batch)| {
            let path = dir.join(format!("batch_{i:04}.bin"));
            fs::write(&path, batch)?;
            Ok(path)
        })
        .collect()
}

/// Read one batch per file, in the order given
pub fn load_batches(paths: &[PathBuf]) -> anyhow::Result<Vec<Vec<u8>>> {
    paths
        .iter()
        .map(|path| {
            fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
        })
        .collect()
}
