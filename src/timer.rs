use crate::digest::{hash_file, HashAlgorithm};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Instant;

/// Outcome of hashing one file with one algorithm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRecord {
    pub file: String,
    pub algorithm: HashAlgorithm,
    pub file_size: u64,
    /// Hashing time in milliseconds
    pub time: u64,
    pub hash: String,
}

/// Hashes `path` and records its size and how long the digest took.
///
/// The size is read before hashing starts, so a file that changes mid-run can
/// yield a record whose size and digest describe different contents.
pub fn time_file(path: &Path, algo: HashAlgorithm) -> Result<ResultRecord> {
    let metadata =
        fs::metadata(path).with_context(|| format!("Failed to stat {:?}", path))?;

    let start = Instant::now();
    let hash = hash_file(path, algo)?;
    let elapsed = start.elapsed();

    Ok(ResultRecord {
        file: path.display().to_string(),
        algorithm: algo,
        file_size: metadata.len(),
        time: elapsed.as_millis() as u64,
        hash,
    })
}
