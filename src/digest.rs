//! Streaming digests over the supported hash algorithms.

use anyhow::{Context, Result};
use clap::ValueEnum;
use md5::Md5;
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha384, Sha512};
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

pub const CHUNK_SIZE: usize = 64 * 1024; // 64KB

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    Md5,
    Sha1,
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    /// Every supported algorithm, in benchmark order.
    pub const ALL: [HashAlgorithm; 5] = [
        HashAlgorithm::Md5,
        HashAlgorithm::Sha1,
        HashAlgorithm::Sha256,
        HashAlgorithm::Sha384,
        HashAlgorithm::Sha512,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            HashAlgorithm::Md5 => "md5",
            HashAlgorithm::Sha1 => "sha1",
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha384 => "sha384",
            HashAlgorithm::Sha512 => "sha512",
        }
    }

    /// Length of the hex-encoded digest.
    pub fn hex_len(&self) -> usize {
        match self {
            HashAlgorithm::Md5 => 32,
            HashAlgorithm::Sha1 => 40,
            HashAlgorithm::Sha256 => 64,
            HashAlgorithm::Sha384 => 96,
            HashAlgorithm::Sha512 => 128,
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Incremental hash state: feed chunks with `update`, then consume it with `finalize_hex`.
pub trait StreamHasher: Send {
    fn update(&mut self, data: &[u8]);
    fn finalize_hex(self: Box<Self>) -> String;
}

struct DigestHasher<D>(D);

impl<D: Digest + Send> StreamHasher for DigestHasher<D> {
    fn update(&mut self, data: &[u8]) {
        Digest::update(&mut self.0, data);
    }
    fn finalize_hex(self: Box<Self>) -> String {
        hex::encode(self.0.finalize())
    }
}

pub fn create_hasher(algo: HashAlgorithm) -> Box<dyn StreamHasher> {
    match algo {
        HashAlgorithm::Md5 => Box::new(DigestHasher(Md5::new())),
        HashAlgorithm::Sha1 => Box::new(DigestHasher(Sha1::new())),
        HashAlgorithm::Sha256 => Box::new(DigestHasher(Sha256::new())),
        HashAlgorithm::Sha384 => Box::new(DigestHasher(Sha384::new())),
        HashAlgorithm::Sha512 => Box::new(DigestHasher(Sha512::new())),
    }
}

/// Reads `reader` to the end one chunk at a time and returns the hex digest.
pub fn hash_reader<R: Read>(mut reader: R, algo: HashAlgorithm) -> io::Result<String> {
    let mut hasher = create_hasher(algo);
    let mut buffer = vec![0u8; CHUNK_SIZE];

    loop {
        let bytes_read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hasher.finalize_hex())
}

pub fn hash_file(path: &Path, algo: HashAlgorithm) -> Result<String> {
    let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    hash_reader(file, algo).with_context(|| format!("Failed to read {:?}", path))
}
