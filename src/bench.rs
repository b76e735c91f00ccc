//! Sequential benchmark passes over the entries of one directory.
//!
//! Each pass lists the directory, hashes every entry in listing order with a
//! single algorithm, and reports throughput over the whole pass rather than
//! the sum of per-file timings, which are too coarse for small files.

use crate::digest::HashAlgorithm;
use crate::timer::{time_file, ResultRecord};
use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use walkdir::WalkDir;

/// Records and timing of one algorithm's pass.
#[derive(Debug)]
pub struct PassReport {
    pub algorithm: HashAlgorithm,
    pub records: Vec<ResultRecord>,
    pub elapsed: Duration,
}

impl PassReport {
    pub fn total_bytes(&self) -> u64 {
        self.records.iter().map(|r| r.file_size).sum()
    }

    pub fn total_ms(&self) -> u128 {
        self.elapsed.as_millis()
    }

    /// Zero when no measurable time elapsed.
    pub fn throughput_bytes_per_ms(&self) -> f64 {
        let ms = self.elapsed.as_secs_f64() * 1000.0;
        if ms > 0.0 {
            self.total_bytes() as f64 / ms
        } else {
            0.0
        }
    }

    pub fn throughput_mb_per_s(&self) -> f64 {
        self.throughput_bytes_per_ms() / 1000.0
    }

    pub fn total_kb(&self) -> f64 {
        self.total_bytes() as f64 / 1000.0
    }

    pub fn summary_line(&self) -> String {
        format!(
            "{}: {:.2} MB/s ({}kB / {}ms)",
            self.algorithm,
            self.throughput_mb_per_s(),
            self.total_kb(),
            self.total_ms()
        )
    }
}

/// Lists the direct entries of `dir` in the order the filesystem returns them.
/// Subdirectories are included as-is.
pub fn list_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.with_context(|| format!("Failed to list {:?}", dir))?;
        entries.push(entry.into_path());
    }
    Ok(entries)
}

/// Restricts the fixed algorithm order to `requested`; an empty request selects all.
pub fn select_algorithms(requested: &[HashAlgorithm]) -> Vec<HashAlgorithm> {
    HashAlgorithm::ALL
        .into_iter()
        .filter(|algo| requested.is_empty() || requested.contains(algo))
        .collect()
}

/// Hashes every entry of `dir` with `algo`, one file at a time.
/// The first failing entry aborts the pass.
pub fn run_pass(dir: &Path, algo: HashAlgorithm) -> Result<PassReport> {
    let entries = list_entries(dir)?;

    let pb = ProgressBar::new(entries.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:>6} [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );
    pb.set_prefix(algo.name());

    let mut records = Vec::with_capacity(entries.len());
    let start = Instant::now();
    for path in &entries {
        records.push(time_file(path, algo)?);
        pb.inc(1);
    }
    let elapsed = start.elapsed();
    pb.finish_and_clear();

    Ok(PassReport {
        algorithm: algo,
        records,
        elapsed,
    })
}

/// Writes `records` as a pretty-printed JSON array to `<output_dir>/<algo>.json`,
/// replacing any previous file. The output directory is not created.
pub fn write_results(
    output_dir: &Path,
    algo: HashAlgorithm,
    records: &[ResultRecord],
) -> Result<PathBuf> {
    if !output_dir.is_dir() {
        bail!("Output directory {:?} does not exist", output_dir);
    }

    let path = output_dir.join(format!("{}.json", algo.name()));
    let json = serde_json::to_string_pretty(records)?;
    fs::write(&path, json).with_context(|| format!("Failed to write {:?}", path))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;

    fn report(bytes: &[u64], elapsed: Duration) -> PassReport {
        let records = bytes
            .iter()
            .enumerate()
            .map(|(i, &size)| ResultRecord {
                file: format!("f{}", i),
                algorithm: HashAlgorithm::Sha1,
                file_size: size,
                time: 0,
                hash: String::new(),
            })
            .collect();
        PassReport {
            algorithm: HashAlgorithm::Sha1,
            records,
            elapsed,
        }
    }

    #[test]
    fn test_throughput() {
        let r = report(&[1_000_000, 1_000_000], Duration::from_millis(1000));
        assert_eq!(r.total_bytes(), 2_000_000);
        assert_eq!(r.throughput_bytes_per_ms(), 2000.0);
        assert_eq!(r.throughput_mb_per_s(), 2.0);
        assert_eq!(r.total_kb(), 2000.0);
        assert_eq!(r.summary_line(), "sha1: 2.00 MB/s (2000kB / 1000ms)");
    }

    #[test]
    fn test_throughput_zero_elapsed() {
        let r = report(&[], Duration::ZERO);
        assert_eq!(r.throughput_bytes_per_ms(), 0.0);
        assert_eq!(r.summary_line(), "sha1: 0.00 MB/s (0kB / 0ms)");

        let r = report(&[4096], Duration::ZERO);
        assert_eq!(r.throughput_mb_per_s(), 0.0);
    }

    #[test]
    fn test_throughput_sub_millisecond_is_finite() {
        let r = report(&[1024], Duration::from_micros(10));
        assert!(r.throughput_bytes_per_ms().is_finite());
        assert!(r.throughput_bytes_per_ms() > 0.0);
        assert_eq!(r.total_ms(), 0);
    }

    #[test]
    fn test_list_entries_matches_read_dir_order() -> Result<()> {
        let dir = tempfile::tempdir()?;
        for name in ["b.txt", "a.txt", "c.txt", "sub"] {
            if name == "sub" {
                fs::create_dir(dir.path().join(name))?;
            } else {
                File::create(dir.path().join(name))?;
            }
        }
        fs::write(dir.path().join("sub").join("nested.txt"), b"x")?;

        let expected: Vec<PathBuf> = fs::read_dir(dir.path())?
            .map(|e| e.map(|e| e.path()))
            .collect::<std::io::Result<_>>()?;

        let entries = list_entries(dir.path())?;
        assert_eq!(entries, expected);
        assert_eq!(entries.len(), 4);
        Ok(())
    }

    #[test]
    fn test_list_entries_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(list_entries(&dir.path().join("missing")).is_err());
    }

    #[test]
    fn test_select_algorithms() {
        assert_eq!(select_algorithms(&[]), HashAlgorithm::ALL.to_vec());
        assert_eq!(
            select_algorithms(&[HashAlgorithm::Sha512, HashAlgorithm::Md5]),
            vec![HashAlgorithm::Md5, HashAlgorithm::Sha512]
        );
    }

    #[test]
    fn test_run_pass() -> Result<()> {
        let dir = tempfile::tempdir()?;
        File::create(dir.path().join("one.bin"))?.write_all(&[1u8; 100])?;
        File::create(dir.path().join("two.bin"))?.write_all(&[2u8; 300])?;

        let report = run_pass(dir.path(), HashAlgorithm::Sha384)?;
        let listed: Vec<String> = list_entries(dir.path())?
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        let files: Vec<String> = report.records.iter().map(|r| r.file.clone()).collect();

        assert_eq!(files, listed);
        assert_eq!(report.total_bytes(), 400);
        assert!(report.records.iter().all(|r| r.hash.len() == 96));
        Ok(())
    }

    #[test]
    fn test_run_pass_empty_dir() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let report = run_pass(dir.path(), HashAlgorithm::Md5)?;
        assert!(report.records.is_empty());
        assert_eq!(report.total_bytes(), 0);
        assert!(report.throughput_mb_per_s().is_finite());
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_run_pass_fails_on_subdirectory() -> Result<()> {
        let dir = tempfile::tempdir()?;
        File::create(dir.path().join("file.txt"))?.write_all(b"data")?;
        fs::create_dir(dir.path().join("nested"))?;

        assert!(run_pass(dir.path(), HashAlgorithm::Sha256).is_err());
        Ok(())
    }

    #[test]
    fn test_write_results() -> Result<()> {
        let out = tempfile::tempdir()?;
        let r = report(&[7], Duration::from_millis(1));

        fs::write(out.path().join("sha1.json"), "stale")?;
        let path = write_results(out.path(), HashAlgorithm::Sha1, &r.records)?;
        assert_eq!(path, out.path().join("sha1.json"));

        let written: Vec<ResultRecord> = serde_json::from_str(&fs::read_to_string(&path)?)?;
        assert_eq!(written, r.records);
        Ok(())
    }

    #[test]
    fn test_write_results_empty() -> Result<()> {
        let out = tempfile::tempdir()?;
        let path = write_results(out.path(), HashAlgorithm::Md5, &[])?;
        assert_eq!(fs::read_to_string(path)?, "[]");
        Ok(())
    }

    #[test]
    fn test_write_results_missing_output_dir() {
        let out = tempfile::tempdir().unwrap();
        let err = write_results(&out.path().join("output"), HashAlgorithm::Md5, &[]).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}
