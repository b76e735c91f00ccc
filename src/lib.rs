pub mod bench;
pub mod digest;
pub mod timer;
pub mod utils;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use bench::{run_pass, select_algorithms, write_results};
use digest::HashAlgorithm;
use utils::{format_bytes, Logger};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Directory whose files are hashed (not recursive)
    pub directory: PathBuf,

    /// Existing directory that receives one <algorithm>.json per pass
    #[arg(long, default_value = "output")]
    pub output: PathBuf,

    /// Audit log file path
    #[arg(long, default_value = "hashbench.log")]
    pub log: PathBuf,

    /// Only run these algorithms (default: all, in fixed order)
    #[arg(long = "algorithm", value_enum, value_delimiter = ',')]
    pub algorithms: Vec<HashAlgorithm>,
}

pub fn run(args: Args) -> Result<()> {
    let logger = Logger::new(&args.log);
    let algorithms = select_algorithms(&args.algorithms);

    let names: Vec<&str> = algorithms.iter().map(|a| a.name()).collect();
    logger.log(&format!(
        "Benchmark started: {:?} [{}]",
        args.directory,
        names.join(", ")
    ))?;

    for algo in algorithms {
        let report = run_pass(&args.directory, algo)?;
        println!("{}", report.summary_line());

        let artifact = write_results(&args.output, algo, &report.records)?;
        logger.log(&format!(
            "Pass {}: {} files, {} in {}ms -> {:?}",
            algo,
            report.records.len(),
            format_bytes(report.total_bytes()),
            report.total_ms(),
            artifact
        ))?;
    }

    Ok(())
}
