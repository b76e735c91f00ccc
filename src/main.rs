use anyhow::Result;
use clap::Parser;
use hashbench::{run, Args};

fn main() -> Result<()> {
    run(Args::parse())
}
