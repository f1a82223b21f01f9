use anyhow::Result;
use clap::Parser;

use celltrack::extraction::{self, ExtractionArgs};
use celltrack::logging::init_logging;

fn main() -> Result<()> {
    let args = ExtractionArgs::parse();
    init_logging(args.verbose);
    let count = extraction::run(&args)?;
    println!("{count} sites written to {}", args.output.display());
    Ok(())
}
