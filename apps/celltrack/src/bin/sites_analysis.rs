use anyhow::Result;
use clap::Parser;

use celltrack::analysis::{self, AnalysisArgs};
use celltrack::logging::init_logging;

fn main() -> Result<()> {
    let args = AnalysisArgs::parse();
    init_logging(args.verbose);
    let rows = analysis::run(&args)?;
    println!("{}: {rows} rows written to {}", args.analysis().name(), args.output.display());
    Ok(())
}
