use std::time::Instant;

use anyhow::Result;
use clap::Parser;

use celltrack::association::{self, AssociationArgs};
use celltrack::logging::init_logging;

fn main() -> Result<()> {
    let args = AssociationArgs::parse();
    init_logging(args.verbose);

    let start = Instant::now();
    let summary = association::run(&args)?;
    println!(
        "{} steps, {} events ({} without a site), {} site changes in {:.2?}",
        summary.steps,
        summary.events,
        summary.unassociated_events,
        summary.changes,
        start.elapsed()
    );
    println!("Events written to {}", args.output.display());
    Ok(())
}
