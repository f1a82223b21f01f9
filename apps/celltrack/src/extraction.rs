//! `sites_extraction`: keep the sites of one city from an operator table.

use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use log::info;

use ct_output::write_extracted_sites;
use ct_spatial::extract_city_sites;

#[derive(Parser, Debug)]
#[command(name = "sites_extraction", version, about = "Extract the cell sites of one city")]
pub struct ExtractionArgs {
    /// Semicolon-separated operator site table.
    #[arg(short, long, value_name = "PATH")]
    pub input: PathBuf,

    /// Output table, readable as `sites_association --input`.
    #[arg(short, long, value_name = "PATH", default_value = "output_sites.csv")]
    pub output: PathBuf,

    /// Case-sensitive substring of the site name.
    #[arg(short, long)]
    pub city: String,

    /// More log output (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Returns the number of sites written.
pub fn run(args: &ExtractionArgs) -> Result<usize> {
    let file = File::open(&args.input)
        .with_context(|| format!("cannot open {}", args.input.display()))?;
    let sites = extract_city_sites(file, &args.input.display().to_string(), &args.city)?;
    write_extracted_sites(&args.output, &sites)?;
    info!("{} sites of {} written to {}", sites.len(), args.city, args.output.display());
    Ok(sites.len())
}
