//! `sites_analysis`: one metric over a finished association log.

use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, ArgGroup, Parser};

use ct_metrics::Analysis;

#[derive(Parser, Debug)]
#[command(name = "sites_analysis", version, about = "Analyse an association log")]
#[command(group(
    ArgGroup::new("analysis")
        .required(true)
        .args(["users", "route_time", "unique_sites", "number_changes", "new_sites"]),
))]
pub struct AnalysisArgs {
    /// Input tables.  `--new_sites` takes the event log, then the FCD table.
    #[arg(short, long, value_name = "PATH", num_args = 1.., required = true)]
    pub input: Vec<PathBuf>,

    #[arg(short, long, value_name = "PATH", default_value = "output_analysis.csv")]
    pub output: PathBuf,

    /// Vehicles per site per timestamp (event log).
    #[arg(long)]
    pub users: bool,

    /// Route length and time in the simulation (tripinfo table, `;`).
    #[arg(long = "route_time")]
    pub route_time: bool,

    /// Distinct sites per vehicle (event log).
    #[arg(long = "unique_sites")]
    pub unique_sites: bool,

    /// Site changes per vehicle (event log).
    #[arg(long = "number_changes")]
    pub number_changes: bool,

    /// Edges where vehicles found no site (event log + geo FCD table, `;`).
    #[arg(long = "new_sites")]
    pub new_sites: bool,

    /// More log output (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl AnalysisArgs {
    pub fn analysis(&self) -> Analysis {
        if self.users {
            Analysis::Users
        } else if self.route_time {
            Analysis::RouteTime
        } else if self.unique_sites {
            Analysis::UniqueSites
        } else if self.number_changes {
            Analysis::NumberChanges
        } else {
            Analysis::NewSites
        }
    }
}

/// Returns the number of rows written.
pub fn run(args: &AnalysisArgs) -> Result<usize> {
    Ok(args.analysis().run(&args.input, &args.output)?)
}
