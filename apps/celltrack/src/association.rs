//! `sites_association`: drive the simulation and log, for every vehicle,
//! the cell site it is associated with.
//!
//! # Inputs
//!
//! | Concern     | Options                                                  |
//! |-------------|----------------------------------------------------------|
//! | positions   | `--sumo_cfg` (live, TraCI) or `--fcd` (recorded trace)   |
//! | sites       | `--input` + `--sumo_net` (loaded) or `--cell_sites` (generated) |
//!
//! Generated sites are placed inside the network boundary, taken from
//! `--sumo_net` when given and otherwise asked from SUMO.  Their positions
//! are written to `--sites_output`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, ArgGroup, Parser, ValueEnum};
use log::info;

use ct_core::{CtError, SimConfig, SimRng, SimTime};
use ct_output::{write_site_positions, CsvEventWriter, ProgressLogger};
use ct_sim::{
    FcdReplay, RunSummary, SimBuilder, SimulationController, TraciController, TraciOptions,
};
use ct_spatial::{
    BruteForceResolver, CoordinateTransformer, NetLocation, RTreeResolver, SiteCatalog,
    SiteResolver,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ResolverKind {
    /// R-tree nearest-neighbour search.
    Rtree,
    /// Linear scan over every site.
    Brute,
}

#[derive(Parser, Debug)]
#[command(name = "sites_association", version, about = "Associate simulated vehicles with cell sites")]
#[command(group(ArgGroup::new("simulation").required(true).args(["sumo_cfg", "fcd"])))]
#[command(group(ArgGroup::new("sites").required(true).args(["cell_sites", "input"])))]
pub struct AssociationArgs {
    /// SUMO configuration to run live over TraCI.
    #[arg(long = "sumo_cfg", value_name = "PATH")]
    pub sumo_cfg: Option<PathBuf>,

    /// Recorded `--fcd-output` trace to replay instead of running SUMO.
    #[arg(long, value_name = "PATH")]
    pub fcd: Option<PathBuf>,

    /// The trace was written with `--fcd-output.geo` (x = longitude).
    #[arg(long = "fcd_geo", requires = "fcd")]
    pub fcd_geo: bool,

    /// Number of sites to generate inside the network boundary.
    #[arg(short = 'c', long = "cell_sites", value_name = "N")]
    pub cell_sites: Option<usize>,

    /// Site table (`node_id,cell_lat,cell_long[,site_name]`).
    #[arg(short, long, value_name = "PATH", requires = "sumo_net")]
    pub input: Option<PathBuf>,

    /// SUMO network, for projection metadata and the boundary.
    #[arg(short = 'n', long = "sumo_net", value_name = "PATH")]
    pub sumo_net: Option<PathBuf>,

    /// Association threshold in metres.
    #[arg(short, long, default_value_t = 2_000.0)]
    pub distance: f64,

    /// Stop after this many simulated seconds.
    #[arg(short, long, default_value_t = 86_400)]
    pub time: u64,

    /// Re-check existing associations and write events every N steps.
    #[arg(short, long, default_value_t = 1)]
    pub step: u64,

    #[arg(short, long, value_name = "PATH", default_value = "output_vehicles_sites.csv")]
    pub output: PathBuf,

    /// Where generated site positions are written.
    #[arg(long = "sites_output", value_name = "PATH", default_value = "output_sites_pos.csv")]
    pub sites_output: PathBuf,

    /// Seed for generated sites.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    #[arg(long, value_enum, default_value_t = ResolverKind::Rtree)]
    pub resolver: ResolverKind,

    #[arg(long = "sumo_binary", value_name = "PATH", default_value = "sumo")]
    pub sumo_binary: PathBuf,

    /// TraCI port.
    #[arg(long, default_value_t = 8813)]
    pub port: u16,

    /// Log progress every N steps (0 = summary only).
    #[arg(long, value_name = "N", default_value_t = 3_600)]
    pub progress: u64,

    /// More log output (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl AssociationArgs {
    pub fn sim_config(&self) -> SimConfig {
        SimConfig {
            threshold_m:             self.distance,
            check_interval_steps:    self.step,
            end_time:                Some(SimTime::from_secs(self.time)),
            seed:                    self.seed,
            progress_interval_steps: self.progress,
        }
    }
}

/// Run one association from start to finish.
pub fn run(args: &AssociationArgs) -> Result<RunSummary> {
    let config = args.sim_config();

    // ── Network metadata ────────────────────────────────────────────────
    let location = args.sumo_net.as_deref().map(NetLocation::from_path).transpose()?;
    let transformer = match (&location, &args.input) {
        (Some(loc), Some(_)) => Some(CoordinateTransformer::from_location(loc)?),
        (Some(loc), None) if loc.has_projection() => Some(CoordinateTransformer::from_location(loc)?),
        _ => None,
    };
    if args.fcd_geo && transformer.is_none() {
        return Err(CtError::Config("--fcd_geo needs a geo-referenced --sumo_net".into()).into());
    }

    // ── Controller ──────────────────────────────────────────────────────
    let mut controller: Box<dyn SimulationController> = match (&args.sumo_cfg, &args.fcd) {
        (Some(cfg), _) => {
            let mut options = TraciOptions::new(cfg);
            options.binary = args.sumo_binary.clone();
            options.port = args.port;
            Box::new(TraciController::launch(&options)?)
        }
        (None, Some(trace)) => Box::new(
            FcdReplay::open(trace, args.fcd_geo)
                .with_context(|| format!("cannot open {}", trace.display()))?,
        ),
        (None, None) => {
            return Err(CtError::Config("one of --sumo_cfg or --fcd is required".into()).into());
        }
    };

    // ── Sites ───────────────────────────────────────────────────────────
    let catalog = match (&args.input, args.cell_sites) {
        (Some(input), _) => {
            let transformer = transformer
                .as_ref()
                .ok_or_else(|| CtError::Config("--input requires --sumo_net".into()))?;
            SiteCatalog::load_csv(input, transformer)?
        }
        (None, Some(count)) => {
            let bounds = match &location {
                Some(loc) => loc.conv_boundary,
                None => controller.net_boundary()?.ok_or_else(|| {
                    CtError::Config("generated sites need --sumo_net to know the network boundary".into())
                })?,
            };
            let mut rng = SimRng::new(config.seed);
            let catalog = SiteCatalog::generate(count, bounds, transformer.as_ref(), &mut rng)?;
            write_site_positions(&args.sites_output, &catalog)?;
            catalog
        }
        (None, None) => {
            return Err(CtError::Config("one of --cell_sites or --input is required".into()).into());
        }
    };

    let resolver: Box<dyn SiteResolver> = match args.resolver {
        ResolverKind::Rtree => Box::new(RTreeResolver::new(&catalog)),
        ResolverKind::Brute => Box::new(BruteForceResolver::new(&catalog)),
    };

    // ── Run ─────────────────────────────────────────────────────────────
    let mut builder = SimBuilder::new(config, controller, resolver);
    if let Some(t) = transformer {
        builder = builder.transformer(t);
    }
    let mut sim = builder.build()?;

    let mut writer = CsvEventWriter::create(&args.output, catalog.labels())?;
    let mut progress = ProgressLogger::new(args.progress);
    let summary = sim.run(&mut writer, &mut progress)?;
    info!("{} events written to {}", writer.rows_written(), args.output.display());
    Ok(summary)
}
