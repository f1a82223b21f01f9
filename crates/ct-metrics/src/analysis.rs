//! `Analysis` — runs one analysis from input files to an output table.

use std::fs::File;
use std::path::{Path, PathBuf};

use log::info;

use ct_core::CtError;
use ct_output::read_events;

use crate::table::create_output;
use crate::{
    number_changes, read_edge_positions, read_route_stats, unique_sites, unmet_locations,
    users_per_site, write_route_stats, write_unmet_locations, write_users, write_vehicle_counts,
    MetricsResult,
};

/// The available analyses.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Analysis {
    /// Event log → `timestamp,site_id,number_vehicles`.
    Users,
    /// Tripinfo table → `vehicle_id,route_length,simulation_stay`.
    RouteTime,
    /// Event log → `vehicle_id,count`.
    UniqueSites,
    /// Event log → `vehicle_id,count`.
    NumberChanges,
    /// Event log + FCD table → `edge_id,lon,lat,count`.
    NewSites,
}

impl Analysis {
    pub fn name(self) -> &'static str {
        match self {
            Analysis::Users => "users",
            Analysis::RouteTime => "route_time",
            Analysis::UniqueSites => "unique_sites",
            Analysis::NumberChanges => "number_changes",
            Analysis::NewSites => "new_sites",
        }
    }

    /// Number of input files the analysis reads.
    pub fn input_count(self) -> usize {
        match self {
            Analysis::NewSites => 2,
            _ => 1,
        }
    }

    /// Read `inputs`, compute, and write the table to `output`.  Returns the
    /// number of rows written.
    ///
    /// Extra inputs are ignored; too few is a configuration error.
    pub fn run(self, inputs: &[PathBuf], output: &Path) -> MetricsResult<usize> {
        if inputs.len() < self.input_count() {
            return Err(CtError::Config(format!(
                "{} needs {} input file(s), got {}",
                self.name(),
                self.input_count(),
                inputs.len()
            ))
            .into());
        }
        let input = &inputs[0];

        let rows = match self {
            Analysis::Users => {
                let rows = users_per_site(&read_events(input)?);
                write_users(create_output(output)?, &rows)?;
                rows.len()
            }
            Analysis::RouteTime => {
                let file = File::open(input)?;
                let rows = read_route_stats(file, &input.display().to_string())?;
                write_route_stats(create_output(output)?, &rows)?;
                rows.len()
            }
            Analysis::UniqueSites => {
                let rows = unique_sites(&read_events(input)?);
                write_vehicle_counts(create_output(output)?, &rows)?;
                rows.len()
            }
            Analysis::NumberChanges => {
                let rows = number_changes(&read_events(input)?);
                write_vehicle_counts(create_output(output)?, &rows)?;
                rows.len()
            }
            Analysis::NewSites => {
                let events = read_events(input)?;
                let fcd = &inputs[1];
                let positions = read_edge_positions(File::open(fcd)?, &fcd.display().to_string())?;
                let rows = unmet_locations(&events, &positions);
                write_unmet_locations(create_output(output)?, &rows)?;
                rows.len()
            }
        };
        info!("{}: wrote {rows} rows to {}", self.name(), output.display());
        Ok(rows)
    }
}
