//! `ct-metrics` — offline analyses over finished association runs.
//!
//! | Analysis          | Input                          | Output columns                          |
//! |-------------------|--------------------------------|-----------------------------------------|
//! | [`users_per_site`]  | event log                    | `timestamp,site_id,number_vehicles`     |
//! | [`read_route_stats`] | tripinfo (`;`)              | `vehicle_id,route_length,simulation_stay` |
//! | [`unique_sites`]    | event log                    | `vehicle_id,count`                      |
//! | [`number_changes`]  | event log                    | `vehicle_id,count`                      |
//! | [`unmet_locations`] | event log + FCD (`;`, geo)   | `edge_id,lon,lat,count`                 |
//!
//! Every output is sorted deterministically, so re-running an analysis on
//! the same input reproduces the file byte for byte.  [`Analysis`] wires a
//! computation to its input and output files.

pub mod analysis;
pub mod error;
pub mod occupancy;
pub mod route;
mod table;
pub mod unmet;
pub mod vehicles;

#[cfg(test)]
mod tests;

pub use analysis::Analysis;
pub use error::{MetricsError, MetricsResult};
pub use occupancy::{users_per_site, write_users, SiteOccupancy};
pub use route::{read_route_stats, write_route_stats, RouteStats};
pub use unmet::{lane_edge, read_edge_positions, unmet_locations, write_unmet_locations, EdgeCount, EdgePosition};
pub use vehicles::{number_changes, unique_sites, write_vehicle_counts, VehicleCount};
