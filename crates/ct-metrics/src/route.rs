//! Route length and time spent in the simulation, from a SUMO tripinfo
//! table converted with `xml2csv`.

use std::io::{Read, Write};

use log::debug;
use serde::Deserialize;

use crate::table::{semicolon_reader, writer_with_header};
use crate::{MetricsError, MetricsResult};

pub const ROUTE_HEADER: [&str; 3] = ["vehicle_id", "route_length", "simulation_stay"];

#[derive(Debug, Deserialize)]
struct TripRecord {
    #[serde(default)]
    vehicle_id:           Option<String>,
    #[serde(default, rename = "vehicle_routeLength")]
    vehicle_route_length: Option<f64>,
    #[serde(default)]
    vehicle_depart:       Option<f64>,
    #[serde(default)]
    vehicle_arrival:      Option<f64>,
}

/// Per-vehicle route statistics.
#[derive(Clone, Debug, PartialEq)]
pub struct RouteStats {
    pub vehicle_id:      String,
    /// Metres.
    pub route_length:    f64,
    /// Seconds between departure and arrival.
    pub simulation_stay: f64,
}

/// Read a tripinfo table, one [`RouteStats`] per vehicle row in input order.
///
/// Empty numeric fields read as 0.  Rows without a `vehicle_id` (person
/// trips, for example) are skipped.
pub fn read_route_stats<R: Read>(reader: R, source_name: &str) -> MetricsResult<Vec<RouteStats>> {
    let mut rdr = semicolon_reader(reader);
    let mut out = Vec::new();
    for result in rdr.deserialize::<TripRecord>() {
        let rec = result.map_err(|e| MetricsError::from_csv(source_name, e))?;
        let Some(vehicle_id) = rec.vehicle_id.filter(|id| !id.is_empty()) else {
            debug!("{source_name}: skipping a row without vehicle_id");
            continue;
        };
        let depart = rec.vehicle_depart.unwrap_or(0.0);
        let arrival = rec.vehicle_arrival.unwrap_or(0.0);
        out.push(RouteStats {
            vehicle_id,
            route_length:    rec.vehicle_route_length.unwrap_or(0.0),
            simulation_stay: arrival - depart,
        });
    }
    Ok(out)
}

pub fn write_route_stats<W: Write>(inner: W, rows: &[RouteStats]) -> MetricsResult<()> {
    let mut writer = writer_with_header(inner, &ROUTE_HEADER)?;
    for row in rows {
        writer.write_record([
            row.vehicle_id.as_str(),
            row.route_length.to_string().as_str(),
            row.simulation_stay.to_string().as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
