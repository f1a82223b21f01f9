//! Unmet-association locations: where vehicles were when no site was in
//! range, aggregated per road edge.
//!
//! Positions come from a SUMO FCD trace converted with `xml2csv` using geo
//! output, so `vehicle_x` is longitude and `vehicle_y` latitude.

use std::collections::HashMap;
use std::io::{Read, Write};

use log::{debug, warn};
use serde::Deserialize;

use ct_core::{CtError, GeoPoint, SimTime, VehicleId};
use ct_output::EventRecord;

use crate::table::{semicolon_reader, writer_with_header};
use crate::{MetricsError, MetricsResult};

pub const UNMET_HEADER: [&str; 4] = ["edge_id", "lon", "lat", "count"];

#[derive(Debug, Deserialize)]
struct FcdRecord {
    timestep_time: f64,
    #[serde(default)]
    vehicle_id:    Option<String>,
    #[serde(default)]
    vehicle_edge:  Option<String>,
    #[serde(default)]
    vehicle_lane:  Option<String>,
    #[serde(default)]
    vehicle_x:     Option<f64>,
    #[serde(default)]
    vehicle_y:     Option<f64>,
}

/// A vehicle's road position at one timestep.
#[derive(Clone, Debug, PartialEq)]
pub struct EdgePosition {
    pub time:    SimTime,
    pub vehicle: VehicleId,
    pub edge_id: String,
    pub geo:     GeoPoint,
}

/// One output row: an edge, the first unmet position seen on it and the
/// number of unmet occurrences there.
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeCount {
    pub edge_id: String,
    pub geo:     GeoPoint,
    pub count:   u64,
}

/// The edge a lane belongs to: `e1_0` → `e1`, `:J3_0_1` → `:J3_0`.
pub fn lane_edge(lane: &str) -> &str {
    match lane.rsplit_once('_') {
        Some((edge, index)) if !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()) => edge,
        _ => lane,
    }
}

/// Read vehicle positions from an FCD table.
///
/// Rows of empty timesteps (no `vehicle_id`) are skipped.  Every vehicle row
/// needs `vehicle_x`, `vehicle_y` and either `vehicle_edge` or
/// `vehicle_lane`.
pub fn read_edge_positions<R: Read>(reader: R, source_name: &str) -> MetricsResult<Vec<EdgePosition>> {
    let mut rdr = semicolon_reader(reader);
    let headers = rdr.headers().map_err(|e| MetricsError::from_csv(source_name, e))?.clone();
    let mut record = csv::StringRecord::new();
    let mut out = Vec::new();
    while rdr.read_record(&mut record).map_err(|e| MetricsError::from_csv(source_name, e))? {
        let rec: FcdRecord = record
            .deserialize(Some(&headers))
            .map_err(|e| MetricsError::from_csv(source_name, e))?;
        let Some(vehicle) = rec.vehicle_id.filter(|id| !id.is_empty()) else {
            continue;
        };
        let line = record.position().map_or(0, |p| p.line());
        let malformed = |reason: String| MetricsError::from(CtError::malformed(source_name, line, reason));

        let time = SimTime::try_from_secs_f64(rec.timestep_time)
            .ok_or_else(|| malformed(format!("invalid timestep_time {}", rec.timestep_time)))?;
        let edge_id = match (rec.vehicle_edge.filter(|e| !e.is_empty()), rec.vehicle_lane) {
            (Some(edge), _) => edge,
            (None, Some(lane)) if !lane.is_empty() => lane_edge(&lane).to_owned(),
            _ => return Err(malformed(format!("vehicle {vehicle} has neither an edge nor a lane"))),
        };
        let (Some(lon), Some(lat)) = (rec.vehicle_x, rec.vehicle_y) else {
            return Err(malformed(format!("vehicle {vehicle} has no position")));
        };
        out.push(EdgePosition { time, vehicle: VehicleId::from(vehicle), edge_id, geo: GeoPoint::new(lat, lon) });
    }
    debug!("{source_name}: {} vehicle positions", out.len());
    Ok(out)
}

/// Join every event without a site to the vehicle's position at that
/// timestamp and aggregate by edge.
///
/// Sorted by count descending, then edge id.  Unmet events with no matching
/// position are skipped with a warning.
pub fn unmet_locations(events: &[EventRecord], positions: &[EdgePosition]) -> Vec<EdgeCount> {
    let mut by_key: HashMap<(SimTime, &str), &EdgePosition> = HashMap::new();
    for p in positions {
        by_key.entry((p.time, p.vehicle.as_str())).or_insert(p);
    }

    let mut edges: Vec<EdgeCount> = Vec::new();
    let mut slot: HashMap<&str, usize> = HashMap::new();
    let mut unmatched = 0u64;
    for e in events.iter().filter(|e| e.site.is_none()) {
        let Some(&p) = by_key.get(&(e.time, e.vehicle.as_str())) else {
            unmatched += 1;
            continue;
        };
        match slot.get(p.edge_id.as_str()) {
            Some(&i) => edges[i].count += 1,
            None => {
                slot.insert(p.edge_id.as_str(), edges.len());
                edges.push(EdgeCount { edge_id: p.edge_id.clone(), geo: p.geo, count: 1 });
            }
        }
    }
    if unmatched > 0 {
        warn!("{unmatched} unmet events have no position in the FCD table");
    }

    edges.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.edge_id.cmp(&b.edge_id)));
    edges
}

pub fn write_unmet_locations<W: Write>(inner: W, rows: &[EdgeCount]) -> MetricsResult<()> {
    let mut writer = writer_with_header(inner, &UNMET_HEADER)?;
    for row in rows {
        writer.write_record([
            row.edge_id.as_str(),
            row.geo.lon.to_string().as_str(),
            row.geo.lat.to_string().as_str(),
            row.count.to_string().as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
