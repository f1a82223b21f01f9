//! Per-vehicle counts over the event log: distinct sites and site changes.

use std::collections::{BTreeSet, HashMap};
use std::io::Write;

use ct_output::EventRecord;

use crate::table::writer_with_header;
use crate::MetricsResult;

pub const VEHICLE_COUNT_HEADER: [&str; 2] = ["vehicle_id", "count"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VehicleCount {
    pub vehicle_id: String,
    pub count:      u64,
}

/// Highest count first, ties by vehicle id.
fn sorted(counts: impl IntoIterator<Item = (String, u64)>) -> Vec<VehicleCount> {
    let mut out: Vec<VehicleCount> = counts
        .into_iter()
        .map(|(vehicle_id, count)| VehicleCount { vehicle_id, count })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.vehicle_id.cmp(&b.vehicle_id)));
    out
}

/// Distinct sites each vehicle was ever associated with.
///
/// Vehicles that never had a site do not appear.
pub fn unique_sites(events: &[EventRecord]) -> Vec<VehicleCount> {
    let mut sites: HashMap<&str, BTreeSet<&str>> = HashMap::new();
    for e in events {
        if let Some(site) = e.site.as_deref() {
            sites.entry(e.vehicle.as_str()).or_default().insert(site);
        }
    }
    sorted(sites.into_iter().map(|(v, s)| (v.to_owned(), s.len() as u64)))
}

/// Association changes per vehicle, replaying its events in log order from
/// "no site".  Losing a site counts as a change; every vehicle in the log
/// appears, with 0 if it never changed.
pub fn number_changes(events: &[EventRecord]) -> Vec<VehicleCount> {
    let mut state: HashMap<&str, (Option<&str>, u64)> = HashMap::new();
    for e in events {
        let (current, changes) = state.entry(e.vehicle.as_str()).or_insert((None, 0));
        let site = e.site.as_deref();
        if *current != site {
            *current = site;
            *changes += 1;
        }
    }
    sorted(state.into_iter().map(|(v, (_, n))| (v.to_owned(), n)))
}

pub fn write_vehicle_counts<W: Write>(inner: W, rows: &[VehicleCount]) -> MetricsResult<()> {
    let mut writer = writer_with_header(inner, &VEHICLE_COUNT_HEADER)?;
    for row in rows {
        writer.write_record([row.vehicle_id.as_str(), row.count.to_string().as_str()])?;
    }
    writer.flush()?;
    Ok(())
}
