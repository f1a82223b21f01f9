//! Users per site per timestamp.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;

use ct_core::SimTime;
use ct_output::EventRecord;

use crate::table::writer_with_header;
use crate::MetricsResult;

pub const USERS_HEADER: [&str; 3] = ["timestamp", "site_id", "number_vehicles"];

/// Number of distinct vehicles associated with one site at one timestamp.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SiteOccupancy {
    pub time:     SimTime,
    pub site_id:  String,
    pub vehicles: u64,
}

/// Count distinct vehicles per `(timestamp, site)`, sorted by timestamp then
/// site id.  Events without a site are not counted.
pub fn users_per_site(events: &[EventRecord]) -> Vec<SiteOccupancy> {
    let mut groups: BTreeMap<(SimTime, &str), BTreeSet<&str>> = BTreeMap::new();
    for e in events {
        if let Some(site) = e.site.as_deref() {
            groups.entry((e.time, site)).or_default().insert(e.vehicle.as_str());
        }
    }
    groups
        .into_iter()
        .map(|((time, site), vehicles)| SiteOccupancy {
            time,
            site_id:  site.to_owned(),
            vehicles: vehicles.len() as u64,
        })
        .collect()
}

pub fn write_users<W: Write>(inner: W, rows: &[SiteOccupancy]) -> MetricsResult<()> {
    let mut writer = writer_with_header(inner, &USERS_HEADER)?;
    for row in rows {
        writer.write_record([
            row.time.to_string().as_str(),
            row.site_id.as_str(),
            row.vehicles.to_string().as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
