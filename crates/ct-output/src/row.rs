//! Plain data row types written and read by the CSV tables.

use serde::{Deserialize, Serialize};

use ct_core::{SimTime, VehicleId, XyPoint};

/// Column names of the association event log.
pub const EVENT_HEADER: [&str; 6] = ["vehicle_id", "timestamp", "site_id", "distance", "x", "y"];

/// One event-log row as it appears on disk.
///
/// `timestamp` is in simulation seconds; an empty `site_id` means no site
/// was within the threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRow {
    pub vehicle_id: String,
    pub timestamp:  f64,
    pub site_id:    Option<String>,
    pub distance:   f64,
    pub x:          f64,
    pub y:          f64,
}

/// A decoded event-log row with typed fields.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub vehicle:  VehicleId,
    pub time:     SimTime,
    pub site:     Option<String>,
    pub distance: f64,
    pub pos:      XyPoint,
}

/// One row of the generated-site side table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SitePositionRow {
    pub site_id: String,
    pub x:       f64,
    pub y:       f64,
    pub lat:     Option<f64>,
    pub long:    Option<f64>,
}
