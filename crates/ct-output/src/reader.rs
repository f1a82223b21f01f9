//! Reading the association event log back.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use ct_core::{CtError, SimTime, VehicleId, XyPoint};

use crate::row::{EventRecord, EventRow};
use crate::{OutputError, OutputResult};

/// Read every event of a log written by
/// [`CsvEventWriter`](crate::CsvEventWriter), in file order.
pub fn read_events(path: &Path) -> OutputResult<Vec<EventRecord>> {
    let file = File::open(path)?;
    read_events_from(file, &path.display().to_string())
}

/// Like [`read_events`] but reads from any source.  `source_name` is used in
/// error messages.
pub fn read_events_from<R: Read>(reader: R, source_name: &str) -> OutputResult<Vec<EventRecord>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = rdr.headers().map_err(|e| OutputError::from_csv(source_name, e))?.clone();
    let mut record = csv::StringRecord::new();
    let mut out = Vec::new();
    while rdr.read_record(&mut record).map_err(|e| OutputError::from_csv(source_name, e))? {
        let row: EventRow = record
            .deserialize(Some(&headers))
            .map_err(|e| OutputError::from_csv(source_name, e))?;
        let Some(time) = SimTime::try_from_secs_f64(row.timestamp) else {
            let line = record.position().map_or(0, |p| p.line());
            return Err(CtError::malformed(
                source_name,
                line,
                format!("invalid timestamp {}", row.timestamp),
            )
            .into());
        };
        out.push(EventRecord {
            vehicle:  VehicleId::from(row.vehicle_id),
            time,
            site:     row.site_id.filter(|s| !s.is_empty()),
            distance: row.distance,
            pos:      XyPoint::new(row.x, row.y),
        });
    }
    Ok(out)
}
