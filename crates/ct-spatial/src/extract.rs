//! City filtering of raw operator site tables.
//!
//! Operator exports are semicolon-separated with one row per cell, so a
//! physical site appears several times under the same `node_id`.  Extraction
//! keeps the rows of one city and the first row of every site, producing the
//! comma-separated table that [`SiteCatalog::load_csv`](crate::SiteCatalog::load_csv)
//! reads.

use std::collections::HashSet;
use std::io::Read;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use ct_core::CtError;

use crate::{SpatialError, SpatialResult};

/// Coordinates stay text until the row passes the city filter, so rows of
/// other cities may leave them empty.
#[derive(Debug, Deserialize)]
struct RawSiteRecord {
    node_id:   String,
    #[serde(default)]
    site_lat:  Option<String>,
    #[serde(default)]
    site_long: Option<String>,
    #[serde(default)]
    cell_lat:  Option<String>,
    #[serde(default)]
    cell_long: Option<String>,
    #[serde(default)]
    site_name: Option<String>,
}

impl RawSiteRecord {
    /// `site_*` wins over `cell_*` when both are filled in.
    fn coordinate(site: &Option<String>, cell: &Option<String>) -> Option<String> {
        site.iter()
            .chain(cell)
            .find(|v| !v.is_empty())
            .cloned()
    }
}

fn parse_coordinate(
    value:       Option<String>,
    what:        &str,
    source_name: &str,
    line:        u64,
) -> SpatialResult<f64> {
    let value = value.ok_or_else(|| {
        CtError::malformed(source_name, line, format!("missing {what} (site_{what} or cell_{what})"))
    })?;
    value.parse::<f64>().map_err(|_| {
        CtError::malformed(source_name, line, format!("{what} {value:?} is not a number")).into()
    })
}

/// One row of the extracted table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExtractedSite {
    pub node_id:   String,
    pub cell_lat:  f64,
    pub cell_long: f64,
    pub site_name: String,
}

/// Keep the sites whose name contains `city`, first row per `node_id`.
///
/// The match is a case-sensitive substring test.  Rows without a name are
/// dropped.  Coordinates come from `site_lat`/`site_long`, falling back to
/// `cell_lat`/`cell_long`, and are only required on kept rows.
pub fn extract_city_sites<R: Read>(
    reader: R,
    source_name: &str,
    city: &str,
) -> SpatialResult<Vec<ExtractedSite>> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b';')
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers().map_err(|e| SpatialError::from_csv(source_name, e))?.clone();
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    let mut rows = 0u64;

    for result in rdr.records() {
        let record = result.map_err(|e| SpatialError::from_csv(source_name, e))?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let rec: RawSiteRecord = record
            .deserialize(Some(&headers))
            .map_err(|e| CtError::malformed(source_name, line, e.to_string()))?;
        rows += 1;
        let Some(name) = rec.site_name.filter(|n| n.contains(city)) else {
            continue;
        };
        if !seen.insert(rec.node_id.clone()) {
            debug!("skipping repeated node {}", rec.node_id);
            continue;
        }
        let lat = RawSiteRecord::coordinate(&rec.site_lat, &rec.cell_lat);
        let long = RawSiteRecord::coordinate(&rec.site_long, &rec.cell_long);
        out.push(ExtractedSite {
            cell_lat:  parse_coordinate(lat, "lat", source_name, line)?,
            cell_long: parse_coordinate(long, "long", source_name, line)?,
            node_id:   rec.node_id,
            site_name: name,
        });
    }

    info!("{source_name}: kept {} of {rows} rows for {city:?}", out.len());
    Ok(out)
}
