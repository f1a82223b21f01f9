//! CSV output backend.
//!
//! | Writer                    | File (default name)           | Header                                   |
//! |---------------------------|-------------------------------|------------------------------------------|
//! | [`CsvEventWriter`]        | `output_vehicles_sites.csv`   | `vehicle_id,timestamp,site_id,distance,x,y` |
//! | [`write_site_positions`]  | `output_sites_pos.csv`        | `site_id,x,y,lat,long`                   |
//! | [`write_extracted_sites`] | `output_sites.csv`            | `node_id,cell_lat,cell_long,site_name`   |

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use csv::Writer;
use log::info;

use ct_sim::{AssociationEvent, EventSink};
use ct_spatial::{ExtractedSite, SiteCatalog};

use crate::row::{SitePositionRow, EVENT_HEADER};
use crate::{OutputError, OutputResult};

/// Create the directory that will hold `path`, if any.
pub fn create_parent_dir(path: &Path) -> OutputResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

// ── Event log ─────────────────────────────────────────────────────────────────

/// Writes association events, one row per event.
///
/// Site indices are translated back to external ids through `labels`
/// (catalog order).  Every appended batch is flushed before `append`
/// returns.
pub struct CsvEventWriter<W: Write = File> {
    writer:   Writer<W>,
    labels:   Vec<String>,
    rows:     u64,
    finished: bool,
}

impl CsvEventWriter<File> {
    /// Create (or truncate) `path`, creating its directory, and write the
    /// header row.
    pub fn create(path: &Path, labels: Vec<String>) -> OutputResult<Self> {
        create_parent_dir(path)?;
        let file = File::create(path)?;
        info!("writing association events to {}", path.display());
        Self::from_writer(file, labels)
    }
}

impl<W: Write> CsvEventWriter<W> {
    pub fn from_writer(inner: W, labels: Vec<String>) -> OutputResult<Self> {
        let mut writer = Writer::from_writer(inner);
        writer.write_record(EVENT_HEADER)?;
        writer.flush()?;
        Ok(Self { writer, labels, rows: 0, finished: false })
    }

    pub fn rows_written(&self) -> u64 {
        self.rows
    }

    /// Flush and return the underlying writer.
    pub fn into_inner(self) -> OutputResult<W> {
        self.writer.into_inner().map_err(|e| OutputError::Io(e.into_error()))
    }
}

impl<W: Write> EventSink for CsvEventWriter<W> {
    type Error = OutputError;

    fn append(&mut self, events: &[AssociationEvent]) -> OutputResult<()> {
        // Resolve every label before writing so a bad index leaves no
        // partial batch behind.
        let sites = events
            .iter()
            .map(|e| match e.site {
                Some(idx) => self
                    .labels
                    .get(idx.index())
                    .map(String::as_str)
                    .ok_or(OutputError::UnknownSite(idx.0)),
                None => Ok(""),
            })
            .collect::<OutputResult<Vec<&str>>>()?;

        for (e, site) in events.iter().zip(sites) {
            let time = e.time.to_string();
            let distance = e.distance.to_string();
            let x = e.pos.x.to_string();
            let y = e.pos.y.to_string();
            self.writer.write_record([
                e.vehicle.as_str(),
                time.as_str(),
                site,
                distance.as_str(),
                x.as_str(),
                y.as_str(),
            ])?;
        }
        self.writer.flush()?;
        self.rows += events.len() as u64;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.writer.flush()?;
        Ok(())
    }
}

// ── Site tables ───────────────────────────────────────────────────────────────

/// Write the positions of a (generated) catalog.  `lat`/`long` are empty
/// for sites without a geographic position.
pub fn write_site_positions(path: &Path, catalog: &SiteCatalog) -> OutputResult<()> {
    create_parent_dir(path)?;
    let mut writer = Writer::from_path(path)?;
    for site in catalog.all_sites() {
        writer.serialize(SitePositionRow {
            site_id: site.id.clone(),
            x:       site.pos.x,
            y:       site.pos.y,
            lat:     site.geo.map(|g| g.lat),
            long:    site.geo.map(|g| g.lon),
        })?;
    }
    writer.flush()?;
    info!("wrote {} site positions to {}", catalog.len(), path.display());
    Ok(())
}

/// Write an extracted site table in the format the loaded catalog reads.
pub fn write_extracted_sites(path: &Path, sites: &[ExtractedSite]) -> OutputResult<()> {
    create_parent_dir(path)?;
    let mut writer = Writer::from_path(path)?;
    if sites.is_empty() {
        writer.write_record(["node_id", "cell_lat", "cell_long", "site_name"])?;
    }
    for site in sites {
        writer.serialize(site)?;
    }
    writer.flush()?;
    info!("wrote {} sites to {}", sites.len(), path.display());
    Ok(())
}
