//! `ct-output` — CSV tables produced and consumed by the association run.
//!
//! | Table                        | Written by                 | Read by            |
//! |------------------------------|----------------------------|--------------------|
//! | association event log        | [`CsvEventWriter`]         | [`read_events`]    |
//! | generated site positions     | [`write_site_positions`]   | —                  |
//! | extracted city sites         | [`write_extracted_sites`]  | `SiteCatalog::load_csv` |
//!
//! [`CsvEventWriter`] implements `ct_sim::EventSink`; [`ProgressLogger`]
//! implements `ct_sim::SimObserver`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use ct_output::{CsvEventWriter, ProgressLogger};
//!
//! let mut writer = CsvEventWriter::create(Path::new("out/events.csv"), catalog.labels())?;
//! let summary = sim.run(&mut writer, &mut ProgressLogger::new(3_600))?;
//! ```

pub mod csv;
pub mod error;
pub mod observer;
pub mod reader;
pub mod row;

#[cfg(test)]
mod tests;

pub use self::csv::{create_parent_dir, write_extracted_sites, write_site_positions, CsvEventWriter};
pub use error::{OutputError, OutputResult};
pub use observer::ProgressLogger;
pub use reader::{read_events, read_events_from};
pub use row::{EventRecord, EventRow, SitePositionRow};
