//! Shared CSV plumbing for the analyses.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use csv::{Reader, ReaderBuilder, Writer};

use ct_output::create_parent_dir;

use crate::MetricsResult;

/// Reader for a semicolon-separated SUMO `xml2csv` table.
pub(crate) fn semicolon_reader<R: Read>(reader: R) -> Reader<R> {
    ReaderBuilder::new()
        .delimiter(b';')
        .trim(csv::Trim::All)
        .from_reader(reader)
}

/// Create (or truncate) an output table, creating its directory.
pub(crate) fn create_output(path: &Path) -> MetricsResult<File> {
    create_parent_dir(path)?;
    Ok(File::create(path)?)
}

/// Comma-separated writer with `header` already written.
pub(crate) fn writer_with_header<W: Write>(inner: W, header: &[&str]) -> MetricsResult<Writer<W>> {
    let mut writer = Writer::from_writer(inner);
    writer.write_record(header)?;
    Ok(writer)
}
