use std::io::{self, Write};

use csv::{Terminator, WriterBuilder};
use thiserror::Error;
use tracing::debug;

use crate::models::record::Record;

#[derive(Error, Debug)]
pub enum TabularExportError {
    #[error("Failed to serialize record. Error: {0}")]
    Serialize(#[from] csv::Error),

    #[error("Failed to flush records to destination. Error: {0}")]
    Flush(#[from] io::Error),
}

/// Append one CRLF terminated CSV row per record to `destination`.
///
/// No header is ever written, so repeated calls against the same append-only
/// destination simply concatenate.
#[tracing::instrument(skip_all)]
pub fn write_records<W: Write>(
    destination: &mut W,
    records: &[Record],
) -> Result<(), TabularExportError> {
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .terminator(Terminator::CRLF)
        .from_writer(destination);

    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    debug!("Wrote {} records.", records.len());
    Ok(())
}
