//! CSV export of scraped listings.

use crate::amazon::Listing;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes listings to `path`, replacing any existing file.
///
/// The header row is always present, even when there are no listings.
pub fn write_listings(path: &Path, listings: &[Listing]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;

    write_to(file, listings)
        .with_context(|| format!("Failed to write output file: {}", path.display()))
}

/// Writes the header and one row per listing to any writer.
pub fn write_to<W: Write>(writer: W, listings: &[Listing]) -> Result<()> {
    let mut csv = csv::WriterBuilder::new().has_headers(false).from_writer(writer);

    csv.write_record(Listing::HEADERS)?;
    for listing in listings {
        csv.serialize(listing)?;
    }

    csv.flush()?;
    Ok(())
}
