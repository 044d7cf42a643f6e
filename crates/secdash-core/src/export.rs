use std::io::Cursor;

use polars::prelude::*;

use crate::dataset::Dataset;
use crate::error::Result;

/// Name of the downloadable artifact.
pub const EXPORT_FILENAME: &str = "filtered_companies.csv";
pub const EXPORT_MIME: &str = "text/csv";

/// Serializes the dataset as comma-separated values with a header row and
/// standard quoting. The internal row-identity column is dropped.
pub fn to_csv(ds: &Dataset) -> Result<Vec<u8>> {
    let mut df = ds.without_row_id()?;
    if df.width() == 0 {
        return Ok(Vec::new());
    }

    let mut buffer = Vec::new();
    {
        let mut cursor = Cursor::new(&mut buffer);
        CsvWriter::new(&mut cursor)
            .include_header(true)
            .finish(&mut df)?;
    }
    Ok(buffer)
}
