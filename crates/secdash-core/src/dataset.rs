use std::io::{Cursor, Read};
use std::path::Path;

use polars::functions::concat_df_diagonal;
use polars::prelude::*;
use tracing::debug;

use crate::error::{PipelineError, Result};

/// Internal row-identity column. Assigned on load and after a merge,
/// preserved through filtering so edits can be written back, and stripped
/// from every exported artifact.
pub const ROW_ID: &str = "row_id";

/// An ordered collection of company records backed by a string-typed frame.
///
/// Columns are never eagerly coerced: the SEC files mix numeric columns with
/// sentinel junk, so everything loads as a string and the filter engine
/// parses only what a criterion requires.
#[derive(Debug, Clone)]
pub struct Dataset {
    df: DataFrame,
}

impl Dataset {
    pub fn empty() -> Self {
        Self {
            df: DataFrame::empty(),
        }
    }

    /// Wraps a freshly loaded or merged frame, (re)assigning row identities
    /// 0..N-1.
    pub fn from_frame(df: DataFrame) -> Result<Self> {
        let mut df = if df.column(ROW_ID).is_ok() {
            df.drop(ROW_ID)?
        } else {
            df
        };
        let ids: Vec<u32> = (0..df.height() as u32).collect();
        df.with_column(Series::new(ROW_ID.into(), ids))?;
        Ok(Self { df })
    }

    /// Wraps a frame that already carries valid row identities, e.g. a
    /// filtered subset or an edited dataset.
    pub(crate) fn from_indexed_frame(df: DataFrame) -> Self {
        Self { df }
    }

    pub fn frame(&self) -> &DataFrame {
        &self.df
    }

    pub fn height(&self) -> usize {
        self.df.height()
    }

    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.df.column(name).is_ok()
    }

    /// The frame without the internal identity column, for user-facing
    /// output.
    pub fn without_row_id(&self) -> Result<DataFrame> {
        if self.df.column(ROW_ID).is_ok() {
            Ok(self.df.drop(ROW_ID)?)
        } else {
            Ok(self.df.clone())
        }
    }
}

/// Reads the base dataset, a tab-separated file with a header row.
///
/// A missing file is `BaseNotFound`; the degrade-to-empty policy lives in
/// the session layer, not here.
pub fn load_base(path: impl AsRef<Path>) -> Result<Dataset> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(PipelineError::BaseNotFound {
            path: path.display().to_string(),
        });
    }

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .with_parse_options(CsvParseOptions::default().with_separator(b'\t'))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    debug!(
        rows = df.height(),
        columns = df.width(),
        path = %path.display(),
        "loaded base dataset"
    );
    Dataset::from_frame(df)
}

/// Parses an uploaded supplemental dataset from a stream, sniffing whether
/// it is tab- or comma-separated from the header line. Malformed input is a
/// `Parse` error so the caller can report it and skip the merge.
pub fn load_supplemental<R: Read>(mut reader: R) -> Result<Dataset> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;

    let separator = sniff_separator(&bytes);
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .with_parse_options(CsvParseOptions::default().with_separator(separator))
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()
        .map_err(|err| PipelineError::Parse {
            message: err.to_string(),
        })?;

    debug!(
        rows = df.height(),
        columns = df.width(),
        "parsed supplemental dataset"
    );
    Dataset::from_frame(df)
}

/// Appends `supplemental` to `base` and renumbers the result 0..N-1.
///
/// No schema reconciliation and no deduplication: columns present on only
/// one side become null for the other side's rows, and duplicate rows both
/// survive. Pure; callers replace their reference with the returned value.
pub fn merge(base: &Dataset, supplemental: &Dataset) -> Result<Dataset> {
    let left = base.without_row_id()?;
    let right = supplemental.without_row_id()?;

    let merged = if left.width() == 0 {
        right
    } else if right.width() == 0 {
        left
    } else {
        concat_df_diagonal(&[left, right])?
    };
    Dataset::from_frame(merged)
}

fn sniff_separator(bytes: &[u8]) -> u8 {
    let header = bytes.split(|&b| b == b'\n').next().unwrap_or(bytes);
    if header.contains(&b'\t') {
        b'\t'
    } else {
        b','
    }
}
