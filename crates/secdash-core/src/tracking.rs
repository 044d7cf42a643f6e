// crates/secdash-core/src/tracking.rs

use std::collections::{HashMap, HashSet};

use chrono::{Datelike, NaiveDate};
use polars::prelude::*;

use crate::dataset::{Dataset, ROW_ID};
use crate::error::{PipelineError, Result};

pub const APPLIED: &str = "Applied";
pub const APPLICATION_DATE: &str = "Application Date";

/// Days between 0001-01-01 (chrono's common-era day 1) and the Unix epoch,
/// which is day zero of a polars Date column.
const UNIX_EPOCH_CE_DAYS: i32 = 719_163;

pub(crate) fn date_from_days(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days + UNIX_EPOCH_CE_DAYS)
}

pub(crate) fn days_from_date(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_CE_DAYS
}

/// Adds the tracker columns where absent: `Applied` defaults to false and
/// `Application Date` to null. Nulls that a merge introduced into an
/// existing `Applied` column are filled back to false. Idempotent.
pub fn ensure_tracking_columns(ds: &Dataset) -> Result<Dataset> {
    let mut df = ds.frame().clone();
    let len = df.height();

    match df.column(APPLIED) {
        Ok(column) => {
            let ca = column.bool()?;
            if ca.null_count() > 0 {
                let filled: Vec<bool> = ca.iter().map(|v| v.unwrap_or(false)).collect();
                df.with_column(Series::new(APPLIED.into(), filled))?;
            }
        }
        Err(_) => {
            df.with_column(Series::new(APPLIED.into(), vec![false; len]))?;
        }
    }

    if df.column(APPLICATION_DATE).is_err() {
        df.with_column(Series::full_null(
            APPLICATION_DATE.into(),
            len,
            &DataType::Date,
        ))?;
    }

    Ok(Dataset::from_indexed_frame(df))
}

/// Writes the `Applied` / `Application Date` values of an edited subset back
/// into the full dataset by row identity. All other columns and every row
/// outside the subset stay untouched; edits whose row id no longer exists
/// are skipped.
pub fn apply_edits(full: &Dataset, edited: &Dataset) -> Result<Dataset> {
    if full.is_empty() || edited.is_empty() {
        return Ok(full.clone());
    }

    let edited_df = edited.frame();
    let ids = tracked_column(edited_df, ROW_ID)?.u32()?;
    let applied = tracked_column(edited_df, APPLIED)?.bool()?;
    let dates = tracked_column(edited_df, APPLICATION_DATE)?.date()?;

    let mut edits: HashMap<u32, (bool, Option<i32>)> = HashMap::new();
    for idx in 0..edited_df.height() {
        if let Some(id) = ids.get(idx) {
            edits.insert(id, (applied.get(idx).unwrap_or(false), dates.get(idx)));
        }
    }

    let df = full.frame();
    let full_ids = tracked_column(df, ROW_ID)?.u32()?;
    let full_applied = tracked_column(df, APPLIED)?.bool()?;
    let full_dates = tracked_column(df, APPLICATION_DATE)?.date()?;

    let mut new_applied = Vec::with_capacity(df.height());
    let mut new_dates: Vec<Option<i32>> = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        match full_ids.get(idx).and_then(|id| edits.get(&id)) {
            Some(&(flag, date)) => {
                new_applied.push(flag);
                new_dates.push(date);
            }
            None => {
                new_applied.push(full_applied.get(idx).unwrap_or(false));
                new_dates.push(full_dates.get(idx));
            }
        }
    }

    let mut out = df.clone();
    out.with_column(Series::new(APPLIED.into(), new_applied))?;
    out.with_column(
        Series::new(APPLICATION_DATE.into(), new_dates).cast(&DataType::Date)?,
    )?;
    Ok(Dataset::from_indexed_frame(out))
}

/// Convenience for frontends without an editable grid: builds the edited
/// subset for the given row ids and routes it through `apply_edits`.
pub fn mark_rows(
    full: &Dataset,
    row_ids: &[u32],
    applied: bool,
    date: Option<NaiveDate>,
) -> Result<Dataset> {
    if full.is_empty() || row_ids.is_empty() {
        return Ok(full.clone());
    }

    let df = full.frame();
    let ids = tracked_column(df, ROW_ID)?.u32()?;
    let wanted: HashSet<u32> = row_ids.iter().copied().collect();
    let keep: Vec<bool> = (0..df.height())
        .map(|idx| ids.get(idx).is_some_and(|id| wanted.contains(&id)))
        .collect();

    let mask = BooleanChunked::from_slice("keep".into(), &keep);
    let mut subset = df.filter(&mask)?;
    let len = subset.height();
    let days = date.map(days_from_date);

    subset.with_column(Series::new(APPLIED.into(), vec![applied; len]))?;
    subset.with_column(
        Series::new(APPLICATION_DATE.into(), vec![days; len]).cast(&DataType::Date)?,
    )?;

    apply_edits(full, &Dataset::from_indexed_frame(subset))
}

fn tracked_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column> {
    df.column(name).map_err(|_| PipelineError::MissingColumn {
        column: name.to_string(),
    })
}
