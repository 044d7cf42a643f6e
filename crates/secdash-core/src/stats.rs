use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::dataset::Dataset;
use crate::error::Result;
use crate::tracking::{date_from_days, APPLICATION_DATE, APPLIED};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DatasetSummary {
    pub total: usize,
    pub applied: usize,
    pub not_applied: usize,
}

/// One point of the cumulative applications-over-time series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimelinePoint {
    pub date: NaiveDate,
    pub cumulative: usize,
}

/// Counts applied and not-applied rows. A dataset without an `Applied`
/// column counts zero applied, so `applied + not_applied == total` always
/// holds.
pub fn summarize(ds: &Dataset) -> Result<DatasetSummary> {
    let total = ds.height();
    let applied = match ds.frame().column(APPLIED) {
        Ok(column) => column.bool()?.iter().filter(|v| v.unwrap_or(false)).count(),
        Err(_) => 0,
    };
    Ok(DatasetSummary {
        total,
        applied,
        not_applied: total - applied,
    })
}

/// Groups applied rows by `Application Date`, ascending, with a running
/// total. Applied rows without a date are excluded from the series.
pub fn application_timeline(ds: &Dataset) -> Result<Vec<TimelinePoint>> {
    let df = ds.frame();
    if ds.is_empty() || df.column(APPLIED).is_err() || df.column(APPLICATION_DATE).is_err() {
        return Ok(Vec::new());
    }

    let applied = df.column(APPLIED)?.bool()?;
    let dates = df.column(APPLICATION_DATE)?.date()?;

    let mut per_day: BTreeMap<i32, usize> = BTreeMap::new();
    for idx in 0..df.height() {
        if applied.get(idx).unwrap_or(false) {
            if let Some(days) = dates.get(idx) {
                *per_day.entry(days).or_insert(0) += 1;
            }
        }
    }

    let mut points = Vec::with_capacity(per_day.len());
    let mut running = 0;
    for (days, count) in per_day {
        running += count;
        if let Some(date) = date_from_days(days) {
            points.push(TimelinePoint {
                date,
                cumulative: running,
            });
        }
    }
    Ok(points)
}
