use polars::prelude::*;

use crate::dataset::Dataset;
use crate::error::{PipelineError, Result};
use crate::tracking::APPLIED;

pub const COUNTRY_BA: &str = "countryba";
pub const STATE_BA: &str = "stprba";
pub const CITY_BA: &str = "cityba";
pub const SIC: &str = "sic";
pub const COUNTRY_INC: &str = "countryinc";
pub const STATE_INC: &str = "stprinc";

/// One equality constraint per filter field; an absent or empty value means
/// no constraint on that column. The active set is the conjunction of every
/// non-empty criterion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub country: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    /// Industry SIC code; must be an integer literal.
    pub sic: Option<String>,
    pub country_inc: Option<String>,
    pub state_inc: Option<String>,
    pub status: AppliedStatus,
}

impl FilterCriteria {
    fn string_criteria(&self) -> Vec<(&'static str, &str)> {
        [
            (COUNTRY_BA, &self.country),
            (STATE_BA, &self.state),
            (CITY_BA, &self.city),
            (COUNTRY_INC, &self.country_inc),
            (STATE_INC, &self.state_inc),
        ]
        .into_iter()
        .filter_map(|(column, value)| non_empty(value).map(|v| (column, v)))
        .collect()
    }
}

/// The applied-status radio of the tracker variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AppliedStatus {
    #[default]
    All,
    Applied,
    NotApplied,
}

/// `ShowAll` is the "Reset Filters" override: filtering is skipped entirely
/// and the full dataset comes back even when criteria fields are populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    Apply,
    ShowAll,
}

/// Returns the sub-sequence of rows matching every non-empty criterion.
///
/// The filter is stable: relative order and row identities are preserved.
/// String criteria compare exactly (case-sensitive, untrimmed); the SIC
/// criterion is parsed as an integer and compared numerically. An empty
/// dataset filters to itself regardless of criteria.
pub fn apply_filters(
    ds: &Dataset,
    criteria: &FilterCriteria,
    mode: FilterMode,
) -> Result<Dataset> {
    if mode == FilterMode::ShowAll || ds.is_empty() {
        return Ok(ds.clone());
    }

    let df = ds.frame();
    let len = df.height();
    let mut keep = vec![true; len];

    for (column, value) in criteria.string_criteria() {
        let ca = str_column(df, column)?;
        for (idx, slot) in keep.iter_mut().enumerate() {
            if *slot && ca.get(idx) != Some(value) {
                *slot = false;
            }
        }
    }

    if let Some(raw) = non_empty(&criteria.sic) {
        let wanted: i64 = raw
            .parse()
            .map_err(|_| PipelineError::InvalidFilterValue {
                column: SIC,
                value: raw.to_string(),
            })?;
        let ca = str_column(df, SIC)?;
        for (idx, slot) in keep.iter_mut().enumerate() {
            if *slot && !sic_matches(ca.get(idx), wanted) {
                *slot = false;
            }
        }
    }

    match criteria.status {
        AppliedStatus::All => {}
        AppliedStatus::Applied | AppliedStatus::NotApplied => {
            let wanted = criteria.status == AppliedStatus::Applied;
            let ca = df
                .column(APPLIED)
                .map_err(|_| PipelineError::MissingColumn {
                    column: APPLIED.to_string(),
                })?
                .bool()?;
            for (idx, slot) in keep.iter_mut().enumerate() {
                if *slot && ca.get(idx).unwrap_or(false) != wanted {
                    *slot = false;
                }
            }
        }
    }

    let mask = BooleanChunked::from_slice("keep".into(), &keep);
    Ok(Dataset::from_indexed_frame(df.filter(&mask)?))
}

fn str_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a StringChunked> {
    let column = df.column(name).map_err(|_| PipelineError::MissingColumn {
        column: name.to_string(),
    })?;
    Ok(column.str()?)
}

/// SIC is numeric in the source files but often arrives float-formatted
/// when blanks are present, so "2834.0" must match a criterion of 2834.
/// Unparseable sentinel values never match.
fn sic_matches(cell: Option<&str>, wanted: i64) -> bool {
    let Some(raw) = cell.map(str::trim) else {
        return false;
    };
    if let Ok(value) = raw.parse::<i64>() {
        return value == wanted;
    }
    raw.parse::<f64>()
        .map(|value| value == wanted as f64)
        .unwrap_or(false)
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
