// crates/secdash-core/src/session.rs

use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::dataset::{self, Dataset};
use crate::error::{PipelineError, Result};
use crate::filter::{apply_filters, FilterCriteria, FilterMode};
use crate::stats::{application_timeline, summarize, DatasetSummary, TimelinePoint};
use crate::tracking;

/// Which of the two dashboard variants is driving the session. Tracker
/// sessions carry the `Applied` / `Application Date` columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    Explorer,
    Tracker,
}

/// Compute-once cache for the base dataset, keyed by source path.
///
/// Invalidation exists but nothing calls it when a supplemental file is
/// uploaded; that matches the observed behavior of the original page, where
/// an upload never re-triggers the base load.
#[derive(Debug)]
pub struct BaseCache {
    path: PathBuf,
    cached: Option<Dataset>,
}

impl BaseCache {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            cached: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&mut self) -> Result<&Dataset> {
        if self.cached.is_none() {
            let ds = dataset::load_base(&self.path)?;
            info!(
                path = %self.path.display(),
                rows = ds.height(),
                "base dataset loaded"
            );
            self.cached = Some(ds);
        }
        Ok(self.cached.as_ref().expect("base cache populated above"))
    }

    pub fn invalidate(&mut self) {
        self.cached = None;
    }
}

/// One user session: the cached base load, the current (merged) dataset,
/// user-facing notices, and the notes box.
///
/// Policy throughout: a data error never terminates the session. A missing
/// base file or a malformed upload degrades to the last-known-good dataset
/// plus a notice; filter errors are returned for the frontend to display.
#[derive(Debug)]
pub struct Session {
    kind: SessionKind,
    cache: BaseCache,
    dataset: Dataset,
    notices: Vec<String>,
    notes: Option<String>,
}

impl Session {
    pub fn open(path: impl AsRef<Path>, kind: SessionKind) -> Result<Self> {
        let mut cache = BaseCache::new(path);
        let mut notices = Vec::new();

        let dataset = match cache.get() {
            Ok(ds) => ds.clone(),
            Err(PipelineError::BaseNotFound { path }) => {
                warn!(path = %path, "base dataset missing, starting empty");
                notices.push(format!(
                    "Initial data file not found: {path}. Starting with an empty dataset."
                ));
                Dataset::empty()
            }
            Err(err) => return Err(err),
        };

        let dataset = match kind {
            SessionKind::Tracker => tracking::ensure_tracking_columns(&dataset)?,
            SessionKind::Explorer => dataset,
        };

        Ok(Self {
            kind,
            cache,
            dataset,
            notices,
            notes: None,
        })
    }

    pub fn kind(&self) -> SessionKind {
        self.kind
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn base_cache(&self) -> &BaseCache {
        &self.cache
    }

    /// Parses and merges a supplemental upload. Malformed input or a merge
    /// failure leaves the dataset untouched and records a notice.
    pub fn upload_supplemental<R: Read>(&mut self, reader: R) {
        let extra = match dataset::load_supplemental(reader) {
            Ok(extra) => extra,
            Err(err) => {
                warn!(error = %err, "supplemental upload rejected");
                self.notices
                    .push(format!("Error loading additional data: {err}"));
                return;
            }
        };

        match self.merged_with(&extra) {
            Ok(merged) => {
                self.notices.push(format!(
                    "Additional dataset merged: {} new rows, {} total.",
                    extra.height(),
                    merged.height()
                ));
                self.dataset = merged;
            }
            Err(err) => {
                warn!(error = %err, "supplemental merge failed");
                self.notices
                    .push(format!("Error merging additional data: {err}"));
            }
        }
    }

    fn merged_with(&self, extra: &Dataset) -> Result<Dataset> {
        let merged = dataset::merge(&self.dataset, extra)?;
        match self.kind {
            SessionKind::Tracker => tracking::ensure_tracking_columns(&merged),
            SessionKind::Explorer => Ok(merged),
        }
    }

    /// Full re-evaluation for the current interaction: a pure function of
    /// the current dataset and filter inputs.
    pub fn evaluate(&self, criteria: &FilterCriteria, mode: FilterMode) -> Result<Dataset> {
        apply_filters(&self.dataset, criteria, mode)
    }

    /// Writes an edited subset back into the session dataset by row id.
    pub fn record_edits(&mut self, edited: &Dataset) -> Result<()> {
        self.dataset = tracking::apply_edits(&self.dataset, edited)?;
        Ok(())
    }

    pub fn mark_rows(
        &mut self,
        row_ids: &[u32],
        applied: bool,
        date: Option<NaiveDate>,
    ) -> Result<()> {
        self.dataset = tracking::mark_rows(&self.dataset, row_ids, applied, date)?;
        Ok(())
    }

    pub fn summary(&self) -> Result<DatasetSummary> {
        summarize(&self.dataset)
    }

    pub fn timeline(&self) -> Result<Vec<TimelinePoint>> {
        application_timeline(&self.dataset)
    }

    /// Stores the notes text in memory and acknowledges. Nothing persists,
    /// matching the original page.
    pub fn save_notes(&mut self, text: impl Into<String>) {
        self.notes = Some(text.into());
        self.notices.push("Notes saved successfully!".to_string());
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    /// Drains pending user-facing messages.
    pub fn take_notices(&mut self) -> Vec<String> {
        std::mem::take(&mut self.notices)
    }
}
