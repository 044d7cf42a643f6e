pub mod dataset;
pub mod error;
pub mod export;
pub mod filter;
pub mod session;
pub mod stats;
pub mod tracking;

pub use dataset::{load_base, load_supplemental, merge, Dataset, ROW_ID};
pub use error::{PipelineError, Result};
pub use export::{to_csv, EXPORT_FILENAME, EXPORT_MIME};
pub use filter::{apply_filters, AppliedStatus, FilterCriteria, FilterMode};
pub use session::{BaseCache, Session, SessionKind};
pub use stats::{application_timeline, summarize, DatasetSummary, TimelinePoint};
pub use tracking::{
    apply_edits, ensure_tracking_columns, mark_rows, APPLICATION_DATE, APPLIED,
};
