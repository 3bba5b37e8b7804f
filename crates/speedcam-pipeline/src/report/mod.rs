//! Speed reports: threshold filtering, clip extraction and persistence.

mod filter;
mod publish;
mod store;

pub use filter::{
    clip_file_name, clip_file_name_nth, filter, ReportCandidate, ReportFilter,
    DEFAULT_CLIP_PADDING_S,
};
pub use publish::{PublishFailure, PublishSummary, ReportPublisher};
pub use store::{JsonReportStore, ReportRecord, ReportStore};
