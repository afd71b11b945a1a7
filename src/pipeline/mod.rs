//! Pipeline entry points for feed operations.
//!
//! - `run_ingest`: Fetch configured channels and store new items
//! - `Paginator`: Latest and most-clicked listings
//! - `run_cleanup`: Remove index entries past retention

pub mod cleanup;
pub mod ingest;
pub mod paginate;

pub use cleanup::{CleanupReport, run_cleanup};
pub use ingest::{ChannelReport, EntryOutcome, IngestReport, Ingestor, run_ingest};
pub use paginate::{Page, Paginator, category_filter};
