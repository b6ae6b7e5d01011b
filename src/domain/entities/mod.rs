mod cache_record;
mod client;
mod expense;
mod queue_item;
mod record;
mod service_record;
mod sync_report;

pub use cache_record::{CacheCounts, CacheRecord, OwnerSnapshot};
pub use client::Client;
pub use expense::ExpenseRecord;
pub use queue_item::{DrainOutcome, QueueChanged, QueueItem};
pub use record::SyncRecord;
pub use service_record::ServiceRecord;
pub use sync_report::SyncStatusSnapshot;
