//! Incremental synchronization engine
//!
//! Raw source rows are normalized into canonical records, fingerprinted and
//! compared with the fingerprints already stored at the destination. Only the
//! difference is written, in batches, inside one transaction per run.

pub mod batch;
pub mod diff;
pub mod engine;
pub mod error;
pub mod fingerprint;
pub mod normalize;
pub mod record;
pub mod report;
pub mod transaction;
pub mod value;

pub use batch::DEFAULT_BATCH_SIZE;
pub use diff::FingerprintMap;
pub use engine::{SyncOptions, run_entity};
pub use error::{SyncError, SyncResult};
pub use fingerprint::Fingerprint;
pub use record::{NaturalKey, SyncRecord};
pub use report::SyncReport;
pub use value::Value;
