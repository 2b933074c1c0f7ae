pub mod log;
pub mod manual;
pub mod reconciler;
pub mod sync;
pub mod timeline;

pub use log::SyncLog;
pub use manual::{load_manual_bookings, manual_occupancies};
pub use reconciler::{ingest, plan_ingestion, IngestPlan, PersistenceReport};
pub use sync::{SyncEngine, SyncReport};
pub use timeline::Timeline;
