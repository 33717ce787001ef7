// Entity store: validated, field-level merging of feed updates

mod entity;
pub mod metrics;
mod metrics_broadcaster;
mod store;

pub use entity::{EntityRecord, FieldUpdate, StoreReset, TotalsUpdate};
pub use metrics::{IngestMetrics, MetricsSnapshot, RejectedCounts};
pub use metrics_broadcaster::{run_metrics_broadcaster, MetricsUpdate};
pub use store::{EntityStore, IngestOutcome};
