pub mod config;
pub mod models;
pub mod severity; // Diagnosis → severity tier
pub mod cache; // Bounded recency cache for summaries
pub mod timeline; // Per-user timeline index
pub mod workload; // Doctor workload ranking + efficiency
pub mod urgency; // Treatment follow-up priority queue
pub mod engine; // Aggregation facade

pub use config::EngineConfig;
pub use engine::{
    Clock, EngineError, FixedClock, HealthMetricsEngine, SystemAnalytics, SystemClock,
    UrgentTreatments, UserHealthSummary, UserSummaryResponse,
};
pub use models::{Doctor, HealthRecord, NewHealthRecord, NewTreatment, Severity};

use tracing_subscriber::EnvFilter;

/// Install the fmt subscriber, filtered by `RUST_LOG` or the crate default.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter()));

    if tracing_subscriber::fmt().with_env_filter(filter).try_init().is_ok() {
        tracing::info!("{} v{} logging initialised", config::APP_NAME, config::APP_VERSION);
    }
}
