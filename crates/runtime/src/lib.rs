pub mod engine;
pub mod events;
pub mod logging;
pub mod metrics;
pub mod scheduler;

pub use engine::{MarketEngine, SNAPSHOT_CHANNEL_CAPACITY};
pub use events::{TickEvent, TickStage};
pub use logging::{init_logging, LogFormat};
pub use metrics::{LatencyPercentiles, TickLatencyMetrics, DEFAULT_LATENCY_WINDOW};
pub use scheduler::{CadenceConfig, SchedulerError, SchedulerHandle, SchedulerReport, TickScheduler};
