pub mod config;
pub mod fetcher;
pub mod history;
pub mod logger;
pub mod poller;
pub mod sample;

pub use config::{ConfigError, DashboardConfig};
pub use fetcher::{FetchError, Fetcher, HttpFetcher};
pub use history::HistoryBuffer;
pub use logger::{PollLogger, TracingLogger};
pub use poller::{DashboardSnapshot, MetricsPoller, OverlapPolicy, PollStats, PollerError, PollerPhase};
pub use sample::{Capture, HistoryEntry, MetricSample};
