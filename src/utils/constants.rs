/// Dashboard constants
///
/// Poll cadence and window size are fixed; they are not user configurable.

use std::time::Duration;

/// Time between scheduled fetches
pub const POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Number of samples kept for the trend chart
pub const HISTORY_CAPACITY: usize = 20;

/// Metrics endpoint path, joined onto the backend base URL
pub const METRICS_PATH: &str = "/metrics";

/// Backend used when nothing else is configured
pub const DEFAULT_BACKEND_BASE_URL: &str = "http://localhost:5000";

/// Environment variable holding the backend base URL
pub const BACKEND_BASE_URL_ENV: &str = "BACKEND_BASE_URL";

/// How long the TUI waits for a key press before redrawing
pub const UI_TICK: Duration = Duration::from_millis(100);

// Metric names the presentation layer knows about
pub const CPU_USAGE: &str = "cpu_usage";
pub const LATENCY_MS: &str = "latency_ms";
pub const MEMORY_USAGE_MB: &str = "memory_usage_mb";
pub const REQUEST_COUNT: &str = "request_count";

/// Summary card definition
#[derive(Debug, Clone, Copy)]
pub struct CardSpec {
    pub label: &'static str,
    pub metric: &'static str,
    pub unit: Option<&'static str>,
}

pub const SUMMARY_CARDS: &[CardSpec] = &[
    CardSpec { label: "CPU Usage", metric: CPU_USAGE, unit: Some("%") },
    CardSpec { label: "Latency", metric: LATENCY_MS, unit: Some("ms") },
    CardSpec { label: "Memory Usage", metric: MEMORY_USAGE_MB, unit: Some("MB") },
    CardSpec { label: "Request Count", metric: REQUEST_COUNT, unit: None },
];

/// Trend line definition
#[derive(Debug, Clone, Copy)]
pub struct SeriesSpec {
    pub name: &'static str,
    pub metric: &'static str,
}

pub const TREND_SERIES: &[SeriesSpec] = &[
    SeriesSpec { name: "CPU (%)", metric: CPU_USAGE },
    SeriesSpec { name: "Latency (ms)", metric: LATENCY_MS },
    SeriesSpec { name: "Memory (MB)", metric: MEMORY_USAGE_MB },
];
