pub mod dashboard;

// The dashboard is a single screen:
// - Header with endpoint and poll status
// - Summary cards for the latest sample
// - Trend chart over the history window
// - Help overlay (press '?')

pub use dashboard::Dashboard;
