/// Formatting helpers for the dashboard and CLI output

use crate::core::MetricSample;
use crate::utils::CardSpec;

/// Format a metric value: whole numbers without decimals, others to two places
pub fn format_metric_value(value: f64) -> String {
    if !value.is_finite() {
        return "-".to_string();
    }

    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        let formatted = format!("{:.2}", value);
        formatted.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Card text for one metric; absent metrics show as zero
pub fn format_card_value(card: &CardSpec, sample: &MetricSample) -> String {
    let value = format_metric_value(sample.value_or_zero(card.metric));
    match card.unit {
        Some(unit) => format!("{} {}", value, unit),
        None => value,
    }
}

/// Truncate string with ellipsis
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
