/// Bounded trend history
///
/// Sliding window of the most recent samples, oldest first. Appending to a
/// full window evicts the oldest entry; entries are never reordered.

use std::collections::VecDeque;

use crate::core::sample::HistoryEntry;
use crate::utils::HISTORY_CAPACITY;

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryBuffer {
    entries: VecDeque<HistoryEntry>,
}

impl HistoryBuffer {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::with_capacity(HISTORY_CAPACITY),
        }
    }

    /// Append in place, returning the evicted entry if the window was full
    pub fn push(&mut self, entry: HistoryEntry) -> Option<HistoryEntry> {
        let evicted = if self.entries.len() >= HISTORY_CAPACITY {
            self.entries.pop_front()
        } else {
            None
        };
        self.entries.push_back(entry);
        evicted
    }

    /// Pure append: the last `HISTORY_CAPACITY - 1` entries followed by `entry`
    pub fn append(&self, entry: HistoryEntry) -> Self {
        let mut next = self.clone();
        next.push(entry);
        next
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        HISTORY_CAPACITY
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.back()
    }

    pub fn oldest(&self) -> Option<&HistoryEntry> {
        self.entries.front()
    }

    pub fn to_vec(&self) -> Vec<HistoryEntry> {
        self.entries.iter().cloned().collect()
    }

    /// Chart points for one metric: (position in window, value or zero)
    pub fn series(&self, metric: &str) -> Vec<(f64, f64)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (i as f64, entry.sample.value_or_zero(metric)))
            .collect()
    }

    /// Largest value of the given metrics across the window, zero when empty
    pub fn max_value(&self, metrics: &[&str]) -> f64 {
        self.entries
            .iter()
            .flat_map(|entry| metrics.iter().map(move |m| entry.sample.value_or_zero(m)))
            .fold(0.0, f64::max)
    }
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sample::MetricSample;
    use crate::utils::{CPU_USAGE, LATENCY_MS};
    use chrono::Local;

    fn entry(cpu: f64) -> HistoryEntry {
        HistoryEntry::new(MetricSample::new().with(CPU_USAGE, cpu), Local::now())
    }

    fn cpu_values(buffer: &HistoryBuffer) -> Vec<f64> {
        buffer.iter().map(|e| e.sample.value_or_zero(CPU_USAGE)).collect()
    }

    #[test]
    fn test_length_is_min_of_appends_and_capacity() {
        for n in [0usize, 1, 5, 19, 20, 21, 57] {
            let mut buffer = HistoryBuffer::new();
            for i in 0..n {
                buffer.push(entry(i as f64));
            }
            assert_eq!(buffer.len(), n.min(HISTORY_CAPACITY), "after {} appends", n);
        }
    }

    #[test]
    fn test_keeps_insertion_order() {
        let mut buffer = HistoryBuffer::new();
        for cpu in [10.0, 20.0, 30.0] {
            buffer.push(entry(cpu));
        }

        assert_eq!(cpu_values(&buffer), vec![10.0, 20.0, 30.0]);
        assert_eq!(buffer.latest().unwrap().sample.get(CPU_USAGE), Some(30.0));
    }

    #[test]
    fn test_evicts_oldest_when_full() {
        let mut buffer = HistoryBuffer::new();
        let mut evicted = Vec::new();
        for cpu in 1..=21 {
            if let Some(old) = buffer.push(entry(cpu as f64)) {
                evicted.push(old.sample.value_or_zero(CPU_USAGE));
            }
        }

        let expected: Vec<f64> = (2..=21).map(|v| v as f64).collect();
        assert_eq!(cpu_values(&buffer), expected);
        assert_eq!(evicted, vec![1.0]);
        assert_eq!(buffer.oldest().unwrap().sample.get(CPU_USAGE), Some(2.0));
    }

    #[test]
    fn test_append_is_pure() {
        let mut original = HistoryBuffer::new();
        original.push(entry(1.0));

        let next = original.append(entry(2.0));

        assert_eq!(cpu_values(&original), vec![1.0]);
        assert_eq!(cpu_values(&next), vec![1.0, 2.0]);
        // repeated reads without new data are stable
        assert_eq!(cpu_values(&next), cpu_values(&next.clone()));
    }

    #[test]
    fn test_series_defaults_missing_metric_to_zero() {
        let mut buffer = HistoryBuffer::new();
        buffer.push(entry(5.0));
        buffer.push(HistoryEntry::new(
            MetricSample::new().with(LATENCY_MS, 80.0),
            Local::now(),
        ));

        assert_eq!(buffer.series(CPU_USAGE), vec![(0.0, 5.0), (1.0, 0.0)]);
        assert_eq!(buffer.series(LATENCY_MS), vec![(0.0, 0.0), (1.0, 80.0)]);
        assert_eq!(buffer.max_value(&[CPU_USAGE, LATENCY_MS]), 80.0);
    }

    #[test]
    fn test_max_value_of_empty_window() {
        assert_eq!(HistoryBuffer::new().max_value(&[CPU_USAGE]), 0.0);
    }
}
