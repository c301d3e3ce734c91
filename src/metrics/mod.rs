//! 性能监控 - in-process samples over a sliding window.
//!
//! Series are named `"{group}:{operation}"` (e.g. `search:search_logs`,
//! `api:export`). Samples outside the window are pruned lazily on the next
//! write or read of the same series, so an idle series costs nothing.

use parking_lot::RwLock;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

pub const GROUP_API: &str = "api";
pub const GROUP_SEARCH: &str = "search";
pub const GROUP_STORE: &str = "store";

#[derive(Debug, Clone, Copy)]
struct Sample {
    at: Instant,
    value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesSummary {
    pub name: String,
    pub average: f64,
    pub samples: usize,
}

pub struct PerformanceMonitor {
    window: Duration,
    series: RwLock<HashMap<String, VecDeque<Sample>>>,
}

impl Default for PerformanceMonitor {
    fn default() -> Self {
        Self::new(Duration::from_secs(3600))
    }
}

impl PerformanceMonitor {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            series: RwLock::new(HashMap::new()),
        }
    }

    /// Records one sample (typically a latency in milliseconds).
    pub fn record(&self, name: &str, value: f64) {
        let now = Instant::now();
        let mut series = self.series.write();
        let samples = series.entry(name.to_string()).or_default();
        Self::prune(samples, now, self.window);
        samples.push_back(Sample { at: now, value });
    }

    /// Average over in-window samples, or `None` for an unknown or fully
    /// expired series.
    pub fn average(&self, name: &str) -> Option<f64> {
        let now = Instant::now();
        let mut series = self.series.write();
        let samples = series.get_mut(name)?;
        Self::prune(samples, now, self.window);
        if samples.is_empty() {
            return None;
        }
        let sum: f64 = samples.iter().map(|s| s.value).sum();
        Some(sum / samples.len() as f64)
    }

    /// Per-series averages for one group, rounded to two decimals.
    pub fn summaries_for_group(&self, group: &str) -> Vec<SeriesSummary> {
        let prefix = format!("{}:", group);
        let now = Instant::now();
        let mut series = self.series.write();

        let mut out: Vec<SeriesSummary> = series
            .iter_mut()
            .filter(|(name, _)| name.starts_with(&prefix))
            .filter_map(|(name, samples)| {
                Self::prune(samples, now, self.window);
                if samples.is_empty() {
                    return None;
                }
                let sum: f64 = samples.iter().map(|s| s.value).sum();
                let average = (sum / samples.len() as f64 * 100.0).round() / 100.0;
                Some(SeriesSummary {
                    name: name.clone(),
                    average,
                    samples: samples.len(),
                })
            })
            .collect();

        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }

    pub fn sample_count(&self, name: &str) -> usize {
        self.series
            .read()
            .get(name)
            .map(|s| s.len())
            .unwrap_or(0)
    }

    fn prune(samples: &mut VecDeque<Sample>, now: Instant, window: Duration) {
        while let Some(front) = samples.front() {
            if now.duration_since(front.at) > window {
                samples.pop_front();
            } else {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_over_samples() {
        let monitor = PerformanceMonitor::default();
        monitor.record("search:search_logs", 10.0);
        monitor.record("search:search_logs", 20.0);
        monitor.record("search:search_logs", 30.0);
        assert_eq!(monitor.average("search:search_logs"), Some(20.0));
        assert_eq!(monitor.average("search:unknown"), None);
    }

    #[test]
    fn test_expired_samples_are_pruned() {
        let monitor = PerformanceMonitor::new(Duration::from_millis(30));
        monitor.record("api:search", 100.0);
        std::thread::sleep(Duration::from_millis(60));
        monitor.record("api:search", 10.0);
        assert_eq!(monitor.average("api:search"), Some(10.0));
        assert_eq!(monitor.sample_count("api:search"), 1);
    }

    #[test]
    fn test_group_summaries_are_scoped_and_rounded() {
        let monitor = PerformanceMonitor::default();
        monitor.record("search:search_logs", 10.0);
        monitor.record("search:search_logs", 10.5);
        monitor.record("search:count", 3.0);
        monitor.record("store:insert_history", 99.0);

        let summaries = monitor.summaries_for_group(GROUP_SEARCH);
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].name, "search:count");
        assert_eq!(summaries[1].average, 10.25);
        assert_eq!(summaries[1].samples, 2);
    }
}
