//! Per-operation latency windows.
//!
//! Every backend invocation records one sample regardless of outcome.  Each
//! operation keeps at most `capacity` samples; the oldest is evicted first.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use arrange_proto::protocol::Operation;
use serde::Serialize;

/// One timed backend call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetric {
    pub elapsed_ms: f64,
    /// Wall-clock completion time, unix milliseconds.
    pub timestamp: i64,
}

impl PerformanceMetric {
    pub fn now(elapsed: Duration) -> Self {
        Self {
            elapsed_ms: elapsed.as_secs_f64() * 1000.0,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// Aggregate view of one operation's window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSummary {
    pub count: usize,
    pub last_ms: f64,
    pub mean_ms: f64,
    pub max_ms: f64,
}

#[derive(Debug, Clone)]
pub struct PerformanceStore {
    capacity: usize,
    windows: HashMap<Operation, VecDeque<PerformanceMetric>>,
}

impl PerformanceStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            windows: HashMap::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn record(&mut self, operation: Operation, elapsed: Duration) {
        self.record_sample(operation, PerformanceMetric::now(elapsed));
    }

    pub fn record_sample(&mut self, operation: Operation, sample: PerformanceMetric) {
        let window = self
            .windows
            .entry(operation)
            .or_insert_with(|| VecDeque::with_capacity(self.capacity));
        while window.len() >= self.capacity {
            window.pop_front();
        }
        window.push_back(sample);
    }

    /// Samples for `operation`, oldest first.
    pub fn samples(&self, operation: Operation) -> impl Iterator<Item = &PerformanceMetric> {
        self.windows.get(&operation).into_iter().flatten()
    }

    pub fn len(&self, operation: Operation) -> usize {
        self.windows.get(&operation).map_or(0, |w| w.len())
    }

    pub fn is_empty(&self) -> bool {
        self.windows.values().all(|w| w.is_empty())
    }

    pub fn reset(&mut self) {
        self.windows.clear();
    }

    pub fn summary(&self, operation: Operation) -> Option<MetricSummary> {
        let window = self.windows.get(&operation)?;
        let last = window.back()?;
        let total: f64 = window.iter().map(|m| m.elapsed_ms).sum();
        let max = window.iter().map(|m| m.elapsed_ms).fold(0.0, f64::max);
        Some(MetricSummary {
            count: window.len(),
            last_ms: last.elapsed_ms,
            mean_ms: total / window.len() as f64,
            max_ms: max,
        })
    }

    /// One line per operation that has samples.
    pub fn format(&self) -> String {
        let mut lines = Vec::new();
        for op in Operation::ALL {
            if let Some(s) = self.summary(op) {
                lines.push(format!(
                    "{:<46} n={:<4} last={:>8.1}ms mean={:>8.1}ms max={:>8.1}ms",
                    op.name(),
                    s.count,
                    s.last_ms,
                    s.mean_ms,
                    s.max_ms
                ));
            }
        }
        if lines.is_empty() {
            "no samples".to_string()
        } else {
            lines.join("\n")
        }
    }
}
