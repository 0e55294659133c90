//! Rolling frame latency statistics

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Frames kept for average/max reporting
pub const HISTORY_LEN: usize = 100;

/// Snapshot of the monitor for reporting
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PerformanceStats {
    pub average_ms: f64,
    pub max_ms: f64,
    pub last_ms: f64,
    /// Frames processed since construction or reset
    pub frames: u64,
    /// Frames that went over the latency budget
    pub overruns: u64,
    pub budget_ms: f64,
}

impl PerformanceStats {
    pub fn within_budget(&self) -> bool {
        self.max_ms <= self.budget_ms
    }
}

/// Tracks processing time against an advisory latency budget.
/// Overruns are counted and logged; work is never cut short.
#[derive(Debug, Clone)]
pub struct PerformanceMonitor {
    history: VecDeque<f64>,
    budget_ms: f64,
    last_ms: f64,
    frames: u64,
    overruns: u64,
}

impl PerformanceMonitor {
    pub fn new(budget_ms: f64) -> Self {
        Self {
            history: VecDeque::with_capacity(HISTORY_LEN),
            budget_ms,
            last_ms: 0.0,
            frames: 0,
            overruns: 0,
        }
    }

    pub fn set_budget(&mut self, budget_ms: f64) {
        self.budget_ms = budget_ms;
    }

    pub fn record(&mut self, elapsed_ms: f64) {
        if self.history.len() == HISTORY_LEN {
            self.history.pop_front();
        }
        self.history.push_back(elapsed_ms);
        self.last_ms = elapsed_ms;
        self.frames += 1;

        if elapsed_ms > self.budget_ms {
            self.overruns += 1;
            warn!(
                elapsed_ms,
                budget_ms = self.budget_ms,
                overruns = self.overruns,
                "Harmonization frame over latency budget"
            );
        }
    }

    pub fn average_ms(&self) -> f64 {
        if self.history.is_empty() {
            return 0.0;
        }
        self.history.iter().sum::<f64>() / self.history.len() as f64
    }

    pub fn max_ms(&self) -> f64 {
        self.history.iter().copied().fold(0.0, f64::max)
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn stats(&self) -> PerformanceStats {
        PerformanceStats {
            average_ms: self.average_ms(),
            max_ms: self.max_ms(),
            last_ms: self.last_ms,
            frames: self.frames,
            overruns: self.overruns,
            budget_ms: self.budget_ms,
        }
    }

    pub fn reset(&mut self) {
        self.history.clear();
        self.last_ms = 0.0;
        self.frames = 0;
        self.overruns = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_and_max() {
        let mut monitor = PerformanceMonitor::new(10.0);
        for ms in [1.0, 2.0, 3.0, 6.0] {
            monitor.record(ms);
        }
        let stats = monitor.stats();
        assert_eq!(stats.average_ms, 3.0);
        assert_eq!(stats.max_ms, 6.0);
        assert_eq!(stats.last_ms, 6.0);
        assert_eq!(stats.frames, 4);
        assert!(stats.within_budget());
    }

    #[test]
    fn test_history_is_bounded() {
        let mut monitor = PerformanceMonitor::new(10.0);
        monitor.record(50.0);
        for _ in 0..HISTORY_LEN {
            monitor.record(1.0);
        }
        assert_eq!(monitor.history_len(), HISTORY_LEN);
        // The slow frame has rolled out of the window but is still counted
        assert_eq!(monitor.max_ms(), 1.0);
        assert_eq!(monitor.stats().overruns, 1);
        assert_eq!(monitor.stats().frames, HISTORY_LEN as u64 + 1);
    }

    #[test]
    fn test_reset() {
        let mut monitor = PerformanceMonitor::new(1.0);
        monitor.record(2.0);
        monitor.reset();
        assert_eq!(monitor.stats(), PerformanceStats { budget_ms: 1.0, ..Default::default() });
    }
}
