//! Command Metrics
//!
//! One row of counters per command name. Totals are folded from the rows
//! on demand, so recording a command touches a single row.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;

/// Point-in-time copy of one command's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommandStats {
    pub calls: u64,
    pub errors: u64,
    pub total_us: u64,
    pub min_us: u64,
    pub max_us: u64,
}

impl CommandStats {
    pub fn avg_us(&self) -> f64 {
        if self.calls == 0 {
            0.0
        } else {
            self.total_us as f64 / self.calls as f64
        }
    }

    fn merge(self, other: CommandStats) -> CommandStats {
        if self.calls == 0 {
            return other;
        }
        CommandStats {
            calls: self.calls + other.calls,
            errors: self.errors + other.errors,
            total_us: self.total_us + other.total_us,
            min_us: self.min_us.min(other.min_us),
            max_us: self.max_us.max(other.max_us),
        }
    }
}

#[derive(Debug)]
struct Row {
    calls: AtomicU64,
    errors: AtomicU64,
    total_us: AtomicU64,
    min_us: AtomicU64,
    max_us: AtomicU64,
}

impl Default for Row {
    fn default() -> Self {
        Self {
            calls: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            total_us: AtomicU64::new(0),
            min_us: AtomicU64::new(u64::MAX),
            max_us: AtomicU64::new(0),
        }
    }
}

impl Row {
    fn observe(&self, micros: u64, failed: bool) {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if failed {
            self.errors.fetch_add(1, Ordering::Relaxed);
        }
        self.total_us.fetch_add(micros, Ordering::Relaxed);
        self.min_us.fetch_min(micros, Ordering::Relaxed);
        self.max_us.fetch_max(micros, Ordering::Relaxed);
    }

    fn stats(&self) -> CommandStats {
        CommandStats {
            calls: self.calls.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            total_us: self.total_us.load(Ordering::Relaxed),
            min_us: self.min_us.load(Ordering::Relaxed),
            max_us: self.max_us.load(Ordering::Relaxed),
        }
    }
}

/// Per-command call, error and latency counters.
#[derive(Debug, Default)]
pub struct Metrics {
    rows: DashMap<String, Row>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one execution of `command`. Failed executions count as calls too.
    pub fn record(&self, command: &str, latency: Duration, failed: bool) {
        let micros = u64::try_from(latency.as_micros()).unwrap_or(u64::MAX);
        match self.rows.get(command) {
            Some(row) => row.observe(micros, failed),
            None => self
                .rows
                .entry(command.to_string())
                .or_default()
                .observe(micros, failed),
        }
    }

    /// Counters of one command, if it ever ran.
    pub fn command(&self, command: &str) -> Option<CommandStats> {
        self.rows.get(command).map(|row| row.stats())
    }

    /// All commands, busiest first.
    pub fn by_command(&self) -> Vec<(String, CommandStats)> {
        let mut rows: Vec<_> = self
            .rows
            .iter()
            .map(|row| (row.key().clone(), row.stats()))
            .collect();
        rows.sort_by(|a, b| b.1.calls.cmp(&a.1.calls).then_with(|| a.0.cmp(&b.0)));
        rows
    }

    /// Every command folded into one row. `min_us` is 0 before any call.
    pub fn totals(&self) -> CommandStats {
        let folded = self
            .rows
            .iter()
            .map(|row| row.stats())
            .fold(CommandStats::default(), CommandStats::merge);
        CommandStats {
            min_us: if folded.calls == 0 { 0 } else { folded.min_us },
            ..folded
        }
    }

    pub fn total_ops(&self) -> u64 {
        self.totals().calls
    }

    pub fn total_errors(&self) -> u64 {
        self.totals().errors
    }

    /// One line for `INFO`: totals, then the five busiest commands.
    pub fn summary(&self) -> String {
        let totals = self.totals();
        let busiest = self
            .by_command()
            .into_iter()
            .take(5)
            .map(|(name, stats)| format!("{name}={}", stats.calls))
            .collect::<Vec<_>>()
            .join(" ");
        format!(
            "calls={} errors={} latency_us(avg={:.1} min={} max={}) top[{}]",
            totals.calls,
            totals.errors,
            totals.avg_us(),
            totals.min_us,
            totals.max_us,
            busiest
        )
    }
}
