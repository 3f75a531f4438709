use std::collections::BTreeMap;
use std::time::Instant;

/// Observer for batch orchestration events.
///
/// Executors call it from the orchestrating thread only, so
/// implementations need no internal locking.
pub trait PipelineLogger: Send {
    /// `current` of `total` files are finished.
    fn progress(&mut self, current: usize, total: usize);

    /// Time one file spent in a named stage.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// A per-file measurement such as the number of faces found.
    fn metric(&mut self, name: &str, value: f64);

    fn info(&mut self, message: &str);

    /// End-of-batch report. Default: no-op.
    fn summary(&self) {}
}

/// Discards everything.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _current: usize, _total: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Running count / sum / min / max of one series.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stats {
    pub count: usize,
    pub sum: f64,
    pub min: f64,
    pub max: f64,
}

impl Stats {
    fn new(value: f64) -> Self {
        Self {
            count: 1,
            sum: value,
            min: value,
            max: value,
        }
    }

    fn add(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    pub fn mean(&self) -> f64 {
        self.sum / self.count as f64
    }
}

fn record(series: &mut BTreeMap<String, Stats>, name: &str, value: f64) {
    match series.get_mut(name) {
        Some(stats) => stats.add(value),
        None => {
            series.insert(name.to_string(), Stats::new(value));
        }
    }
}

/// Logs progress through `log::info!` every `every` files and prints a
/// per-stage breakdown at the end.
pub struct StdoutPipelineLogger {
    every: usize,
    started: Instant,
    total_files: usize,
    stages: BTreeMap<String, Stats>,
    metrics: BTreeMap<String, Stats>,
}

impl StdoutPipelineLogger {
    pub fn new(every: usize) -> Self {
        Self {
            every: every.max(1),
            started: Instant::now(),
            total_files: 0,
            stages: BTreeMap::new(),
            metrics: BTreeMap::new(),
        }
    }

    pub fn stage(&self, name: &str) -> Option<&Stats> {
        self.stages.get(name)
    }

    pub fn metric_stats(&self, name: &str) -> Option<&Stats> {
        self.metrics.get(name)
    }

    /// `None` until at least one timing or metric was recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.stages.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let secs = self.started.elapsed().as_secs_f64();
        let mut out = format!("Batch summary ({} files in {secs:.1}s)", self.total_files);
        for (name, s) in &self.stages {
            out.push_str(&format!(
                "\n  {name:8} avg {:7.1}ms  min {:7.1}ms  max {:7.1}ms",
                s.mean(),
                s.min,
                s.max
            ));
        }
        for (name, s) in &self.metrics {
            out.push_str(&format!(
                "\n  {name:8} total {:.0}  avg {:.2}  max {:.0}",
                s.sum,
                s.mean(),
                s.max
            ));
        }
        if self.total_files > 0 && secs > 0.0 {
            out.push_str(&format!(
                "\n  {:.2} files/s",
                self.total_files as f64 / secs
            ));
        }
        Some(out)
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new(1)
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn progress(&mut self, current: usize, total: usize) {
        self.total_files = total;
        if current == total || current % self.every == 0 {
            log::info!("[{current}/{total}] files done");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        record(&mut self.stages, stage, duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        record(&mut self.metrics, name, value);
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("{text}");
        }
    }
}
