use std::collections::BTreeMap;
use std::time::Instant;

/// Observer for frame-loop events.
///
/// Lets the CLI print throughput and stage costs without the session loop
/// knowing where the numbers end up.
pub trait SessionLogger {
    /// Called once per processed frame. `total` is `None` for live sources.
    fn frame_done(&mut self, index: usize, total: Option<usize>);

    /// Records how long a named stage (`select`, `present`, ...) took.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Records a point-in-time value such as the steering rate.
    fn metric(&mut self, name: &str, value: f64);

    fn info(&mut self, message: &str);

    /// Emits an end-of-session report. Default: no-op.
    fn summary(&self) {}
}

/// Discards everything. Used by tests and embedders with their own reporting.
pub struct NullSessionLogger;

impl SessionLogger for NullSessionLogger {
    fn frame_done(&mut self, _index: usize, _total: Option<usize>) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Count, mean and peak of a stream of samples.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunningStat {
    pub count: usize,
    sum: f64,
    pub max: f64,
}

impl RunningStat {
    fn push(&mut self, value: f64) {
        self.max = if self.count == 0 { value } else { self.max.max(value) };
        self.count += 1;
        self.sum += value;
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

/// Logs a heartbeat every `every_frames` frames through `log` and keeps
/// running statistics per stage and metric for the closing summary.
pub struct StdoutSessionLogger {
    every_frames: usize,
    timings: BTreeMap<String, RunningStat>,
    metrics: BTreeMap<String, RunningStat>,
    started: Instant,
    frames: usize,
}

impl StdoutSessionLogger {
    pub fn new(every_frames: usize) -> Self {
        Self {
            every_frames: every_frames.max(1),
            timings: BTreeMap::new(),
            metrics: BTreeMap::new(),
            started: Instant::now(),
            frames: 0,
        }
    }

    /// Formatted report, or `None` if no frame was processed.
    pub fn summary_string(&self) -> Option<String> {
        if self.frames == 0 {
            return None;
        }
        let elapsed = self.started.elapsed().as_secs_f64();

        let header = format!("Session summary ({} frames, {elapsed:.1}s):", self.frames);
        let stages = self.timings.iter().map(|(stage, s)| {
            format!("  {stage:10}: avg {:6.1}ms  max {:6.1}ms", s.mean(), s.max)
        });
        let metrics = self
            .metrics
            .iter()
            .map(|(name, s)| format!("  {name}: avg {:.3}  max {:.3}", s.mean(), s.max));
        let throughput = (elapsed > 0.0)
            .then(|| format!("  Throughput: {:.1} fps", self.frames as f64 / elapsed));

        let lines: Vec<String> = std::iter::once(header)
            .chain(stages)
            .chain(metrics)
            .chain(throughput)
            .collect();
        Some(lines.join("\n"))
    }

    pub fn timing_stat(&self, stage: &str) -> Option<RunningStat> {
        self.timings.get(stage).copied()
    }

    pub fn metric_stat(&self, name: &str) -> Option<RunningStat> {
        self.metrics.get(name).copied()
    }
}

impl Default for StdoutSessionLogger {
    fn default() -> Self {
        Self::new(100)
    }
}

impl SessionLogger for StdoutSessionLogger {
    fn frame_done(&mut self, index: usize, total: Option<usize>) {
        self.frames += 1;
        let shown = index + 1;
        if shown % self.every_frames == 0 {
            match total.filter(|&t| t > 0) {
                Some(total) => log::info!("Frame {shown}/{total}"),
                None => log::info!("Frame {shown}"),
            }
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings.entry(stage.to_owned()).or_default().push(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics.entry(name.to_owned()).or_default().push(value);
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(report) = self.summary_string() {
            log::info!("\n\n{report}");
        }
    }
}
