//! Progress events and issue recording for a conversion run.

use cc_model::{ConversionSummary, IssueKind};

/// Progress value that tells a listener the run failed.
pub const PROGRESS_FAILED: f64 = -1.0;

pub const PROGRESS_COMPLETE: f64 = 100.0;

/// Receives `(message, progress)` events.
///
/// `progress` is a percentage in `0..=100`, [`PROGRESS_FAILED`], or `None`
/// when the event only carries a message.
pub trait ProgressSink {
    fn report(&mut self, message: &str, progress: Option<f64>);
}

impl<F> ProgressSink for F
where
    F: FnMut(&str, Option<f64>),
{
    fn report(&mut self, message: &str, progress: Option<f64>) {
        self(message, progress);
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&mut self, _message: &str, _progress: Option<f64>) {}
}

/// Maps one cartridge's `0..=100` onto its slice of a session.
///
/// Failure values are not forwarded as failures: one cartridge failing
/// does not end the session, so only the message passes through.
pub struct ScaledSink<'a> {
    inner: &'a mut dyn ProgressSink,
    index: f64,
    count: f64,
}

impl<'a> ScaledSink<'a> {
    /// Slice `index` of `count` equal slices.
    pub fn new(inner: &'a mut dyn ProgressSink, index: usize, count: usize) -> Self {
        Self {
            inner,
            index: index as f64,
            count: count.max(1) as f64,
        }
    }

    pub fn start(&self) -> f64 {
        self.scale(0.0)
    }

    /// The end of slice `i` and the start of slice `i + 1` are the same
    /// expression, so they compare equal.
    fn scale(&self, value: f64) -> f64 {
        (self.index * PROGRESS_COMPLETE + value.clamp(0.0, PROGRESS_COMPLETE)) / self.count
    }
}

impl ProgressSink for ScaledSink<'_> {
    fn report(&mut self, message: &str, progress: Option<f64>) {
        let scaled = progress
            .filter(|value| *value >= 0.0)
            .map(|value| self.scale(value));
        self.inner.report(message, scaled);
    }
}

/// Percentage of convertible XML bytes rendered so far.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ByteProgress {
    total: u64,
    done: u64,
}

impl ByteProgress {
    pub(crate) fn new(total: u64) -> Self {
        Self { total, done: 0 }
    }

    pub(crate) fn total(&self) -> u64 {
        self.total
    }

    /// Credit `bytes` and return the new percentage, capped at 100.
    /// With nothing to convert the percentage is a constant 100.
    pub(crate) fn credit(&mut self, bytes: u64) -> f64 {
        self.done = self.done.saturating_add(bytes);
        if self.total == 0 {
            return PROGRESS_COMPLETE;
        }
        (self.done as f64 / self.total as f64 * PROGRESS_COMPLETE).min(PROGRESS_COMPLETE)
    }
}

/// Records issues into the run's summary and forwards progress events.
///
/// Every recorded issue is also emitted as a `tracing` event.
pub struct Reporter<'a> {
    summary: ConversionSummary,
    sink: &'a mut dyn ProgressSink,
}

impl<'a> Reporter<'a> {
    pub fn new(sink: &'a mut dyn ProgressSink) -> Self {
        Self {
            summary: ConversionSummary::new(),
            sink,
        }
    }

    pub fn error(&mut self, kind: IssueKind, message: impl Into<String>, file_path: Option<&str>) {
        let message = message.into();
        tracing::error!(kind = %kind, file = file_path, "{message}");
        self.summary.error(kind, message, file_path);
    }

    pub fn warning(
        &mut self,
        kind: IssueKind,
        message: impl Into<String>,
        file_path: Option<&str>,
    ) {
        let message = message.into();
        tracing::warn!(kind = %kind, file = file_path, "{message}");
        self.summary.warning(kind, message, file_path);
    }

    pub fn progress(&mut self, message: &str, progress: Option<f64>) {
        tracing::info!(progress, "{message}");
        self.sink.report(message, progress);
    }

    pub fn summary(&self) -> &ConversionSummary {
        &self.summary
    }

    /// For stages that record into a summary directly.
    pub fn summary_mut(&mut self) -> &mut ConversionSummary {
        &mut self.summary
    }

    pub fn into_summary(self) -> ConversionSummary {
        self.summary
    }
}
