//! Per-step progress reporting.

use std::io::Write;
use std::time::Instant;

/// Observer notified once per processed step of a segmentation scan.
///
/// Reporting is a pure side channel: implementors receive only the step
/// counter and wall-clock start, never the scan state, so a reporter cannot
/// alter the segmentation outcome.
pub trait ProgressReport {
    /// Called with the step just processed (1-based), the total number of
    /// steps, and the instant the scan started.
    fn report(&mut self, current: usize, total: usize, started: Instant);
}

/// Reporter that does nothing. Used by [`ThresholdSegmenter::segment`].
///
/// [`ThresholdSegmenter::segment`]: crate::ThresholdSegmenter::segment
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl ProgressReport for NoProgress {
    fn report(&mut self, _current: usize, _total: usize, _started: Instant) {}
}

/// Reporter that writes a percentage and ETA line to stderr.
#[derive(Clone, Debug)]
pub struct EtaProgress {
    every: usize,
}

impl EtaProgress {
    /// Report every `every` steps (and always on the final step).
    #[must_use]
    pub fn new(every: usize) -> Self {
        Self {
            every: every.max(1),
        }
    }
}

impl ProgressReport for EtaProgress {
    fn report(&mut self, current: usize, total: usize, started: Instant) {
        let last = current + 1 == total;
        if current % self.every != 0 && !last {
            return;
        }
        let elapsed = started.elapsed().as_secs_f64();
        let fraction = current as f64 / total as f64;
        let eta = if fraction > 0.0 {
            elapsed * (1.0 - fraction) / fraction
        } else {
            0.0
        };
        let mut err = std::io::stderr();
        let _ = write!(
            err,
            "\r{:>5.1}% ({current}/{total}) eta {eta:.0}s",
            fraction * 100.0
        );
        if last {
            let _ = writeln!(err);
        }
    }
}
