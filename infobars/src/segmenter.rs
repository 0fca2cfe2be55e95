//! Online information-driven bar segmentation.
//!
//! This code implements the adaptive-threshold sampling scheme described in
//! "Advances in Financial Machine Learning"; Marcos López de Prado; Wiley,
//! 2018 (chapter 2, information-driven bars): a bar closes whenever the
//! accumulated signed flow exceeds an expectation-derived threshold, and
//! both expectations are re-estimated from the bars observed so far.

use crate::progress::{NoProgress, ProgressReport};
use crate::smoothing::{self, Ewma};
use crate::Error;
use ndarray::Array1;
use std::time::Instant;

#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

/// How the expectation estimates are refreshed at each bar boundary.
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EstimatorMode {
    /// Re-run the smoothing pass over the full history at every boundary.
    ///
    /// This reproduces the reference numerics exactly at O(n·b) cost for n
    /// steps and b boundaries, which approaches O(n²) when boundaries are
    /// frequent.
    #[default]
    Recompute,
    /// Maintain the estimates incrementally at O(1) amortized cost per
    /// boundary.
    ///
    /// The expected-bar-magnitude estimate is bit-identical to
    /// [`EstimatorMode::Recompute`]; the expected-tick-count estimate is a
    /// recursive update under the span in effect at each boundary, which
    /// differs from re-running the batch average with a new span over the
    /// whole history. Opt in only where that numeric difference is
    /// acceptable.
    Streaming,
}

/// Segmentation of a feature stream into information-driven bars.
///
/// The four array columns are aligned to the input; `time_deltas` and
/// `boundaries` carry one entry per closed bar.
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Segmentation {
    /// Step count of each closed bar, `boundaries[k] - boundaries[k-1]`
    /// (or the boundary index itself for the first bar).
    pub time_deltas: Vec<f64>,
    /// |cumulative statistic| at each step.
    pub abs_theta: Array1<f64>,
    /// Threshold in effect when each step was evaluated. Index 0 is never
    /// evaluated and keeps its zero default.
    pub thresholds: Array1<f64>,
    /// Indices at which a bar boundary was declared.
    pub boundaries: Vec<usize>,
    /// Signed cumulative statistic at each step.
    pub theta: Array1<f64>,
    /// Bar identifier active at each step; non-decreasing, stepping by one
    /// at the index after each boundary.
    pub group_ids: Array1<usize>,
}

impl Segmentation {
    /// Number of closed bars.
    #[must_use]
    pub fn bar_count(&self) -> usize {
        self.boundaries.len()
    }
}

/// State threaded through one scan. Owned by a single invocation; nothing
/// here survives the call or is shared across calls.
#[derive(Clone, Debug)]
struct RunningState {
    /// Signed cumulative statistic since the last boundary.
    theta: f64,
    group_id: usize,
    previous_boundary: usize,
    expected_ticks: f64,
    expected_bar_value: f64,
    /// Streaming-mode accumulator over bar lengths.
    delta_average: Option<f64>,
    /// Streaming-mode accumulator over the raw feature stream.
    flow_average: Option<Ewma<f64>>,
}

/// Adaptive-threshold segmenter for ordered signed-flow sequences.
///
/// # Example
/// ```rust
/// use infobars::ThresholdSegmenter;
///
/// let flow = [1.0, -0.5, 2.0, 1.5, -3.0, 0.25];
/// let segmentation = ThresholdSegmenter::new(2, 1.0)
///     .segment(&flow)
///     .unwrap();
///
/// assert_eq!(segmentation.theta.len(), flow.len());
/// assert!(!segmentation.boundaries.is_empty());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct ThresholdSegmenter {
    initial_expected_ticks: usize,
    initial_bar_size: f64,
    mode: EstimatorMode,
}

impl ThresholdSegmenter {
    /// Create a segmenter from the two seed expectations.
    ///
    /// # Parameters
    /// * `initial_expected_ticks` - Expected number of steps per bar before
    /// any bar has been observed. Also fixes the smoothing span used for
    /// every bar-magnitude re-estimate.
    /// * `initial_bar_size` - Expected per-step flow magnitude before any
    /// bar has been observed. The first evaluated threshold is
    /// `initial_expected_ticks * initial_bar_size`.
    #[must_use]
    pub fn new(initial_expected_ticks: usize, initial_bar_size: f64) -> Self {
        Self {
            initial_expected_ticks,
            initial_bar_size,
            mode: EstimatorMode::default(),
        }
    }

    /// Select how the expectations are refreshed at each boundary.
    #[must_use]
    pub fn with_mode(self, mode: EstimatorMode) -> Self {
        Self { mode, ..self }
    }

    /// Segment a feature stream into bars.
    ///
    /// # Errors
    /// `InvalidInput` if `features` is empty, the seed tick count is zero,
    /// or the seed bar size is non-positive or non-finite; `NonFiniteValue`
    /// if an estimate update consumes a NaN or infinite value. On error no
    /// partial output is returned.
    pub fn segment(&self, features: &[f64]) -> Result<Segmentation, Error> {
        self.segment_with_progress(features, &mut NoProgress)
    }

    /// Segment a feature stream, notifying `progress` once per evaluated
    /// step.
    ///
    /// The reporter is purely observational and cannot change the result.
    ///
    /// # Errors
    /// Same conditions as [`ThresholdSegmenter::segment`].
    pub fn segment_with_progress<P: ProgressReport>(
        &self,
        features: &[f64],
        progress: &mut P,
    ) -> Result<Segmentation, Error> {
        if features.is_empty() {
            return Err(Error::InvalidInput("feature series is empty".into()));
        }
        if self.initial_expected_ticks == 0 {
            return Err(Error::InvalidInput(
                "initial expected tick count must be positive".into(),
            ));
        }
        if !self.initial_bar_size.is_finite() || self.initial_bar_size <= 0.0 {
            return Err(Error::InvalidInput(
                "initial bar size must be positive and finite".into(),
            ));
        }

        let total = features.len();
        let mut abs_theta = Array1::<f64>::zeros(total);
        let mut thresholds = Array1::<f64>::zeros(total);
        let mut theta = Array1::<f64>::zeros(total);
        let mut group_ids = Array1::<usize>::zeros(total);
        let mut time_deltas: Vec<f64> = Vec::new();
        let mut boundaries: Vec<usize> = Vec::new();

        let mut state = RunningState {
            theta: features[0],
            group_id: 0,
            previous_boundary: 0,
            expected_ticks: self.initial_expected_ticks as f64,
            expected_bar_value: self.initial_bar_size,
            delta_average: None,
            flow_average: match self.mode {
                EstimatorMode::Recompute => None,
                EstimatorMode::Streaming => {
                    let mut average = Ewma::new(self.initial_expected_ticks)?;
                    average.update(features[0])?;
                    Some(average)
                }
            },
        };
        theta[0] = state.theta;
        abs_theta[0] = state.theta.abs();
        // thresholds[0] and group_ids[0] keep their zero defaults: there is
        // no prior bar to estimate a threshold from.

        let started = Instant::now();
        for (i, &x) in features.iter().enumerate().skip(1) {
            state.theta += x;
            theta[i] = state.theta;
            let magnitude = state.theta.abs();
            abs_theta[i] = magnitude;

            // Both expectations are held fixed since the last boundary.
            let threshold = state.expected_ticks * state.expected_bar_value;
            thresholds[i] = threshold;
            group_ids[i] = state.group_id;

            if magnitude >= threshold {
                state.group_id += 1;
                // The value that closed the bar is not carried forward.
                state.theta = 0.0;
                time_deltas.push((i - state.previous_boundary) as f64);
                boundaries.push(i);
                state.previous_boundary = i;
                self.reestimate(features, i, &time_deltas, &mut state)?;
            }

            // Fold the step into the streaming flow average only after the
            // boundary check, so a boundary at i sees the prefix [0, i).
            if let Some(average) = state.flow_average.as_mut() {
                average.update(x)?;
            }

            progress.report(i, total, started);
        }

        Ok(Segmentation {
            time_deltas,
            abs_theta,
            thresholds,
            boundaries,
            theta,
            group_ids,
        })
    }

    fn reestimate(
        &self,
        features: &[f64],
        boundary: usize,
        time_deltas: &[f64],
        state: &mut RunningState,
    ) -> Result<(), Error> {
        match self.mode {
            EstimatorMode::Recompute => {
                // Span over bar lengths grows with the number of bars seen;
                // span over the raw flow stays at the seed tick count.
                state.expected_ticks =
                    smoothing::ewma_last(time_deltas, time_deltas.len())?;
                state.expected_bar_value = smoothing::ewma_last(
                    &features[..boundary],
                    self.initial_expected_ticks,
                )?
                .abs();
            }
            EstimatorMode::Streaming => {
                let span = time_deltas.len();
                let alpha = 2.0 / (span as f64 + 1.0);
                let delta = time_deltas[span - 1];
                let updated = match state.delta_average {
                    None => delta,
                    Some(previous) => alpha * delta + (1.0 - alpha) * previous,
                };
                state.delta_average = Some(updated);
                state.expected_ticks = updated;
                state.expected_bar_value = state
                    .flow_average
                    .as_ref()
                    .and_then(Ewma::value)
                    .expect("flow average is seeded before the scan")
                    .abs();
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators;
    use rand::{rngs::SmallRng, SeedableRng};

    #[test]
    fn constant_flow_trace() {
        // Unit flow with seed expectations 2 ticks of size 1.0: the first
        // evaluated threshold is 2.0 and both estimates collapse to 1.0
        // after the first bar, closing a bar at every later step.
        let flow = generators::constant_flow(1.0, 6);
        let segmentation =
            ThresholdSegmenter::new(2, 1.0).segment(&flow).unwrap();

        assert_eq!(
            segmentation.thresholds.to_vec(),
            vec![0.0, 2.0, 1.0, 1.0, 1.0, 1.0]
        );
        assert_eq!(segmentation.boundaries, vec![1, 2, 3, 4, 5]);
        assert_eq!(segmentation.time_deltas, vec![1.0; 5]);
        assert_eq!(segmentation.group_ids.to_vec(), vec![0, 0, 1, 2, 3, 4]);
        assert_eq!(
            segmentation.theta.to_vec(),
            vec![1.0, 2.0, 1.0, 1.0, 1.0, 1.0]
        );
        assert_eq!(segmentation.bar_count(), 5);
    }

    #[test]
    fn single_step_input_closes_no_bar() {
        let segmentation =
            ThresholdSegmenter::new(3, 2.0).segment(&[5.0]).unwrap();

        assert_eq!(segmentation.theta.to_vec(), vec![5.0]);
        assert_eq!(segmentation.abs_theta.to_vec(), vec![5.0]);
        assert_eq!(segmentation.thresholds.to_vec(), vec![0.0]);
        assert_eq!(segmentation.group_ids.to_vec(), vec![0]);
        assert!(segmentation.time_deltas.is_empty());
        assert!(segmentation.boundaries.is_empty());
    }

    #[test]
    fn zero_flow_never_crosses_a_positive_threshold() {
        let flow = generators::constant_flow(0.0, 10);
        let segmentation =
            ThresholdSegmenter::new(4, 0.5).segment(&flow).unwrap();

        assert!(segmentation.boundaries.is_empty());
        assert!(segmentation.abs_theta.iter().all(|&a| a == 0.0));
        assert!(segmentation.group_ids.iter().all(|&g| g == 0));
        // The seed expectations never update past their initial values.
        assert!(segmentation
            .thresholds
            .iter()
            .skip(1)
            .all(|&t| (t - 2.0).abs() < f64::EPSILON));
    }

    #[test]
    fn alternating_flow_cancels_and_never_closes() {
        // Signed accumulation continues across the open bar, so a
        // perfectly balanced flow keeps |theta| at or below one step's
        // magnitude and never reaches the threshold.
        let flow = generators::alternating_flow(1.0, 20);
        let segmentation =
            ThresholdSegmenter::new(3, 1.0).segment(&flow).unwrap();

        assert!(segmentation.boundaries.is_empty());
        assert!(segmentation.abs_theta.iter().all(|&a| a <= 1.0));
    }

    #[test]
    fn invalid_inputs_are_rejected() {
        let segmenter = ThresholdSegmenter::new(2, 1.0);
        assert!(matches!(
            segmenter.segment(&[]),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            ThresholdSegmenter::new(0, 1.0).segment(&[1.0, 2.0]),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            ThresholdSegmenter::new(2, 0.0).segment(&[1.0, 2.0]),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            ThresholdSegmenter::new(2, -1.5).segment(&[1.0, 2.0]),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            ThresholdSegmenter::new(2, f64::NAN).segment(&[1.0, 2.0]),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn boundary_bookkeeping_is_consistent() {
        let mut rng = SmallRng::seed_from_u64(0xABCD);
        let flow = generators::gaussian_flow(&mut rng, 0.0, 1.0, 500);
        let segmentation =
            ThresholdSegmenter::new(10, 0.1).segment(&flow).unwrap();
        let n = flow.len();

        assert!(!segmentation.boundaries.is_empty());
        assert_eq!(
            segmentation.time_deltas.len(),
            segmentation.boundaries.len()
        );

        // TimeDeltas are the first differences of the boundary indices.
        let mut previous = 0;
        for (delta, &boundary) in segmentation
            .time_deltas
            .iter()
            .zip(&segmentation.boundaries)
        {
            assert_eq!(*delta, (boundary - previous) as f64);
            previous = boundary;
        }
        let delta_sum: f64 = segmentation.time_deltas.iter().sum();
        assert_eq!(
            delta_sum,
            *segmentation.boundaries.last().unwrap() as f64
        );

        // A bar closes exactly where the statistic met the threshold.
        for i in 1..n {
            let crossed =
                segmentation.abs_theta[i] >= segmentation.thresholds[i];
            assert_eq!(crossed, segmentation.boundaries.contains(&i));
            assert!(segmentation.thresholds[i] >= 0.0);
        }

        // Group ids are non-decreasing and step by one after a boundary.
        for i in 1..n {
            let step = segmentation.group_ids[i] - segmentation.group_ids[i - 1];
            let after_boundary = segmentation.boundaries.contains(&(i - 1));
            assert_eq!(step, usize::from(after_boundary));
        }
        let closed_before_end = segmentation.time_deltas.len()
            - usize::from(segmentation.boundaries.last() == Some(&(n - 1)));
        assert_eq!(segmentation.group_ids[n - 1], closed_before_end);
    }

    #[test]
    fn identical_inputs_give_identical_outputs() {
        let mut rng = SmallRng::seed_from_u64(0x5EED);
        let flow = generators::gaussian_flow(&mut rng, 0.0, 2.0, 300);
        let segmenter = ThresholdSegmenter::new(5, 0.5);

        let first = segmenter.segment(&flow).unwrap();
        let second = segmenter.segment(&flow).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn streaming_matches_recompute_on_constant_flow() {
        let flow = generators::constant_flow(1.0, 6);
        let recomputed =
            ThresholdSegmenter::new(2, 1.0).segment(&flow).unwrap();
        let streamed = ThresholdSegmenter::new(2, 1.0)
            .with_mode(EstimatorMode::Streaming)
            .segment(&flow)
            .unwrap();
        assert_eq!(recomputed, streamed);
    }

    #[test]
    fn streaming_mode_holds_the_segmentation_invariants() {
        let mut rng = SmallRng::seed_from_u64(0xFEED);
        let flow = generators::gaussian_flow(&mut rng, 0.0, 1.0, 400);
        let segmentation = ThresholdSegmenter::new(8, 0.2)
            .with_mode(EstimatorMode::Streaming)
            .segment(&flow)
            .unwrap();

        assert!(!segmentation.boundaries.is_empty());
        for i in 1..flow.len() {
            assert!(
                segmentation.group_ids[i] >= segmentation.group_ids[i - 1]
            );
            assert!(segmentation.thresholds[i] >= 0.0);
        }
    }

    #[test]
    fn nan_poisons_the_statistic_without_failing_recompute_mode() {
        // A NaN makes every later accumulation NaN, so no boundary (and no
        // smoothing window containing the NaN) can occur after it; the scan
        // completes with NaN columns, matching the reference numerics.
        let flow = [1.0, 0.5, f64::NAN, 5.0];
        let segmentation =
            ThresholdSegmenter::new(3, 10.0).segment(&flow).unwrap();

        assert!(segmentation.boundaries.is_empty());
        assert!(segmentation.abs_theta[2].is_nan());
        assert!(segmentation.abs_theta[3].is_nan());
    }

    #[test]
    fn nan_fails_fast_in_streaming_mode() {
        let flow = [1.0, 0.5, f64::NAN, 5.0];
        let result = ThresholdSegmenter::new(3, 10.0)
            .with_mode(EstimatorMode::Streaming)
            .segment(&flow);
        assert_eq!(result, Err(Error::NonFiniteValue { index: 2 }));
    }

    #[cfg(feature = "serde1")]
    #[test]
    fn segmentation_round_trips_through_serde() {
        let flow = generators::constant_flow(1.0, 6);
        let segmentation =
            ThresholdSegmenter::new(2, 1.0).segment(&flow).unwrap();
        let serialized = serde_json::to_string(&segmentation).unwrap();
        let deserialized: Segmentation =
            serde_json::from_str(&serialized).unwrap();
        assert_eq!(segmentation, deserialized);
    }
}
