//! Exponentially weighted moving averages.
//!
//! The segmenter re-estimates its expectations with the recursive form
//! \[
//!     y_0 = x_0, \quad y_i = \alpha x_i + (1 - \alpha) y_{i-1}
//! \] where $\alpha = 2 / (span + 1)$. A larger span means slower decay.

use crate::Error;
use num_traits::Float;

fn decay<F: Float>(span: usize) -> Result<F, Error> {
    if span == 0 {
        return Err(Error::InvalidInput(
            "smoothing span must be positive".into(),
        ));
    }
    let alpha = 2.0 / (span as f64 + 1.0);
    F::from(alpha).ok_or_else(|| {
        Error::InvalidInput(format!("span {span} not representable"))
    })
}

/// Smooth a sequence, returning one output per input.
///
/// # Errors
/// `InvalidInput` if the sequence is empty or `span` is zero;
/// `NonFiniteValue` at the first NaN or infinite input.
///
/// # Example
/// ```rust
/// use infobars::smoothing::ewma;
///
/// let smoothed = ewma(&[1.0_f64, 2.0, 3.0], 2).unwrap();
/// assert_eq!(smoothed[0], 1.0);
/// assert!((smoothed[1] - 5.0 / 3.0).abs() < 1e-12);
/// ```
pub fn ewma<F: Float>(xs: &[F], span: usize) -> Result<Vec<F>, Error> {
    let alpha = decay::<F>(span)?;
    if xs.is_empty() {
        return Err(Error::InvalidInput("cannot smooth an empty sequence".into()));
    }
    if let Some(index) = xs.iter().position(|x| !x.is_finite()) {
        return Err(Error::NonFiniteValue { index });
    }

    let mut out = Vec::with_capacity(xs.len());
    let mut current = xs[0];
    out.push(current);
    for &x in &xs[1..] {
        current = alpha * x + (F::one() - alpha) * current;
        out.push(current);
    }
    Ok(out)
}

/// Smooth a sequence and return only the final value.
///
/// This is the only value the segmenter consumes from each smoothing pass.
///
/// # Errors
/// Same conditions as [`ewma`].
pub fn ewma_last<F: Float>(xs: &[F], span: usize) -> Result<F, Error> {
    let alpha = decay::<F>(span)?;
    let (&first, rest) = xs.split_first().ok_or_else(|| {
        Error::InvalidInput("cannot smooth an empty sequence".into())
    })?;
    if !first.is_finite() {
        return Err(Error::NonFiniteValue { index: 0 });
    }
    rest.iter().enumerate().try_fold(first, |acc, (i, &x)| {
        if x.is_finite() {
            Ok(alpha * x + (F::one() - alpha) * acc)
        } else {
            Err(Error::NonFiniteValue { index: i + 1 })
        }
    })
}

/// Incremental fixed-span exponential average.
///
/// Feeding values one at a time reproduces the batch [`ewma`] output
/// exactly, element for element, which is what lets the streaming
/// estimator mode match the recompute mode on fixed-span estimates.
#[derive(Clone, Debug, PartialEq)]
pub struct Ewma<F: Float> {
    alpha: F,
    current: Option<F>,
    count: usize,
}

impl<F: Float> Ewma<F> {
    /// Create an accumulator with the given smoothing span.
    ///
    /// # Errors
    /// `InvalidInput` if `span` is zero.
    pub fn new(span: usize) -> Result<Self, Error> {
        Ok(Self {
            alpha: decay(span)?,
            current: None,
            count: 0,
        })
    }

    /// Fold one value into the average and return the updated value.
    ///
    /// # Errors
    /// `NonFiniteValue` if `x` is NaN or infinite; the accumulator is left
    /// unchanged.
    pub fn update(&mut self, x: F) -> Result<F, Error> {
        if !x.is_finite() {
            return Err(Error::NonFiniteValue { index: self.count });
        }
        let next = match self.current {
            None => x,
            Some(current) => {
                self.alpha * x + (F::one() - self.alpha) * current
            }
        };
        self.current = Some(next);
        self.count += 1;
        Ok(next)
    }

    /// The current average, or `None` before the first update.
    pub fn value(&self) -> Option<F> {
        self.current
    }
}
