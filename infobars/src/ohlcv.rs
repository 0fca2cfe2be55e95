//! OHLCV reduction over segmented tick streams.
//!
//! Consumes the `group_ids` column produced by the segmenter together with
//! the parallel price/size columns of the same tick stream, and reduces
//! each bar to its open/high/low/close summary.

use crate::Error;

#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

/// Borrowed view of the tick columns running parallel to a feature stream.
#[derive(Clone, Copy, Debug)]
pub struct TickColumns<'a> {
    /// Trade price per tick.
    pub prices: &'a [f64],
    /// Trade size per tick.
    pub sizes: &'a [f64],
}

/// Summary of one bar of ticks.
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct OhlcvBar {
    /// Identifier of the bar, as assigned by the segmenter.
    pub group: usize,
    /// First price in the bar.
    pub open: f64,
    /// Highest price in the bar.
    pub high: f64,
    /// Lowest price in the bar.
    pub low: f64,
    /// Last price in the bar.
    pub close: f64,
    /// Sum of sizes.
    pub volume: f64,
    /// Size-weighted average price.
    pub vwap: f64,
    /// Arithmetic mean price.
    pub price_mean: f64,
    /// Number of ticks in the bar.
    pub tick_count: usize,
    /// `ln(price_mean) - ln(previous bar's price_mean)`; `None` for the
    /// first bar.
    pub price_mean_log_return: Option<f64>,
}

/// Reduce a segmented tick stream to one [`OhlcvBar`] per group.
///
/// Groups are the maximal runs of equal values in `group_ids`; the
/// segmenter guarantees these are non-decreasing, so each id appears in
/// exactly one run.
///
/// # Errors
/// `InvalidInput` if the columns differ in length; `NonFiniteValue` at the
/// first NaN or infinite price or size.
pub fn ohlcv_bars(
    group_ids: &[usize],
    ticks: TickColumns,
) -> Result<Vec<OhlcvBar>, Error> {
    if group_ids.len() != ticks.prices.len()
        || group_ids.len() != ticks.sizes.len()
    {
        return Err(Error::InvalidInput(format!(
            "column lengths differ: {} group ids, {} prices, {} sizes",
            group_ids.len(),
            ticks.prices.len(),
            ticks.sizes.len()
        )));
    }
    if let Some(index) = ticks
        .prices
        .iter()
        .zip(ticks.sizes)
        .position(|(p, s)| !p.is_finite() || !s.is_finite())
    {
        return Err(Error::NonFiniteValue { index });
    }

    let mut bars: Vec<OhlcvBar> = Vec::new();
    let mut previous_mean: Option<f64> = None;
    let mut start = 0;

    while start < group_ids.len() {
        let group = group_ids[start];
        let end = start
            + group_ids[start..]
                .iter()
                .position(|&g| g != group)
                .unwrap_or(group_ids.len() - start);

        let prices = &ticks.prices[start..end];
        let sizes = &ticks.sizes[start..end];

        let volume: f64 = sizes.iter().sum();
        let traded: f64 =
            prices.iter().zip(sizes).map(|(p, s)| p * s).sum();
        let price_mean =
            prices.iter().sum::<f64>() / prices.len() as f64;

        bars.push(OhlcvBar {
            group,
            open: prices[0],
            high: prices.iter().copied().fold(f64::MIN, f64::max),
            low: prices.iter().copied().fold(f64::MAX, f64::min),
            close: prices[prices.len() - 1],
            volume,
            vwap: traded / volume,
            price_mean,
            tick_count: prices.len(),
            price_mean_log_return: previous_mean
                .map(|m| price_mean.ln() - m.ln()),
        });

        previous_mean = Some(price_mean);
        start = end;
    }

    Ok(bars)
}
