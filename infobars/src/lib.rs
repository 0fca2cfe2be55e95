//! This library provides information-driven bar construction tools such as
//!  * Adaptive-threshold stream segmentation as `ThresholdSegmenter`
//!  * OHLCV reduction over the resulting bars as `ohlcv_bars`
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]

#[cfg(test)]
pub mod generators;

mod error;
pub use error::*;

mod segmenter;
pub use segmenter::*;

mod progress;
pub use self::progress::*;

pub mod smoothing;
pub use smoothing::Ewma;

mod ohlcv;
pub use ohlcv::*;

pub mod utils;
