//! General Utilities

use crate::Segmentation;
use std::fs::File;
use std::io::{self, prelude::*};

/// Writes the feature series, the per-step columns, and the boundary list
/// to `{prefix}_features.txt`, `{prefix}_columns.txt`, and
/// `{prefix}_boundaries.txt`, respectively.
///
/// # Errors
/// If data cannot be written to disk, an error is returned.
pub fn write_segmentation(
    prefix: &str,
    features: &[f64],
    segmentation: &Segmentation,
) -> io::Result<()> {
    // Write the feature series
    let features_path = format!("{prefix}_features.txt");
    let mut features_f = File::create(features_path)?;
    features
        .iter()
        .try_for_each(|x| writeln!(features_f, "{x}"))?;

    // Write the aligned per-step columns
    let columns_path = format!("{prefix}_columns.txt");
    let mut columns_f = File::create(columns_path)?;
    writeln!(columns_f, "theta,abs_theta,threshold,group")?;
    for (i, (((theta, abs_theta), threshold), group)) in segmentation
        .theta
        .iter()
        .zip(&segmentation.abs_theta)
        .zip(&segmentation.thresholds)
        .zip(&segmentation.group_ids)
        .enumerate()
    {
        if !theta.is_finite() || !threshold.is_finite() {
            eprintln!("NaN/Infinite value in output: Row {i}");
        }
        writeln!(columns_f, "{theta},{abs_theta},{threshold},{group}")?;
    }

    // Write the boundary indices
    let boundaries_path = format!("{prefix}_boundaries.txt");
    let mut boundaries_f = File::create(boundaries_path)?;
    segmentation
        .boundaries
        .iter()
        .try_for_each(|b| writeln!(boundaries_f, "{b}"))?;

    Ok(())
}
