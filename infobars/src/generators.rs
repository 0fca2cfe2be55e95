//! Functions to generate signed-flow test sequences
use rand::Rng;
use rv::dist::Gaussian;
use rv::traits::Rv;

/// Draw a Gaussian signed-flow sequence of the given size.
pub fn gaussian_flow<R: Rng>(
    rng: &mut R,
    mu: f64,
    sigma: f64,
    size: usize,
) -> Vec<f64> {
    let flow = Gaussian::new(mu, sigma).expect("Arguments should be valid");
    flow.sample(size, rng)
}

/// A sequence holding one value throughout.
pub fn constant_flow(value: f64, size: usize) -> Vec<f64> {
    vec![value; size]
}

/// A sequence alternating between `magnitude` and `-magnitude`.
pub fn alternating_flow(magnitude: f64, size: usize) -> Vec<f64> {
    (0..size)
        .map(|i| if i % 2 == 0 { magnitude } else { -magnitude })
        .collect()
}
