//! Segment a synthetic signed tick-flow stream into information-driven
//! bars and reduce the same ticks to OHLCV summaries.

use infobars::{ohlcv_bars, utils, EtaProgress, ThresholdSegmenter, TickColumns};
use rand::{rngs::SmallRng, Rng, SeedableRng};
use rv::prelude::*;

fn main() -> Result<(), Box<dyn std::error::Error + 'static>> {
    let mut rng = SmallRng::seed_from_u64(0xABCD);

    // Generate a flow sequence with a calm and a volatile regime
    println!("Generating sequence");
    let calm = Gaussian::new_unchecked(0.0, 1.0);
    let volatile = Gaussian::new_unchecked(0.0, 5.0);
    let mut flow: Vec<f64> = calm.sample(5_000, &mut rng);
    flow.extend::<Vec<f64>>(volatile.sample(5_000, &mut rng));

    // Walk a price along the flow and draw sizes uniformly
    let mut price = 100.0;
    let prices: Vec<f64> = flow
        .iter()
        .map(|x| {
            price += 0.01 * x;
            price
        })
        .collect();
    let sizes: Vec<f64> = (0..flow.len())
        .map(|_| rng.gen_range(1.0..10.0))
        .collect();

    println!("Segmenting");
    let segmenter = ThresholdSegmenter::new(100, 0.8);
    let segmentation =
        segmenter.segment_with_progress(&flow, &mut EtaProgress::new(500))?;
    println!(
        "{} bars over {} ticks",
        segmentation.bar_count(),
        flow.len()
    );

    println!("Reducing to OHLCV");
    let bars = ohlcv_bars(
        segmentation
            .group_ids
            .as_slice()
            .expect("segmentation columns are contiguous"),
        TickColumns {
            prices: &prices,
            sizes: &sizes,
        },
    )?;
    for bar in bars.iter().take(5) {
        println!(
            "bar {}: {} ticks, close {:.2}, vwap {:.2}",
            bar.group, bar.tick_count, bar.close, bar.vwap
        );
    }

    utils::write_segmentation("./tick_flow", &flow, &segmentation)?;

    Ok(())
}
