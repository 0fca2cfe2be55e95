use criterion::*;
use infobars::{EstimatorMode, ThresholdSegmenter};
use rand::{rngs::SmallRng, SeedableRng};
use rv::prelude::*;

fn bench_segmenter(c: &mut Criterion) {
    let mut rng = SmallRng::seed_from_u64(0xABCD);
    let flow_dist = Gaussian::new_unchecked(0.0, 1.0);
    let data: Vec<f64> = flow_dist.sample(50_000, &mut rng);

    let mut group = c.benchmark_group("ThresholdSegmenter");
    for nelems in [1_000_usize, 5_000, 10_000, 50_000] {
        let subdata: Vec<f64> = data.iter().take(nelems).copied().collect();

        group.throughput(Throughput::Elements(nelems as u64));
        group.bench_with_input(
            BenchmarkId::new("recompute", nelems),
            &subdata,
            |b, data| {
                b.iter(|| {
                    ThresholdSegmenter::new(50, 0.5)
                        .segment(data)
                        .unwrap()
                });
            },
        );
        group.bench_with_input(
            BenchmarkId::new("streaming", nelems),
            &subdata,
            |b, data| {
                b.iter(|| {
                    ThresholdSegmenter::new(50, 0.5)
                        .with_mode(EstimatorMode::Streaming)
                        .segment(data)
                        .unwrap()
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_segmenter);
criterion_main!(benches);
