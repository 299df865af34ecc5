use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use ridgeauth_core::{Descriptor, DescriptorSet, Keypoint};
use ridgeauth_match::match_sets;

/// Pseudo-random descriptor sets mimicking real extractor output.
fn synthetic_set(n: usize, mut seed: u32) -> DescriptorSet {
    let mut next = move || {
        seed ^= seed << 13;
        seed ^= seed >> 17;
        seed ^= seed << 5;
        seed
    };

    let descriptors: Vec<Descriptor> = (0..n)
        .map(|_| {
            let mut d = [0u8; 32];
            for byte in d.iter_mut() {
                *byte = next() as u8;
            }
            d
        })
        .collect();
    let keypoints = (0..n)
        .map(|i| Keypoint { x: i as f32, y: i as f32, angle: 0.0 })
        .collect();
    DescriptorSet::new(keypoints, descriptors).unwrap()
}

fn bench_match_sets(c: &mut Criterion) {
    let mut group = c.benchmark_group("match_sets");

    for &size in &[50usize, 200, 500] {
        let probe = synthetic_set(size, 0xDEAD_BEEF);
        let reference = synthetic_set(size, 0xCAFE_F00D);
        group.bench_with_input(BenchmarkId::new("cross_check", size), &size, |b, _| {
            b.iter(|| match_sets(black_box(&probe), black_box(&reference)))
        });
    }

    group.finish();
}

fn bench_self_match(c: &mut Criterion) {
    let set = synthetic_set(300, 0x1234_5678);
    c.bench_function("self_match_300", |b| {
        b.iter(|| match_sets(black_box(&set), black_box(&set)))
    });
}

criterion_group!(benches, bench_match_sets, bench_self_match);
criterion_main!(benches);
