#[path = "../util/util.rs"]
mod util;

use util::{benchmark_images, palette};

use std::time::Duration;

use brickquant::{GridPlan, Quantizer, UnitMode, BASE_UNIT_SIZE};
use criterion::{
    criterion_group, criterion_main, measurement::WallTime, Bencher, BenchmarkId, Criterion,
    SamplingMode,
};
use image::RgbImage;

fn bench(
    c: &mut Criterion,
    group: &str,
    mut f: impl FnMut(&mut Bencher<WallTime>, &(GridPlan, &RgbImage)),
) {
    let mut group = c.benchmark_group(group);
    group
        .sample_size(30)
        .noise_threshold(0.05)
        .sampling_mode(SamplingMode::Flat)
        .warm_up_time(Duration::from_millis(500));

    // output widths in millimetres
    for width in [480.0, 1600.0, 8000.0] {
        for (path, image) in benchmark_images() {
            let aspect_ratio = f64::from(image.width()) / f64::from(image.height());
            let plan = GridPlan::compute(width, UnitMode::Fine, aspect_ratio, BASE_UNIT_SIZE);
            let (grid_width, grid_height) = plan.dimensions();
            let id = BenchmarkId::new(format!("{grid_width}x{grid_height}"), path);
            group.bench_with_input(id, &(plan, image), &mut f);
        }
    }
}

fn quantize_single(c: &mut Criterion) {
    let quantizer = Quantizer::new(palette());
    bench(c, "quantize_single", |b, &(plan, image)| {
        b.iter(|| quantizer.quantize(image, &plan).unwrap())
    })
}

fn quantize_par(c: &mut Criterion) {
    let quantizer = Quantizer::new(palette());
    bench(c, "quantize_par", |b, &(plan, image)| {
        b.iter(|| quantizer.quantize_par(image, &plan).unwrap())
    })
}

criterion_group!(benches, quantize_single, quantize_par);
criterion_main!(benches);
