use cbdc_map::data::FallbackWorld;
use cbdc_map::map::{rescale, FitKey, PathGenerator, ProjectionFactory, Transform};
use cbdc_map::palette::{generate_category_colors, generate_harmonic_color_scale, DEFAULT_NA_COLOR};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn bench_palette(c: &mut Criterion) {
    let mut group = c.benchmark_group("palette");

    for n in [8usize, 64, 256] {
        group.bench_function(format!("category_colors_{n}"), |b| {
            b.iter(|| generate_category_colors(black_box(n), 50.0, 80.0))
        });
    }

    let names: Vec<String> = (0..200).map(|i| format!("Country {i}")).collect();
    group.bench_function("harmonic_scale_200", |b| {
        b.iter(|| generate_harmonic_color_scale(black_box(names.as_slice()), "not available", "Undecided", DEFAULT_NA_COLOR))
    });

    group.finish();
}

fn bench_paths(c: &mut Criterion) {
    let features = FallbackWorld::features();
    let generator = PathGenerator::default();
    let factory = ProjectionFactory::default();
    let mut group = c.benchmark_group("paths");

    for (label, vertical) in [("wide", false), ("vertical", true)] {
        let fitted = factory.build_for(FitKey { width: 1280.0, height: 720.0, vertical });
        let live = rescale(&fitted, &Transform::new(2.0, 40.0, -30.0).unwrap());
        group.bench_function(format!("generate_{label}"), |b| {
            b.iter(|| generator.generate(black_box(&live), black_box(&features)))
        });
    }

    group.finish();
}

fn bench_rescale(c: &mut Criterion) {
    let fitted = ProjectionFactory::default().build_for(FitKey { width: 800.0, height: 1200.0, vertical: true });
    let mut k = 1.0;

    c.bench_function("rescale_vertical", |b| {
        b.iter(|| {
            k = if k > 50.0 { 1.0 } else { k * 1.1 };
            rescale(black_box(&fitted), &Transform { k, x: 10.0, y: -10.0 })
        })
    });

    c.bench_function("build_projection_set", |b| {
        b.iter(|| {
            ProjectionFactory::default().build_for(black_box(FitKey { width: 1280.0, height: 720.0, vertical: false }))
        })
    });
}

criterion_group!(benches, bench_palette, bench_paths, bench_rescale);
criterion_main!(benches);
