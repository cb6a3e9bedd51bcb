//! Benchmarks for the line-population kernel and full cube simulation
//!
//! The kernel dominates the cost of a forward model, so it is measured on
//! its own at several grid sizes as well as inside `simulate_cube`.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use galkin_rs::cube::{populate_cube, SimulationConfig, SpectralAxis, TransformMethod};
use galkin_rs::model_set::{ComponentOptions, ModelSet};
use galkin_rs::models::{DispersionConst, Geometry, Nfw, Sersic, ZHeightGauss};
use ndarray::{Array1, Array3};

/// Rotating-disk-like fields on an `n x n x n` grid
fn fields(n: usize) -> (Array3<f64>, Array3<f64>, Array3<f64>) {
    let c = (n as f64 - 1.0) / 2.0;
    let flux = Array3::from_shape_fn((n, n, n), |(k, j, i)| {
        let r2 = (i as f64 - c).powi(2) + (j as f64 - c).powi(2) + 4.0 * (k as f64 - c).powi(2);
        (-r2 / (n as f64)).exp()
    });
    let vobs = Array3::from_shape_fn((n, n, n), |(_, _, i)| 200.0 * ((i as f64 - c) / c).tanh());
    let sigma = Array3::from_elem((n, n, n), 40.0);
    (flux, vobs, sigma)
}

fn bench_kernel(c: &mut Criterion) {
    let vspec = Array1::range(-600.0, 600.0, 10.0);
    let mut group = c.benchmark_group("populate_cube");
    group.sample_size(20);

    for n in [27usize, 51, 75] {
        let (flux, vobs, sigma) = fields(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| populate_cube(black_box(&flux), black_box(&vobs), black_box(&sigma), black_box(&vspec)))
        });
    }

    group.finish();
}

fn bench_simulate(c: &mut Criterion) {
    let mut model = ModelSet::new();
    model
        .add_component_with("disk", Sersic::new(10.7, 5.0, 1.0), ComponentOptions::light())
        .unwrap();
    model.add_component("halo", Nfw::new(12.0, 5.0, 1.5)).unwrap();
    model.add_component("geom", Geometry::new(60.0, 30.0)).unwrap();
    model.add_component("disp", DispersionConst::new(50.0)).unwrap();
    model.add_component("zheight", ZHeightGauss::new(1.0)).unwrap();

    let mut group = c.benchmark_group("simulate_cube");
    group.sample_size(10); // Reduce sample size for slow benchmarks

    for method in [TransformMethod::Direct, TransformMethod::Rotate] {
        let config = SimulationConfig {
            nx_sky: 27,
            ny_sky: 27,
            rstep: 0.125,
            oversample: 2,
            transform_method: method,
            spectral: SpectralAxis {
                start: -600.0,
                step: 15.0,
                nspec: 81,
                ..SpectralAxis::default()
            },
            ..SimulationConfig::default()
        };
        group.bench_function(format!("{:?}", method), |b| {
            b.iter(|| model.simulate_cube(black_box(&config)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_kernel, bench_simulate);
criterion_main!(benches);
