//! The galaxy layer: model data and likelihood

use std::sync::Arc;

use approx::assert_relative_eq;
use galkin_rs::cube::{SimulationConfig, SpectralAxis};
use galkin_rs::galaxy::{MapErrors, ModelData};
use galkin_rs::{Convolver, FlatLambdaCdm, Galaxy, ObservedData, Result};
use ndarray::{Array2, Array3};

use crate::test_helpers::{disk_model, init_logging};

/// 3x3 spatial box blur with edge clamping
#[derive(Debug)]
struct BoxBlur;

impl Convolver for BoxBlur {
    fn convolve(&self, cube: &Array3<f64>, _spec_center: Option<f64>) -> Result<Array3<f64>> {
        let (nspec, ny, nx) = cube.dim();
        Ok(Array3::from_shape_fn((nspec, ny, nx), |(k, j, i)| {
            let mut sum = 0.0;
            for dj in -1i64..=1 {
                for di in -1i64..=1 {
                    let jj = (j as i64 + dj).clamp(0, ny as i64 - 1) as usize;
                    let ii = (i as i64 + di).clamp(0, nx as i64 - 1) as usize;
                    sum += cube[[k, jj, ii]];
                }
            }
            sum / 9.0
        }))
    }
}

fn config() -> SimulationConfig {
    SimulationConfig {
        nx_sky: 11,
        ny_sky: 11,
        rstep: 0.2,
        oversample: 3,
        spectral: SpectralAxis {
            start: -450.0,
            step: 30.0,
            nspec: 31,
            ..SpectralAxis::default()
        },
        ..SimulationConfig::default()
    }
}

#[test]
fn test_dscale_follows_cosmology() {
    let galaxy = Galaxy::new(2.0, disk_model());
    let open = Galaxy::new(2.0, disk_model()).with_cosmology(FlatLambdaCdm::new(70.0, 1.0));
    assert!(galaxy.dscale() > 0.0);
    assert!(galaxy.dscale() != open.dscale());
    assert_relative_eq!(galaxy.dscale(), FlatLambdaCdm::default().arcsec_per_kpc_proper(2.0));
}

#[test]
fn test_log_prob_peaks_at_truth() {
    init_logging();
    let cfg = config();
    let truth = Galaxy::new(1.5, disk_model()).with_instrument(Arc::new(BoxBlur));
    let ModelData::Cube(observed) = truth.create_model_data(&cfg).unwrap() else {
        panic!("expected a cube");
    };
    assert_eq!(observed.dim(), (31, 11, 11));

    let shape = observed.dim();
    let mut galaxy = truth.with_data(ObservedData::Cube {
        error: Array3::from_elem(shape, 1e-3 * observed.sum() / observed.len() as f64 + 1e-12),
        mask: Array3::from_elem(shape, true),
        data: observed,
        smoothing: false,
    });

    let theta = galaxy.model.get_free_parameters_values();
    let at_truth = galaxy.log_prob(&theta, &cfg).unwrap();
    assert_relative_eq!(at_truth, 0.0, epsilon = 1e-6);

    let names = galaxy.model.free_parameter_names();
    let inc = names.iter().position(|(c, p)| c == "geom" && p == "inc").unwrap();
    let mut tilted = theta.clone();
    tilted[inc] = 40.0;
    assert!(galaxy.log_prob(&tilted, &cfg).unwrap() < at_truth);
}

#[test]
fn test_masked_pixels_are_ignored() {
    let cfg = config();
    let shape = (11, 11);
    let mut mask = Array2::from_elem(shape, false);
    mask[[5, 8]] = true;
    let galaxy = Galaxy::new(1.5, disk_model()).with_data(ObservedData::Maps {
        velocity: Array2::from_elem(shape, 1e4),
        dispersion: Array2::zeros(shape),
        errors: MapErrors {
            velocity: Array2::ones(shape),
            dispersion: Array2::ones(shape),
        },
        mask,
    });
    let ModelData::Maps { velocity, dispersion, .. } = galaxy.create_model_data(&cfg).unwrap() else {
        panic!("expected maps");
    };
    let expected = -0.5 * ((1e4 - velocity[[5, 8]]).powi(2) + dispersion[[5, 8]].powi(2));
    let model_data = ModelData::Maps {
        flux: Array2::zeros(shape),
        velocity,
        dispersion,
    };
    assert_relative_eq!(galaxy.log_like(&model_data).unwrap(), expected, max_relative = 1e-12);
}

#[test]
fn test_dimensionality_mismatch() {
    let shape = (31, 11, 11);
    let galaxy = Galaxy::new(1.5, disk_model()).with_data(ObservedData::Cube {
        data: Array3::zeros(shape),
        error: Array3::ones(shape),
        mask: Array3::from_elem(shape, true),
        smoothing: false,
    });
    let maps = ModelData::Maps {
        flux: Array2::zeros((11, 11)),
        velocity: Array2::zeros((11, 11)),
        dispersion: Array2::zeros((11, 11)),
    };
    assert!(galaxy.log_like(&maps).is_err());
    assert!(galaxy
        .create_model_data(&SimulationConfig {
            nx_sky: 9,
            ..config()
        })
        .is_err());
}
