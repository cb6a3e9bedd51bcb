//! Tests for parameters, bounds and priors as seen through a model set

use approx::assert_relative_eq;
use galkin_rs::parameters::{Bounds, Parameter, ParameterError, Prior, Tie};
use galkin_rs::GalkinError;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::test_helpers::{disk_model, init_logging};

#[test]
fn test_parameter_state() {
    let mut param = Parameter::with_bounds("inc", 45.0, 0.0, 90.0).unwrap();
    assert!(param.is_free());
    assert_eq!(param.log_prior(), 0.0);

    // values outside the bounds are kept and rejected by the prior
    param.set_value(100.0);
    assert_eq!(param.value(), 100.0);
    assert_eq!(param.log_prior(), f64::NEG_INFINITY);
    param.reset();
    assert_eq!(param.value(), 45.0);

    param.set_tied(Some(Tie::expression("other.inc")));
    assert!(param.is_tied());
    assert!(!param.is_free());

    assert!(matches!(
        Parameter::with_bounds("bad", 1.0, 2.0, 1.0),
        Err(ParameterError::BoundsError(_))
    ));
}

#[test]
fn test_gaussian_prior_transform() {
    let param = Parameter::new("vel_shift", 0.0).with_prior(Prior::Gaussian {
        center: 10.0,
        stddev: 2.0,
    });
    assert_relative_eq!(param.prior_transform(0.5).unwrap(), 10.0, epsilon = 1e-9);
    assert!(param.prior_transform(0.9).unwrap() > 10.0);
    assert!(param.prior_transform(1.5).is_err());
}

#[test]
fn test_uniform_prior_needs_finite_bounds() {
    let param = Parameter::new("xshift", 0.0).bounded(Bounds::min_only(0.0));
    assert!(matches!(param.prior_transform(0.5), Err(ParameterError::Prior { .. })));
}

#[test]
fn test_model_set_priors() {
    init_logging();
    let mut model = disk_model();
    assert_eq!(model.get_log_prior(), 0.0);

    model
        .set_parameter_prior("disk", "r_eff", Prior::Gaussian { center: 4.0, stddev: 1.0 })
        .unwrap();
    let expected = -(2.0 * std::f64::consts::PI).sqrt().ln();
    assert_relative_eq!(model.get_log_prior(), expected, epsilon = 1e-12);

    model.set_parameter_value("geom", "inc", 95.0).unwrap();
    assert_eq!(model.get_log_prior(), f64::NEG_INFINITY);
}

/// Disk model whose free parameters all have finite bounds
fn bounded_model() -> galkin_rs::ModelSet {
    let mut model = disk_model();
    model.set_parameter_fixed("geom", "xshift", true).unwrap();
    model.set_parameter_fixed("geom", "yshift", true).unwrap();
    model
}

#[test]
fn test_prior_transform_maps_unit_cube() {
    let model = bounded_model();
    let n = model.nparams_free();
    let lower = model.get_prior_transform(&vec![0.0; n]).unwrap();
    let upper = model.get_prior_transform(&vec![1.0; n]).unwrap();
    for (lo, hi) in lower.iter().zip(&upper) {
        assert!(lo <= hi);
    }
    assert!(matches!(
        model.get_prior_transform(&vec![0.5; n + 1]),
        Err(GalkinError::LengthMismatch { .. })
    ));

    // an open-ended uniform prior has no transform
    assert!(disk_model().get_prior_transform(&vec![0.5; 7]).is_err());
}

#[test]
fn test_sampled_parameters_respect_bounds() {
    let model = bounded_model();
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let names = model.free_parameter_names();
    for _ in 0..20 {
        let theta = model.sample_free_parameters(&mut rng).unwrap();
        assert_eq!(theta.len(), names.len());
        for ((component, param), value) in names.iter().zip(&theta) {
            let p = model.parameter(component, param).unwrap();
            assert!(p.bounds().is_within_bounds(*value), "{}.{} = {}", component, param, value);
        }
    }
}
