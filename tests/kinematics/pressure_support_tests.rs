//! Asymmetric drift corrections

use approx::assert_relative_eq;
use galkin_rs::kinematics::{KinematicOptions, PressureSupportType};
use galkin_rs::models::{BlackHole, DispersionConst};
use galkin_rs::{GalkinError, ModelSet};
use ndarray::Array1;

use crate::test_helpers::{disk_model, init_logging};

fn with_pressure_support(model: ModelSet, kind: PressureSupportType) -> ModelSet {
    model.with_kinematic_options(KinematicOptions {
        pressure_support: true,
        pressure_support_type: kind,
        ..KinematicOptions::default()
    })
}

#[test]
fn test_exponential_disk_round_trip() {
    init_logging();
    let model = with_pressure_support(disk_model(), PressureSupportType::ExponentialDisk);
    let r = Array1::linspace(0.5, 6.0, 12);

    let vcirc = model.circular_velocity(&r).unwrap();
    let vrot = model.velocity_profile(&r).unwrap();
    let restored = model
        .kinematic_options()
        .correct_for_pressure_support(&model, &r, &vrot)
        .unwrap();
    for i in 0..r.len() {
        assert!(vrot[i] < vcirc[i]);
        assert_relative_eq!(restored[i], vcirc[i], max_relative = 1e-10);
    }
}

#[test]
fn test_exponential_disk_drift_term() {
    let model = with_pressure_support(disk_model(), PressureSupportType::ExponentialDisk);
    let r = Array1::from(vec![2.0, 4.0]);
    let drift = model.kinematic_options().drift_velocity_sq(&model, &r).unwrap();
    // 3.36 (r / Re) sigma^2 with Re = 4 kpc, sigma = 40 km/s
    assert_relative_eq!(drift[0], 3.36 * 0.5 * 1600.0, epsilon = 1e-9);
    assert_relative_eq!(drift[1], 3.36 * 1600.0, epsilon = 1e-9);
}

#[test]
fn test_sersic_drift_reduces_to_exponential_shape() {
    let model = with_pressure_support(disk_model(), PressureSupportType::Sersic);
    let r = Array1::from(vec![1.0, 2.0, 4.0]);
    let drift = model.kinematic_options().drift_velocity_sq(&model, &r).unwrap();
    // linear in r for n = 1
    assert_relative_eq!(drift[1] / drift[0], 2.0, epsilon = 1e-9);
    assert_relative_eq!(drift[2] / drift[0], 4.0, epsilon = 1e-9);
}

#[test]
fn test_density_slope_drift() {
    let model = with_pressure_support(disk_model(), PressureSupportType::DensitySlope);
    let r = Array1::linspace(0.5, 8.0, 10);
    let drift = model.kinematic_options().drift_velocity_sq(&model, &r).unwrap();
    // density falls outward, so the drift is positive and grows with r
    assert!(drift.iter().all(|&d| d > 0.0));
    assert!(drift[9] > drift[0]);
}

#[test]
fn test_density_slope_needs_a_profile() {
    let mut model = ModelSet::new();
    model.add_component("bh", BlackHole::new(9.0)).unwrap();
    model.add_component("disp", DispersionConst::new(50.0)).unwrap();
    let model = with_pressure_support(model, PressureSupportType::DensitySlope);
    let r = Array1::linspace(0.5, 5.0, 4);
    assert!(matches!(
        model.velocity_profile(&r),
        Err(GalkinError::MissingCollaborator(_))
    ));
}

#[test]
fn test_missing_disk_falls_back_to_defaults() {
    let mut model = ModelSet::new();
    model.add_component("bh", BlackHole::new(9.0)).unwrap();
    model.add_component("disp", DispersionConst::new(50.0)).unwrap();
    let model = with_pressure_support(model, PressureSupportType::ExponentialDisk);

    let reference = model.kinematic_options().drift_reference(&model);
    assert!(reference.defaulted);
    assert_eq!(reference.re, 1.0);
    assert_eq!(reference.n, 1.0);
}

#[test]
fn test_pressure_support_needs_dispersion() {
    let mut model = ModelSet::new();
    model.add_component("bh", BlackHole::new(9.0)).unwrap();
    let model = with_pressure_support(model, PressureSupportType::ExponentialDisk);
    assert!(matches!(
        model.velocity_profile(&Array1::from(vec![1.0])),
        Err(GalkinError::Configuration(_))
    ));
}

#[test]
fn test_options_from_json() {
    let options = KinematicOptions::from_json(
        r#"{"pressure_support": true, "pressure_support_type": 2, "pressure_support_re": 3.5}"#,
    )
    .unwrap();
    assert!(options.pressure_support);
    assert!(!options.adiabatic_contract);
    assert_eq!(options.pressure_support_type, PressureSupportType::Sersic);
    assert_eq!(options.pressure_support_re, Some(3.5));
    assert!(KinematicOptions::from_json(r#"{"pressure_support_type": 7}"#).is_err());
}
