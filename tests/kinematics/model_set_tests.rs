//! Model set bookkeeping and the rotation curve

use approx::assert_relative_eq;
use galkin_rs::kinematics::KinematicOptions;
use galkin_rs::models::{BlackHole, Context, Geometry, MassSubtype, Sersic};
use galkin_rs::parameters::Tie;
use galkin_rs::{ComponentOptions, GalkinError};
use ndarray::{array, Array1};

use crate::test_helpers::{disk_halo_model, disk_model, init_logging};

#[test]
fn test_free_parameter_keys_match_theta() {
    let model = disk_halo_model();
    let theta = model.get_free_parameters_values();
    let keys = model.get_free_parameter_keys();

    assert_eq!(keys["disk"]["total_mass"], Some(0));
    assert_eq!(keys["disp"]["sigma0"], None);
    for (component, params) in &keys {
        for (param, position) in params {
            if let Some(k) = position {
                assert_eq!(theta[*k], model.parameter_value(component, param).unwrap());
            }
        }
    }
    assert_eq!(
        model.nparams(),
        model.nparams_free() + model.nparams_fixed() + model.nparams_tied()
    );
}

#[test]
fn test_theta_round_trip_with_ties() {
    init_logging();
    let mut model = disk_model();
    model
        .set_parameter_tied("zheight", "sigmaz", Some(Tie::expression("disk.r_eff / 5")))
        .unwrap();

    let mut theta = model.get_free_parameters_values();
    let names = model.free_parameter_names();
    let r_eff = names.iter().position(|(c, p)| c == "disk" && p == "r_eff").unwrap();
    theta[r_eff] = 6.0;
    model.update_parameters(&theta).unwrap();

    assert_eq!(model.get_free_parameters_values(), theta);
    assert_relative_eq!(model.parameter_value("zheight", "sigmaz").unwrap(), 1.2);
    assert_eq!(model.zprofile(Context::Galaxy).unwrap().z_scalelength(), 1.2);
}

#[test]
fn test_tie_to_unknown_parameter_is_rejected() {
    let mut model = disk_model();
    let err = model
        .set_parameter_tied("zheight", "sigmaz", Some(Tie::expression("bulge.r_eff / 5")))
        .unwrap_err();
    assert!(matches!(err, GalkinError::Expression(_)));
    assert_eq!(model.nparams_tied(), 0);
}

#[test]
fn test_multi_level_ties_are_reported() {
    let mut model = disk_model();
    model.add_component("geom_out", Geometry::new(30.0, 10.0)).unwrap();
    model
        .set_parameter_tied("geom", "pa", Some(Tie::expression("geom.inc + 1")))
        .unwrap();
    model
        .set_parameter_tied("geom_out", "pa", Some(Tie::expression("geom.pa")))
        .unwrap();
    assert_eq!(model.tie_dependency_warnings().len(), 1);
}

#[test]
fn test_unknown_parameter_lookup() {
    let model = disk_model();
    assert!(matches!(
        model.parameter_value("disk", "mass"),
        Err(GalkinError::ParameterNotFound { .. })
    ));
    assert!(matches!(
        model.parameter_value("bulge", "r_eff"),
        Err(GalkinError::ComponentNotFound(_))
    ));
}

#[test]
fn test_components_by_context() {
    let mut model = disk_model();
    model
        .add_component_with(
            "outflow_geom",
            Geometry::new(10.0, 45.0),
            ComponentOptions::in_context(Context::Outflow),
        )
        .unwrap();
    assert_eq!(model.geometry(Context::Galaxy).unwrap().inc(), 60.0);
    assert_eq!(model.geometry(Context::Outflow).unwrap().inc(), 10.0);
    assert!(model.dispersion(Context::Outflow).is_none());
    assert_eq!(model.light_components().count(), 1);
}

#[test]
fn test_circular_velocity_adds_in_quadrature() {
    let mut model = disk_model();
    model.add_component("bh", BlackHole::new(9.0)).unwrap();
    let r = array![0.5, 1.0, 3.0, 8.0];

    let disk = model.component("disk").unwrap().as_mass().unwrap().circular_velocity(&r).unwrap();
    let bh = model.component("bh").unwrap().as_mass().unwrap().circular_velocity(&r).unwrap();
    let total = model.circular_velocity(&r).unwrap();
    for i in 0..r.len() {
        assert_relative_eq!(total[i], disk[i].hypot(bh[i]), epsilon = 1e-9);
    }

    let menc = model.enclosed_mass(&r);
    assert!(menc.iter().zip(menc.iter().skip(1)).all(|(a, b)| a < b));
    // the black hole mass is enclosed at every radius
    assert!(menc[0] > 1e9);
}

#[test]
fn test_velocity_profile_without_options_is_circular() {
    let model = disk_halo_model();
    let r = Array1::linspace(0.5, 15.0, 30);
    assert_eq!(model.velocity_profile(&r).unwrap(), model.circular_velocity(&r).unwrap());
}

#[test]
fn test_adiabatic_contraction_raises_the_inner_curve() {
    init_logging();
    let r = array![1.0, 2.0, 4.0, 8.0];
    let plain = disk_halo_model();
    let options = KinematicOptions {
        adiabatic_contract: true,
        adiabatic_contract_rmax: 40.0,
        ..KinematicOptions::default()
    };
    let contracted = disk_halo_model().with_kinematic_options(options);

    let (v_adi, report) = contracted.velocity_profile_with_report(&r).unwrap();
    let report = report.unwrap();
    assert_eq!(report.n_radii, 201);
    assert!(!report.used_converged_subset);

    let v = plain.velocity_profile(&r).unwrap();
    for i in 0..r.len() {
        assert!(v_adi[i] > v[i], "r = {}: {} <= {}", r[i], v_adi[i], v[i]);
    }

    let fdm = plain.get_dm_aper(&r).unwrap();
    let fdm_adi = contracted.get_dm_aper(&r).unwrap();
    assert!(fdm_adi[0] > fdm[0]);
}

#[test]
fn test_contraction_with_a_zero_step_is_rejected() {
    let r = array![1.0, 2.0, 4.0];
    let options = KinematicOptions {
        adiabatic_contract: true,
        adiabatic_contract_step: 0.0,
        ..KinematicOptions::default()
    };
    let model = disk_halo_model().with_kinematic_options(options);
    assert!(matches!(model.velocity_profile(&r), Err(GalkinError::Configuration(_))));
    assert!(matches!(model.get_dm_aper(&r), Err(GalkinError::Configuration(_))));
}

#[test]
fn test_combined_component_is_not_contracted() {
    let r = array![2.0, 5.0];
    let options = KinematicOptions {
        adiabatic_contract: true,
        adiabatic_contract_rmax: 20.0,
        ..KinematicOptions::default()
    };
    let mut model = combined_only_model();
    let before = model.velocity_profile(&r).unwrap();
    model.set_kinematic_options(options);
    // no dark matter subtype: contraction has nothing to act on
    let (after, report) = model.velocity_profile_with_report(&r).unwrap();
    assert!(report.is_none());
    assert_eq!(before, after);
}

fn combined_only_model() -> galkin_rs::ModelSet {
    let mut model = galkin_rs::ModelSet::new();
    model
        .add_component("total", Sersic::new(11.0, 5.0, 2.0).with_subtype(MassSubtype::Combined))
        .unwrap();
    model
}
