//! Dark matter halos and the fdm inversion

use approx::assert_relative_eq;
use galkin_rs::models::{Burkert, DarkMatterHalo, MassProfile, Nfw, Sersic};
use galkin_rs::parameters::Tie;
use galkin_rs::{GalkinError, ModelSet};
use ndarray::{array, Array1};

use crate::test_helpers::{disk_model, init_logging};

fn fdm_model(fdm: f64) -> ModelSet {
    let mut model = disk_model();
    model.add_component("halo", Nfw::new(11.5, 6.0, 1.0).with_fdm(fdm)).unwrap();
    model
}

#[test]
fn test_fdm_round_trip() {
    init_logging();
    let r_fdm = 5.0;
    let mut model = fdm_model(0.4);
    let log_mvir = model.halo_mvirial_from_fdm("halo", r_fdm).unwrap();
    assert!(log_mvir > 5.0 && log_mvir < 20.0);

    model.set_parameter_value("halo", "mvirial", log_mvir).unwrap();
    let fdm = model.get_dm_aper(&array![r_fdm]).unwrap();
    assert_relative_eq!(fdm[0], 0.4, epsilon = 1e-6);
}

#[test]
fn test_fdm_boundaries() {
    assert_eq!(
        fdm_model(0.0).halo_mvirial_from_fdm("halo", 5.0).unwrap(),
        f64::NEG_INFINITY
    );
    assert_eq!(fdm_model(1.0).halo_mvirial_from_fdm("halo", 5.0).unwrap(), f64::INFINITY);
    assert!(fdm_model(1.5).halo_mvirial_from_fdm("halo", 5.0).unwrap().is_nan());
}

#[test]
fn test_fdm_inversion_needs_a_halo() {
    let model = fdm_model(0.5);
    assert!(matches!(
        model.halo_mvirial_from_fdm("disk", 5.0),
        Err(GalkinError::Configuration(_))
    ));
    assert!(matches!(
        model.halo_mvirial_from_fdm("nope", 5.0),
        Err(GalkinError::ComponentNotFound(_))
    ));
}

#[test]
fn test_mvirial_tied_to_fdm() {
    init_logging();
    let mut model = fdm_model(0.3);
    model
        .set_parameter_tied(
            "halo",
            "mvirial",
            Some(Tie::function(|m| m.halo_mvirial_from_fdm("halo", 4.0).unwrap_or(f64::NAN))),
        )
        .unwrap();

    let mut theta = model.get_free_parameters_values();
    // the disk mass is the first free parameter
    theta[0] = 10.8;
    model.update_parameters(&theta).unwrap();

    let fdm = model.get_dm_aper(&array![4.0]).unwrap();
    assert_relative_eq!(fdm[0], 0.3, epsilon = 1e-6);
}

#[test]
fn test_unreachable_fdm_gives_non_finite_velocities() {
    // fdm > 1 has no halo mass, so the tied mvirial is NaN
    let mut model = fdm_model(1.5);
    model
        .set_parameter_tied(
            "halo",
            "mvirial",
            Some(Tie::function(|m| m.halo_mvirial_from_fdm("halo", 4.0).unwrap_or(f64::NAN))),
        )
        .unwrap();
    assert!(model.parameter_value("halo", "mvirial").unwrap().is_nan());

    let r = array![1.0, 2.0, 4.0, 8.0];
    assert!(model.circular_velocity(&r).unwrap().iter().all(|v| v.is_nan()));
    assert!(model.velocity_profile(&r).unwrap().iter().all(|v| v.is_nan()));

    let config = galkin_rs::SimulationConfig {
        nx_sky: 9,
        ny_sky: 9,
        ..Default::default()
    };
    match model.simulate_cube(&config) {
        Ok(simulated) => assert!(simulated.cube.iter().any(|v| !v.is_finite())),
        Err(err) => assert!(matches!(err, GalkinError::Configuration(_))),
    }
}

#[test]
fn test_burkert_fdm_inversion() {
    let disk = Sersic::new(10.5, 4.0, 1.0);
    let halo = Burkert::new(11.0, 3.0, 1.0).with_fdm(0.5);
    let baryons: Vec<&dyn MassProfile> = vec![&disk];
    let log_mvir = halo.calc_mvirial_from_fdm(&baryons, 6.0).unwrap();

    let r = Array1::from_elem(1, 6.0);
    let vdm = halo.enclosed_mass_for_mvirial(&r, log_mvir);
    let vdm = galkin_rs::models::velocity_from_enclosed_mass(&r, &vdm)[0];
    let vbar = disk.circular_velocity(&r).unwrap()[0];
    assert_relative_eq!(vdm * vdm / (vdm * vdm + vbar * vbar), 0.5, epsilon = 1e-6);
}

#[test]
fn test_halo_rvir_grows_with_mass() {
    let small = Nfw::new(11.0, 5.0, 1.0);
    let large = Nfw::new(12.0, 5.0, 1.0);
    assert!(large.calc_rvir() > small.calc_rvir());
    // Mvir ~ rvir^3 at fixed redshift
    assert_relative_eq!(large.calc_rvir() / small.calc_rvir(), 10f64.powf(1.0 / 3.0), epsilon = 1e-9);
}
