//! End-to-end cube simulation

use approx::assert_relative_eq;
use galkin_rs::cube::{populate_cube, SimulationConfig, SpectralAxis, TransformMethod};
use galkin_rs::models::{
    BiconicalOutflow, Context, DispersionConst, ExpDisk, Geometry, Nfw, PlanarRadialFlow,
    ThinCentralPlaneDustExtinction, UniformRadialFlow, UnresolvedOutflow, ZHeightGauss,
};
use galkin_rs::{ComponentOptions, GalkinError, ModelSet};
use ndarray::{s, Array1, Array2, Array3, Axis};

use crate::test_helpers::{disk_halo_model, disk_model, init_logging};

fn config() -> SimulationConfig {
    SimulationConfig {
        nx_sky: 15,
        ny_sky: 15,
        rstep: 0.2,
        dscale: 8.0,
        spectral: SpectralAxis {
            start: -400.0,
            step: 20.0,
            nspec: 41,
            ..SpectralAxis::default()
        },
        ..SimulationConfig::default()
    }
}

/// Flux-weighted mean velocity of each spaxel
fn moment1(cube: &Array3<f64>, vspec: &Array1<f64>) -> Array2<f64> {
    let (_, ny, nx) = cube.dim();
    Array2::from_shape_fn((ny, nx), |(j, i)| {
        let spectrum = cube.slice(s![.., j, i]);
        let flux = spectrum.sum();
        if flux > 0.0 {
            spectrum.dot(vspec) / flux
        } else {
            0.0
        }
    })
}

#[test]
fn test_simulated_cube_is_physical() {
    init_logging();
    let model = disk_halo_model();
    let cfg = config();
    let simulated = model.simulate_cube(&cfg).unwrap();

    assert_eq!(simulated.cube.dim(), (41, 15, 15));
    assert_eq!(simulated.spec.len(), 41);
    assert!(simulated.cube.iter().all(|v| v.is_finite() && *v >= 0.0));
    assert!(simulated.cube.sum() > 0.0);
    assert_eq!(simulated.diagnostics.grid_shape.1, 15);
    assert!(simulated.diagnostics.n_voxels_populated > 0);
    assert!(simulated.diagnostics.contraction.is_none());
    assert!(!simulated.diagnostics.pressure_support_defaulted);
}

#[test]
fn test_rotation_is_antisymmetric() {
    let model = disk_model();
    let cfg = config();
    let simulated = model.simulate_cube(&cfg).unwrap();
    let vel = moment1(&simulated.cube, &simulated.spec);
    let flux = simulated.cube.sum_axis(Axis(0));

    for (j, i) in [(7, 11), (10, 7), (3, 12), (12, 9)] {
        let (jr, ir) = (14 - j, 14 - i);
        assert_relative_eq!(vel[[j, i]], -vel[[jr, ir]], epsilon = 1e-6);
        assert_relative_eq!(flux[[j, i]], flux[[jr, ir]], max_relative = 1e-9);
    }
    assert!(vel.iter().any(|v| v.abs() > 50.0));
}

#[test]
fn test_face_on_disk_does_not_rotate() {
    let mut model = disk_model();
    model.set_parameter_value("geom", "inc", 0.0).unwrap();
    let simulated = model.simulate_cube(&config()).unwrap();
    let vel = moment1(&simulated.cube, &simulated.spec);
    assert!(vel.iter().all(|v| v.abs() < 1e-6));
}

#[test]
fn test_systemic_velocity_shifts_the_cube() {
    let mut model = disk_model();
    model.set_parameter_value("geom", "vel_shift", 50.0).unwrap();
    let simulated = model.simulate_cube(&config()).unwrap();
    let spectrum = simulated.cube.sum_axis(Axis(2)).sum_axis(Axis(1));
    let mean = spectrum.dot(&simulated.spec) / spectrum.sum();
    assert_relative_eq!(mean, 50.0, epsilon = 3.0);
}

#[test]
fn test_rotate_agrees_with_direct() {
    let model = disk_model();
    let direct = model.simulate_cube(&config()).unwrap();
    let rotate = model
        .simulate_cube(&SimulationConfig {
            transform_method: TransformMethod::Rotate,
            ..config()
        })
        .unwrap();
    assert_eq!(rotate.cube.dim(), direct.cube.dim());
    assert!(rotate.cube.iter().all(|v| v.is_finite() && *v >= 0.0));

    let v_direct = moment1(&direct.cube, &direct.spec);
    let v_rotate = moment1(&rotate.cube, &rotate.spec);
    for (vd, vr) in v_direct.iter().zip(v_rotate.iter()) {
        if vd.abs() > 40.0 {
            assert_eq!(vd.signum(), vr.signum());
        }
    }
}

#[test]
fn test_unresolved_outflow_adds_flux() {
    let base = disk_model();
    let mut with_outflow = disk_model();
    with_outflow
        .add_component("outflow", UnresolvedOutflow::new(-150.0, 300.0, 1000.0))
        .unwrap();
    let cfg = config();
    let plain = base.simulate_cube(&cfg).unwrap();
    let outflow = with_outflow.simulate_cube(&cfg).unwrap();
    assert!(outflow.cube.sum() > plain.cube.sum());

    // the extra flux sits in the central spaxel, blueshifted
    let extra = &outflow.cube - &plain.cube;
    let centre: Array1<f64> = extra.slice(s![.., 7, 7]).to_owned();
    assert!(centre.sum() > 0.0);
    assert!(centre.dot(&outflow.spec) / centre.sum() < 0.0);
}

#[test]
fn test_missing_geometry_is_a_configuration_error() {
    let mut model = ModelSet::new();
    model
        .add_component("disp", DispersionConst::new(40.0))
        .unwrap();
    assert!(matches!(
        model.simulate_cube(&config()),
        Err(GalkinError::Configuration(_))
    ));
}

#[test]
fn test_light_needs_zheight() {
    let mut model = ModelSet::new();
    model
        .add_component_with(
            "disk",
            galkin_rs::models::Sersic::new(10.5, 4.0, 1.0),
            ComponentOptions::light(),
        )
        .unwrap();
    model.add_component("geom", Geometry::new(60.0, 0.0)).unwrap();
    model
        .add_component("disp", DispersionConst::new(40.0))
        .unwrap();
    assert!(matches!(
        model.simulate_cube(&config()),
        Err(GalkinError::Configuration(_))
    ));
}

#[test]
fn test_kernel_conserves_flux() {
    let flux = Array3::from_shape_vec((1, 1, 2), vec![2.0, 0.5]).unwrap();
    let vobs = Array3::from_shape_vec((1, 1, 2), vec![0.0, 100.0]).unwrap();
    let sigma = Array3::from_elem((1, 1, 2), 25.0);
    let vspec = Array1::range(-300.0, 300.0 + 1e-9, 10.0);

    let cube = populate_cube(&flux, &vobs, &sigma, &vspec).unwrap();
    assert_eq!(cube.dim(), (vspec.len(), 1, 2));
    assert_relative_eq!(cube.slice(s![.., 0, 0]).sum(), 2.0, epsilon = 1e-9);
    assert_relative_eq!(cube.slice(s![.., 0, 1]).sum(), 0.5, epsilon = 1e-9);

    let peak = cube
        .slice(s![.., 0, 1])
        .iter()
        .enumerate()
        .fold((0, f64::MIN), |best, (k, &v)| if v > best.1 { (k, v) } else { best })
        .0;
    assert_eq!(vspec[peak], 100.0);

    let bad_sigma = Array3::from_elem((1, 1, 3), 25.0);
    assert!(populate_cube(&flux, &vobs, &bad_sigma, &vspec).is_err());
}

#[test]
fn test_exponential_disk_with_halo_on_a_large_grid() {
    init_logging();
    let mut model = ModelSet::new();
    model
        .add_component_with("disk", ExpDisk::new(11.0, 5.0), ComponentOptions::light())
        .unwrap();
    model.add_component("halo", Nfw::new(12.0, 5.0, 1.0)).unwrap();
    model.add_component("disp", DispersionConst::new(30.0)).unwrap();
    model.add_component("geom", Geometry::new(45.0, 0.0)).unwrap();
    model.add_component("zheight", ZHeightGauss::new(0.3)).unwrap();

    let cfg = SimulationConfig {
        nx_sky: 50,
        ny_sky: 50,
        rstep: 0.2,
        dscale: 1.0,
        spectral: SpectralAxis {
            start: -500.0,
            step: 10.0,
            nspec: 101,
            ..SpectralAxis::default()
        },
        ..SimulationConfig::default()
    };
    let simulated = model.simulate_cube(&cfg).unwrap();
    assert_eq!(simulated.cube.dim(), (101, 50, 50));
    let total = simulated.cube.sum();
    assert!(total.is_finite() && total > 0.0);

    // pa = 0 puts the major axis along y, so mirroring y flips the velocity
    let vel = moment1(&simulated.cube, &simulated.spec);
    for (j, i) in [(30, 25), (40, 20), (10, 33), (45, 5)] {
        assert_relative_eq!(vel[[j, i]], -vel[[49 - j, i]], epsilon = 1e-6);
    }
    assert!(vel[[40, 25]].abs() > 50.0);
    assert_eq!(vel[[40, 25]].signum(), -vel[[9, 25]].signum());
}

#[test]
fn test_biconical_outflow_adds_red_and_blue_flux() {
    let base = disk_model();
    let mut with_outflow = disk_model();
    with_outflow
        .add_component_with(
            "outflow_geom",
            Geometry::new(60.0, 0.0),
            ComponentOptions::in_context(Context::Outflow),
        )
        .unwrap();
    with_outflow
        .add_component_with(
            "outflow_disp",
            DispersionConst::new(60.0),
            ComponentOptions::in_context(Context::Outflow),
        )
        .unwrap();
    with_outflow
        .add_component("outflow", BiconicalOutflow::new(1.0, 300.0, 0.1, 0.0, 30.0, 0.15))
        .unwrap();

    let cfg = config();
    let plain = base.simulate_cube(&cfg).unwrap();
    let outflow = with_outflow.simulate_cube(&cfg).unwrap();
    let extra = &outflow.cube - &plain.cube;
    assert!(extra.iter().all(|v| v.is_finite() && *v > -1e-9));
    assert!(extra.sum() > 0.0);

    // the two cones mirror each other through the centre
    let spectrum = extra.sum_axis(Axis(2)).sum_axis(Axis(1));
    let blue: f64 = spectrum.iter().zip(outflow.spec.iter()).filter(|(_, v)| **v < 0.0).map(|(f, _)| f).sum();
    let red: f64 = spectrum.iter().zip(outflow.spec.iter()).filter(|(_, v)| **v > 0.0).map(|(f, _)| f).sum();
    assert!(blue > 0.0);
    assert_relative_eq!(blue, red, max_relative = 1e-6);
}

#[test]
fn test_biconical_outflow_needs_its_own_geometry() {
    let mut model = disk_model();
    model
        .add_component("outflow", BiconicalOutflow::new(1.0, 300.0, 0.1, 0.0, 30.0, 0.15))
        .unwrap();
    assert!(matches!(
        model.simulate_cube(&config()),
        Err(GalkinError::Configuration(_))
    ));
}

/// Thin disk so that every sight line meets the midplane on one side of the centre
fn thin_disk_model() -> ModelSet {
    let mut model = disk_model();
    model.set_parameter_value("zheight", "sigmaz", 0.02).unwrap();
    model
}

#[test]
fn test_radial_inflow_shifts_the_minor_axis() {
    let cfg = config();
    let vel_for = |vr: Option<f64>| {
        let mut model = thin_disk_model();
        if let Some(vr) = vr {
            model.add_component("inflow", UniformRadialFlow::new(vr)).unwrap();
        }
        let simulated = model.simulate_cube(&cfg).unwrap();
        moment1(&simulated.cube, &simulated.spec)
    };

    // row 7 is the minor axis for pa = 0
    let rotation_only = vel_for(None);
    assert!(rotation_only[[7, 9]].abs() < 1e-6);
    assert!(rotation_only[[7, 5]].abs() < 1e-6);

    let inflow = vel_for(Some(-50.0));
    assert!(inflow[[7, 9]].abs() > 20.0);
    assert_relative_eq!(inflow[[7, 9]], -inflow[[7, 5]], epsilon = 1e-6);

    // reversing the flow reverses the shift
    let outflow = vel_for(Some(50.0));
    assert_relative_eq!(outflow[[7, 9]], -inflow[[7, 9]], epsilon = 1e-6);
}

#[test]
fn test_planar_flow_fills_its_annulus() {
    let base = disk_model();
    let mut with_flow = disk_model();
    with_flow
        .add_component_with("flow_geom", Geometry::new(0.0, 0.0), ComponentOptions::in_context(Context::Flow))
        .unwrap();
    with_flow
        .add_component_with("flow_disp", DispersionConst::new(20.0), ComponentOptions::in_context(Context::Flow))
        .unwrap();
    with_flow
        .add_component("flow", PlanarRadialFlow::new(-60.0, 0.05, 0.15).with_thickness(0.02))
        .unwrap();

    let cfg = config();
    let plain = base.simulate_cube(&cfg).unwrap();
    let flow = with_flow.simulate_cube(&cfg).unwrap();
    let extra = (&flow.cube - &plain.cube).sum_axis(Axis(0));

    // 0.025 kpc per pixel: the centre is inside r_inner, 4 pixels out is in
    // the annulus and 7 pixels out is beyond r_outer
    assert!(extra[[7, 7]].abs() < 1e-9);
    assert!(extra[[7, 11]] > 0.0);
    assert!(extra[[11, 7]] > 0.0);
    assert!(extra[[7, 14]].abs() < 1e-9);
}

#[test]
fn test_dust_plane_dims_the_cube_linearly() {
    let cfg = config();
    let total_for = |amp: Option<f64>| {
        let mut model = disk_model();
        if let Some(amp) = amp {
            model
                .add_component("dust", ThinCentralPlaneDustExtinction::new(60.0, 0.0, 0.0, 0.15, amp))
                .unwrap();
        }
        model.simulate_cube(&cfg).unwrap().cube.sum()
    };

    let clear = total_for(None);
    let ratios: Vec<f64> = [0.0, 0.3, 0.8].iter().map(|&a| total_for(Some(a)) / clear).collect();
    assert_relative_eq!(ratios[0], 1.0, epsilon = 1e-12);
    assert!(ratios[1] < 1.0);
    assert!(ratios[2] < ratios[1]);
    assert!(ratios[2] > 0.0);
    // only the light behind the plane is scaled, by 1 - amp
    assert_relative_eq!((1.0 - ratios[2]) / (1.0 - ratios[1]), 0.8 / 0.3, max_relative = 1e-6);
}

#[test]
fn test_z_truncation_keeps_the_flux() {
    let model = thin_disk_model();
    let full = model
        .simulate_cube(&SimulationConfig {
            zcalc_truncate: false,
            ..config()
        })
        .unwrap();
    let truncated = model
        .simulate_cube(&SimulationConfig {
            zcalc_truncate: true,
            n_wholepix_z_min: 5,
            ..config()
        })
        .unwrap();

    assert_eq!(full.diagnostics.nz, 15);
    assert_eq!(truncated.diagnostics.nz, 5);
    assert!(truncated.diagnostics.n_voxels_populated < full.diagnostics.n_voxels_populated);
    assert!(truncated.cube.sum() <= full.cube.sum() * (1.0 + 1e-12));
    assert_relative_eq!(truncated.cube.sum(), full.cube.sum(), max_relative = 1e-2);
}
