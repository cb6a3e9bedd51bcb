//! Projection of a model set onto the sampled sky grid

use log::debug;
use ndarray::{s, Array1, Array3, Zip};

use crate::cube::grid::SampledGrid;
use crate::cube::kernel::{populate_cube, populate_cube_indexed, VoxelIndex};
use crate::cube::{SimulatedCube, SimulationConfig, SimulationDiagnostics, TransformMethod};
use crate::error::{GalkinError, Result};
use crate::kinematics::{ContractionReport, PressureSupportType};
use crate::model_set::{LightSource, ModelSet};
use crate::models::geometry::{galaxy_grid, SkyFrame};
use crate::models::{Context, Flow, Outflow, RadialProfile1D, SpatialField3D, UniformRadialFlow, ZHeightProfile};

/// Galaxy fields evaluated at a set of voxels
struct GalaxyFields {
    flux: Array1<f64>,
    vobs: Array1<f64>,
    sigma: Array1<f64>,
    contraction: Option<ContractionReport>,
}

/// Output of one projection method
struct Projection {
    cube: Array3<f64>,
    nz: usize,
    n_voxels: usize,
    contraction: Option<ContractionReport>,
}

pub(crate) fn simulate(model: &ModelSet, config: &SimulationConfig) -> Result<SimulatedCube> {
    let grid = SampledGrid::new(config)?;
    let vspec = config.spectral.velocities()?;
    let geometry = model
        .geometry(Context::Galaxy)
        .ok_or_else(|| GalkinError::Configuration("the model has no galaxy geometry".to_string()))?;
    let frame = geometry.frame(grid.oversample as f64);
    let vel_shift = geometry.vel_shift();

    let options = model.kinematic_options();
    let pressure_support_defaulted = options.pressure_support
        && options.pressure_support_type != PressureSupportType::DensitySlope
        && options.drift_reference(model).defaulted;

    let zsize = if config.zcalc_truncate {
        let h_z = model.zprofile(Context::Galaxy).map_or(0.0, |z| z.z_scalelength());
        Some(grid.truncated_zsize(h_z, config.n_wholepix_z_min))
    } else {
        None
    };

    let mut projection = match config.transform_method {
        TransformMethod::Direct => project_direct(model, &grid, &frame, vel_shift, zsize, &vspec)?,
        TransformMethod::Rotate => project_rotate(model, &grid, &frame, vel_shift, zsize, &vspec)?,
    };
    add_outflows(model, &grid, &vspec, &mut projection.cube)?;
    add_flows(model, &grid, &vspec, &mut projection.cube)?;

    let diagnostics = SimulationDiagnostics {
        grid_shape: grid.shape(),
        nz: projection.nz,
        n_voxels_populated: projection.n_voxels,
        contraction: projection.contraction,
        pressure_support_defaulted,
    };
    Ok(SimulatedCube {
        cube: projection.cube,
        spec: config.spectral.values(),
        diagnostics,
    })
}

/// Flux, velocity and dispersion at galaxy-frame positions given in sampled pixels
fn galaxy_fields(
    model: &ModelSet,
    frame: &SkyFrame,
    to_kpc: f64,
    vel_shift: f64,
    xg: &Array1<f64>,
    yg: &Array1<f64>,
    zg: &Array1<f64>,
) -> Result<GalaxyFields> {
    let mut r_pix = Array1::zeros(xg.len());
    Zip::from(&mut r_pix).and(xg).and(yg).for_each(|r, &x, &y| *r = x.hypot(y));
    let rk = r_pix.mapv(|r| r * to_kpc);
    let xk = xg.mapv(|v| v * to_kpc);
    let yk = yg.mapv(|v| v * to_kpc);
    let zk = zg.mapv(|v| v * to_kpc);

    let (vrot, contraction) = model.velocity_profile_with_report(&rk)?;
    let radial_flows: Vec<&UniformRadialFlow> = model
        .flows()
        .filter_map(|(_, f)| match f {
            Flow::UniformRadial(u) => Some(u),
            Flow::PlanarRadial(_) => None,
        })
        .collect();

    let mut vobs = Array1::zeros(xg.len());
    Zip::from(&mut vobs)
        .and(&vrot)
        .and(xg)
        .and(yg)
        .and(&r_pix)
        .for_each(|vo, &v, &x, &y, &r| {
            *vo = if r == 0.0 {
                0.0
            } else {
                let flow: f64 = radial_flows.iter().map(|f| f.los_velocity(frame, x, y)).sum();
                v * frame.sin_i * x / r + vel_shift + flow
            };
        });

    let flux = light_flux(model, &rk, &xk, &yk, &zk)?;
    let sigma = model
        .dispersion(Context::Galaxy)
        .ok_or_else(|| GalkinError::Configuration("the model has no galaxy dispersion profile".to_string()))?
        .evaluate(&rk);

    Ok(GalaxyFields {
        flux,
        vobs,
        sigma,
        contraction,
    })
}

/// Summed light of every light component, weighted by the z-height profile
fn light_flux(
    model: &ModelSet,
    rk: &Array1<f64>,
    xk: &Array1<f64>,
    yk: &Array1<f64>,
    zk: &Array1<f64>,
) -> Result<Array1<f64>> {
    let zweight = model.zprofile(Context::Galaxy).map(|z| z.evaluate(zk));
    let mut flux = Array1::zeros(rk.len());
    for (name, source) in model.light_components() {
        let (light, needs_z) = match source {
            LightSource::Mass(m) => (m.light_profile(rk).unwrap_or_else(|| Array1::zeros(rk.len())), true),
            LightSource::Profile(p) => (p.evaluate_3d(xk, yk, zk), !p.includes_z()),
        };
        if needs_z {
            let weight = zweight.as_ref().ok_or_else(|| {
                GalkinError::Configuration(format!("light component '{}' needs a z-height profile", name))
            })?;
            flux += &(light * weight);
        } else {
            flux += &light;
        }
    }
    Ok(flux)
}

/// Transmission of the dust plane at the given sky voxels, if there is one
fn extinction_at(model: &ModelSet, grid: &SampledGrid, voxels: &[VoxelIndex]) -> Option<Array1<f64>> {
    let dust = model.extinction()?;
    let (zc, yc, xc) = grid.center;
    let x = Array1::from_iter(voxels.iter().map(|v| (v.x as f64 - xc) * grid.to_kpc));
    let y = Array1::from_iter(voxels.iter().map(|v| (v.y as f64 - yc) * grid.to_kpc));
    let z = Array1::from_iter(voxels.iter().map(|v| (v.z as f64 - zc) * grid.to_kpc));
    Some(dust.evaluate_3d(&x, &y, &z))
}

fn within_window(x: f64, y: f64, z: f64, zsize: Option<usize>, rmax: f64) -> bool {
    match zsize {
        Some(zsize) => z.abs() <= zsize as f64 / 2.0 && x.hypot(y) <= rmax,
        None => true,
    }
}

fn project_direct(
    model: &ModelSet,
    grid: &SampledGrid,
    frame: &SkyFrame,
    vel_shift: f64,
    zsize: Option<usize>,
    vspec: &Array1<f64>,
) -> Result<Projection> {
    let shape = grid.shape();
    let (xg3, yg3, zg3) = galaxy_grid(frame, shape, grid.center);
    let rmax = grid.max_radius();

    let mut voxels = Vec::new();
    let (mut xs, mut ys, mut zs) = (Vec::new(), Vec::new(), Vec::new());
    for ((k, j, i), &x) in xg3.indexed_iter() {
        let (y, z) = (yg3[[k, j, i]], zg3[[k, j, i]]);
        if within_window(x, y, z, zsize, rmax) {
            voxels.push(VoxelIndex { x: i, y: j, z: k });
            xs.push(x);
            ys.push(y);
            zs.push(z);
        }
    }
    debug!("Populating {} of {} voxels", voxels.len(), shape.0 * shape.1 * shape.2);

    let mut fields = galaxy_fields(
        model,
        frame,
        grid.to_kpc,
        vel_shift,
        &Array1::from(xs),
        &Array1::from(ys),
        &Array1::from(zs),
    )?;
    if let Some(transmission) = extinction_at(model, grid, &voxels) {
        fields.flux *= &transmission;
    }

    let mut flux = Array3::zeros(shape);
    let mut vobs = Array3::zeros(shape);
    let mut sigma = Array3::zeros(shape);
    for (n, v) in voxels.iter().enumerate() {
        let idx = [v.z, v.y, v.x];
        flux[idx] = fields.flux[n];
        vobs[idx] = fields.vobs[n];
        sigma[idx] = fields.sigma[n];
    }

    let cube = populate_cube_indexed(&flux, &vobs, &sigma, vspec, &voxels)?;
    Ok(Projection {
        cube,
        nz: zsize.map_or(shape.0, |z| z.min(shape.0)),
        n_voxels: voxels.len(),
        contraction: fields.contraction,
    })
}

fn project_rotate(
    model: &ModelSet,
    grid: &SampledGrid,
    frame: &SkyFrame,
    vel_shift: f64,
    zsize: Option<usize>,
    vspec: &Array1<f64>,
) -> Result<Projection> {
    let n = grid.nz;
    let c = (n as f64 - 1.0) / 2.0;
    let rmax = grid.max_radius();

    let mut cells = Vec::new();
    let (mut xs, mut ys, mut zs) = (Vec::new(), Vec::new(), Vec::new());
    for k in 0..n {
        let z = k as f64 - c;
        for j in 0..n {
            let y = j as f64 - c;
            for i in 0..n {
                let x = i as f64 - c;
                if within_window(x, y, z, zsize, rmax) {
                    cells.push([k, j, i]);
                    xs.push(x);
                    ys.push(y);
                    zs.push(z);
                }
            }
        }
    }
    debug!("Rotate: {} of {} galaxy-frame cells populated", cells.len(), n * n * n);

    let fields = galaxy_fields(
        model,
        frame,
        grid.to_kpc,
        vel_shift,
        &Array1::from(xs),
        &Array1::from(ys),
        &Array1::from(zs),
    )?;

    let mut flux_gal = Array3::zeros((n, n, n));
    let mut vobs_gal = Array3::zeros((n, n, n));
    let mut sigma_gal = Array3::zeros((n, n, n));
    for (m, &idx) in cells.iter().enumerate() {
        flux_gal[idx] = fields.flux[m];
        vobs_gal[idx] = fields.vobs[m];
        sigma_gal[idx] = fields.sigma[m];
    }

    let shape = grid.shape();
    let mut flux = frame.resample_to_sky(&flux_gal, shape, grid.center);
    let vobs = frame.resample_to_sky(&vobs_gal, shape, grid.center);
    let sigma = frame.resample_to_sky(&sigma_gal, shape, grid.center);

    let lit: Vec<VoxelIndex> = flux
        .indexed_iter()
        .filter(|(_, f)| **f != 0.0)
        .map(|((k, j, i), _)| VoxelIndex { x: i, y: j, z: k })
        .collect();
    if let Some(transmission) = extinction_at(model, grid, &lit) {
        for (v, t) in lit.iter().zip(transmission.iter()) {
            flux[[v.z, v.y, v.x]] *= t;
        }
    }

    let cube = populate_cube(&flux, &vobs, &sigma, vspec)?;
    Ok(Projection {
        cube,
        nz: zsize.map_or(n, |z| z.min(n)),
        n_voxels: cells.len(),
        contraction: fields.contraction,
    })
}

/// Galaxy-frame coordinates in kpc of every voxel of the grid for `frame`
fn frame_coordinates(grid: &SampledGrid, frame: &SkyFrame) -> (Array1<f64>, Array1<f64>, Array1<f64>) {
    let (xg, yg, zg) = galaxy_grid(frame, grid.shape(), grid.center);
    let to_kpc = grid.to_kpc;
    (
        Array1::from_iter(xg.iter().map(|v| v * to_kpc)),
        Array1::from_iter(yg.iter().map(|v| v * to_kpc)),
        Array1::from_iter(zg.iter().map(|v| v * to_kpc)),
    )
}

fn add_outflows(model: &ModelSet, grid: &SampledGrid, vspec: &Array1<f64>, cube: &mut Array3<f64>) -> Result<()> {
    let os = grid.oversample as f64;
    for (name, outflow) in model.outflows() {
        match outflow {
            Outflow::Biconical(cone) => {
                let geometry = model.geometry(Context::Outflow).ok_or_else(|| {
                    GalkinError::Configuration(format!("outflow '{}' needs an outflow geometry", name))
                })?;
                let dispersion = model.dispersion(Context::Outflow).ok_or_else(|| {
                    GalkinError::Configuration(format!("outflow '{}' needs an outflow dispersion profile", name))
                })?;
                let frame = geometry.frame(os);
                let (x, y, z) = frame_coordinates(grid, &frame);

                let flux = cone.evaluate_3d(&x, &y, &z);
                let mut vobs = Array1::zeros(x.len());
                let mut r = Array1::zeros(x.len());
                Zip::from(&mut vobs)
                    .and(&mut r)
                    .and(&x)
                    .and(&y)
                    .and(&z)
                    .for_each(|vo, r, &x, &y, &z| {
                        *vo = cone.los_velocity(&frame, x, y, z) + geometry.vel_shift();
                        *r = (x * x + y * y + z * z).sqrt();
                    });
                let sigma = dispersion.evaluate(&r);

                let shape = grid.shape();
                let contribution = populate_cube(
                    &Array3::from_shape_vec(shape, flux.to_vec())?,
                    &Array3::from_shape_vec(shape, vobs.to_vec())?,
                    &Array3::from_shape_vec(shape, sigma.to_vec())?,
                    vspec,
                )?;
                *cube += &contribution;
            }
            Outflow::Unresolved(line) => {
                let geometry = model
                    .geometry(Context::Outflow)
                    .or_else(|| model.geometry(Context::Galaxy))
                    .ok_or_else(|| {
                        GalkinError::Configuration(format!("outflow '{}' needs a geometry", name))
                    })?;
                let (_, yc, xc) = grid.center;
                let x = (xc + geometry.xshift() * os).round();
                let y = (yc + geometry.yshift() * os).round();
                if x < 0.0 || y < 0.0 || x >= grid.nx as f64 || y >= grid.ny as f64 {
                    debug!("Unresolved outflow '{}' falls outside the grid", name);
                    continue;
                }
                let spectrum = line.spectrum(vspec, geometry.vel_shift());
                let mut column = cube.slice_mut(s![.., y as usize, x as usize]);
                column += &spectrum;
            }
        }
    }
    Ok(())
}

fn add_flows(model: &ModelSet, grid: &SampledGrid, vspec: &Array1<f64>, cube: &mut Array3<f64>) -> Result<()> {
    for (name, flow) in model.flows() {
        let Flow::PlanarRadial(planar) = flow else {
            continue;
        };
        let geometry = model
            .geometry(Context::Flow)
            .ok_or_else(|| GalkinError::Configuration(format!("flow '{}' needs a flow geometry", name)))?;
        let dispersion = model.dispersion(Context::Flow).ok_or_else(|| {
            GalkinError::Configuration(format!("flow '{}' needs a flow dispersion profile", name))
        })?;
        let frame = geometry.frame(grid.oversample as f64);
        let (x, y, z) = frame_coordinates(grid, &frame);

        let flux = planar.evaluate_3d(&x, &y, &z);
        let mut vobs = Array1::zeros(x.len());
        let mut r = Array1::zeros(x.len());
        Zip::from(&mut vobs)
            .and(&mut r)
            .and(&x)
            .and(&y)
            .for_each(|vo, r, &x, &y| {
                *vo = planar.los_velocity(&frame, x, y) + geometry.vel_shift();
                *r = x.hypot(y);
            });
        let sigma = dispersion.evaluate(&r);

        let shape = grid.shape();
        let contribution = populate_cube(
            &Array3::from_shape_vec(shape, flux.to_vec())?,
            &Array3::from_shape_vec(shape, vobs.to_vec())?,
            &Array3::from_shape_vec(shape, sigma.to_vec())?,
            vspec,
        )?;
        *cube += &contribution;
    }
    Ok(())
}
