//! A galaxy at a redshift: model set, optional instrument and observed data.
//!
//! [`Galaxy`] turns a [`ModelSet`] into model data shaped like the
//! observation and scores it. The instrument response is an injected
//! [`Convolver`]; this crate does not ship a PSF or LSF implementation.
//!
//! ```
//! use galkin_rs::galaxy::Galaxy;
//! use galkin_rs::model_set::ModelSet;
//!
//! let galaxy = Galaxy::new(1.5, ModelSet::new());
//! assert!(galaxy.dscale() > 0.0);
//! ```

use std::fmt::Debug;
use std::sync::Arc;

use log::{debug, warn};
use ndarray::{s, Array2, Array3, Zip};

use crate::cosmology::FlatLambdaCdm;
use crate::cube::{SimulationConfig, SpectralType};
use crate::error::{GalkinError, Result};
use crate::model_set::ModelSet;
use crate::utils::sqrt_clipped;

/// Instrument response applied to the rebinned model cube
pub trait Convolver: Debug + Send + Sync {
    /// Convolve a `(nspec, ny, nx)` cube. `spec_center` is the line centre for
    /// wavelength axes.
    fn convolve(&self, cube: &Array3<f64>, spec_center: Option<f64>) -> Result<Array3<f64>>;
}

/// Uncertainties of a pair of moment maps
#[derive(Debug, Clone, PartialEq)]
pub struct MapErrors {
    pub velocity: Array2<f64>,
    pub dispersion: Array2<f64>,
}

/// Observation the model is compared against
#[derive(Debug, Clone, PartialEq)]
pub enum ObservedData {
    /// Spectral cube `(nspec, ny, nx)`
    Cube {
        data: Array3<f64>,
        error: Array3<f64>,
        mask: Array3<bool>,
        smoothing: bool,
    },
    /// Velocity and dispersion maps `(ny, nx)`
    Maps {
        velocity: Array2<f64>,
        dispersion: Array2<f64>,
        errors: MapErrors,
        mask: Array2<bool>,
    },
}

impl ObservedData {
    fn spatial_shape(&self) -> (usize, usize) {
        match self {
            ObservedData::Cube { data, .. } => {
                let (_, ny, nx) = data.dim();
                (ny, nx)
            }
            ObservedData::Maps { velocity, .. } => velocity.dim(),
        }
    }
}

/// Model output in the same layout as the observation
#[derive(Debug, Clone, PartialEq)]
pub enum ModelData {
    Cube(Array3<f64>),
    Maps {
        flux: Array2<f64>,
        velocity: Array2<f64>,
        dispersion: Array2<f64>,
    },
}

/// Galaxy with its kinematic model
#[derive(Debug, Clone)]
pub struct Galaxy {
    pub z: f64,
    pub cosmology: FlatLambdaCdm,
    pub model: ModelSet,
    pub instrument: Option<Arc<dyn Convolver>>,
    pub data: Option<ObservedData>,
}

impl Galaxy {
    pub fn new(z: f64, model: ModelSet) -> Self {
        Self {
            z,
            cosmology: FlatLambdaCdm::default(),
            model,
            instrument: None,
            data: None,
        }
    }

    pub fn with_cosmology(mut self, cosmology: FlatLambdaCdm) -> Self {
        self.cosmology = cosmology;
        self
    }

    pub fn with_instrument(mut self, instrument: Arc<dyn Convolver>) -> Self {
        self.instrument = Some(instrument);
        self
    }

    pub fn with_data(mut self, data: ObservedData) -> Self {
        self.data = Some(data);
        self
    }

    /// Angular scale at the galaxy redshift [arcsec/kpc]
    pub fn dscale(&self) -> f64 {
        self.cosmology.arcsec_per_kpc_proper(self.z)
    }

    /// Simulate the model and shape it like the observation.
    ///
    /// The configuration's `dscale` is replaced by the galaxy's own. The
    /// simulated cube is summed back over the oversampling, passed through the
    /// instrument, and cropped to the sky size. Without data the cube is
    /// returned as is.
    pub fn create_model_data(&self, config: &SimulationConfig) -> Result<ModelData> {
        let mut config = config.clone();
        config.dscale = self.dscale();

        if let Some(ObservedData::Cube { smoothing: true, .. }) = &self.data {
            return Err(GalkinError::NotImplemented(
                "smoothing of 3D data is not supported".to_string(),
            ));
        }

        let simulated = self.model.simulate_cube(&config)?;
        let rebinned = rebin_spatial(&simulated.cube, config.oversample.max(1));

        let spec_center = match config.spectral.spec_type {
            SpectralType::Wavelength => config.spectral.line_center,
            SpectralType::Velocity => None,
        };
        let convolved = match &self.instrument {
            Some(instrument) => instrument.convolve(&rebinned, spec_center)?,
            None => rebinned,
        };
        let mut cube = crop_center(&convolved, config.ny_sky, config.nx_sky)?;
        debug!("model cube {:?} at dscale {:.4}", cube.dim(), config.dscale);

        match &self.data {
            None => Ok(ModelData::Cube(cube)),
            Some(data) => {
                let (ny, nx) = data.spatial_shape();
                if (ny, nx) != (config.ny_sky, config.nx_sky) {
                    return Err(GalkinError::Configuration(format!(
                        "data is {}x{} but the simulation is {}x{}",
                        ny, nx, config.ny_sky, config.nx_sky
                    )));
                }
                match data {
                    ObservedData::Cube { data, error, mask, .. } => {
                        if data.dim() != cube.dim() {
                            return Err(GalkinError::Configuration(format!(
                                "data cube {:?} does not match model cube {:?}",
                                data.dim(),
                                cube.dim()
                            )));
                        }
                        normalize_spaxels(&mut cube, data, error, mask);
                        Ok(ModelData::Cube(cube))
                    }
                    ObservedData::Maps { .. } => {
                        let velocities = config.spectral.velocities()?;
                        Ok(moment_maps(&cube, velocities.as_slice().unwrap_or(&[])))
                    }
                }
            }
        }
    }

    /// Masked Gaussian log-likelihood of `model` against the observed data
    pub fn log_like(&self, model: &ModelData) -> Result<f64> {
        let data = self
            .data
            .as_ref()
            .ok_or_else(|| GalkinError::MissingCollaborator("the galaxy has no observed data".to_string()))?;

        match (data, model) {
            (ObservedData::Cube { data, error, mask, .. }, ModelData::Cube(cube)) => {
                if data.dim() != cube.dim() {
                    return Err(GalkinError::Configuration("model and data cubes differ in shape".to_string()));
                }
                let mut chisq = 0.0;
                Zip::from(data).and(error).and(mask).and(cube).for_each(|&d, &e, &m, &c| {
                    if m {
                        chisq += ((d - c) / e).powi(2);
                    }
                });
                Ok(-0.5 * chisq)
            }
            (
                ObservedData::Maps {
                    velocity: vdata,
                    dispersion: ddata,
                    errors,
                    mask,
                },
                ModelData::Maps {
                    velocity, dispersion, ..
                },
            ) => {
                if vdata.dim() != velocity.dim() {
                    return Err(GalkinError::Configuration("model and data maps differ in shape".to_string()));
                }
                let mut chisq = 0.0;
                Zip::from(vdata)
                    .and(&errors.velocity)
                    .and(mask)
                    .and(velocity)
                    .for_each(|&d, &e, &m, &v| {
                        if m {
                            chisq += ((d - v) / e).powi(2);
                        }
                    });
                Zip::from(ddata)
                    .and(&errors.dispersion)
                    .and(mask)
                    .and(dispersion)
                    .for_each(|&d, &e, &m, &s| {
                        if m {
                            chisq += ((d - s) / e).powi(2);
                        }
                    });
                Ok(-0.5 * chisq)
            }
            _ => Err(GalkinError::Configuration(
                "model data dimensionality does not match the observation".to_string(),
            )),
        }
    }

    /// Log posterior at the free-parameter vector `theta`.
    ///
    /// The model parameters are updated in place. Returns −∞ without
    /// simulating when the prior rules `theta` out.
    pub fn log_prob(&mut self, theta: &[f64], config: &SimulationConfig) -> Result<f64> {
        self.model.update_parameters(theta)?;
        let lprior = self.model.get_log_prior();
        if !lprior.is_finite() {
            return Ok(f64::NEG_INFINITY);
        }
        let model_data = self.create_model_data(config)?;
        let llike = self.log_like(&model_data)?;
        if llike.is_nan() {
            warn!("Non-finite model data; rejecting parameter vector");
            return Ok(f64::NEG_INFINITY);
        }
        Ok(lprior + llike)
    }
}

/// Sum `factor × factor` spatial blocks
fn rebin_spatial(cube: &Array3<f64>, factor: usize) -> Array3<f64> {
    if factor <= 1 {
        return cube.clone();
    }
    let (nspec, ny, nx) = cube.dim();
    let (nyb, nxb) = (ny / factor, nx / factor);
    let mut out = Array3::zeros((nspec, nyb, nxb));
    for ((k, j, i), &v) in cube.indexed_iter() {
        let (jb, ib) = (j / factor, i / factor);
        if jb < nyb && ib < nxb {
            out[[k, jb, ib]] += v;
        }
    }
    out
}

fn crop_center(cube: &Array3<f64>, ny: usize, nx: usize) -> Result<Array3<f64>> {
    let (_, nyc, nxc) = cube.dim();
    if nyc < ny || nxc < nx {
        return Err(GalkinError::Configuration(format!(
            "cube {}x{} is smaller than the requested {}x{}",
            nyc, nxc, ny, nx
        )));
    }
    let y0 = (nyc - ny) / 2;
    let x0 = (nxc - nx) / 2;
    Ok(cube.slice(s![.., y0..y0 + ny, x0..x0 + nx]).to_owned())
}

/// Scale each model spectrum by the factor minimizing its chi-square against the data
fn normalize_spaxels(cube: &mut Array3<f64>, data: &Array3<f64>, error: &Array3<f64>, mask: &Array3<bool>) {
    let (_, ny, nx) = cube.dim();
    for j in 0..ny {
        for i in 0..nx {
            let mut num = 0.0;
            let mut den = 0.0;
            Zip::from(cube.slice(s![.., j, i]))
                .and(data.slice(s![.., j, i]))
                .and(error.slice(s![.., j, i]))
                .and(mask.slice(s![.., j, i]))
                .for_each(|&m, &d, &e, &keep| {
                    if keep {
                        let w = 1.0 / (e * e);
                        num += d * m * w;
                        den += m * m * w;
                    }
                });
            if den > 0.0 {
                let scale = num / den;
                cube.slice_mut(s![.., j, i]).mapv_inplace(|v| v * scale);
            }
        }
    }
}

/// Flux, flux-weighted velocity and dispersion of each spaxel.
/// Empty spaxels get zero velocity and dispersion.
fn moment_maps(cube: &Array3<f64>, velocities: &[f64]) -> ModelData {
    let (_, ny, nx) = cube.dim();
    let mut flux = Array2::zeros((ny, nx));
    let mut velocity = Array2::zeros((ny, nx));
    let mut dispersion = Array2::zeros((ny, nx));
    for j in 0..ny {
        for i in 0..nx {
            let spectrum = cube.slice(s![.., j, i]);
            let f: f64 = spectrum.sum();
            if f == 0.0 {
                continue;
            }
            let v: f64 = spectrum.iter().zip(velocities).map(|(&c, &u)| c * u).sum::<f64>() / f;
            let var: f64 = spectrum
                .iter()
                .zip(velocities)
                .map(|(&c, &u)| c * (u - v).powi(2))
                .sum::<f64>()
                / f;
            flux[[j, i]] = f;
            velocity[[j, i]] = v;
            dispersion[[j, i]] = sqrt_clipped(var);
        }
    }
    ModelData::Maps {
        flux,
        velocity,
        dispersion,
    }
}
