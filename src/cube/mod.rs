//! Spectral cube simulation.
//!
//! [`ModelSet::simulate_cube`](crate::model_set::ModelSet::simulate_cube) projects a model onto an
//! oversampled sky grid and fills a `(nspec, ny, nx)` cube with the
//! [`kernel`]. The configuration types here are plain serde structs.

use ndarray::{Array1, Array3};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::constants::C_KMS;
use crate::error::{GalkinError, Result};
use crate::kinematics::ContractionReport;

pub mod grid;
pub mod kernel;
mod simulate;

pub use grid::SampledGrid;
pub use kernel::{populate_cube, populate_cube_indexed, VoxelIndex};
pub(crate) use simulate::simulate;

/// Unit of the spectral axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpectralType {
    #[default]
    Velocity,
    Wavelength,
}

/// Regularly spaced spectral axis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectralAxis {
    pub spec_type: SpectralType,
    pub start: f64,
    pub step: f64,
    pub nspec: usize,
    /// Label of the axis unit, carried through untouched
    pub unit: String,
    /// Rest wavelength of the line for a wavelength axis
    pub line_center: Option<f64>,
}

impl Default for SpectralAxis {
    fn default() -> Self {
        Self {
            spec_type: SpectralType::Velocity,
            start: -1000.0,
            step: 10.0,
            nspec: 201,
            unit: "km/s".to_string(),
            line_center: None,
        }
    }
}

impl SpectralAxis {
    /// Channel values in the axis unit
    pub fn values(&self) -> Array1<f64> {
        Array1::from_shape_fn(self.nspec, |k| self.start + k as f64 * self.step)
    }

    /// Channel values as velocities [km/s]
    pub fn velocities(&self) -> Result<Array1<f64>> {
        match self.spec_type {
            SpectralType::Velocity => Ok(self.values()),
            SpectralType::Wavelength => {
                let lc = self.line_center.ok_or_else(|| {
                    GalkinError::Configuration("a wavelength axis needs line_center".to_string())
                })?;
                Ok(self.values().mapv(|l| (l - lc) / lc * C_KMS))
            }
        }
    }
}

/// How galaxy-frame fields are placed on the sky grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformMethod {
    /// Transform every sky voxel into the galaxy frame
    #[default]
    Direct,
    /// Evaluate on a cubic galaxy-frame grid and resample onto the sky
    Rotate,
}

impl FromStr for TransformMethod {
    type Err = GalkinError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "direct" => Ok(TransformMethod::Direct),
            "rotate" => Ok(TransformMethod::Rotate),
            other => Err(GalkinError::Configuration(format!(
                "transform method '{}' not recognized; expected 'direct' or 'rotate'",
                other
            ))),
        }
    }
}

/// Everything [`crate::model_set::ModelSet::simulate_cube`] needs besides the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub nx_sky: usize,
    pub ny_sky: usize,
    /// Arcsec per sky pixel
    pub rstep: f64,
    /// Arcsec per kpc
    pub dscale: f64,
    pub spectral: SpectralAxis,
    pub oversample: usize,
    pub oversize: usize,
    /// Centre in sky pixels; the grid middle when unset
    pub xcenter: Option<f64>,
    pub ycenter: Option<f64>,
    pub transform_method: TransformMethod,
    /// Only populate voxels near the midplane
    pub zcalc_truncate: bool,
    pub n_wholepix_z_min: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            nx_sky: 37,
            ny_sky: 37,
            rstep: 0.125,
            dscale: 8.0,
            spectral: SpectralAxis::default(),
            oversample: 1,
            oversize: 1,
            xcenter: None,
            ycenter: None,
            transform_method: TransformMethod::Direct,
            zcalc_truncate: true,
            n_wholepix_z_min: 3,
        }
    }
}

impl SimulationConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// What happened during a simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationDiagnostics {
    /// `(nz, ny, nx)` of the sampled grid
    pub grid_shape: (usize, usize, usize),
    /// Number of z planes actually populated
    pub nz: usize,
    pub n_voxels_populated: usize,
    pub contraction: Option<ContractionReport>,
    /// The drift term fell back to `Re = 1`, `n = 1`
    pub pressure_support_defaulted: bool,
}

/// Output of a simulation
#[derive(Debug, Clone)]
pub struct SimulatedCube {
    /// `(nspec, ny, nx)` on the sampled grid
    pub cube: Array3<f64>,
    /// Spectral axis in the requested unit
    pub spec: Array1<f64>,
    pub diagnostics: SimulationDiagnostics,
}
