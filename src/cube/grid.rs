//! The oversampled simulation grid

use log::debug;

use crate::cube::{SimulationConfig, TransformMethod};
use crate::error::{GalkinError, Result};

/// Sizes, centres and pixel scale of the sampled sky grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampledGrid {
    pub nx: usize,
    pub ny: usize,
    pub nz: usize,
    /// Centre in sampled pixels, `(zc, yc, xc)`
    pub center: (f64, f64, f64),
    /// Arcsec per sampled pixel
    pub rstep_samp: f64,
    /// Kpc per sampled pixel
    pub to_kpc: f64,
    pub oversample: usize,
}

fn make_odd(n: usize) -> usize {
    if n % 2 == 0 {
        n + 1
    } else {
        n
    }
}

impl SampledGrid {
    pub fn new(config: &SimulationConfig) -> Result<Self> {
        if config.oversample == 0 || config.oversize == 0 {
            return Err(GalkinError::Configuration(
                "oversample and oversize must be at least 1".to_string(),
            ));
        }
        if !(config.rstep > 0.0 && config.dscale > 0.0) {
            return Err(GalkinError::Configuration(
                "rstep and dscale must be positive".to_string(),
            ));
        }
        let os = config.oversample;
        let nx = config.nx_sky * os * config.oversize;
        let ny = config.ny_sky * os * config.oversize;
        let nz = match config.transform_method {
            TransformMethod::Direct => nx.max(ny),
            TransformMethod::Rotate => make_odd(((nx * nx + ny * ny) as f64).sqrt().ceil() as usize),
        };

        // a given centre refers to the un-padded sky grid
        let pad_x = (config.oversize - 1) as f64 * (config.nx_sky * os) as f64 / 2.0;
        let pad_y = (config.oversize - 1) as f64 * (config.ny_sky * os) as f64 / 2.0;
        let xc = match config.xcenter {
            Some(c) => (c + 0.5) * os as f64 - 0.5 + pad_x,
            None => (nx as f64 - 1.0) / 2.0,
        };
        let yc = match config.ycenter {
            Some(c) => (c + 0.5) * os as f64 - 0.5 + pad_y,
            None => (ny as f64 - 1.0) / 2.0,
        };
        let zc = (nz as f64 - 1.0) / 2.0;

        let rstep_samp = config.rstep / os as f64;
        let grid = Self {
            nx,
            ny,
            nz,
            center: (zc, yc, xc),
            rstep_samp,
            to_kpc: rstep_samp / config.dscale,
            oversample: os,
        };
        debug!("Sampled grid: nz={}, ny={}, nx={}, {:.4} kpc/pix", nz, ny, nx, grid.to_kpc);
        Ok(grid)
    }

    pub fn shape(&self) -> (usize, usize, usize) {
        (self.nz, self.ny, self.nx)
    }

    /// Height of the populated z window in sampled pixels for a z-profile of
    /// scale length `h_z` [kpc]; always odd
    pub fn truncated_zsize(&self, h_z: f64, n_wholepix_z_min: usize) -> usize {
        let from_profile = (4.0 * h_z / self.to_kpc + 0.5).floor().max(0.0) as usize;
        make_odd(from_profile.max(n_wholepix_z_min * self.oversample))
    }

    /// In-plane radius beyond which voxels are not populated [pix]
    pub fn max_radius(&self) -> f64 {
        1.5 * (self.nx as f64).hypot(self.ny as f64) / 2.0
    }
}
