//! Cube population kernel.
//!
//! Every voxel contributes a Gaussian line profile, normalized to its own sum
//! over the spectral axis and scaled by the voxel flux. Contributions are
//! summed along the line of sight. Rows of the output are filled in parallel
//! into a `(ny, nx, nspec)` buffer that is permuted to `(nspec, ny, nx)` at the
//! end.

use ndarray::{Array1, Array3, ArrayViewMut2, Axis, ErrorKind, ShapeError};
use rayon::prelude::*;

use crate::error::{GalkinError, Result};

/// Position of one voxel in a `(nz, ny, nx)` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VoxelIndex {
    pub x: usize,
    pub y: usize,
    pub z: usize,
}

fn check_shapes(flux: &Array3<f64>, vobs: &Array3<f64>, sigma: &Array3<f64>) -> Result<()> {
    if flux.dim() != vobs.dim() || flux.dim() != sigma.dim() {
        return Err(ShapeError::from_kind(ErrorKind::IncompatibleShape).into());
    }
    Ok(())
}

/// Add one voxel's normalized line profile to `spectrum`
#[inline]
fn add_line(spectrum: &mut [f64], vspec: &[f64], flux: f64, vobs: f64, sigma: f64) {
    if flux == 0.0 || !flux.is_finite() {
        return;
    }
    if !(sigma > 0.0) {
        // unresolved line: everything in the nearest channel
        let nearest = vspec
            .iter()
            .enumerate()
            .min_by(|a, b| (a.1 - vobs).abs().total_cmp(&(b.1 - vobs).abs()))
            .map(|(k, _)| k);
        if let Some(k) = nearest {
            spectrum[k] += flux;
        }
        return;
    }
    let mut norm = 0.0;
    for &v in vspec {
        norm += (-0.5 * ((v - vobs) / sigma).powi(2)).exp();
    }
    if norm == 0.0 || !norm.is_finite() {
        norm = 1.0;
    }
    let scale = flux / norm;
    for (s, &v) in spectrum.iter_mut().zip(vspec) {
        *s += scale * (-0.5 * ((v - vobs) / sigma).powi(2)).exp();
    }
}

fn finish(buffer: Array3<f64>) -> Array3<f64> {
    buffer.permuted_axes([2, 0, 1]).as_standard_layout().into_owned()
}

/// Populate a `(nspec, ny, nx)` cube from `(nz, ny, nx)` flux, velocity and
/// dispersion fields. A 2D map is passed with `nz = 1`.
pub fn populate_cube(
    flux: &Array3<f64>,
    vobs: &Array3<f64>,
    sigma: &Array3<f64>,
    vspec: &Array1<f64>,
) -> Result<Array3<f64>> {
    check_shapes(flux, vobs, sigma)?;
    let (nz, ny, nx) = flux.dim();
    let vspec = vspec.to_vec();
    let mut buffer = Array3::<f64>::zeros((ny, nx, vspec.len()));

    buffer
        .axis_iter_mut(Axis(0))
        .into_par_iter()
        .enumerate()
        .for_each(|(j, mut row): (usize, ArrayViewMut2<f64>)| {
            for i in 0..nx {
                let mut spectrum = row.row_mut(i);
                let Some(spectrum) = spectrum.as_slice_mut() else {
                    continue;
                };
                for k in 0..nz {
                    add_line(spectrum, &vspec, flux[[k, j, i]], vobs[[k, j, i]], sigma[[k, j, i]]);
                }
            }
        });

    Ok(finish(buffer))
}

/// [`populate_cube`] restricted to the listed voxels
pub fn populate_cube_indexed(
    flux: &Array3<f64>,
    vobs: &Array3<f64>,
    sigma: &Array3<f64>,
    vspec: &Array1<f64>,
    voxels: &[VoxelIndex],
) -> Result<Array3<f64>> {
    check_shapes(flux, vobs, sigma)?;
    let (nz, ny, nx) = flux.dim();

    let mut rows: Vec<Vec<(usize, usize)>> = vec![Vec::new(); ny];
    for v in voxels {
        if v.x >= nx || v.y >= ny || v.z >= nz {
            return Err(GalkinError::Configuration(format!(
                "voxel ({}, {}, {}) outside a ({}, {}, {}) grid",
                v.z, v.y, v.x, nz, ny, nx
            )));
        }
        rows[v.y].push((v.x, v.z));
    }

    let vspec = vspec.to_vec();
    let mut buffer = Array3::<f64>::zeros((ny, nx, vspec.len()));
    buffer
        .axis_iter_mut(Axis(0))
        .into_par_iter()
        .zip(rows.par_iter())
        .enumerate()
        .for_each(|(j, (mut row, bucket))| {
            for &(i, k) in bucket {
                let mut spectrum = row.row_mut(i);
                if let Some(spectrum) = spectrum.as_slice_mut() {
                    add_line(spectrum, &vspec, flux[[k, j, i]], vobs[[k, j, i]], sigma[[k, j, i]]);
                }
            }
        });

    Ok(finish(buffer))
}
