//! Linear interpolation on sorted tabulations.

use ndarray::Array1;

/// Linear interpolation with linear extrapolation beyond both ends.
///
/// `x` must be strictly increasing and have the same length as `y`. With a
/// single sample the constant is returned; with none, NaN.
pub fn interp_extrapolate(x: &[f64], y: &[f64], xi: f64) -> f64 {
    let n = x.len().min(y.len());
    match n {
        0 => return f64::NAN,
        1 => return y[0],
        _ => {}
    }

    // Index of the segment [x[i], x[i+1]] used for xi
    let i = x[..n].partition_point(|&v| v <= xi).clamp(1, n - 1) - 1;
    let (x0, x1) = (x[i], x[i + 1]);
    let (y0, y1) = (y[i], y[i + 1]);
    if x1 == x0 {
        return y0;
    }
    y0 + (xi - x0) * (y1 - y0) / (x1 - x0)
}

/// [`interp_extrapolate`] over an array of abscissae
pub fn interp_array(x: &[f64], y: &[f64], xi: &Array1<f64>) -> Array1<f64> {
    xi.mapv(|v| interp_extrapolate(x, y, v))
}
