//! Numerical utilities shared by the model components.

pub mod interp;
pub mod special;

pub use interp::{interp_array, interp_extrapolate};

/// Square root with negative arguments clipped to zero. NaN passes through.
#[inline]
pub fn sqrt_clipped(x: f64) -> f64 {
    if x < 0.0 {
        0.0
    } else {
        x.sqrt()
    }
}
