//! Special functions used by the mass profiles.
//!
//! Gamma functions come from `statrs`; modified Bessel functions use the
//! polynomial approximations of Abramowitz & Stegun (9.8.1-9.8.8), accurate to
//! a few parts in 1e7, returned in exponentially scaled form so that products
//! like `I0(y) K0(y)` stay finite for large `y`.

use roots::{find_root_brent, SimpleConvergency};
use statrs::function::gamma::gamma_lr;

/// Regularized lower incomplete gamma function P(a, x), with P(a, x<=0) = 0
/// and P(a, inf) = 1.
pub fn gammainc(a: f64, x: f64) -> f64 {
    if x.is_nan() || a.is_nan() || a <= 0.0 {
        return f64::NAN;
    }
    if x <= 0.0 {
        return 0.0;
    }
    if x.is_infinite() {
        return 1.0;
    }
    gamma_lr(a, x)
}

/// Inverse of [`gammainc`] in `x`: the `x` with `P(a, x) = p`.
///
/// Solved with Brent's method on a bracket that always contains the root for
/// `p` in (0, 1).
pub fn gammaincinv(a: f64, p: f64) -> f64 {
    if !(a > 0.0) || !(0.0..=1.0).contains(&p) {
        return f64::NAN;
    }
    if p == 0.0 {
        return 0.0;
    }
    if p == 1.0 {
        return f64::INFINITY;
    }

    let mut hi = a.max(1.0);
    while gammainc(a, hi) < p {
        hi *= 2.0;
        if !hi.is_finite() {
            return f64::NAN;
        }
    }

    let mut convergency = SimpleConvergency {
        eps: 1e-14,
        max_iter: 200,
    };
    match find_root_brent(0.0, hi, |x: f64| gammainc(a, x) - p, &mut convergency) {
        Ok(x) => x,
        Err(err) => {
            log::debug!("gammaincinv({}, {}) did not converge: {:?}", a, p, err);
            f64::NAN
        }
    }
}

/// Sersic `b_n`, defined so that the effective radius encloses half the light
pub fn sersic_bn(n: f64) -> f64 {
    gammaincinv(2.0 * n, 0.5)
}

fn poly(t: f64, coeffs: &[f64]) -> f64 {
    coeffs.iter().rev().fold(0.0, |acc, &c| acc * t + c)
}

/// `exp(-x) I0(x)` for `x >= 0`
pub fn bessel_i0e(x: f64) -> f64 {
    let x = x.abs();
    if x <= 3.75 {
        let t = (x / 3.75).powi(2);
        let i0 = poly(
            t,
            &[1.0, 3.5156229, 3.0899424, 1.2067492, 0.2659732, 0.0360768, 0.0045813],
        );
        i0 * (-x).exp()
    } else {
        let t = 3.75 / x;
        poly(
            t,
            &[
                0.39894228,
                0.01328592,
                0.00225319,
                -0.00157565,
                0.00916281,
                -0.02057706,
                0.02635537,
                -0.01647633,
                0.00392377,
            ],
        ) / x.sqrt()
    }
}

/// `exp(-x) I1(x)` for `x >= 0`
pub fn bessel_i1e(x: f64) -> f64 {
    let x = x.abs();
    if x <= 3.75 {
        let t = (x / 3.75).powi(2);
        let i1 = x * poly(
            t,
            &[0.5, 0.87890594, 0.51498869, 0.15084934, 0.02658733, 0.00301532, 0.00032411],
        );
        i1 * (-x).exp()
    } else {
        let t = 3.75 / x;
        poly(
            t,
            &[
                0.39894228,
                -0.03988024,
                -0.00362018,
                0.00163801,
                -0.01031555,
                0.02282967,
                -0.02895312,
                0.01787654,
                -0.00420059,
            ],
        ) / x.sqrt()
    }
}

/// `exp(x) K0(x)` for `x > 0`
pub fn bessel_k0e(x: f64) -> f64 {
    if x <= 0.0 {
        return f64::INFINITY;
    }
    if x <= 2.0 {
        let t = (x / 2.0).powi(2);
        let i0 = bessel_i0e(x) * x.exp();
        let k0 = -(x / 2.0).ln() * i0
            + poly(
                t,
                &[-0.57721566, 0.42278420, 0.23069756, 0.03488590, 0.00262698, 0.00010750, 0.0000074],
            );
        k0 * x.exp()
    } else {
        let t = 2.0 / x;
        poly(
            t,
            &[1.25331414, -0.07832358, 0.02189568, -0.01062446, 0.00587872, -0.00251540, 0.00053208],
        ) / x.sqrt()
    }
}

/// `exp(x) K1(x)` for `x > 0`
pub fn bessel_k1e(x: f64) -> f64 {
    if x <= 0.0 {
        return f64::INFINITY;
    }
    if x <= 2.0 {
        let t = (x / 2.0).powi(2);
        let i1 = bessel_i1e(x) * x.exp();
        let xk1 = x * (x / 2.0).ln() * i1
            + poly(
                t,
                &[1.0, 0.15443144, -0.67278579, -0.18156897, -0.01919402, -0.00110404, -0.00004686],
            );
        xk1 / x * x.exp()
    } else {
        let t = 2.0 / x;
        poly(
            t,
            &[1.25331414, 0.23498619, -0.03655620, 0.01504268, -0.00780353, 0.00325614, -0.00068245],
        ) / x.sqrt()
    }
}

/// Gauss hypergeometric function 2F1(a, b; c; z) for `z <= 0`.
///
/// Uses the Pfaff transformation to map `z` into `[0, 1)` and sums the power
/// series there. The series is capped at 10000 terms; arguments close to the
/// branch point converge slowly and are returned at the truncation.
pub fn hyp2f1_negative(a: f64, b: f64, c: f64, z: f64) -> f64 {
    if z > 0.0 {
        return f64::NAN;
    }
    // 2F1(a,b;c;z) = (1-z)^(-b) 2F1(c-a, b; c; z/(z-1))
    let w = z / (z - 1.0);
    let prefactor = (1.0 - z).powf(-b);
    let a2 = c - a;

    let mut term = 1.0;
    let mut sum = 1.0;
    for k in 0..10_000 {
        let kf = k as f64;
        term *= (a2 + kf) * (b + kf) / ((c + kf) * (kf + 1.0)) * w;
        sum += term;
        if term.abs() < 1e-15 * sum.abs() {
            break;
        }
    }
    prefactor * sum
}
