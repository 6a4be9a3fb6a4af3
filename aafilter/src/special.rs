//! Elliptic integrals and Jacobi elliptic functions
//!
//! All functions take the parameter `m = k²` rather than the modulus `k`,
//! matching the usual numerical tables.

use std::f64::consts::{FRAC_PI_2, PI};

/// Machine epsilon used as the convergence threshold of the Landen sequences.
const MACHEP: f64 = 1.110_223_024_625_156_5e-16;

/// Maximum number of arithmetic-geometric mean steps.
const AGM_MAX_STEPS: usize = 64;

/// Maximum number of descending Landen steps for the inverse `sc` function.
const LANDEN_MAX_STEPS: usize = 10;

/// Values of the Jacobi elliptic functions at one argument.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Jacobi {
    pub sn: f64,
    pub cn: f64,
    pub dn: f64,
    /// Amplitude `φ` such that `sn = sin φ`.
    pub ph: f64,
}

impl Jacobi {
    fn nan() -> Self {
        Self {
            sn: f64::NAN,
            cn: f64::NAN,
            dn: f64::NAN,
            ph: f64::NAN,
        }
    }
}

fn agm(mut a: f64, mut b: f64) -> f64 {
    for _ in 0..AGM_MAX_STEPS {
        if (a - b).abs() <= MACHEP * a {
            break;
        }
        let next = 0.5 * (a + b);
        b = (a * b).sqrt();
        a = next;
    }
    a
}

/// Complete elliptic integral of the first kind, `K(m)`.
pub fn ellipk(m: f64) -> f64 {
    ellipkm1(1.0 - m)
}

/// `K(1 - p)`, accurate when `p` is close to zero.
pub fn ellipkm1(p: f64) -> f64 {
    if p.is_nan() || p < 0.0 {
        return f64::NAN;
    }
    if p == 0.0 {
        return f64::INFINITY;
    }
    FRAC_PI_2 / agm(1.0, p.sqrt())
}

/// Jacobi elliptic functions `sn`, `cn`, `dn` and the amplitude at `u`.
///
/// Uses the descending AGM scheme, with series expansions near `m = 0` and
/// `m = 1` where the scheme loses precision.
pub fn ellipj(u: f64, m: f64) -> Jacobi {
    if m.is_nan() || !(0.0..=1.0).contains(&m) {
        return Jacobi::nan();
    }

    if m < 1.0e-9 {
        let t = u.sin();
        let b = u.cos();
        let ai = 0.25 * m * (u - t * b);
        return Jacobi {
            sn: t - ai * b,
            cn: b + ai * t,
            dn: 1.0 - 0.5 * m * t * t,
            ph: u - ai,
        };
    }

    if m >= 0.999_999_999_9 {
        let ai = 0.25 * (1.0 - m);
        let b = u.cosh();
        let t = u.tanh();
        let phi = 1.0 / b;
        let twon = b * u.sinh();
        let sn = t + ai * (twon - u) / (b * b);
        let ph = 2.0 * u.exp().atan() - FRAC_PI_2 + ai * (twon - u) / b;
        let ai = ai * t * phi;
        return Jacobi {
            sn,
            cn: phi - ai * (twon - u),
            dn: phi + ai * (twon + u),
            ph,
        };
    }

    let mut a = [0.0f64; 9];
    let mut c = [0.0f64; 9];
    a[0] = 1.0;
    c[0] = m.sqrt();
    let mut b = (1.0 - m).sqrt();
    let mut twon = 1.0;
    let mut i = 0;

    while (c[i] / a[i]).abs() > MACHEP && i < 8 {
        let ai = a[i];
        i += 1;
        c[i] = 0.5 * (ai - b);
        let t = (ai * b).sqrt();
        a[i] = 0.5 * (ai + b);
        b = t;
        twon *= 2.0;
    }

    // Backward recurrence for the amplitude
    let mut phi = twon * a[i] * u;
    let mut prev = phi;
    while i > 0 {
        let t = c[i] * phi.sin() / a[i];
        prev = phi;
        phi = 0.5 * (t.asin() + phi);
        i -= 1;
    }

    let cn = phi.cos();
    Jacobi {
        sn: phi.sin(),
        cn,
        dn: cn / (phi - prev).cos(),
        ph: phi,
    }
}

fn complement(k: f64) -> f64 {
    ((1.0 - k) * (1.0 + k)).sqrt()
}

/// Imaginary part of `sn⁻¹(j·w, m)`, i.e. the real inverse of the Jacobi
/// `sc` function.
///
/// Evaluated by descending Landen transformation. Returns `None` if the
/// modulus sequence does not reach zero in time or `m` is out of range.
pub fn arc_jac_sc1(w: f64, m: f64) -> Option<f64> {
    let k = m.sqrt();
    if k.is_nan() || k > 1.0 {
        return None;
    }
    if k == 1.0 {
        // sn(u, 1) = tanh(u), so sn⁻¹(jw) = j·atan(w)
        return Some(w.atan());
    }

    let mut ks = vec![k];
    while let Some(&last) = ks.last() {
        if last == 0.0 {
            break;
        }
        if ks.len() > LANDEN_MAX_STEPS {
            return None;
        }
        let kp = complement(last);
        ks.push((1.0 - kp) / (1.0 + kp));
    }

    let capk: f64 = ks[1..].iter().map(|k| 1.0 + k).product::<f64>() * FRAC_PI_2;

    // Along the imaginary axis every iterate stays purely imaginary, so only
    // the imaginary part is tracked.
    let mut y = w;
    for pair in ks.windows(2) {
        let (kn, knext) = (pair[0], pair[1]);
        let ky = kn * y;
        y = 2.0 * y / ((1.0 + knext) * (1.0 + (1.0 + ky * ky).sqrt()));
    }

    // asin(j·y) = j·asinh(y)
    Some(capk * 2.0 / PI * y.asinh())
}

/// Solve the degree equation for the elliptic modulus.
///
/// Given the filter order and the discrimination parameter `m1`, returns the
/// selectivity parameter `m` via the nome series.
pub fn ellipdeg(order: usize, m1: f64) -> f64 {
    const SERIES_TERMS: i32 = 7;

    let k1 = ellipk(m1);
    let k1p = ellipkm1(m1);
    let q1 = (-PI * k1p / k1).exp();
    let q = q1.powf(1.0 / order as f64);

    let num: f64 = (0..=SERIES_TERMS).map(|i| q.powi(i * (i + 1))).sum();
    let den = 1.0 + 2.0 * (1..=SERIES_TERMS + 1).map(|i| q.powi(i * i)).sum::<f64>();

    16.0 * q * (num / den).powi(4)
}
