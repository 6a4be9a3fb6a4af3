//! Zero-pole-gain representation and the transforms applied to it
//!
//! Frequencies are in the analog domain (rad/s) until [`Zpk::bilinear`]
//! maps the system onto the z-plane.

use num_complex::Complex64;

/// Transfer function as roots plus an overall real gain.
#[derive(Debug, Clone, PartialEq)]
pub struct Zpk {
    pub zeros: Vec<Complex64>,
    pub poles: Vec<Complex64>,
    pub gain: f64,
}

impl Zpk {
    pub fn new(zeros: Vec<Complex64>, poles: Vec<Complex64>, gain: f64) -> Self {
        Self { zeros, poles, gain }
    }

    /// Relative degree (poles minus zeros).
    pub fn degree(&self) -> i32 {
        self.poles.len() as i32 - self.zeros.len() as i32
    }

    /// Move a unit-cutoff low-pass prototype to cutoff `wo` (rad/s).
    pub fn lowpass_to_lowpass(self, wo: f64) -> Self {
        let degree = self.degree();
        Self {
            zeros: self.zeros.into_iter().map(|z| z * wo).collect(),
            poles: self.poles.into_iter().map(|p| p * wo).collect(),
            gain: self.gain * wo.powi(degree),
        }
    }

    /// Bilinear transform from the s-plane to the z-plane at sample rate `fs`.
    ///
    /// Zeros at infinity land on `z = -1` (Nyquist).
    pub fn bilinear(self, fs: f64) -> Self {
        let degree = self.degree();
        let fs2 = Complex64::new(2.0 * fs, 0.0);

        let num: Complex64 = self.zeros.iter().map(|&z| fs2 - z).product();
        let den: Complex64 = self.poles.iter().map(|&p| fs2 - p).product();
        let gain = self.gain * (num / den).re;

        let mut zeros: Vec<Complex64> = self
            .zeros
            .into_iter()
            .map(|z| (fs2 + z) / (fs2 - z))
            .collect();
        let poles = self
            .poles
            .into_iter()
            .map(|p| (fs2 + p) / (fs2 - p))
            .collect();

        for _ in 0..degree.max(0) {
            zeros.push(Complex64::new(-1.0, 0.0));
        }

        Self { zeros, poles, gain }
    }

    /// Evaluate `H(x)` for a complex argument (`s` or `z` depending on domain).
    pub fn eval(&self, x: Complex64) -> Complex64 {
        let num: Complex64 = self.zeros.iter().map(|&z| x - z).product();
        let den: Complex64 = self.poles.iter().map(|&p| x - p).product();
        num / den * self.gain
    }
}

/// Monic polynomial coefficients (highest power first) for up to two roots.
///
/// Conjugate or real root pairs give real coefficients; any residual
/// imaginary part from rounding is dropped.
pub(crate) fn poly2(roots: &[Complex64]) -> Vec<f64> {
    match roots {
        [] => vec![1.0],
        [r] => vec![1.0, -r.re],
        [r1, r2] => vec![1.0, -(r1 + r2).re, (r1 * r2).re],
        _ => unreachable!("second-order sections have at most two roots"),
    }
}
