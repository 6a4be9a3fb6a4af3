//! Second-order sections
//!
//! Decomposes a digital zero-pole-gain system into a cascade of biquads using
//! "nearest" pairing: the pole closest to the unit circle is matched with the
//! zero closest to it, and sections are ordered so the highest-Q stage runs
//! last.

use std::cmp::Ordering;

use num_complex::Complex64;

use crate::error::DesignError;
use crate::zpk::{Zpk, poly2};

/// One biquad stage: `H(z) = (b0 + b1 z⁻¹ + b2 z⁻²) / (a0 + a1 z⁻¹ + a2 z⁻²)`.
///
/// `a[0]` is 1 for every section produced by [`zpk2sos`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Section {
    pub b: [f64; 3],
    pub a: [f64; 3],
}

impl Section {
    pub fn new(b: [f64; 3], a: [f64; 3]) -> Self {
        Self { b, a }
    }

    /// Complex response at `z`.
    pub fn response(&self, z: Complex64) -> Complex64 {
        let zi = z.inv();
        let zi2 = zi * zi;
        let num = zi2 * self.b[2] + zi * self.b[1] + self.b[0];
        let den = zi2 * self.a[2] + zi * self.a[1] + self.a[0];
        num / den
    }

    /// Gain at DC (`z = 1`).
    pub fn dc_gain(&self) -> f64 {
        self.b.iter().sum::<f64>() / self.a.iter().sum::<f64>()
    }

    /// All six coefficients in `[b0, b1, b2, a0, a1, a2]` order.
    pub fn coefficients(&self) -> [f64; 6] {
        [self.b[0], self.b[1], self.b[2], self.a[0], self.a[1], self.a[2]]
    }

    pub fn is_finite(&self) -> bool {
        self.coefficients().iter().all(|c| c.is_finite())
    }

    fn from_roots(zeros: &[Complex64], poles: &[Complex64], gain: f64) -> Self {
        let mut section = Self::new([0.0; 3], [0.0; 3]);

        let b = poly2(zeros);
        let offset = 3 - b.len();
        for (dst, c) in section.b[offset..].iter_mut().zip(&b) {
            *dst = gain * c;
        }

        let a = poly2(poles);
        let offset = 3 - a.len();
        section.a[offset..].copy_from_slice(&a);

        section
    }
}

/// Which kind of root a nearest-neighbour search may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RootKind {
    Any,
    Real,
    Complex,
}

fn is_real(x: &Complex64) -> bool {
    x.im == 0.0
}

/// Index into `from` of the root nearest to `to` restricted to `kind`.
fn nearest(from: &[Complex64], to: Complex64, kind: RootKind) -> Option<usize> {
    let mut order: Vec<usize> = (0..from.len()).collect();
    order.sort_by(|&a, &b| {
        (from[a] - to)
            .norm()
            .partial_cmp(&(from[b] - to).norm())
            .unwrap_or(Ordering::Equal)
    });

    order.into_iter().find(|&i| match kind {
        RootKind::Any => true,
        RootKind::Real => is_real(&from[i]),
        RootKind::Complex => !is_real(&from[i]),
    })
}

/// Split roots into one representative per conjugate pair (positive imaginary
/// part) followed by the real roots.
///
/// Pairs are matched within `100·ε·|z|` and averaged to remove rounding
/// asymmetry.
fn conjugate_pairs(roots: &[Complex64]) -> Result<Vec<Complex64>, DesignError> {
    let tol = 100.0 * f64::EPSILON;

    let mut sorted = roots.to_vec();
    sorted.sort_by(|a, b| {
        a.re.partial_cmp(&b.re)
            .unwrap_or(Ordering::Equal)
            .then(a.im.abs().partial_cmp(&b.im.abs()).unwrap_or(Ordering::Equal))
    });

    let (reals, complex): (Vec<Complex64>, Vec<Complex64>) = sorted
        .into_iter()
        .partition(|z| z.im.abs() <= tol * z.norm());

    let mut upper: Vec<Complex64> = complex.iter().copied().filter(|z| z.im > 0.0).collect();
    let mut lower: Vec<Complex64> = complex.iter().copied().filter(|z| z.im < 0.0).collect();
    if upper.len() != lower.len() {
        return Err(DesignError::Pairing("complex root without a conjugate"));
    }

    // Within runs of equal real part, order by imaginary magnitude so both
    // halves line up
    let mut start = 0;
    while start < upper.len() {
        let mut stop = start + 1;
        while stop < upper.len() && upper[stop].re - upper[stop - 1].re <= tol * upper[stop - 1].norm()
        {
            stop += 1;
        }
        for run in [&mut upper[start..stop], &mut lower[start..stop]] {
            run.sort_by(|a, b| a.im.abs().partial_cmp(&b.im.abs()).unwrap_or(Ordering::Equal));
        }
        start = stop;
    }

    let mut out = Vec::with_capacity(upper.len() + reals.len());
    for (zp, zn) in upper.iter().zip(&lower) {
        if (zp - zn.conj()).norm() > tol * zn.norm() {
            return Err(DesignError::Pairing("complex root without a conjugate"));
        }
        out.push((zp + zn.conj()) / 2.0);
    }
    out.extend(reals.into_iter().map(|z| Complex64::new(z.re, 0.0)));

    Ok(out)
}

/// Convert a digital zero-pole-gain system into second-order sections.
///
/// Sections are built worst pole first and then reversed. The overall gain
/// lands on the first section of the result, the lowest-Q stage.
pub fn zpk2sos(zpk: &Zpk) -> Result<Vec<Section>, DesignError> {
    if zpk.zeros.is_empty() && zpk.poles.is_empty() {
        return Ok(vec![Section::new([zpk.gain, 0.0, 0.0], [1.0, 0.0, 0.0])]);
    }

    let origin = Complex64::new(0.0, 0.0);
    let mut zeros = zpk.zeros.clone();
    let mut poles = zpk.poles.clone();
    let count = zeros.len().max(poles.len());
    zeros.resize(count, origin);
    poles.resize(count, origin);

    let n_sections = count.div_ceil(2);
    if count % 2 == 1 {
        zeros.push(origin);
        poles.push(origin);
    }

    let mut z = conjugate_pairs(&zeros)?;
    let mut p = conjugate_pairs(&poles)?;

    let mut sections = Vec::with_capacity(n_sections);
    for _ in 0..n_sections {
        // Worst remaining pole: closest to the unit circle
        let p1_idx = p
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                (1.0 - a.norm())
                    .abs()
                    .partial_cmp(&(1.0 - b.norm()).abs())
                    .unwrap_or(Ordering::Equal)
            })
            .map(|(i, _)| i)
            .ok_or(DesignError::Pairing("ran out of poles"))?;
        let p1 = p.remove(p1_idx);

        let p_reals = p.iter().filter(|x| is_real(x)).count();
        let z_reals = z.iter().filter(|x| is_real(x)).count();

        let section = if is_real(&p1) && p_reals == 0 {
            // Last real pole: pair with a real zero and pad to second order
            let z1_idx = nearest(&z, p1, RootKind::Real)
                .ok_or(DesignError::Pairing("no real zero for the last real pole"))?;
            let z1 = z.remove(z1_idx);
            Section::from_roots(&[z1, origin], &[p1, origin], 1.0)
        } else if p.len() + 1 == z.len() && !is_real(&p1) && p_reals == 1 && z_reals == 1 {
            // The remaining real zero must go with the remaining real pole
            let z1_idx = nearest(&z, p1, RootKind::Complex)
                .ok_or(DesignError::Pairing("no complex zero left"))?;
            let z1 = z.remove(z1_idx);
            Section::from_roots(&[z1, z1.conj()], &[p1, p1.conj()], 1.0)
        } else {
            let p2 = if is_real(&p1) {
                let real_idx: Vec<usize> = (0..p.len()).filter(|&i| is_real(&p[i])).collect();
                let candidates: Vec<Complex64> = real_idx.iter().map(|&i| p[i]).collect();
                let pick = nearest(&candidates, p1, RootKind::Real)
                    .ok_or(DesignError::Pairing("no real pole to pair with"))?;
                p.remove(real_idx[pick])
            } else {
                p1.conj()
            };

            match nearest(&z, p1, RootKind::Any) {
                Some(z1_idx) => {
                    let z1 = z.remove(z1_idx);
                    if !is_real(&z1) {
                        Section::from_roots(&[z1, z1.conj()], &[p1, p2], 1.0)
                    } else if z.is_empty() {
                        Section::from_roots(&[z1], &[p1, p2], 1.0)
                    } else {
                        let z2_idx = nearest(&z, p1, RootKind::Real)
                            .ok_or(DesignError::Pairing("no real zero to pair with"))?;
                        let z2 = z.remove(z2_idx);
                        Section::from_roots(&[z1, z2], &[p1, p2], 1.0)
                    }
                }
                None => Section::from_roots(&[], &[p1, p2], 1.0),
            }
        };
        sections.push(section);
    }

    if !p.is_empty() || !z.is_empty() {
        return Err(DesignError::Pairing("unpaired roots left over"));
    }

    sections.reverse();
    for c in &mut sections[0].b {
        *c *= zpk.gain;
    }

    Ok(sections)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn c(re: f64, im: f64) -> Complex64 {
        Complex64::new(re, im)
    }

    fn cascade_response(sections: &[Section], z: Complex64) -> Complex64 {
        sections.iter().map(|s| s.response(z)).product()
    }

    #[test]
    fn test_section_dc_gain() {
        let s = Section::new([1.0, 2.0, 1.0], [1.0, -0.5, 0.25]);
        assert!((s.dc_gain() - 4.0 / 0.75).abs() < 1e-12);
        let dc = s.response(c(1.0, 0.0));
        assert!((dc.re - s.dc_gain()).abs() < 1e-12);
    }

    #[test]
    fn test_conjugate_pairs_orders_complex_before_real() {
        let roots = [c(0.5, -0.2), c(-0.3, 0.0), c(0.5, 0.2), c(0.1, 0.0)];
        let pairs = conjugate_pairs(&roots).unwrap();
        assert_eq!(pairs, vec![c(0.5, 0.2), c(-0.3, 0.0), c(0.1, 0.0)]);
    }

    #[test]
    fn test_conjugate_pairs_rejects_lonely_root() {
        assert!(conjugate_pairs(&[c(0.5, 0.2), c(0.1, 0.0)]).is_err());
    }

    #[test]
    fn test_zpk2sos_empty_system_is_pure_gain() {
        let sos = zpk2sos(&Zpk::new(vec![], vec![], 0.5)).unwrap();
        assert_eq!(sos, vec![Section::new([0.5, 0.0, 0.0], [1.0, 0.0, 0.0])]);
    }

    #[test]
    fn test_zpk2sos_orders_worst_pole_last() {
        let zpk = Zpk::new(
            vec![c(-1.0, 0.0), c(-1.0, 0.0), c(0.0, 1.0), c(0.0, -1.0)],
            vec![c(0.5, 0.3), c(0.5, -0.3), c(0.6, 0.75), c(0.6, -0.75)],
            0.1,
        );
        let sos = zpk2sos(&zpk).unwrap();
        assert_eq!(sos.len(), 2);

        // Radius² of the pole pair is a2
        assert!(sos[1].a[2] > sos[0].a[2]);
        for s in &sos {
            assert_eq!(s.a[0], 1.0);
        }
        // The high-Q pair takes the zeros at ±j, the gain rides on the other
        assert!((sos[1].b[0] - 1.0).abs() < 1e-12);
        assert!(sos[1].b[1].abs() < 1e-12);
        assert!((sos[0].b[0] - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_zpk2sos_reproduces_transfer_function() {
        let zpk = Zpk::new(
            vec![c(-1.0, 0.0), c(0.2, 0.9), c(0.2, -0.9)],
            vec![c(0.3, 0.0), c(0.4, 0.5), c(0.4, -0.5)],
            0.05,
        );
        let sos = zpk2sos(&zpk).unwrap();
        assert_eq!(sos.len(), 2);

        for k in 0..16 {
            let z = Complex64::from_polar(1.0, PI * k as f64 / 16.0);
            let want = zpk.eval(z);
            let got = cascade_response(&sos, z);
            assert!((want - got).norm() < 1e-12, "mismatch at bin {k}");
        }
    }
}
