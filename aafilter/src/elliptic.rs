//! Elliptic (Cauer) low-pass design
//!
//! Digital frequencies are normalized so that 1.0 is the Nyquist frequency.
//! The analog prototype is built from the Jacobi elliptic functions, scaled to
//! the prewarped cutoff and mapped to the z-plane with the bilinear transform
//! at `fs = 2`, which is what makes `tan(π·w/2)` the prewarping rule.

use std::f64::consts::PI;

use num_complex::Complex64;

use crate::error::DesignError;
use crate::special::{arc_jac_sc1, ellipdeg, ellipj, ellipk};
use crate::zpk::Zpk;

/// Roots with a smaller magnitude than this are treated as exactly zero.
const EPSILON: f64 = 2e-16;

/// Bilinear transform rate matching the Nyquist = 1 normalization.
const DIGITAL_FS: f64 = 2.0;

fn check_tolerances(rpass: f64, rstop: f64) -> Result<(), DesignError> {
    if !(rpass.is_finite() && rpass > 0.0) {
        return Err(DesignError::InvalidSpec(format!(
            "passband ripple must be positive, got {rpass} dB"
        )));
    }
    if !(rstop.is_finite() && rstop > 0.0) {
        return Err(DesignError::InvalidSpec(format!(
            "stopband attenuation must be positive, got {rstop} dB"
        )));
    }
    if rpass > rstop {
        return Err(DesignError::InvalidSpec(format!(
            "passband ripple {rpass} dB exceeds stopband attenuation {rstop} dB"
        )));
    }
    Ok(())
}

/// Minimum elliptic low-pass order meeting the given band edges and tolerances.
///
/// `wp` and `ws` are normalized to Nyquist (`0 < wp < ws <= 1`). Returns the
/// order and the natural frequency to pass to [`ellip`].
///
/// A stopband edge at Nyquist prewarps to infinity, which yields order 0.
pub fn ellipord(wp: f64, ws: f64, rpass: f64, rstop: f64) -> Result<(usize, f64), DesignError> {
    check_tolerances(rpass, rstop)?;
    if !(wp > 0.0 && wp < ws && ws <= 1.0) {
        return Err(DesignError::InvalidSpec(format!(
            "band edges must satisfy 0 < wp < ws <= 1, got wp = {wp}, ws = {ws}"
        )));
    }

    let passb = (PI * wp / DIGITAL_FS).tan();
    let stopb = (PI * ws / DIGITAL_FS).tan();
    let nat = stopb / passb;

    let gstop = 10f64.powf(0.1 * rstop);
    let gpass = 10f64.powf(0.1 * rpass);
    let arg1 = ((gpass - 1.0) / (gstop - 1.0)).sqrt();
    let arg0 = 1.0 / nat;

    let d0 = [ellipk(arg0 * arg0), ellipk(1.0 - arg0 * arg0)];
    let d1 = [ellipk(arg1 * arg1), ellipk(1.0 - arg1 * arg1)];

    let order = (d0[0] * d1[1] / (d0[1] * d1[0])).ceil();
    if !order.is_finite() || order < 0.0 {
        return Err(DesignError::NoConvergence("order estimation"));
    }

    let wn = passb.atan() * 2.0 / PI;
    Ok((order as usize, wn))
}

/// Analog elliptic low-pass prototype with a passband edge of 1 rad/s.
///
/// For even orders the DC gain sits at the bottom of the passband ripple,
/// `-rpass` dB.
pub fn ellipap(order: usize, rpass: f64, rstop: f64) -> Result<Zpk, DesignError> {
    check_tolerances(rpass, rstop)?;

    match order {
        0 => return Ok(Zpk::new(vec![], vec![], 10f64.powf(-rpass / 20.0))),
        1 => {
            let p = -(1.0 / (10f64.powf(0.1 * rpass) - 1.0)).sqrt();
            return Ok(Zpk::new(vec![], vec![Complex64::new(p, 0.0)], -p));
        }
        _ => {}
    }

    let eps_sq = 10f64.powf(0.1 * rpass) - 1.0;
    let eps = eps_sq.sqrt();
    let ck1_sq = eps_sq / (10f64.powf(0.1 * rstop) - 1.0);
    if ck1_sq == 0.0 {
        return Err(DesignError::Infeasible { rpass, rstop });
    }

    let k1 = ellipk(ck1_sq);
    let m = ellipdeg(order, ck1_sq);
    let capk = ellipk(m);

    let n = order as f64;
    let jacobi: Vec<_> = ((1 - order % 2)..order)
        .step_by(2)
        .map(|j| ellipj(j as f64 * capk / n, m))
        .collect();

    let mut zeros: Vec<Complex64> = jacobi
        .iter()
        .filter(|j| j.sn.abs() > EPSILON)
        .map(|j| Complex64::new(0.0, 1.0 / (m.sqrt() * j.sn)))
        .collect();
    let conj: Vec<Complex64> = zeros.iter().map(|z| z.conj()).collect();
    zeros.extend(conj);

    let r = arc_jac_sc1(1.0 / eps, ck1_sq).ok_or(DesignError::NoConvergence("landen sequence"))?;
    let v0 = capk * r / (n * k1);
    let v = ellipj(v0, 1.0 - m);

    let mut poles: Vec<Complex64> = jacobi
        .iter()
        .map(|j| {
            let num = Complex64::new(j.cn * j.dn * v.sn * v.cn, j.sn * v.dn);
            -num / (1.0 - (j.dn * v.sn).powi(2))
        })
        .collect();

    let conj: Vec<Complex64> = if order % 2 == 1 {
        // The real pole has no partner
        let norm = poles.iter().map(|p| p.norm_sqr()).sum::<f64>().sqrt();
        poles
            .iter()
            .filter(|p| p.im.abs() > EPSILON * norm)
            .map(|p| p.conj())
            .collect()
    } else {
        poles.iter().map(|p| p.conj()).collect()
    };
    poles.extend(conj);

    let num: Complex64 = poles.iter().map(|p| -p).product();
    let den: Complex64 = zeros.iter().map(|z| -z).product();
    let mut gain = (num / den).re;
    if order % 2 == 0 {
        gain /= (1.0 + eps_sq).sqrt();
    }

    Ok(Zpk::new(zeros, poles, gain))
}

/// Digital elliptic low-pass filter in zero-pole-gain form.
///
/// `wn` is the passband edge normalized to Nyquist, as returned by
/// [`ellipord`].
pub fn ellip(order: usize, rpass: f64, rstop: f64, wn: f64) -> Result<Zpk, DesignError> {
    if !(wn > 0.0 && wn < 1.0) {
        return Err(DesignError::InvalidSpec(format!(
            "digital cutoff must lie in (0, 1), got {wn}"
        )));
    }

    let warped = 2.0 * DIGITAL_FS * (PI * wn / DIGITAL_FS).tan();
    let digital = ellipap(order, rpass, rstop)?
        .lowpass_to_lowpass(warped)
        .bilinear(DIGITAL_FS);

    Ok(digital)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db(x: f64) -> f64 {
        20.0 * x.log10()
    }

    fn digital_gain_db(zpk: &Zpk, w: f64) -> f64 {
        let z = Complex64::from_polar(1.0, PI * w);
        db(zpk.eval(z).norm())
    }

    #[test]
    fn test_ellipord_order_grows_with_attenuation() {
        let (n60, _) = ellipord(0.2, 0.25, 0.1, 60.0).unwrap();
        let (n100, _) = ellipord(0.2, 0.25, 0.1, 100.0).unwrap();
        assert!(n60 >= 1);
        assert!(n100 > n60);
    }

    #[test]
    fn test_ellipord_returns_passband_edge() {
        let (_, wn) = ellipord(0.3, 0.4, 0.5, 40.0).unwrap();
        assert!((wn - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_ellipord_nyquist_stopband_gives_zero_order() {
        let (n, _) = ellipord(20000.0 / 24000.0, 1.0, 0.1, 100.0).unwrap();
        assert_eq!(n, 0);
    }

    #[test]
    fn test_ellipord_rejects_bad_edges() {
        assert!(ellipord(0.4, 0.3, 0.1, 60.0).is_err());
        assert!(ellipord(0.0, 0.3, 0.1, 60.0).is_err());
        assert!(ellipord(0.2, 1.5, 0.1, 60.0).is_err());
        assert!(ellipord(0.2, 0.3, 0.0, 60.0).is_err());
        assert!(ellipord(0.2, 0.3, 70.0, 60.0).is_err());
    }

    #[test]
    fn test_ellipap_root_counts() {
        let even = ellipap(4, 0.5, 40.0).unwrap();
        assert_eq!(even.zeros.len(), 4);
        assert_eq!(even.poles.len(), 4);

        let odd = ellipap(5, 0.5, 40.0).unwrap();
        assert_eq!(odd.zeros.len(), 4);
        assert_eq!(odd.poles.len(), 5);
        assert_eq!(odd.poles.iter().filter(|p| p.im == 0.0).count(), 1);
    }

    #[test]
    fn test_ellipap_is_stable_with_imaginary_zeros() {
        let proto = ellipap(6, 0.1, 80.0).unwrap();
        for p in &proto.poles {
            assert!(p.re < 0.0, "pole {p} not in left half plane");
        }
        for z in &proto.zeros {
            assert!(z.re.abs() < 1e-12, "zero {z} not on imaginary axis");
            assert!(z.im.abs() > 1.0, "zero {z} inside passband");
        }
    }

    #[test]
    fn test_ellipap_even_order_dc_gain() {
        let rp = 0.5;
        let proto = ellipap(4, rp, 40.0).unwrap();
        let dc = proto.eval(Complex64::new(0.0, 0.0)).norm();
        assert!((db(dc) + rp).abs() < 1e-9);
    }

    #[test]
    fn test_ellipap_odd_order_dc_gain() {
        let proto = ellipap(3, 0.5, 40.0).unwrap();
        let dc = proto.eval(Complex64::new(0.0, 0.0)).norm();
        assert!(db(dc).abs() < 1e-9);
    }

    #[test]
    fn test_ellipap_low_orders() {
        let zero = ellipap(0, 1.0, 40.0).unwrap();
        assert!(zero.poles.is_empty() && zero.zeros.is_empty());
        assert!((db(zero.gain) + 1.0).abs() < 1e-12);

        let one = ellipap(1, 1.0, 40.0).unwrap();
        assert_eq!(one.poles.len(), 1);
        let dc = one.eval(Complex64::new(0.0, 0.0)).norm();
        assert!(db(dc).abs() < 1e-12);
    }

    #[test]
    fn test_ellip_meets_band_edges() {
        let (wp, ws, rp, rs) = (0.2, 0.3, 0.1, 70.0);
        let (n, wn) = ellipord(wp, ws, rp, rs).unwrap();
        let zpk = ellip(n, rp, rs, wn).unwrap();

        assert!(digital_gain_db(&zpk, wp) >= -rp - 1e-6);
        assert!(digital_gain_db(&zpk, ws) <= -rs + 1e-6);
        for p in &zpk.poles {
            assert!(p.norm() < 1.0);
        }
    }

    #[test]
    fn test_ellip_rejects_cutoff_outside_band() {
        assert!(ellip(4, 0.1, 60.0, 0.0).is_err());
        assert!(ellip(4, 0.1, 60.0, 1.0).is_err());
    }
}
