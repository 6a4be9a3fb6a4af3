//! Anti-aliasing filter designer
//!
//! Turns a [`FilterSpec`] into a [`FilterCascade`] of second-order sections.

use std::f64::consts::PI;
use std::fmt;

use num_complex::Complex64;

use crate::elliptic::{ellip, ellipord};
use crate::error::{DesignError, SpecError};
use crate::sos::{Section, zpk2sos};

/// Lowest order ever emitted. Degenerate specs estimate order 0.
pub const MIN_ORDER: usize = 2;

/// Requested anti-aliasing response for one sample rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterSpec {
    /// Base sampling rate in Hz
    pub sample_rate: u32,
    /// Oversampling factor (1 = none)
    pub oversampling: u32,
    /// Passband corner in Hz
    pub fpass: f64,
    /// Stopband corner in Hz
    pub fstop: f64,
    /// Maximum passband ripple in dB
    pub rpass: f64,
    /// Minimum stopband attenuation in dB
    pub rstop: f64,
}

impl FilterSpec {
    pub fn new(sample_rate: u32, oversampling: u32, fpass: f64, fstop: f64, rpass: f64, rstop: f64) -> Self {
        Self {
            sample_rate,
            oversampling,
            fpass,
            fstop,
            rpass,
            rstop,
        }
    }

    /// Rate the filter actually runs at.
    pub fn output_rate(&self) -> f64 {
        self.sample_rate as f64 * self.oversampling as f64
    }

    /// Check domain constraints.
    ///
    /// A stopband above the output Nyquist frequency is allowed; the designer
    /// clamps it.
    pub fn validate(&self) -> Result<(), DesignError> {
        if self.sample_rate == 0 {
            return Err(DesignError::InvalidSpec("sample rate must be positive".into()));
        }
        if self.oversampling == 0 {
            return Err(DesignError::InvalidSpec("oversampling factor must be at least 1".into()));
        }
        if !(self.fpass.is_finite() && self.fpass > 0.0) {
            return Err(DesignError::InvalidSpec(format!(
                "passband corner must be positive, got {} Hz",
                self.fpass
            )));
        }
        if !(self.fstop.is_finite() && self.fstop > self.fpass) {
            return Err(DesignError::InvalidSpec(format!(
                "stopband corner {} Hz must lie above passband corner {} Hz",
                self.fstop, self.fpass
            )));
        }
        let nyquist = self.output_rate() / 2.0;
        if self.fpass >= nyquist {
            return Err(DesignError::InvalidSpec(format!(
                "passband corner {} Hz must lie below Nyquist ({} Hz)",
                self.fpass, nyquist
            )));
        }
        if !(self.rpass.is_finite() && self.rpass > 0.0) {
            return Err(DesignError::InvalidSpec(format!(
                "passband ripple must be positive, got {} dB",
                self.rpass
            )));
        }
        if !(self.rstop.is_finite() && self.rstop > 0.0) {
            return Err(DesignError::InvalidSpec(format!(
                "stopband attenuation must be positive, got {} dB",
                self.rstop
            )));
        }
        Ok(())
    }
}

impl fmt::Display for FilterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(fs = {}, os = {}, fpass = {}, fstop = {}, rpass = {}, rstop = {})",
            self.sample_rate, self.oversampling, self.fpass, self.fstop, self.rpass, self.rstop
        )
    }
}

/// A designed filter, ready for emission.
///
/// `wpass` and `wstop` are normalized to the output rate (0.5 = Nyquist).
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCascade {
    pub sample_rate: u32,
    pub oversampling: u32,
    pub order: usize,
    pub wpass: f64,
    pub wstop: f64,
    /// Sections in the order they are applied
    pub sections: Vec<Section>,
}

impl FilterCascade {
    pub fn output_rate(&self) -> f64 {
        self.sample_rate as f64 * self.oversampling as f64
    }

    /// Achieved passband corner in Hz.
    pub fn fpass(&self) -> f64 {
        self.wpass * self.output_rate()
    }

    /// Stopband corner in Hz after clamping to Nyquist.
    pub fn fstop(&self) -> f64 {
        self.wstop * self.output_rate()
    }

    pub fn num_sections(&self) -> usize {
        self.sections.len()
    }

    /// Relative per-second computational load: sample rate × oversampling ×
    /// sections.
    pub fn cost(&self) -> u64 {
        self.sample_rate as u64 * self.oversampling as u64 * self.sections.len() as u64
    }

    /// Complex response of the whole cascade at `freq` Hz.
    pub fn response(&self, freq: f64) -> Complex64 {
        let z = Complex64::from_polar(1.0, 2.0 * PI * freq / self.output_rate());
        self.sections.iter().map(|s| s.response(z)).product()
    }

    /// Magnitude response in dB at `freq` Hz.
    pub fn gain_db(&self, freq: f64) -> f64 {
        20.0 * self.response(freq).norm().log10()
    }

    pub fn dc_gain_db(&self) -> f64 {
        let dc: f64 = self.sections.iter().map(Section::dc_gain).product();
        20.0 * dc.abs().log10()
    }
}

/// Design an elliptic low-pass for `spec`.
pub fn design_spec(spec: &FilterSpec) -> Result<FilterCascade, DesignError> {
    spec.validate()?;

    let rate = spec.output_rate();
    let wp = spec.fpass / rate;
    let ws = (spec.fstop / rate).min(0.5);

    // The order estimator works with Nyquist = 1
    let (estimated, wc) = ellipord(wp * 2.0, ws * 2.0, spec.rpass, spec.rstop)?;

    // Second-order sections make an odd order cost as much as the next even one
    let order = (2 * estimated.div_ceil(2)).max(MIN_ORDER);
    if estimated < MIN_ORDER {
        tracing::debug!(
            "{}x{}: estimated order {} raised to {}",
            spec.sample_rate,
            spec.oversampling,
            estimated,
            order
        );
    }

    let mut zpk = ellip(order, spec.rpass, spec.rstop, wc)?;
    if order % 2 == 0 {
        // Even-order prototypes sit at -rpass at DC
        zpk.gain *= 10f64.powf(spec.rpass / 20.0);
    }
    let sections = zpk2sos(&zpk)?;

    if !sections.iter().all(Section::is_finite) {
        return Err(DesignError::NonFinite);
    }

    tracing::debug!(
        "{}x{}: order {}, {} sections",
        spec.sample_rate,
        spec.oversampling,
        order,
        sections.len()
    );

    Ok(FilterCascade {
        sample_rate: spec.sample_rate,
        oversampling: spec.oversampling,
        order,
        wpass: wc / 2.0,
        wstop: ws,
        sections,
    })
}

/// Design an elliptic anti-aliasing low-pass.
///
/// # Arguments
/// * `fs` - Base sampling rate in Hz
/// * `oversampling` - Oversampling factor
/// * `fpass` - Passband corner in Hz
/// * `fstop` - Stopband corner in Hz (clamped to the oversampled Nyquist)
/// * `rpass` - Maximum passband ripple in dB
/// * `rstop` - Minimum stopband attenuation in dB
///
/// # Errors
///
/// Returns a [`SpecError`] naming the offending specification if the inputs
/// are out of range or the response cannot be realized.
pub fn design(
    fs: u32,
    oversampling: u32,
    fpass: f64,
    fstop: f64,
    rpass: f64,
    rstop: f64,
) -> Result<FilterCascade, SpecError> {
    let spec = FilterSpec::new(fs, oversampling, fpass, fstop, rpass, rstop);
    design_spec(&spec).map_err(|source| SpecError { spec, source })
}
