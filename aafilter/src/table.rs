//! Up/down anti-aliasing filter tables for a set of common sample rates
//!
//! For each rate an oversampling factor is chosen so the oversampled rate
//! clears a minimum, then two filters are designed: one for upsampling, whose
//! stopband keeps the client's multiplied bandwidth out of the aliased audio
//! band, and one for downsampling, whose stopband folds everything above the
//! audio band.

use std::collections::BTreeMap;
use std::fmt::Write as FmtWrite;
use std::str::FromStr;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::design::{FilterCascade, FilterSpec, design_spec};
use crate::emit::{EmitStyle, write_cases};
use crate::error::{EmitError, SpecError};

/// Sample rates a table covers unless configured otherwise.
pub const COMMON_SAMPLE_RATES: [u32; 15] = [
    8000, 11025, 12000, 22050, 24000, 44100, 48000, 88200, 96000, 176400, 192000, 352800, 384000,
    705600, 768000,
];

/// Passband corner as a fraction of the base rate when the audio band does
/// not fit below Nyquist.
const PASSBAND_FRACTION: f64 = 0.475;

/// Parameters for a full filter table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Band kept free of aliasing, in Hz
    pub audio_bandwidth: f64,
    /// Highest multiple of the audio band the client process may generate
    pub max_bandwidth_multiple: f64,
    /// Oversampled rate must reach `audio_bandwidth × 2 × this`
    pub oversampled_rate_multiple: f64,
    /// Maximum passband ripple in dB
    pub rpass: f64,
    /// Minimum stopband attenuation in dB
    pub rstop: f64,
    pub sample_rates: Vec<u32>,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            audio_bandwidth: 20000.0,
            max_bandwidth_multiple: 3.0,
            oversampled_rate_multiple: 3.0,
            rpass: 0.1,
            rstop: 100.0,
            sample_rates: COMMON_SAMPLE_RATES.to_vec(),
        }
    }
}

impl TableConfig {
    pub fn min_oversampled_rate(&self) -> f64 {
        self.audio_bandwidth * 2.0 * self.oversampled_rate_multiple
    }

    /// Filter specifications for one base rate.
    pub fn plan(&self, sample_rate: u32) -> RatePlan {
        let fs = sample_rate as f64;
        let oversampling = ((self.min_oversampled_rate() / fs).ceil() as u32).max(1);
        let rate = fs * oversampling as f64;

        let fpass = self.audio_bandwidth.min(PASSBAND_FRACTION * fs);
        let critical_bw = if fpass >= self.audio_bandwidth {
            fpass
        } else {
            fs / 2.0
        };
        let up_fstop = (rate / 2.0).min((rate - critical_bw) / self.max_bandwidth_multiple);
        let down_fstop = (rate / 2.0).min(fs - critical_bw);

        RatePlan {
            sample_rate,
            oversampling,
            up: FilterSpec::new(sample_rate, oversampling, fpass, up_fstop, self.rpass, self.rstop),
            down: FilterSpec::new(sample_rate, oversampling, fpass, down_fstop, self.rpass, self.rstop),
        }
    }
}

/// Specifications of the filter pair for one base rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatePlan {
    pub sample_rate: u32,
    pub oversampling: u32,
    pub up: FilterSpec,
    pub down: FilterSpec,
}

/// Designed filters for every configured rate, in configuration order.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterTable {
    pub oversampling_factors: Vec<(u32, u32)>,
    pub up_filters: Vec<FilterCascade>,
    pub down_filters: Vec<FilterCascade>,
    pub max_num_sections: usize,
}

impl FilterTable {
    /// Design the whole table. Filters are designed in parallel.
    pub fn design(config: &TableConfig) -> Result<Self, SpecError> {
        let plans: Vec<RatePlan> = config.sample_rates.iter().map(|&fs| config.plan(fs)).collect();

        let designed: Vec<(FilterCascade, FilterCascade)> = plans
            .par_iter()
            .map(|plan| Ok((design_checked(&plan.up)?, design_checked(&plan.down)?)))
            .collect::<Result<_, SpecError>>()?;

        let (up_filters, down_filters): (Vec<_>, Vec<_>) = designed.into_iter().unzip();
        let max_num_sections = up_filters
            .iter()
            .chain(&down_filters)
            .map(FilterCascade::num_sections)
            .max()
            .unwrap_or(0);

        tracing::info!(
            "Designed {} filter pairs, at most {} sections",
            plans.len(),
            max_num_sections
        );

        Ok(Self {
            oversampling_factors: plans.iter().map(|p| (p.sample_rate, p.oversampling)).collect(),
            up_filters,
            down_filters,
            max_num_sections,
        })
    }

    /// Render one generated region.
    pub fn render(&self, region: Region, style: &EmitStyle) -> Result<String, EmitError> {
        let mut out = String::new();
        match region {
            Region::MaxSections => {
                writeln!(out, "static constexpr int kMaxNumSections = {};", self.max_num_sections)?;
            }
            Region::SampleRateId => {
                let mut rates: Vec<u32> = self.oversampling_factors.iter().map(|&(fs, _)| fs).collect();
                rates.sort_unstable_by(|a, b| b.cmp(a));
                for fs in &rates {
                    writeln!(out, "else if ({fs} <= sample_rate) return {fs};")?;
                }
                if let Some(min) = rates.last() {
                    writeln!(out, "else return {min};")?;
                }
            }
            Region::OversamplingFactors => {
                let mut factors = self.oversampling_factors.clone();
                factors.sort_unstable();
                for (fs, os) in factors {
                    writeln!(out, "case {fs}: return {os};")?;
                }
            }
            Region::UpFilters => write_cases(&mut out, &self.up_filters, style)?,
            Region::DownFilters => write_cases(&mut out, &self.down_filters, style)?,
        }
        Ok(out)
    }

    /// Render every region, keyed by region.
    pub fn render_all(&self, style: &EmitStyle) -> Result<BTreeMap<Region, String>, EmitError> {
        Region::ALL
            .iter()
            .map(|&region| Ok((region, self.render(region, style)?)))
            .collect()
    }
}

fn design_checked(spec: &FilterSpec) -> Result<FilterCascade, SpecError> {
    design_spec(spec).map_err(|source| SpecError { spec: *spec, source })
}

/// A generated span of the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Region {
    MaxSections,
    SampleRateId,
    OversamplingFactors,
    UpFilters,
    DownFilters,
}

impl Region {
    pub const ALL: [Region; 5] = [
        Region::MaxSections,
        Region::SampleRateId,
        Region::OversamplingFactors,
        Region::UpFilters,
        Region::DownFilters,
    ];

    /// Name used in region markers.
    pub fn name(self) -> &'static str {
        match self {
            Region::MaxSections => "max-sections",
            Region::SampleRateId => "sample-rate-id",
            Region::OversamplingFactors => "oversampling-factors",
            Region::UpFilters => "up-filters",
            Region::DownFilters => "down-filters",
        }
    }
}

impl FromStr for Region {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Region::ALL
            .iter()
            .copied()
            .find(|r| r.name() == s)
            .ok_or_else(|| s.to_string())
    }
}
