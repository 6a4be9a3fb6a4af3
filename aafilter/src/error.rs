//! Error types for filter design, emission and header splicing

use crate::design::FilterSpec;

/// Failure to turn a specification into a filter.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DesignError {
    /// A parameter is out of its valid domain
    #[error("invalid filter specification: {0}")]
    InvalidSpec(String),

    /// Ripple and attenuation cannot both be met
    #[error("cannot design a filter with rp = {rpass} dB and rs = {rstop} dB")]
    Infeasible { rpass: f64, rstop: f64 },

    /// An iterative routine failed to converge
    #[error("{0} did not converge")]
    NoConvergence(&'static str),

    /// Poles or zeros could not be grouped into sections
    #[error("cannot pair roots into second-order sections: {0}")]
    Pairing(&'static str),

    /// The finished design contains NaN or infinite coefficients
    #[error("design produced non-finite coefficients")]
    NonFinite,
}

/// Design failure annotated with the specification that caused it.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("failed to design filter {spec}")]
pub struct SpecError {
    pub spec: FilterSpec,
    #[source]
    pub source: DesignError,
}

/// Rejected emitter input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EmitError {
    #[error("filter {sample_rate}x{oversampling} has no sections")]
    EmptyCascade { sample_rate: u32, oversampling: u32 },

    #[error("filter {sample_rate}x{oversampling} section {section} has a non-finite coefficient")]
    NonFinite {
        sample_rate: u32,
        oversampling: u32,
        section: usize,
    },

    #[error("formatting failed")]
    Format(#[from] std::fmt::Error),
}

/// Malformed region markers in a header.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpliceError {
    #[error("line {line}: unknown region '{name}'")]
    UnknownRegion { name: String, line: usize },

    #[error("line {line}: region opened inside region '{open}'")]
    Nested { open: String, line: usize },

    #[error("line {line}: region '{region}' is never closed")]
    Unterminated { region: String, line: usize },

    #[error("line {line}: end marker without an open region")]
    UnexpectedEnd { line: usize },
}
