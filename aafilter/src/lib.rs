//! Elliptic anti-aliasing filter design and C++ table generation
//!
//! Designs cascades of second-order IIR sections for resampling between a
//! base sample rate and an oversampled rate, and renders them as `switch`
//! case blocks for a C++ header.
//!
//! - [`design()`] / [`design_spec`]: one filter
//! - [`FilterTable`]: up and down filters for a set of sample rates
//! - [`emit_cases`]: case block text
//! - [`splice()`]: regenerate marked regions of an existing header

pub mod design;
pub mod elliptic;
pub mod emit;
pub mod error;
pub mod sos;
pub mod special;
pub mod splice;
pub mod table;
pub mod zpk;

pub use design::{FilterCascade, FilterSpec, MIN_ORDER, design, design_spec};
pub use emit::{EmitStyle, emit_cases, format_coefficient, write_cases};
pub use error::{DesignError, EmitError, SpecError, SpliceError};
pub use sos::Section;
pub use splice::{RegionSpan, find_regions, splice};
pub use table::{COMMON_SAMPLE_RATES, FilterTable, RatePlan, Region, TableConfig};
pub use zpk::Zpk;
