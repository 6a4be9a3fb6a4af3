//! C++ `switch` case generator for designed filters
//!
//! Output is unindented; callers splicing into a header add the indentation
//! of the surrounding code.

use std::fmt::Write as FmtWrite;

use serde::{Deserialize, Serialize};

use crate::design::FilterCascade;
use crate::error::EmitError;

/// Column width of one printed coefficient including its trailing comma.
const COEFF_WIDTH: usize = 17;

/// Names used in the generated C++.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitStyle {
    /// Struct type of one coefficient row
    pub coefficient_type: String,
    /// Prefix of the generated table names (`kFilter48000x3`)
    pub table_prefix: String,
    /// Expression whose `Init(count, table)` is called
    pub filter_object: String,
}

impl Default for EmitStyle {
    fn default() -> Self {
        Self {
            coefficient_type: "SOSCoefficients".to_string(),
            table_prefix: "kFilter".to_string(),
            filter_object: "AAFilter<T>::filter_".to_string(),
        }
    }
}

impl EmitStyle {
    pub fn table_name(&self, cascade: &FilterCascade) -> String {
        format!(
            "{}{}x{}",
            self.table_prefix, cascade.sample_rate, cascade.oversampling
        )
    }
}

/// Format a coefficient with 8 decimals in C-style scientific notation
/// (`1.44208376e-04`: signed exponent, at least two digits).
pub fn format_coefficient(value: f64) -> String {
    let formatted = format!("{value:.8e}");
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        // inf/NaN have no exponent; callers reject them first
        None => formatted,
    }
}

fn check_cascade(cascade: &FilterCascade) -> Result<(), EmitError> {
    if cascade.sections.is_empty() {
        return Err(EmitError::EmptyCascade {
            sample_rate: cascade.sample_rate,
            oversampling: cascade.oversampling,
        });
    }
    if let Some(section) = cascade.sections.iter().position(|s| !s.is_finite()) {
        return Err(EmitError::NonFinite {
            sample_rate: cascade.sample_rate,
            oversampling: cascade.oversampling,
            section,
        });
    }
    Ok(())
}

fn write_row<W: FmtWrite>(out: &mut W, coeffs: &[f64]) -> Result<(), EmitError> {
    for &c in coeffs {
        let cell = format!("{},", format_coefficient(c));
        write!(out, "{:<width$}", cell, width = COEFF_WIDTH)?;
    }
    Ok(())
}

/// Write one case block per cascade, in order.
///
/// Every cascade is validated before anything is written.
pub fn write_cases<W: FmtWrite>(
    out: &mut W,
    cascades: &[FilterCascade],
    style: &EmitStyle,
) -> Result<(), EmitError> {
    for cascade in cascades {
        check_cascade(cascade)?;
    }

    for cascade in cascades {
        let fs = cascade.sample_rate;
        let num_sections = cascade.num_sections();
        let name = style.table_name(cascade);

        writeln!(
            out,
            "case {}: // o = {}, fp = {}, fst = {}, cost = {}",
            fs,
            cascade.oversampling,
            cascade.fpass() as i64,
            cascade.fstop() as i64,
            cascade.cost()
        )?;
        writeln!(out, "{{")?;
        writeln!(
            out,
            "    const {} {}[{}] =",
            style.coefficient_type, name, num_sections
        )?;
        writeln!(out, "    {{")?;
        for section in &cascade.sections {
            write!(out, "        {{ {{")?;
            write_row(out, &section.b)?;
            write!(out, "}}, {{")?;
            write_row(out, &section.a[1..])?;
            writeln!(out, "}} }},")?;
        }
        writeln!(out, "    }};")?;
        writeln!(out, "    {}.Init({}, {});", style.filter_object, num_sections, name)?;
        writeln!(out, "    break;")?;
        writeln!(out, "}}")?;
    }

    Ok(())
}

/// Render the case blocks for `cascades` into a new string.
pub fn emit_cases(cascades: &[FilterCascade], style: &EmitStyle) -> Result<String, EmitError> {
    let mut output = String::new();
    write_cases(&mut output, cascades, style)?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sos::Section;

    fn cascade(sections: Vec<Section>) -> FilterCascade {
        FilterCascade {
            sample_rate: 8000,
            oversampling: 15,
            order: sections.len() * 2,
            wpass: 0.03125,
            wstop: 0.0625,
            sections,
        }
    }

    #[test]
    fn test_format_coefficient() {
        assert_eq!(format_coefficient(1.44208376e-04), "1.44208376e-04");
        assert_eq!(format_coefficient(1.0), "1.00000000e+00");
        assert_eq!(format_coefficient(-1.75298317), "-1.75298317e+00");
        assert_eq!(format_coefficient(0.0), "0.00000000e+00");
        assert_eq!(format_coefficient(1.5e-120), "1.50000000e-120");
        assert_eq!(format_coefficient(123456.0), "1.23456000e+05");
    }

    #[test]
    fn test_case_block_layout() {
        let c = cascade(vec![
            Section::new([1.27849152e-05, -1.15294016e-05, 1.27849152e-05], [1.0, -1.89076082, 0.894920241]),
            Section::new([1.0, -1.81550212, 1.0], [1.0, -1.90419428, 0.915590704]),
        ]);
        let text = emit_cases(&[c], &EmitStyle::default()).unwrap();

        let expected = "\
case 8000: // o = 15, fp = 3750, fst = 7500, cost = 240000
{
    const SOSCoefficients kFilter8000x15[2] =
    {
        { {1.27849152e-05,  -1.15294016e-05, 1.27849152e-05,  }, {-1.89076082e+00, 8.94920241e-01,  } },
        { {1.00000000e+00,  -1.81550212e+00, 1.00000000e+00,  }, {-1.90419428e+00, 9.15590704e-01,  } },
    };
    AAFilter<T>::filter_.Init(2, kFilter8000x15);
    break;
}
";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_custom_style() {
        let style = EmitStyle {
            coefficient_type: "Biquad".to_string(),
            table_prefix: "kDown".to_string(),
            filter_object: "down_".to_string(),
        };
        let c = cascade(vec![Section::new([0.5, 1.0, 0.5], [1.0, -0.5, 0.25])]);
        let text = emit_cases(&[c], &style).unwrap();

        assert!(text.contains("const Biquad kDown8000x15[1] ="));
        assert!(text.contains("down_.Init(1, kDown8000x15);"));
    }

    #[test]
    fn test_cases_keep_input_order() {
        let mut a = cascade(vec![Section::new([1.0, 0.0, 0.0], [1.0, 0.0, 0.0])]);
        a.sample_rate = 96000;
        let b = cascade(vec![Section::new([1.0, 0.0, 0.0], [1.0, 0.0, 0.0])]);
        let text = emit_cases(&[a, b], &EmitStyle::default()).unwrap();

        let first = text.find("case 96000:").unwrap();
        let second = text.find("case 8000:").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_coefficients_parse_back() {
        let section = Section::new(
            [3.4723672612e-04, 5.9461138234e-04, 3.47236726e-04],
            [1.0, -1.666512621234, 0.70588439177],
        );
        let text = emit_cases(&[cascade(vec![section])], &EmitStyle::default()).unwrap();

        let row = text.lines().find(|l| l.trim_start().starts_with("{ {")).unwrap();
        let parsed: Vec<f64> = row
            .split(|c: char| c == ',' || c == '{' || c == '}')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.parse().unwrap())
            .collect();

        let expected = [section.b[0], section.b[1], section.b[2], section.a[1], section.a[2]];
        assert_eq!(parsed.len(), expected.len());
        for (p, e) in parsed.iter().zip(&expected) {
            assert!((p - e).abs() <= 5e-9 * e.abs());
        }
    }

    #[test]
    fn test_rejects_empty_cascade() {
        let err = emit_cases(&[cascade(vec![])], &EmitStyle::default()).unwrap_err();
        assert!(matches!(err, EmitError::EmptyCascade { sample_rate: 8000, .. }));
    }

    #[test]
    fn test_rejects_non_finite_without_partial_output() {
        let good = cascade(vec![Section::new([1.0, 0.0, 0.0], [1.0, 0.0, 0.0])]);
        let bad = cascade(vec![
            Section::new([1.0, 0.0, 0.0], [1.0, 0.0, 0.0]),
            Section::new([f64::NAN, 0.0, 0.0], [1.0, 0.0, 0.0]),
        ]);

        let mut out = String::new();
        let err = write_cases(&mut out, &[good, bad], &EmitStyle::default()).unwrap_err();
        assert!(matches!(err, EmitError::NonFinite { section: 1, .. }));
        assert!(out.is_empty());
    }
}
