//! Anti-aliasing filter table generator library
//!
//! Designs the filter table described by a manifest and writes it into the
//! marked regions of C++ headers.

pub mod manifest;

use anyhow::{Context, Result};
use nether_aafilter::{EmitStyle, FilterSpec, FilterTable, Region, design_spec, emit_cases};
use std::collections::BTreeMap;
use std::fmt::Write as FmtWrite;
use std::path::Path;

use crate::manifest::Manifest;

/// Generated text for every region
pub type Regions = BTreeMap<Region, String>;

/// Design a single filter and render its case block.
pub fn design_one(spec: &FilterSpec, style: &EmitStyle) -> Result<String> {
    let cascade = design_spec(spec).with_context(|| format!("Failed to design filter {spec}"))?;
    tracing::info!(
        "{}x{}: order {}, {} sections",
        spec.sample_rate,
        spec.oversampling,
        cascade.order,
        cascade.num_sections()
    );
    Ok(emit_cases(&[cascade], style)?)
}

/// Design the manifest's table and render every region.
pub fn render_regions(manifest: &Manifest) -> Result<Regions> {
    let table = FilterTable::design(&manifest.table)?;
    let regions = table
        .render_all(&manifest.style)
        .context("Failed to render filter table")?;
    Ok(regions)
}

/// Render every region wrapped in its markers, as a standalone fragment.
///
/// The output is itself a valid splice target.
pub fn generate(regions: &Regions) -> Result<String> {
    let mut out = String::new();
    for (region, body) in regions {
        writeln!(out, "// [[[aafilter:{}]]]", region.name())?;
        out.push_str(body);
        writeln!(out, "// [[[end]]]")?;
    }
    Ok(out)
}

fn spliced(path: &Path, regions: &Regions) -> Result<(String, String)> {
    let existing = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let fresh = nether_aafilter::splice(&existing, regions)
        .with_context(|| format!("Bad region markers in {}", path.display()))?;
    Ok((existing, fresh))
}

/// Rewrite the marked regions of `path`. Returns whether the file changed.
pub fn splice_target(path: &Path, regions: &Regions) -> Result<bool> {
    let (existing, fresh) = spliced(path, regions)?;
    if fresh == existing {
        tracing::info!("Up to date: {}", path.display());
        return Ok(false);
    }
    std::fs::write(path, &fresh).with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!("Updated {}", path.display());
    Ok(true)
}

/// Check whether the marked regions of `path` match the generated text.
pub fn check_target(path: &Path, regions: &Regions) -> Result<bool> {
    let (existing, fresh) = spliced(path, regions)?;
    let in_sync = fresh == existing;
    if in_sync {
        tracing::info!("In sync: {}", path.display());
    } else {
        tracing::warn!("Out of sync: {}", path.display());
    }
    Ok(in_sync)
}

/// Splice every target. Returns the number of files changed.
pub fn splice_all(manifest: &Manifest) -> Result<usize> {
    let regions = render_regions(manifest)?;
    let mut changed = 0;
    for target in &manifest.targets {
        if splice_target(&target.path, &regions)? {
            changed += 1;
        }
    }
    Ok(changed)
}

/// Check every target. Returns whether all are in sync.
pub fn check_all(manifest: &Manifest) -> Result<bool> {
    let regions = render_regions(manifest)?;
    let mut all_in_sync = true;
    for target in &manifest.targets {
        if !check_target(&target.path, &regions)? {
            all_in_sync = false;
        }
    }
    Ok(all_in_sync)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nether_aafilter::TableConfig;

    fn regions() -> Regions {
        let mut regions = Regions::new();
        regions.insert(Region::MaxSections, "static constexpr int kMaxNumSections = 3;\n".to_string());
        regions.insert(Region::OversamplingFactors, "case 48000: return 3;\n".to_string());
        regions
    }

    #[test]
    fn test_design_one() {
        let spec = FilterSpec::new(48000, 4, 20000.0, 24000.0, 0.1, 80.0);
        let text = design_one(&spec, &EmitStyle::default()).unwrap();
        assert!(text.starts_with("case 48000: // o = 4,"));
        assert!(text.contains("AAFilter<T>::filter_.Init("));
    }

    #[test]
    fn test_design_one_reports_spec() {
        let spec = FilterSpec::new(48000, 4, 24000.0, 20000.0, 0.1, 80.0);
        let err = design_one(&spec, &EmitStyle::default()).unwrap_err();
        assert!(err.to_string().contains("fs = 48000"));
    }

    #[test]
    fn test_generate_wraps_regions_in_markers() {
        let text = generate(&regions()).unwrap();
        assert_eq!(
            text,
            "// [[[aafilter:max-sections]]]\n\
             static constexpr int kMaxNumSections = 3;\n\
             // [[[end]]]\n\
             // [[[aafilter:oversampling-factors]]]\n\
             case 48000: return 3;\n\
             // [[[end]]]\n"
        );
        // Generated fragments splice onto themselves unchanged
        assert_eq!(nether_aafilter::splice(&text, &regions()).unwrap(), text);
    }

    #[test]
    fn test_render_regions_small_table() {
        let manifest = Manifest {
            table: TableConfig {
                sample_rates: vec![96000],
                ..TableConfig::default()
            },
            ..Manifest::default()
        };
        let regions = render_regions(&manifest).unwrap();
        assert_eq!(regions.len(), Region::ALL.len());
        assert_eq!(regions[&Region::OversamplingFactors], "case 96000: return 2;\n");
    }

    #[test]
    fn test_splice_then_check() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aafilter.hpp");
        std::fs::write(&path, "// [[[aafilter:max-sections]]]\n// [[[end]]]\n").unwrap();

        assert!(!check_target(&path, &regions()).unwrap());
        assert!(splice_target(&path, &regions()).unwrap());
        assert!(check_target(&path, &regions()).unwrap());
        assert!(!splice_target(&path, &regions()).unwrap());
    }

    #[test]
    fn test_bad_markers_name_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.hpp");
        std::fs::write(&path, "// [[[aafilter:max-sections]]]\n").unwrap();

        let err = splice_target(&path, &regions()).unwrap_err();
        assert!(err.to_string().contains("broken.hpp"));
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "// [[[aafilter:max-sections]]]\n"
        );
    }
}
