//! Manifest parsing
//!
//! Parses aafilter.toml: table parameters, output naming and the headers to
//! keep in sync.

use anyhow::{Context, Result};
use nether_aafilter::{EmitStyle, TableConfig};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Root manifest structure
#[derive(Debug, Default, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub table: TableConfig,
    #[serde(default)]
    pub style: EmitStyle,
    #[serde(default)]
    pub targets: Vec<Target>,
}

/// A header containing region markers
#[derive(Debug, Clone, Deserialize)]
pub struct Target {
    pub path: PathBuf,
}

/// Load a manifest; target paths are resolved against its directory.
pub fn load_manifest(path: &Path) -> Result<Manifest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest: {:?}", path))?;
    let mut manifest = parse_manifest(&content)
        .with_context(|| format!("Failed to parse manifest: {:?}", path))?;

    let base = path.parent().unwrap_or_else(|| Path::new(""));
    for target in &mut manifest.targets {
        if target.path.is_relative() {
            target.path = base.join(&target.path);
        }
    }
    Ok(manifest)
}

pub fn parse_manifest(content: &str) -> Result<Manifest> {
    Ok(toml::from_str(content)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_manifest_uses_defaults() {
        let manifest = parse_manifest("").unwrap();
        assert_eq!(manifest.table, TableConfig::default());
        assert_eq!(manifest.style, EmitStyle::default());
        assert!(manifest.targets.is_empty());
    }

    #[test]
    fn test_partial_sections() {
        let manifest = parse_manifest(
            r#"
[table]
oversampled_rate_multiple = 2.0
sample_rates = [44100, 48000]

[style]
filter_object = "filter_"

[[targets]]
path = "include/aafilter.hpp"
"#,
        )
        .unwrap();

        assert_eq!(manifest.table.oversampled_rate_multiple, 2.0);
        assert_eq!(manifest.table.rstop, 100.0);
        assert_eq!(manifest.table.sample_rates, vec![44100, 48000]);
        assert_eq!(manifest.style.filter_object, "filter_");
        assert_eq!(manifest.style.table_prefix, "kFilter");
        assert_eq!(manifest.targets[0].path, PathBuf::from("include/aafilter.hpp"));
    }

    #[test]
    fn test_unknown_field_type_is_rejected() {
        assert!(parse_manifest("[table]\nrstop = \"loud\"\n").is_err());
    }

    #[test]
    fn test_targets_resolve_against_manifest_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aafilter.toml");
        std::fs::write(&path, "[[targets]]\npath = \"a.hpp\"\n").unwrap();

        let manifest = load_manifest(&path).unwrap();
        assert_eq!(manifest.targets[0].path, dir.path().join("a.hpp"));
    }

    #[test]
    fn test_missing_manifest_names_path() {
        let err = load_manifest(Path::new("/nonexistent/aafilter.toml")).unwrap_err();
        assert!(format!("{err:#}").contains("aafilter.toml"));
    }
}
