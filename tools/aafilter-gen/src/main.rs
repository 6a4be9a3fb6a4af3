//! aafilter-gen - anti-aliasing filter table generator
//!
//! Designs elliptic filters and writes their coefficient tables into C++
//! headers. Generated text goes to stdout; logs go to stderr.

use anyhow::Result;
use clap::{Parser, Subcommand};
use nether_aafilter::FilterSpec;
use std::path::PathBuf;

use aafilter_gen::manifest;

#[derive(Parser)]
#[command(name = "aafilter-gen")]
#[command(about = "Anti-aliasing filter table generator")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Design one filter and print its case block
    Design {
        /// Base sample rate in Hz
        #[arg(long)]
        fs: u32,

        /// Oversampling factor
        #[arg(short, long, default_value_t = 1)]
        oversampling: u32,

        /// Passband corner in Hz
        #[arg(long)]
        fpass: f64,

        /// Stopband corner in Hz
        #[arg(long)]
        fstop: f64,

        /// Maximum passband ripple in dB
        #[arg(long, default_value_t = 0.1)]
        rpass: f64,

        /// Minimum stopband attenuation in dB
        #[arg(long, default_value_t = 100.0)]
        rstop: f64,

        /// Manifest supplying the output style
        #[arg(long)]
        manifest: Option<PathBuf>,
    },

    /// Print every generated region of the manifest's table
    Generate {
        /// Path to aafilter.toml manifest
        #[arg(default_value = "aafilter.toml")]
        manifest: PathBuf,
    },

    /// Rewrite the marked regions of the manifest's headers
    Splice {
        /// Path to aafilter.toml manifest
        #[arg(default_value = "aafilter.toml")]
        manifest: PathBuf,
    },

    /// Check that the manifest's headers are in sync
    Check {
        /// Path to aafilter.toml manifest
        #[arg(default_value = "aafilter.toml")]
        manifest: PathBuf,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Design {
            fs,
            oversampling,
            fpass,
            fstop,
            rpass,
            rstop,
            manifest,
        } => {
            let style = match manifest {
                Some(path) => manifest::load_manifest(&path)?.style,
                None => Default::default(),
            };
            let spec = FilterSpec::new(fs, oversampling, fpass, fstop, rpass, rstop);
            print!("{}", aafilter_gen::design_one(&spec, &style)?);
        }

        Commands::Generate { manifest } => {
            tracing::info!("Generating table from {:?}", manifest);
            let config = manifest::load_manifest(&manifest)?;
            let regions = aafilter_gen::render_regions(&config)?;
            print!("{}", aafilter_gen::generate(&regions)?);
        }

        Commands::Splice { manifest } => {
            let config = manifest::load_manifest(&manifest)?;
            if config.targets.is_empty() {
                tracing::warn!("No targets listed in {:?}", manifest);
            }
            let changed = aafilter_gen::splice_all(&config)?;
            tracing::info!("{} of {} headers updated", changed, config.targets.len());
        }

        Commands::Check { manifest } => {
            let config = manifest::load_manifest(&manifest)?;
            if !aafilter_gen::check_all(&config)? {
                anyhow::bail!("Headers are out of sync. Run 'aafilter-gen splice' to regenerate.");
            }
            tracing::info!("All headers are in sync!");
        }
    }

    Ok(())
}
