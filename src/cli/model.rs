use anyhow::Context;
use clap::Parser;
use nanonet::{build_full_atom_model, validate_chain_label, ModelingConfig, Modeller};
use std::path::PathBuf;
use tracing::{info, trace};

#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub(crate) struct Args {
    /// Backbone structure used as the only template
    backbone: PathBuf,

    /// Target amino acid sequence in one-letter codes
    sequence: String,

    /// Directory for the alignment files and built models
    #[arg(short, long, default_value = ".")]
    workdir: PathBuf,

    /// Python interpreter that can import MODELLER
    #[arg(long, env = "NANONET_PYTHON", default_value = "python3")]
    python: PathBuf,

    /// Chain label given to the modeled segment, a single printable ASCII character
    #[arg(long, default_value_t = String::from("H"), value_parser = parse_chain_label)]
    segment: String,

    /// Number of models to build
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..))]
    num_models: u16,

    /// Extra directories searched for atom files
    #[arg(long = "atom-dir")]
    atom_dirs: Vec<PathBuf>,
}

fn parse_chain_label(label: &str) -> Result<String, String> {
    validate_chain_label(label)
        .map(|()| label.to_string())
        .map_err(|e| e.to_string())
}

pub(crate) fn run(args: &Args) -> anyhow::Result<()> {
    trace!("{args:?}");

    let mut config = ModelingConfig {
        workdir: args.workdir.clone(),
        segment_label: args.segment.clone(),
        ending_model: args.num_models as usize,
        ..Default::default()
    };
    config.atom_dirs.extend(args.atom_dirs.iter().cloned());

    let backend = Modeller {
        python: args.python.clone(),
        verbose: true,
    };

    let outcome = build_full_atom_model(&backend, &args.backbone, &args.sequence, &config)
        .with_context(|| format!("Failed to build a model on {}", args.backbone.display()))?;

    for model in &outcome.models {
        info!("Built {}", model.display());
    }
    let first = outcome
        .models
        .first()
        .context("The modeling step did not report any model file")?;
    println!("Done. Model written to {}", first.display());
    Ok(())
}
