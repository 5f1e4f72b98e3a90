use anyhow::Context;
use clap::Parser;
use nanonet::{align_files, write_df_to_file, DataFrameFileType};
use std::path::PathBuf;
use tracing::{info, trace};

#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub(crate) struct Args {
    /// Reference structure (PDB or mmCIF) that stays in place
    reference: PathBuf,

    /// Model structure to move onto the reference
    model: PathBuf,

    /// Where to write the aligned model.
    /// Defaults to `<model stem>_aligned.pdb` next to the model
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also write per-residue alpha-carbon deviations to this file
    #[arg(short, long)]
    deviations: Option<PathBuf>,

    /// File type of the deviation table
    #[arg(short = 't', long = "deviations-format", default_value_t = DataFrameFileType::Csv)]
    deviations_format: DataFrameFileType,
}

pub(crate) fn run(args: &Args) -> anyhow::Result<()> {
    trace!("{args:?}");

    let (alignment, output_file) = align_files(&args.reference, &args.model, args.output.as_deref())
        .with_context(|| {
            format!(
                "Failed to align {} onto {}",
                args.model.display(),
                args.reference.display()
            )
        })?;

    if let Some(path) = &args.deviations {
        let mut df = alignment.to_df()?;
        write_df_to_file(&mut df, path, args.deviations_format)?;
        info!(
            "Per-residue deviations saved to {}",
            path.with_extension(args.deviations_format.to_string()).display()
        );
    }

    info!("Aligned model written to {}", output_file.display());
    println!("{}", alignment.rmsd());
    Ok(())
}
