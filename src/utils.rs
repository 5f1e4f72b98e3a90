use crate::error::{Error, Result};
use pdbtbx::*;
use polars::prelude::*;
use std::path::Path;
use tracing::{error, warn};

fn join_errors(errors: &[PDBError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

fn path_str(path: &Path) -> Result<&str> {
    path.to_str().ok_or_else(|| Error::Parse {
        path: path.to_path_buf(),
        details: "path is not valid UTF-8".to_string(),
    })
}

fn read_structure(input_file: &Path, only_atomic_coords: bool) -> Result<(PDB, Vec<PDBError>)> {
    pdbtbx::ReadOptions::default()
        .set_only_atomic_coords(only_atomic_coords)
        .set_level(pdbtbx::StrictnessLevel::Loose)
        .read(path_str(input_file)?)
        .map_err(|errors| Error::Parse {
            path: input_file.to_path_buf(),
            details: join_errors(&errors),
        })
}

/// Open an atomic data file with [`pdbtbx::ReadOptions`].
///
/// Only atomic coordinates are kept. Non-fatal parser messages are returned
/// alongside the structure so callers can decide how loud to be about them.
pub fn load_structure(input_file: &Path) -> Result<(PDB, Vec<PDBError>)> {
    read_structure(input_file, true)
}

/// Like [`load_structure`], but header records such as `REMARK` are kept so
/// that saving the structure again does not drop them.
pub fn load_structure_with_headers(input_file: &Path) -> Result<(PDB, Vec<PDBError>)> {
    read_structure(input_file, false)
}

/// Log parser messages at a level matching their severity.
pub fn log_pdb_warnings(warnings: &[PDBError]) {
    for e in warnings {
        match e.level() {
            pdbtbx::ErrorLevel::BreakingError => error!("{e}"),
            pdbtbx::ErrorLevel::InvalidatingError => error!("{e}"),
            _ => warn!("{e}"),
        }
    }
}

/// Save a structure, picking the format from the file extension.
pub fn save_structure(pdb: &PDB, output_file: &Path) -> Result<()> {
    pdbtbx::save(pdb, path_str(output_file)?, pdbtbx::StrictnessLevel::Loose).map_err(|errors| {
        Error::Write {
            path: output_file.to_path_buf(),
            details: join_errors(&errors),
        }
    })
}

/// Write a DataFrame to `file_path`, replacing its extension with the file type.
pub fn write_df_to_file(
    df: &mut DataFrame,
    file_path: &Path,
    file_type: DataFrameFileType,
) -> Result<()> {
    let output_file = file_path.with_extension(file_type.to_string());
    let mut file = std::fs::File::create(&output_file).map_err(|e| Error::io(&output_file, e))?;
    match file_type {
        DataFrameFileType::Csv => {
            CsvWriter::new(&mut file).finish(df)?;
        }
        DataFrameFileType::Parquet => {
            ParquetWriter::new(&mut file).finish(df)?;
        }
        DataFrameFileType::Json => {
            JsonWriter::new(&mut file)
                .with_json_format(JsonFormat::Json)
                .finish(df)?;
        }
        DataFrameFileType::NDJson => {
            JsonWriter::new(&mut file)
                .with_json_format(JsonFormat::JsonLines)
                .finish(df)?;
        }
    }
    Ok(())
}

/// File format of the per-residue deviation table written by `nanonet align`.
///
/// The variant name doubles as the file extension, see [`write_df_to_file`].
#[derive(clap::ValueEnum, Clone, Debug, Copy, PartialEq, Eq)]
pub enum DataFrameFileType {
    /// Comma-separated values
    Csv,
    /// Parquet columnar storage
    Parquet,
    /// Standard JSON
    Json,
    /// Newline-delimited JSON
    NDJson,
}

impl std::fmt::Display for DataFrameFileType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            DataFrameFileType::Csv => write!(f, "csv"),
            DataFrameFileType::Parquet => write!(f, "parquet"),
            DataFrameFileType::Json => write!(f, "json"),
            DataFrameFileType::NDJson => write!(f, "ndjson"),
        }
    }
}
