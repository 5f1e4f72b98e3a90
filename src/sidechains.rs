//! Thread a sequence onto a backbone and build a full-atom model.
//!
//! The target sequence is written as a PIR entry, aligned against the
//! backbone with a structure-aware alignment, and handed to a
//! [`ModelBackend`] together with the backbone as the only known structure.
//! Every built model then has its first chain relabelled and renumbered.

use crate::backend::{Align2dRequest, BuildRequest, ModelBackend};
use crate::chains::ChainExt;
use crate::error::{Error, Result};
use crate::pir::{self, PirEntry};
use crate::utils::{load_structure, load_structure_with_headers, log_pdb_warnings, save_structure};
use pdbtbx::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// File names and labels used for one modeling run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelingConfig {
    /// Directory holding all intermediate and output files
    pub workdir: PathBuf,
    /// Align code of the target sequence
    pub sequence_code: String,
    /// PIR file the target sequence is written to
    pub sequence_file: String,
    /// Combined alignment written by the alignment step
    pub alignment_file: String,
    /// Label given to the first chain of each model
    pub segment_label: String,
    /// Number of the first residue after renumbering
    pub first_residue: isize,
    /// Index of the first model to build
    pub starting_model: usize,
    /// Index of the last model to build
    pub ending_model: usize,
    /// Directories searched for atom files
    pub atom_dirs: Vec<PathBuf>,
}

impl Default for ModelingConfig {
    fn default() -> Self {
        Self {
            workdir: PathBuf::from("."),
            sequence_code: "pdb_seq".to_string(),
            sequence_file: "pdb_seq.ali".to_string(),
            alignment_file: "alignment_for_full_atoms.ali".to_string(),
            segment_label: "H".to_string(),
            first_residue: 1,
            starting_model: 1,
            ending_model: 1,
            atom_dirs: vec![PathBuf::from("."), PathBuf::from("../atom_files")],
        }
    }
}

impl ModelingConfig {
    /// Path of the target sequence PIR file.
    pub fn sequence_path(&self) -> PathBuf {
        self.workdir.join(&self.sequence_file)
    }

    /// Path of the combined alignment.
    pub fn alignment_path(&self) -> PathBuf {
        self.workdir.join(&self.alignment_file)
    }
}

/// Files produced by [`build_full_atom_model`].
#[derive(Clone, Debug, PartialEq)]
pub struct ModelingOutcome {
    /// Target sequence PIR file
    pub sequence_file: PathBuf,
    /// Combined alignment
    pub alignment_file: PathBuf,
    /// Built and patched model files
    pub models: Vec<PathBuf>,
    /// Identity between template and target over aligned residues
    pub identity: Option<f64>,
}

/// Check that `label` fits the one-column chain identifier of a PDB file.
pub fn validate_chain_label(label: &str) -> Result<()> {
    let mut chars = label.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_graphic() => Ok(()),
        _ => Err(Error::InvalidChainLabel(label.to_string())),
    }
}

/// Relabel the first chain of every model and renumber its residues.
///
/// Residues are numbered consecutively from `first_residue`. Other chains
/// are not touched.
pub fn patch_segments(pdb: &mut PDB, label: &str, first_residue: isize) -> Result<()> {
    validate_chain_label(label)?;
    for model in pdb.models_mut() {
        if let Some(chain) = model.chains_mut().next() {
            if !chain.set_id(label) {
                return Err(Error::InvalidChainLabel(label.to_string()));
            }
            for (offset, residue) in chain.residues_mut().enumerate() {
                residue.set_serial_number(first_residue + offset as isize);
            }
        }
    }
    Ok(())
}

/// Load a built model, patch its first chain and save it in place.
///
/// Header records written by the modeling program are kept. Returns the
/// number of residues in the saved structure.
pub fn patch_model_file(model_file: &Path, label: &str, first_residue: isize) -> Result<usize> {
    let (mut model, model_warnings) = load_structure_with_headers(model_file)?;
    log_pdb_warnings(&model_warnings);
    patch_segments(&mut model, label, first_residue)?;
    save_structure(&model, model_file)?;
    Ok(model.residue_count())
}

/// Align code used for a template file: the file name up to its first dot.
///
/// The code must differ from `target_code`, otherwise both alignment entries
/// would share it. On a clash the full file name is used, and failing that
/// a `_template` suffix is added.
pub fn template_code(template_file: &Path, target_code: &str) -> String {
    let file_name = template_file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty());
    let Some(file_name) = file_name else {
        return "template".to_string();
    };
    let stem = file_name.split('.').next().unwrap_or_default();
    if !stem.is_empty() && stem != target_code {
        stem.to_string()
    } else if file_name != target_code {
        file_name
    } else {
        format!("{file_name}_template")
    }
}

fn find_entry<'a>(entries: &'a [PirEntry], code: &str, path: &Path) -> Result<&'a PirEntry> {
    entries
        .iter()
        .find(|e| e.code == code)
        .ok_or_else(|| Error::MissingAlignmentEntry {
            path: path.to_path_buf(),
            code: code.to_string(),
        })
}

/// Build a full-atom model of `sequence` on the backbone in `template_file`.
///
/// Intermediate files in `config.workdir` are overwritten on every run.
pub fn build_full_atom_model<B: ModelBackend + ?Sized>(
    backend: &B,
    template_file: &Path,
    sequence: &str,
    config: &ModelingConfig,
) -> Result<ModelingOutcome> {
    pir::validate_sequence(sequence)?;
    validate_chain_label(&config.segment_label)?;

    // The backend runs inside the working directory, so every path handed to
    // it has to be absolute
    let workdir = std::path::absolute(&config.workdir).map_err(|e| Error::io(&config.workdir, e))?;
    std::fs::create_dir_all(&workdir).map_err(|e| Error::io(&workdir, e))?;
    let config = &ModelingConfig {
        workdir,
        ..config.clone()
    };

    let template_file = template_file
        .canonicalize()
        .map_err(|e| Error::io(template_file, e))?;

    let (template, template_warnings) = load_structure(&template_file)?;
    log_pdb_warnings(&template_warnings);
    for chain in template.chains() {
        debug!(">{}\n{}", chain.id(), chain.pdb_seq().join(""));
    }
    let target = PirEntry::sequence(&config.sequence_code, sequence);
    if template.residue_count() != target.residue_count() {
        warn!(
            "Template has {} residues but the target sequence has {}",
            template.residue_count(),
            target.residue_count()
        );
    }

    let sequence_file = config.sequence_path();
    pir::write_sequence_file(&sequence_file, &config.sequence_code, sequence)?;
    debug!("Target sequence written to {}", sequence_file.display());

    let known_code = template_code(&template_file, &config.sequence_code);
    let alignment_file = config.alignment_path();
    backend.align2d(&Align2dRequest {
        workdir: config.workdir.clone(),
        template_file: template_file.clone(),
        template_code: known_code.clone(),
        sequence_file: sequence_file.clone(),
        sequence_code: config.sequence_code.clone(),
        output_file: alignment_file.clone(),
    })?;

    let entries = pir::read_alignment(&alignment_file)?;
    let known = find_entry(&entries, &known_code, &alignment_file)?;
    let aligned_target = find_entry(&entries, &config.sequence_code, &alignment_file)?;
    let identity = pir::sequence_identity(known, aligned_target);
    match identity {
        Some(id) => info!(
            "Aligned target to {known_code} with {:.1}% sequence identity",
            id * 100.0
        ),
        None => warn!("Target shares no aligned residues with {known_code}"),
    }

    let mut atom_dirs = config.atom_dirs.clone();
    if let Some(dir) = template_file.parent() {
        atom_dirs.push(dir.to_path_buf());
    }
    let models = backend.build(&BuildRequest {
        workdir: config.workdir.clone(),
        alignment_file: alignment_file.clone(),
        known_code,
        sequence_code: config.sequence_code.clone(),
        atom_dirs,
        starting_model: config.starting_model,
        ending_model: config.ending_model,
    })?;

    for model_file in &models {
        if !model_file.exists() {
            return Err(Error::MissingModel(model_file.clone()));
        }
        let residues = patch_model_file(model_file, &config.segment_label, config.first_residue)?;
        info!(
            "Model with {residues} residues saved to {}",
            model_file.display()
        );
    }

    Ok(ModelingOutcome {
        sequence_file,
        alignment_file,
        models,
        identity,
    })
}
