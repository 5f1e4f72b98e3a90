#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

//! # NanoNet Library
//!
//! Two small structural workflows built on [`pdbtbx`]:
//!
//! - [`align_files`] superimposes a model onto a reference by their
//!   alpha-carbons and writes the moved model.
//! - [`build_full_atom_model`] threads a sequence onto a backbone through an
//!   external comparative-modeling [`ModelBackend`] and relabels the result.

mod align;
mod backend;
mod chains;
mod error;
mod pir;
mod residues;
mod sidechains;
mod superpose;
mod utils;

// Re-export key public types
pub use align::{
    align_files, align_structures, aligned_output_path, select_alpha_carbons, transform_model,
    AlignedPair, Alignment,
};
pub use backend::{model_file_name, Align2dRequest, BuildRequest, ModelBackend, Modeller};
pub use chains::ChainExt;
pub use error::{Error, Result};
pub use pir::{
    parse_alignment, read_alignment, sequence_identity, validate_sequence, write_sequence_file,
    PirEntry,
};
pub use residues::{ResidueExt, ResidueId, ALPHA_CARBON};
pub use sidechains::{
    build_full_atom_model, patch_model_file, patch_segments, template_code, validate_chain_label,
    ModelingConfig, ModelingOutcome,
};
pub use superpose::Superposition;
pub use utils::{
    load_structure, load_structure_with_headers, log_pdb_warnings, save_structure,
    write_df_to_file, DataFrameFileType,
};
