//! Superimpose a model structure onto a reference structure.
//!
//! One alpha-carbon per residue is taken from the first model of each file,
//! in chain then residue order, and the two lists are paired by position.

use crate::error::{Error, Result};
use crate::residues::{ResidueExt, ResidueId, ALPHA_CARBON};
use crate::superpose::Superposition;
use crate::utils::{load_structure, log_pdb_warnings, save_structure};
use nalgebra as na;
use pdbtbx::*;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One matched pair of alpha-carbons and their distance after the fit.
#[derive(Clone, Debug, PartialEq)]
pub struct AlignedPair {
    /// Residue in the reference structure
    pub reference: ResidueId,
    /// Residue in the model structure
    pub model: ResidueId,
    /// Distance in Ångströms after superposition
    pub deviation: f64,
}

/// Result of superimposing one structure onto another.
#[derive(Clone, Debug)]
pub struct Alignment {
    /// The rigid transform applied to the model
    pub superposition: Superposition,
    /// Per-residue pairs in selection order
    pub pairs: Vec<AlignedPair>,
}

impl Alignment {
    /// Root-mean-square deviation of the paired alpha-carbons.
    pub fn rmsd(&self) -> f64 {
        self.superposition.rmsd
    }

    /// Per-residue deviations as a DataFrame.
    pub fn to_df(&self) -> PolarsResult<DataFrame> {
        let res = &self.pairs;
        df!(
            "ref_chain" => res.iter().map(|x| x.reference.chain.to_owned()).collect::<Vec<String>>(),
            "ref_resn" => res.iter().map(|x| x.reference.resn.to_owned()).collect::<Vec<String>>(),
            "ref_resi" => res.iter().map(|x| x.reference.resi as i64).collect::<Vec<i64>>(),
            "ref_insertion" => res.iter().map(|x| x.reference.insertion.to_owned()).collect::<Vec<String>>(),
            "chain" => res.iter().map(|x| x.model.chain.to_owned()).collect::<Vec<String>>(),
            "resn" => res.iter().map(|x| x.model.resn.to_owned()).collect::<Vec<String>>(),
            "resi" => res.iter().map(|x| x.model.resi as i64).collect::<Vec<i64>>(),
            "insertion" => res.iter().map(|x| x.model.insertion.to_owned()).collect::<Vec<String>>(),
            "deviation" => res.iter().map(|x| x.deviation).collect::<Vec<f64>>(),
        )
    }
}

/// Collect the alpha-carbon of every residue in `model`.
///
/// Fails on the first residue that has no alpha-carbon.
pub fn select_alpha_carbons(model: &Model) -> Result<Vec<(ResidueId, na::Vector3<f64>)>> {
    let mut selected = Vec::with_capacity(model.residue_count());
    for chain in model.chains() {
        for residue in chain.residues() {
            let id = ResidueId::new(chain, residue);
            let atom = residue.alpha_carbon().ok_or_else(|| Error::MissingAtom {
                chain: id.chain.clone(),
                residue: id.to_string(),
                atom: ALPHA_CARBON.to_string(),
            })?;
            let (x, y, z) = atom.pos();
            selected.push((id, na::Vector3::new(x, y, z)));
        }
    }
    Ok(selected)
}

/// Move every atom of `model` with `superposition`.
pub fn transform_model(model: &mut Model, superposition: &Superposition) -> Result<()> {
    for atom in model.atoms_mut() {
        let serial = atom.serial_number();
        let moved = superposition.apply_tuple(atom.pos());
        atom.set_pos(moved)
            .map_err(|details| Error::Coordinate { serial, details })?;
    }
    Ok(())
}

/// Superimpose the first model of `model` onto the first model of `reference`.
///
/// Only the first model of `model` is moved; any further models are left as they are.
pub fn align_structures(reference: &PDB, model: &mut PDB) -> Result<Alignment> {
    let reference_model = reference.model(0).ok_or(Error::NoModel("reference"))?;
    let mobile_model = model.model_mut(0).ok_or(Error::NoModel("model"))?;

    let fixed = select_alpha_carbons(reference_model)?;
    let mobile = select_alpha_carbons(mobile_model)?;
    debug!(
        "Selected {} reference and {} model {} atoms",
        fixed.len(),
        mobile.len(),
        ALPHA_CARBON
    );

    let fixed_coords: Vec<_> = fixed.iter().map(|(_, p)| *p).collect();
    let mobile_coords: Vec<_> = mobile.iter().map(|(_, p)| *p).collect();
    let superposition = Superposition::fit(&fixed_coords, &mobile_coords)?;
    debug!(
        "Rotation:{}Translation: {:?}",
        superposition.rotation,
        superposition.translation.as_slice()
    );

    let deviations = superposition.deviations(&fixed_coords, &mobile_coords);
    let pairs = fixed
        .into_iter()
        .zip(mobile)
        .zip(deviations)
        .map(|(((reference, _), (model, _)), deviation)| AlignedPair {
            reference,
            model,
            deviation,
        })
        .collect();

    transform_model(mobile_model, &superposition)?;

    Ok(Alignment {
        superposition,
        pairs,
    })
}

/// `<dir>/<stem>_aligned.pdb`, where the stem is the file name up to its first dot.
pub fn aligned_output_path(model_file: &Path) -> PathBuf {
    let file_name = model_file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = file_name.split('.').next().unwrap_or_default();
    model_file.with_file_name(format!("{stem}_aligned.pdb"))
}

/// Load both structures, align them and save the moved model.
///
/// The aligned model goes to `output_file` if given, else to [`aligned_output_path`].
/// Returns the alignment together with the path that was written.
pub fn align_files(
    reference_file: &Path,
    model_file: &Path,
    output_file: Option<&Path>,
) -> Result<(Alignment, PathBuf)> {
    let (reference, reference_warnings) = load_structure(reference_file)?;
    log_pdb_warnings(&reference_warnings);
    let (mut model, model_warnings) = load_structure(model_file)?;
    log_pdb_warnings(&model_warnings);

    let alignment = align_structures(&reference, &mut model)?;
    info!(
        "Superimposed {} residue pairs with RMSD {:.3}",
        alignment.pairs.len(),
        alignment.rmsd()
    );

    let output_file = output_file
        .map(Path::to_path_buf)
        .unwrap_or_else(|| aligned_output_path(model_file));
    save_structure(&model, &output_file)?;
    info!("Aligned structure saved to {}", output_file.display());

    Ok((alignment, output_file))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backbone_path() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test-data/backbone.pdb")
    }

    fn load_backbone() -> PDB {
        load_structure(&backbone_path()).unwrap().0
    }

    fn ca_positions(pdb: &PDB) -> Vec<na::Vector3<f64>> {
        select_alpha_carbons(pdb.model(0).unwrap())
            .unwrap()
            .into_iter()
            .map(|(_, p)| p)
            .collect()
    }

    fn shift(pdb: &mut PDB, offset: (f64, f64, f64)) {
        for atom in pdb.atoms_mut() {
            let (x, y, z) = atom.pos();
            atom.set_pos((x + offset.0, y + offset.1, z + offset.2))
                .unwrap();
        }
    }

    #[test]
    fn selection_follows_chain_then_residue_order() {
        let pdb = load_backbone();
        let selected = select_alpha_carbons(pdb.model(0).unwrap()).unwrap();
        let labels: Vec<String> = selected
            .iter()
            .map(|(id, _)| format!("{}:{}", id.chain, id.resi))
            .collect();
        assert_eq!(
            labels,
            vec!["A:1", "A:2", "A:3", "A:4", "A:5", "B:10", "B:11", "B:12"]
        );
        assert_eq!(selected[0].1, na::Vector3::new(2.3, 0.0, 0.0));
    }

    #[test]
    fn missing_alpha_carbon_fails() {
        let mut pdb = load_backbone();
        pdb.remove_atoms_by(|atom| atom.serial_number() == 6);
        let result = select_alpha_carbons(pdb.model(0).unwrap());
        match result {
            Err(Error::MissingAtom { chain, residue, atom }) => {
                assert_eq!(chain, "A");
                assert_eq!(residue, "LYS2");
                assert_eq!(atom, "CA");
            }
            other => panic!("expected a missing atom error, got {other:?}"),
        }
    }

    #[test]
    fn self_alignment_is_identity() {
        let reference = load_backbone();
        let mut model = load_backbone();
        let alignment = align_structures(&reference, &mut model).unwrap();

        assert!(alignment.rmsd() < 1e-6);
        assert!((alignment.superposition.rotation - na::Matrix3::identity()).norm() < 1e-6);
        assert!(alignment.superposition.translation.norm() < 1e-6);
        assert_eq!(alignment.pairs.len(), 8);
    }

    #[test]
    fn translated_model_lands_on_reference() {
        let reference = load_backbone();
        let mut model = load_backbone();
        shift(&mut model, (12.0, -3.5, 40.0));

        let alignment = align_structures(&reference, &mut model).unwrap();
        assert!(alignment.rmsd() < 1e-6);
        for (a, b) in reference.atoms().zip(model.atoms()) {
            let (ra, rb) = (a.pos(), b.pos());
            assert!((ra.0 - rb.0).abs() < 1e-6);
            assert!((ra.1 - rb.1).abs() < 1e-6);
            assert!((ra.2 - rb.2).abs() < 1e-6);
        }
    }

    #[test]
    fn rotated_model_is_recovered() {
        let reference = load_backbone();
        let mut model = load_backbone();
        let rot = na::Rotation3::from_euler_angles(1.2, 0.4, -0.7);
        for atom in model.atoms_mut() {
            let (x, y, z) = atom.pos();
            let p = rot * na::Vector3::new(x, y, z);
            atom.set_pos((p.x, p.y, p.z)).unwrap();
        }

        let alignment = align_structures(&reference, &mut model).unwrap();
        assert!(alignment.rmsd() < 1e-6);
        let before = ca_positions(&reference);
        let after = ca_positions(&model);
        for (a, b) in before.iter().zip(&after) {
            assert!((a - b).norm() < 1e-6);
        }
    }

    #[test]
    fn differing_residue_counts_fail() {
        let reference = load_backbone();
        let mut model = load_backbone();
        model.remove_residues_by(|res| res.serial_number() == 12);

        let result = align_structures(&reference, &mut model);
        assert!(matches!(
            result,
            Err(Error::LengthMismatch {
                reference: 8,
                mobile: 7
            })
        ));
    }

    #[test]
    fn deviation_table_has_one_row_per_pair() {
        let reference = load_backbone();
        let mut model = load_backbone();
        let alignment = align_structures(&reference, &mut model).unwrap();
        let df = alignment.to_df().unwrap();
        assert_eq!(df.height(), 8);
        assert_eq!(df.width(), 9);
    }

    #[test]
    fn output_path_uses_stem_before_first_dot() {
        assert_eq!(
            aligned_output_path(Path::new("data/model.pdb")),
            PathBuf::from("data/model_aligned.pdb")
        );
        assert_eq!(
            aligned_output_path(Path::new("pdb_seq.B99990001.pdb")),
            PathBuf::from("pdb_seq_aligned.pdb")
        );
    }

    #[test]
    fn align_files_writes_moved_model() {
        let dir = tempfile::tempdir().unwrap();
        let mut model = load_backbone();
        shift(&mut model, (-5.0, 5.0, 2.5));
        let model_file = dir.path().join("shifted.pdb");
        save_structure(&model, &model_file).unwrap();

        let (alignment, written) = align_files(&backbone_path(), &model_file, None).unwrap();
        assert_eq!(written, dir.path().join("shifted_aligned.pdb"));
        assert!(alignment.rmsd() < 1e-3);

        let (aligned, _) = load_structure(&written).unwrap();
        let reference = load_backbone();
        for (a, b) in ca_positions(&reference).iter().zip(&ca_positions(&aligned)) {
            // PDB coordinates carry three decimals
            assert!((a - b).norm() < 2e-3);
        }
    }
}
