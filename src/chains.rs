use crate::residues::ResidueExt;
use pdbtbx::*;

/// Chain helpers on top of [`pdbtbx::Chain`].
pub trait ChainExt {
    /// One-letter codes of the chain, with `X` for unknown residues.
    fn pdb_seq(&self) -> Vec<&str>;
}

impl ChainExt for Chain {
    fn pdb_seq(&self) -> Vec<&str> {
        // Load the amino acid sequence for each chain
        self.residues().map(|res| res.resn().unwrap_or("X")).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::load_structure;
    use std::path::PathBuf;

    #[test]
    fn chain_sequences() {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test-data/backbone.pdb");
        let (pdb, _) = load_structure(&path).unwrap();
        let seqs: Vec<String> = pdb.chains().map(|c| c.pdb_seq().join("")).collect();
        assert_eq!(seqs, vec!["MKIEG".to_string(), "ASW".to_string()]);
    }
}
