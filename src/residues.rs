use pdbtbx::*;

/// Name of the backbone reference atom used for superposition.
pub const ALPHA_CARBON: &str = "CA";

/// The struct for a residue identifier
#[derive(Debug, Hash, PartialEq, Eq, Clone)]
pub struct ResidueId {
    /// Chain identifier
    pub chain: String,
    /// Residue index
    pub resi: isize,
    /// Residue insertion code
    pub insertion: String,
    /// Residue name
    pub resn: String,
}

impl ResidueId {
    /// Build an identifier for `residue` inside `chain`.
    pub fn new(chain: &Chain, residue: &Residue) -> Self {
        let (resi, insertion) = residue.id();
        Self {
            chain: chain.id().to_string(),
            resi,
            insertion: insertion.unwrap_or("").to_string(),
            resn: residue.name().unwrap_or("").to_string(),
        }
    }
}

impl std::fmt::Display for ResidueId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}{}{}", self.resn, self.resi, self.insertion)
    }
}

/// Residue helpers on top of [`pdbtbx::Residue`].
pub trait ResidueExt {
    /// The residue one-letter code, or `None` if it's not an amino acid.
    fn resn(&self) -> Option<&str>;

    /// The first atom named `name` in any conformer of the residue.
    fn find_atom(&self, name: &str) -> Option<&Atom>;

    /// The alpha-carbon of the residue.
    fn alpha_carbon(&self) -> Option<&Atom> {
        self.find_atom(ALPHA_CARBON)
    }
}

impl ResidueExt for Residue {
    fn resn(&self) -> Option<&str> {
        let aa_code = match self.name().unwrap_or("").to_uppercase().as_str() {
            "ALA" => "A",
            "ARG" => "R",
            "ASN" => "N",
            "ASP" => "D",
            "CYS" => "C",
            "GLN" => "Q",
            "GLU" => "E",
            "GLY" => "G",
            "HIS" => "H",
            "ILE" => "I",
            "LEU" => "L",
            "LYS" => "K",
            "MET" => "M",
            "PHE" => "F",
            "PRO" => "P",
            "SER" => "S",
            "THR" => "T",
            "TRP" => "W",
            "TYR" => "Y",
            "VAL" => "V",
            _ => "X",
        };

        match aa_code {
            "X" => None,
            _ => Some(aa_code),
        }
    }

    fn find_atom(&self, name: &str) -> Option<&Atom> {
        // Conformers are visited in file order, so the first altloc wins
        self.atoms().find(|atom| atom.name() == name)
    }
}
