use std::path::PathBuf;
use thiserror::Error;

/// Convenience alias used across the library.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while aligning structures or building models.
#[derive(Debug, Error)]
pub enum Error {
    /// Filesystem failure on a specific path.
    #[error("I/O error on '{path}': {source}", path = path.display())]
    Io {
        /// Path being read or written
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The structure file could not be parsed.
    #[error("Failed to parse structure '{path}': {details}", path = path.display())]
    Parse {
        /// Path of the structure file
        path: PathBuf,
        /// Joined parser messages
        details: String,
    },

    /// The structure could not be written.
    #[error("Failed to write structure '{path}': {details}", path = path.display())]
    Write {
        /// Destination path
        path: PathBuf,
        /// Joined writer messages
        details: String,
    },

    /// The structure contains no models.
    #[error("The {0} structure contains no models")]
    NoModel(&'static str),

    /// A residue lacks the atom used for superposition.
    #[error("Residue {chain}/{residue} has no {atom} atom")]
    MissingAtom {
        /// Chain identifier
        chain: String,
        /// Residue number and insertion code
        residue: String,
        /// Atom name that was looked up
        atom: String,
    },

    /// The two point sets to superimpose differ in size.
    #[error("Fixed and moving atom lists differ in size: {reference} vs {mobile}")]
    LengthMismatch {
        /// Number of reference atoms
        reference: usize,
        /// Number of mobile atoms
        mobile: usize,
    },

    /// No atoms were selected for superposition.
    #[error("No atoms selected for superposition")]
    EmptySelection,

    /// SVD of the covariance matrix did not produce both singular vector sets.
    #[error("Singular value decomposition failed")]
    Svd,

    /// A coordinate could not be assigned to an atom.
    #[error("Invalid coordinate for atom {serial}: {details}")]
    Coordinate {
        /// Atom serial number
        serial: usize,
        /// Message from the structure library
        details: String,
    },

    /// The target sequence cannot be written as a PIR record.
    #[error("Invalid target sequence: {0}")]
    InvalidSequence(String),

    /// The label cannot be used as a PDB chain identifier.
    #[error("Invalid chain label {0:?}: expected a single printable ASCII character")]
    InvalidChainLabel(String),

    /// Malformed PIR alignment content.
    #[error("Malformed PIR alignment '{path}': {details}", path = path.display())]
    Pir {
        /// Alignment file path
        path: PathBuf,
        /// What was wrong
        details: String,
    },

    /// An expected entry is missing from the combined alignment.
    #[error("Alignment '{path}' has no entry for '{code}'", path = path.display())]
    MissingAlignmentEntry {
        /// Alignment file path
        path: PathBuf,
        /// Align code that was looked up
        code: String,
    },

    /// The external modeling program failed.
    #[error("Modeling step '{step}' failed ({status}): {stderr}")]
    Backend {
        /// Step name, e.g. `align2d` or `build`
        step: &'static str,
        /// Exit status description
        status: String,
        /// Tail of the captured standard error
        stderr: String,
    },

    /// The modeling step reported success but the model file does not exist.
    #[error("Expected model file '{0}' was not produced")]
    MissingModel(PathBuf),

    /// DataFrame construction or serialization failed.
    #[error(transparent)]
    Polars(#[from] polars::error::PolarsError),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
