//! Reading and writing PIR alignment files.
//!
//! A PIR entry is a `>P1;<code>` line, a colon-separated description line
//! (`sequence:...` or `structureX:...`), and the sequence itself spread
//! over any number of lines and closed by `*`.

use crate::error::{Error, Result};
use std::fmt;
use std::path::Path;

/// Terminator of every PIR sequence.
pub const SENTINEL: char = '*';
const ENTRY_PREFIX: &str = ">P1;";
const GAP: char = '-';

/// A single entry of a PIR alignment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PirEntry {
    /// Align code following `>P1;`
    pub code: String,
    /// The description line
    pub description: String,
    /// Aligned sequence without the trailing sentinel
    pub sequence: String,
}

impl PirEntry {
    /// A plain sequence entry with no structural information.
    pub fn sequence(code: &str, sequence: &str) -> Self {
        Self {
            code: code.to_string(),
            description: format!("sequence:{code}:::::::0.00: 0.00"),
            sequence: sequence.to_string(),
        }
    }

    /// Kind of entry, the first field of the description line.
    pub fn kind(&self) -> &str {
        self.description.split(':').next().unwrap_or("")
    }

    /// Number of residues, ignoring gaps and chain breaks.
    pub fn residue_count(&self) -> usize {
        self.sequence
            .chars()
            .filter(|c| *c != GAP && *c != '/')
            .count()
    }
}

impl fmt::Display for PirEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{ENTRY_PREFIX}{}", self.code)?;
        writeln!(f, "{}", self.description)?;
        writeln!(f, "{}{SENTINEL}", self.sequence)
    }
}

/// Check that `sequence` can be written as a single PIR sequence line.
///
/// The sequence is never altered, so anything that would end the record early
/// or break the line structure is rejected.
pub fn validate_sequence(sequence: &str) -> Result<()> {
    if sequence.is_empty() {
        return Err(Error::InvalidSequence("sequence is empty".to_string()));
    }
    if let Some((i, c)) = sequence
        .char_indices()
        .find(|&(_, c)| !c.is_ascii_graphic() || matches!(c, '*' | '>' | ':' | ';'))
    {
        return Err(Error::InvalidSequence(format!(
            "unexpected character {c:?} at position {}",
            i + 1
        )));
    }
    Ok(())
}

/// Write a three-line sequence entry to `path`, replacing any existing file.
pub fn write_sequence_file(path: &Path, code: &str, sequence: &str) -> Result<PirEntry> {
    validate_sequence(sequence)?;
    let entry = PirEntry::sequence(code, sequence);
    std::fs::write(path, entry.to_string()).map_err(|e| Error::io(path, e))?;
    Ok(entry)
}

/// Parse every entry in a PIR alignment.
///
/// `path` is only used in error messages.
pub fn parse_alignment(text: &str, path: &Path) -> Result<Vec<PirEntry>> {
    let malformed = |details: String| Error::Pir {
        path: path.to_path_buf(),
        details,
    };

    let mut entries = Vec::new();
    let mut lines = text
        .lines()
        .map(str::trim_end)
        .enumerate()
        .filter(|(_, l)| !l.is_empty() && !l.starts_with("C;") && !l.starts_with("R;"));

    while let Some((lineno, line)) = lines.next() {
        let code = line
            .strip_prefix('>')
            .and_then(|rest| rest.split_once(';'))
            .map(|(_, code)| code.trim().to_string())
            .ok_or_else(|| malformed(format!("line {}: expected an entry header", lineno + 1)))?;

        let (_, description) = lines
            .next()
            .ok_or_else(|| malformed(format!("entry '{code}' has no description line")))?;

        let mut sequence = String::new();
        let mut closed = false;
        for (_, seq_line) in lines.by_ref() {
            let chunk: String = seq_line.chars().filter(|c| !c.is_whitespace()).collect();
            if let Some(end) = chunk.find(SENTINEL) {
                sequence.push_str(&chunk[..end]);
                closed = true;
                break;
            }
            sequence.push_str(&chunk);
        }
        if !closed {
            return Err(malformed(format!(
                "entry '{code}' is not terminated by '{SENTINEL}'"
            )));
        }

        entries.push(PirEntry {
            code,
            description: description.to_string(),
            sequence,
        });
    }

    Ok(entries)
}

/// Read and parse a PIR alignment file.
pub fn read_alignment(path: &Path) -> Result<Vec<PirEntry>> {
    let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    parse_alignment(&text, path)
}

/// Fraction of identical residues over the columns where neither entry has a gap.
///
/// Returns `None` if the two entries share no aligned residue.
pub fn sequence_identity(a: &PirEntry, b: &PirEntry) -> Option<f64> {
    let (mut aligned, mut identical) = (0usize, 0usize);
    for (x, y) in a.sequence.chars().zip(b.sequence.chars()) {
        if x == GAP || y == GAP || x == '/' || y == '/' {
            continue;
        }
        aligned += 1;
        if x.eq_ignore_ascii_case(&y) {
            identical += 1;
        }
    }
    match aligned {
        0 => None,
        n => Some(identical as f64 / n as f64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMBINED: &str = "\
>P1;backbone
structureX:backbone:1:A:+8:B:::-1.00:-1.00
MKIEG/
ASW*

>P1;pdb_seq
sequence:pdb_seq:::::::0.00: 0.00
MKVEG/
A-W*
";

    #[test]
    fn sequence_entry_is_three_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pdb_seq.ali");
        let sequence = "MKIEGASWLLVQRTYHNDCF";
        write_sequence_file(&path, "pdb_seq", sequence).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], ">P1;pdb_seq");
        assert_eq!(lines[1], "sequence:pdb_seq:::::::0.00: 0.00");
        assert_eq!(lines[2], format!("{sequence}*"));
    }

    #[test]
    fn rewriting_replaces_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pdb_seq.ali");
        write_sequence_file(&path, "pdb_seq", "MKIEGASWLLVQRTYHNDCF").unwrap();
        write_sequence_file(&path, "pdb_seq", "GAS").unwrap();
        let second_size = std::fs::metadata(&path).unwrap().len();

        let fresh = dir.path().join("fresh.ali");
        write_sequence_file(&fresh, "pdb_seq", "GAS").unwrap();
        assert_eq!(second_size, std::fs::metadata(&fresh).unwrap().len());
    }

    #[test]
    fn invalid_sequences_are_rejected() {
        assert!(matches!(validate_sequence(""), Err(Error::InvalidSequence(_))));
        assert!(matches!(validate_sequence("MK*EG"), Err(Error::InvalidSequence(_))));
        assert!(matches!(validate_sequence("MK EG"), Err(Error::InvalidSequence(_))));
        assert!(matches!(validate_sequence("MK\nEG"), Err(Error::InvalidSequence(_))));
        assert!(validate_sequence("MKIEG/ASW").is_ok());
    }

    #[test]
    fn parse_combined_alignment() {
        let entries = parse_alignment(COMBINED, Path::new("combined.ali")).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].code, "backbone");
        assert_eq!(entries[0].kind(), "structureX");
        assert_eq!(entries[0].sequence, "MKIEG/ASW");
        assert_eq!(entries[0].residue_count(), 8);
        assert_eq!(entries[1].kind(), "sequence");
        assert_eq!(entries[1].sequence, "MKVEG/A-W");
        assert_eq!(entries[1].residue_count(), 7);
    }

    #[test]
    fn written_entry_parses_back() {
        let entry = PirEntry::sequence("pdb_seq", "MKIEG");
        let parsed = parse_alignment(&entry.to_string(), Path::new("x.ali")).unwrap();
        assert_eq!(parsed, vec![entry]);
    }

    #[test]
    fn unterminated_entry_fails() {
        let text = ">P1;pdb_seq\nsequence:pdb_seq:::::::0.00: 0.00\nMKIEG\n";
        let result = parse_alignment(text, Path::new("broken.ali"));
        assert!(matches!(result, Err(Error::Pir { .. })));
    }

    #[test]
    fn identity_skips_gaps() {
        let entries = parse_alignment(COMBINED, Path::new("combined.ali")).unwrap();
        let identity = sequence_identity(&entries[0], &entries[1]).unwrap();
        // 7 aligned columns, 6 identical
        assert!((identity - 6.0 / 7.0).abs() < 1e-12);

        let gaps = PirEntry::sequence("gaps", "---");
        assert_eq!(sequence_identity(&entries[0], &gaps), None);
    }
}
