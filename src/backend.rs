//! External comparative-modeling programs.
//!
//! Sequence-to-structure alignment and model construction are not done in
//! this crate. A [`ModelBackend`] receives fully resolved requests and is
//! expected to leave its output files in the working directory.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info, trace, warn};

/// Structure-aware alignment of a target sequence against one template.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Align2dRequest {
    /// Directory the program runs in
    pub workdir: PathBuf,
    /// Template structure file
    pub template_file: PathBuf,
    /// Align code given to the template
    pub template_code: String,
    /// PIR file holding the target sequence
    pub sequence_file: PathBuf,
    /// Align code of the target sequence
    pub sequence_code: String,
    /// Combined PIR alignment to produce
    pub output_file: PathBuf,
}

/// Model construction from a combined alignment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildRequest {
    /// Directory the program runs in
    pub workdir: PathBuf,
    /// Combined PIR alignment
    pub alignment_file: PathBuf,
    /// Align code of the known structure
    pub known_code: String,
    /// Align code of the target sequence
    pub sequence_code: String,
    /// Directories searched for atom files
    pub atom_dirs: Vec<PathBuf>,
    /// Index of the first model to build
    pub starting_model: usize,
    /// Index of the last model to build
    pub ending_model: usize,
}

impl BuildRequest {
    /// Model files expected in `workdir` once the build has run.
    pub fn expected_models(&self) -> Vec<PathBuf> {
        (self.starting_model..=self.ending_model)
            .map(|i| self.workdir.join(model_file_name(&self.sequence_code, i)))
            .collect()
    }
}

/// File name of the `index`-th model built for `sequence_code`.
pub fn model_file_name(sequence_code: &str, index: usize) -> String {
    format!("{sequence_code}.B9999{index:04}.pdb")
}

/// A program that can align a sequence to a template and build models from it.
pub trait ModelBackend {
    /// Align the target sequence to the template and write the combined alignment.
    fn align2d(&self, request: &Align2dRequest) -> Result<()>;

    /// Build models and return the paths of the model files.
    fn build(&self, request: &BuildRequest) -> Result<Vec<PathBuf>>;
}

/// Drives the MODELLER Python package through a Python interpreter.
#[derive(Clone, Debug)]
pub struct Modeller {
    /// Interpreter with `modeller` importable
    pub python: PathBuf,
    /// Ask MODELLER for verbose logs
    pub verbose: bool,
}

impl Default for Modeller {
    fn default() -> Self {
        Self {
            python: PathBuf::from("python3"),
            verbose: true,
        }
    }
}

/// Quote `value` as a Python string literal.
fn py_str(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for c in value.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '\'' => quoted.push_str("\\'"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            c if c.is_control() => quoted.push_str(&format!("\\x{:02x}", c as u32)),
            c => quoted.push(c),
        }
    }
    quoted.push('\'');
    quoted
}

fn py_path(path: &Path) -> String {
    py_str(&path.to_string_lossy())
}

impl Modeller {
    fn preamble(&self) -> String {
        let mut script = String::from("from modeller import *\nfrom modeller.automodel import *\n");
        if self.verbose {
            script.push_str("log.verbose()\n");
        }
        script.push_str("env = environ()\n");
        script
    }

    pub(crate) fn align2d_script(&self, request: &Align2dRequest) -> String {
        let template = py_path(&request.template_file);
        let template_code = py_str(&request.template_code);
        format!(
            "{preamble}aln = alignment(env)\n\
             mdl = model(env, file={template})\n\
             aln.append_model(mdl, align_codes={template_code}, atom_files={template})\n\
             aln.append(file={sequence_file}, align_codes={sequence_code})\n\
             aln.align2d()\n\
             aln.write(file={output}, alignment_format='PIR')\n",
            preamble = self.preamble(),
            sequence_file = py_path(&request.sequence_file),
            sequence_code = py_str(&request.sequence_code),
            output = py_path(&request.output_file),
        )
    }

    pub(crate) fn build_script(&self, request: &BuildRequest) -> String {
        let atom_dirs = request
            .atom_dirs
            .iter()
            .map(|d| py_path(d))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "{preamble}env.io.atom_files_directory = [{atom_dirs}]\n\
             a = automodel(env, alnfile={alignment}, knowns={known}, sequence={sequence})\n\
             a.starting_model = {start}\n\
             a.ending_model = {end}\n\
             a.make()\n",
            preamble = self.preamble(),
            alignment = py_path(&request.alignment_file),
            known = py_str(&request.known_code),
            sequence = py_str(&request.sequence_code),
            start = request.starting_model,
            end = request.ending_model,
        )
    }

    fn run(&self, step: &'static str, workdir: &Path, script: &str) -> Result<()> {
        trace!("MODELLER {step} script:\n{script}");
        info!("Running MODELLER {step} with {}", self.python.display());
        let output = Command::new(&self.python)
            .arg("-c")
            .arg(script)
            .current_dir(workdir)
            .output()
            .map_err(|e| Error::io(&self.python, e))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        for line in stdout.lines() {
            debug!("{line}");
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            let tail: Vec<&str> = stderr.lines().rev().take(20).collect();
            return Err(Error::Backend {
                step,
                status: output.status.to_string(),
                stderr: tail.into_iter().rev().collect::<Vec<_>>().join("\n"),
            });
        }
        for line in stderr.lines() {
            warn!("{line}");
        }
        Ok(())
    }
}

impl ModelBackend for Modeller {
    fn align2d(&self, request: &Align2dRequest) -> Result<()> {
        self.run("align2d", &request.workdir, &self.align2d_script(request))
    }

    fn build(&self, request: &BuildRequest) -> Result<Vec<PathBuf>> {
        self.run("build", &request.workdir, &self.build_script(request))?;
        Ok(request.expected_models())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_request() -> BuildRequest {
        BuildRequest {
            workdir: PathBuf::from("/tmp/run"),
            alignment_file: PathBuf::from("alignment_for_full_atoms.ali"),
            known_code: "backbone".to_string(),
            sequence_code: "pdb_seq".to_string(),
            atom_dirs: vec![PathBuf::from("."), PathBuf::from("../atom_files")],
            starting_model: 1,
            ending_model: 1,
        }
    }

    #[test]
    fn model_names_follow_modeller_convention() {
        assert_eq!(model_file_name("pdb_seq", 1), "pdb_seq.B99990001.pdb");
        assert_eq!(model_file_name("target", 12), "target.B99990012.pdb");

        let mut request = build_request();
        request.ending_model = 3;
        assert_eq!(
            request.expected_models(),
            vec![
                PathBuf::from("/tmp/run/pdb_seq.B99990001.pdb"),
                PathBuf::from("/tmp/run/pdb_seq.B99990002.pdb"),
                PathBuf::from("/tmp/run/pdb_seq.B99990003.pdb"),
            ]
        );
    }

    #[test]
    fn python_literals_are_escaped() {
        assert_eq!(py_str("plain"), "'plain'");
        assert_eq!(py_str("it's"), r"'it\'s'");
        assert_eq!(py_str(r"C:\data"), r"'C:\\data'");
        assert_eq!(py_str("a\nb"), r"'a\nb'");
    }

    #[test]
    fn build_script_sets_single_model() {
        let script = Modeller::default().build_script(&build_request());
        assert!(script.contains("env.io.atom_files_directory = ['.', '../atom_files']"));
        assert!(script.contains(
            "a = automodel(env, alnfile='alignment_for_full_atoms.ali', knowns='backbone', sequence='pdb_seq')"
        ));
        assert!(script.contains("a.starting_model = 1\n"));
        assert!(script.contains("a.ending_model = 1\n"));
        assert!(script.ends_with("a.make()\n"));
    }

    #[test]
    fn align2d_script_writes_pir() {
        let request = Align2dRequest {
            workdir: PathBuf::from("."),
            template_file: PathBuf::from("/data/backbone.pdb"),
            template_code: "backbone".to_string(),
            sequence_file: PathBuf::from("pdb_seq.ali"),
            sequence_code: "pdb_seq".to_string(),
            output_file: PathBuf::from("alignment_for_full_atoms.ali"),
        };
        let modeller = Modeller {
            verbose: false,
            ..Default::default()
        };
        let script = modeller.align2d_script(&request);
        assert!(!script.contains("log.verbose()"));
        assert!(script.contains("mdl = model(env, file='/data/backbone.pdb')"));
        assert!(script.contains("aln.append(file='pdb_seq.ali', align_codes='pdb_seq')"));
        assert!(script.contains("aln.write(file='alignment_for_full_atoms.ali', alignment_format='PIR')"));
    }

    #[test]
    fn missing_interpreter_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let modeller = Modeller {
            python: dir.path().join("no-such-python"),
            verbose: false,
        };
        let mut request = build_request();
        request.workdir = dir.path().to_path_buf();
        assert!(matches!(modeller.build(&request), Err(Error::Io { .. })));
    }
}
