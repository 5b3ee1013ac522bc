use crate::errors::*;
use crate::input::FileFormat;
use std::fs::DirBuilder;
use std::path::{Path, PathBuf};

/// `OutputPath` represents the directory, which all files of one experiment
/// are written to.
#[derive(Debug, Clone)]
pub struct OutputPath {
    path: PathBuf,
}

impl OutputPath {
    pub fn new(root: &Path, experiment_name: &str) -> OutputPath {
        OutputPath {
            path: root.join(experiment_name),
        }
    }

    pub fn create(&self) -> Result<()> {
        DirBuilder::new()
            .recursive(true)
            .create(&self.path)
            .chain_err(|| {
                format!(
                    "Unable to create output directory '{}'",
                    self.path.display()
                )
            })
    }

    pub fn dir(&self) -> &Path {
        &self.path
    }

    /// Returns the path of a file in the output directory.
    pub fn file(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }

    /// Returns the path of the FTLE artifact of window `index`.
    pub fn artifact(&self, index: usize, format: FileFormat) -> PathBuf {
        self.file(&format!("ftle_{:04}.{}", index, format.extension()))
    }
}
