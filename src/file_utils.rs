//! Helpers for the text files listing the input files of a run.

use crate::errors::*;
use log::{info, warn};
use std::fs::{self, File};
use std::io::prelude::*;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// Recursively collects all files below `root` whose file name contains
/// `pattern`. Returns them sorted.
pub fn find_files_with_pattern(root: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    visit(root, pattern, &mut found)?;
    found.sort();

    Ok(found)
}

fn visit(dir: &Path, pattern: &str, found: &mut Vec<PathBuf>) -> Result<()> {
    let entries =
        fs::read_dir(dir).chain_err(|| format!("Unable to read directory '{}'.", dir.display()))?;

    for entry in entries {
        let path = entry?.path();

        if path.is_dir() {
            visit(&path, pattern, found)?;
        } else if path
            .file_name()
            .and_then(|n| n.to_str())
            .map_or(false, |n| n.contains(pattern))
        {
            found.push(path);
        }
    }

    Ok(())
}

/// Writes one path per line.
pub fn write_list_to_txt<P: AsRef<Path>>(list: &[P], output_file: &Path) -> Result<()> {
    let f = File::create(output_file)
        .chain_err(|| format!("Unable to create file '{}'.", output_file.display()))?;
    let mut w = BufWriter::new(f);

    for p in list {
        writeln!(w, "{}", p.as_ref().display())?;
    }

    w.flush()?;

    Ok(())
}

/// Names of the lists written by `write_input_lists`.
pub const VELOCITY_LIST: &str = "inputs_velocity.txt";
pub const GRID_LIST: &str = "inputs_grid.txt";
pub const PARTICLE_LIST: &str = "inputs_particle.txt";

/// Lists the files below `root` whose names contain "velocities", "grid" and
/// "particles" in three text files in `output_dir`. Returns the number of
/// files in each list.
pub fn write_input_lists(root: &Path, output_dir: &Path) -> Result<[usize; 3]> {
    let mut counts = [0; 3];

    for (i, (pattern, list)) in [
        ("velocities", VELOCITY_LIST),
        ("grid", GRID_LIST),
        ("particles", PARTICLE_LIST),
    ]
    .iter()
    .enumerate()
    {
        let files = find_files_with_pattern(root, pattern)?;
        if files.is_empty() {
            warn!("No {} files found below '{}'.", pattern, root.display());
        }

        let path = output_dir.join(list);
        write_list_to_txt(&files, &path)?;
        info!("{} file list saved to '{}'.", pattern, path.display());

        counts[i] = files.len();
    }

    Ok(counts)
}

/// Reads a list written by `write_list_to_txt`. Surrounding whitespace is
/// trimmed and blank lines are ignored, the entries are returned as given.
pub fn read_files_list(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .chain_err(|| format!("Unable to read file list '{}'.", path.display()))?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect())
}
