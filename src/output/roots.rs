//! Roots files: the input list for roots-file mode and the discovered-roots
//! output of discovery runs. One URL per line.

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Reads root URLs from `path`
///
/// Lines are trimmed, blank lines skipped and repeated URLs dropped (first
/// occurrence wins). At most `max_roots` URLs are returned.
pub fn read_roots_file(path: &Path, max_roots: usize) -> io::Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    let mut seen = HashSet::new();

    let roots: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| seen.insert(line.to_string()))
        .take(max_roots)
        .map(str::to_string)
        .collect();

    tracing::debug!("Read {} roots from {}", roots.len(), path.display());
    Ok(roots)
}

/// Writes discovered roots to a file
pub struct RootsWriter {
    path: PathBuf,
    file: File,
}

impl RootsWriter {
    /// Creates or truncates the file at `path`
    pub fn create(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    /// Appends one root and flushes it to disk
    pub fn append(&mut self, url: &str) -> io::Result<()> {
        writeln!(self.file, "{}", url)?;
        self.file.flush()
    }

    /// Writes every root in one go
    pub fn write_all<S: AsRef<str>>(mut self, roots: &[S]) -> io::Result<()> {
        let mut out = BufWriter::new(&mut self.file);
        for root in roots {
            writeln!(out, "{}", root.as_ref())?;
        }
        out.flush()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
