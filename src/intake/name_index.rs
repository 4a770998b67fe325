//! Deduplicated list of submitted student names, one per line.

use std::fs::{self, OpenOptions};
use std::io::Write as _;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct NameIndex {
    path: PathBuf,
}

impl NameIndex {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All indexed names. A missing file is an empty index.
    pub fn names(&self) -> std::io::Result<Vec<String>> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(text
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_owned)
                .collect()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    pub fn contains(&self, name: &str) -> std::io::Result<bool> {
        Ok(self.names()?.iter().any(|n| n == name))
    }

    /// Append `name` unless already present. Returns whether it was added.
    pub fn insert(&self, name: &str) -> std::io::Result<bool> {
        if self.contains(name)? {
            return Ok(false);
        }

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{name}")?;
        Ok(true)
    }
}
