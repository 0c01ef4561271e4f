// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Bookkeeping of generated files and directories.

use std::path::{Path, PathBuf};

/// Files and directories produced by a generation step.
///
/// # Invariant
///
/// - Insertion order is preserved.
/// - No path is listed twice.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GeneratedArtifacts {
    files: Vec<PathBuf>,
    dirs: Vec<PathBuf>,
}

impl GeneratedArtifacts {
    /// Construct new empty artifact listing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record generated file.
    pub fn push_file(&mut self, path: impl Into<PathBuf>) {
        push_unique(&mut self.files, path.into());
    }

    /// Record generated directory.
    pub fn push_dir(&mut self, path: impl Into<PathBuf>) {
        push_unique(&mut self.dirs, path.into());
    }

    /// Merge artifacts of another step after our own.
    pub fn merge(&mut self, other: GeneratedArtifacts) {
        for file in other.files {
            push_unique(&mut self.files, file);
        }

        for dir in other.dirs {
            push_unique(&mut self.dirs, dir);
        }
    }

    /// Generated files in insertion order.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Generated directories in insertion order.
    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// Check if file was recorded.
    pub fn contains_file(&self, path: impl AsRef<Path>) -> bool {
        self.files.iter().any(|file| file == path.as_ref())
    }
}

fn push_unique(list: &mut Vec<PathBuf>, path: PathBuf) {
    if !list.contains(&path) {
        list.push(path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn merge_keeps_order_without_duplicates() {
        let mut first = GeneratedArtifacts::new();
        first.push_file("a.pkg");
        first.push_file("b.pkg");
        first.push_file("a.pkg");
        first.push_dir("stubs");

        let mut second = GeneratedArtifacts::new();
        second.push_file("c.rss");
        second.push_file("b.pkg");
        second.push_dir("stubs");

        first.merge(second);
        assert_eq!(
            first.files(),
            &[PathBuf::from("a.pkg"), PathBuf::from("b.pkg"), PathBuf::from("c.rss")]
        );
        assert_eq!(first.dirs(), &[PathBuf::from("stubs")]);
        assert!(first.contains_file("c.rss"));
    }
}
