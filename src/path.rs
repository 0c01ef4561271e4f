// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Path resolution utilities.
//!
//! Two kinds of paths flow through sisgen. __Host paths__ name files on the
//! machine running the generator, and are handled as [`Path`]s through the
//! [`FileSystem`] seam. __Target paths__ name locations on the device file
//! system, e.g., `!:/private/e1234567` or `c:/sys/bin`. Target paths may
//! carry a drive letter that means nothing to the host, so they are kept as
//! plain strings with forward slash separators.

use glob::{MatchOptions, Pattern};
use ignore::WalkBuilder;
use std::{
    fs::{copy, write},
    path::{Component, Path, PathBuf},
};
use tracing::{debug, warn};

/// File system primitives consumed by deployment resolution.
///
/// Nothing here is allowed to fail loudly except the two write operations.
/// Queries against missing paths simply answer "no" or "nothing".
pub trait FileSystem {
    /// Check if path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Check if path exists and is a directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// Make path absolute with `.` and `..` segments collapsed.
    fn absolute(&self, path: &Path) -> PathBuf;

    /// List regular files under `root` whose file name matches `pattern`.
    ///
    /// Directories and symbolic links are never listed. Subdirectories are
    /// only descended into when `recursive` is set. Results are sorted by
    /// file name per directory.
    fn find_files(&self, root: &Path, pattern: &str, recursive: bool) -> Vec<PathBuf>;

    /// Create directory along with any missing parents.
    ///
    /// # Errors
    ///
    /// - Return [`FsError::CreateDir`] if directory cannot be created.
    fn make_dir(&self, path: &Path) -> Result<()>;

    /// Write string contents to file, replacing it if it exists.
    ///
    /// # Errors
    ///
    /// - Return [`FsError::WriteFile`] if file cannot be written.
    fn write_file(&self, path: &Path, contents: &str) -> Result<()>;

    /// Copy file, creating missing parent directories of destination.
    ///
    /// # Errors
    ///
    /// - Return [`FsError::CreateDir`] if parent directory cannot be created.
    /// - Return [`FsError::CopyFile`] if file cannot be copied.
    fn copy_file(&self, from: &Path, to: &Path) -> Result<()>;
}

/// Host file system access.
#[derive(Debug, Default, Clone, Copy)]
pub struct HostFileSystem;

impl HostFileSystem {
    /// Construct new host file system accessor.
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for HostFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn absolute(&self, path: &Path) -> PathBuf {
        let path = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        normalize(path)
    }

    fn find_files(&self, root: &Path, pattern: &str, recursive: bool) -> Vec<PathBuf> {
        let pattern = match Pattern::new(pattern) {
            Ok(pattern) => pattern,
            Err(error) => {
                warn!("invalid file name pattern {pattern:?}: {error}");
                return Vec::new();
            }
        };
        let options = MatchOptions {
            case_sensitive: !cfg!(windows),
            require_literal_separator: true,
            require_literal_leading_dot: false,
        };

        let walker = WalkBuilder::new(root)
            .standard_filters(false)
            .follow_links(false)
            .max_depth(if recursive { None } else { Some(1) })
            .sort_by_file_name(|a, b| a.cmp(b))
            .build();

        let mut files = Vec::new();
        for entry in walker.flatten() {
            // INVARIANT: Only list regular files, never the root itself.
            if entry.depth() == 0 || !entry.file_type().is_some_and(|kind| kind.is_file()) {
                continue;
            }

            if pattern.matches_with(&entry.file_name().to_string_lossy(), options) {
                files.push(entry.path().to_path_buf());
            }
        }
        debug!("found {} files under {:?}", files.len(), root.display());

        files
    }

    fn make_dir(&self, path: &Path) -> Result<()> {
        mkdirp::mkdirp(path)
            .map(|_| ())
            .map_err(|err| FsError::CreateDir {
                source: err,
                path: path.to_path_buf(),
            })
    }

    fn write_file(&self, path: &Path, contents: &str) -> Result<()> {
        write(path, contents.as_bytes()).map_err(|err| FsError::WriteFile {
            source: err,
            path: path.to_path_buf(),
        })
    }

    fn copy_file(&self, from: &Path, to: &Path) -> Result<()> {
        if let Some(parent) = to.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            self.make_dir(parent)?;
        }

        copy(from, to).map(|_| ()).map_err(|err| FsError::CopyFile {
            source: err,
            from: from.to_path_buf(),
            to: to.to_path_buf(),
        })
    }
}

/// Collapse `.` and `..` components of host path without touching the disk.
pub fn normalize(path: impl AsRef<Path>) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.as_ref().components() {
        match component {
            Component::CurDir => continue,
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }

    out
}

/// Render host path with forward slash separators.
pub fn to_forward_slashes(path: impl AsRef<Path>) -> String {
    path.as_ref().to_string_lossy().replace('\\', "/")
}

/// Split target path into its drive prefix and the remainder.
///
/// A drive prefix is any single character followed by a colon, so `!:` is a
/// drive prefix just like `c:`.
pub fn split_drive(path: &str) -> (Option<&str>, &str) {
    let mut chars = path.char_indices();
    match (chars.next(), chars.next()) {
        (Some(_), Some((index, ':'))) => (Some(&path[..=index]), &path[index + 1..]),
        _ => (None, path),
    }
}

/// Check if target path starts with a drive prefix.
pub fn has_drive(path: &str) -> bool {
    split_drive(path).0.is_some()
}

/// Strip every trailing separator from target path.
pub fn trim_trailing_separators(path: &str) -> &str {
    path.trim_end_matches(['/', '\\'])
}

/// Clean target path.
///
/// Converts separators to forward slashes, collapses repeated separators,
/// and resolves `.` and `..` segments. A drive prefix is preserved as is.
/// Never leaves a trailing separator behind unless the path is a root.
pub fn clean_target_path(path: &str) -> String {
    let path = path.replace('\\', "/");
    let (drive, rest) = split_drive(&path);
    let is_absolute = rest.starts_with('/');

    let mut segments: Vec<&str> = Vec::new();
    for segment in rest.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                if segments.last().is_some_and(|last| *last != "..") {
                    segments.pop();
                } else if !is_absolute {
                    segments.push(segment);
                }
            }
            _ => segments.push(segment),
        }
    }

    let mut cleaned = String::from(drive.unwrap_or_default());
    if is_absolute {
        cleaned.push('/');
    }
    cleaned.push_str(&segments.join("/"));

    if cleaned.is_empty() {
        cleaned.push('.');
    }

    cleaned
}

/// File system primitive error types.
#[derive(Debug, thiserror::Error)]
pub enum FsError {
    /// Directory cannot be created.
    #[error("failed to create directory at {:?}", path.display())]
    CreateDir {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// File cannot be written to.
    #[error("failed to write file at {:?}", path.display())]
    WriteFile {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// File cannot be copied.
    #[error("failed to copy {:?} to {:?}", from.display(), to.display())]
    CopyFile {
        #[source]
        source: std::io::Error,
        from: PathBuf,
        to: PathBuf,
    },
}

/// Friendly result alias :3
pub type Result<T, E = FsError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use sealed_test::prelude::*;
    use simple_test_case::test_case;
    use std::fs::{create_dir_all, write};

    #[test_case("c:/sys/bin", Some("c:"), "/sys/bin"; "lowercase drive")]
    #[test_case("!:/private", Some("!:"), "/private"; "user selected drive")]
    #[test_case("/sys/bin", None, "/sys/bin"; "no drive")]
    #[test_case("c", None, "c"; "single character")]
    #[test_case("", None, ""; "empty")]
    #[test]
    fn split_drive_prefix(path: &str, drive: Option<&str>, rest: &str) {
        assert_eq!(split_drive(path), (drive, rest));
    }

    #[test_case("!:/private/e1234567//data/./x", "!:/private/e1234567/data/x"; "double and dot")]
    #[test_case("c:\\sys\\bin\\", "c:/sys/bin"; "backslashes")]
    #[test_case("/a/b/../c", "/a/c"; "parent segment")]
    #[test_case("/../a", "/a"; "parent above root")]
    #[test_case("a/../../b", "../b"; "relative parent")]
    #[test_case("/", "/"; "root")]
    #[test_case("", "."; "empty")]
    #[test]
    fn clean_target_paths(path: &str, expect: &str) {
        assert_eq!(clean_target_path(path), expect);
    }

    #[test]
    fn normalize_host_path() {
        assert_eq!(normalize("/a/./b/../c"), PathBuf::from("/a/c"));
    }

    #[sealed_test]
    fn find_files_respects_recursion_and_pattern() -> anyhow::Result<()> {
        let root = std::env::current_dir()?.join("tree");
        create_dir_all(root.join("sub"))?;
        write(root.join("a.txt"), "a")?;
        write(root.join("b.dat"), "b")?;
        write(root.join("sub").join("c.txt"), "c")?;

        let fs = HostFileSystem::new();
        let flat = fs.find_files(&root, "*.txt", false);
        assert_eq!(flat, vec![root.join("a.txt")]);

        let deep = fs.find_files(&root, "*", true);
        assert_eq!(
            deep,
            vec![root.join("a.txt"), root.join("b.dat"), root.join("sub").join("c.txt")]
        );

        assert!(fs.find_files(&root.join("missing"), "*", true).is_empty());

        Ok(())
    }

    #[sealed_test]
    fn copy_file_creates_parents() -> anyhow::Result<()> {
        let root = std::env::current_dir()?;
        write(root.join("a.txt"), "contents")?;

        let fs = HostFileSystem::new();
        fs.copy_file(&root.join("a.txt"), &root.join("deep").join("dir").join("b.txt"))?;
        assert_eq!(std::fs::read_to_string(root.join("deep/dir/b.txt"))?, "contents");

        let result = fs.copy_file(&root.join("missing.txt"), &root.join("c.txt"));
        assert!(matches!(result, Err(FsError::CopyFile { .. })));

        Ok(())
    }
}
