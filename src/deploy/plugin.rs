// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Plugin detection and plugin stub files.
//!
//! The device loader only executes binaries out of the system binary
//! directory. So a library that is declared for any other directory is a
//! __plugin__: the real binary still goes to the system binary directory,
//! while a small __stub__ file takes its place at the declared destination.
//! Plugin loaders scan for stubs, and then load the real binary by name.
//!
//! Stubs never share the binary's extension, because ROM image tooling
//! cannot handle non-binary files that claim to be libraries.

use crate::path::{split_drive, FileSystem, FsError};

use std::path::{Path, PathBuf};
use tracing::debug;

/// System binary directory on device.
pub const SYSBIN_DIR: &str = "/sys/bin";

/// Z-drive mirror inside SDK, relative to SDK root.
pub const HW_Z_DIR: &str = "epoc32/data/z";

/// Directory of generated plugin stubs, relative to output directory.
pub const PLUGIN_STUB_DIR: &str = "pluginstubs";

/// Extension given to plugin stub files.
pub const PLUGIN_STUB_SUFFIX: &str = "qtplugin";

/// Check if file has a binary extension, i.e., "dll" or "exe".
pub fn is_binary(file: &Path) -> bool {
    file.extension()
        .map(|ext| ext.to_string_lossy())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("dll") || ext.eq_ignore_ascii_case("exe"))
}

/// Check if library deployed to `device_path` is a plugin.
///
/// Libraries are plugins unless they go to the system binary directory,
/// with or without drive prefix, or to its mirror inside the SDK.
pub fn is_plugin(file: &Path, device_path: &str, epoc_root: &str) -> bool {
    let is_library = file
        .extension()
        .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case("dll"));
    if !is_library {
        return false;
    }

    let (drive, rest) = split_drive(device_path);
    let hw_sysbin = format!("{epoc_root}{HW_Z_DIR}{SYSBIN_DIR}");
    let is_sysbin = device_path.eq_ignore_ascii_case(SYSBIN_DIR)
        || (drive.is_some() && rest.eq_ignore_ascii_case(SYSBIN_DIR))
        || device_path.eq_ignore_ascii_case(&hw_sysbin);

    !is_sysbin
}

/// Name of stub file standing in for plugin binary.
pub fn stub_name(file: &Path) -> Option<String> {
    file.file_stem()
        .map(|stem| format!("{}.{PLUGIN_STUB_SUFFIX}", stem.to_string_lossy()))
}

/// Writer of plugin stub files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginStubs {
    dir: PathBuf,
}

impl PluginStubs {
    /// Construct new stub writer placing stubs into `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding stub files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of stub file with given name.
    pub fn stub_path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Create stub file.
    ///
    /// Stub content carries a creation timestamp, so every build produces a
    /// different stub. That forces redeployment, which in turn invalidates
    /// the plugin cache on device.
    ///
    /// # Errors
    ///
    /// - Return [`FsError`] if stub directory or stub file cannot be written.
    pub fn create(&self, fs: &impl FileSystem, name: &str) -> Result<PathBuf, FsError> {
        fs.make_dir(&self.dir)?;

        let path = self.stub_path(name);
        let created = chrono::Local::now().format("%Y-%m-%dT%H:%M:%S");
        let contents = format!(
            "This file is a plugin stub file. The real plugin is located in {SYSBIN_DIR}. Created: {created}\n"
        );
        fs.write_file(&path, &contents)?;
        debug!("wrote plugin stub {:?}", path.display());

        Ok(path)
    }
}
