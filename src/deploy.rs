// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Deployment path resolution.
//!
//! A project declares __deployment items__: some source files, directories,
//! or wildcard patterns, plus a logical destination path on the device. The
//! resolver expands each item into concrete [`CopyDirective`]s, one per file
//! to stage.
//!
//! # Destination Rules
//!
//! Where a file lands depends on the target platform:
//!
//! - __ROM image__: drive letters are dropped, and everything lands below the
//!   Z-drive staging directory of the SDK.
//! - __Emulator__: drives map onto their mirrors inside the SDK. The `z:`
//!   drive and drive-less paths go to the Z-drive mirror of the current build
//!   variant, `!:` goes to the C-drive mirror, and any other drive to its own
//!   mirror. Release builds skip non-Z drives altogether.
//! - __Device__: drive-less paths inherit the drive of the target path.
//!
//! Binaries that do not exist yet are assumed to be build output, and are
//! deployed from the SDK release tree. Libraries declared outside the system
//! binary directory are plugins, see [`plugin`].

pub mod artifact;
pub mod plugin;

use crate::{
    deploy::{
        artifact::GeneratedArtifacts,
        plugin::{is_binary, is_plugin, stub_name, PluginStubs, SYSBIN_DIR, HW_Z_DIR},
    },
    path::{clean_target_path, has_drive, split_drive, to_forward_slashes, trim_trailing_separators, FileSystem},
};

use std::{
    collections::HashMap,
    convert::Infallible,
    fmt::{Display, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::{debug, error, instrument, warn};

/// One declared deployment unit.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct DeploymentItem {
    /// Name of deployment unit.
    pub name: String,

    /// Source files, directories, or wildcard patterns.
    pub sources: Vec<String>,

    /// Logical destination path on device.
    pub path: String,

    /// Free-form flags, e.g., "FILETEXT".
    pub flags: Vec<String>,
}

impl DeploymentItem {
    /// Construct new deployment item.
    pub fn new(
        name: impl Into<String>,
        sources: impl IntoIterator<Item = impl Into<String>>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            sources: sources.into_iter().map(Into::into).collect(),
            path: path.into(),
            flags: Vec::new(),
        }
    }

    /// Attach flags to deployment item.
    pub fn with_flags(mut self, flags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.flags = flags.into_iter().map(Into::into).collect();
        self
    }
}

/// Concrete file copy from host to device.
///
/// # Invariant
///
/// - Destination uses forward slashes, and has no repeated separators.
/// - Flags keep their declaration order, and are never duplicated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyDirective {
    /// File on host.
    pub from: PathBuf,

    /// Destination on device.
    pub to: String,

    /// Flags for manifest file line.
    pub flags: Vec<String>,
}

impl CopyDirective {
    /// Construct new copy directive.
    pub fn new(from: impl Into<PathBuf>, to: &str, flags: &[String]) -> Self {
        let mut unique: Vec<String> = Vec::with_capacity(flags.len());
        for flag in flags {
            if !unique.contains(flag) {
                unique.push(flag.clone());
            }
        }

        Self {
            from: from.into(),
            to: clean_target_path(to),
            flags: unique,
        }
    }

    /// Check if directive only displays text during installation.
    pub fn is_text_only(&self) -> bool {
        self.flags.iter().any(|flag| flag == "FT" || flag == "FILETEXT")
    }

    /// Check if source and destination are the same file.
    pub fn is_in_place(&self) -> bool {
        let from = to_forward_slashes(&self.from);
        if cfg!(windows) {
            from.to_lowercase() == self.to.to_lowercase()
        } else {
            from == self.to
        }
    }
}

impl Display for CopyDirective {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        write!(fmt, "\"{}\" - \"{}\"", to_forward_slashes(&self.from), self.to)?;
        for flag in &self.flags {
            write!(fmt, ",{flag}")?;
        }

        Ok(())
    }
}

/// Target platform of deployment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Platform {
    /// Read-only system image.
    Rom,

    /// Desktop hosted device emulator.
    Emulator,

    /// Any hardware platform, named by its build token.
    Device(String),
}

impl Platform {
    /// Check if platform is ROM image.
    pub fn is_rom(&self) -> bool {
        matches!(self, Self::Rom)
    }

    /// Check if platform is emulator.
    pub fn is_emulator(&self) -> bool {
        matches!(self, Self::Emulator)
    }
}

impl FromStr for Platform {
    type Err = Infallible;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        Ok(match token {
            "rom" => Self::Rom,
            "emulator" | "winscw" => Self::Emulator,
            other => Self::Device(other.to_owned()),
        })
    }
}

impl Display for Platform {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Rom => fmt.write_str("rom"),
            Self::Emulator => fmt.write_str("winscw"),
            Self::Device(token) => fmt.write_str(token),
        }
    }
}

/// Per-run options of deployment resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Root that relative destinations are anchored to.
    pub target_path: String,

    /// Stage compiled binaries into the system binary directory.
    pub deploy_binaries: bool,

    /// Binaries come out of the SDK release tree.
    pub full_system_build: bool,

    /// Target platform.
    pub platform: Platform,

    /// Build variant, e.g., "udeb" or "urel".
    pub build: String,
}

impl ResolveOptions {
    fn is_release(&self) -> bool {
        self.build.eq_ignore_ascii_case("urel") || self.build.eq_ignore_ascii_case("release")
    }
}

/// Project wide settings of deployment resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverSettings {
    /// SDK root ending with forward slash.
    pub epoc_root: String,

    /// Device directory of application resources.
    pub app_resource_dir: String,

    /// Device directory of registration resources.
    pub reg_resource_import_dir: String,

    /// Directory that receives plugin stubs.
    pub stub_dir: PathBuf,
}

/// Result of deployment resolution.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Copy directives in declaration order.
    pub directives: Vec<CopyDirective>,

    /// Plugin stubs and their directory.
    pub artifacts: GeneratedArtifacts,
}

/// Resolved destination of a deployment item.
struct Destination {
    /// Destination directory on device.
    path: String,

    /// Drive that binaries of the item go to.
    binary_drive: String,
}

/// Mutable state of one resolution run.
#[derive(Default)]
struct RunState {
    resolution: Resolution,
    stubs: HashMap<String, Option<PathBuf>>,
}

/// Expands deployment items into copy directives.
#[derive(Debug)]
pub struct DeploymentResolver<'fs, F>
where
    F: FileSystem,
{
    fs: &'fs F,
    settings: ResolverSettings,
    stubs: PluginStubs,
}

impl<'fs, F> DeploymentResolver<'fs, F>
where
    F: FileSystem,
{
    /// Construct new deployment resolver.
    pub fn new(fs: &'fs F, settings: ResolverSettings) -> Self {
        let stubs = PluginStubs::new(settings.stub_dir.clone());
        Self {
            fs,
            settings,
            stubs,
        }
    }

    /// Resolve deployment items into copy directives.
    ///
    /// Missing or malformed input never fails resolution, it just produces
    /// no directives. On emulator and ROM platforms, directives that would
    /// copy a file onto itself are dropped.
    #[instrument(skip(self, items), level = "debug")]
    pub fn resolve(&self, items: &[DeploymentItem], opts: &ResolveOptions) -> Resolution {
        let target_path = trim_trailing_separators(&opts.target_path);
        let deployment_drive = self.deployment_drive(target_path, &opts.platform);
        let mut state = RunState::default();

        for item in items {
            let Some(destination) = self.destination(item, target_path, &deployment_drive, opts)
            else {
                continue;
            };

            debug!("deploy {:?} to {:?}", item.name, destination.path);
            for source in &item.sources {
                self.resolve_source(source, item, &destination, opts, &mut state);
            }
        }

        let mut resolution = state.resolution;
        if opts.platform.is_emulator() || opts.platform.is_rom() {
            resolution.directives.retain(|directive| {
                let keep = !directive.is_in_place();
                if !keep {
                    debug!("drop in-place copy of {:?}", directive.to);
                }
                keep
            });
        }

        resolution
    }

    fn deployment_drive(&self, target_path: &str, platform: &Platform) -> String {
        if platform.is_rom() {
            return format!("{}{HW_Z_DIR}", self.settings.epoc_root);
        }

        match split_drive(target_path).0 {
            Some(drive) => drive.to_owned(),
            None => "c:".into(),
        }
    }

    fn destination(
        &self,
        item: &DeploymentItem,
        target_path: &str,
        deployment_drive: &str,
        opts: &ResolveOptions,
    ) -> Option<Destination> {
        let declared = item.path.as_str();
        let (declared_drive, declared_rest) = split_drive(declared);
        let is_rom = opts.platform.is_rom();

        // INVARIANT: Prebuilt resources are only deployed with binaries or into ROM.
        if !opts.deploy_binaries && !is_rom && self.is_resource_dir(declared_rest) {
            debug!("skip resource deployment {:?}", item.name);
            return None;
        }

        let path = if declared.is_empty() || declared == "." {
            target_path.to_owned()
        } else if !(declared.starts_with(['/', '\\']) || declared_drive.is_some()) {
            clean_target_path(&format!("{target_path}/{declared}"))
        } else if opts.platform.is_emulator() {
            self.emulator_destination(declared_drive, declared_rest, opts)?
        } else {
            let mut path = declared.to_owned();
            if is_rom && declared_drive.is_some() {
                path = declared_rest.to_owned();
            }
            if is_rom || (!has_drive(&path) && has_drive(target_path)) {
                path = format!("{deployment_drive}{path}");
            }
            path
        };
        let path = clean_target_path(&path);

        // INVARIANT: Only binary deployment may populate system binary directory.
        let is_sysbin = path
            .to_ascii_lowercase()
            .ends_with(SYSBIN_DIR);
        if !opts.deploy_binaries && !is_rom && is_sysbin {
            debug!("skip system binary deployment {:?}", item.name);
            return None;
        }

        let binary_drive = match declared_drive {
            Some(drive) if !is_rom => drive.to_owned(),
            _ => deployment_drive.to_owned(),
        };

        Some(Destination { path, binary_drive })
    }

    fn emulator_destination(
        &self,
        drive: Option<&str>,
        rest: &str,
        opts: &ResolveOptions,
    ) -> Option<String> {
        let root = &self.settings.epoc_root;
        let build = &opts.build;
        let rest = rest.trim_start_matches(['/', '\\']);
        let letter = drive
            .and_then(|drive| drive.chars().next())
            .map(|letter| letter.to_ascii_lowercase());

        match letter {
            None | Some('z') => Some(format!("{root}epoc32/release/winscw/{build}/z/{rest}")),
            Some(_) if opts.is_release() => {
                debug!("skip non-Z drive deployment for release emulator build");
                None
            }
            Some('!') => Some(format!("{root}epoc32/winscw/c/{rest}")),
            Some(letter) => Some(format!("{root}epoc32/winscw/{letter}/{rest}")),
        }
    }

    fn is_resource_dir(&self, path: &str) -> bool {
        if path.is_empty() {
            return false;
        }

        path.eq_ignore_ascii_case(&self.settings.app_resource_dir)
            || path.eq_ignore_ascii_case(&self.settings.reg_resource_import_dir)
    }

    fn resolve_source(
        &self,
        source: &str,
        item: &DeploymentItem,
        destination: &Destination,
        opts: &ResolveOptions,
        state: &mut RunState,
    ) {
        let source_path = Path::new(source);

        if self.fs.is_dir(source_path) {
            let root = self.fs.absolute(source_path);
            let base = root.parent().map(Path::to_path_buf).unwrap_or_else(|| root.clone());
            self.expand_search(&root, "*", true, &base, item, destination, opts, state);
        } else if self.fs.exists(source_path) || source.contains(['*', '?']) {
            let absolute = self.fs.absolute(source_path);
            let Some(pattern) = absolute.file_name().map(|name| name.to_string_lossy().into_owned())
            else {
                return;
            };
            let base = absolute.parent().map(Path::to_path_buf).unwrap_or_default();
            self.expand_search(&base, &pattern, false, &base, item, destination, opts, state);
        } else if is_binary(source_path) {
            // INVARIANT: Missing binaries are build output that does not exist yet.
            self.deploy_unbuilt_binary(source_path, item, destination, opts, state);
        } else {
            // INVARIANT: Other missing files still get deployed for manifest generation.
            let from = self.fs.absolute(source_path);
            let Some(name) = file_name(&from) else {
                return;
            };
            let to = format!("{}/{name}", destination.path);
            state
                .resolution
                .directives
                .push(CopyDirective::new(from, &to, &item.flags));
        }
    }

    fn deploy_unbuilt_binary(
        &self,
        source: &Path,
        item: &DeploymentItem,
        destination: &Destination,
        opts: &ResolveOptions,
        state: &mut RunState,
    ) {
        let Some(name) = file_name(source) else {
            return;
        };

        if opts.deploy_binaries {
            let build_dir = if opts.full_system_build {
                PathBuf::from(format!(
                    "{}epoc32/release/{}/{}",
                    self.settings.epoc_root, opts.platform, opts.build
                ))
            } else {
                let parent = source.parent().unwrap_or_else(|| Path::new(""));
                self.fs.absolute(parent)
            };
            let to = format!("{}{SYSBIN_DIR}/{name}", destination.binary_drive);
            state
                .resolution
                .directives
                .push(CopyDirective::new(build_dir.join(&name), &to, &item.flags));
        }

        if is_plugin(source, &destination.path, &self.settings.epoc_root) {
            self.deploy_stub(source, &destination.path, state);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn expand_search(
        &self,
        root: &Path,
        pattern: &str,
        recursive: bool,
        base: &Path,
        item: &DeploymentItem,
        destination: &Destination,
        opts: &ResolveOptions,
        state: &mut RunState,
    ) {
        for file in self.fs.find_files(root, pattern, recursive) {
            let Some(name) = file_name(&file) else {
                continue;
            };

            // INVARIANT: Keep subdirectory of match relative to search base.
            let subdir = file
                .parent()
                .and_then(|parent| parent.strip_prefix(base).ok())
                .map(to_forward_slashes)
                .unwrap_or_default();
            let dir = if subdir.is_empty() {
                destination.path.clone()
            } else {
                format!("{}/{subdir}", destination.path)
            };

            if is_plugin(&file, &destination.path, &self.settings.epoc_root) {
                if opts.deploy_binaries || opts.platform.is_rom() {
                    let to = format!("{}{SYSBIN_DIR}/{name}", destination.binary_drive);
                    state
                        .resolution
                        .directives
                        .push(CopyDirective::new(file.clone(), &to, &item.flags));
                }
                self.deploy_stub(&file, &dir, state);
            } else {
                let to = format!("{dir}/{name}");
                state
                    .resolution
                    .directives
                    .push(CopyDirective::new(file, &to, &item.flags));
            }
        }
    }

    fn deploy_stub(&self, binary: &Path, dir: &str, state: &mut RunState) {
        let Some(name) = stub_name(binary) else {
            return;
        };

        // INVARIANT: Write each distinct stub once per run.
        let stub = match state.stubs.get(&name) {
            Some(stub) => stub.clone(),
            None => {
                let stub = match self.stubs.create(self.fs, &name) {
                    Ok(path) => {
                        state.resolution.artifacts.push_dir(self.stubs.dir());
                        state.resolution.artifacts.push_file(&path);
                        Some(path)
                    }
                    Err(err) => {
                        error!(
                            "cannot deploy {:?} because plugin stub creation failed: {err}",
                            binary.display()
                        );
                        None
                    }
                };
                state.stubs.insert(name.clone(), stub.clone());
                stub
            }
        };

        if let Some(path) = stub {
            let to = format!("{dir}/{name}");
            state
                .resolution
                .directives
                .push(CopyDirective::new(path, &to, &[]));
        }
    }
}

/// Perform copies of directives on host.
///
/// Directives whose destination carries a drive prefix only make sense on
/// device, so they are skipped on hosts without drive letters. Failed copies
/// are logged and skipped. Returns the number of files copied.
#[instrument(skip(fs, directives), level = "debug")]
pub fn apply_directives(fs: &impl FileSystem, directives: &[CopyDirective]) -> usize {
    let mut copied = 0;
    for directive in directives {
        if has_drive(&directive.to) && !cfg!(windows) {
            warn!("skip copy to device path {:?}", directive.to);
            continue;
        }

        match fs.copy_file(&directive.from, Path::new(&directive.to)) {
            Ok(()) => {
                debug!("copied {directive}");
                copied += 1;
            }
            Err(err) => error!("{err}"),
        }
    }

    copied
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().map(|name| name.to_string_lossy().into_owned())
}
