// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Typed project model and package generation pipeline.
//!
//! A [`ProjectDefinition`] is mapped exactly once into a [`Project`]. From
//! then on, every step operates on typed fields. The [`PackageGenerator`]
//! drives the whole pipeline: deployment resolution, manifest documents, and
//! resource side files. Each step reports what it produced through
//! [`GeneratedArtifacts`], which are merged at the top.

use crate::{
    config::{ConfigError, LocalePair, ProjectDefinition, Template},
    deploy::{
        artifact::GeneratedArtifacts,
        plugin::{HW_Z_DIR, PLUGIN_STUB_DIR},
        CopyDirective, DeploymentItem, DeploymentResolver, Platform, Resolution, ResolveOptions,
        ResolverSettings,
    },
    localize::{collect, derive_locales, localized_resource, LocalizationEntry},
    manifest::{
        document::{display_name, document_file_name, render, PackageInfo, DEFAULT_MANUFACTURER_NOTE},
        version::app_version,
        Document, RuleSet,
    },
    path::{to_forward_slashes, FileSystem},
    resource::{
        localization_file_name, registration_file_name, render_localization, render_registration,
        render_resource, resource_file_name, ResourceInfo,
    },
    uid::{ApplicationUid, UidCache},
};

use std::path::{Path, PathBuf};
use tracing::{debug, error, info, instrument};

/// Platform placeholder filled in by the packaging step.
pub const PLATFORM_PLACEHOLDER: &str = "$(PLATFORM)";

/// Build variant placeholder filled in by the packaging step.
pub const BUILD_PLACEHOLDER: &str = "$(TARGET)";

/// Typed project model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    /// Build target name.
    pub target: String,

    /// Kind of binary the project builds.
    pub template: Template,

    /// Application UID.
    pub uid: ApplicationUid,

    /// Package version, e.g., "1,0,0".
    pub version: String,

    /// Display name of packages.
    pub display_name: String,

    /// Installer header override.
    pub installer_header: Option<String>,

    /// Manufacturer restriction.
    pub manufacturers: Vec<String>,

    /// Text shown when manufacturer restriction fails.
    pub manufacturers_fail_message: Option<String>,

    /// Application icon files.
    pub icons: Vec<String>,

    /// Extra registration descriptor lines.
    pub registration_rules: Vec<String>,

    /// Device directory of application resources.
    pub app_resource_dir: String,

    /// Device directory of registration resources.
    pub reg_resource_import_dir: String,

    /// Locale pairs.
    pub locales: Vec<LocalePair>,

    /// Localized captions, one entry per locale.
    pub localization: Vec<LocalizationEntry>,

    /// Deployment items, default deployments first.
    pub deployments: Vec<DeploymentItem>,

    /// Manifest rules of all deployment units.
    pub rules: RuleSet,

    /// SDK root ending with forward slash.
    pub epoc_root: String,

    /// Binaries come out of the SDK release tree.
    pub full_system_build: bool,

    /// Smart installer bootstrap package.
    pub smart_installer: Option<String>,
}

impl Project {
    /// Load project from definition file.
    ///
    /// Relative paths in the definition are relative to the directory of
    /// the definition file.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError`] if definition cannot be loaded.
    pub fn load(
        fs: &impl FileSystem,
        path: impl AsRef<Path>,
        cache: &mut UidCache,
    ) -> Result<Self, ConfigError> {
        let definition = ProjectDefinition::load(path.as_ref())?;
        let absolute = fs.absolute(path.as_ref());
        let project_dir = absolute.parent().map(Path::to_path_buf).unwrap_or_default();

        Ok(Self::from_definition(definition, &project_dir, cache))
    }

    /// Map project definition into typed project model.
    #[instrument(skip(definition, cache), level = "debug")]
    pub fn from_definition(
        definition: ProjectDefinition,
        project_dir: &Path,
        cache: &mut UidCache,
    ) -> Self {
        let settings = definition.project;
        let toolchain = definition.toolchain;

        let qualified_target = to_forward_slashes(project_dir.join(&settings.target));
        let uid = ApplicationUid::resolve(settings.uid3.as_deref(), &qualified_target, cache);
        let version = app_version(settings.version.as_deref(), settings.pkg_build_version.as_deref());
        let display_name = display_name(settings.display_name.as_deref().unwrap_or(&settings.target));

        let translations: Vec<PathBuf> = settings
            .translations
            .iter()
            .map(|translation| project_dir.join(translation))
            .collect();
        let locales = if definition.locales.is_empty() {
            derive_locales(&translations)
        } else {
            definition.locales
        };
        let localization = collect(&locales, &translations);

        let rules = RuleSet::aggregate(&definition.deployments, &definition.rules);

        let mut project = Self {
            target: settings.target,
            template: settings.template,
            uid,
            version,
            display_name,
            installer_header: settings.installer_header,
            manufacturers: settings.manufacturers,
            manufacturers_fail_message: settings.manufacturers_fail_message,
            icons: settings.icons,
            registration_rules: settings.registration_rules,
            app_resource_dir: settings.app_resource_dir,
            reg_resource_import_dir: settings.reg_resource_import_dir,
            locales,
            localization,
            deployments: Vec::new(),
            rules,
            epoc_root: toolchain.epoc_root,
            full_system_build: toolchain.full_system_build,
            smart_installer: toolchain.smart_installer,
        };

        if project.template == Template::App {
            project.deployments = project.default_deployments(project_dir, settings.localize_deployment);
        }

        for deployment in definition.deployments {
            let sources = deployment
                .sources
                .iter()
                .map(|source| anchor_source(project_dir, source))
                .collect::<Vec<_>>();
            project.deployments.push(
                DeploymentItem::new(deployment.name, sources, deployment.path)
                    .with_flags(deployment.flags),
            );
        }
        debug!("project {:?} has {} deployments", project.target, project.deployments.len());

        project
    }

    fn default_deployments(&self, project_dir: &Path, localize: bool) -> Vec<DeploymentItem> {
        let z_dir = format!("{}{HW_Z_DIR}", self.epoc_root);
        let binary = anchor_source(project_dir, &format!("{}.exe", self.target));
        let resource = format!("{z_dir}{}/{}.rsc", self.app_resource_dir, self.target);
        let registration = format!("{z_dir}{}/{}_reg.rsc", self.reg_resource_import_dir, self.target);

        vec![
            DeploymentItem::new("default_bin_deployment", [binary], "/sys/bin"),
            DeploymentItem::new(
                "default_resource_deployment",
                self.localized_sources(resource, localize),
                self.app_resource_dir.clone(),
            ),
            DeploymentItem::new(
                "default_reg_deployment",
                self.localized_sources(registration, localize),
                self.reg_resource_import_dir.clone(),
            ),
        ]
    }

    fn localized_sources(&self, source: String, localize: bool) -> Vec<String> {
        let mut sources = vec![source];
        if localize {
            let localized: Vec<String> = self
                .locales
                .iter()
                .filter_map(|locale| localized_resource(&sources[0], &locale.target))
                .collect();
            sources.extend(localized);
        }

        sources
    }

    /// Resolver settings placing plugin stubs below `out_dir`.
    pub fn resolver_settings(&self, out_dir: &Path) -> ResolverSettings {
        ResolverSettings {
            epoc_root: self.epoc_root.clone(),
            app_resource_dir: self.app_resource_dir.clone(),
            reg_resource_import_dir: self.reg_resource_import_dir.clone(),
            stub_dir: out_dir.join(PLUGIN_STUB_DIR),
        }
    }

    /// Resolve options used for manifest generation.
    ///
    /// Files deploy below the private directory of the application on the
    /// drive the user selects during installation.
    pub fn manifest_options(&self) -> ResolveOptions {
        ResolveOptions {
            target_path: format!("!:/private/{}", self.uid.private_dir),
            deploy_binaries: true,
            full_system_build: self.full_system_build,
            platform: Platform::Device(PLATFORM_PLACEHOLDER.into()),
            build: BUILD_PLACEHOLDER.into(),
        }
    }

    /// Default root that relative deployment paths are anchored to.
    ///
    /// Each platform anchors to the private directory of the application
    /// where that platform keeps its files: the C-drive mirror of the
    /// emulator, the Z-drive staging directory for ROM images, and the C
    /// drive on hardware.
    pub fn default_target_path(&self, platform: &Platform) -> String {
        let private_dir = &self.uid.private_dir;
        match platform {
            Platform::Emulator => format!("{}epoc32/winscw/c/private/{private_dir}", self.epoc_root),
            Platform::Rom => format!("{}{HW_Z_DIR}/private/{private_dir}", self.epoc_root),
            Platform::Device(_) => format!("c:/private/{private_dir}"),
        }
    }

    /// Resolve deployments of project.
    pub fn resolve(&self, fs: &impl FileSystem, out_dir: &Path, opts: &ResolveOptions) -> Resolution {
        DeploymentResolver::new(fs, self.resolver_settings(out_dir)).resolve(&self.deployments, opts)
    }

    fn package_info(&self, out_dir: &Path, manufacturer_note: Option<PathBuf>, generated_at: &str) -> PackageInfo {
        PackageInfo {
            target: self.target.clone(),
            display_name: self.display_name.clone(),
            uid: self.uid.clone(),
            version: self.version.clone(),
            installer_header: self.installer_header.clone(),
            localization: self.localization.clone(),
            manufacturers: self.manufacturers.clone(),
            manufacturer_note,
            package_dir: out_dir.to_path_buf(),
            smart_installer: self.smart_installer.clone(),
            generated_at: generated_at.to_owned(),
        }
    }

    fn resource_info(&self, generated_at: &str) -> ResourceInfo {
        ResourceInfo {
            target: self.target.clone(),
            uid3: self.uid.uid3.clone(),
            app_resource_dir: self.app_resource_dir.clone(),
            icons: self.icons.clone(),
            registration_rules: self.registration_rules.clone(),
            localization: self.localization.clone(),
            generated_at: generated_at.to_owned(),
        }
    }
}

/// Package generation pipeline.
#[derive(Debug)]
pub struct PackageGenerator<'fs, F>
where
    F: FileSystem,
{
    fs: &'fs F,
    out_dir: PathBuf,
    generated_at: String,
}

impl<'fs, F> PackageGenerator<'fs, F>
where
    F: FileSystem,
{
    /// Construct new package generator writing into `out_dir`.
    pub fn new(fs: &'fs F, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            out_dir: out_dir.into(),
            generated_at: chrono::Local::now().format("%Y-%m-%dT%H:%M:%S").to_string(),
        }
    }

    /// Use fixed generation timestamp.
    pub fn with_timestamp(mut self, generated_at: impl Into<String>) -> Self {
        self.generated_at = generated_at.into();
        self
    }

    /// Generate manifests, resource side files, and plugin stubs.
    ///
    /// Never fails. Files that cannot be written are logged, and left out of
    /// the returned artifacts.
    #[instrument(skip(self, project), fields(target = %project.target), level = "debug")]
    pub fn generate(&self, project: &Project) -> GeneratedArtifacts {
        if let Err(err) = self.fs.make_dir(&self.out_dir) {
            error!("{err}");
        }

        project.rules.report_usage_errors();
        let resolution = project.resolve(self.fs, &self.out_dir, &project.manifest_options());

        let mut artifacts = resolution.artifacts;
        artifacts.merge(self.write_manifests(project, &resolution.directives));
        if project.template == Template::App {
            artifacts.merge(self.write_resources(project));
        }

        artifacts
    }

    fn write_manifests(&self, project: &Project, directives: &[CopyDirective]) -> GeneratedArtifacts {
        let mut artifacts = GeneratedArtifacts::new();

        let manufacturer_note = if project.manufacturers.is_empty() {
            None
        } else {
            let path = self
                .out_dir
                .join(format!("{}_manufacturer_note.txt", project.target));
            let message = project
                .manufacturers_fail_message
                .as_deref()
                .filter(|message| !message.is_empty())
                .unwrap_or(DEFAULT_MANUFACTURER_NOTE);
            self.write(&path, &format!("{message}\n"), &mut artifacts)
                .then_some(path)
        };

        let info = project.package_info(&self.out_dir, manufacturer_note, &self.generated_at);
        for document in Document::ALL {
            let path = self.out_dir.join(document_file_name(&project.target, document));
            let contents = render(document, &info, &project.rules, directives);
            self.write(&path, &contents, &mut artifacts);
        }

        artifacts
    }

    fn write_resources(&self, project: &Project) -> GeneratedArtifacts {
        let mut artifacts = GeneratedArtifacts::new();
        let info = project.resource_info(&self.generated_at);

        let files = [
            (registration_file_name(&project.target), render_registration(&info)),
            (resource_file_name(&project.target), render_resource(&info)),
            (localization_file_name(&project.target), render_localization(&info)),
        ];
        for (name, contents) in files {
            self.write(&self.out_dir.join(name), &contents, &mut artifacts);
        }

        artifacts
    }

    fn write(&self, path: &Path, contents: &str, artifacts: &mut GeneratedArtifacts) -> bool {
        match self.fs.write_file(path, contents) {
            Ok(()) => {
                info!("generated {:?}", path.display());
                artifacts.push_file(path);
                true
            }
            Err(err) => {
                error!("{err}");
                false
            }
        }
    }
}

fn anchor_source(project_dir: &Path, source: &str) -> String {
    if Path::new(source).is_absolute() {
        source.to_owned()
    } else {
        to_forward_slashes(project_dir.join(source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProjectDefinition;

    use pretty_assertions::assert_eq;

    fn definition(data: &str) -> ProjectDefinition {
        data.parse().unwrap()
    }

    #[test]
    fn map_default_deployments() {
        let definition = definition(
            r#"
            [project]
            target = "helloworld"
            uid3 = "0xE1234567"
            localize_deployment = true

            [toolchain]
            epoc_root = "/sdk"

            [[locale]]
            source = "fi"
            target = "09"

            [[deployment]]
            name = "docs"
            sources = ["readme.txt", "/abs/notes.txt"]
            path = "docs"
            flags = ["FT"]
            "#,
        );

        let mut cache = UidCache::new();
        let project = Project::from_definition(definition, Path::new("/work"), &mut cache);

        let expect = vec![
            DeploymentItem::new("default_bin_deployment", ["/work/helloworld.exe"], "/sys/bin"),
            DeploymentItem::new(
                "default_resource_deployment",
                [
                    "/sdk/epoc32/data/z/resource/apps/helloworld.rsc",
                    "/sdk/epoc32/data/z/resource/apps/helloworld.r09",
                ],
                "/resource/apps",
            ),
            DeploymentItem::new(
                "default_reg_deployment",
                [
                    "/sdk/epoc32/data/z/private/10003a3f/import/apps/helloworld_reg.rsc",
                    "/sdk/epoc32/data/z/private/10003a3f/import/apps/helloworld_reg.r09",
                ],
                "/private/10003a3f/import/apps",
            ),
            DeploymentItem::new("docs", ["/work/readme.txt", "/abs/notes.txt"], "docs")
                .with_flags(["FT"]),
        ];
        assert_eq!(project.deployments, expect);
        assert_eq!(project.uid.private_dir, "e1234567");
        assert_eq!(project.version, "1,0,0");
        assert_eq!(project.localization, vec![LocalizationEntry::new("09")]);
        assert!(cache.is_empty());
    }

    #[test]
    fn library_has_no_default_deployments() {
        let definition = definition(
            r#"
            [project]
            target = "mylib"
            template = "lib"
            display_name = "libs/My Library"
            version = "2.1"
            pkg_build_version = "3"
            "#,
        );

        let mut cache = UidCache::new();
        let project = Project::from_definition(definition, Path::new("/work"), &mut cache);
        assert!(project.deployments.is_empty());
        assert_eq!(project.display_name, "My Library");
        assert_eq!(project.version, "2,1,003");
        assert_eq!(project.uid.uid3, cache.compute_test_hash("/work/mylib"));
    }

    #[test]
    fn manifest_options_use_private_directory() {
        let definition = definition("[project]\ntarget = \"app\"\nuid3 = \"0xE0000001\"\n");
        let project = Project::from_definition(definition, Path::new("/work"), &mut UidCache::new());

        let opts = project.manifest_options();
        assert_eq!(opts.target_path, "!:/private/e0000001");
        assert!(opts.deploy_binaries);
        assert_eq!(opts.platform, Platform::Device("$(PLATFORM)".into()));
        assert_eq!(opts.build, "$(TARGET)");
    }
}
