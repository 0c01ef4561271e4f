// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration layout.
//!
//! Specify the layout of the project definition file that sisgen reads to
//! simplify the process of serialization and deserialization. The layout is
//! deliberately close to the raw declarative input. Mapping it into typed
//! deployment records happens in [`crate::project`].

use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    fs::read_to_string,
    path::{Path, PathBuf},
    str::FromStr,
};

/// Project definition layout.
///
/// # General Layout
///
/// A project definition is composed of five parts. The `project` section
/// names the target and its package metadata. The `toolchain` section says
/// where the SDK lives. Each `locale` entry maps a translation language code
/// to a target platform language code. The `rules` section holds named lists
/// of manifest rule lines. Finally, each `deployment` entry declares a set of
/// files to stage on the device.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct ProjectDefinition {
    /// Target and package settings.
    pub project: ProjectSettings,

    /// SDK settings.
    #[serde(default)]
    pub toolchain: ToolchainSettings,

    /// Explicit locale pairs.
    #[serde(default, rename = "locale", skip_serializing_if = "Vec::is_empty")]
    pub locales: Vec<LocalePair>,

    /// Named lists of manifest rule lines.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub rules: BTreeMap<String, Vec<String>>,

    /// Declared deployment units.
    #[serde(default, rename = "deployment", skip_serializing_if = "Vec::is_empty")]
    pub deployments: Vec<DeploymentDefinition>,
}

impl ProjectDefinition {
    /// Load project definition from file.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::Read`] if file cannot be read.
    /// - Return [`ConfigError::Deserialize`] if file content is invalid.
    /// - Return [`ConfigError::ShellExpansion`] if path settings cannot be
    ///   expanded.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        read_to_string(path.as_ref())
            .map_err(|err| ConfigError::Read {
                source: err,
                path: path.as_ref().to_path_buf(),
            })?
            .parse()
    }
}

impl FromStr for ProjectDefinition {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let mut definition: ProjectDefinition =
            toml::de::from_str(data).map_err(ConfigError::Deserialize)?;

        // INVARIANT: Perform shell expansion on path settings.
        let epoc_root = shellexpand::full(definition.toolchain.epoc_root.as_str())
            .map_err(ConfigError::ShellExpansion)?
            .into_owned();
        definition.toolchain.epoc_root = normalize_epoc_root(&epoc_root);

        if let Some(smart_installer) = &definition.toolchain.smart_installer {
            definition.toolchain.smart_installer = Some(
                shellexpand::full(smart_installer.as_str())
                    .map_err(ConfigError::ShellExpansion)?
                    .into_owned(),
            );
        }

        Ok(definition)
    }
}

impl Display for ProjectDefinition {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::ser::to_string_pretty(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

/// Project settings.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct ProjectSettings {
    /// Build target name.
    pub target: String,

    /// Kind of binary the project builds.
    #[serde(default)]
    pub template: Template,

    /// Explicit application UID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid3: Option<String>,

    /// Dotted application version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Display name used in package headers instead of target name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Package build number between 0 and 99.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pkg_build_version: Option<String>,

    /// Header override for the installer wrapper package.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installer_header: Option<String>,

    /// Manufacturer identifiers the package is restricted to.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub manufacturers: Vec<String>,

    /// Text shown when manufacturer restriction fails.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturers_fail_message: Option<String>,

    /// Device directory of application resource files.
    #[serde(default = "default_app_resource_dir")]
    pub app_resource_dir: String,

    /// Device directory of registration resource files.
    #[serde(default = "default_reg_resource_import_dir")]
    pub reg_resource_import_dir: String,

    /// Application icon files.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub icons: Vec<String>,

    /// Extra lines for the application registration descriptor.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub registration_rules: Vec<String>,

    /// Localize captions and resources from translation files.
    #[serde(default)]
    pub localize_deployment: bool,

    /// Translation source files.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub translations: Vec<String>,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            target: String::new(),
            template: Template::default(),
            uid3: None,
            version: None,
            display_name: None,
            pkg_build_version: None,
            installer_header: None,
            manufacturers: Vec::new(),
            manufacturers_fail_message: None,
            app_resource_dir: default_app_resource_dir(),
            reg_resource_import_dir: default_reg_resource_import_dir(),
            icons: Vec::new(),
            registration_rules: Vec::new(),
            localize_deployment: false,
            translations: Vec::new(),
        }
    }
}

/// Kind of binary a project builds.
#[derive(Default, Debug, PartialEq, Eq, Clone, Copy, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Template {
    /// Application executable with registration and caption resources.
    #[default]
    App,

    /// Library, deployed without any resources of its own.
    Lib,
}

/// SDK settings.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct ToolchainSettings {
    /// Root of the SDK, always ends with a forward slash after parsing.
    #[serde(default = "default_epoc_root")]
    pub epoc_root: String,

    /// Binaries are built by the full system build, so they live in the SDK
    /// release tree instead of next to their sources.
    #[serde(default = "default_full_system_build")]
    pub full_system_build: bool,

    /// Smart installer bootstrap package embedded into installer wrapper.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smart_installer: Option<String>,
}

impl Default for ToolchainSettings {
    fn default() -> Self {
        Self {
            epoc_root: default_epoc_root(),
            full_system_build: default_full_system_build(),
            smart_installer: None,
        }
    }
}

/// Pair of translation language code and target platform language code.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct LocalePair {
    /// Language code of the translation system, e.g., "fi".
    pub source: String,

    /// Language code of the target platform, e.g., "09".
    pub target: String,
}

impl LocalePair {
    /// Construct new locale pair.
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// Declared deployment unit.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct DeploymentDefinition {
    /// Name of deployment unit.
    pub name: String,

    /// Source files, directories, or wildcard patterns.
    #[serde(default, alias = "files")]
    pub sources: Vec<String>,

    /// Logical destination path on device.
    #[serde(default)]
    pub path: String,

    /// Free-form flags appended to each manifest file line.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<String>,

    /// Manifest rules placed before the file list.
    #[serde(default)]
    pub pkg_prerules: VariantRules,

    /// Manifest rules placed after the file list.
    #[serde(default)]
    pub pkg_postrules: VariantRules,
}

/// Manifest rule names grouped by output document variant.
///
/// Each entry is either the name of a list in the `rules` section, or a
/// literal rule line.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct VariantRules {
    /// Rules shared between documents.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub common: Vec<String>,

    /// Rules for main package only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub main: Vec<String>,

    /// Rules for installer wrapper package only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub installer: Vec<String>,

    /// Rules for stub package only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stub: Vec<String>,
}

fn default_app_resource_dir() -> String {
    "/resource/apps".into()
}

fn default_reg_resource_import_dir() -> String {
    "/private/10003a3f/import/apps".into()
}

fn default_epoc_root() -> String {
    "${EPOCROOT:-/}".into()
}

fn default_full_system_build() -> bool {
    true
}

fn normalize_epoc_root(epoc_root: &str) -> String {
    let mut root = epoc_root.replace('\\', "/");
    if !root.ends_with('/') {
        root.push('/');
    }

    root
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read project definition file.
    #[error("failed to read project definition at {:?}", path.display())]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Failed to deserialize configuration.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to serialize configuration.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),

    /// Failed to perform shell expansion on configuration.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),
}

impl From<ConfigError> for FmtError {
    fn from(_: ConfigError) -> Self {
        FmtError
    }
}

/// Friendly result alias :3
type Result<T, E = ConfigError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;

    #[sealed_test(env = [("SDK", "/opt/sdk")])]
    fn deserialize_project_definition() -> anyhow::Result<()> {
        let result: ProjectDefinition = r#"
            [project]
            target = "helloworld"
            version = "1.2.3"
            manufacturers = ["0x101F6F88"]
            localize_deployment = true

            [toolchain]
            epoc_root = "$SDK"
            smart_installer = "$SDK/smartinstaller.sis"

            [[locale]]
            source = "fi"
            target = "09"

            [rules]
            supported_platforms = ["[0x1028315F],0,0,0,{\"S60ProductID\"}"]

            [[deployment]]
            name = "assets"
            files = ["data/*.txt"]
            path = "/data"

            [deployment.pkg_prerules]
            common = ["supported_platforms"]
            stub = ["; stub only"]
        "#
        .parse()?;

        let expect = ProjectDefinition {
            project: ProjectSettings {
                target: "helloworld".into(),
                version: Some("1.2.3".into()),
                manufacturers: vec!["0x101F6F88".into()],
                localize_deployment: true,
                ..Default::default()
            },
            toolchain: ToolchainSettings {
                epoc_root: "/opt/sdk/".into(),
                full_system_build: true,
                smart_installer: Some("/opt/sdk/smartinstaller.sis".into()),
            },
            locales: vec![LocalePair::new("fi", "09")],
            rules: BTreeMap::from([(
                "supported_platforms".to_string(),
                vec!["[0x1028315F],0,0,0,{\"S60ProductID\"}".to_string()],
            )]),
            deployments: vec![DeploymentDefinition {
                name: "assets".into(),
                sources: vec!["data/*.txt".into()],
                path: "/data".into(),
                flags: Vec::new(),
                pkg_prerules: VariantRules {
                    common: vec!["supported_platforms".into()],
                    stub: vec!["; stub only".into()],
                    ..Default::default()
                },
                pkg_postrules: VariantRules::default(),
            }],
        };

        assert_eq!(result, expect);

        Ok(())
    }

    #[sealed_test(env = [("EPOCROOT", "C:\\Symbian\\SDK")])]
    fn epoc_root_defaults_to_environment() -> anyhow::Result<()> {
        let result: ProjectDefinition = r#"
            [project]
            target = "app"
            template = "lib"
        "#
        .parse()?;

        assert_eq!(result.toolchain.epoc_root, "C:/Symbian/SDK/");
        assert_eq!(result.project.template, Template::Lib);
        assert_eq!(result.project.app_resource_dir, "/resource/apps");
        assert_eq!(
            result.project.reg_resource_import_dir,
            "/private/10003a3f/import/apps"
        );

        Ok(())
    }

    #[test]
    fn reject_missing_target() {
        let result = "[project]\nversion = \"1.0\"\n".parse::<ProjectDefinition>();
        assert!(matches!(result, Err(ConfigError::Deserialize(_))));
    }

    #[test]
    fn serialized_definition_parses_back() -> anyhow::Result<()> {
        let definition = ProjectDefinition {
            project: ProjectSettings {
                target: "app".into(),
                ..Default::default()
            },
            toolchain: ToolchainSettings {
                epoc_root: "/sdk/".into(),
                ..Default::default()
            },
            deployments: vec![DeploymentDefinition {
                name: "docs".into(),
                sources: vec!["readme.txt".into()],
                path: "docs".into(),
                flags: vec!["FT".into()],
                ..Default::default()
            }],
            ..Default::default()
        };

        let result: ProjectDefinition = definition.to_string().parse()?;
        assert_eq!(result, definition);

        Ok(())
    }
}
