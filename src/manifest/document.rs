// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Manifest document rendering.
//!
//! Each project produces three package manifests:
//!
//! - __main__: header, vendor, rules, and one line per copy directive.
//! - __installer__: wrapper that embeds the main package together with the
//!   smart installer bootstrap.
//! - __stub__: lists every non-text file of the main package as already
//!   present on the Z drive, for packages preinstalled in ROM.

use crate::{
    deploy::CopyDirective,
    localize::LocalizationEntry,
    manifest::{Document, RuleSet},
    path::{split_drive, to_forward_slashes},
    uid::ApplicationUid,
};

use std::path::PathBuf;

/// Language declared when no locales are configured.
pub const DEFAULT_LANGUAGE: &str = "EN";

/// Vendor name used when none is declared.
pub const DEFAULT_VENDOR: &str = "Vendor";

/// Installer header UID for applications in the protected UID range.
pub const PROTECTED_INSTALLER_UID: &str = "0x2002CCCF";

/// Installer header UID for self-signable applications.
pub const UNPROTECTED_INSTALLER_UID: &str = "0xA000D7CE";

/// UID of the smart installer bootstrap package.
pub const SMART_INSTALLER_UID: &str = "0x2002CCCD";

/// Import directory of the smart installer on device.
pub const SMART_INSTALLER_IMPORT_DIR: &str = "!:/private/2002CCCE/import";

/// Message shown when manufacturer restriction fails.
pub const DEFAULT_MANUFACTURER_NOTE: &str = "Package is not compatible with this device.";

/// Package metadata shared by all documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageInfo {
    /// Build target name.
    pub target: String,

    /// Display name, used when a locale lacks its own package name.
    pub display_name: String,

    /// Application UID.
    pub uid: ApplicationUid,

    /// Package version, e.g., "1,0,0".
    pub version: String,

    /// Installer header override, either a UID or a verbatim header line.
    pub installer_header: Option<String>,

    /// Localized package names, one entry per locale.
    pub localization: Vec<LocalizationEntry>,

    /// Manufacturer identifiers the main package is restricted to.
    pub manufacturers: Vec<String>,

    /// Text file shown when manufacturer restriction fails.
    pub manufacturer_note: Option<PathBuf>,

    /// Directory holding the built main package.
    pub package_dir: PathBuf,

    /// Smart installer bootstrap package.
    pub smart_installer: Option<String>,

    /// Generation timestamp.
    pub generated_at: String,
}

impl PackageInfo {
    /// Package names of main and stub documents, one per locale.
    pub fn package_names(&self) -> Vec<String> {
        if self.localization.is_empty() {
            return vec![self.display_name.clone()];
        }

        self.localization
            .iter()
            .map(|entry| non_empty_or(&entry.package_name, &self.display_name))
            .collect()
    }

    /// Package names of installer document, one per locale.
    pub fn installer_names(&self) -> Vec<String> {
        if self.localization.is_empty() {
            return vec![format!("{} installer", self.display_name)];
        }

        self.localization
            .iter()
            .map(|entry| {
                let name = non_empty_or(&entry.package_name, &self.display_name);
                non_empty_or(&entry.installer_package_name, &format!("{name} installer"))
            })
            .collect()
    }

    fn language_codes(&self) -> Vec<&str> {
        self.localization
            .iter()
            .map(|entry| entry.target_code.as_str())
            .collect()
    }
}

/// File name of document for target.
pub fn document_file_name(target: &str, document: Document) -> String {
    match document {
        Document::Main => format!("{target}_template.pkg"),
        Document::Installer => format!("{target}_installer.pkg"),
        Document::Stub => format!("{target}_stub.pkg"),
    }
}

/// Reduce display name to its last path component.
pub fn display_name(name: &str) -> String {
    let name = name.trim_end_matches(['/', '\\']);
    name.rsplit(['/', '\\']).next().unwrap_or(name).to_owned()
}

/// Render a manifest document.
///
/// Never fails. Missing rules are replaced by defaults. Rule usage errors
/// are reported once per run, see [`RuleSet::report_usage_errors`].
pub fn render(
    document: Document,
    info: &PackageInfo,
    rules: &RuleSet,
    directives: &[CopyDirective],
) -> String {
    let mut out = String::new();
    let file_name = document_file_name(&info.target, document);

    out.push_str(&format!(
        "; {file_name} generated by sisgen at {}\n",
        info.generated_at
    ));
    out.push_str("; This file is generated by sisgen and should not be modified by the user\n");
    out.push_str(";\n\n");

    render_language(&mut out, info, rules);
    render_header(&mut out, document, info, rules);
    render_vendor(&mut out, info, rules);

    out.push_str("; Manual PKG pre-rules from PRO files\n");
    for line in rules.pre_rules(document) {
        out.push_str(&format!("{line}\n"));
    }
    out.push('\n');

    let restricted = document == Document::Main && !info.manufacturers.is_empty();
    if restricted {
        let conditions: Vec<String> = info
            .manufacturers
            .iter()
            .map(|manufacturer| format!("(MANUFACTURER)=({manufacturer})"))
            .collect();
        out.push_str(&format!("IF {}\n\n", conditions.join(" OR ")));
    }

    match document {
        Document::Main => render_main_deployment(&mut out, directives),
        Document::Installer => render_installer_deployment(&mut out, info),
        Document::Stub => render_stub_deployment(&mut out, directives),
    }
    out.push('\n');

    out.push_str("; Manual PKG post-rules from PRO files\n");
    for line in rules.post_rules(document) {
        out.push_str(&format!("{line}\n"));
    }

    if restricted {
        out.push_str("\nELSEIF NOT(0) ; MANUFACTURER\n");
        if let Some(note) = &info.manufacturer_note {
            out.push_str(&format!(
                "\"{}\" - \"\", FILETEXT, TEXTEXIT\n",
                to_forward_slashes(note)
            ));
        }
        out.push_str("ENDIF ; MANUFACTURER\n");
    }

    out
}

fn render_language(out: &mut String, info: &PackageInfo, rules: &RuleSet) {
    if !rules.language_rules().is_empty() {
        out.push_str("; Language\n");
        for line in rules.language_rules() {
            out.push_str(&format!("{line}\n"));
        }
        out.push('\n');
        return;
    }

    let codes = info.language_codes();
    if codes.is_empty() {
        out.push_str(&format!("; Language\n&{DEFAULT_LANGUAGE}\n\n"));
    } else {
        out.push_str(&format!("; Languages\n&{}\n\n", codes.join(",")));
    }
}

fn render_header(out: &mut String, document: Document, info: &PackageInfo, rules: &RuleSet) {
    if document == Document::Installer {
        out.push_str("; SIS header: name, uid, version\n");
        match info.installer_header.as_deref() {
            Some(header) if header.starts_with("0x") => {
                out.push_str(&sis_header(&info.installer_names(), header, &info.version));
            }
            Some(header) => out.push_str(&format!("{header}\n")),
            None => {
                let uid = if info.uid.is_protected() {
                    PROTECTED_INSTALLER_UID
                } else {
                    UNPROTECTED_INSTALLER_UID
                };
                out.push_str(&sis_header(&info.installer_names(), uid, &info.version));
            }
        }
        out.push('\n');
        return;
    }

    if rules.header_rules().is_empty() {
        out.push_str("; SIS header: name, uid, version\n");
        out.push_str(&sis_header(&info.package_names(), &info.uid.uid3, &info.version));
    } else {
        out.push_str("; Package header\n");
        for line in rules.header_rules() {
            out.push_str(&format!("{line}\n"));
        }
    }
    out.push('\n');
}

fn render_vendor(out: &mut String, info: &PackageInfo, rules: &RuleSet) {
    if !rules.has_vendor_rule('%') {
        let count = info.localization.len().max(1);
        let names = vec![format!("\"{DEFAULT_VENDOR}\""); count];
        out.push_str(&format!(
            "; Default localized vendor name\n%{{{}}}\n\n",
            names.join(",")
        ));
    }

    if !rules.has_vendor_rule(':') {
        out.push_str(&format!(
            "; Default unique vendor name\n:\"{DEFAULT_VENDOR}\"\n\n"
        ));
    }

    if !rules.vendor_rules().is_empty() {
        out.push_str("; Vendor names\n");
        for line in rules.vendor_rules() {
            out.push_str(&format!("{line}\n"));
        }
        out.push('\n');
    }
}

fn render_main_deployment(out: &mut String, directives: &[CopyDirective]) {
    out.push_str("; DEPLOYMENT\n");
    for directive in directives {
        // INVARIANT: Text shown during installation is never copied to device.
        if directive.is_text_only() {
            let text = CopyDirective {
                to: String::new(),
                ..directive.clone()
            };
            out.push_str(&format!("{text}\n"));
        } else {
            out.push_str(&format!("{directive}\n"));
        }
    }
}

fn render_stub_deployment(out: &mut String, directives: &[CopyDirective]) {
    out.push_str("; DEPLOYMENT\n");
    for directive in directives.iter().filter(|directive| !directive.is_text_only()) {
        let (_, rest) = split_drive(&directive.to);
        out.push_str(&format!("\"\" - \"z:{rest}\"\n"));
    }
}

fn render_installer_deployment(out: &mut String, info: &PackageInfo) {
    if let Some(smart_installer) = &info.smart_installer {
        out.push_str("; Embed smart installer\n");
        out.push_str(&format!("@\"{smart_installer}\",({SMART_INSTALLER_UID})\n\n"));
    }

    let package = info.package_dir.join(format!("{}.sis", info.target));
    out.push_str("; Deploy application package\n");
    out.push_str(&format!(
        "\"{}\" - \"{SMART_INSTALLER_IMPORT_DIR}/{}.sis\"\n",
        to_forward_slashes(package),
        info.target
    ));
}

fn sis_header(names: &[String], uid: &str, version: &str) -> String {
    format!("#{{\"{}\"}},({uid}),{version}\n", names.join("\",\""))
}

fn non_empty_or(value: &str, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_owned()
    } else {
        value.to_owned()
    }
}
