// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Application resource side files.
//!
//! Applications need three resource sources next to their manifests: a
//! registration descriptor, a localisable caption and icon descriptor, and a
//! localization header that defines captions per language.

use crate::localize::LocalizationEntry;

/// Inputs of resource side file generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceInfo {
    /// Build target name.
    pub target: String,

    /// Application UID as written into headers.
    pub uid3: String,

    /// Device directory of application resources.
    pub app_resource_dir: String,

    /// Icon files of application.
    pub icons: Vec<String>,

    /// Extra registration descriptor lines.
    pub registration_rules: Vec<String>,

    /// Localized captions.
    pub localization: Vec<LocalizationEntry>,

    /// Generation timestamp.
    pub generated_at: String,
}

/// File name of registration descriptor.
pub fn registration_file_name(target: &str) -> String {
    format!("{target}_reg.rss")
}

/// File name of caption and icon descriptor.
pub fn resource_file_name(target: &str) -> String {
    format!("{target}.rss")
}

/// File name of localization header.
pub fn localization_file_name(target: &str) -> String {
    format!("{target}.loc")
}

/// Render registration descriptor.
pub fn render_registration(info: &ResourceInfo) -> String {
    let mut out = banner(info);
    out.push_str(&format!("#include <{}.rsg>\n", info.target));
    out.push_str("#include <appinfo.rh>\n\n");
    out.push_str("UID2 KUidAppRegistrationResourceFile\n");
    out.push_str(&format!("UID3 {}\n\n", info.uid3));
    out.push_str("RESOURCE APP_REGISTRATION_INFO\n\t{\n");
    out.push_str(&format!("\tapp_file=\"{}\";\n", info.target));
    out.push_str(&format!(
        "\tlocalisable_resource_file=\"{}{}\";\n",
        device_dir(&info.app_resource_dir),
        info.target
    ));
    out.push_str("\tlocalisable_resource_id=R_LOCALISABLE_APP_INFO;\n");
    for rule in &info.registration_rules {
        out.push_str(&format!("\t{rule}\n"));
    }
    out.push_str("\t}\n");

    out
}

/// Render caption and icon descriptor.
pub fn render_resource(info: &ResourceInfo) -> String {
    let mut out = banner(info);
    out.push_str("#include <appinfo.rh>\n");
    out.push_str(&format!("#include \"{}\"\n\n", localization_file_name(&info.target)));
    out.push_str("RESOURCE LOCALISABLE_APP_INFO r_localisable_app_info\n\t{\n");
    out.push_str("\tshort_caption = STRING_r_short_caption;\n");
    out.push_str("\tcaption_and_icon =\n\tCAPTION_AND_ICON_INFO\n\t\t{\n");
    out.push_str("\t\tcaption = STRING_r_caption;\n");
    if !info.icons.is_empty() {
        out.push_str("\t\tnumber_of_icons = 1;\n");
        out.push_str(&format!(
            "\t\ticon_file = \"{}{}_{}.mif\";\n",
            device_dir(&info.app_resource_dir),
            info.target,
            info.uid3
        ));
    }
    out.push_str("\t\t};\n\t}\n");

    out
}

/// Render localization header.
///
/// Each configured locale gets its own `LANGUAGE_<code>` block. Missing
/// captions fall back to the target name, and a missing long caption falls
/// back to the short caption.
pub fn render_localization(info: &ResourceInfo) -> String {
    let mut out = banner(info);
    out.push_str("#ifdef LANGUAGE_SC\n");
    push_captions(&mut out, &info.target, &info.target);

    for entry in &info.localization {
        let short = if entry.short_caption.is_empty() {
            info.target.as_str()
        } else {
            entry.short_caption.as_str()
        };
        let long = if entry.long_caption.is_empty() {
            short
        } else {
            entry.long_caption.as_str()
        };

        out.push_str(&format!("#elif defined LANGUAGE_{}\n", entry.target_code));
        push_captions(&mut out, short, long);
    }

    out.push_str("#else\n");
    push_captions(&mut out, &info.target, &info.target);
    out.push_str("#endif\n");

    out
}

fn push_captions(out: &mut String, short: &str, long: &str) {
    out.push_str(&format!("#define STRING_r_short_caption \"{}\"\n", escape(short)));
    out.push_str(&format!("#define STRING_r_caption \"{}\"\n", escape(long)));
}

fn banner(info: &ResourceInfo) -> String {
    format!(
        "// ============================================================================\n\
         // * Generated by sisgen at {}\n\
         // * This file is generated by sisgen and should not be modified by the\n\
         // * user.\n\
         // ============================================================================\n\n",
        info.generated_at
    )
}

/// Render device directory in resource compiler form, e.g., `\\resource\\apps\\`.
fn device_dir(dir: &str) -> String {
    let mut out = dir.trim_end_matches('/').replace('/', "\\\\");
    out.push_str("\\\\");
    out
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn info() -> ResourceInfo {
        ResourceInfo {
            target: "helloworld".into(),
            uid3: "0xE1234567".into(),
            app_resource_dir: "/resource/apps".into(),
            icons: Vec::new(),
            registration_rules: vec!["embeddability=KAppNotEmbeddable;".into()],
            localization: Vec::new(),
            generated_at: "2025-01-01T00:00:00".into(),
        }
    }

    const BANNER: &str = indoc! {"
        // ============================================================================
        // * Generated by sisgen at 2025-01-01T00:00:00
        // * This file is generated by sisgen and should not be modified by the
        // * user.
        // ============================================================================

    "};

    #[test]
    fn render_registration_descriptor() {
        let expect = format!(
            "{BANNER}{}{}",
            indoc! {"
                #include <helloworld.rsg>
                #include <appinfo.rh>

                UID2 KUidAppRegistrationResourceFile
                UID3 0xE1234567

                RESOURCE APP_REGISTRATION_INFO
            "},
            concat!(
                "\t{\n",
                "\tapp_file=\"helloworld\";\n",
                "\tlocalisable_resource_file=\"\\\\resource\\\\apps\\\\helloworld\";\n",
                "\tlocalisable_resource_id=R_LOCALISABLE_APP_INFO;\n",
                "\tembeddability=KAppNotEmbeddable;\n",
                "\t}\n",
            )
        );
        assert_eq!(render_registration(&info()), expect);
    }

    #[test]
    fn render_resource_with_icon() {
        let mut with_icon = info();
        with_icon.icons = vec!["icon.svg".into()];

        let result = render_resource(&with_icon);
        assert!(result.contains("#include \"helloworld.loc\"\n"));
        assert!(result.contains("\t\tnumber_of_icons = 1;\n"));
        assert!(result.contains("\t\ticon_file = \"\\\\resource\\\\apps\\\\helloworld_0xE1234567.mif\";\n"));

        let result = render_resource(&info());
        assert!(!result.contains("icon_file"));
    }

    #[test]
    fn render_localization_header() {
        let mut info = info();
        info.localization = vec![
            LocalizationEntry {
                short_caption: "Hei".into(),
                long_caption: "Hei \"maailma\"".into(),
                ..LocalizationEntry::new("09")
            },
            LocalizationEntry {
                short_caption: "Hallo".into(),
                ..LocalizationEntry::new("03")
            },
            LocalizationEntry::new("06"),
        ];

        let expect = format!(
            "{BANNER}{}",
            indoc! {r#"
                #ifdef LANGUAGE_SC
                #define STRING_r_short_caption "helloworld"
                #define STRING_r_caption "helloworld"
                #elif defined LANGUAGE_09
                #define STRING_r_short_caption "Hei"
                #define STRING_r_caption "Hei \"maailma\""
                #elif defined LANGUAGE_03
                #define STRING_r_short_caption "Hallo"
                #define STRING_r_caption "Hallo"
                #elif defined LANGUAGE_06
                #define STRING_r_short_caption "helloworld"
                #define STRING_r_caption "helloworld"
                #else
                #define STRING_r_short_caption "helloworld"
                #define STRING_r_caption "helloworld"
                #endif
            "#}
        );
        assert_eq!(render_localization(&info), expect);
    }
}
