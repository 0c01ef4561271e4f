// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Localization of captions, package names, and resources.
//!
//! Locales come in pairs: the language code of the translation system, e.g.,
//! "fi", and the numeric language code of the target platform, e.g., "09".
//! For each pair, the first translation file whose name ends in
//! `_<source code>.<ext>` supplies the captions of that locale.

pub mod ts;

use crate::{config::LocalePair, localize::ts::extract_captions};

use glob::{MatchOptions, Pattern};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument, warn};

/// Localized captions and package names of one target locale.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LocalizationEntry {
    /// Language code of the target platform.
    pub target_code: String,

    /// Short application caption.
    pub short_caption: String,

    /// Long application caption.
    pub long_caption: String,

    /// Package name.
    pub package_name: String,

    /// Smart installer package name.
    pub installer_package_name: String,
}

impl LocalizationEntry {
    /// Construct new entry with empty captions.
    pub fn new(target_code: impl Into<String>) -> Self {
        Self {
            target_code: target_code.into(),
            ..Default::default()
        }
    }
}

/// Collect localization entries, one per locale pair.
///
/// Candidate files are scanned in order. The first candidate matching a
/// locale whose captions extract successfully wins. Extraction failures are
/// logged, and leave captions of the entry empty.
#[instrument(skip(pairs, candidates), level = "debug")]
pub fn collect(pairs: &[LocalePair], candidates: &[PathBuf]) -> Vec<LocalizationEntry> {
    let options = MatchOptions {
        case_sensitive: false,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };

    let mut entries = Vec::with_capacity(pairs.len());
    for pair in pairs {
        let mut entry = LocalizationEntry::new(&pair.target);
        let pattern = match Pattern::new(&format!("*_{}.*", Pattern::escape(&pair.source))) {
            Ok(pattern) => pattern,
            Err(error) => {
                warn!("invalid locale code {:?}: {error}", pair.source);
                entries.push(entry);
                continue;
            }
        };

        for candidate in candidates {
            let Some(name) = candidate.file_name().map(|name| name.to_string_lossy()) else {
                continue;
            };
            if !pattern.matches_with(&name, options) {
                continue;
            }

            match extract_captions(candidate) {
                Ok(captions) => {
                    debug!("locale {:?} uses {:?}", pair.source, candidate.display());
                    entry.short_caption = captions.short_caption;
                    entry.long_caption = captions.long_caption;
                    entry.package_name = captions.package_name;
                    entry.installer_package_name = captions.installer_package_name;
                    break;
                }
                Err(error) => warn!("{error}"),
            }
        }

        entries.push(entry);
    }

    entries
}

/// Derive locale pairs from translation file names.
///
/// Translation files are expected to be named `<anything>_<code>.<ext>`,
/// where the code may itself hold a country part, e.g., `app_zh_CN.ts`.
/// Codes without a known target language code are dropped with a warning.
pub fn derive_locales(translations: &[impl AsRef<Path>]) -> Vec<LocalePair> {
    let mut pairs: Vec<LocalePair> = Vec::new();
    for translation in translations {
        let Some(stem) = translation
            .as_ref()
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
        else {
            continue;
        };

        let parts: Vec<&str> = stem.split('_').skip(1).collect();
        let candidates = match parts.as_slice() {
            [] => Vec::new(),
            [.., language, country] => vec![format!("{language}_{country}"), country.to_string()],
            [language] => vec![language.to_string()],
        };

        let found = candidates
            .iter()
            .find_map(|code| target_language_code(code).map(|target| (code, target)));
        match found {
            Some((code, target)) => {
                if !pairs.iter().any(|pair| &pair.source == code) {
                    pairs.push(LocalePair::new(code.clone(), target));
                }
            }
            None => warn!(
                "no target language code for translation file {:?}",
                translation.as_ref().display()
            ),
        }
    }

    pairs
}

/// Localized name of resource file, e.g., "app.rsc" to "app.r09".
///
/// Returns `None` for anything but compiled resource files.
pub fn localized_resource(path: &str, target_code: &str) -> Option<String> {
    let suffix = path.get(path.len().checked_sub(4)?..)?;
    if !suffix.eq_ignore_ascii_case(".rsc") {
        return None;
    }

    Some(format!("{}{target_code}", &path[..path.len() - 2]))
}

/// Target platform language code of translation system language code.
pub fn target_language_code(code: &str) -> Option<&'static str> {
    let target = match code {
        "en" | "en_GB" => "01",
        "fr" | "fr_FR" => "02",
        "de" | "de_DE" => "03",
        "es" | "es_ES" => "04",
        "it" | "it_IT" => "05",
        "sv" | "sv_SE" => "06",
        "da" | "da_DK" => "07",
        "no" | "nb" | "nb_NO" => "08",
        "fi" | "fi_FI" => "09",
        "en_US" => "10",
        "fr_CH" => "11",
        "de_CH" => "12",
        "pt" | "pt_PT" => "13",
        "tr" | "tr_TR" => "14",
        "is" | "is_IS" => "15",
        "ru" | "ru_RU" => "16",
        "hu" | "hu_HU" => "17",
        "nl" | "nl_NL" => "18",
        "nl_BE" => "19",
        "en_AU" => "20",
        "fr_BE" => "21",
        "de_AT" => "22",
        "en_NZ" => "23",
        "cs" | "cs_CZ" => "25",
        "sk" | "sk_SK" => "26",
        "pl" | "pl_PL" => "27",
        "sl" | "sl_SI" => "28",
        "zh_TW" => "29",
        "zh_HK" => "30",
        "zh" | "zh_CN" => "31",
        "ja" | "ja_JP" => "32",
        "th" | "th_TH" => "33",
        "af" => "34",
        "sq" => "35",
        "am" => "36",
        "ar" => "37",
        "hy" => "38",
        "tl" => "39",
        "be" => "40",
        "bn" => "41",
        "bg" => "42",
        "my" => "43",
        "ca" => "44",
        "hr" => "45",
        "en_CA" => "46",
        "en_ZA" => "48",
        "et" => "49",
        "fa" => "50",
        "fr_CA" => "51",
        "gd" => "52",
        "ka" => "53",
        "el" | "el_GR" => "54",
        "el_CY" => "55",
        "gu" => "56",
        "he" => "57",
        "hi" => "58",
        "id" => "59",
        "ga" => "60",
        "it_CH" => "61",
        "kn" => "62",
        "kk" => "63",
        "km" => "64",
        "ko" => "65",
        "lo" => "66",
        "lv" => "67",
        "lt" => "68",
        "mk" => "69",
        "ms" => "70",
        "ml" => "71",
        "mr" => "72",
        "mo" => "73",
        "mn" => "74",
        "nn" => "75",
        "pt_BR" => "76",
        "pa" => "77",
        "ro" => "78",
        "sr" => "79",
        "si" => "80",
        "so" => "81",
        "es_419" => "83",
        "sw" => "84",
        "sv_FI" => "85",
        "ta" => "87",
        "te" => "88",
        "bo" => "89",
        "ti" => "90",
        "tr_CY" => "91",
        "tk" => "92",
        "uk" => "93",
        "ur" => "94",
        "vi" => "96",
        "cy" => "97",
        "zu" => "98",
        _ => return None,
    };

    Some(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use sealed_test::prelude::*;
    use simple_test_case::test_case;
    use std::{env::current_dir, fs::write};

    fn translation(short_caption: &str) -> String {
        format!(
            indoc! {r#"
                <TS>
                <context>
                    <name>QtApplicationCaptions</name>
                    <message id="qtn_short_caption_app">
                        <source>x</source>
                        <translation>{}</translation>
                    </message>
                </context>
                </TS>
            "#},
            short_caption
        )
    }

    #[sealed_test]
    fn collect_first_successful_match() -> anyhow::Result<()> {
        let root = current_dir()?;
        write(root.join("broken_fi.ts"), "<TS><context>")?;
        write(root.join("app_FI.ts"), translation("Hei"))?;
        write(root.join("later_fi.ts"), translation("Later"))?;
        write(root.join("app_de.ts"), translation("Hallo"))?;

        let candidates = vec![
            root.join("app_de.ts"),
            root.join("broken_fi.ts"),
            root.join("missing_fi.ts"),
            root.join("app_FI.ts"),
            root.join("later_fi.ts"),
        ];
        let pairs = vec![
            LocalePair::new("fi", "09"),
            LocalePair::new("de", "03"),
            LocalePair::new("sv", "06"),
        ];

        let entries = collect(&pairs, &candidates);
        let expect = vec![
            LocalizationEntry {
                short_caption: "Hei".into(),
                ..LocalizationEntry::new("09")
            },
            LocalizationEntry {
                short_caption: "Hallo".into(),
                ..LocalizationEntry::new("03")
            },
            LocalizationEntry::new("06"),
        ];
        assert_eq!(entries, expect);

        Ok(())
    }

    #[test]
    fn derive_locales_from_file_names() {
        let translations = [
            "i18n/app_fi.ts",
            "i18n/app_zh_CN.ts",
            "i18n/my_app_en_US.ts",
            "i18n/app_fi.qm",
            "i18n/app_xx.ts",
            "i18n/app.ts",
        ];
        let expect = vec![
            LocalePair::new("fi", "09"),
            LocalePair::new("zh_CN", "31"),
            LocalePair::new("en_US", "10"),
        ];
        assert_eq!(derive_locales(&translations), expect);
    }

    #[test_case("/sdk/epoc32/data/z/resource/apps/app.rsc", Some("/sdk/epoc32/data/z/resource/apps/app.r09"); "resource file")]
    #[test_case("APP.RSC", Some("APP.R09"); "uppercase suffix")]
    #[test_case("app.rss", None; "resource source")]
    #[test_case("sc", None; "short name")]
    #[test]
    fn localize_resource_names(path: &str, expect: Option<&str>) {
        assert_eq!(localized_resource(path, "09").as_deref(), expect);
    }
}
