// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Package manifest rules.
//!
//! Every deployment unit may carry free-form manifest rule lines that go
//! before (__pre-rules__) or after (__post-rules__) the generated file list.
//! Rules are declared in one of four [`Variant`] buckets, and distributed
//! into the three generated [`Document`]s.
//!
//! # Rule Kinds
//!
//! Pre-rule lines are classified by their first character:
//!
//! - `&` declares package languages.
//! - `#` is the package header.
//! - `%` and `:` declare vendor names.
//! - Anything else is passed through as is.
//!
//! Only the common bucket may hold language, header, or vendor lines. Such
//! lines in any other bucket are usage errors, and are reported through a
//! single warning instead of being applied.

pub mod document;
pub mod version;

use crate::config::{DeploymentDefinition, VariantRules};

use std::{
    collections::BTreeMap,
    fmt::{Display, Formatter, Result as FmtResult},
};
use tracing::{debug, warn};

/// Rule bucket of a deployment unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Variant {
    /// Shared between documents.
    Common,

    /// Main package only.
    Main,

    /// Installer wrapper package only.
    Installer,

    /// Stub package only.
    Stub,
}

impl Variant {
    /// Every variant in declaration order.
    pub const ALL: [Variant; 4] = [Self::Common, Self::Main, Self::Installer, Self::Stub];

    /// Suffix naming the variant in diagnostics, e.g., ".main".
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Common => "",
            Self::Main => ".main",
            Self::Installer => ".installer",
            Self::Stub => ".stub",
        }
    }
}

/// Generated manifest document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Document {
    /// Main package with the full file list.
    Main,

    /// Installer wrapper embedding the main package.
    Installer,

    /// Stub package listing files already present in ROM.
    Stub,
}

impl Document {
    /// Every document in generation order.
    pub const ALL: [Document; 3] = [Self::Main, Self::Installer, Self::Stub];
}

impl Display for Document {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Main => fmt.write_str("main"),
            Self::Installer => fmt.write_str("installer"),
            Self::Stub => fmt.write_str("stub"),
        }
    }
}

/// Documents that a pre-rule line of a given variant propagates to.
///
/// Common lines starting with `(` declare package dependencies, so they only
/// make sense in the main document. Common lines starting with `[` declare
/// platform dependencies, which stub documents must never carry. Only the
/// first character is inspected.
pub fn propagation(line: &str, variant: Variant) -> &'static [Document] {
    match variant {
        Variant::Common if line.starts_with('(') => &[Document::Main],
        Variant::Common if line.starts_with('[') => &[Document::Main, Document::Installer],
        Variant::Common => &Document::ALL,
        Variant::Main => &[Document::Main],
        Variant::Installer => &[Document::Installer],
        Variant::Stub => &[Document::Stub],
    }
}

/// Kind of pre-rule line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    /// Passed through as is.
    Raw,

    /// Package language declaration.
    Language,

    /// Package header.
    Header,

    /// Localized or unique vendor name.
    Vendor,
}

impl RuleKind {
    /// Classify rule line by its first character.
    pub fn classify(line: &str) -> Self {
        match line.chars().next() {
            Some('&') => Self::Language,
            Some('#') => Self::Header,
            Some('%' | ':') => Self::Vendor,
            _ => Self::Raw,
        }
    }
}

/// Classified pre-rules of one variant bucket.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ClassifiedPreRules {
    /// Lines passed through as is.
    pub raw: Vec<String>,

    /// Language declarations.
    pub language: Vec<String>,

    /// Package headers.
    pub header: Vec<String>,

    /// Vendor declarations.
    pub vendor: Vec<String>,

    /// Lines rejected as usage errors.
    pub rejected: Vec<String>,
}

/// Expand rule names into literal lines.
///
/// A name with an entry in `named` expands into that list of lines. Any
/// other name is a literal line itself. Empty names are dropped with a
/// warning.
pub fn expand_rule_names(
    unit: &str,
    names: &[String],
    named: &BTreeMap<String, Vec<String>>,
) -> Vec<String> {
    let mut lines = Vec::new();
    for name in names {
        if name.trim().is_empty() {
            warn!("empty manifest rule in deployment {unit:?}");
            continue;
        }

        match named.get(name) {
            Some(values) => lines.extend(values.iter().cloned()),
            None => lines.push(name.clone()),
        }
    }

    lines
}

/// Classify pre-rule lines of a variant bucket.
pub fn classify_pre_rules(lines: Vec<String>, variant: Variant) -> ClassifiedPreRules {
    let mut classified = ClassifiedPreRules::default();
    for line in lines {
        let kind = RuleKind::classify(&line);

        // INVARIANT: Variant specific buckets only accept raw lines.
        if variant != Variant::Common && kind != RuleKind::Raw {
            classified.rejected.push(line);
            continue;
        }

        match kind {
            RuleKind::Raw => classified.raw.push(line),
            RuleKind::Language => classified.language.push(line),
            RuleKind::Header => classified.header.push(line),
            RuleKind::Vendor => classified.vendor.push(line),
        }
    }

    classified
}

/// Manifest rules of all deployment units, distributed per document.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RuleSet {
    common_pre: BTreeMap<Document, Vec<String>>,
    variant_pre: BTreeMap<Document, Vec<String>>,
    post: BTreeMap<Document, Vec<String>>,
    language: Vec<String>,
    header: Vec<String>,
    vendor: Vec<String>,
    rejected: Vec<String>,
}

impl RuleSet {
    /// Aggregate rules of deployment units.
    ///
    /// Never fails. Misplaced language, header, or vendor lines are collected
    /// as usage errors, see [`RuleSet::rejected`].
    pub fn aggregate(units: &[DeploymentDefinition], named: &BTreeMap<String, Vec<String>>) -> Self {
        let mut rules = Self::default();
        for unit in units {
            rules.add_unit(&unit.name, &unit.pkg_prerules, &unit.pkg_postrules, named);
        }

        rules
    }

    fn add_unit(
        &mut self,
        name: &str,
        pre_rules: &VariantRules,
        post_rules: &VariantRules,
        named: &BTreeMap<String, Vec<String>>,
    ) {
        for variant in Variant::ALL {
            let lines = expand_rule_names(name, pre_rules.bucket(variant), named);
            let classified = classify_pre_rules(lines, variant);
            for line in classified.raw {
                for document in propagation(&line, variant) {
                    let target = match variant {
                        Variant::Common => &mut self.common_pre,
                        _ => &mut self.variant_pre,
                    };
                    target.entry(*document).or_default().push(line.clone());
                }
            }
            self.language.extend(classified.language);
            self.header.extend(classified.header);
            self.vendor.extend(classified.vendor);
            self.rejected.extend(classified.rejected);

            // INVARIANT: Common post-rules only go to the main document.
            let lines = expand_rule_names(name, post_rules.bucket(variant), named);
            let document = match variant {
                Variant::Common | Variant::Main => Document::Main,
                Variant::Installer => Document::Installer,
                Variant::Stub => Document::Stub,
            };
            if !lines.is_empty() {
                debug!(
                    "{} post-rules from {name}.pkg_postrules{} go to {document}",
                    lines.len(),
                    variant.suffix()
                );
            }
            self.post.entry(document).or_default().extend(lines);
        }
    }

    /// Final pre-rules of document.
    ///
    /// Rules distributed from common buckets come first, followed by the
    /// variant specific ones.
    pub fn pre_rules(&self, document: Document) -> Vec<String> {
        let mut lines = self.common_pre.get(&document).cloned().unwrap_or_default();
        lines.extend(self.variant_pre.get(&document).cloned().unwrap_or_default());
        lines
    }

    /// Final post-rules of document.
    pub fn post_rules(&self, document: Document) -> &[String] {
        self.post.get(&document).map(Vec::as_slice).unwrap_or_default()
    }

    /// Explicit language declarations.
    pub fn language_rules(&self) -> &[String] {
        &self.language
    }

    /// Explicit package headers.
    pub fn header_rules(&self) -> &[String] {
        &self.header
    }

    /// Explicit vendor declarations.
    pub fn vendor_rules(&self) -> &[String] {
        &self.vendor
    }

    /// Check if explicit vendor declaration of given form exists, i.e., `%`
    /// or `:`.
    pub fn has_vendor_rule(&self, prefix: char) -> bool {
        self.vendor.iter().any(|line| line.starts_with(prefix))
    }

    /// Lines rejected as usage errors.
    pub fn rejected(&self) -> &[String] {
        &self.rejected
    }

    /// Describe usage errors found in rules.
    pub fn usage_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if !self.rejected.is_empty() {
            errors.push(format!(
                "language, header, and vendor rules are only supported in common pre-rules, ignoring: {}",
                self.rejected.join(", ")
            ));
        }

        if !self.language.is_empty() && self.header.is_empty() {
            errors.push("language rule set without matching header rule".into());
        }

        errors
    }

    /// Report usage errors, one warning each.
    pub fn report_usage_errors(&self) {
        for error in self.usage_errors() {
            warn!("{error}");
        }
    }
}

impl VariantRules {
    /// Rule names of variant bucket.
    pub fn bucket(&self, variant: Variant) -> &[String] {
        match variant {
            Variant::Common => &self.common,
            Variant::Main => &self.main,
            Variant::Installer => &self.installer,
            Variant::Stub => &self.stub,
        }
    }
}
