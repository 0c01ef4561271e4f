// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Stable identifier synthesis.
//!
//! Packages, registration files, and private directories all need a 32-bit
//! __UID__. Projects may set one explicitly, but most of the time a stable
//! one is derived from the fully qualified target name through a small
//! string hash. Identifiers that begin with the hex digit `E` are reserved
//! for test software, so generated UIDs are always forced into that range.

use std::collections::HashMap;
use tracing::{debug, warn};

/// Caller-owned cache of previously computed name hashes.
///
/// Hashing is cheap, but the same target names are looked up over and over
/// during one generation run. Entries are never invalidated.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UidCache {
    hashes: HashMap<String, String>,
}

impl UidCache {
    /// Construct new empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute stable hash of name as eight lowercase hex digits.
    ///
    /// Memoizes the result so later calls with the same name skip the hash.
    pub fn compute_hash(&mut self, name: &str) -> String {
        if let Some(hash) = self.hashes.get(name) {
            return hash.clone();
        }

        let hash = stable_hash(name);
        self.hashes.insert(name.to_owned(), hash.clone());

        hash
    }

    /// Compute test UID of name, e.g., `0xE1fac220`.
    ///
    /// The leading hex digit of the stable hash is always overwritten with
    /// `E`, even when it already was one.
    pub fn compute_test_hash(&mut self, name: &str) -> String {
        let hash = self.compute_hash(name);
        format!("0xE{}", &hash[1..])
    }

    /// Number of cached names.
    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    /// Check if cache is empty.
    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}

/// Compute stable hash of name without any caching.
///
/// All arithmetic wraps at 32 bits. Shift amounts stay below 20 so nothing
/// ever shifts out the full word.
pub fn stable_hash(name: &str) -> String {
    let mut hash: u32 = 5381;
    for (index, ch) in name.chars().enumerate() {
        let c = ch as u32;
        let i = index as u32;
        let term = c
            .wrapping_add(c.wrapping_sub(i) << (i % 20))
            .wrapping_add(c.wrapping_add(i) << ((i + 5) % 20))
            .wrapping_add(c.wrapping_sub(i.wrapping_mul(2)) << ((i + 10) % 20))
            .wrapping_add(c.wrapping_add(i.wrapping_mul(2)) << ((i + 15) % 20));
        hash ^= term;
    }

    format!("{hash:08x}")
}

/// Application UID along with its private directory form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationUid {
    /// UID as written into package headers, e.g., `0xE1fac220`.
    pub uid3: String,

    /// UID as eight lowercase hex digits, used as private directory name.
    pub private_dir: String,
}

impl ApplicationUid {
    /// Resolve application UID.
    ///
    /// Uses configured UID when present. Otherwise, generates a test UID from
    /// the fully qualified target name. Configured UIDs are accepted in hex
    /// with `0x` prefix or in decimal. An unparseable configured UID is
    /// replaced by the generated one.
    pub fn resolve(configured: Option<&str>, qualified_target: &str, cache: &mut UidCache) -> Self {
        let configured = configured.map(str::trim).filter(|uid| !uid.is_empty());
        if let Some(uid3) = configured {
            if let Some(value) = parse_uid(uid3) {
                return Self {
                    uid3: uid3.to_owned(),
                    private_dir: format!("{value:08x}"),
                };
            }

            warn!("invalid UID {uid3:?}, generating test UID instead");
        }

        let uid3 = cache.compute_test_hash(qualified_target);
        debug!("generated UID {uid3} for {qualified_target:?}");
        let private_dir = parse_uid(&uid3)
            .map(|value| format!("{value:08x}"))
            .unwrap_or_else(|| uid3.trim_start_matches("0x").to_lowercase());

        Self { uid3, private_dir }
    }

    /// Check if UID falls in the protected range, i.e., below `0x80000000`.
    pub fn is_protected(&self) -> bool {
        let mut chars = self.uid3.chars();
        matches!(
            (chars.next(), chars.next(), chars.next()),
            (Some('0'), Some('x' | 'X'), Some('0'..='7'))
        )
    }
}

/// Parse UID written in hex with `0x` prefix or in decimal.
pub fn parse_uid(uid: &str) -> Option<u32> {
    let uid = uid.trim();
    match uid.strip_prefix("0x").or_else(|| uid.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => uid.parse().ok(),
    }
}
