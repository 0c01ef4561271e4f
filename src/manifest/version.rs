// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Package version derivation.

use tracing::warn;

/// Version used when none can be derived.
pub const DEFAULT_VERSION: &str = "1,0,0";

/// Derive package version from dotted version and optional build number.
///
/// The first three components of the dotted version are used, with missing
/// trailing components set to zero and extra components dropped. Build
/// numbers between 0 and 99 are appended as two zero-padded digits directly
/// onto the last component.
pub fn app_version(version: Option<&str>, build: Option<&str>) -> String {
    let mut result = match version.map(str::trim).filter(|version| !version.is_empty()) {
        Some(version) => match parse_version(version) {
            Some([major, minor, patch]) => format!("{major},{minor},{patch}"),
            None => {
                warn!("invalid version {version:?}, using {DEFAULT_VERSION:?}");
                DEFAULT_VERSION.to_owned()
            }
        },
        None => DEFAULT_VERSION.to_owned(),
    };

    if let Some(build) = build.map(str::trim).filter(|build| !build.is_empty()) {
        match build.parse::<u8>() {
            Ok(number) if number <= 99 => result.push_str(&format!("{number:02}")),
            _ => warn!("invalid package build version {build:?}, must be between 0 and 99"),
        }
    }

    result
}

fn parse_version(version: &str) -> Option<[u32; 3]> {
    let mut components = [0; 3];
    let mut parts = version.split('.');
    for component in components.iter_mut() {
        match parts.next() {
            Some(part) => *component = part.trim().parse().ok()?,
            None => break,
        }
    }

    if parts.next().is_some() {
        warn!("version {version:?} has more than three components, ignoring the rest");
    }

    Some(components)
}

#[cfg(test)]
mod tests {
    use super::*;
    use simple_test_case::test_case;

    #[test_case(None, None, "1,0,0"; "no version")]
    #[test_case(Some(""), None, "1,0,0"; "empty version")]
    #[test_case(Some("abc"), None, "1,0,0"; "garbage version")]
    #[test_case(Some("2.5"), None, "2,5,0"; "two components")]
    #[test_case(Some("3"), None, "3,0,0"; "one component")]
    #[test_case(Some("1.2.3.4"), None, "1,2,3"; "extra components dropped")]
    #[test_case(Some("1.x.3"), None, "1,0,0"; "garbage component")]
    #[test_case(Some("2.5.9"), Some("7"), "2,5,907"; "build number padded")]
    #[test_case(Some("2.5.9"), Some("42"), "2,5,942"; "two digit build number")]
    #[test_case(Some("2.5.9"), Some("100"), "2,5,9"; "build number out of range")]
    #[test_case(Some("2.5.9"), Some("x"), "2,5,9"; "build number garbage")]
    #[test_case(None, Some("0"), "1,0,000"; "zero build number")]
    #[test]
    fn derive_app_version(version: Option<&str>, build: Option<&str>, expect: &str) {
        assert_eq!(app_version(version, build), expect);
    }
}
