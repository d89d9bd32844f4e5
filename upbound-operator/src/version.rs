//! Ordering of configuration package versions.
//!
//! Configuration packages are tagged `vMAJOR.MINOR.PATCH+COUNT.SHA`, where
//! `COUNT` is the commit counter of the build. The semver core decides the
//! order first; the commit counter breaks ties between builds of the same
//! core. The short SHA never takes part in the comparison.
//!
//! Parsing is lenient about build metadata: `v1.2.3`, `v1.2.3+7` and
//! `v1.2.3+7.abc1234` all parse. A missing or non-numeric counter counts as
//! `-1`, older than any real build. Strings whose core does not parse (for
//! example `latest`, `1.2` or `v1.2.3-rc.1`) are incomparable and
//! [`compare_versions`] reports them as [`Ordering::Equal`], so callers take
//! no action on malformed tags.

use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;

/// Commit counter assigned to versions without a usable one.
pub const UNKNOWN_COMMIT: i64 = -1;

macro_rules! static_regex {
    ($pattern:expr, $name:expr) => {
        Regex::new($pattern).unwrap_or_else(|_| {
            panic!(
                "Static regex '{}' failed to compile - this is a bug in the operator",
                $name
            )
        })
    };
}

/// `v?MAJOR.MINOR.PATCH` with optional `+BUILD`.
static VERSION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    static_regex!(
        r"^v?(\d+)\.(\d+)\.(\d+)(?:\+(.*))?$",
        "VERSION_PATTERN"
    )
});

/// A parsed configuration version.
///
/// Field order matters: the derived ordering compares the semver core
/// before the commit counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    /// Major version.
    pub major: u64,
    /// Minor version.
    pub minor: u64,
    /// Patch version.
    pub patch: u64,
    /// Commit counter from the build metadata, or [`UNKNOWN_COMMIT`].
    pub commit: i64,
}

impl Version {
    /// Parse a version string, returning `None` when the semver core is
    /// malformed.
    pub fn parse(raw: &str) -> Option<Self> {
        let caps = VERSION_PATTERN.captures(raw.trim())?;
        let number = |i: usize| caps.get(i)?.as_str().parse::<u64>().ok();

        Some(Self {
            major: number(1)?,
            minor: number(2)?,
            patch: number(3)?,
            commit: commit_number(raw.trim()),
        })
    }
}

/// Extract the commit counter from `...+COUNT.SHA`.
///
/// Takes the segment after the first `+`, then its first `.`-separated part.
fn commit_number(raw: &str) -> i64 {
    raw.split('+')
        .nth(1)
        .and_then(|build| build.split('.').next())
        .and_then(|count| count.parse::<i64>().ok())
        .unwrap_or(UNKNOWN_COMMIT)
}

/// Compare two version strings.
///
/// Returns [`Ordering::Equal`] when either side cannot be parsed; treat that
/// as "cannot determine", never as proof that the versions match.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    match (Version::parse(a), Version::parse(b)) {
        (Some(a), Some(b)) => a.cmp(&b),
        _ => Ordering::Equal,
    }
}

/// Whether `candidate` is strictly newer than `baseline`.
pub fn is_newer(candidate: &str, baseline: &str) -> bool {
    compare_versions(candidate, baseline) == Ordering::Greater
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cmp::Ordering::{Equal, Greater, Less};

    #[test]
    fn compare_table() {
        let cases = [
            ("v1.0.0+1.abc1234", "v1.0.0+1.abc1234", Equal),
            ("v1.0.0+1", "v1.0.0+2", Less),
            ("v1.0.0+2", "v1.0.0+1", Greater),
            ("v1.0.1+1", "v1.0.0+1", Greater),
            ("v1.0.0+1.sha1", "v1.0.0+2.sha2", Less),
            ("v1.0.1+1.x", "v1.0.0+999.y", Greater),
            ("v2.0.0+1.x", "v1.9.9+50.y", Greater),
            ("v1.10.0+1.x", "v1.9.0+1.x", Greater),
            ("v1.0.0+14.deadbee", "v1.0.0+14.cafe123", Equal),
            ("1.0.0+3.x", "v1.0.0+3.y", Equal),
        ];

        for (a, b, expected) in cases {
            assert_eq!(
                compare_versions(a, b),
                expected,
                "compare_versions({a}, {b})"
            );
        }
    }

    #[test]
    fn malformed_input_is_neutral() {
        assert_eq!(compare_versions("not-a-version", "v1.0.0+1.x"), Equal);
        assert_eq!(compare_versions("v1.0.0+1.x", "not-a-version"), Equal);
        assert_eq!(compare_versions("v1.0", "v2.0.0+1.x"), Equal);
        assert_eq!(compare_versions("v1.0.0-rc.1+1.x", "v0.1.0+1.x"), Equal);
        assert_eq!(compare_versions("", ""), Equal);
        assert!(!is_newer("latest", "v1.0.0+1.x"));
    }

    #[test]
    fn missing_build_metadata_is_oldest() {
        assert_eq!(compare_versions("v1.2.3", "v1.2.3"), Equal);
        assert_eq!(compare_versions("v1.2.3", "v1.2.3+0.abc"), Less);
        assert_eq!(compare_versions("v1.2.3+abc.def", "v1.2.3"), Equal);
        assert_eq!(compare_versions("v1.2.4", "v1.2.3+99.abc"), Greater);
    }

    #[test]
    fn commit_number_extraction() {
        assert_eq!(commit_number("v1.0.0+5.abc"), 5);
        assert_eq!(commit_number("v1.0.0+5"), 5);
        assert_eq!(commit_number("v1.0.0+10abc.x"), UNKNOWN_COMMIT);
        assert_eq!(commit_number("v1.0.0+.x"), UNKNOWN_COMMIT);
        assert_eq!(commit_number("v1.0.0"), UNKNOWN_COMMIT);
    }

    #[test]
    fn parse_strips_prefix_and_whitespace() {
        let v = Version::parse(" v3.2.0+14.deadbee ").unwrap();
        assert_eq!(
            v,
            Version {
                major: 3,
                minor: 2,
                patch: 0,
                commit: 14
            }
        );
        assert!(Version::parse("v99999999999999999999999.0.0").is_none());
    }

    #[test]
    fn reflexive_and_antisymmetric() {
        let samples = [
            "v0.0.1",
            "v1.0.0+1.a",
            "v1.0.0+2.b",
            "v1.0.1+1.c",
            "v1.1.0+3.x",
            "v2.0.0+5.abc",
            "v3.2.0+14.deadbee",
            "v3.2.0",
        ];

        for a in samples {
            assert_eq!(compare_versions(a, a), Equal, "{a} vs itself");
            for b in samples {
                assert_eq!(
                    compare_versions(a, b),
                    compare_versions(b, a).reverse(),
                    "{a} vs {b}"
                );
            }
        }
    }

    #[test]
    fn is_newer_is_strict() {
        assert!(is_newer("v1.1.0+3.x", "v1.0.0+1.x"));
        assert!(!is_newer("v1.0.0+1.x", "v1.0.0+1.y"));
        assert!(!is_newer("v1.0.0+1.x", "v1.1.0+3.x"));
    }
}
