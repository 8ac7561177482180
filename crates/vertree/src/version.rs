//! Semantic version strings as used by release snapshots.
//!
//! Two shapes occur in practice:
//! - stable releases, e.g. `0.66.0`
//! - nightly builds, e.g. `0.0.0-abc1234-20210101`, where the first
//!   pre-release component is an abbreviated commit id
//!
//! A nightly build sorts strictly below the `0.0.0` baseline once
//! pre-release ordering is taken into account, which is how the two are
//! told apart.

use crate::error::{RepoError, RepoResult};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A parsed semantic version.
///
/// Malformed input is rejected at parse time; the rest of the engine only
/// ever sees valid versions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    /// Full pre-release string after the first `-`, if any.
    pub pre: Option<String>,
}

impl Version {
    /// A bare `major.minor.patch` version.
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            pre: None,
        }
    }

    /// Parse a version string strictly.
    ///
    /// Accepts `major.minor.patch` with an optional pre-release suffix and
    /// an optional build-metadata suffix. Build metadata is validated and
    /// then discarded: semver excludes it from precedence, and the git refs
    /// these versions name never carry it.
    pub fn parse(input: &str) -> RepoResult<Self> {
        let invalid = |reason: &str| RepoError::InvalidVersion {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let (version, build) = match input.split_once('+') {
            Some((version, build)) => (version, Some(build)),
            None => (input, None),
        };
        if let Some(build) = build {
            for ident in build.split('.') {
                if ident.is_empty() {
                    return Err(invalid("empty build-metadata identifier"));
                }
                if !ident
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || b == b'-')
                {
                    return Err(invalid("invalid character in build metadata"));
                }
            }
        }

        let (core, pre) = match version.split_once('-') {
            Some((core, pre)) => (core, Some(pre)),
            None => (version, None),
        };

        let mut numbers = [0u64; 3];
        let parts: Vec<&str> = core.split('.').collect();
        if parts.len() != 3 {
            return Err(invalid("expected three dot-separated numeric components"));
        }
        for (slot, part) in numbers.iter_mut().zip(&parts) {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid("version components must be decimal numbers"));
            }
            if part.len() > 1 && part.starts_with('0') {
                return Err(invalid("version components must not have leading zeros"));
            }
            *slot = part
                .parse()
                .map_err(|_| invalid("version component out of range"))?;
        }

        if let Some(pre) = pre {
            for ident in pre.split('.') {
                if ident.is_empty() {
                    return Err(invalid("empty pre-release identifier"));
                }
                if !ident
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || b == b'-')
                {
                    return Err(invalid("invalid character in pre-release identifier"));
                }
                if ident.len() > 1
                    && ident.starts_with('0')
                    && ident.bytes().all(|b| b.is_ascii_digit())
                {
                    return Err(invalid("numeric pre-release identifiers must not have leading zeros"));
                }
            }
        }

        Ok(Self {
            major: numbers[0],
            minor: numbers[1],
            patch: numbers[2],
            pre: pre.map(str::to_string),
        })
    }

    /// Whether this is a nightly build.
    ///
    /// Nightlies are published as pre-releases of the `0.0.0` baseline, so
    /// they are exactly the versions sorting strictly below it.
    pub fn is_nightly(&self) -> bool {
        *self < Self::new(0, 0, 0)
    }

    /// The abbreviated commit id embedded in a nightly version.
    ///
    /// This is the first `-`-separated component of the pre-release string
    /// (`0.0.0-abc1234-20210101` -> `abc1234`). `None` for non-nightlies.
    pub fn nightly_short_hash(&self) -> Option<&str> {
        if !self.is_nightly() {
            return None;
        }
        self.pre
            .as_deref()
            .and_then(|pre| pre.split('-').next())
            .filter(|s| !s.is_empty())
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(ref pre) = self.pre {
            write!(f, "-{pre}")?;
        }
        Ok(())
    }
}

impl FromStr for Version {
    type Err = RepoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.major, self.minor, self.patch).cmp(&(other.major, other.minor, other.patch)) {
            Ordering::Equal => {}
            ord => return ord,
        }
        match (&self.pre, &other.pre) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(a), Some(b)) => cmp_pre(a, b),
        }
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Semver pre-release precedence: dot-separated identifiers, numeric ones
/// compared as numbers and ordered before alphanumeric ones, fewer
/// identifiers ordering first on a tie.
fn cmp_pre(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = match (x.parse::<u64>(), y.parse::<u64>()) {
                    (Ok(nx), Ok(ny)) => nx.cmp(&ny),
                    (Ok(_), Err(_)) => Ordering::Less,
                    (Err(_), Ok(_)) => Ordering::Greater,
                    (Err(_), Err(_)) => x.cmp(y),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_stable() {
        let v = Version::parse("0.66.0").unwrap();
        assert_eq!((v.major, v.minor, v.patch), (0, 66, 0));
        assert!(v.pre.is_none());
        assert!(!v.is_nightly());
    }

    #[test]
    fn parses_nightly_form() {
        let v = Version::parse("0.0.0-abc1234-20210101").unwrap();
        assert!(v.is_nightly());
        assert_eq!(v.nightly_short_hash(), Some("abc1234"));
    }

    #[test]
    fn prerelease_of_nonzero_version_is_not_nightly() {
        let v = Version::parse("1.0.0-beta.1").unwrap();
        assert!(!v.is_nightly());
        assert_eq!(v.nightly_short_hash(), None);
    }

    #[test]
    fn rejects_malformed_input() {
        for bad in [
            "",
            "1.2",
            "1.2.3.4",
            "v1.2.3",
            "1.2.3+",
            "1.2.3+a..b",
            "1.2.3+a_b",
            "01.2.3",
            "1.2.x",
            "1.2.3-",
            "1.2.3-a..b",
            "1.2.3-a_b",
        ] {
            let err = Version::parse(bad).unwrap_err();
            assert!(
                matches!(err, RepoError::InvalidVersion { .. }),
                "expected rejection of {bad:?}"
            );
        }
    }

    #[test]
    fn build_metadata_is_accepted_and_ignored() {
        let v = Version::parse("0.66.0+build.5").unwrap();
        assert_eq!(v, Version::parse("0.66.0").unwrap());
        assert_eq!(v.to_string(), "0.66.0");
        assert!(!v.is_nightly());

        let pre = Version::parse("1.2.3-rc.1+sha-abc").unwrap();
        assert_eq!(pre, Version::parse("1.2.3-rc.1").unwrap());
        assert_eq!(pre.to_string(), "1.2.3-rc.1");
    }

    #[test]
    fn display_round_trips() {
        for s in ["0.66.0", "0.0.0-abc1234-20210101", "1.2.3-rc.1"] {
            assert_eq!(Version::parse(s).unwrap().to_string(), s);
        }
    }

    #[test]
    fn prereleases_sort_below_their_release() {
        let nightly = Version::parse("0.0.0-abc1234-20210101").unwrap();
        let baseline = Version::new(0, 0, 0);
        let stable = Version::parse("0.66.0").unwrap();
        assert!(nightly < baseline);
        assert!(baseline < stable);
    }

    #[test]
    fn prerelease_identifier_precedence() {
        let a = Version::parse("1.0.0-alpha").unwrap();
        let b = Version::parse("1.0.0-alpha.1").unwrap();
        let c = Version::parse("1.0.0-alpha.beta").unwrap();
        let d = Version::parse("1.0.0-beta.2").unwrap();
        let e = Version::parse("1.0.0-beta.11").unwrap();
        assert!(a < b);
        assert!(b < c);
        assert!(c < d);
        assert!(d < e);
    }
}
