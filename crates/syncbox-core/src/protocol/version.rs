//! Firmware version parsing and compatibility

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Semantic firmware version as reported in the boot greeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    /// Major component.
    pub major: u16,
    /// Minor component.
    pub minor: u16,
    /// Patch component; never part of the compatibility check.
    pub patch: u16,
}

impl Version {
    /// The version this driver was built as. Firmware and driver are
    /// versioned in lockstep, so this is also the expected firmware version.
    pub fn driver() -> Self {
        // The per-component env vars are guaranteed numeric by cargo.
        Self {
            major: env!("CARGO_PKG_VERSION_MAJOR").parse().unwrap_or(0),
            minor: env!("CARGO_PKG_VERSION_MINOR").parse().unwrap_or(0),
            patch: env!("CARGO_PKG_VERSION_PATCH").parse().unwrap_or(0),
        }
    }

    /// Compatibility check: major and minor must match, patch is ignored.
    pub fn is_compatible(&self, other: Version) -> bool {
        self.major == other.major && self.minor == other.minor
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Error returned when a version string is not `major.minor.patch`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseVersionError;

impl FromStr for Version {
    type Err = ParseVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().split('.');
        let mut next = || {
            parts
                .next()
                .and_then(|p| p.parse::<u16>().ok())
                .ok_or(ParseVersionError)
        };
        let version = Version {
            major: next()?,
            minor: next()?,
            patch: next()?,
        };
        if parts.next().is_some() {
            return Err(ParseVersionError);
        }
        Ok(version)
    }
}
