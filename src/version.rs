//! @ai:module:intent Parse and compare API version tokens and version constraints
//! @ai:module:layer domain
//! @ai:module:public_api VersionNumber, Version
//! @ai:module:stateless true

use crate::error::VersionError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Bound;
use std::str::FromStr;

/// @ai:intent A dotted numeric version such as `1.1.3`
/// @ai:invariant components compare numerically with zero padding, so `1.2 == 1.2.0`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionNumber {
    parts: Vec<u64>,
    raw: String,
}

impl VersionNumber {
    /// @ai:intent Parse a dotted numeric token
    /// @ai:example ("1.2") -> Ok([1, 2])
    /// @ai:example ("1.x") -> Err(UnrecognizedSchema)
    /// @ai:effects pure
    pub fn parse(token: &str) -> Result<Self, VersionError> {
        let token = token.trim();
        let parts = token
            .split('.')
            .map(|part| {
                if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                part.parse::<u64>().ok()
            })
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| VersionError::UnrecognizedSchema(token.to_string()))?;

        Ok(Self {
            parts,
            raw: token.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn parts(&self) -> &[u64] {
        &self.parts
    }

    fn significant(&self) -> &[u64] {
        let len = self
            .parts
            .iter()
            .rposition(|p| *p != 0)
            .map(|i| i + 1)
            .unwrap_or(0);
        &self.parts[..len]
    }

    /// @ai:intent Smallest version above every version sharing the first `keep` components
    fn bumped(&self, keep: usize) -> VersionNumber {
        let keep = keep.clamp(1, self.parts.len());
        let mut parts = self.parts[..keep].to_vec();
        if let Some(last) = parts.last_mut() {
            *last += 1;
        }
        let raw = parts
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(".");
        VersionNumber { parts, raw }
    }
}

impl PartialEq for VersionNumber {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for VersionNumber {}

impl Hash for VersionNumber {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.significant().hash(state);
    }
}

impl PartialOrd for VersionNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VersionNumber {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.parts.len().max(other.parts.len());
        for i in 0..len {
            let a = self.parts.get(i).copied().unwrap_or(0);
            let b = other.parts.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }
        Ordering::Equal
    }
}

impl fmt::Display for VersionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for VersionNumber {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for VersionNumber {
    type Error = VersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<VersionNumber> for String {
    fn from(value: VersionNumber) -> Self {
        value.raw
    }
}

/// @ai:intent A version constraint: one absolute version or a range of versions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Version {
    Absolute(VersionNumber),
    Range {
        start: Bound<VersionNumber>,
        end: Bound<VersionNumber>,
        raw: String,
    },
}

impl Version {
    /// @ai:intent Parse a version constraint
    /// @ai:example ("1.2") -> Absolute
    /// @ai:example ("1.1 -") -> Range [1.1, ∞)
    /// @ai:example ("1.1 - 1.3") -> Range [1.1, 1.3]
    /// @ai:example ("~1.2") -> Range [1.2, 2)
    /// @ai:effects pure
    pub fn parse(token: &str) -> Result<Self, VersionError> {
        let token = token.trim();
        let raw = token.to_string();
        let range = |start, end| Version::Range {
            start,
            end,
            raw: raw.clone(),
        };

        if let Some(rest) = token.strip_prefix(">=") {
            return Ok(range(Bound::Included(VersionNumber::parse(rest)?), Bound::Unbounded));
        }
        if let Some(rest) = token.strip_prefix("<=") {
            return Ok(range(Bound::Unbounded, Bound::Included(VersionNumber::parse(rest)?)));
        }
        if let Some(rest) = token.strip_prefix('>') {
            return Ok(range(Bound::Excluded(VersionNumber::parse(rest)?), Bound::Unbounded));
        }
        if let Some(rest) = token.strip_prefix('<') {
            return Ok(range(Bound::Unbounded, Bound::Excluded(VersionNumber::parse(rest)?)));
        }
        if let Some(rest) = token.strip_prefix('~') {
            let start = VersionNumber::parse(rest)?;
            let end = start.bumped(start.parts.len().saturating_sub(1));
            return Ok(range(Bound::Included(start), Bound::Excluded(end)));
        }
        if let Some(rest) = token.strip_prefix('^') {
            let start = VersionNumber::parse(rest)?;
            let keep = start
                .parts
                .iter()
                .position(|p| *p != 0)
                .map(|i| i + 1)
                .unwrap_or(start.parts.len());
            let end = start.bumped(keep);
            return Ok(range(Bound::Included(start), Bound::Excluded(end)));
        }

        if let Some((from, to)) = token.split_once('-') {
            let start = VersionNumber::parse(from)?;
            let to = to.trim();
            if to.is_empty() {
                return Ok(range(Bound::Included(start), Bound::Unbounded));
            }

            let end = VersionNumber::parse(to)?;
            if end < start {
                return Err(VersionError::InvertedRange(raw.clone()));
            }
            return Ok(range(Bound::Included(start), Bound::Included(end)));
        }

        Ok(Version::Absolute(VersionNumber::parse(token)?))
    }

    /// @ai:intent Parse a token that must be a single absolute version
    /// @ai:post ranges are rejected with AbsoluteVersionRequired
    /// @ai:effects pure
    pub fn parse_absolute(token: &str) -> Result<VersionNumber, VersionError> {
        match Self::parse(token)? {
            Version::Absolute(number) => Ok(number),
            Version::Range { raw, .. } => Err(VersionError::AbsoluteVersionRequired(raw)),
        }
    }

    pub fn is_range(&self) -> bool {
        matches!(self, Version::Range { .. })
    }

    /// @ai:intent Check whether a concrete version falls within this constraint
    /// @ai:effects pure
    pub fn satisfies(&self, target: &VersionNumber) -> bool {
        match self {
            Version::Absolute(number) => number == target,
            Version::Range { start, end, .. } => {
                let above = match start {
                    Bound::Included(v) => target >= v,
                    Bound::Excluded(v) => target > v,
                    Bound::Unbounded => true,
                };
                let below = match end {
                    Bound::Included(v) => target <= v,
                    Bound::Excluded(v) => target < v,
                    Bound::Unbounded => true,
                };
                above && below
            }
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Version::Absolute(number) => number.as_str(),
            Version::Range { raw, .. } => raw,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Version {
    type Error = VersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Version> for String {
    fn from(value: Version) -> Self {
        value.as_str().to_string()
    }
}
