//! Classification outcome.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Final verdict for a site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rank {
    /// The site could not be evaluated.
    Unresolved,
    NotPhish,
    Suspicious,
    Phish,
}

impl Rank {
    /// Numeric code used by downstream tooling (-1 for unresolved).
    pub fn code(&self) -> i8 {
        match self {
            Self::Unresolved => -1,
            Self::NotPhish => 0,
            Self::Suspicious => 1,
            Self::Phish => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unresolved => "unresolved",
            Self::NotPhish => "not_phish",
            Self::Suspicious => "suspicious",
            Self::Phish => "phish",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "unresolved" => Some(Self::Unresolved),
            "not_phish" | "notphish" => Some(Self::NotPhish),
            "suspicious" => Some(Self::Suspicious),
            "phish" => Some(Self::Phish),
            _ => None,
        }
    }

    /// Human-readable description.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Unresolved => "unresolved",
            Self::NotPhish => "not phish",
            Self::Suspicious => "suspicious",
            Self::Phish => "phish",
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Rank plus the probable impersonation targets (`mld.ps` strings).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub rank: Rank,
    pub targets: BTreeSet<String>,
}

impl ClassificationResult {
    pub fn new(rank: Rank, targets: BTreeSet<String>) -> Self {
        Self { rank, targets }
    }

    pub fn unresolved() -> Self {
        Self::new(Rank::Unresolved, BTreeSet::new())
    }

    pub fn not_phish() -> Self {
        Self::new(Rank::NotPhish, BTreeSet::new())
    }

    pub fn suspicious(targets: BTreeSet<String>) -> Self {
        Self::new(Rank::Suspicious, targets)
    }

    pub fn phish(targets: BTreeSet<String>) -> Self {
        Self::new(Rank::Phish, targets)
    }
}

impl fmt::Display for ClassificationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let targets: Vec<&str> = self.targets.iter().map(String::as_str).collect();
        write!(
            f,
            "({}, {}, [{}])",
            self.rank.code(),
            self.rank.description(),
            targets.join(", ")
        )
    }
}
