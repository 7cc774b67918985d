//! The historical 0-1000 tier ladder.

use std::fmt;

/// Trust tier on the legacy 0-1000 score scale.
///
/// Early integrations consumed scores on a 0-1000 scale with the breakpoints
/// below. The engine's 0-100 ladder ([`Tier`](crate::Tier)) is authoritative,
/// and the two disagree near boundaries: a canonical 82 is platinum while its
/// legacy view 820 is still gold. Use this only to reconcile stored legacy
/// tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LegacyTier {
    /// Legacy score below 100.
    Unknown,
    /// Legacy score in [100, 300).
    Bronze,
    /// Legacy score in [300, 600).
    Silver,
    /// Legacy score in [600, 850).
    Gold,
    /// Legacy score of 850 or above.
    Platinum,
}

impl LegacyTier {
    /// Map a raw legacy score (0-1000) onto the ladder.
    pub fn from_raw(score: u32) -> Self {
        match score {
            0..=99 => LegacyTier::Unknown,
            100..=299 => LegacyTier::Bronze,
            300..=599 => LegacyTier::Silver,
            600..=849 => LegacyTier::Gold,
            _ => LegacyTier::Platinum,
        }
    }

    /// Legacy view of a canonical 0-100 score: scaled by ten, truncated.
    pub fn from_canonical(score: f64) -> Self {
        Self::from_raw((score.clamp(0.0, 100.0) * 10.0) as u32)
    }

    /// Canonical lowercase string form.
    pub const fn as_str(&self) -> &'static str {
        match self {
            LegacyTier::Unknown => "unknown",
            LegacyTier::Bronze => "bronze",
            LegacyTier::Silver => "silver",
            LegacyTier::Gold => "gold",
            LegacyTier::Platinum => "platinum",
        }
    }
}

impl fmt::Display for LegacyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
