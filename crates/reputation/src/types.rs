//! Data types for reputation scoring.
//!
//! Wire-visible types serialize with camelCase field names; enum values use
//! the lowercase / snake_case forms clients already consume.

use agenttrust_core::DelegationScope;
use alloy_primitives::B256;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One stored attestation about a subject, as the scoring engine sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestationRecord {
    /// Attestation uid (lowercase 0x-hex).
    pub uid: String,
    /// Schema the attestation conforms to (lowercase 0x-hex).
    pub schema_id: String,
    /// Issuer address (lowercase 0x-hex).
    pub issuer: String,
    /// Subject address (lowercase 0x-hex).
    pub subject: String,
    /// Issuance time, epoch seconds.
    pub issued_at: i64,
    /// Expiry time, epoch seconds. `None` means no expiry.
    pub expires_at: Option<i64>,
    /// Whether a revocation event has been observed for this uid.
    pub revoked: bool,
}

impl AttestationRecord {
    /// Non-revoked and not past its expiry at `now`.
    pub fn is_valid(&self, now: i64) -> bool {
        !self.revoked && self.expires_at.map_or(true, |exp| exp > now)
    }

    /// Carries an expiry that has already passed at `now`.
    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_at.is_some_and(|exp| exp < now)
    }
}

/// One stored delegation granted by an owner, as the scoring engine sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegationRecord {
    /// Delegation id (lowercase 0x-hex).
    pub id: String,
    /// Granting identity (lowercase 0x-hex).
    pub owner: String,
    /// Receiving agent (lowercase 0x-hex).
    pub agent: String,
    /// Capability bitmask.
    pub scope: DelegationScope,
    /// Expiry time, epoch seconds. `None` means no expiry.
    pub expires_at: Option<i64>,
    /// First-seen time, epoch seconds.
    pub created_at: i64,
    /// Whether a revocation event has been observed for this id.
    pub revoked: bool,
}

impl DelegationRecord {
    /// Non-revoked and not past its expiry at `now`.
    pub fn is_active(&self, now: i64) -> bool {
        !self.revoked && self.expires_at.map_or(true, |exp| exp > now)
    }
}

/// Everything the strategies need to score one subject.
#[derive(Debug, Clone, Default)]
pub struct ReputationData {
    /// All attestations where this subject is the subject.
    pub attestations: Vec<AttestationRecord>,
    /// All delegations where this subject is the owner.
    pub delegations: Vec<DelegationRecord>,
    /// Latest of any attestation issuance or delegation creation, epoch
    /// seconds. 0 when the subject has no records.
    pub last_activity_at: i64,
    /// Total record count across both sets.
    pub total_transactions: u64,
}

/// Per-dimension sub-scores, each in [0, 100].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    /// Attestation strategy output.
    pub attestation_score: f64,
    /// Delegation strategy output.
    pub delegation_score: f64,
    /// Activity strategy output.
    pub activity_score: f64,
    /// Engine-computed penalty, in [0, 30].
    pub penalty_score: f64,
}

/// Coarse reputation bucket derived from the 0-100 score.
///
/// Variants are ordered from weakest to strongest so tiers compare with `<`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Score below 20.
    Unknown,
    /// Score in [20, 40).
    Bronze,
    /// Score in [40, 60).
    Silver,
    /// Score in [60, 80).
    Gold,
    /// Score of 80 or above.
    Platinum,
}

impl Tier {
    /// Map a composite score onto the tier ladder.
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            Tier::Platinum
        } else if score >= 60.0 {
            Tier::Gold
        } else if score >= 40.0 {
            Tier::Silver
        } else if score >= 20.0 {
            Tier::Bronze
        } else {
            Tier::Unknown
        }
    }

    /// Canonical lowercase string form.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Tier::Unknown => "unknown",
            Tier::Bronze => "bronze",
            Tier::Silver => "silver",
            Tier::Gold => "gold",
            Tier::Platinum => "platinum",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of condition a risk flag reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskKind {
    /// The subject holds attestations past their expiry.
    ExpiredCredentials,
    /// More than 10% of the subject's attestations are revoked.
    HighRevocationRate,
    /// No attestation or delegation activity in the last 30 days.
    ///
    /// Serialized as `recent_activity`, the name existing clients match on.
    #[serde(rename = "recent_activity")]
    StaleActivity,
    /// The composite score is below the minimum trusted threshold.
    UnverifiedIssuer,
}

/// Severity of a risk flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskSeverity {
    /// Informational.
    Low,
    /// Worth attention.
    Medium,
    /// Should block trust decisions.
    High,
}

/// An informational warning attached to a score, independent of its value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskFlag {
    /// What condition was detected.
    #[serde(rename = "type")]
    pub kind: RiskKind,
    /// How severe it is.
    pub severity: RiskSeverity,
    /// Human-readable description.
    pub description: String,
}

/// Merkle inclusion proof binding a subject to a score at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreProof {
    /// Subject address (lowercase 0x-hex) the score was computed for.
    pub subject: String,
    /// The computed score.
    pub score: f64,
    /// Root of the score tree.
    pub merkle_root: B256,
    /// Sibling path from the leaf to the root. Empty for a one-leaf tree.
    pub proof: Vec<B256>,
    /// Computation time, epoch seconds.
    pub timestamp: i64,
}

/// A computed reputation score with everything needed to present and verify it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReputationScore {
    /// Subject address (lowercase 0x-hex).
    pub subject: String,
    /// Weighted composite in [0, 100]. Not rounded.
    pub score: f64,
    /// Tier bucket for `score`.
    pub tier: Tier,
    /// Per-dimension sub-scores.
    pub score_breakdown: ScoreBreakdown,
    /// Plain-language summary of the tier and any high-severity warnings.
    pub human_readable_explanation: String,
    /// Informational warnings.
    pub risk_flags: Vec<RiskFlag>,
    /// Computation time, epoch seconds.
    pub computed_at: i64,
    /// Inclusion proof for this score.
    pub proof: ScoreProof,
}

/// Relationship kind carried by a trust graph edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Issuer attested about the subject.
    IssuedAttestation,
    /// Owner delegated a capability to an agent.
    DelegatedTo,
}

/// A directed edge in the subject's trust graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustEdge {
    /// Source address (lowercase 0x-hex).
    pub from: String,
    /// Target address (lowercase 0x-hex).
    pub to: String,
    /// Relationship kind.
    #[serde(rename = "type")]
    pub kind: EdgeKind,
    /// Signed edge weight. Issued attestations weigh +10 (-5 once revoked),
    /// delegations +8.
    pub weight: i32,
    /// Kind-specific context (uids, scopes, expiries).
    pub metadata: serde_json::Value,
}
