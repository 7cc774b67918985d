//! The reputation engine: gathers a subject's records, scores them, and
//! produces a verifiable composite.

use alloy_primitives::Address;
use async_trait::async_trait;
use tracing::warn;

use agenttrust_core::address_hex;

use crate::cache::ScoreCache;
use crate::error::{ReputationError, Result};
use crate::proof::generate_score_proof;
use crate::strategy::{
    clamp, ActivityStrategy, AttestationStrategy, DelegationStrategy, Scorer,
};
use crate::types::{
    AttestationRecord, DelegationRecord, EdgeKind, ReputationData, ReputationScore, RiskFlag,
    RiskKind, RiskSeverity, ScoreBreakdown, Tier, TrustEdge,
};

const THIRTY_DAYS_SECS: i64 = 30 * 24 * 60 * 60;

// Composite weights. The penalty term is additive by contract; it caps at 30
// on its own.
const ATTESTATION_WEIGHT: f64 = 0.35;
const DELEGATION_WEIGHT: f64 = 0.25;
const ACTIVITY_WEIGHT: f64 = 0.25;
const PENALTY_WEIGHT: f64 = 0.15;

/// Read access to the indexed records the engine scores.
///
/// Subjects and owners are lowercase 0x-prefixed address strings, the
/// canonical storage key form.
#[async_trait]
pub trait ReputationStore: Send + Sync {
    /// All attestations where `subject` is the subject.
    async fn attestations_for_subject(
        &self,
        subject: &str,
    ) -> anyhow::Result<Vec<AttestationRecord>>;

    /// All delegations where `owner` is the granting identity.
    async fn delegations_for_owner(&self, owner: &str) -> anyhow::Result<Vec<DelegationRecord>>;
}

/// Computes composite reputation scores over a [`ReputationStore`].
pub struct ReputationEngine<S> {
    store: S,
    cache: ScoreCache,
    attestation: AttestationStrategy,
    delegation: DelegationStrategy,
    activity: ActivityStrategy,
}

impl<S: ReputationStore> ReputationEngine<S> {
    /// Create an engine over `store`, memoizing results in `cache`.
    pub fn new(store: S, cache: ScoreCache) -> Self {
        ReputationEngine {
            store,
            cache,
            attestation: AttestationStrategy,
            delegation: DelegationStrategy,
            activity: ActivityStrategy,
        }
    }

    /// Compute (or return the cached) reputation score for `subject`.
    ///
    /// Store failures propagate; they are never served as a zero score.
    pub async fn compute_score(&self, subject: Address) -> Result<ReputationScore> {
        if let Some(cached) = self.cache.get(&subject).await {
            return Ok(cached);
        }

        let subject_hex = address_hex(&subject);
        let now = chrono::Utc::now().timestamp();

        let data = self.gather(&subject_hex).await?;
        let score_breakdown = self.compute_breakdown(&data, now);
        let score = clamp(
            score_breakdown.attestation_score * ATTESTATION_WEIGHT
                + score_breakdown.delegation_score * DELEGATION_WEIGHT
                + score_breakdown.activity_score * ACTIVITY_WEIGHT
                + score_breakdown.penalty_score * PENALTY_WEIGHT,
            0.0,
            100.0,
        );
        let tier = Tier::from_score(score);
        let risk_flags = Self::assess_risks(&data, score, now);
        let proof = generate_score_proof(&subject_hex, score, now);

        let result = ReputationScore {
            subject: subject_hex,
            score,
            tier,
            score_breakdown,
            human_readable_explanation: Self::explanation(score, tier, &risk_flags),
            risk_flags,
            computed_at: now,
            proof,
        };

        self.cache.insert(subject, result.clone()).await;
        Ok(result)
    }

    /// Build the directed trust graph around `subject`.
    ///
    /// Every attestation contributes an issuer-to-subject edge (negative
    /// weight once revoked); every non-revoked delegation contributes a
    /// subject-to-agent edge. Expiry is not checked here: an expired grant
    /// is still a historical relationship.
    pub async fn build_graph(&self, subject: Address) -> Result<Vec<TrustEdge>> {
        let subject_hex = address_hex(&subject);
        let data = self.gather(&subject_hex).await?;

        let mut edges = Vec::with_capacity(data.attestations.len() + data.delegations.len());

        for attestation in &data.attestations {
            edges.push(TrustEdge {
                from: attestation.issuer.clone(),
                to: subject_hex.clone(),
                kind: EdgeKind::IssuedAttestation,
                weight: if attestation.revoked { -5 } else { 10 },
                metadata: serde_json::json!({
                    "uid": attestation.uid,
                    "schemaId": attestation.schema_id,
                    "expiresAt": attestation.expires_at,
                }),
            });
        }

        for delegation in &data.delegations {
            if delegation.revoked {
                continue;
            }
            edges.push(TrustEdge {
                from: subject_hex.clone(),
                to: delegation.agent.clone(),
                kind: EdgeKind::DelegatedTo,
                weight: 8,
                metadata: serde_json::json!({
                    "delegationId": delegation.id,
                    "scope": delegation.scope.to_string(),
                    "expiresAt": delegation.expires_at,
                }),
            });
        }

        Ok(edges)
    }

    async fn gather(&self, subject_hex: &str) -> Result<ReputationData> {
        let (attestations, delegations) = tokio::try_join!(
            self.store.attestations_for_subject(subject_hex),
            self.store.delegations_for_owner(subject_hex),
        )
        .map_err(ReputationError::DataAccess)?;

        let last_attestation = attestations.iter().map(|a| a.issued_at).max().unwrap_or(0);
        let last_delegation = delegations.iter().map(|d| d.created_at).max().unwrap_or(0);

        Ok(ReputationData {
            last_activity_at: last_attestation.max(last_delegation),
            total_transactions: (attestations.len() + delegations.len()) as u64,
            attestations,
            delegations,
        })
    }

    fn compute_breakdown(&self, data: &ReputationData, now: i64) -> ScoreBreakdown {
        ScoreBreakdown {
            attestation_score: self.guarded(&self.attestation, data, now),
            delegation_score: self.guarded(&self.delegation, data, now),
            activity_score: self.guarded(&self.activity, data, now),
            penalty_score: Self::penalty(data, now),
        }
    }

    // A failing strategy costs the subject that dimension, nothing more.
    fn guarded(&self, scorer: &dyn Scorer, data: &ReputationData, now: i64) -> f64 {
        match scorer.compute(data, now) {
            Ok(score) => clamp(score, 0.0, 100.0),
            Err(error) => {
                warn!(
                    "Strategy '{}' failed, degrading to 0: {}",
                    scorer.name(),
                    error
                );
                0.0
            }
        }
    }

    fn penalty(data: &ReputationData, now: i64) -> f64 {
        if data.attestations.is_empty() {
            return 0.0;
        }
        let total = data.attestations.len() as f64;
        let mut penalty = 0.0;

        let revoked = data.attestations.iter().filter(|a| a.revoked).count();
        if revoked > 0 {
            penalty += revoked as f64 / total * 30.0;
        }

        let expired = data.attestations.iter().filter(|a| a.is_expired(now)).count();
        if expired > 0 {
            penalty += expired as f64 / total * 20.0;
        }

        penalty.min(30.0)
    }

    fn assess_risks(data: &ReputationData, score: f64, now: i64) -> Vec<RiskFlag> {
        let mut risks = Vec::new();
        let total = data.attestations.len();

        let expired = data.attestations.iter().filter(|a| a.is_expired(now)).count();
        if expired > 0 {
            let severity = if expired as f64 > total as f64 * 0.5 {
                RiskSeverity::High
            } else {
                RiskSeverity::Medium
            };
            risks.push(RiskFlag {
                kind: RiskKind::ExpiredCredentials,
                severity,
                description: format!("{} expired credentials detected", expired),
            });
        }

        let revoked = data.attestations.iter().filter(|a| a.revoked).count();
        let revocation_rate = revoked as f64 / total.max(1) as f64;
        if revocation_rate > 0.1 {
            let severity = if revocation_rate > 0.3 {
                RiskSeverity::High
            } else {
                RiskSeverity::Medium
            };
            risks.push(RiskFlag {
                kind: RiskKind::HighRevocationRate,
                severity,
                description: format!("Revocation rate: {:.1}%", revocation_rate * 100.0),
            });
        }

        if now - data.last_activity_at > THIRTY_DAYS_SECS {
            risks.push(RiskFlag {
                kind: RiskKind::StaleActivity,
                severity: RiskSeverity::Low,
                description: "No activity in the last 30 days".to_string(),
            });
        }

        if score < 20.0 {
            risks.push(RiskFlag {
                kind: RiskKind::UnverifiedIssuer,
                severity: RiskSeverity::High,
                description: "Identity has very low reputation score".to_string(),
            });
        }

        risks
    }

    fn explanation(score: f64, tier: Tier, risks: &[RiskFlag]) -> String {
        let mut explanation = format!("Trust tier: {}. ", tier);

        explanation.push_str(if score >= 80.0 {
            "This identity has excellent reputation backed by multiple verified credentials."
        } else if score >= 60.0 {
            "This identity has good reputation with solid credential base."
        } else if score >= 40.0 {
            "This identity has moderate reputation but could benefit from additional credentials."
        } else if score >= 20.0 {
            "This identity has emerging reputation but limited credential history."
        } else {
            "This identity has minimal reputation and unverified status."
        });

        let high: Vec<&str> = risks
            .iter()
            .filter(|r| r.severity == RiskSeverity::High)
            .map(|r| r.description.as_str())
            .collect();
        if !high.is_empty() {
            explanation.push_str(&format!(" Warning: {}.", high.join("; ")));
        }

        explanation
    }
}
