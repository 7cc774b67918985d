//! Thin HTTP client for the resolver API.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use agenttrust_core::{Did, B256};
use agenttrust_reputation::{ReputationScore, RiskFlag, ScoreBreakdown, ScoreProof, Tier};

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// One credential entry in a trust profile or listing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialEntry {
    /// Attestation uid.
    pub uid: String,
    /// Schema the attestation was issued under.
    pub schema_id: String,
    /// Issuer address.
    pub issuer: String,
    /// Subject DID; omitted in identity-scoped listings.
    #[serde(default)]
    pub subject: Option<String>,
    /// Issuance timestamp (unix seconds).
    pub issued_at: i64,
    /// Expiry timestamp, if the credential expires.
    pub expires_at: Option<i64>,
    /// Whether the credential has been revoked.
    pub revoked: bool,
}

/// One delegation entry in a trust profile or listing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegationEntry {
    /// Delegation id.
    pub id: String,
    /// Owner DID; omitted in identity-scoped listings.
    #[serde(default)]
    pub owner: Option<String>,
    /// Agent address the authority is delegated to.
    pub agent: String,
    /// Capability bitmask as a decimal string.
    pub scope: String,
    /// Expiry timestamp, if the delegation expires.
    pub expires_at: Option<i64>,
    /// Whether the delegation has been revoked.
    pub revoked: bool,
}

/// A portable trust profile as served by the resolver.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrustProfile {
    /// Subject DID.
    pub did: Did,
    /// Controller address.
    pub controller: String,
    /// Composite reputation score in [0, 100].
    pub score: f64,
    /// Canonical tier for the score.
    pub tier: Tier,
    /// Per-strategy sub-scores.
    pub score_breakdown: ScoreBreakdown,
    /// Explanation of how the score came to be.
    pub human_readable_explanation: String,
    /// Credentials issued to the subject.
    pub credentials: Vec<CredentialEntry>,
    /// Delegations granted by the subject.
    pub delegation_chain: Vec<DelegationEntry>,
    /// Risk flags raised during scoring.
    pub risk_flags: Vec<RiskFlag>,
    /// Root the embedded score proof folds to.
    pub merkle_root: B256,
    /// Sibling path of the embedded score proof.
    pub proof: Vec<B256>,
    /// When the score was computed (unix seconds).
    pub computed_at: i64,
    /// Profile format version.
    pub version: String,
}

impl TrustProfile {
    /// Reassemble the embedded score proof for offline verification.
    pub fn score_proof(&self) -> ScoreProof {
        ScoreProof {
            subject: self.did.address_hex(),
            score: self.score,
            merkle_root: self.merkle_root,
            proof: self.proof.clone(),
            timestamp: self.computed_at,
        }
    }
}

/// Resolver verdict for a submitted score proof.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyOutcome {
    /// Whether the proof folds to its claimed root.
    pub valid: bool,
    /// Subject the proof covers.
    pub subject: String,
    /// Score the proof covers.
    pub score: f64,
    /// Timestamp the proof covers.
    pub timestamp: i64,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorInfo,
}

#[derive(Debug, Deserialize)]
struct ErrorInfo {
    code: String,
    message: String,
}

/// HTTP client for the AgentTrust resolver API.
///
/// Subjects passed to the lookup methods may be full `did:agent` strings or
/// bare 0x addresses; the resolver accepts both.
#[derive(Debug, Clone)]
pub struct ResolverClient {
    http: reqwest::Client,
    base_url: String,
}

impl ResolverClient {
    /// Create a client for a resolver at `base_url`, e.g. `http://localhost:8080`.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Create a client with an explicit per-request timeout.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("agenttrust-sdk/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        let base_url = base_url.into();
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch the portable trust profile for a subject.
    pub async fn get_trust_profile(&self, subject: &str) -> Result<TrustProfile> {
        let url = format!("{}/identity/{}/trust-profile", self.base_url, subject);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("GET {} failed", url))?;
        decode_response(response).await
    }

    /// Fetch the reputation score, with its proof, for a subject.
    pub async fn get_reputation(&self, subject: &str) -> Result<ReputationScore> {
        let url = format!("{}/reputation/{}", self.base_url, subject);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("GET {} failed", url))?;
        decode_response(response).await
    }

    /// Submit a score proof for server-side verification.
    ///
    /// [`verify_score_proof`](crate::verify_score_proof) performs the same
    /// check offline.
    pub async fn verify_proof(&self, proof: &ScoreProof) -> Result<VerifyOutcome> {
        let url = format!("{}/reputation/verify", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(proof)
            .send()
            .await
            .with_context(|| format!("POST {} failed", url))?;
        decode_response(response).await
    }
}

async fn decode_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return response
            .json()
            .await
            .context("Failed to decode response body");
    }

    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(envelope) => bail!(
            "Resolver returned {} ({}): {}",
            status,
            envelope.error.code,
            envelope.error.message
        ),
        Err(_) => bail!("Resolver returned {}: {}", status, body),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agenttrust_reputation::{generate_score_proof, verify_score_proof};

    const SUBJECT: &str = "0x4242424242424242424242424242424242424242";

    #[test]
    fn trust_profile_decodes_and_reassembles_its_proof() {
        let generated = generate_score_proof(SUBJECT, 32.6, 1_700_000_000);
        let payload = serde_json::json!({
            "did": format!("did:agent:84532:{}", "42".repeat(20)),
            "controller": "0x1111111111111111111111111111111111111111",
            "score": 32.6,
            "tier": "bronze",
            "scoreBreakdown": {
                "attestationScore": 45.0,
                "delegationScore": 14.0,
                "activityScore": 53.5,
                "penaltyScore": 0.0
            },
            "humanReadableExplanation": "Moderate trust based on 2 credentials.",
            "credentials": [{
                "uid": format!("0x{}", "21".repeat(32)),
                "schemaId": format!("0x{}", "10".repeat(32)),
                "issuer": "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa",
                "issuedAt": 1_699_000_000i64,
                "expiresAt": null,
                "revoked": false
            }],
            "delegationChain": [{
                "id": format!("0x{}", "31".repeat(32)),
                "agent": "0x3333333333333333333333333333333333333333",
                "scope": "5",
                "expiresAt": null,
                "revoked": false
            }],
            "riskFlags": [],
            "merkleRoot": generated.merkle_root,
            "proof": [],
            "computedAt": 1_700_000_000i64,
            "version": "1.0"
        });

        let profile: TrustProfile = serde_json::from_value(payload).unwrap();
        assert_eq!(profile.did.chain_id, 84532);
        assert_eq!(profile.tier, Tier::Bronze);
        assert_eq!(profile.credentials.len(), 1);
        assert_eq!(profile.credentials[0].subject, None);
        assert_eq!(profile.delegation_chain[0].scope, "5");
        assert_eq!(profile.version, "1.0");

        let proof = profile.score_proof();
        assert_eq!(proof.subject, SUBJECT);
        assert!(verify_score_proof(&proof));
    }

    #[test]
    fn listing_entries_carry_global_fields() {
        let payload = serde_json::json!({
            "uid": format!("0x{}", "21".repeat(32)),
            "schemaId": format!("0x{}", "10".repeat(32)),
            "issuer": "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa",
            "subject": format!("did:agent:84532:{}", "42".repeat(20)),
            "issuedAt": 1_699_000_000i64,
            "expiresAt": 1_800_000_000i64,
            "revoked": true
        });

        let entry: CredentialEntry = serde_json::from_value(payload).unwrap();
        assert!(entry.subject.is_some());
        assert_eq!(entry.expires_at, Some(1_800_000_000));
        assert!(entry.revoked);
    }

    #[test]
    fn verify_outcome_decodes() {
        let payload = serde_json::json!({
            "valid": true,
            "subject": SUBJECT,
            "score": 45.0,
            "timestamp": 1_700_000_000i64
        });

        let outcome: VerifyOutcome = serde_json::from_value(payload).unwrap();
        assert!(outcome.valid);
        assert_eq!(outcome.subject, SUBJECT);
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = ResolverClient::new("http://localhost:8080/").unwrap();
        assert_eq!(client.base_url, "http://localhost:8080");
    }
}
