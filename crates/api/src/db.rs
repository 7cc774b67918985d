//! Read-side query helpers for the AgentTrust resolver API.
//!
//! All identifier columns hold lowercase 0x-prefixed hex TEXT, exactly as
//! the indexer wrote them; timestamps are unix seconds. Optional filters
//! compile to `(?N IS NULL OR col = ?N)` so one statement serves both the
//! filtered and unfiltered listings.

use sqlx::SqlitePool;

/// Identity row mirrored from the DID registry.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DbDid {
    /// Identity address (lowercase 0x-hex).
    pub id: String,
    /// Current controller address.
    pub controller: String,
    /// CID of the identity metadata document.
    pub metadata_cid: String,
    /// Whether the identity is active.
    pub active: bool,
    /// Unix timestamp of the last registry update.
    pub updated_at: i64,
}

/// Schema definition row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DbSchema {
    /// Schema id (lowercase 0x-hex bytes32).
    pub id: String,
    /// Creator address.
    pub creator: String,
    /// Human-readable schema name.
    pub name: String,
    /// Schema version string.
    pub version: String,
    /// CID of the schema document.
    pub schema_cid: String,
    /// Unix timestamp of first ingestion.
    pub created_at: i64,
    /// Whether the schema is active.
    pub active: bool,
}

/// Attestation row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DbAttestation {
    /// Attestation uid (lowercase 0x-hex bytes32).
    pub uid: String,
    /// Schema the attestation conforms to.
    pub schema_id: String,
    /// Issuer address.
    pub issuer: String,
    /// Subject address.
    pub subject: String,
    /// Issuance time, unix seconds.
    pub issued_at: i64,
    /// Expiry time, unix seconds. NULL means no expiry.
    pub expires_at: Option<i64>,
    /// Whether a revocation has been observed for this uid.
    pub revoked: bool,
}

/// Delegation row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DbDelegation {
    /// Delegation id (lowercase 0x-hex bytes32).
    pub id: String,
    /// Granting identity address.
    pub owner: String,
    /// Receiving agent address.
    pub agent: String,
    /// Capability bitmask as a decimal string.
    pub scope: String,
    /// Expiry time, unix seconds. NULL means no expiry.
    pub expires_at: Option<i64>,
    /// Creation time, unix seconds.
    pub created_at: i64,
    /// Whether a revocation has been observed for this id.
    pub revoked: bool,
}

/// Fetch one identity by address key.
pub async fn get_did(pool: &SqlitePool, id: &str) -> anyhow::Result<Option<DbDid>> {
    let row = sqlx::query_as::<_, DbDid>(
        r#"
        SELECT id, controller, metadata_cid, active, updated_at
        FROM dids
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// List all indexed identities, most recently updated first.
pub async fn list_dids(pool: &SqlitePool) -> anyhow::Result<Vec<DbDid>> {
    let rows = sqlx::query_as::<_, DbDid>(
        r#"
        SELECT id, controller, metadata_cid, active, updated_at
        FROM dids
        ORDER BY updated_at DESC, id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Fetch one schema by id.
pub async fn get_schema(pool: &SqlitePool, id: &str) -> anyhow::Result<Option<DbSchema>> {
    let row = sqlx::query_as::<_, DbSchema>(
        r#"
        SELECT id, creator, name, version, schema_cid, created_at, active
        FROM schemas
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// List schemas, optionally restricted to one creator.
pub async fn list_schemas(
    pool: &SqlitePool,
    creator: Option<&str>,
) -> anyhow::Result<Vec<DbSchema>> {
    let rows = sqlx::query_as::<_, DbSchema>(
        r#"
        SELECT id, creator, name, version, schema_cid, created_at, active
        FROM schemas
        WHERE (?1 IS NULL OR creator = ?1)
        ORDER BY created_at DESC, id
        "#,
    )
    .bind(creator)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// List attestations, optionally restricted by subject and/or issuer.
pub async fn list_attestations(
    pool: &SqlitePool,
    subject: Option<&str>,
    issuer: Option<&str>,
) -> anyhow::Result<Vec<DbAttestation>> {
    let rows = sqlx::query_as::<_, DbAttestation>(
        r#"
        SELECT uid, schema_id, issuer, subject, issued_at, expires_at, revoked
        FROM attestations
        WHERE (?1 IS NULL OR subject = ?1)
          AND (?2 IS NULL OR issuer = ?2)
        ORDER BY issued_at DESC, uid
        "#,
    )
    .bind(subject)
    .bind(issuer)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// List delegations, optionally restricted by owner and/or agent.
pub async fn list_delegations(
    pool: &SqlitePool,
    owner: Option<&str>,
    agent: Option<&str>,
) -> anyhow::Result<Vec<DbDelegation>> {
    let rows = sqlx::query_as::<_, DbDelegation>(
        r#"
        SELECT id, owner, agent, scope, expires_at, created_at, revoked
        FROM delegations
        WHERE (?1 IS NULL OR owner = ?1)
          AND (?2 IS NULL OR agent = ?2)
        ORDER BY created_at DESC, id
        "#,
    )
    .bind(owner)
    .bind(agent)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
