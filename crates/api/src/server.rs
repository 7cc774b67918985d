use anyhow::Context;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteConnectOptions, SqlitePool};
use std::{net::SocketAddr, str::FromStr, sync::Arc, time::Duration};
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use agenttrust_core::{bytes32_hex, Did, B256};
use agenttrust_reputation::{
    cache::DEFAULT_SCORE_TTL, verify_score_proof, ReputationEngine, ReputationScore, RiskFlag,
    ScoreBreakdown, ScoreCache, ScoreProof, Tier,
};

use crate::{db, store::SqliteReputationStore};

/// Version tag stamped on every trust profile response.
const TRUST_PROFILE_VERSION: &str = "1.0";

#[derive(Clone)]
struct AppState {
    db: SqlitePool,
    engine: Arc<ReputationEngine<SqliteReputationStore>>,
    chain_id: u64,
}

/// Runtime configuration for the AgentTrust API server.
#[derive(Debug, Clone)]
pub struct ApiRuntimeConfig {
    database_url: String,
    port: u16,
    chain_id: u64,
    cache_ttl: Duration,
}

impl ApiRuntimeConfig {
    /// Build runtime configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://agenttrust.db".to_string());
        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(8080);

        let chain_id = parse_env_u64("CHAIN_ID")?.unwrap_or(11155111);
        let cache_ttl = match parse_env_u64("REPUTATION_CACHE_TTL_SECS")? {
            Some(secs) => Duration::from_secs(secs),
            None => DEFAULT_SCORE_TTL,
        };

        Ok(Self {
            database_url,
            port,
            chain_id,
            cache_ttl,
        })
    }

    /// Build deterministic test configuration with a zero-TTL score cache.
    pub fn for_test(database_url: impl Into<String>, chain_id: u64) -> Self {
        Self {
            database_url: database_url.into(),
            port: 0,
            chain_id,
            cache_ttl: Duration::ZERO,
        }
    }
}

fn parse_env_u64(name: &str) -> anyhow::Result<Option<u64>> {
    let Ok(raw) = std::env::var(name) else {
        return Ok(None);
    };
    let raw = raw.trim();
    anyhow::ensure!(!raw.is_empty(), "{} is set but empty", name);
    let v: u64 = raw
        .parse()
        .with_context(|| format!("Invalid {} (expected u64)", name))?;
    Ok(Some(v))
}

// The API never writes; the indexer owns the database.
async fn build_state(config: &ApiRuntimeConfig) -> anyhow::Result<AppState> {
    let connect_options = SqliteConnectOptions::from_str(&config.database_url)?
        .read_only(true)
        .create_if_missing(false);
    let db = SqlitePool::connect_with(connect_options).await?;

    let store = SqliteReputationStore::new(db.clone());
    let engine = Arc::new(ReputationEngine::new(
        store,
        ScoreCache::new(config.cache_ttl),
    ));

    Ok(AppState {
        db,
        engine,
        chain_id: config.chain_id,
    })
}

fn router_for_state(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/identities", get(list_identities))
        .route("/identity/{did}", get(get_identity))
        .route("/identity/{did}/trust-profile", get(get_trust_profile))
        .route("/identity/{did}/credentials", get(get_identity_credentials))
        .route("/identity/{did}/delegations", get(get_identity_delegations))
        .route("/credentials", get(get_credentials))
        .route("/delegations", get(get_delegations))
        .route("/schema/{id}", get(get_schema))
        .route("/schemas", get(get_schemas))
        .route("/reputation/{subject}", get(get_reputation))
        .route("/reputation/verify", post(verify_reputation))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Build an in-process API router from explicit runtime config.
pub async fn build_app(config: &ApiRuntimeConfig) -> anyhow::Result<Router> {
    let state = build_state(config).await?;
    Ok(router_for_state(state))
}

/// Run the API server with explicit runtime configuration.
pub async fn run_with_config(config: ApiRuntimeConfig) -> anyhow::Result<()> {
    let state = build_state(&config).await?;
    let db_for_shutdown = state.db.clone();
    let app = router_for_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("API server listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    db_for_shutdown.close().await;
    info!("API server shutdown complete");
    Ok(())
}

/// Run the API server using environment-driven configuration.
pub async fn run_from_env() -> anyhow::Result<()> {
    run_with_config(ApiRuntimeConfig::from_env()?).await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", err);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!("Failed to install SIGTERM handler: {}", err);
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

const ERROR_CODE_INVALID_REQUEST: &str = "invalid_request";
const ERROR_CODE_NOT_FOUND: &str = "not_found";
const ERROR_CODE_INTERNAL_ERROR: &str = "internal_error";

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorInfo,
}

#[derive(Serialize)]
struct ErrorInfo {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

fn api_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            error: ErrorInfo {
                code,
                message: message.into(),
                details: None,
            },
        }),
    )
}

fn bad_request(msg: impl Into<String>) -> (StatusCode, Json<ErrorResponse>) {
    api_error(StatusCode::BAD_REQUEST, ERROR_CODE_INVALID_REQUEST, msg)
}

fn not_found(msg: impl Into<String>) -> (StatusCode, Json<ErrorResponse>) {
    api_error(StatusCode::NOT_FOUND, ERROR_CODE_NOT_FOUND, msg)
}

fn internal_error<E: std::fmt::Display>(err: E) -> (StatusCode, Json<ErrorResponse>) {
    api_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        ERROR_CODE_INTERNAL_ERROR,
        format!("Internal error: {}", err),
    )
}

/// Accepts either a `did:agent:...` string or a bare 0x address.
fn parse_subject_param(raw: &str, chain_id: u64) -> Result<Did, (StatusCode, Json<ErrorResponse>)> {
    Did::parse_subject(raw, chain_id)
        .map_err(|_| bad_request(format!("Invalid subject (expected DID or 0x-address): {}", raw)))
}

// Stored addresses are produced by the indexer; a row that fails to render
// back into a DID is corrupt.
fn render_did(chain_id: u64, address_hex: &str) -> Result<String, (StatusCode, Json<ErrorResponse>)> {
    Did::parse_subject(address_hex, chain_id)
        .map(|did| did.to_string())
        .map_err(internal_error)
}

async fn ensure_known_did(
    state: &AppState,
    subject_hex: &str,
) -> Result<db::DbDid, (StatusCode, Json<ErrorResponse>)> {
    db::get_did(&state.db, subject_hex)
        .await
        .map_err(internal_error)?
        .ok_or_else(|| not_found("DID not found"))
}

async fn health(State(_state): State<AppState>) -> &'static str {
    "OK"
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DidDocumentJson {
    did: String,
    controller: String,
    active: bool,
    metadata_cid: String,
    updated_at: i64,
}

#[derive(Serialize)]
struct IdentitiesResponse {
    identities: Vec<DidDocumentJson>,
}

fn did_document_json(did: String, row: db::DbDid) -> DidDocumentJson {
    DidDocumentJson {
        did,
        controller: row.controller,
        active: row.active,
        metadata_cid: row.metadata_cid,
        updated_at: row.updated_at,
    }
}

async fn list_identities(
    State(state): State<AppState>,
) -> Result<Json<IdentitiesResponse>, (StatusCode, Json<ErrorResponse>)> {
    let rows = db::list_dids(&state.db).await.map_err(internal_error)?;

    let mut identities = Vec::with_capacity(rows.len());
    for row in rows {
        let did = render_did(state.chain_id, &row.id)?;
        identities.push(did_document_json(did, row));
    }

    Ok(Json(IdentitiesResponse { identities }))
}

async fn get_identity(
    State(state): State<AppState>,
    Path(did): Path<String>,
) -> Result<Json<DidDocumentJson>, (StatusCode, Json<ErrorResponse>)> {
    let did = parse_subject_param(&did, state.chain_id)?;
    let row = ensure_known_did(&state, &did.address_hex()).await?;
    Ok(Json(did_document_json(did.to_string(), row)))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CredentialJson {
    uid: String,
    schema_id: String,
    issuer: String,
    /// Rendered as a DID string; omitted in identity-scoped listings.
    #[serde(skip_serializing_if = "Option::is_none")]
    subject: Option<String>,
    issued_at: i64,
    expires_at: Option<i64>,
    revoked: bool,
}

#[derive(Serialize)]
struct CredentialsResponse {
    credentials: Vec<CredentialJson>,
}

fn credential_json(row: db::DbAttestation, subject: Option<String>) -> CredentialJson {
    CredentialJson {
        uid: row.uid,
        schema_id: row.schema_id,
        issuer: row.issuer,
        subject,
        issued_at: row.issued_at,
        expires_at: row.expires_at,
        revoked: row.revoked,
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DelegationJson {
    id: String,
    /// Rendered as a DID string; omitted in identity-scoped listings.
    #[serde(skip_serializing_if = "Option::is_none")]
    owner: Option<String>,
    agent: String,
    /// Capability bitmask as a decimal string.
    scope: String,
    expires_at: Option<i64>,
    revoked: bool,
}

#[derive(Serialize)]
struct DelegationsResponse {
    delegations: Vec<DelegationJson>,
}

fn delegation_json(row: db::DbDelegation, owner: Option<String>) -> DelegationJson {
    DelegationJson {
        id: row.id,
        owner,
        agent: row.agent,
        scope: row.scope,
        expires_at: row.expires_at,
        revoked: row.revoked,
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TrustProfileJson {
    did: String,
    controller: String,
    score: f64,
    tier: Tier,
    score_breakdown: ScoreBreakdown,
    human_readable_explanation: String,
    credentials: Vec<CredentialJson>,
    delegation_chain: Vec<DelegationJson>,
    risk_flags: Vec<RiskFlag>,
    merkle_root: B256,
    proof: Vec<B256>,
    computed_at: i64,
    version: &'static str,
}

async fn get_trust_profile(
    State(state): State<AppState>,
    Path(did): Path<String>,
) -> Result<Json<TrustProfileJson>, (StatusCode, Json<ErrorResponse>)> {
    let did = parse_subject_param(&did, state.chain_id)?;
    let subject_hex = did.address_hex();

    let row = ensure_known_did(&state, &subject_hex).await?;
    let score = state
        .engine
        .compute_score(did.address)
        .await
        .map_err(internal_error)?;

    let (attestations, delegations) = tokio::try_join!(
        db::list_attestations(&state.db, Some(&subject_hex), None),
        db::list_delegations(&state.db, Some(&subject_hex), None),
    )
    .map_err(internal_error)?;

    let credentials = attestations
        .into_iter()
        .map(|row| credential_json(row, None))
        .collect();
    let delegation_chain = delegations
        .into_iter()
        .map(|row| delegation_json(row, None))
        .collect();

    Ok(Json(TrustProfileJson {
        did: did.to_string(),
        controller: row.controller,
        score: score.score,
        tier: score.tier,
        score_breakdown: score.score_breakdown,
        human_readable_explanation: score.human_readable_explanation,
        credentials,
        delegation_chain,
        risk_flags: score.risk_flags,
        merkle_root: score.proof.merkle_root,
        proof: score.proof.proof,
        computed_at: score.computed_at,
        version: TRUST_PROFILE_VERSION,
    }))
}

async fn get_identity_credentials(
    State(state): State<AppState>,
    Path(did): Path<String>,
) -> Result<Json<CredentialsResponse>, (StatusCode, Json<ErrorResponse>)> {
    let did = parse_subject_param(&did, state.chain_id)?;
    let subject_hex = did.address_hex();
    ensure_known_did(&state, &subject_hex).await?;

    let rows = db::list_attestations(&state.db, Some(&subject_hex), None)
        .await
        .map_err(internal_error)?;
    let credentials = rows
        .into_iter()
        .map(|row| credential_json(row, None))
        .collect();

    Ok(Json(CredentialsResponse { credentials }))
}

async fn get_identity_delegations(
    State(state): State<AppState>,
    Path(did): Path<String>,
) -> Result<Json<DelegationsResponse>, (StatusCode, Json<ErrorResponse>)> {
    let did = parse_subject_param(&did, state.chain_id)?;
    let owner_hex = did.address_hex();
    ensure_known_did(&state, &owner_hex).await?;

    let rows = db::list_delegations(&state.db, Some(&owner_hex), None)
        .await
        .map_err(internal_error)?;
    let delegations = rows
        .into_iter()
        .map(|row| delegation_json(row, None))
        .collect();

    Ok(Json(DelegationsResponse { delegations }))
}

#[derive(Debug, Deserialize)]
struct CredentialsQuery {
    subject: Option<String>,
    issuer: Option<String>,
}

async fn get_credentials(
    State(state): State<AppState>,
    Query(query): Query<CredentialsQuery>,
) -> Result<Json<CredentialsResponse>, (StatusCode, Json<ErrorResponse>)> {
    let subject_hex = query
        .subject
        .as_deref()
        .map(|raw| parse_subject_param(raw, state.chain_id).map(|did| did.address_hex()))
        .transpose()?;
    let issuer_hex = query
        .issuer
        .as_deref()
        .map(|raw| parse_subject_param(raw, state.chain_id).map(|did| did.address_hex()))
        .transpose()?;

    let rows = db::list_attestations(&state.db, subject_hex.as_deref(), issuer_hex.as_deref())
        .await
        .map_err(internal_error)?;

    let mut credentials = Vec::with_capacity(rows.len());
    for row in rows {
        let subject_did = render_did(state.chain_id, &row.subject)?;
        credentials.push(credential_json(row, Some(subject_did)));
    }

    Ok(Json(CredentialsResponse { credentials }))
}

#[derive(Debug, Deserialize)]
struct DelegationsQuery {
    owner: Option<String>,
    agent: Option<String>,
}

async fn get_delegations(
    State(state): State<AppState>,
    Query(query): Query<DelegationsQuery>,
) -> Result<Json<DelegationsResponse>, (StatusCode, Json<ErrorResponse>)> {
    let owner_hex = query
        .owner
        .as_deref()
        .map(|raw| parse_subject_param(raw, state.chain_id).map(|did| did.address_hex()))
        .transpose()?;
    let agent_hex = query
        .agent
        .as_deref()
        .map(|raw| parse_subject_param(raw, state.chain_id).map(|did| did.address_hex()))
        .transpose()?;

    let rows = db::list_delegations(&state.db, owner_hex.as_deref(), agent_hex.as_deref())
        .await
        .map_err(internal_error)?;

    let mut delegations = Vec::with_capacity(rows.len());
    for row in rows {
        let owner_did = render_did(state.chain_id, &row.owner)?;
        delegations.push(delegation_json(row, Some(owner_did)));
    }

    Ok(Json(DelegationsResponse { delegations }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SchemaJson {
    id: String,
    creator: String,
    name: String,
    version: String,
    schema_cid: String,
    created_at: i64,
    active: bool,
}

#[derive(Serialize)]
struct SchemasResponse {
    schemas: Vec<SchemaJson>,
}

fn schema_json(row: db::DbSchema) -> SchemaJson {
    SchemaJson {
        id: row.id,
        creator: row.creator,
        name: row.name,
        version: row.version,
        schema_cid: row.schema_cid,
        created_at: row.created_at,
        active: row.active,
    }
}

fn parse_schema_id(raw: &str) -> Result<String, (StatusCode, Json<ErrorResponse>)> {
    raw.parse::<B256>()
        .map(|id| bytes32_hex(&id))
        .map_err(|_| bad_request(format!("Invalid schema id (expected 0x-bytes32): {}", raw)))
}

async fn get_schema(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SchemaJson>, (StatusCode, Json<ErrorResponse>)> {
    let id = parse_schema_id(&id)?;
    let row = db::get_schema(&state.db, &id)
        .await
        .map_err(internal_error)?
        .ok_or_else(|| not_found("Schema not found"))?;
    Ok(Json(schema_json(row)))
}

#[derive(Debug, Deserialize)]
struct SchemasQuery {
    creator: Option<String>,
}

async fn get_schemas(
    State(state): State<AppState>,
    Query(query): Query<SchemasQuery>,
) -> Result<Json<SchemasResponse>, (StatusCode, Json<ErrorResponse>)> {
    let creator_hex = query
        .creator
        .as_deref()
        .map(|raw| parse_subject_param(raw, state.chain_id).map(|did| did.address_hex()))
        .transpose()?;

    let rows = db::list_schemas(&state.db, creator_hex.as_deref())
        .await
        .map_err(internal_error)?;

    Ok(Json(SchemasResponse {
        schemas: rows.into_iter().map(schema_json).collect(),
    }))
}

async fn get_reputation(
    State(state): State<AppState>,
    Path(subject): Path<String>,
) -> Result<Json<ReputationScore>, (StatusCode, Json<ErrorResponse>)> {
    let did = parse_subject_param(&subject, state.chain_id)?;
    let score = state
        .engine
        .compute_score(did.address)
        .await
        .map_err(internal_error)?;
    Ok(Json(score))
}

#[derive(Serialize)]
struct VerifyResponse {
    valid: bool,
    subject: String,
    score: f64,
    timestamp: i64,
}

async fn verify_reputation(
    body: Result<Json<ScoreProof>, JsonRejection>,
) -> Result<Json<VerifyResponse>, (StatusCode, Json<ErrorResponse>)> {
    let Json(proof) = body.map_err(|_| bad_request("Invalid proof format"))?;
    let valid = verify_score_proof(&proof);

    Ok(Json(VerifyResponse {
        valid,
        subject: proof.subject,
        score: proof.score,
        timestamp: proof.timestamp,
    }))
}
