use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::Json,
    routing::{get, post},
    Router,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use licensekit_license::LicenseIssuer;
use licensekit_revocation::{RevocationStore, RevokeOutcome};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ApiError;

/// Shared handler state.
pub struct AppState {
    pub issuer: LicenseIssuer,
    pub revocations: RevocationStore,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CreateLicenseRequest {
    #[serde(default, alias = "Product")]
    pub product: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RevocationStatus {
    pub id: String,
    pub revoked: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RevocationList {
    pub revoked: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PublicKeyResponse {
    pub signer: String,
    /// Raw 32-byte Ed25519 public key, base64url without padding.
    pub public_key: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

async fn create_license(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CreateLicenseRequest>, JsonRejection>,
) -> Result<Json<String>, ApiError> {
    let Json(request) = body?;
    let signed = state.issuer.create_license(&request.product).await?;
    Ok(Json(signed.encode()))
}

async fn revoke_license(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<&'static str>, ApiError> {
    let outcome = state.revocations.revoke(&id).await?;
    if outcome == RevokeOutcome::AlreadyRevoked {
        debug!(license_id = %id, "Revocation requested for already revoked license");
    }
    Ok(Json("SUCCESS"))
}

async fn revocation_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<RevocationStatus>, ApiError> {
    let revoked = state.revocations.is_revoked(&id).await?;
    Ok(Json(RevocationStatus { id, revoked }))
}

async fn list_revocations(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RevocationList>, ApiError> {
    let revoked = state.revocations.revoked_ids().await?;
    Ok(Json(RevocationList { revoked }))
}

async fn public_key(
    State(state): State<Arc<AppState>>,
) -> Result<Json<PublicKeyResponse>, ApiError> {
    let key = state.issuer.public_key().await?;
    Ok(Json(PublicKeyResponse {
        signer: state.issuer.signer().to_string(),
        public_key: URL_SAFE_NO_PAD.encode(key),
    }))
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Build the HTTP API router over the given state.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/licenses", post(create_license))
        .route("/api/licenses/{id}/revoke", post(revoke_license))
        .route("/api/licenses/{id}/revoked", get(revocation_status))
        .route("/api/revocations", get(list_revocations))
        .route("/api/public-key", get(public_key))
        .route("/health", get(health))
        .with_state(state)
}
