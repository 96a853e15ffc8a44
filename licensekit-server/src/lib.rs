//! HTTP API for the licensekit service.
//!
//! Thin adapter over the core: decodes requests, calls the issuer or the
//! revocation store, and maps their errors to status codes.

pub mod config;
mod error;
mod routes;

pub use config::{ServerConfig, StorageKind};
pub use error::{ApiError, ErrorResponse};
pub use routes::{
    build_router, AppState, CreateLicenseRequest, HealthResponse, PublicKeyResponse,
    RevocationList, RevocationStatus,
};
