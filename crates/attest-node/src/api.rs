//! HTTP API server for the Attest node.
//!
//! Provides the `/vc` endpoints: health, issuance, verification, QR code
//! generation, revocation and scan resolution. Request and response bodies
//! use the `RequestInfo` / `ResponseInfo` envelope.

use attest_core::{SubjectClaims, VerificationResult};
use attest_credentials::{
    CredentialError, DisplaySummary, IssueRequest, PresentationReference, ResolvedPresentation,
    VerifiableCredential,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;

use crate::state::AppState;

const API_VERSION: &str = "1.0";
const SERVICE_NAME: &str = "attest-node";

// --- Envelopes ---

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestInfo {
    #[serde(default)]
    pub api_id: Option<String>,
    #[serde(default)]
    pub ver: Option<String>,
    #[serde(default)]
    pub ts: Option<i64>,
    #[serde(default)]
    pub msg_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseInfo {
    pub api_id: String,
    pub ver: String,
    pub ts: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub res_msg_id: Option<String>,
    pub status: String,
}

impl ResponseInfo {
    fn new(request: &RequestInfo, default_api_id: &str, status: &str) -> Self {
        Self {
            api_id: request
                .api_id
                .clone()
                .unwrap_or_else(|| default_api_id.to_string()),
            ver: API_VERSION.into(),
            ts: Utc::now().timestamp_millis(),
            res_msg_id: request.msg_id.clone(),
            status: status.into(),
        }
    }

    fn successful(request: &RequestInfo, default_api_id: &str) -> Self {
        Self::new(request, default_api_id, "successful")
    }
}

// --- Request types ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRequest {
    #[serde(default)]
    pub holder_did: Option<String>,
    #[serde(default)]
    pub issuer: Option<String>,
    #[serde(default)]
    pub types: Vec<String>,
    pub credential_subject: SubjectClaims,
}

#[derive(Debug, Deserialize)]
pub struct IssueBody {
    #[serde(rename = "RequestInfo", default)]
    pub request_info: RequestInfo,
    #[serde(rename = "CredentialRequest")]
    pub credential_request: CredentialRequest,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRequest {
    #[serde(default)]
    pub vc_id: Option<String>,
    #[serde(default)]
    pub credential: Option<VerifiableCredential>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyBody {
    #[serde(rename = "RequestInfo", default)]
    pub request_info: RequestInfo,
    #[serde(rename = "VerificationRequest")]
    pub verification_request: VerificationRequest,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrRequest {
    pub vc_id: String,
}

#[derive(Debug, Deserialize)]
pub struct QrBody {
    #[serde(rename = "RequestInfo", default)]
    pub request_info: RequestInfo,
    #[serde(rename = "QRRequest")]
    pub qr_request: QrRequest,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevocationRequest {
    pub vc_id: String,
    #[serde(default = "default_revocation_reason")]
    pub reason: String,
}

fn default_revocation_reason() -> String {
    "unspecified".into()
}

#[derive(Debug, Deserialize)]
pub struct RevokeBody {
    #[serde(rename = "RequestInfo", default)]
    pub request_info: RequestInfo,
    #[serde(rename = "RevocationRequest")]
    pub revocation_request: RevocationRequest,
}

#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    pub payload: String,
}

#[derive(Debug, Deserialize)]
pub struct ResolveBody {
    #[serde(rename = "RequestInfo", default)]
    pub request_info: RequestInfo,
    #[serde(rename = "ScanRequest")]
    pub scan_request: ScanRequest,
}

#[derive(Debug, Deserialize)]
pub struct ScanQuery {
    pub iat: Option<i64>,
    pub exp: Option<i64>,
}

// --- Response types ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub version: String,
    pub issuer: String,
    pub key_id: String,
    pub store_backend: String,
    pub uptime_secs: u64,
}

#[derive(Serialize)]
pub struct IssueResponse {
    #[serde(rename = "ResponseInfo")]
    pub response_info: ResponseInfo,
    #[serde(rename = "VerifiableCredential")]
    pub verifiable_credential: VerifiableCredential,
}

#[derive(Serialize)]
pub struct VerifyResponse {
    #[serde(rename = "ResponseInfo")]
    pub response_info: ResponseInfo,
    #[serde(rename = "VerificationResult")]
    pub verification_result: VerificationResult,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QrCodeBody {
    pub qr_code_data: String,
    pub qr_code_image: String,
    /// Unix milliseconds.
    pub expiry_time: i64,
}

#[derive(Serialize)]
pub struct QrResponse {
    #[serde(rename = "ResponseInfo")]
    pub response_info: ResponseInfo,
    #[serde(rename = "QRCode")]
    pub qr_code: QrCodeBody,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevocationBody {
    pub vc_id: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revoked_at: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
pub struct RevokeResponse {
    #[serde(rename = "ResponseInfo")]
    pub response_info: ResponseInfo,
    #[serde(rename = "Revocation")]
    pub revocation: RevocationBody,
}

#[derive(Serialize)]
pub struct ResolveResponse {
    #[serde(rename = "ResponseInfo")]
    pub response_info: ResponseInfo,
    #[serde(rename = "Resolution")]
    pub resolution: ResolvedPresentation,
}

/// Body of a direct scan of a verification URL.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResponse {
    pub vc_id: String,
    /// `VALID`, or the reason the credential is not valid.
    pub status: String,
    pub verified_at: DateTime<Utc>,
    pub code_fresh: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permit_details: Option<DisplaySummary>,
    pub verification: VerificationResult,
}

impl From<ResolvedPresentation> for ScanResponse {
    fn from(resolved: ResolvedPresentation) -> Self {
        let status = if resolved.verification.valid {
            "VALID".to_string()
        } else {
            resolved.verification.reason.to_string()
        };
        Self {
            vc_id: resolved.credential_id,
            status,
            verified_at: resolved.verification.verified_at,
            code_fresh: resolved.code_fresh,
            permit_details: resolved.display,
            verification: resolved.verification,
        }
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    #[serde(rename = "ResponseInfo")]
    pub response_info: ResponseInfo,
    pub error: ErrorBody,
}

// --- Errors ---

/// A credential error bound to the request it failed.
pub struct ApiError {
    request_info: RequestInfo,
    api_id: &'static str,
    error: CredentialError,
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match &self.error {
            CredentialError::Validation(_) => StatusCode::BAD_REQUEST,
            CredentialError::NotFound(_) => StatusCode::NOT_FOUND,
            CredentialError::Conflict(_) => StatusCode::CONFLICT,
            CredentialError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            CredentialError::SignatureInfrastructure(_)
            | CredentialError::Serialization(_)
            | CredentialError::Core(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match &self.error {
            CredentialError::Validation(_) => "VALIDATION_ERROR",
            CredentialError::NotFound(_) => "NOT_FOUND",
            CredentialError::Conflict(_) => "CONFLICT",
            CredentialError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            CredentialError::SignatureInfrastructure(_) => "SIGNATURE_INFRASTRUCTURE_ERROR",
            CredentialError::Serialization(_) | CredentialError::Core(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(api_id = self.api_id, error = %self.error, "request failed");
        } else {
            tracing::debug!(api_id = self.api_id, error = %self.error, "request rejected");
        }
        let body = ErrorResponse {
            response_info: ResponseInfo::new(&self.request_info, self.api_id, "error"),
            error: ErrorBody {
                code: self.code().into(),
                message: self.error.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}

fn failed(
    request_info: &RequestInfo,
    api_id: &'static str,
) -> impl FnOnce(CredentialError) -> ApiError {
    let request_info = request_info.clone();
    move |error| ApiError {
        request_info,
        api_id,
        error,
    }
}

// --- Handlers ---

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "UP".into(),
        service: SERVICE_NAME.into(),
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

async fn handle_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        issuer: state.service.issuer().to_string(),
        key_id: state.service.key_id().to_string(),
        store_backend: state.service.store_backend().to_string(),
        uptime_secs: state.uptime_secs(),
    })
}

async fn handle_issue(
    State(state): State<Arc<AppState>>,
    Json(body): Json<IssueBody>,
) -> Result<Json<IssueResponse>, ApiError> {
    let request = body.credential_request;
    let vc = state
        .service
        .issue(IssueRequest {
            subject_claims: request.credential_subject,
            issuer: request.issuer,
            holder: request.holder_did,
            types: request.types,
        })
        .await
        .map_err(failed(&body.request_info, "vc-issue"))?;

    Ok(Json(IssueResponse {
        response_info: ResponseInfo::successful(&body.request_info, "vc-issue"),
        verifiable_credential: vc,
    }))
}

async fn handle_verify(
    State(state): State<Arc<AppState>>,
    Json(body): Json<VerifyBody>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let fail = failed(&body.request_info, "vc-verify");
    let request = body.verification_request;
    let result = match (request.credential, request.vc_id) {
        (Some(document), _) => state.service.verify_document(&document).await,
        (None, Some(id)) => state.service.verify(&id).await,
        (None, None) => Err(CredentialError::Validation(
            "either vcId or credential is required".into(),
        )),
    }
    .map_err(fail)?;

    Ok(Json(VerifyResponse {
        response_info: ResponseInfo::successful(&body.request_info, "vc-verify"),
        verification_result: result,
    }))
}

async fn handle_generate_qr(
    State(state): State<Arc<AppState>>,
    Json(body): Json<QrBody>,
) -> Result<Json<QrResponse>, ApiError> {
    let code = state
        .service
        .generate_presentation(&body.qr_request.vc_id)
        .await
        .map_err(failed(&body.request_info, "vc-qr-generate"))?;

    Ok(Json(QrResponse {
        response_info: ResponseInfo::successful(&body.request_info, "vc-qr-generate"),
        qr_code: QrCodeBody {
            qr_code_data: code.payload,
            qr_code_image: code.image,
            expiry_time: code.reference.expires_at.timestamp_millis(),
        },
    }))
}

async fn handle_revoke(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RevokeBody>,
) -> Result<Json<RevokeResponse>, ApiError> {
    let request = body.revocation_request;
    let record = state
        .service
        .revoke(&request.vc_id, &request.reason)
        .await
        .map_err(failed(&body.request_info, "vc-revoke"))?;

    Ok(Json(RevokeResponse {
        response_info: ResponseInfo::successful(&body.request_info, "vc-revoke"),
        revocation: RevocationBody {
            vc_id: request.vc_id,
            status: record.status.to_string(),
            reason: record.revocation.as_ref().map(|r| r.reason.clone()),
            revoked_at: record.revocation.as_ref().map(|r| r.revoked_at),
        },
    }))
}

async fn handle_resolve(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ResolveBody>,
) -> Result<Json<ResolveResponse>, ApiError> {
    let resolution = state
        .service
        .resolve_presentation(&body.scan_request.payload)
        .await
        .map_err(failed(&body.request_info, "vc-resolve"))?;

    Ok(Json(ResolveResponse {
        response_info: ResponseInfo::successful(&body.request_info, "vc-resolve"),
        resolution,
    }))
}

async fn handle_scan(
    State(state): State<Arc<AppState>>,
    Path(vc_id): Path<String>,
    Query(query): Query<ScanQuery>,
) -> Result<Json<ScanResponse>, ApiError> {
    let fail = || failed(&RequestInfo::default(), "vc-scan");
    let resolved = match (query.iat, query.exp) {
        (Some(iat), Some(exp)) => {
            let reference = PresentationReference::from_unix(vc_id, iat, exp).map_err(fail())?;
            state.service.resolve_reference(reference).await
        }
        _ => state.service.resolve_credential(&vc_id).await,
    }
    .map_err(fail())?;
    Ok(Json(resolved.into()))
}

// --- Server ---

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/vc/health", get(handle_health))
        .route("/vc/v1/status", get(handle_status))
        .route("/vc/v1/_issue", post(handle_issue))
        .route("/vc/v1/_verify", post(handle_verify))
        .route("/vc/v1/_generateQR", post(handle_generate_qr))
        .route("/vc/v1/_revoke", post(handle_revoke))
        .route("/vc/v1/_resolve", post(handle_resolve))
        .route("/vc/verify/{vc_id}", get(handle_scan))
        .with_state(state)
}

pub async fn serve(listener: tokio::net::TcpListener, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = build_router(state);
    axum::serve(listener, app).await?;
    Ok(())
}

pub async fn bind(listen_addr: SocketAddr) -> anyhow::Result<tokio::net::TcpListener> {
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    tracing::info!(%listen_addr, "HTTP API server started");
    Ok(listener)
}
