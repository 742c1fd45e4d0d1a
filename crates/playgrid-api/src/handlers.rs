//! REST API handlers.
//!
//! Each handler calls into the `Provisioner` and returns a JSON body
//! tagged with `status`.

use std::collections::BTreeMap;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use playgrid_core::Credentials;
use playgrid_core::tier::{self, ResourceProfile};
use playgrid_provision::ProvisionError;

use crate::ApiState;

#[derive(Serialize)]
struct ErrorBody {
    status: &'static str,
    message: String,
}

fn error_response(msg: &str, status: StatusCode) -> impl IntoResponse {
    (
        status,
        Json(ErrorBody {
            status: "error",
            message: msg.to_string(),
        }),
    )
}

/// Status code and message for a failed provisioning request.
fn provision_failure(err: &ProvisionError) -> (StatusCode, String) {
    if err.is_validation() {
        return (StatusCode::BAD_REQUEST, err.to_string());
    }
    match err.platform_reason() {
        Some(reason) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Kubernetes API Error: {reason}"),
        ),
        None => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("System Error: {err}"),
        ),
    }
}

// ── Deploy ─────────────────────────────────────────────────────

/// Deploy request body.
#[derive(Debug, Deserialize)]
pub struct DeployRequest {
    pub package: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeployResponse {
    pub status: String,
    pub deployment_name: String,
    pub credentials: Credentials,
}

/// POST /deploy
pub async fn deploy(
    State(state): State<ApiState>,
    body: Result<Json<DeployRequest>, JsonRejection>,
) -> impl IntoResponse {
    let req = match body {
        Ok(Json(req)) => req,
        Err(rejection) => {
            return error_response(
                &format!("invalid request body: {}", rejection.body_text()),
                StatusCode::BAD_REQUEST,
            )
            .into_response();
        }
    };
    let Some(package) = req.package else {
        return error_response("package is required", StatusCode::BAD_REQUEST).into_response();
    };

    match state.provisioner.provision(&package).await {
        Ok(session) => Json(DeployResponse {
            status: "success".to_string(),
            deployment_name: session.session_id,
            credentials: session.credentials,
        })
        .into_response(),
        Err(e) => {
            let (status, message) = provision_failure(&e);
            if status.is_server_error() {
                error!(%package, error = %e, "deploy failed");
            } else {
                warn!(%package, error = %e, "deploy rejected");
            }
            error_response(&message, status).into_response()
        }
    }
}

// ── Credentials ────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct CredentialsResponse {
    pub status: String,
    pub credentials: Credentials,
}

/// GET /get_credentials/{session_id}
pub async fn get_credentials(
    State(state): State<ApiState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    match state.provisioner.credentials(&session_id).await {
        Some(credentials) => Json(CredentialsResponse {
            status: "success".to_string(),
            credentials,
        })
        .into_response(),
        None => error_response(
            "Deployment not found or credentials not available",
            StatusCode::NOT_FOUND,
        )
        .into_response(),
    }
}

/// Verify request body.
#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub status: String,
    pub valid: bool,
}

/// POST /verify_credentials/{session_id}
pub async fn verify_credentials(
    State(state): State<ApiState>,
    Path(session_id): Path<String>,
    body: Result<Json<VerifyRequest>, JsonRejection>,
) -> impl IntoResponse {
    let req = match body {
        Ok(Json(req)) => req,
        Err(rejection) => {
            return error_response(
                &format!("invalid request body: {}", rejection.body_text()),
                StatusCode::BAD_REQUEST,
            )
            .into_response();
        }
    };
    let valid = state
        .provisioner
        .verify(&session_id, &req.username, &req.password)
        .await;
    Json(VerifyResponse {
        status: "success".to_string(),
        valid,
    })
    .into_response()
}

// ── Catalog ────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct PackagesResponse {
    pub status: String,
    pub packages: BTreeMap<String, ResourceProfile>,
}

/// GET /packages
pub async fn list_packages() -> impl IntoResponse {
    let packages = tier::all()
        .into_iter()
        .map(|(name, profile)| (name.to_string(), profile))
        .collect();
    Json(PackagesResponse {
        status: "success".to_string(),
        packages,
    })
}

/// GET /healthz
pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}
