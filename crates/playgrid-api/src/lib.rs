//! playgrid-api — REST API for session provisioning.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | POST | `/deploy` | Provision a session for a package |
//! | GET | `/get_credentials/{session_id}` | Credentials of a session |
//! | POST | `/verify_credentials/{session_id}` | Check a login pair |
//! | GET | `/packages` | Package catalog |
//! | GET | `/healthz` | Liveness |
//!
//! Every JSON body carries `status: "success" | "error"`; errors add a
//! `message`.

pub mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};

use playgrid_provision::Provisioner;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub provisioner: Arc<Provisioner>,
}

/// Build the API router with permissive CORS.
pub fn build_router(provisioner: Arc<Provisioner>) -> Router {
    let state = ApiState { provisioner };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/deploy", post(handlers::deploy))
        .route("/get_credentials/{session_id}", get(handlers::get_credentials))
        .route(
            "/verify_credentials/{session_id}",
            post(handlers::verify_credentials),
        )
        .route("/packages", get(handlers::list_packages))
        .route("/healthz", get(handlers::healthz))
        .with_state(state)
        .layer(cors)
}
