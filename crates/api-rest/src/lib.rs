//! # API REST
//!
//! REST API of the consent status service.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI documentation
//! - REST-specific concerns (JSON serialization, CORS, basic authentication)
//!
//! Uses `api-shared` for health reporting and credential checks.

#![warn(rust_2018_idioms)]

pub mod error;

use api_shared::{validate_basic_auth, HealthRes, HealthService, BASIC_CHALLENGE};
use axum::{
    body::Bytes,
    extract::{Path, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use consent_core::{BasicAuth, ConsentService, ConsentStatus, DomainStatus, Policy};
use error::{ApiError, ErrorRes};
use serde::Deserialize;
use std::future::Future;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};

/// Application state for the REST API server
///
/// Shared by all request handlers: the consent service and the credentials callers must present.
#[derive(Clone)]
pub struct AppState {
    service: ConsentService,
    auth: Arc<BasicAuth>,
}

impl AppState {
    pub fn new(service: ConsentService, auth: BasicAuth) -> Self {
        Self {
            service,
            auth: Arc::new(auth),
        }
    }
}

/// Optional body of a status query.
#[derive(Clone, Debug, Default, Deserialize, ToSchema)]
pub struct StatusReq {
    /// Departments of the caller; domains restricted to other departments are hidden.
    #[serde(default)]
    pub departments: Vec<String>,
}

#[derive(OpenApi)]
#[openapi(
    paths(health, consent_status),
    components(schemas(
        HealthRes,
        StatusReq,
        DomainStatus,
        ConsentStatus,
        Policy,
        ErrorRes,
    )),
    modifiers(&BasicAuthScheme)
)]
pub struct ApiDoc;

struct BasicAuthScheme;

impl Modify for BasicAuthScheme {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "basic_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Basic)),
            );
        }
    }
}

/// Build the router.
///
/// Everything except `/health` and the OpenAPI document requires basic authentication,
/// including the `404` fallback.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/consent/status/:pid", post(consent_status))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_basic_auth,
        ))
        .route("/health", get(health))
        .route("/api-docs/openapi.json", get(openapi))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve `router(state)` on `listener` until `shutdown` resolves.
///
/// # Errors
/// Returns an error if the HTTP server fails while running.
pub async fn serve<F>(
    listener: tokio::net::TcpListener,
    state: AppState,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn require_basic_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let provided = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match validate_basic_auth(provided, &state.auth) {
        Ok(()) => next.run(request).await,
        Err(reason) => {
            tracing::debug!(%reason, path = %request.uri().path(), "Rejected request");
            (
                StatusCode::UNAUTHORIZED,
                [(header::WWW_AUTHENTICATE, BASIC_CHALLENGE)],
            )
                .into_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Domain directory is up to date", body = HealthRes),
        (status = 503, description = "Last directory refresh failed", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Healthy while the most recent refresh of the domain directory succeeded.
/// This endpoint is used for monitoring and load balancer health checks.
#[axum::debug_handler]
async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthRes>) {
    let res = HealthService::check_health(state.service.cache());
    let status = if res.ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(res))
}

#[utoipa::path(
    post,
    path = "/consent/status/{pid}",
    params(("pid" = String, Path, description = "Patient identifier within each domain's person id system")),
    request_body(content = StatusReq, description = "Caller departments (optional)", content_type = "application/json"),
    responses(
        (status = 200, description = "Consent status per visible domain", body = [DomainStatus]),
        (status = 400, description = "Malformed request body", body = ErrorRes),
        (status = 401, description = "Missing or invalid credentials"),
        (status = 500, description = "Domain's check policy missing from the registry answer", body = ErrorRes),
        (status = 502, description = "Registry unavailable or returned malformed data", body = ErrorRes)
    ),
    security(("basic_auth" = []))
)]
/// Consent status of a patient
///
/// Resolves the consent status of every domain visible to the caller's departments. The body is
/// optional; without it only unrestricted domains are returned.
///
/// # Errors
/// Fails the whole request on the first domain that cannot be resolved.
#[axum::debug_handler]
async fn consent_status(
    State(state): State<AppState>,
    Path(pid): Path<String>,
    body: Bytes,
) -> Result<Json<Vec<DomainStatus>>, ApiError> {
    let req = parse_status_req(&body)?;
    let statuses = state
        .service
        .domain_statuses(&pid, &req.departments)
        .await?;
    Ok(Json(statuses))
}

fn parse_status_req(body: &[u8]) -> Result<StatusReq, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(StatusReq::default());
    }
    serde_json::from_slice(body).map_err(|e| {
        ApiError::new(
            StatusCode::BAD_REQUEST,
            format!("invalid request body: {e}"),
        )
    })
}

async fn not_found() -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, "404 page not found")
}

async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
