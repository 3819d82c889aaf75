use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{CycleId, FieldRepId, ShareStatus, ShareToken};
use super::messaging::landing_path;
use super::repository::{CampaignDirectory, RepositoryError, ShareRepository};
use super::service::{IssueShareRequest, ShareService, SharingError};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IssueSharePayload {
    pub field_rep_id: FieldRepId,
    pub cycle_id: CycleId,
    pub doctor_contact: String,
    #[serde(default)]
    pub is_reminder: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct IssueShareResponse {
    pub token: ShareToken,
    pub status: ShareStatus,
    pub share_link: String,
    pub verification_url: String,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VerifyPayload {
    pub contact: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TrackPayload {
    #[serde(default)]
    pub value: Option<f64>,
}

/// Router builder exposing the share lifecycle endpoints.
pub fn share_router<D, R>(service: Arc<ShareService<D, R>>) -> Router
where
    D: CampaignDirectory + 'static,
    R: ShareRepository + 'static,
{
    Router::new()
        .route("/api/v1/shares", post(issue_handler::<D, R>))
        .route(
            "/api/v1/shares/:token/verify",
            get(open_link_handler::<D, R>).post(verify_handler::<D, R>),
        )
        .route("/api/v1/shares/:token/landing", get(landing_handler::<D, R>))
        .route(
            "/api/v1/shares/:token/events/:event_kind",
            post(track_handler::<D, R>),
        )
        .route(
            "/api/v1/field-reps/:field_rep_id/shares",
            get(rep_shares_handler::<D, R>),
        )
        .with_state(service)
}

pub(crate) async fn issue_handler<D, R>(
    State(service): State<Arc<ShareService<D, R>>>,
    axum::Json(payload): axum::Json<IssueSharePayload>,
) -> Response
where
    D: CampaignDirectory + 'static,
    R: ShareRepository + 'static,
{
    let request = IssueShareRequest {
        field_rep_id: payload.field_rep_id,
        cycle_id: payload.cycle_id,
        doctor_contact: payload.doctor_contact,
        is_reminder: payload.is_reminder,
    };
    match blocking(service, move |service| service.issue_share(request)).await {
        Ok(issued) => {
            let body = IssueShareResponse {
                token: issued.share.token,
                status: issued.share.status,
                share_link: issued.share_link,
                verification_url: issued.verification_url,
                message: issued.share.message,
            };
            (StatusCode::CREATED, axum::Json(body)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn open_link_handler<D, R>(
    State(service): State<Arc<ShareService<D, R>>>,
    Path(token): Path<String>,
) -> Response
where
    D: CampaignDirectory + 'static,
    R: ShareRepository + 'static,
{
    let token = ShareToken(token);
    match blocking(service, move |service| service.open_link(&token)).await {
        Ok(prompt) => (StatusCode::OK, axum::Json(prompt)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn verify_handler<D, R>(
    State(service): State<Arc<ShareService<D, R>>>,
    Path(token): Path<String>,
    axum::Json(payload): axum::Json<VerifyPayload>,
) -> Response
where
    D: CampaignDirectory + 'static,
    R: ShareRepository + 'static,
{
    let token = ShareToken(token);
    let landing = landing_path(&token);
    match blocking(service, move |service| service.verify(&token, &payload.contact)).await {
        Ok(_) => Redirect::to(&landing).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn landing_handler<D, R>(
    State(service): State<Arc<ShareService<D, R>>>,
    Path(token): Path<String>,
) -> Response
where
    D: CampaignDirectory + 'static,
    R: ShareRepository + 'static,
{
    let token = ShareToken(token);
    match blocking(service, move |service| service.land(&token)).await {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn track_handler<D, R>(
    State(service): State<Arc<ShareService<D, R>>>,
    Path((token, event_kind)): Path<(String, String)>,
    payload: Option<axum::Json<TrackPayload>>,
) -> Response
where
    D: CampaignDirectory + 'static,
    R: ShareRepository + 'static,
{
    let value = payload.and_then(|axum::Json(body)| body.value);
    let token = ShareToken(token);
    match blocking(service, move |service| service.track(&token, &event_kind, value)).await {
        Ok(_) => (StatusCode::OK, axum::Json(json!({ "ok": true }))).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn rep_shares_handler<D, R>(
    State(service): State<Arc<ShareService<D, R>>>,
    Path(field_rep_id): Path<i64>,
) -> Response
where
    D: CampaignDirectory + 'static,
    R: ShareRepository + 'static,
{
    let field_rep_id = FieldRepId(field_rep_id);
    match blocking(service, move |service| service.shares_for_rep(field_rep_id)).await {
        Ok(shares) => (StatusCode::OK, axum::Json(shares)).into_response(),
        Err(error) => error_response(error),
    }
}

/// Run a storage-bound service call on the blocking pool.
async fn blocking<D, R, T, F>(service: Arc<ShareService<D, R>>, call: F) -> Result<T, SharingError>
where
    D: CampaignDirectory + 'static,
    R: ShareRepository + 'static,
    T: Send + 'static,
    F: FnOnce(&ShareService<D, R>) -> Result<T, SharingError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || call(&service))
        .await
        .map_err(|err| {
            SharingError::Repository(RepositoryError::Unavailable(format!(
                "storage task failed: {err}"
            )))
        })?
}

fn error_response(error: SharingError) -> Response {
    let status = match &error {
        SharingError::NotFound { .. } => StatusCode::NOT_FOUND,
        SharingError::Validation(_) => StatusCode::BAD_REQUEST,
        SharingError::InactiveRep(_) => StatusCode::FORBIDDEN,
        SharingError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        SharingError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}
