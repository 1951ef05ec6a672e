use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use sk_core::{get_or_create_user, ArticleStatus, Error, NewUser};
use std::sync::Arc;
use crate::error::ApiError;
use crate::AppState;

const SUMMARY_FAILED: &str = "Failed to process article";
const LIST_FAILED: &str = "Failed to fetch articles";
const AUTH_FAILED: &str = "internal server error";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRequest {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AuthRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Body errors (bad JSON, wrong content type) become validation errors in the
/// route's error shape.
fn invalid_body(message: &'static str, rejection: JsonRejection) -> ApiError {
    ApiError::new(message, Error::Validation(rejection.body_text()))
}

pub async fn root() -> &'static str {
    "Hello World!"
}

pub async fn create_summary(
    State(state): State<Arc<AppState>>,
    request: Result<Json<SummaryRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = request.map_err(|e| invalid_body(SUMMARY_FAILED, e))?;
    let url = request.url.unwrap_or_default();
    let user_id = request.user_id.unwrap_or_default();

    let (article, status) = state
        .manager
        .save_url(&user_id, &url)
        .await
        .map_err(|e| ApiError::new(SUMMARY_FAILED, e))?;

    let code = match status {
        ArticleStatus::New => StatusCode::CREATED,
        ArticleStatus::Existing => StatusCode::OK,
    };
    Ok((code, Json(article)))
}

pub async fn list_articles(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let articles = state
        .manager
        .list_articles(&user_id)
        .await
        .map_err(|e| ApiError::new(LIST_FAILED, e))?;
    Ok(Json(articles))
}

pub async fn missing_user_id() -> ApiError {
    ApiError::new(LIST_FAILED, Error::Validation("userId is required".to_string()))
}

pub async fn auth(
    State(state): State<Arc<AppState>>,
    request: Result<Json<AuthRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = request.map_err(|e| invalid_body(AUTH_FAILED, e))?;
    let user = NewUser::new(
        request.name.as_deref().unwrap_or_default(),
        request.email.as_deref().unwrap_or_default(),
    )
    .map_err(|e| ApiError::new(AUTH_FAILED, e))?;

    let (user, created) = get_or_create_user(state.users.as_ref(), user)
        .await
        .map_err(|e| ApiError::new(AUTH_FAILED, e))?;
    if !created {
        tracing::info!("👤 Welcome back {}", user.email);
    }
    Ok(Json(user))
}
