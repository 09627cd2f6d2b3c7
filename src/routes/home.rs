/**
 * Home Content Routes
 * Public read and admin partial update of the home page aggregate
 */
use axum::{extract::rejection::JsonRejection, extract::State, Json};

use crate::db::models::{HomeContent, HomeContentUpdate};
use crate::error::ApiError;
use crate::session::RequireAdmin;
use crate::AppState;

/// GET /api/home
pub async fn get_home(State(state): State<AppState>) -> Result<Json<HomeContent>, ApiError> {
    let content = state.content.get_home_content().await?;
    Ok(Json(content))
}

/// PUT /api/home
/// Sections present in the body overwrite the stored ones; service items and
/// about paragraphs are replaced as whole lists.
pub async fn update_home(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    payload: Result<Json<HomeContentUpdate>, JsonRejection>,
) -> Result<Json<HomeContent>, ApiError> {
    let Json(update) = payload?;
    let content = state.content.update_home_content(update).await?;
    Ok(Json(content))
}
