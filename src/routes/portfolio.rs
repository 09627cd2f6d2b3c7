/**
 * Portfolio Routes
 * Public project listing and admin CRUD
 */
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::db::models::{NewProject, PortfolioProject, ProjectUpdate};
use crate::error::ApiError;
use crate::routes::SuccessResponse;
use crate::session::RequireAdmin;
use crate::AppState;

// ============================================================================
// Request Types
// ============================================================================

/// Request body for PUT /api/portfolio
#[derive(Debug, Deserialize, Serialize)]
pub struct UpdateProjectRequest {
    pub id: i64,
    #[serde(flatten)]
    pub changes: ProjectUpdate,
}

/// Query parameters for DELETE /api/portfolio
#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    pub id: Option<String>,
}

// ============================================================================
// Validation
// ============================================================================

fn require_image(image: &str) -> Result<(), ApiError> {
    if image.trim().is_empty() {
        return Err(ApiError::BadRequest("Project image is required".to_string()));
    }
    Ok(())
}

/// Ids are serial, so anything below 1 counts as missing.
fn require_project_id(id: i64) -> Result<i64, ApiError> {
    if id <= 0 {
        return Err(ApiError::BadRequest("Project ID is required".to_string()));
    }
    Ok(id)
}

fn parse_project_id(raw: Option<&str>) -> Result<i64, ApiError> {
    match raw.and_then(|id| id.trim().parse::<i64>().ok()) {
        Some(id) => require_project_id(id),
        None => Err(ApiError::BadRequest("Project ID is required".to_string())),
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/portfolio
/// Most recent work first.
pub async fn list_projects(
    State(state): State<AppState>,
) -> Result<Json<Vec<PortfolioProject>>, ApiError> {
    Ok(Json(state.portfolio.list().await?))
}

/// GET /api/portfolio/{id}
pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PortfolioProject>, ApiError> {
    let id = parse_project_id(Some(&id))?;
    Ok(Json(state.portfolio.get(id).await?))
}

/// POST /api/portfolio
pub async fn create_project(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    payload: Result<Json<NewProject>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(project) = payload?;
    require_image(&project.image)?;

    let created = state.portfolio.create(project).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /api/portfolio
pub async fn update_project(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    payload: Result<Json<UpdateProjectRequest>, JsonRejection>,
) -> Result<Json<PortfolioProject>, ApiError> {
    let Json(UpdateProjectRequest { id, changes }) = payload?;
    let id = require_project_id(id)?;
    if let Some(image) = changes.image.as_deref() {
        require_image(image)?;
    }

    Ok(Json(state.portfolio.update(id, changes).await?))
}

/// DELETE /api/portfolio?id=N
pub async fn delete_project(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<DeleteQuery>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let id = parse_project_id(query.id.as_deref())?;
    state.portfolio.delete(id).await?;
    Ok(Json(SuccessResponse { success: true }))
}
