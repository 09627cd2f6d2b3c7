/**
 * Portfolio Category Routes
 * Cover image per category name
 */
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::db::models::PortfolioCategory;
use crate::error::ApiError;
use crate::session::RequireAdmin;
use crate::AppState;

/// Request body for PUT /api/portfolio-categories
#[derive(Debug, Deserialize, Serialize)]
pub struct UpdateCategoryRequest {
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
}

/// GET /api/portfolio-categories
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<PortfolioCategory>>, ApiError> {
    Ok(Json(state.content.get_portfolio_categories().await?))
}

/// GET /api/portfolio-categories/{name}
/// Unknown names answer with a null image rather than 404.
pub async fn get_category(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<PortfolioCategory>, ApiError> {
    let image = state.content.get_portfolio_category_image(&name).await?;
    Ok(Json(PortfolioCategory { name, image }))
}

/// PUT /api/portfolio-categories
pub async fn update_category(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    payload: Result<Json<UpdateCategoryRequest>, JsonRejection>,
) -> Result<Json<PortfolioCategory>, ApiError> {
    let Json(UpdateCategoryRequest { name, image }) = payload?;
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("Category name is required".to_string()));
    }

    let category = state.content.update_portfolio_category(name, image).await?;
    tracing::info!(category = %category.name, "Portfolio category image updated");
    Ok(Json(category))
}
