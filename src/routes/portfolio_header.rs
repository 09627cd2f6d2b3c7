/**
 * Portfolio Header Routes
 * Banner title and description shown above the project grid
 */
use axum::{extract::rejection::JsonRejection, extract::State, Json};

use crate::db::models::{PortfolioHeader, PortfolioHeaderUpdate};
use crate::error::ApiError;
use crate::session::RequireAdmin;
use crate::AppState;

/// GET /api/portfolio-header
pub async fn get_header(State(state): State<AppState>) -> Result<Json<PortfolioHeader>, ApiError> {
    Ok(Json(state.content.get_portfolio_header().await?))
}

/// PUT /api/portfolio-header
pub async fn update_header(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    payload: Result<Json<PortfolioHeaderUpdate>, JsonRejection>,
) -> Result<Json<PortfolioHeader>, ApiError> {
    let Json(update) = payload?;
    let header = state.content.update_portfolio_header(update).await?;
    tracing::info!(title = %header.title, "Portfolio header updated");
    Ok(Json(header))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::*;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_get_header() {
        let app = test_app("header-get").router;
        let (status, _, bytes) = send(&app, get("/api/portfolio-header")).await;
        assert_eq!(status, StatusCode::OK);

        let header: PortfolioHeader = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(header.id, "portfolio-header");
        assert_eq!(header.title, "Portfolio");
    }

    #[tokio::test]
    async fn test_update_header_round_trips() {
        let app = test_app("header-update").router;
        let cookie = admin_cookie(&app).await;

        let body = json!({ "title": "Our work", "description": "Twenty years on site" });
        let (status, _, _) = send(
            &app,
            json_request("PUT", "/api/portfolio-header", &body, Some(&cookie)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, _, bytes) = send(&app, get("/api/portfolio-header")).await;
        let header: PortfolioHeader = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(header.title, "Our work");
        assert_eq!(header.description, "Twenty years on site");
    }

    #[tokio::test]
    async fn test_update_header_missing_field_is_bad_request() {
        let app = test_app("header-partial").router;
        let cookie = admin_cookie(&app).await;
        let (status, _, _) = send(
            &app,
            json_request("PUT", "/api/portfolio-header", &json!({ "title": "Only" }), Some(&cookie)),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_update_header_requires_session() {
        let app = test_app("header-unauth").router;
        let body = json!({ "title": "T", "description": "D" });
        let (status, _, _) =
            send(&app, json_request("PUT", "/api/portfolio-header", &body, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
