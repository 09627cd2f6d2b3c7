/**
 * Admin Session Routes
 * Shared-secret login, logout, and session check backed by the session cookie
 */
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::routes::SuccessResponse;
use crate::AppState;

#[derive(Debug, Deserialize, Serialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CheckResponse {
    pub authenticated: bool,
}

/// POST /api/admin/login
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload?;

    if payload.password.is_empty() {
        return Err(ApiError::BadRequest("Password is required".to_string()));
    }

    let guard = state.session.clone();
    let is_valid = tokio::task::spawn_blocking(move || guard.verify_password(&payload.password))
        .await
        .map_err(|e| ApiError::internal("Internal server error", e))?;

    if !is_valid {
        tracing::warn!("Admin login rejected: invalid password");
        return Err(ApiError::Unauthorized("Invalid password"));
    }

    let token = state
        .session
        .create_session()
        .map_err(|e| ApiError::internal("Internal server error", e))?;
    let jar = jar.add(state.session.session_cookie(token));

    tracing::info!("Admin logged in");
    Ok((StatusCode::OK, jar, Json(SuccessResponse { success: true })))
}

/// POST /api/admin/logout
/// Always succeeds; clears the session cookie.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let jar = state.session.clear_session(jar);
    (StatusCode::OK, jar, Json(SuccessResponse { success: true }))
}

/// GET /api/admin/check
pub async fn check(State(state): State<AppState>, jar: CookieJar) -> Json<CheckResponse> {
    Json(CheckResponse {
        authenticated: state.session.is_authenticated(&jar),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::*;
    use axum::http::{header, Request};

    fn check_request(cookie: Option<&str>) -> Request<axum::body::Body> {
        let mut builder = Request::get("/api/admin/check");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(axum::body::Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_login_missing_password_returns_bad_request() {
        let app = test_app("login-missing").router;
        let (status, _, _) = send(
            &app,
            json_request("POST", "/api/admin/login", &serde_json::json!({}), None),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_login_malformed_body_returns_bad_request() {
        let app = test_app("login-malformed").router;
        let request = Request::post("/api/admin/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(axum::body::Body::from("{not json"))
            .unwrap();
        let (status, _, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_login_wrong_password_returns_unauthorized() {
        let app = test_app("login-wrong").router;
        let (status, headers, _) = send(
            &app,
            json_request(
                "POST",
                "/api/admin/login",
                &serde_json::json!({ "password": "wrongpassword" }),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(headers.get(header::SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn test_check_without_cookie_is_unauthenticated() {
        let app = test_app("check-none").router;
        let (status, _, bytes) = send(&app, check_request(None)).await;
        assert_eq!(status, StatusCode::OK);
        let body: CheckResponse = serde_json::from_slice(&bytes).unwrap();
        assert!(!body.authenticated);
    }

    #[tokio::test]
    async fn test_login_cookie_authenticates_check() {
        let app = test_app("check-login").router;
        let cookie = admin_cookie(&app).await;

        let (_, _, bytes) = send(&app, check_request(Some(&cookie))).await;
        let body: CheckResponse = serde_json::from_slice(&bytes).unwrap();
        assert!(body.authenticated);
    }

    #[tokio::test]
    async fn test_login_cookie_flags() {
        let app = test_app("login-flags").router;
        let (_, headers, _) = send(
            &app,
            json_request(
                "POST",
                "/api/admin/login",
                &serde_json::json!({ "password": ADMIN_PASSWORD }),
                None,
            ),
        )
        .await;
        let set_cookie = headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
        assert!(set_cookie.starts_with("admin_session="));
        assert!(set_cookie.contains("HttpOnly"));
        assert!(set_cookie.contains("SameSite=Lax"));
        assert!(set_cookie.contains("Max-Age=604800"));
    }

    #[tokio::test]
    async fn test_presence_only_cookie_is_rejected() {
        let app = test_app("check-forged").router;
        let (_, _, bytes) = send(&app, check_request(Some("admin_session=anything"))).await;
        let body: CheckResponse = serde_json::from_slice(&bytes).unwrap();
        assert!(!body.authenticated);
    }

    #[tokio::test]
    async fn test_logout_clears_cookie() {
        let app = test_app("logout").router;
        let (status, headers, bytes) = send(
            &app,
            Request::post("/api/admin/logout")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let body: SuccessResponse = serde_json::from_slice(&bytes).unwrap();
        assert!(body.success);

        let set_cookie = headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
        assert!(set_cookie.starts_with("admin_session="));
        assert!(set_cookie.contains("Max-Age=0"));
    }
}
