/**
 * Contact Routes
 * Public contact form relayed to the site owner by email
 */
use axum::{extract::rejection::JsonRejection, extract::State, Json};

use crate::error::ApiError;
use crate::mailer::Inquiry;
use crate::routes::SuccessResponse;
use crate::AppState;

fn validate_inquiry(inquiry: &Inquiry) -> Result<(), ApiError> {
    if inquiry.from_name.trim().is_empty() {
        return Err(ApiError::BadRequest("Name is required".to_string()));
    }
    let email = inquiry.from_email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::BadRequest("A valid email is required".to_string()));
    }
    if inquiry.message.trim().is_empty() {
        return Err(ApiError::BadRequest("Message is required".to_string()));
    }
    Ok(())
}

/// POST /api/contact
pub async fn send_inquiry(
    State(state): State<AppState>,
    payload: Result<Json<Inquiry>, JsonRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let Json(inquiry) = payload?;
    validate_inquiry(&inquiry)?;

    state.mailer.send_inquiry(&inquiry).await?;
    Ok(Json(SuccessResponse { success: true }))
}
