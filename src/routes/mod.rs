/**
 * Routes Module
 * API route handlers
 */
use serde::{Deserialize, Serialize};

pub mod admin;
pub mod contact;
pub mod health;
pub mod home;
pub mod portfolio;
pub mod portfolio_categories;
pub mod portfolio_header;
pub mod upload;

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Success response (login, logout, delete, contact)
#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}
