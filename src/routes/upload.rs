/**
 * Upload Routes
 * Admin image upload for portfolio projects and category covers
 */
use axum::{
    extract::{multipart::Field, Multipart, State},
    Json,
};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, UploadError};
use crate::session::RequireAdmin;
use crate::storage::UPLOAD_FOLDER;
use crate::AppState;

pub const MAX_FILE_SIZE: usize = 5 * 1024 * 1024; // 5MB

/// Body limit for the upload route. Larger than `MAX_FILE_SIZE` so an
/// oversize file is answered with 400 instead of 413.
pub const UPLOAD_BODY_LIMIT: usize = 8 * 1024 * 1024;

const SUFFIX_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const SUFFIX_LEN: usize = 13;

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub url: String,
}

/// A validated image read from the `file` field.
struct ImageFile {
    bytes: Vec<u8>,
    content_type: String,
    original_name: Option<String>,
}

fn get_extension_from_mime(mime: &str) -> &str {
    match mime {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/svg+xml" => "svg",
        "image/avif" => "avif",
        _ => "bin",
    }
}

/// Extension of the client filename, lower-cased; `None` unless it is a
/// short run of ASCII alphanumerics.
fn original_extension(filename: &str) -> Option<String> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || ext.len() > 8 {
        return None;
    }
    if !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// `{unix_millis}-{13 lowercase alphanumerics}.{ext}`
fn generate_filename(original_name: Option<&str>, content_type: &str) -> String {
    let ext = original_name
        .and_then(original_extension)
        .unwrap_or_else(|| get_extension_from_mime(content_type).to_string());

    let mut rng = rand::rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| SUFFIX_CHARSET[rng.random_range(0..SUFFIX_CHARSET.len())] as char)
        .collect();

    format!("{}-{}.{}", chrono::Utc::now().timestamp_millis(), suffix, ext)
}

async fn read_image(mut field: Field<'_>) -> Result<ImageFile, UploadError> {
    let content_type = field.content_type().unwrap_or_default().to_string();
    if !content_type.starts_with("image/") {
        return Err(UploadError::NotAnImage(content_type));
    }
    let original_name = field.file_name().map(str::to_string);

    let mut bytes = Vec::new();
    while let Some(chunk) = field.chunk().await? {
        if bytes.len() + chunk.len() > MAX_FILE_SIZE {
            return Err(UploadError::TooLarge(bytes.len() + chunk.len()));
        }
        bytes.extend_from_slice(&chunk);
    }

    if bytes.is_empty() {
        return Err(UploadError::Empty);
    }

    Ok(ImageFile {
        bytes,
        content_type,
        original_name,
    })
}

/// First `file` field of the form; other fields are skipped.
async fn extract_image(multipart: &mut Multipart) -> Result<ImageFile, UploadError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("file") {
            return read_image(field).await;
        }
    }
    Err(UploadError::MissingFile)
}

/// POST /api/upload
pub async fn upload_image(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let image = extract_image(&mut multipart).await.map_err(|e| {
        tracing::warn!(error = %e, "Upload rejected");
        e
    })?;

    let filename = generate_filename(image.original_name.as_deref(), &image.content_type);
    let path = format!("{}/{}", UPLOAD_FOLDER, filename);
    let size = image.bytes.len();

    let url = state
        .images
        .put(&path, image.bytes, &image.content_type)
        .await?;

    tracing::info!(path = %path, size = size, "Image uploaded");
    Ok(Json(UploadResponse { url }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};

    const BOUNDARY: &str = "----brochure-test-boundary";

    fn multipart_request(
        field_name: &str,
        filename: &str,
        content_type: &str,
        data: &[u8],
        cookie: Option<&str>,
    ) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                BOUNDARY, field_name, filename, content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

        let mut builder = Request::post("/api/upload").header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        );
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::from(body)).unwrap()
    }

    fn error_of(bytes: &[u8]) -> String {
        let body: serde_json::Value = serde_json::from_slice(bytes).unwrap();
        body["error"].as_str().unwrap_or_default().to_string()
    }

    #[test]
    fn test_generated_filename_shape() {
        let name = generate_filename(Some("Site Photo.JPG"), "image/jpeg");
        let (millis, rest) = name.split_once('-').unwrap();
        assert!(millis.parse::<i64>().unwrap() > 0);

        let (suffix, ext) = rest.split_once('.').unwrap();
        assert_eq!(suffix.len(), SUFFIX_LEN);
        assert!(suffix.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
        assert_eq!(ext, "jpg");
    }

    #[test]
    fn test_extension_falls_back_to_mime() {
        assert!(generate_filename(None, "image/png").ends_with(".png"));
        assert!(generate_filename(Some("noext"), "image/webp").ends_with(".webp"));
        assert!(generate_filename(Some("evil.p/hp"), "image/gif").ends_with(".gif"));
    }

    #[tokio::test]
    async fn test_upload_requires_session() {
        let app = test_app("upload-unauth").router;
        let (status, _, _) =
            send(&app, multipart_request("file", "a.png", "image/png", &[1, 2, 3], None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_oversize_file_is_rejected() {
        let app = test_app("upload-oversize").router;
        let cookie = admin_cookie(&app).await;
        let data = vec![0u8; 6 * 1024 * 1024];

        let (status, _, bytes) = send(
            &app,
            multipart_request("file", "big.png", "image/png", &data, Some(&cookie)),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error_of(&bytes), "File size must be less than 5MB");
    }

    #[tokio::test]
    async fn test_non_image_is_rejected() {
        let app = test_app("upload-text").router;
        let cookie = admin_cookie(&app).await;

        let (status, _, bytes) = send(
            &app,
            multipart_request("file", "notes.txt", "text/plain", b"hello", Some(&cookie)),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error_of(&bytes), "File must be an image");
    }

    #[tokio::test]
    async fn test_missing_file_field_is_rejected() {
        let app = test_app("upload-nofield").router;
        let cookie = admin_cookie(&app).await;

        let (status, _, bytes) = send(
            &app,
            multipart_request("image", "a.png", "image/png", &[1, 2, 3], Some(&cookie)),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error_of(&bytes), "No file provided");
    }

    #[tokio::test]
    async fn test_empty_file_is_rejected() {
        let app = test_app("upload-empty").router;
        let cookie = admin_cookie(&app).await;

        let (status, _, _) = send(
            &app,
            multipart_request("file", "a.png", "image/png", &[], Some(&cookie)),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_image_is_stored_and_served() {
        let harness = test_app("upload-ok");
        tokio::fs::remove_dir_all(&harness.upload_dir).await.ok();
        let app = harness.router;
        let cookie = admin_cookie(&app).await;
        let data = vec![7u8; 1024 * 1024];

        let (status, _, bytes) = send(
            &app,
            multipart_request("file", "facade.png", "image/png", &data, Some(&cookie)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let body: UploadResponse = serde_json::from_slice(&bytes).unwrap();
        assert!(body.url.starts_with("/uploads/portfolio/"));
        assert!(body.url.ends_with(".png"));

        let relative = body.url.trim_start_matches("/uploads/");
        let stored = tokio::fs::read(harness.upload_dir.join(relative)).await.unwrap();
        assert_eq!(stored.len(), data.len());

        let (status, _, served) = send(&app, get(&body.url)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(served.len(), data.len());

        tokio::fs::remove_dir_all(&harness.upload_dir).await.ok();
    }
}
