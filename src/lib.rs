//! Brochure Backend - content API for a company brochure site

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod mailer;
pub mod routes;
pub mod session;
pub mod storage;

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::{net::SocketAddr, sync::Arc};
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, limit::RequestBodyLimitLayer,
    services::ServeDir, trace::TraceLayer,
};

use crate::config::{
    AdminSecret, AppConfig, UploadBackend, DEFAULT_ADMIN_PASSWORD, DEFAULT_SESSION_SECRET,
};
use crate::db::{ContentStore, MemoryStore, PgContentStore, PgPortfolioRepository, PortfolioRepository};
use crate::mailer::ContactMailer;
use crate::session::SessionGuard;
use crate::storage::ImageStore;

/// Global request body cap
const BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Shared handler state. Cloning is cheap; everything inside is reference counted.
#[derive(Clone)]
pub struct AppState {
    pub session: SessionGuard,
    pub content: Arc<dyn ContentStore>,
    pub portfolio: Arc<dyn PortfolioRepository>,
    pub images: Arc<dyn ImageStore>,
    pub mailer: ContactMailer,
    /// Present when running against Postgres; used by the readiness check.
    pub db: Option<PgPool>,
}

impl AppState {
    pub fn new(
        config: &AppConfig,
        content: Arc<dyn ContentStore>,
        portfolio: Arc<dyn PortfolioRepository>,
        mailer: ContactMailer,
        db: Option<PgPool>,
    ) -> Self {
        Self {
            session: SessionGuard::new(
                config.admin_secret.clone(),
                &config.session_secret,
                config.is_production(),
            ),
            content,
            portfolio,
            images: storage::from_config(&config.upload),
            mailer,
            db,
        }
    }
}

/// Configure CORS from environment variables.
/// Uses ALLOWED_ORIGINS (comma-separated) or FRONTEND_ORIGIN, falling back
/// to the local Next.js dev server.
pub fn configure_cors() -> CorsLayer {
    let allowed_origins = std::env::var("ALLOWED_ORIGINS")
        .ok()
        .and_then(|s| {
            let origins: Vec<HeaderValue> = s
                .split(',')
                .filter_map(|origin| origin.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                None
            } else {
                Some(origins)
            }
        })
        .or_else(|| {
            std::env::var("FRONTEND_ORIGIN")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(|origin| vec![origin])
        })
        .unwrap_or_else(|| {
            vec![
                HeaderValue::from_static("http://localhost:3000"),
                HeaderValue::from_static("http://127.0.0.1:3000"),
            ]
        });

    // Credentials are required for the admin session cookie.
    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([axum::http::header::CONTENT_TYPE])
        .allow_credentials(true)
}

/// Create and configure the application router.
pub fn create_app(state: AppState, config: &AppConfig) -> Router {
    let cors = configure_cors();

    let api = Router::new()
        .route("/api/admin/login", post(routes::admin::login))
        .route("/api/admin/logout", post(routes::admin::logout))
        .route("/api/admin/check", get(routes::admin::check))
        .route(
            "/api/home",
            get(routes::home::get_home).put(routes::home::update_home),
        )
        .route(
            "/api/portfolio",
            get(routes::portfolio::list_projects)
                .post(routes::portfolio::create_project)
                .put(routes::portfolio::update_project)
                .delete(routes::portfolio::delete_project),
        )
        .route("/api/portfolio/{id}", get(routes::portfolio::get_project))
        .route(
            "/api/portfolio-header",
            get(routes::portfolio_header::get_header).put(routes::portfolio_header::update_header),
        )
        .route(
            "/api/portfolio-categories",
            get(routes::portfolio_categories::list_categories)
                .put(routes::portfolio_categories::update_category),
        )
        .route(
            "/api/portfolio-categories/{name}",
            get(routes::portfolio_categories::get_category),
        )
        .route("/api/contact", post(routes::contact::send_inquiry))
        .route("/health", get(routes::health::health_ping))
        .route("/health/ready", get(routes::health::health_ready))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT));

    // Uploads get their own, larger cap.
    let upload = Router::new()
        .route("/api/upload", post(routes::upload::upload_image))
        .layer(DefaultBodyLimit::max(routes::upload::UPLOAD_BODY_LIMIT))
        .layer(RequestBodyLimitLayer::new(routes::upload::UPLOAD_BODY_LIMIT));

    let mut app = api.merge(upload);

    if let UploadBackend::Local { dir, .. } = &config.upload {
        app = app.nest_service("/uploads", ServeDir::new(dir));
    }

    app.layer(logging::middleware::propagate_request_id_layer())
        .layer(middleware::from_fn(logging::middleware::log_request))
        .layer(logging::middleware::request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}

/// Run the server (used by main).
pub async fn run() {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env();

    // Held for the life of the process; dropping them loses buffered lines.
    let _log_guards = logging::init(&config.environment);

    routes::health::init_start_time();

    if config.is_production() {
        if config.session_secret.is_empty() || config.session_secret == DEFAULT_SESSION_SECRET {
            panic!(
                "FATAL: SESSION_SECRET must be set to a secure, unique value in production. \
                 Refusing to start with the default secret."
            );
        }

        if matches!(&config.admin_secret, AdminSecret::Plain(p) if p == DEFAULT_ADMIN_PASSWORD)
        {
            tracing::warn!(
                "SECURITY: ADMIN_PASSWORD is using the insecure default. \
                 Set ADMIN_PASSWORD_HASH to a bcrypt hash of a strong password."
            );
        }
    }

    let (content, portfolio, pool): (Arc<dyn ContentStore>, Arc<dyn PortfolioRepository>, _) =
        match &config.database {
            Some(db_config) => match db::init_pool(db_config).await {
                Ok(pool) => {
                    if let Err(e) = db::run_migrations(&pool).await {
                        tracing::error!("Failed to run database migrations: {}", e);
                    }
                    (
                        Arc::new(PgContentStore::new(pool.clone())),
                        Arc::new(PgPortfolioRepository::new(pool.clone())),
                        Some(pool),
                    )
                }
                Err(e) => {
                    tracing::error!("Failed to initialize database pool: {}", e);
                    std::process::exit(1);
                }
            },
            None => {
                tracing::warn!(
                    "DATABASE_URL not set. Using the in-memory store; content is lost on restart \
                     and the home content and portfolio header are not provisioned."
                );
                let store = Arc::new(MemoryStore::new());
                (store.clone(), store, None)
            }
        };

    let mailer = match ContactMailer::from_config(config.smtp.as_ref()) {
        Ok(mailer) => mailer,
        Err(e) => {
            tracing::error!("Invalid SMTP configuration: {}; contact form is disabled", e);
            ContactMailer::disabled()
        }
    };

    let state = AppState::new(&config, content, portfolio, mailer, pool);
    let app = create_app(state, &config);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("Invalid HOST/PORT configuration");
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Server error");
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::*;
    use axum::http::{header, Request, StatusCode};

    #[tokio::test]
    async fn test_responses_carry_request_id() {
        let app = test_app("lib-request-id").router;
        let (status, headers, _) = send(&app, get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(headers.contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_cors_allows_dev_origin_with_credentials() {
        let app = test_app("lib-cors").router;
        let request = Request::get("/api/portfolio")
            .header(header::ORIGIN, "http://localhost:3000")
            .body(axum::body::Body::empty())
            .unwrap();
        let (_, headers, _) = send(&app, request).await;
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "http://localhost:3000"
        );
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
            "true"
        );
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let app = test_app("lib-404").router;
        let (status, _, _) = send(&app, get("/api/does-not-exist")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
