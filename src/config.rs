//! Application configuration, read once from the environment at startup.

use std::path::PathBuf;

use crate::db::DbConfig;

/// Fallback admin password. Only acceptable outside production.
pub const DEFAULT_ADMIN_PASSWORD: &str = "change-me-in-production";

/// Fallback session signing secret. Startup refuses it in production.
pub const DEFAULT_SESSION_SECRET: &str = "default-session-secret-change-in-production";

/// How the admin secret is stored.
#[derive(Debug, Clone)]
pub enum AdminSecret {
    /// Plain shared secret (`ADMIN_PASSWORD`).
    Plain(String),
    /// bcrypt hash of the secret (`ADMIN_PASSWORD_HASH`).
    Bcrypt(String),
}

/// Where uploaded images end up.
#[derive(Debug, Clone)]
pub enum UploadBackend {
    Local {
        dir: PathBuf,
        public_base: String,
    },
    Supabase {
        url: String,
        service_key: String,
        bucket: String,
    },
}

/// SMTP relay used by the contact form.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub username: String,
    pub password: String,
    pub recipient: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: String,
    pub host: String,
    pub port: u16,
    pub admin_secret: AdminSecret,
    pub session_secret: String,
    /// `None` runs the site on the in-memory store.
    pub database: Option<DbConfig>,
    pub upload: UploadBackend,
    /// `None` when SMTP credentials are missing; the mailer then fails closed.
    pub smtp: Option<SmtpConfig>,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl AppConfig {
    pub fn from_env() -> Self {
        let admin_secret = match env_non_empty("ADMIN_PASSWORD_HASH") {
            Some(hash) => AdminSecret::Bcrypt(hash),
            None => AdminSecret::Plain(env_or("ADMIN_PASSWORD", DEFAULT_ADMIN_PASSWORD)),
        };

        let database = env_non_empty("DATABASE_URL").map(|_| DbConfig::default());

        let upload = match (
            env_non_empty("SUPABASE_URL"),
            env_non_empty("SUPABASE_SERVICE_ROLE_KEY"),
        ) {
            (Some(url), Some(service_key)) => UploadBackend::Supabase {
                url: url.trim_end_matches('/').to_string(),
                service_key,
                bucket: env_or("SUPABASE_BUCKET", "portfolio-images"),
            },
            _ => UploadBackend::Local {
                dir: PathBuf::from(env_or("UPLOAD_DIR", "uploads")),
                public_base: env_or("PUBLIC_UPLOAD_BASE", "/uploads")
                    .trim_end_matches('/')
                    .to_string(),
            },
        };

        let smtp = match (env_non_empty("SMTP_EMAIL"), env_non_empty("SMTP_PASSWORD")) {
            (Some(username), Some(password)) => Some(SmtpConfig {
                host: env_or("SMTP_HOST", "smtp.gmail.com"),
                recipient: env_non_empty("CONTACT_RECIPIENT").unwrap_or_else(|| username.clone()),
                username,
                password,
            }),
            _ => None,
        };

        Self {
            environment: env_or("ENVIRONMENT", "development"),
            host: env_or("HOST", "127.0.0.1"),
            port: std::env::var("PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3001),
            admin_secret,
            session_secret: env_or("SESSION_SECRET", DEFAULT_SESSION_SECRET),
            database,
            upload,
            smtp,
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Settings for tests and local tooling: plain password, temp uploads, no DB.
    pub fn for_development(admin_password: &str, upload_dir: PathBuf) -> Self {
        Self {
            environment: "development".to_string(),
            host: "127.0.0.1".to_string(),
            port: 3001,
            admin_secret: AdminSecret::Plain(admin_password.to_string()),
            session_secret: "development-session-secret".to_string(),
            database: None,
            upload: UploadBackend::Local {
                dir: upload_dir,
                public_base: "/uploads".to_string(),
            },
            smtp: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_development_config_is_not_production() {
        let config = AppConfig::for_development("secret", PathBuf::from("uploads"));
        assert!(!config.is_production());
        assert!(config.database.is_none());
        assert!(matches!(config.admin_secret, AdminSecret::Plain(ref p) if p == "secret"));
    }
}
