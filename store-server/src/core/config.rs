//! Server configuration
//!
//! All settings come from environment variables with sensible
//! defaults for development:
//!
//! | Env var | Default | Purpose |
//! |---------|---------|---------|
//! | WORK_DIR | ./data | Database files and uploaded slips |
//! | HTTP_PORT | 3000 | HTTP API port |
//! | PUBLIC_BASE_URL | http://localhost:3000 | Base for uploaded asset URLs |
//! | JWT_SECRET | (dev fallback) | HS256 secret shared with the identity provider |
//! | SENDGRID_API_KEY | (unset) | Enables real email delivery |
//! | SENDGRID_FROM_EMAIL | no-reply@example.com | Sender address |
//! | OWNER_EMAIL | = from email | Recipient of low-stock alerts |
//! | ENVIRONMENT | development | development / staging / production |

use crate::auth::JwtConfig;

#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory for the embedded database and uploads
    pub work_dir: String,
    /// HTTP API port
    pub http_port: u16,
    /// Public base URL used to build slip/product asset URLs
    pub public_base_url: String,
    /// JWT verification configuration
    pub jwt: JwtConfig,
    /// Running environment: development | staging | production
    pub environment: String,
    /// SendGrid API key; when unset, emails are logged instead of sent
    pub sendgrid_api_key: Option<String>,
    /// Sender address for transactional email
    pub from_email: String,
    /// Store owner address for low-stock alerts
    pub owner_email: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let from_email = std::env::var("SENDGRID_FROM_EMAIL")
            .unwrap_or_else(|_| "no-reply@example.com".into());
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            public_base_url: std::env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into()),
            jwt: JwtConfig::from_env(),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            sendgrid_api_key: std::env::var("SENDGRID_API_KEY").ok().filter(|k| !k.is_empty()),
            owner_email: std::env::var("OWNER_EMAIL").unwrap_or_else(|_| from_email.clone()),
            from_email,
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
