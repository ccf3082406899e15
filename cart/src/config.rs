//! Remote store configuration.
//!
//! # Environment Variables
//!
//! ## Required
//! - `APPWRITE_ENDPOINT` - API base URL (e.g., `https://cloud.appwrite.io/v1`)
//! - `APPWRITE_PROJECT_ID` - Project id
//! - `APPWRITE_DATABASE_ID` - Database holding the cart collection
//! - `APPWRITE_CART_COLLECTION_ID` - Collection of cart item documents
//!
//! ## Optional
//! - `APPWRITE_JWT` - Session JWT for the signed-in user
//! - `APPWRITE_TIMEOUT_SECS` - Per-request timeout (default: 10)
//! - `APPWRITE_CART_USER_ATTRIBUTE` - Owner attribute on cart documents (default: `userId`)

use std::time::Duration;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is unset or blank.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    /// A variable is set but unusable.
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Connection settings for the Appwrite databases API.
#[derive(Clone)]
pub struct AppwriteConfig {
    /// API base URL, including the `/v1` suffix.
    pub endpoint: String,

    /// Project id, sent as `X-Appwrite-Project`.
    pub project_id: String,

    /// Database id.
    pub database_id: String,

    /// Cart item collection id.
    pub cart_collection_id: String,

    /// Session JWT, sent as `X-Appwrite-JWT` when present.
    pub jwt: Option<String>,

    /// Document attribute holding the owning user's id.
    ///
    /// Default: `userId`
    pub user_attribute: String,

    /// Per-request timeout.
    ///
    /// Default: 10 seconds
    pub request_timeout: Duration,
}

impl AppwriteConfig {
    /// Create configuration with default timeout and owner attribute.
    #[must_use]
    pub fn new(
        endpoint: impl Into<String>,
        project_id: impl Into<String>,
        database_id: impl Into<String>,
        cart_collection_id: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            project_id: project_id.into(),
            database_id: database_id.into(),
            cart_collection_id: cart_collection_id.into(),
            jwt: None,
            user_attribute: "userId".to_string(),
            request_timeout: Duration::from_secs(10),
        }
    }

    /// Set the session JWT.
    #[must_use]
    pub fn with_jwt(mut self, jwt: impl Into<String>) -> Self {
        self.jwt = Some(jwt.into());
        self
    }

    /// Set the owner attribute name.
    #[must_use]
    pub fn with_user_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.user_attribute = attribute.into();
        self
    }

    /// Set the per-request timeout.
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a required variable is missing or a value is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through a variable lookup function.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a required variable is missing or a value is invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required =
            |key: &str| optional(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()));

        let endpoint = required("APPWRITE_ENDPOINT")?;
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(ConfigError::InvalidEnvVar(
                "APPWRITE_ENDPOINT".to_string(),
                "must start with http:// or https://".to_string(),
            ));
        }

        let mut config = Self::new(
            endpoint,
            required("APPWRITE_PROJECT_ID")?,
            required("APPWRITE_DATABASE_ID")?,
            required("APPWRITE_CART_COLLECTION_ID")?,
        );

        if let Some(jwt) = optional("APPWRITE_JWT") {
            config = config.with_jwt(jwt);
        }

        if let Some(attribute) = optional("APPWRITE_CART_USER_ATTRIBUTE") {
            config = config.with_user_attribute(attribute);
        }

        if let Some(raw) = optional("APPWRITE_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|e| {
                ConfigError::InvalidEnvVar("APPWRITE_TIMEOUT_SECS".to_string(), format!("{e}"))
            })?;
            if secs == 0 {
                return Err(ConfigError::InvalidEnvVar(
                    "APPWRITE_TIMEOUT_SECS".to_string(),
                    "must be greater than zero".to_string(),
                ));
            }
            config = config.with_request_timeout(Duration::from_secs(secs));
        }

        Ok(config)
    }
}

// JWT stays out of logs
impl std::fmt::Debug for AppwriteConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppwriteConfig")
            .field("endpoint", &self.endpoint)
            .field("project_id", &self.project_id)
            .field("database_id", &self.database_id)
            .field("cart_collection_id", &self.cart_collection_id)
            .field("jwt", &self.jwt.as_ref().map(|_| "[REDACTED]"))
            .field("user_attribute", &self.user_attribute)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}
