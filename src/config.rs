//! Application configuration loaded from environment variables.

use crate::models::Locale;
use std::env;
use std::str::FromStr;

/// Which backing store the server talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Firestore,
    /// In-process store; data is lost on restart. Local development only.
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(StoreBackend::Firestore),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(ConfigError::Invalid("STORE_BACKEND", s.to_string())),
        }
    }
}

/// Whose gender picks the gendered form of a relation label.
///
/// `Related` uses the person being displayed. `Creator` uses the creator of
/// the family the relation was read from; older deployments labelled
/// owner-view listings this way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LabelGenderSource {
    #[default]
    Related,
    Creator,
}

impl FromStr for LabelGenderSource {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "related" => Ok(LabelGenderSource::Related),
            "creator" => Ok(LabelGenderSource::Creator),
            _ => Err(ConfigError::Invalid("LABEL_GENDER_SOURCE", s.to_string())),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// GCP project ID
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    pub store_backend: StoreBackend,
    /// Locale used when a request does not ask for one
    pub default_locale: Locale,
    pub label_gender_source: LabelGenderSource,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let default_locale = match env::var("DEFAULT_LOCALE") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| ConfigError::Invalid("DEFAULT_LOCALE", raw))?,
            Err(_) => Locale::Es,
        };

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            store_backend: env::var("STORE_BACKEND")
                .map(|v| v.parse())
                .unwrap_or(Ok(StoreBackend::Firestore))?,
            default_locale,
            label_gender_source: env::var("LABEL_GENDER_SOURCE")
                .map(|v| v.parse())
                .unwrap_or(Ok(LabelGenderSource::Related))?,
        })
    }

    /// Config for tests: in-memory store, fixed signing key.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            store_backend: StoreBackend::Memory,
            default_locale: Locale::Es,
            label_gender_source: LabelGenderSource::Related,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
