use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_CHAT_ENDPOINT: &str = "http://localhost:8080/get";
pub const DEFAULT_AUTH_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";

#[derive(Debug, Error)]
pub enum ResolveStateDirError {
    #[error("home directory not found")]
    HomeDirNotFound,
}

pub fn resolve_state_dir() -> Result<PathBuf, ResolveStateDirError> {
    if let Some(override_dir) = std::env::var_os("SOLACE_STATE_DIR") {
        return Ok(PathBuf::from(override_dir));
    }

    let Some(home) = dirs::home_dir() else {
        return Err(ResolveStateDirError::HomeDirNotFound);
    };

    Ok(home.join(".solace"))
}

pub fn resolve_notes_db_path() -> Result<PathBuf, ResolveStateDirError> {
    if let Ok(value) = std::env::var("SOLACE_NOTES_DB") {
        return Ok(PathBuf::from(value.trim()));
    }

    let state_dir = resolve_state_dir()?;
    Ok(state_dir.join("notes.db"))
}

pub fn resolve_chat_endpoint() -> String {
    match std::env::var("SOLACE_CHAT_URL") {
        Ok(value) if !value.trim().is_empty() => value.trim().to_string(),
        _ => DEFAULT_CHAT_ENDPOINT.to_string(),
    }
}

/// Connection configuration of the external identity provider. The values
/// are opaque to the rest of the app.
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub base_url: String,
    pub api_key: String,
}

#[derive(Debug, Error)]
pub enum AuthConfigError {
    #[error("identity provider not configured: set SOLACE_AUTH_API_KEY")]
    MissingApiKey,
}

impl AuthConfig {
    pub fn from_env() -> Result<Self, AuthConfigError> {
        let api_key = match std::env::var("SOLACE_AUTH_API_KEY") {
            Ok(value) if !value.trim().is_empty() => value.trim().to_string(),
            _ => return Err(AuthConfigError::MissingApiKey),
        };

        let base_url = match std::env::var("SOLACE_AUTH_URL") {
            Ok(value) if !value.trim().is_empty() => {
                value.trim().trim_end_matches('/').to_string()
            }
            _ => DEFAULT_AUTH_BASE_URL.to_string(),
        };

        Ok(Self { base_url, api_key })
    }
}
