use crate::domain::Session;
use crate::infra::AuthConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Thin pass-through to the external identity provider's REST surface.
/// Every operation is a single attempt; provider failures carry the
/// provider's own message string so the UI can show it verbatim.
#[derive(Clone, Debug)]
pub struct IdentityClient {
    agent: ureq::Agent,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Error)]
pub enum AuthError {
    // Provider-reported failure, shown verbatim in the banner.
    #[error("{0}")]
    Provider(String),

    #[error("identity provider unreachable: {0}")]
    Transport(String),

    #[error("identity provider returned an unexpected response: {0}")]
    Malformed(String),
}

#[derive(Debug, Serialize)]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    #[serde(rename = "returnSecureToken")]
    return_secure_token: bool,
}

#[derive(Debug, Serialize)]
struct IdpRequest<'a> {
    #[serde(rename = "postBody")]
    post_body: String,
    #[serde(rename = "requestUri")]
    request_uri: &'a str,
    #[serde(rename = "returnSecureToken")]
    return_secure_token: bool,
}

#[derive(Debug, Serialize)]
struct OobCodeRequest<'a> {
    #[serde(rename = "requestType")]
    request_type: &'a str,
    email: &'a str,
}

#[derive(Debug, Deserialize)]
struct SignInResponse {
    #[serde(rename = "localId")]
    local_id: String,
    email: Option<String>,
}

impl IdentityClient {
    pub fn new(config: AuthConfig) -> Self {
        let agent_config = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(15)))
            .http_status_as_error(false)
            .build();
        Self {
            agent: agent_config.into(),
            base_url: config.base_url,
            api_key: config.api_key,
        }
    }

    pub fn sign_in_password(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let body = PasswordRequest {
            email,
            password,
            return_secure_token: true,
        };
        let value = self.post("accounts:signInWithPassword", &body)?;
        session_from_response(value)
    }

    /// Registers a new password account. The caller is responsible for
    /// writing the profile record keyed by the returned uid.
    pub fn register_password(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let body = PasswordRequest {
            email,
            password,
            return_secure_token: true,
        };
        let value = self.post("accounts:signUp", &body)?;
        session_from_response(value)
    }

    /// Federated sign-in with an OAuth ID token obtained out of band.
    pub fn sign_in_federated(&self, id_token: &str) -> Result<Session, AuthError> {
        let body = IdpRequest {
            post_body: format!("id_token={id_token}&providerId=google.com"),
            request_uri: "http://localhost",
            return_secure_token: true,
        };
        let value = self.post("accounts:signInWithIdp", &body)?;
        session_from_response(value)
    }

    pub fn send_password_reset(&self, email: &str) -> Result<(), AuthError> {
        let body = OobCodeRequest {
            request_type: "PASSWORD_RESET",
            email,
        };
        self.post("accounts:sendOobCode", &body)?;
        Ok(())
    }

    fn post<T: Serialize>(&self, operation: &str, body: &T) -> Result<Value, AuthError> {
        let url = format!("{}/{}?key={}", self.base_url, operation, self.api_key);
        let mut response = self
            .agent
            .post(&url)
            .send_json(body)
            .map_err(|error| AuthError::Transport(error.to_string()))?;

        let value: Value = response
            .body_mut()
            .read_json()
            .map_err(|error| AuthError::Malformed(error.to_string()))?;

        if !response.status().is_success() {
            let message = provider_error_message(&value)
                .unwrap_or_else(|| format!("request failed with status {}", response.status()));
            return Err(AuthError::Provider(message));
        }

        Ok(value)
    }
}

fn session_from_response(value: Value) -> Result<Session, AuthError> {
    let parsed: SignInResponse =
        serde_json::from_value(value).map_err(|error| AuthError::Malformed(error.to_string()))?;
    Ok(Session {
        uid: parsed.local_id,
        email: parsed.email,
    })
}

fn provider_error_message(body: &Value) -> Option<String> {
    body.get("error")?
        .get("message")?
        .as_str()
        .map(|message| message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn session_parses_from_sign_in_response() {
        let value = json!({
            "localId": "abc123",
            "email": "a@x.com",
            "idToken": "opaque",
        });
        let session = session_from_response(value).expect("session");
        assert_eq!(session.uid, "abc123");
        assert_eq!(session.email.as_deref(), Some("a@x.com"));
    }

    #[test]
    fn session_tolerates_missing_email() {
        let value = json!({ "localId": "abc123" });
        let session = session_from_response(value).expect("session");
        assert_eq!(session.email, None);
    }

    #[test]
    fn missing_uid_is_malformed() {
        let value = json!({ "email": "a@x.com" });
        assert!(matches!(
            session_from_response(value),
            Err(AuthError::Malformed(_))
        ));
    }

    #[test]
    fn provider_error_message_is_extracted_verbatim() {
        let body = json!({
            "error": { "code": 400, "message": "EMAIL_NOT_FOUND" }
        });
        assert_eq!(
            provider_error_message(&body).as_deref(),
            Some("EMAIL_NOT_FOUND")
        );
        assert_eq!(provider_error_message(&json!({})), None);
    }
}
