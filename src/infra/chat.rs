use crate::domain::ChatMode;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("chat endpoint unreachable: {0}")]
    Transport(String),

    #[error("chat endpoint returned status {0}")]
    Status(u16),

    #[error("chat endpoint returned an unexpected body: {0}")]
    Malformed(String),
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    response: String,
}

/// Client for the remote completion endpoint: a single `POST` carrying
/// `msg`, `username` and `mode`. The call has no timeout; it waits until
/// the transport settles.
#[derive(Clone, Debug)]
pub struct ChatClient {
    agent: ureq::Agent,
    endpoint: String,
}

impl ChatClient {
    pub fn new(endpoint: String) -> Self {
        let config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build();
        Self {
            agent: config.into(),
            endpoint,
        }
    }

    pub fn from_env() -> Self {
        Self::new(super::resolve_chat_endpoint())
    }

    pub fn request_reply(
        &self,
        msg: &str,
        username: &str,
        mode: ChatMode,
    ) -> Result<String, ChatError> {
        let mut response = self
            .agent
            .post(&self.endpoint)
            .send_form([("msg", msg), ("username", username), ("mode", mode.wire())])
            .map_err(|error| ChatError::Transport(error.to_string()))?;

        if !response.status().is_success() {
            return Err(ChatError::Status(response.status().as_u16()));
        }

        let reply: ChatReply = response
            .body_mut()
            .read_json()
            .map_err(|error| ChatError::Malformed(error.to_string()))?;

        Ok(reply.response)
    }
}
