use std::time::SystemTime;

/// Signed-in identity as issued by the external provider.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Session {
    pub uid: String,
    pub email: Option<String>,
}

impl Session {
    /// Username forwarded to the chat endpoint: the account email when the
    /// provider returned one, else the fixed fallback.
    pub fn chat_username(&self) -> &str {
        self.email.as_deref().unwrap_or(FALLBACK_USERNAME)
    }
}

pub const FALLBACK_USERNAME: &str = "guest";

/// Response style forwarded to the chat endpoint.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ChatMode {
    Friend,
    Therapist,
}

impl ChatMode {
    pub fn toggle(self) -> Self {
        match self {
            Self::Friend => Self::Therapist,
            Self::Therapist => Self::Friend,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Friend => "Friend",
            Self::Therapist => "Therapist",
        }
    }

    /// Value sent in the `mode` form field.
    pub fn wire(self) -> &'static str {
        match self {
            Self::Friend => "friend",
            Self::Therapist => "therapist",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
}

/// One journal entry as held by the document store.
///
/// Timestamps are store-assigned; a `None` means the value has not been
/// materialized yet (write still in flight, or a row predating the column)
/// and renders as "Just now".
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct JournalNote {
    pub id: String,
    pub uid: String,
    pub text: String,
    pub created_at: Option<SystemTime>,
    pub updated_at: Option<SystemTime>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_username_falls_back_to_guest() {
        let with_email = Session {
            uid: "u1".to_string(),
            email: Some("a@x.com".to_string()),
        };
        assert_eq!(with_email.chat_username(), "a@x.com");

        let without_email = Session {
            uid: "u2".to_string(),
            email: None,
        };
        assert_eq!(without_email.chat_username(), "guest");
    }

    #[test]
    fn chat_mode_toggles_between_both_wire_values() {
        let mode = ChatMode::Friend;
        assert_eq!(mode.wire(), "friend");
        assert_eq!(mode.toggle().wire(), "therapist");
        assert_eq!(mode.toggle().toggle(), mode);
    }
}
