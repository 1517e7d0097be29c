//! Wire and transcript types shared by the gateway and its clients.

use serde::{Deserialize, Serialize};

use crate::error::{GatewayError, Result};

/// A single user submission to `/ask`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl GenerationRequest {
    /// Build a request, rejecting prompts that are blank after trimming.
    pub fn new(prompt: impl Into<String>, location: Option<String>) -> Result<Self> {
        let request = Self {
            prompt: prompt.into(),
            location,
        };
        request.validate()?;
        Ok(request)
    }

    pub fn validate(&self) -> Result<()> {
        if self.prompt.trim().is_empty() {
            return Err(GatewayError::InvalidRequest(
                "prompt must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// The location name, if one was given and is not blank.
    pub fn location(&self) -> Option<&str> {
        self.location
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

/// Text extracted from one upstream generation record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamDelta {
    pub text: String,
}

/// Transcript entry author
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Transcript entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConversationMessage {
    pub role: Role,
    pub content: String,
}

impl ConversationMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Empty assistant placeholder, filled in as the answer streams.
    pub fn assistant_placeholder() -> Self {
        Self {
            role: Role::Assistant,
            content: String::new(),
        }
    }
}
