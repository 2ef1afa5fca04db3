use serde::{Deserialize, Serialize};

/// Chat frame as it travels over the socket, in both directions
///
/// The JSON shape `{"user": "...", "message": "..."}` is shared with the relay
/// and any other counterpart service, so field names must not change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatFrame {
    pub user: String,
    pub message: String,
}

impl ChatFrame {
    pub fn new(user: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            message: message.into(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Payload of the `messageReceived` event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub sender: String,
    pub text: String,
}

impl ChatMessage {
    pub fn new(sender: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            text: text.into(),
        }
    }
}

impl From<ChatFrame> for ChatMessage {
    fn from(frame: ChatFrame) -> Self {
        Self {
            sender: frame.user,
            text: frame.message,
        }
    }
}

impl From<ChatMessage> for ChatFrame {
    fn from(message: ChatMessage) -> Self {
        Self {
            user: message.sender,
            message: message.text,
        }
    }
}
