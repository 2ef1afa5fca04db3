use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Sent,
    Received,
}

/// A message as displayed in the message list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageView {
    /// Empty for messages sent by the local user
    pub sender: String,
    pub text: String,
    pub direction: Direction,
    pub displayed_at: DateTime<Utc>,
}

impl MessageView {
    pub fn new(text: impl Into<String>, sender: impl Into<String>, direction: Direction) -> Self {
        Self {
            sender: sender.into(),
            text: text.into(),
            direction,
            displayed_at: Utc::now(),
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self.direction {
            Direction::Sent => "message sent",
            Direction::Received => "message received",
        }
    }

    pub fn is_received(&self) -> bool {
        self.direction == Direction::Received
    }
}
