use thiserror::Error;

/// Field validation failures, collected rather than failing on the first one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", .messages.join(", "))]
pub struct ValidationError {
    pub messages: Vec<String>,
}

impl ValidationError {
    pub fn single(message: impl Into<String>) -> Self {
        Self {
            messages: vec![message.into()],
        }
    }

    /// Turn a list of collected messages into a result.
    pub fn check(messages: Vec<String>) -> Result<(), Self> {
        if messages.is_empty() {
            Ok(())
        } else {
            Err(Self { messages })
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid actor id: {0}")]
    Actor(String),

    #[error("Unknown role: {0}")]
    Role(String),

    #[error("Unknown report reason: {0}")]
    ReportReason(String),

    #[error("Unknown report status: {0}")]
    ReportStatus(String),

    #[error("Unknown sort order: {0}")]
    SortBy(String),
}
