use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::ANONYMOUS;
use crate::error::ParseError;

/// Who performed an action: a registered user or an anonymous visitor.
///
/// Persisted as the user's UUID string, or `"anonymous"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Actor {
    User(Uuid),
    Anonymous,
}

impl Actor {
    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            Actor::User(id) => Some(*id),
            Actor::Anonymous => None,
        }
    }

    pub fn is(&self, user_id: Uuid) -> bool {
        self.user_id() == Some(user_id)
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Actor::User(id) => write!(f, "{id}"),
            Actor::Anonymous => f.write_str(ANONYMOUS),
        }
    }
}

impl FromStr for Actor {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == ANONYMOUS {
            return Ok(Actor::Anonymous);
        }
        Uuid::parse_str(s)
            .map(Actor::User)
            .map_err(|_| ParseError::Actor(s.to_string()))
    }
}

impl TryFrom<String> for Actor {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Actor> for String {
    fn from(actor: Actor) -> Self {
        actor.to_string()
    }
}

impl From<Uuid> for Actor {
    fn from(id: Uuid) -> Self {
        Actor::User(id)
    }
}

/// Why a post was reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportReason {
    Inappropriate,
    Spam,
    Copyright,
    Privacy,
    Harassment,
    Other,
}

impl ReportReason {
    pub const ALL: [ReportReason; 6] = [
        ReportReason::Inappropriate,
        ReportReason::Spam,
        ReportReason::Copyright,
        ReportReason::Privacy,
        ReportReason::Harassment,
        ReportReason::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportReason::Inappropriate => "inappropriate",
            ReportReason::Spam => "spam",
            ReportReason::Copyright => "copyright",
            ReportReason::Privacy => "privacy",
            ReportReason::Harassment => "harassment",
            ReportReason::Other => "other",
        }
    }

    /// Human readable label, e.g. `Copyright`.
    pub fn label(&self) -> &'static str {
        match self {
            ReportReason::Inappropriate => "Inappropriate",
            ReportReason::Spam => "Spam",
            ReportReason::Copyright => "Copyright",
            ReportReason::Privacy => "Privacy",
            ReportReason::Harassment => "Harassment",
            ReportReason::Other => "Other",
        }
    }
}

impl fmt::Display for ReportReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportReason {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        ReportReason::ALL
            .into_iter()
            .find(|r| r.as_str() == needle)
            .ok_or_else(|| ParseError::ReportReason(s.to_string()))
    }
}

/// Moderation state of a report. Reports are never physically deleted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    #[default]
    Pending,
    Reviewed,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::Reviewed => "reviewed",
        }
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(ReportStatus::Pending),
            "reviewed" => Ok(ReportStatus::Reviewed),
            _ => Err(ParseError::ReportStatus(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actor_serializes_as_plain_string() {
        let id = Uuid::new_v4();
        let json = serde_json::to_string(&Actor::User(id)).unwrap();
        assert_eq!(json, format!("\"{id}\""));

        let anon = serde_json::to_string(&Actor::Anonymous).unwrap();
        assert_eq!(anon, "\"anonymous\"");

        let back: Actor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Actor::User(id));
    }

    #[test]
    fn actor_rejects_garbage() {
        assert!("not-a-uuid".parse::<Actor>().is_err());
        assert!(serde_json::from_str::<Actor>("\"1700000000000\"").is_err());
    }

    #[test]
    fn report_reason_parsing_is_case_insensitive() {
        assert_eq!("SPAM".parse::<ReportReason>().unwrap(), ReportReason::Spam);
        assert_eq!(ReportReason::Copyright.label(), "Copyright");
        assert!("rude".parse::<ReportReason>().is_err());
    }

    #[test]
    fn report_status_round_trips_lowercase() {
        let json = serde_json::to_string(&ReportStatus::Reviewed).unwrap();
        assert_eq!(json, "\"reviewed\"");
        assert_eq!("Pending".parse::<ReportStatus>().unwrap(), ReportStatus::Pending);
    }
}
