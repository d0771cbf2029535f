//! The caller's identity, passed explicitly into every repository call.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use yearbook_shared::Actor;

use crate::models::PublicUser;

/// Who is making a call. Anonymous by default.
///
/// The profile carried here is a snapshot taken at login; permission checks
/// re-read the stored user so a role change takes effect immediately.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    user: Option<PublicUser>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn for_user(user: PublicUser) -> Self {
        Self { user: Some(user) }
    }

    pub fn user(&self) -> Option<&PublicUser> {
        self.user.as_ref()
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.user.as_ref().map(|u| u.id)
    }

    pub fn actor(&self) -> Actor {
        self.user_id().map(Actor::User).unwrap_or(Actor::Anonymous)
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

impl From<PublicUser> for Session {
    fn from(user: PublicUser) -> Self {
        Self::for_user(user)
    }
}
