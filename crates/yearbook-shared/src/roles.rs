//! Capability tiers and the pure permission rules built on them.
//!
//! Tiers are totally ordered: `User < Moderator < Admin < Superadmin`.
//! The legacy "primary admin" email is not special-cased here; the store
//! seeds that account as a superadmin instead.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Moderator,
    Admin,
    Superadmin,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::User, Role::Moderator, Role::Admin, Role::Superadmin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
            Role::Superadmin => "superadmin",
        }
    }

    /// Can triage reports, delete any post or comment.
    pub fn is_moderator(&self) -> bool {
        *self >= Role::Moderator
    }

    /// Can manage users and view the admin dashboard.
    pub fn is_admin(&self) -> bool {
        *self >= Role::Admin
    }

    pub fn is_superadmin(&self) -> bool {
        *self == Role::Superadmin
    }

    /// Whether a holder of `self` may move a user from `current` to `new`.
    ///
    /// Admins may promote or demote between user and moderator. Anything that
    /// touches the admin tiers, on either side, needs a superadmin.
    pub fn can_assign(&self, current: Role, new: Role) -> bool {
        if !self.is_admin() {
            return false;
        }
        if current.is_admin() || new.is_admin() {
            return self.is_superadmin();
        }
        true
    }

    /// Whether a holder of `self` may delete an account holding `target`.
    pub fn can_remove(&self, target: Role) -> bool {
        self.is_admin() && (self.is_superadmin() || target < *self)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == needle)
            .ok_or_else(|| ParseError::Role(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_are_ordered() {
        assert!(Role::User < Role::Moderator);
        assert!(Role::Moderator < Role::Admin);
        assert!(Role::Admin < Role::Superadmin);
        assert!(Role::Superadmin.is_moderator());
        assert!(!Role::Moderator.is_admin());
    }

    #[test]
    fn admins_only_touch_lower_tiers() {
        assert!(Role::Admin.can_assign(Role::User, Role::Moderator));
        assert!(Role::Admin.can_assign(Role::Moderator, Role::User));
        assert!(!Role::Admin.can_assign(Role::User, Role::Admin));
        assert!(!Role::Admin.can_assign(Role::Admin, Role::User));
        assert!(Role::Superadmin.can_assign(Role::Admin, Role::User));
        assert!(!Role::Moderator.can_assign(Role::User, Role::Moderator));
    }

    #[test]
    fn removal_needs_a_higher_tier() {
        assert!(Role::Admin.can_remove(Role::Moderator));
        assert!(!Role::Admin.can_remove(Role::Admin));
        assert!(Role::Superadmin.can_remove(Role::Admin));
        assert!(!Role::User.can_remove(Role::User));
    }

    #[test]
    fn parses_and_serializes_lowercase() {
        assert_eq!("SuperAdmin".parse::<Role>().unwrap(), Role::Superadmin);
        assert_eq!(serde_json::to_string(&Role::Moderator).unwrap(), "\"moderator\"");
        assert!("root".parse::<Role>().is_err());
    }
}
