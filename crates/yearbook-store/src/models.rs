//! Domain records persisted in the key-value store.
//!
//! Every struct serialises with camelCase field names, which is the layout of
//! the JSON arrays under the keys in [`crate::keys`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use yearbook_shared::validation::SchoolData;
use yearbook_shared::{Actor, ReportReason, ReportStatus, Role};

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A registered account.
///
/// The password is kept in plain text, as the site always did. This is a
/// known defect of the data model, not a property to rely on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    /// 3-20 characters of `[A-Za-z0-9_]`, unique (case-sensitive).
    pub username: String,
    /// Unique, compared case-insensitively.
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_reset_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_updated_by: Option<Uuid>,
}

impl User {
    pub fn public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            role: self.role,
            created_at: self.created_at,
        }
    }
}

/// A user profile with the password stripped, safe to hand to the UI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Upload
// ---------------------------------------------------------------------------

/// A posted yearbook photo ("memory"). The image is embedded as a data URI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Upload {
    pub id: Uuid,
    pub school_name: String,
    pub city: String,
    pub country: String,
    pub year: i32,
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub image_url: String,
    pub uploaded_at: DateTime<Utc>,
    pub uploaded_by: Actor,
    #[serde(default)]
    pub view_count: u64,
    /// Mirrors the number of [`Like`] rows for this upload.
    #[serde(default)]
    pub like_count: u64,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Upload {
    /// Private uploads are visible to their owner only.
    pub fn is_visible_to(&self, viewer: &Actor) -> bool {
        if !self.is_private {
            return true;
        }
        matches!(viewer, Actor::User(_)) && self.uploaded_by == *viewer
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.uploaded_by.is(user_id)
    }

    /// `"City, Country"`, used for location sorting.
    pub fn location(&self) -> String {
        format!("{}, {}", self.city, self.country)
    }

    pub fn school_data(&self) -> SchoolData<'_> {
        SchoolData {
            school_name: &self.school_name,
            city: &self.city,
            country: &self.country,
            year: self.year,
            image_url: &self.image_url,
        }
    }
}

/// Create or edit payload for an upload. Edits re-validate the full draft.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UploadDraft {
    pub school_name: String,
    pub city: String,
    pub country: String,
    pub year: i32,
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub image_url: String,
    #[serde(default)]
    pub is_private: bool,
}

impl UploadDraft {
    pub fn school_data(&self) -> SchoolData<'_> {
        SchoolData {
            school_name: &self.school_name,
            city: &self.city,
            country: &self.country,
            year: self.year,
            image_url: &self.image_url,
        }
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// A user-submitted flag against an upload. Never physically deleted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: Uuid,
    /// May dangle once the upload is deleted.
    pub upload_id: Uuid,
    pub reason: ReportReason,
    #[serde(default)]
    pub description: String,
    pub reported_by: Actor,
    pub reported_by_username: String,
    pub reported_at: DateTime<Utc>,
    #[serde(default)]
    pub status: ReportStatus,
    #[serde(default)]
    pub reviewed_by: Option<Uuid>,
    #[serde(default)]
    pub reviewed_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Favorite / Like
// ---------------------------------------------------------------------------

/// Private per-user bookmark. At most one per (upload, user).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    pub upload_id: Uuid,
    pub user_id: Uuid,
    pub added_at: DateTime<Utc>,
}

/// At most one per (upload, user).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    pub upload_id: Uuid,
    pub user_id: Uuid,
    pub liked_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Comment
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub upload_id: Uuid,
    pub user_id: Uuid,
    /// Snapshot taken when the comment was written.
    pub username: String,
    /// HTML-escaped at write time.
    pub text: String,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Notification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    NewReport,
}

/// Moderator notification raised by a report. Its id is the report id.
///
/// Read state is not stored here; it is membership of the id in the
/// separate read-id list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub report_id: Uuid,
    pub upload_id: Uuid,
    pub title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(owner: Actor, is_private: bool) -> Upload {
        Upload {
            id: Uuid::new_v4(),
            school_name: "Oak".into(),
            city: "Springfield".into(),
            country: "US".into(),
            year: 2020,
            grade: None,
            description: None,
            tags: vec![],
            image_url: String::new(),
            uploaded_at: Utc::now(),
            uploaded_by: owner,
            view_count: 0,
            like_count: 0,
            is_private,
            updated_at: None,
        }
    }

    #[test]
    fn private_upload_visible_to_owner_only() {
        let owner = Uuid::new_v4();
        let u = upload(Actor::User(owner), true);
        assert!(u.is_visible_to(&Actor::User(owner)));
        assert!(!u.is_visible_to(&Actor::User(Uuid::new_v4())));
        assert!(!u.is_visible_to(&Actor::Anonymous));

        let anon_private = upload(Actor::Anonymous, true);
        assert!(!anon_private.is_visible_to(&Actor::Anonymous));
    }

    #[test]
    fn upload_json_uses_camel_case() {
        let u = upload(Actor::Anonymous, false);
        let json = serde_json::to_value(&u).unwrap();
        assert_eq!(json["schoolName"], "Oak");
        assert_eq!(json["uploadedBy"], "anonymous");
        assert_eq!(json["likeCount"], 0);
        assert_eq!(json["isPrivate"], false);
    }

    #[test]
    fn public_user_drops_password() {
        let user = User {
            id: Uuid::new_v4(),
            username: "alice".into(),
            email: "alice@x.com".into(),
            password: "secret1".into(),
            role: Role::User,
            created_at: Utc::now(),
            password_reset_at: None,
            role_updated_at: None,
            role_updated_by: None,
        };
        let json = serde_json::to_value(user.public()).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["username"], "alice");
    }
}
