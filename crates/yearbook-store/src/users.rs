//! Accounts, login state and role administration.

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;
use yearbook_shared::validation::{
    password_message, username_message, validate_email, validate_password, validate_username,
};
use yearbook_shared::{Actor, Role};

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::keys;
use crate::models::{Comment, Favorite, Like, PublicUser, Upload, User};
use crate::session::Session;

/// What a user deletion removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedUserSummary {
    pub uploads: usize,
    pub favorites: usize,
    pub likes: usize,
    pub comments: usize,
}

impl Database {
    // ------------------------------------------------------------------
    // Registration and login
    // ------------------------------------------------------------------

    /// Create a new account with role `User`, or `Superadmin` for the
    /// configured primary admin email.
    pub fn register(&self, username: &str, email: &str, password: &str) -> Result<PublicUser> {
        let username = username.trim();
        let email = email.trim();

        if !validate_username(username) {
            return Err(StoreError::validation(username_message()));
        }
        if !validate_email(email) {
            return Err(StoreError::validation("Invalid email address"));
        }
        if !validate_password(password) {
            return Err(StoreError::validation(password_message()));
        }

        let mut users: Vec<User> = self.load(keys::USERS);
        let taken = users
            .iter()
            .any(|u| u.email.eq_ignore_ascii_case(email) || u.username == username);
        if taken {
            return Err(StoreError::Duplicate("User already exists".into()));
        }

        let role = if self.config().is_primary_admin_email(email) {
            Role::Superadmin
        } else {
            Role::User
        };

        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            role,
            created_at: Utc::now(),
            password_reset_at: None,
            role_updated_at: None,
            role_updated_by: None,
        };
        let public = user.public();
        users.push(user);
        self.save(keys::USERS, &users)?;

        info!(user_id = %public.id, username = %public.username, role = %role, "registered user");
        Ok(public)
    }

    /// Check credentials and persist the profile as the current user.
    pub fn login(&self, email: &str, password: &str) -> Result<Session> {
        let email = email.trim();
        let users: Vec<User> = self.load(keys::USERS);

        // Plain comparison: stored passwords are not hashed.
        let user = users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email) && u.password == password)
            .ok_or(StoreError::InvalidCredentials)?;

        let public = user.public();
        self.set(keys::CURRENT_USER, &public)?;
        Ok(Session::for_user(public))
    }

    pub fn logout(&self) -> Result<()> {
        self.remove(keys::CURRENT_USER)?;
        Ok(())
    }

    /// Rebuild the session from the persisted current user, refreshing its
    /// role. A profile whose account no longer exists is discarded.
    pub fn restore_session(&self) -> Result<Session> {
        let Some(saved) = self.get_opt::<PublicUser>(keys::CURRENT_USER) else {
            return Ok(Session::anonymous());
        };

        match self.get_user(saved.id) {
            Some(user) => Ok(Session::for_user(user.public())),
            None => {
                warn!(user_id = %saved.id, "stale current user, logging out");
                self.logout()?;
                Ok(Session::anonymous())
            }
        }
    }

    pub fn reset_password(&self, email: &str, new_password: &str, confirm: &str) -> Result<()> {
        if new_password != confirm {
            return Err(StoreError::validation("Passwords do not match"));
        }
        if !validate_password(new_password) {
            return Err(StoreError::validation(password_message()));
        }

        let email = email.trim();
        let mut users: Vec<User> = self.load(keys::USERS);
        let user = users
            .iter_mut()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .ok_or(StoreError::NotFound("User"))?;

        user.password = new_password.to_string();
        user.password_reset_at = Some(Utc::now());
        self.save(keys::USERS, &users)
    }

    // ------------------------------------------------------------------
    // Lookups
    // ------------------------------------------------------------------

    pub fn list_users(&self) -> Vec<PublicUser> {
        self.load::<User>(keys::USERS)
            .iter()
            .map(User::public)
            .collect()
    }

    pub fn get_user(&self, id: Uuid) -> Option<User> {
        self.load::<User>(keys::USERS)
            .into_iter()
            .find(|u| u.id == id)
    }

    pub fn find_user_by_username(&self, username: &str) -> Option<User> {
        self.load::<User>(keys::USERS)
            .into_iter()
            .find(|u| u.username == username)
    }

    /// Ids of users whose username contains `needle`, case-insensitively.
    pub fn user_ids_matching(&self, needle: &str) -> Vec<Uuid> {
        let needle = needle.trim().to_lowercase();
        self.load::<User>(keys::USERS)
            .iter()
            .filter(|u| u.username.to_lowercase().contains(&needle))
            .map(|u| u.id)
            .collect()
    }

    /// Display name for an actor, `"Anonymous"` when unknown.
    pub fn display_name(&self, actor: &Actor) -> String {
        actor
            .user_id()
            .and_then(|id| self.get_user(id))
            .map(|u| u.username)
            .unwrap_or_else(|| yearbook_shared::constants::ANONYMOUS_USERNAME.to_string())
    }

    // ------------------------------------------------------------------
    // Permissions
    // ------------------------------------------------------------------

    /// The stored account behind `session`, with its current role.
    pub fn current_user(&self, session: &Session) -> Option<User> {
        session.user_id().and_then(|id| self.get_user(id))
    }

    /// Effective role of the caller, `None` when anonymous or deleted.
    pub fn current_role(&self, session: &Session) -> Option<Role> {
        self.current_user(session).map(|u| u.role)
    }

    /// The caller's stored account, or `Forbidden(message)` when anonymous or
    /// the account has since been deleted.
    pub(crate) fn require_user(&self, session: &Session, message: &str) -> Result<User> {
        self.current_user(session)
            .ok_or_else(|| StoreError::forbidden(message))
    }

    pub(crate) fn require_role(
        &self,
        session: &Session,
        allowed: impl Fn(Role) -> bool,
        message: &str,
    ) -> Result<User> {
        match self.current_user(session) {
            Some(user) if allowed(user.role) => Ok(user),
            _ => Err(StoreError::forbidden(message)),
        }
    }

    pub(crate) fn require_moderator(&self, session: &Session) -> Result<User> {
        self.require_role(session, |r| r.is_moderator(), "Moderator access required")
    }

    pub(crate) fn require_admin(&self, session: &Session) -> Result<User> {
        self.require_role(session, |r| r.is_admin(), "Admin access required")
    }

    // ------------------------------------------------------------------
    // Administration
    // ------------------------------------------------------------------

    pub fn update_user_role(&self, session: &Session, user_id: Uuid, role: Role) -> Result<PublicUser> {
        let acting = self.require_admin(session)?;
        if acting.id == user_id {
            return Err(StoreError::forbidden("You cannot change your own role"));
        }

        let mut users: Vec<User> = self.load(keys::USERS);
        let target = users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or(StoreError::NotFound("User"))?;

        if self.config().is_primary_admin_email(&target.email) && role < Role::Superadmin {
            return Err(StoreError::forbidden("Cannot downgrade the primary admin"));
        }
        if !acting.role.can_assign(target.role, role) {
            return Err(StoreError::forbidden(
                "Only a superadmin can grant or revoke admin rights",
            ));
        }

        let previous = target.role;
        target.role = role;
        target.role_updated_at = Some(Utc::now());
        target.role_updated_by = Some(acting.id);
        let public = target.public();
        self.save(keys::USERS, &users)?;

        info!(
            user_id = %user_id,
            by = %acting.id,
            from = %previous,
            to = %role,
            "role updated"
        );
        Ok(public)
    }

    /// Delete an account and everything it owns except reports.
    pub fn delete_user(&self, session: &Session, user_id: Uuid) -> Result<DeletedUserSummary> {
        let acting = self.require_admin(session)?;
        if acting.id == user_id {
            return Err(StoreError::forbidden("You cannot delete your own account"));
        }

        let target = self.get_user(user_id).ok_or(StoreError::NotFound("User"))?;
        if self.config().is_primary_admin_email(&target.email) {
            return Err(StoreError::forbidden("Cannot delete the primary admin"));
        }
        if !acting.role.can_remove(target.role) {
            return Err(StoreError::forbidden(
                "You do not have permission to delete this user",
            ));
        }

        let summary = self.atomically(|db| {
            let mut summary = DeletedUserSummary::default();

            let mut uploads: Vec<Upload> = db.load(keys::UPLOADS);
            let owned: Vec<Uuid> = uploads
                .iter()
                .filter(|u| u.is_owned_by(user_id))
                .map(|u| u.id)
                .collect();
            uploads.retain(|u| !u.is_owned_by(user_id));
            summary.uploads = owned.len();

            let mut favorites: Vec<Favorite> = db.load(keys::FAVORITES);
            let before = favorites.len();
            favorites.retain(|f| f.user_id != user_id && !owned.contains(&f.upload_id));
            summary.favorites = before - favorites.len();

            let mut likes: Vec<Like> = db.load(keys::LIKES);
            let before = likes.len();
            likes.retain(|l| l.user_id != user_id && !owned.contains(&l.upload_id));
            summary.likes = before - likes.len();

            for upload in uploads.iter_mut() {
                upload.like_count = likes.iter().filter(|l| l.upload_id == upload.id).count() as u64;
            }

            let mut comments: Vec<Comment> = db.load(keys::COMMENTS);
            let before = comments.len();
            comments.retain(|c| c.user_id != user_id);
            summary.comments = before - comments.len();

            let mut users: Vec<User> = db.load(keys::USERS);
            users.retain(|u| u.id != user_id);

            db.save(keys::UPLOADS, &uploads)?;
            db.save(keys::FAVORITES, &favorites)?;
            db.save(keys::LIKES, &likes)?;
            db.save(keys::COMMENTS, &comments)?;
            db.save(keys::USERS, &users)?;
            Ok(summary)
        })?;

        info!(
            user_id = %user_id,
            by = %acting.id,
            uploads = summary.uploads,
            favorites = summary.favorites,
            likes = summary.likes,
            comments = summary.comments,
            "user deleted"
        );
        Ok(summary)
    }

    /// Make sure an existing account with the primary admin email holds the
    /// superadmin role. Runs at every open; a no-op once applied.
    pub(crate) fn seed_primary_admin(&self) -> Result<()> {
        let mut users: Vec<User> = self.load(keys::USERS);
        let Some(admin) = users
            .iter_mut()
            .find(|u| self.config().is_primary_admin_email(&u.email))
        else {
            return Ok(());
        };
        if admin.role == Role::Superadmin {
            return Ok(());
        }

        info!(user_id = %admin.id, from = %admin.role, "promoting primary admin to superadmin");
        admin.role = Role::Superadmin;
        admin.role_updated_at = Some(Utc::now());
        self.save(keys::USERS, &users)
    }
}
