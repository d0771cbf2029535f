//! Admin dashboard aggregates.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;
use yearbook_shared::constants::{
    ACTIVE_USER_WINDOW_DAYS, LEADERBOARD_SIZE, SCORE_COMMENT_WEIGHT, SCORE_LIKE_WEIGHT,
    SCORE_VIEW_WEIGHT,
};
use yearbook_shared::{ReportStatus, Role};

use crate::database::Database;
use crate::error::Result;
use crate::keys;
use crate::models::{Comment, Favorite, Like, Report, Upload, User};
use crate::session::Session;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleBreakdown {
    pub users: usize,
    pub moderators: usize,
    pub admins: usize,
    pub superadmins: usize,
}

impl RoleBreakdown {
    fn count(&mut self, role: Role) {
        match role {
            Role::User => self.users += 1,
            Role::Moderator => self.moderators += 1,
            Role::Admin => self.admins += 1,
            Role::Superadmin => self.superadmins += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploaderRank {
    pub user_id: Uuid,
    pub username: String,
    pub uploads: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRank {
    pub upload_id: Uuid,
    pub school_name: String,
    pub likes: u64,
    pub comments: usize,
    pub views: u64,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub total_users: usize,
    pub total_uploads: usize,
    pub public_uploads: usize,
    pub private_uploads: usize,
    /// Users with at least one upload in the last 30 days.
    pub active_users: usize,
    pub total_reports: usize,
    pub pending_reports: usize,
    pub reviewed_reports: usize,
    pub total_likes: usize,
    pub total_comments: usize,
    pub total_favorites: usize,
    pub total_views: u64,
    pub roles: RoleBreakdown,
    pub top_uploaders: Vec<UploaderRank>,
    pub top_posts: Vec<PostRank>,
}

/// Weighted popularity used for the top-posts leaderboard.
pub fn popularity_score(likes: u64, comments: usize, views: u64) -> f64 {
    likes as f64 * SCORE_LIKE_WEIGHT
        + comments as f64 * SCORE_COMMENT_WEIGHT
        + views as f64 * SCORE_VIEW_WEIGHT
}

fn top_uploaders(users: &[User], uploads: &[Upload], n: usize) -> Vec<UploaderRank> {
    let mut ranks: Vec<UploaderRank> = users
        .iter()
        .map(|user| UploaderRank {
            user_id: user.id,
            username: user.username.clone(),
            uploads: uploads.iter().filter(|u| u.is_owned_by(user.id)).count(),
        })
        .filter(|r| r.uploads > 0)
        .collect();
    ranks.sort_by(|a, b| b.uploads.cmp(&a.uploads));
    ranks.truncate(n);
    ranks
}

fn top_posts(uploads: &[Upload], comments: &[Comment], n: usize) -> Vec<PostRank> {
    let mut ranks: Vec<PostRank> = uploads
        .iter()
        .map(|upload| {
            let comment_count = comments.iter().filter(|c| c.upload_id == upload.id).count();
            PostRank {
                upload_id: upload.id,
                school_name: upload.school_name.clone(),
                likes: upload.like_count,
                comments: comment_count,
                views: upload.view_count,
                score: popularity_score(upload.like_count, comment_count, upload.view_count),
            }
        })
        .collect();
    ranks.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranks.truncate(n);
    ranks
}

impl Database {
    pub fn admin_stats(&self, session: &Session) -> Result<AdminStats> {
        self.admin_stats_at(session, Utc::now())
    }

    /// Compute the dashboard as of `now`. Admins only.
    pub fn admin_stats_at(&self, session: &Session, now: DateTime<Utc>) -> Result<AdminStats> {
        self.require_admin(session)?;

        let users: Vec<User> = self.load(keys::USERS);
        let uploads: Vec<Upload> = self.load(keys::UPLOADS);
        let reports: Vec<Report> = self.load(keys::REPORTS);
        let likes: Vec<Like> = self.load(keys::LIKES);
        let comments: Vec<Comment> = self.load(keys::COMMENTS);
        let favorites: Vec<Favorite> = self.load(keys::FAVORITES);

        let since = now - Duration::days(ACTIVE_USER_WINDOW_DAYS);
        let active_users = users
            .iter()
            .filter(|user| {
                uploads
                    .iter()
                    .any(|u| u.is_owned_by(user.id) && u.uploaded_at >= since)
            })
            .count();

        let private_uploads = uploads.iter().filter(|u| u.is_private).count();
        let pending_reports = reports
            .iter()
            .filter(|r| r.status == ReportStatus::Pending)
            .count();

        let mut roles = RoleBreakdown::default();
        for user in &users {
            roles.count(user.role);
        }

        Ok(AdminStats {
            total_users: users.len(),
            total_uploads: uploads.len(),
            public_uploads: uploads.len() - private_uploads,
            private_uploads,
            active_users,
            total_reports: reports.len(),
            pending_reports,
            reviewed_reports: reports.len() - pending_reports,
            total_likes: likes.len(),
            total_comments: comments.len(),
            total_favorites: favorites.len(),
            total_views: uploads.iter().map(|u| u.view_count).sum(),
            roles,
            top_uploaders: top_uploaders(&users, &uploads, LEADERBOARD_SIZE),
            top_posts: top_posts(&uploads, &comments, LEADERBOARD_SIZE),
        })
    }
}
