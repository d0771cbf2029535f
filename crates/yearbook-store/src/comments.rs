use chrono::Utc;
use tracing::info;
use uuid::Uuid;
use yearbook_shared::constants::MAX_COMMENT_LENGTH;
use yearbook_shared::sanitize::escape_html;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::keys;
use crate::models::Comment;
use crate::session::Session;

impl Database {
    /// Add a comment. The text is HTML-escaped before it is stored, so it is
    /// safe to render as markup.
    pub fn add_comment(&self, session: &Session, upload_id: Uuid, text: &str) -> Result<Comment> {
        let author = self.require_user(session, "Please log in to comment")?;
        let text = text.trim();
        if text.is_empty() {
            return Err(StoreError::validation("Please enter a comment"));
        }
        if text.chars().count() > MAX_COMMENT_LENGTH {
            return Err(StoreError::validation(format!(
                "Comment must be {MAX_COMMENT_LENGTH} characters or less"
            )));
        }
        self.get_upload(session, upload_id)?;

        let comment = Comment {
            id: Uuid::new_v4(),
            upload_id,
            user_id: author.id,
            username: author.username,
            text: escape_html(text),
            created_at: Utc::now(),
        };

        let mut comments: Vec<Comment> = self.load(keys::COMMENTS);
        comments.push(comment.clone());
        self.save(keys::COMMENTS, &comments)?;
        Ok(comment)
    }

    /// Comments on an upload, oldest first.
    pub fn comments_for(&self, upload_id: Uuid) -> Vec<Comment> {
        let mut comments: Vec<Comment> = self
            .load::<Comment>(keys::COMMENTS)
            .into_iter()
            .filter(|c| c.upload_id == upload_id)
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        comments
    }

    pub fn delete_comment(&self, session: &Session, id: Uuid) -> Result<()> {
        let user = self.require_user(session, "Please log in to delete comments")?;

        let mut comments: Vec<Comment> = self.load(keys::COMMENTS);
        let comment = comments
            .iter()
            .find(|c| c.id == id)
            .ok_or(StoreError::NotFound("Comment"))?;

        if comment.user_id != user.id && !user.role.is_moderator() {
            return Err(StoreError::forbidden("You can only delete your own comments"));
        }

        comments.retain(|c| c.id != id);
        self.save(keys::COMMENTS, &comments)?;
        info!(comment_id = %id, by = %user.id, "comment deleted");
        Ok(())
    }
}
