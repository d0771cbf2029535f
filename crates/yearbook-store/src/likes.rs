use chrono::Utc;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::keys;
use crate::models::{Like, Upload};
use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeOutcome {
    pub liked: bool,
    pub like_count: u64,
}

impl Database {
    /// Like or unlike. The like rows and the upload's counter are written in
    /// one transaction, and the counter is recomputed from the rows.
    pub fn toggle_like(&self, session: &Session, upload_id: Uuid) -> Result<LikeOutcome> {
        let user_id = self.require_user(session, "Please log in to like posts")?.id;
        self.get_upload(session, upload_id)?;

        let outcome = self.atomically(|db| {
            let mut likes: Vec<Like> = db.load(keys::LIKES);
            let existing = likes
                .iter()
                .position(|l| l.upload_id == upload_id && l.user_id == user_id);

            let liked = match existing {
                Some(index) => {
                    likes.remove(index);
                    false
                }
                None => {
                    likes.push(Like {
                        upload_id,
                        user_id,
                        liked_at: Utc::now(),
                    });
                    true
                }
            };
            let like_count = likes.iter().filter(|l| l.upload_id == upload_id).count() as u64;

            let mut uploads: Vec<Upload> = db.load(keys::UPLOADS);
            let upload = uploads
                .iter_mut()
                .find(|u| u.id == upload_id)
                .ok_or(StoreError::NotFound("Upload"))?;
            upload.like_count = like_count;

            db.save(keys::LIKES, &likes)?;
            db.save(keys::UPLOADS, &uploads)?;
            Ok(LikeOutcome { liked, like_count })
        })?;

        debug!(upload_id = %upload_id, user_id = %user_id, liked = outcome.liked, "like toggled");
        Ok(outcome)
    }

    pub fn is_liked(&self, session: &Session, upload_id: Uuid) -> bool {
        let Some(user_id) = session.user_id() else {
            return false;
        };
        self.load::<Like>(keys::LIKES)
            .iter()
            .any(|l| l.upload_id == upload_id && l.user_id == user_id)
    }

    pub fn likes_for(&self, upload_id: Uuid) -> Vec<Like> {
        self.load::<Like>(keys::LIKES)
            .into_iter()
            .filter(|l| l.upload_id == upload_id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UploadDraft;
    use crate::test_support::{db, login_as, sample_draft};

    #[test]
    fn toggle_twice_restores_state() {
        let db = db();
        let alice = login_as(&db, "alice");
        let bob = login_as(&db, "bob");
        let post = db.create_upload(&alice, sample_draft("Oak High")).unwrap();

        assert_eq!(
            db.toggle_like(&bob, post.id).unwrap(),
            LikeOutcome { liked: true, like_count: 1 }
        );
        assert!(db.is_liked(&bob, post.id));
        assert_eq!(db.toggle_like(&alice, post.id).unwrap().like_count, 2);

        assert_eq!(
            db.toggle_like(&bob, post.id).unwrap(),
            LikeOutcome { liked: false, like_count: 1 }
        );
        assert_eq!(db.find_upload(post.id).unwrap().like_count, 1);
        assert_eq!(db.likes_for(post.id).len(), 1);
    }

    #[test]
    fn anonymous_cannot_like() {
        let db = db();
        let alice = login_as(&db, "alice");
        let post = db.create_upload(&alice, sample_draft("Oak High")).unwrap();
        let err = db.toggle_like(&Session::anonymous(), post.id).unwrap_err();
        assert_eq!(err.to_string(), "Please log in to like posts");
    }

    #[test]
    fn private_post_of_someone_else_cannot_be_liked() {
        let db = db();
        let alice = login_as(&db, "alice");
        let bob = login_as(&db, "bob");
        let post = db
            .create_upload(&alice, UploadDraft { is_private: true, ..sample_draft("Oak") })
            .unwrap();

        assert!(matches!(
            db.toggle_like(&bob, post.id).unwrap_err(),
            StoreError::Forbidden(_)
        ));
        assert!(db.toggle_like(&alice, post.id).unwrap().liked);
    }
}
