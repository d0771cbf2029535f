//! Per-user bookmarks.

use chrono::Utc;
use uuid::Uuid;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::keys;
use crate::models::{Favorite, Upload};
use crate::session::Session;

impl Database {
    pub fn add_favorite(&self, session: &Session, upload_id: Uuid) -> Result<Favorite> {
        let user_id = self.require_user(session, "Please log in to save favorites")?.id;
        self.get_upload(session, upload_id)?;

        let mut favorites: Vec<Favorite> = self.load(keys::FAVORITES);
        if favorites
            .iter()
            .any(|f| f.upload_id == upload_id && f.user_id == user_id)
        {
            return Err(StoreError::Duplicate("Already in favorites".into()));
        }

        let favorite = Favorite {
            upload_id,
            user_id,
            added_at: Utc::now(),
        };
        favorites.push(favorite.clone());
        self.save(keys::FAVORITES, &favorites)?;
        Ok(favorite)
    }

    pub fn remove_favorite(&self, session: &Session, upload_id: Uuid) -> Result<()> {
        let user_id = self.require_user(session, "Please log in to save favorites")?.id;

        let mut favorites: Vec<Favorite> = self.load(keys::FAVORITES);
        let before = favorites.len();
        favorites.retain(|f| !(f.upload_id == upload_id && f.user_id == user_id));
        if favorites.len() == before {
            return Err(StoreError::NotFound("Favorite"));
        }
        self.save(keys::FAVORITES, &favorites)
    }

    /// Returns whether the upload is a favorite afterwards.
    pub fn toggle_favorite(&self, session: &Session, upload_id: Uuid) -> Result<bool> {
        if self.is_favorited(session, upload_id) {
            self.remove_favorite(session, upload_id)?;
            Ok(false)
        } else {
            self.add_favorite(session, upload_id)?;
            Ok(true)
        }
    }

    pub fn is_favorited(&self, session: &Session, upload_id: Uuid) -> bool {
        let Some(user_id) = session.user_id() else {
            return false;
        };
        self.load::<Favorite>(keys::FAVORITES)
            .iter()
            .any(|f| f.upload_id == upload_id && f.user_id == user_id)
    }

    /// The caller's favorite rows, in the order they were added.
    pub fn favorites_of(&self, user_id: Uuid) -> Vec<Favorite> {
        self.load::<Favorite>(keys::FAVORITES)
            .into_iter()
            .filter(|f| f.user_id == user_id)
            .collect()
    }

    /// Uploads the caller has favorited, newest favorite first. Favorites of
    /// deleted or now-hidden uploads are skipped.
    pub fn favorite_uploads(&self, session: &Session) -> Result<Vec<Upload>> {
        let user_id = self.require_user(session, "Please log in to view favorites")?.id;
        let viewer = session.actor();
        let uploads: Vec<Upload> = self.load(keys::UPLOADS);

        let mut favorites = self.favorites_of(user_id);
        favorites.sort_by(|a, b| b.added_at.cmp(&a.added_at));

        Ok(favorites
            .iter()
            .filter_map(|f| uploads.iter().find(|u| u.id == f.upload_id))
            .filter(|u| u.is_visible_to(&viewer))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UploadDraft;
    use crate::test_support::{db, login_as, sample_draft};

    #[test]
    fn add_twice_is_rejected_without_mutation() {
        let db = db();
        let alice = login_as(&db, "alice");
        let post = db.create_upload(&alice, sample_draft("Oak High")).unwrap();

        db.add_favorite(&alice, post.id).unwrap();
        let err = db.add_favorite(&alice, post.id).unwrap_err();
        assert_eq!(err.to_string(), "Already in favorites");
        assert_eq!(db.favorites_of(alice.user_id().unwrap()).len(), 1);
    }

    #[test]
    fn toggle_and_remove() {
        let db = db();
        let alice = login_as(&db, "alice");
        let post = db.create_upload(&alice, sample_draft("Oak High")).unwrap();

        assert!(db.toggle_favorite(&alice, post.id).unwrap());
        assert!(db.is_favorited(&alice, post.id));
        assert!(!db.toggle_favorite(&alice, post.id).unwrap());
        assert!(matches!(
            db.remove_favorite(&alice, post.id).unwrap_err(),
            StoreError::NotFound("Favorite")
        ));
        assert!(!db.is_favorited(&Session::anonymous(), post.id));
    }

    #[test]
    fn favorite_list_skips_hidden_and_missing() {
        let db = db();
        let alice = login_as(&db, "alice");
        let bob = login_as(&db, "bob");
        let shown = db.create_upload(&alice, sample_draft("Oak High")).unwrap();
        let hidden = db.create_upload(&alice, sample_draft("Elm High")).unwrap();
        let gone = db.create_upload(&alice, sample_draft("Ash High")).unwrap();

        for id in [shown.id, hidden.id, gone.id] {
            db.add_favorite(&bob, id).unwrap();
        }
        db.update_upload(&alice, hidden.id, UploadDraft { is_private: true, ..sample_draft("Elm High") })
            .unwrap();

        // Simulate a dangling row left by an interrupted cascade.
        let mut uploads: Vec<Upload> = db.load(keys::UPLOADS);
        uploads.retain(|u| u.id != gone.id);
        db.save(keys::UPLOADS, &uploads).unwrap();

        let list = db.favorite_uploads(&bob).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id, shown.id);
    }

    #[test]
    fn cannot_favorite_a_private_post_of_someone_else() {
        let db = db();
        let alice = login_as(&db, "alice");
        let bob = login_as(&db, "bob");
        let post = db
            .create_upload(&alice, UploadDraft { is_private: true, ..sample_draft("Oak") })
            .unwrap();
        assert!(matches!(
            db.add_favorite(&bob, post.id).unwrap_err(),
            StoreError::Forbidden(_)
        ));
    }
}
