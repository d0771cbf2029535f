//! Upload lifecycle: create, read, edit, delete.

use chrono::{Datelike, Utc};
use tracing::info;
use uuid::Uuid;
use yearbook_shared::sanitize::normalize_tags;
use yearbook_shared::validation::validate_school_data;
use yearbook_shared::{Actor, ReportStatus};

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::keys;
use crate::models::{Favorite, Like, Report, Upload, UploadDraft};
use crate::rate_limit::RateLimitAction;
use crate::session::Session;

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl Database {
    fn validate_draft(&self, draft: &UploadDraft) -> Result<()> {
        validate_school_data(&draft.school_data(), Utc::now().year())?;
        Ok(())
    }

    pub fn create_upload(&self, session: &Session, draft: UploadDraft) -> Result<Upload> {
        let owner = self.require_user(session, "Please log in to upload")?.id;
        self.validate_draft(&draft)?;
        self.enforce_rate_limit(RateLimitAction::Upload, &Actor::User(owner))?;

        let upload = Upload {
            id: Uuid::new_v4(),
            school_name: draft.school_name.trim().to_string(),
            city: draft.city.trim().to_string(),
            country: draft.country.trim().to_string(),
            year: draft.year,
            grade: trimmed(draft.grade),
            description: trimmed(draft.description),
            tags: normalize_tags(draft.tags),
            image_url: draft.image_url,
            uploaded_at: Utc::now(),
            uploaded_by: Actor::User(owner),
            view_count: 0,
            like_count: 0,
            is_private: draft.is_private,
            updated_at: None,
        };

        let mut uploads: Vec<Upload> = self.load(keys::UPLOADS);
        uploads.push(upload.clone());
        self.save(keys::UPLOADS, &uploads)?;

        info!(upload_id = %upload.id, owner = %owner, private = upload.is_private, "upload created");
        Ok(upload)
    }

    /// Fetch an upload the caller is allowed to see.
    pub fn get_upload(&self, session: &Session, id: Uuid) -> Result<Upload> {
        let upload = self.find_upload(id).ok_or(StoreError::NotFound("Upload"))?;
        if !upload.is_visible_to(&session.actor()) {
            return Err(StoreError::forbidden(
                "This post is private and only visible to the owner.",
            ));
        }
        Ok(upload)
    }

    /// Unchecked lookup, ignoring visibility.
    pub(crate) fn find_upload(&self, id: Uuid) -> Option<Upload> {
        self.load::<Upload>(keys::UPLOADS)
            .into_iter()
            .find(|u| u.id == id)
    }

    /// Owners may always edit; admins may edit anything.
    pub fn can_edit_upload(&self, session: &Session, id: Uuid) -> bool {
        let Some(upload) = self.find_upload(id) else {
            return false;
        };
        let Some(user) = self.current_user(session) else {
            return false;
        };
        upload.is_owned_by(user.id) || user.role.is_admin()
    }

    /// Replace the editable fields. Owner, counters and creation time stay.
    pub fn update_upload(&self, session: &Session, id: Uuid, draft: UploadDraft) -> Result<Upload> {
        self.require_user(session, "Please log in to edit posts")?;
        if self.find_upload(id).is_none() {
            return Err(StoreError::NotFound("Upload"));
        }
        if !self.can_edit_upload(session, id) {
            return Err(StoreError::forbidden("You can only edit your own posts"));
        }
        self.validate_draft(&draft)?;

        let mut uploads: Vec<Upload> = self.load(keys::UPLOADS);
        let upload = uploads
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(StoreError::NotFound("Upload"))?;

        upload.school_name = draft.school_name.trim().to_string();
        upload.city = draft.city.trim().to_string();
        upload.country = draft.country.trim().to_string();
        upload.year = draft.year;
        upload.grade = trimmed(draft.grade);
        upload.description = trimmed(draft.description);
        upload.tags = normalize_tags(draft.tags);
        upload.image_url = draft.image_url;
        upload.is_private = draft.is_private;
        upload.updated_at = Some(Utc::now());
        let updated = upload.clone();

        self.save(keys::UPLOADS, &uploads)?;
        info!(upload_id = %id, "upload updated");
        Ok(updated)
    }

    /// Delete an upload with its favorites and likes.
    ///
    /// Comments and reports stay behind and may dangle. When a moderator
    /// deletes, pending reports against the upload are marked reviewed.
    pub fn delete_upload(&self, session: &Session, id: Uuid) -> Result<()> {
        let user = self.require_user(session, "Please log in to delete posts")?;
        let upload = self.find_upload(id).ok_or(StoreError::NotFound("Upload"))?;

        let is_moderator = user.role.is_moderator();
        if !upload.is_owned_by(user.id) && !is_moderator {
            return Err(StoreError::forbidden("You can only delete your own posts"));
        }
        let reviewer = user.id;

        self.atomically(|db| {
            let mut uploads: Vec<Upload> = db.load(keys::UPLOADS);
            uploads.retain(|u| u.id != id);
            db.save(keys::UPLOADS, &uploads)?;

            let mut favorites: Vec<Favorite> = db.load(keys::FAVORITES);
            favorites.retain(|f| f.upload_id != id);
            db.save(keys::FAVORITES, &favorites)?;

            let mut likes: Vec<Like> = db.load(keys::LIKES);
            likes.retain(|l| l.upload_id != id);
            db.save(keys::LIKES, &likes)?;

            if is_moderator {
                db.review_pending_reports_for(id, reviewer)?;
            }
            Ok(())
        })?;

        info!(upload_id = %id, by = %reviewer, "upload deleted");
        Ok(())
    }

    /// Mark every pending report against `upload_id` as reviewed.
    pub(crate) fn review_pending_reports_for(&self, upload_id: Uuid, reviewer: Uuid) -> Result<usize> {
        let mut reports: Vec<Report> = self.load(keys::REPORTS);
        let now = Utc::now();
        let mut changed = 0;
        for report in reports
            .iter_mut()
            .filter(|r| r.upload_id == upload_id && r.status == ReportStatus::Pending)
        {
            report.status = ReportStatus::Reviewed;
            report.reviewed_by = Some(reviewer);
            report.reviewed_at = Some(now);
            changed += 1;
        }
        if changed > 0 {
            self.save(keys::REPORTS, &reports)?;
        }
        Ok(changed)
    }

    /// Count a view. Returns the new total.
    pub fn increment_view_count(&self, id: Uuid) -> Result<u64> {
        let mut uploads: Vec<Upload> = self.load(keys::UPLOADS);
        let upload = uploads
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(StoreError::NotFound("Upload"))?;
        upload.view_count += 1;
        let count = upload.view_count;
        self.save(keys::UPLOADS, &uploads)?;
        Ok(count)
    }

    /// Every upload by `owner`, private ones included. Used for profiles and
    /// backups.
    pub fn uploads_by(&self, owner: &Actor) -> Vec<Upload> {
        self.load::<Upload>(keys::UPLOADS)
            .into_iter()
            .filter(|u| u.uploaded_by == *owner)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yearbook_shared::{ReportReason, Role};

    use crate::test_support::{db, login_as, promote, sample_draft};

    #[test]
    fn create_requires_login() {
        let db = db();
        let err = db
            .create_upload(&Session::anonymous(), sample_draft("Oak High"))
            .unwrap_err();
        assert!(matches!(err, StoreError::Forbidden(_)));
    }

    #[test]
    fn create_collects_all_validation_errors() {
        let db = db();
        let alice = login_as(&db, "alice");
        let draft = UploadDraft {
            school_name: "x".into(),
            city: " ".into(),
            country: "France".into(),
            year: 1800,
            image_url: "http://example.com/a.png".into(),
            ..UploadDraft::default()
        };

        match db.create_upload(&alice, draft).unwrap_err() {
            StoreError::Validation(e) => {
                assert_eq!(e.messages.len(), 4);
                assert_eq!(e.messages[0], "School name must be at least 2 characters");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(db.search_uploads(&alice, &Default::default()).is_empty());
    }

    #[test]
    fn created_upload_is_normalized() {
        let db = db();
        let alice = login_as(&db, "alice");
        let draft = UploadDraft {
            grade: Some("  ".into()),
            tags: vec![" Prom ".into(), "prom".into(), "".into(), "Seniors".into()],
            ..sample_draft("  Oak High ")
        };
        let upload = db.create_upload(&alice, draft).unwrap();
        assert_eq!(upload.school_name, "Oak High");
        assert_eq!(upload.grade, None);
        assert_eq!(upload.tags, vec!["Prom", "Seniors"]);
        assert_eq!(upload.uploaded_by, alice.actor());
        assert_eq!((upload.view_count, upload.like_count), (0, 0));
    }

    #[test]
    fn upload_rate_limit_applies() {
        let db = db();
        let alice = login_as(&db, "alice");
        for _ in 0..10 {
            db.create_upload(&alice, sample_draft("Oak High")).unwrap();
        }
        let err = db.create_upload(&alice, sample_draft("Oak High")).unwrap_err();
        assert!(matches!(err, StoreError::RateLimited { action: "upload", .. }));
    }

    #[test]
    fn private_upload_hidden_from_others() {
        let db = db();
        let alice = login_as(&db, "alice");
        let bob = login_as(&db, "bob");
        let post = db
            .create_upload(&alice, UploadDraft { is_private: true, ..sample_draft("Oak") })
            .unwrap();

        assert!(db.get_upload(&alice, post.id).is_ok());
        let err = db.get_upload(&bob, post.id).unwrap_err();
        assert_eq!(
            err.to_string(),
            "This post is private and only visible to the owner."
        );
        assert!(db.get_upload(&Session::anonymous(), post.id).is_err());
        assert!(matches!(
            db.get_upload(&bob, Uuid::new_v4()).unwrap_err(),
            StoreError::NotFound("Upload")
        ));
    }

    #[test]
    fn edit_keeps_counters_and_owner() {
        let db = db();
        let alice = login_as(&db, "alice");
        let bob = login_as(&db, "bob");
        let post = db.create_upload(&alice, sample_draft("Oak High")).unwrap();
        db.increment_view_count(post.id).unwrap();
        db.toggle_like(&bob, post.id).unwrap();

        let err = db.update_upload(&bob, post.id, sample_draft("Hijack")).unwrap_err();
        assert!(matches!(err, StoreError::Forbidden(_)));

        let updated = db.update_upload(&alice, post.id, sample_draft("Oak Academy")).unwrap();
        assert_eq!(updated.school_name, "Oak Academy");
        assert_eq!(updated.view_count, 1);
        assert_eq!(updated.like_count, 1);
        assert_eq!(updated.uploaded_at, post.uploaded_at);
        assert!(updated.updated_at.is_some());

        let invalid = UploadDraft { year: 3000, ..sample_draft("Oak") };
        assert!(matches!(
            db.update_upload(&alice, post.id, invalid).unwrap_err(),
            StoreError::Validation(_)
        ));
    }

    #[test]
    fn admin_may_edit_any_post() {
        let db = db();
        let alice = login_as(&db, "alice");
        let admin = login_as(&db, "admin");
        promote(&db, "admin", Role::Admin);
        let post = db.create_upload(&alice, sample_draft("Oak High")).unwrap();

        assert!(db.can_edit_upload(&admin, post.id));
        assert!(!db.can_edit_upload(&Session::anonymous(), post.id));
        db.update_upload(&admin, post.id, sample_draft("Fixed")).unwrap();
    }

    #[test]
    fn delete_cascades_favorites_and_likes_only() {
        let db = db();
        let alice = login_as(&db, "alice");
        let bob = login_as(&db, "bob");
        let post = db.create_upload(&alice, sample_draft("Oak High")).unwrap();
        let keep = db.create_upload(&alice, sample_draft("Elm High")).unwrap();

        db.add_favorite(&bob, post.id).unwrap();
        db.add_favorite(&bob, keep.id).unwrap();
        db.toggle_like(&bob, post.id).unwrap();
        db.add_comment(&bob, post.id, "great").unwrap();
        db.report_upload(&bob, post.id, ReportReason::Spam, "").unwrap();

        assert!(db.delete_upload(&bob, post.id).is_err());
        db.delete_upload(&alice, post.id).unwrap();

        assert!(db.find_upload(post.id).is_none());
        assert!(!db.is_favorited(&bob, post.id));
        assert!(db.is_favorited(&bob, keep.id));
        assert!(db.likes_for(post.id).is_empty());
        assert_eq!(db.comments_for(post.id).len(), 1);
        let report = &db.list_reports(None)[0];
        assert_eq!(report.status, ReportStatus::Pending);
    }

    #[test]
    fn moderator_delete_reviews_pending_reports() {
        let db = db();
        let alice = login_as(&db, "alice");
        let moderator = login_as(&db, "mod");
        promote(&db, "mod", Role::Moderator);
        let post = db.create_upload(&alice, sample_draft("Oak High")).unwrap();
        db.report_upload(&Session::anonymous(), post.id, ReportReason::Spam, "")
            .unwrap();

        db.delete_upload(&moderator, post.id).unwrap();
        let report = &db.list_reports(None)[0];
        assert_eq!(report.status, ReportStatus::Reviewed);
        assert_eq!(report.reviewed_by, moderator.user_id());
    }

    #[test]
    fn views_and_owner_listing() {
        let db = db();
        let alice = login_as(&db, "alice");
        let post = db
            .create_upload(&alice, UploadDraft { is_private: true, ..sample_draft("Oak") })
            .unwrap();
        assert_eq!(db.increment_view_count(post.id).unwrap(), 1);
        assert_eq!(db.increment_view_count(post.id).unwrap(), 2);
        assert_eq!(db.uploads_by(&alice.actor()).len(), 1);
        assert!(db.uploads_by(&Actor::Anonymous).is_empty());
    }
}
