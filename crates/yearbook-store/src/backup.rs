use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use yearbook_shared::constants::BACKUP_VERSION;
use yearbook_shared::validation::validate_school_data;
use yearbook_shared::Actor;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::keys;
use crate::models::{Favorite, Like, PublicUser, Upload};
use crate::search_history::SearchHistoryEntry;
use crate::session::Session;

/// A user's personal data export, written as pretty JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupPayload {
    #[serde(default)]
    pub user: Option<PublicUser>,
    #[serde(default)]
    pub uploads: Vec<Upload>,
    #[serde(default)]
    pub favorites: Vec<Favorite>,
    #[serde(default)]
    pub search_history: Vec<SearchHistoryEntry>,
    /// RFC 3339 timestamp of the export.
    #[serde(default)]
    pub export_date: String,
    /// Format version. Only `"1.0"` is understood.
    #[serde(default)]
    pub version: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportStats {
    pub uploads_imported: usize,
    /// Uploads that failed field validation and were left out.
    pub uploads_skipped: usize,
    pub favorites_imported: usize,
}

impl BackupPayload {
    pub fn validate(&self) -> Result<()> {
        if self.version.is_empty() || self.export_date.is_empty() {
            return Err(StoreError::Backup("missing version or export date".into()));
        }
        if self.version != BACKUP_VERSION {
            return Err(StoreError::Backup(format!(
                "unsupported version {}",
                self.version
            )));
        }
        DateTime::parse_from_rfc3339(&self.export_date)
            .map_err(|e| StoreError::Backup(format!("bad export date: {e}")))?;
        Ok(())
    }
}

/// Decode and validate a backup file.
pub fn parse_backup(json: &str) -> Result<BackupPayload> {
    let payload: BackupPayload =
        serde_json::from_str(json).map_err(|e| StoreError::Backup(e.to_string()))?;
    payload.validate()?;
    Ok(payload)
}

impl Database {
    /// Collect the caller's profile, uploads, favorites and search history.
    pub fn export_backup(&self, session: &Session) -> Result<BackupPayload> {
        let user = self.require_user(session, "Please log in to export your data")?;

        Ok(BackupPayload {
            user: Some(user.public()),
            uploads: self.uploads_by(&Actor::User(user.id)),
            favorites: self.favorites_of(user.id),
            search_history: self.search_history(),
            export_date: Utc::now().to_rfc3339(),
            version: BACKUP_VERSION.to_string(),
        })
    }

    /// Merge a backup into the store.
    ///
    /// Imported uploads and favorites are re-owned by the caller. Uploads
    /// whose id already exists and favorites already present are skipped, as
    /// are uploads that fail the same validation as a new post. Like counts
    /// are recomputed from this store's like rows.
    pub fn import_backup(&self, session: &Session, payload: &BackupPayload) -> Result<ImportStats> {
        let owner = self.require_user(session, "Please log in to import data")?.id;
        payload.validate()?;

        let current_year = Utc::now().year();
        let stats = self.atomically(|db| {
            let mut stats = ImportStats::default();

            let likes: Vec<Like> = db.load(keys::LIKES);
            let mut uploads: Vec<Upload> = db.load(keys::UPLOADS);
            let mut rejected = Vec::new();
            for upload in &payload.uploads {
                if uploads.iter().any(|u| u.id == upload.id) {
                    continue;
                }
                if let Err(e) = validate_school_data(&upload.school_data(), current_year) {
                    warn!(upload_id = %upload.id, error = %e, "skipping invalid upload in backup");
                    stats.uploads_skipped += 1;
                    rejected.push(upload.id);
                    continue;
                }
                let mut upload = upload.clone();
                upload.uploaded_by = Actor::User(owner);
                upload.like_count = likes.iter().filter(|l| l.upload_id == upload.id).count() as u64;
                uploads.push(upload);
                stats.uploads_imported += 1;
            }

            let mut favorites: Vec<Favorite> = db.load(keys::FAVORITES);
            for favorite in &payload.favorites {
                if rejected.contains(&favorite.upload_id) {
                    continue;
                }
                if favorites
                    .iter()
                    .any(|f| f.upload_id == favorite.upload_id && f.user_id == owner)
                {
                    continue;
                }
                favorites.push(Favorite {
                    user_id: owner,
                    ..favorite.clone()
                });
                stats.favorites_imported += 1;
            }

            if stats.uploads_imported > 0 {
                db.save(keys::UPLOADS, &uploads)?;
            }
            if stats.favorites_imported > 0 {
                db.save(keys::FAVORITES, &favorites)?;
            }
            Ok(stats)
        })?;

        info!(
            user_id = %owner,
            uploads = stats.uploads_imported,
            skipped = stats.uploads_skipped,
            favorites = stats.favorites_imported,
            "backup imported"
        );
        Ok(stats)
    }
}
