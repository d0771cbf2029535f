//! Moderator notifications raised by new reports.
//!
//! Stored as a bounded list, newest first. Read state lives in a separate
//! list of ids, pruned whenever the notification list shrinks.

use std::collections::HashSet;

use serde::Serialize;
use uuid::Uuid;

use crate::database::Database;
use crate::error::Result;
use crate::keys;
use crate::models::{Notification, NotificationKind, Report};
use crate::session::Session;

/// A notification together with its read flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationEntry {
    #[serde(flatten)]
    pub notification: Notification,
    pub read: bool,
}

impl Database {
    pub(crate) fn push_report_notification(&self, report: &Report, school_name: &str) -> Result<()> {
        let notification = Notification {
            id: report.id,
            kind: NotificationKind::NewReport,
            report_id: report.id,
            upload_id: report.upload_id,
            title: "New report".to_string(),
            message: format!(
                "{} reported \"{}\" for {}",
                report.reported_by_username,
                school_name,
                report.reason.label()
            ),
            created_at: report.reported_at,
        };

        let mut list: Vec<Notification> = self.load(keys::NOTIFICATIONS);
        list.insert(0, notification);
        let max = self.config().max_notifications;
        if list.len() > max {
            list.truncate(max);
            self.save(keys::NOTIFICATIONS, &list)?;
            self.prune_read_ids(&list)?;
        } else {
            self.save(keys::NOTIFICATIONS, &list)?;
        }
        Ok(())
    }

    fn read_ids(&self) -> HashSet<Uuid> {
        self.load::<Uuid>(keys::NOTIFICATIONS_READ).into_iter().collect()
    }

    fn prune_read_ids(&self, live: &[Notification]) -> Result<()> {
        let live: HashSet<Uuid> = live.iter().map(|n| n.id).collect();
        let mut read: Vec<Uuid> = self.load(keys::NOTIFICATIONS_READ);
        read.retain(|id| live.contains(id));
        self.save(keys::NOTIFICATIONS_READ, &read)
    }

    pub fn notifications(&self, session: &Session) -> Result<Vec<NotificationEntry>> {
        self.require_moderator(session)?;
        let read = self.read_ids();
        Ok(self
            .load::<Notification>(keys::NOTIFICATIONS)
            .into_iter()
            .map(|n| NotificationEntry {
                read: read.contains(&n.id),
                notification: n,
            })
            .collect())
    }

    pub fn unread_count(&self, session: &Session) -> Result<usize> {
        Ok(self
            .notifications(session)?
            .iter()
            .filter(|n| !n.read)
            .count())
    }

    /// Returns false when no such notification exists.
    pub fn mark_notification_read(&self, session: &Session, id: Uuid) -> Result<bool> {
        self.require_moderator(session)?;
        let live: Vec<Notification> = self.load(keys::NOTIFICATIONS);
        if !live.iter().any(|n| n.id == id) {
            return Ok(false);
        }
        let mut read: Vec<Uuid> = self.load(keys::NOTIFICATIONS_READ);
        if !read.contains(&id) {
            read.push(id);
            self.save(keys::NOTIFICATIONS_READ, &read)?;
        }
        Ok(true)
    }

    pub fn mark_all_notifications_read(&self, session: &Session) -> Result<()> {
        self.require_moderator(session)?;
        let ids: Vec<Uuid> = self
            .load::<Notification>(keys::NOTIFICATIONS)
            .iter()
            .map(|n| n.id)
            .collect();
        self.save(keys::NOTIFICATIONS_READ, &ids)
    }

    pub fn clear_notifications(&self, session: &Session) -> Result<()> {
        self.require_moderator(session)?;
        self.save::<Notification>(keys::NOTIFICATIONS, &[])?;
        self.save::<Uuid>(keys::NOTIFICATIONS_READ, &[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use yearbook_shared::{Actor, ReportReason, ReportStatus, Role};

    use crate::config::StoreConfig;
    use crate::error::StoreError;
    use crate::test_support::{db, login_as, promote, sample_draft};

    fn fake_report() -> Report {
        Report {
            id: Uuid::new_v4(),
            upload_id: Uuid::new_v4(),
            reason: ReportReason::Copyright,
            description: String::new(),
            reported_by: Actor::Anonymous,
            reported_by_username: "Anonymous".into(),
            reported_at: Utc::now(),
            status: ReportStatus::Pending,
            reviewed_by: None,
            reviewed_at: None,
        }
    }

    #[test]
    fn report_raises_notification() {
        let db = db();
        let alice = login_as(&db, "alice");
        let moderator = login_as(&db, "mod");
        promote(&db, "mod", Role::Moderator);
        let post = db.create_upload(&alice, sample_draft("Oak High")).unwrap();
        let report = db
            .report_upload(&alice, post.id, ReportReason::Copyright, "")
            .unwrap();

        let list = db.notifications(&moderator).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].notification.id, report.id);
        assert_eq!(list[0].notification.message, "alice reported \"Oak High\" for Copyright");
        assert!(!list[0].read);
        assert_eq!(db.unread_count(&moderator).unwrap(), 1);

        assert!(matches!(
            db.notifications(&alice).unwrap_err(),
            StoreError::Forbidden(_)
        ));
    }

    #[test]
    fn read_state_and_clear() {
        let db = db();
        let moderator = login_as(&db, "mod");
        promote(&db, "mod", Role::Moderator);
        let first = fake_report();
        let second = fake_report();
        db.push_report_notification(&first, "Oak").unwrap();
        db.push_report_notification(&second, "Elm").unwrap();

        assert!(db.mark_notification_read(&moderator, first.id).unwrap());
        assert!(!db.mark_notification_read(&moderator, Uuid::new_v4()).unwrap());
        let list = db.notifications(&moderator).unwrap();
        assert_eq!(list[0].notification.id, second.id);
        assert!(!list[0].read);
        assert!(list[1].read);

        db.mark_all_notifications_read(&moderator).unwrap();
        assert_eq!(db.unread_count(&moderator).unwrap(), 0);

        db.clear_notifications(&moderator).unwrap();
        assert!(db.notifications(&moderator).unwrap().is_empty());
    }

    #[test]
    fn ring_buffer_drops_oldest_and_prunes_read_ids() {
        let db = Database::open_in_memory(StoreConfig {
            max_notifications: 3,
            ..StoreConfig::default()
        })
        .unwrap();
        let moderator = login_as(&db, "mod");
        promote(&db, "mod", Role::Moderator);

        let reports: Vec<Report> = (0..4).map(|_| fake_report()).collect();
        db.push_report_notification(&reports[0], "S").unwrap();
        db.mark_notification_read(&moderator, reports[0].id).unwrap();
        for r in &reports[1..] {
            db.push_report_notification(r, "S").unwrap();
        }

        let ids: Vec<Uuid> = db
            .notifications(&moderator)
            .unwrap()
            .iter()
            .map(|n| n.notification.id)
            .collect();
        assert_eq!(ids, vec![reports[3].id, reports[2].id, reports[1].id]);
        assert!(db.load::<Uuid>(keys::NOTIFICATIONS_READ).is_empty());
    }
}
