//! Moderation reports against uploads.

use chrono::Utc;
use tracing::info;
use uuid::Uuid;
use yearbook_shared::sanitize::sanitize_text;
use yearbook_shared::{ReportReason, ReportStatus};

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::keys;
use crate::models::Report;
use crate::rate_limit::RateLimitAction;
use crate::session::Session;

impl Database {
    /// File a report. Anonymous visitors may report; each reporter gets one
    /// report per upload.
    pub fn report_upload(
        &self,
        session: &Session,
        upload_id: Uuid,
        reason: ReportReason,
        description: &str,
    ) -> Result<Report> {
        let upload = self
            .find_upload(upload_id)
            .ok_or(StoreError::NotFound("Upload"))?;
        let reporter = session.actor();

        let mut reports: Vec<Report> = self.load(keys::REPORTS);
        if reports
            .iter()
            .any(|r| r.upload_id == upload_id && r.reported_by == reporter)
        {
            return Err(StoreError::Duplicate(
                "You have already reported this post".into(),
            ));
        }
        self.enforce_rate_limit(RateLimitAction::Report, &reporter)?;

        let report = Report {
            id: Uuid::new_v4(),
            upload_id,
            reason,
            description: sanitize_text(description.trim()),
            reported_by: reporter,
            reported_by_username: self.display_name(&reporter),
            reported_at: Utc::now(),
            status: ReportStatus::Pending,
            reviewed_by: None,
            reviewed_at: None,
        };
        reports.push(report.clone());
        self.save(keys::REPORTS, &reports)?;

        self.push_report_notification(&report, &upload.school_name)?;

        info!(report_id = %report.id, upload_id = %upload_id, reason = %reason, "report filed");
        Ok(report)
    }

    /// Reports, newest first, optionally restricted to one status.
    pub fn list_reports(&self, status: Option<ReportStatus>) -> Vec<Report> {
        let mut reports: Vec<Report> = self.load(keys::REPORTS);
        if let Some(status) = status {
            reports.retain(|r| r.status == status);
        }
        reports.sort_by(|a, b| b.reported_at.cmp(&a.reported_at));
        reports
    }

    pub fn get_report(&self, id: Uuid) -> Option<Report> {
        self.load::<Report>(keys::REPORTS)
            .into_iter()
            .find(|r| r.id == id)
    }

    pub fn update_report_status(
        &self,
        session: &Session,
        id: Uuid,
        status: ReportStatus,
    ) -> Result<Report> {
        let moderator = self.require_moderator(session)?;

        let mut reports: Vec<Report> = self.load(keys::REPORTS);
        let report = reports
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(StoreError::NotFound("Report"))?;

        report.status = status;
        match status {
            ReportStatus::Reviewed => {
                report.reviewed_by = Some(moderator.id);
                report.reviewed_at = Some(Utc::now());
            }
            ReportStatus::Pending => {
                report.reviewed_by = None;
                report.reviewed_at = None;
            }
        }
        let updated = report.clone();
        self.save(keys::REPORTS, &reports)?;

        info!(report_id = %id, status = %status, by = %moderator.id, "report status updated");
        Ok(updated)
    }

    /// Close a report without touching the upload.
    pub fn dismiss_report(&self, session: &Session, id: Uuid) -> Result<Report> {
        self.update_report_status(session, id, ReportStatus::Reviewed)
    }

    /// Delete the reported upload and close the report.
    ///
    /// If the upload is already gone only the report is closed.
    pub fn delete_reported_upload(&self, session: &Session, report_id: Uuid) -> Result<Report> {
        self.require_moderator(session)?;
        let report = self
            .get_report(report_id)
            .ok_or(StoreError::NotFound("Report"))?;

        self.atomically(|db| {
            if db.find_upload(report.upload_id).is_some() {
                db.delete_upload(session, report.upload_id)?;
            }
            db.update_report_status(session, report_id, ReportStatus::Reviewed)
        })
    }
}
