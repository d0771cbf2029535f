//! CSV export of moderation reports.

use crate::database::Database;
use crate::error::Result;
use crate::keys;
use crate::models::{Report, Upload};
use crate::session::Session;

const HEADER: [&str; 10] = [
    "Report ID",
    "Upload ID",
    "School",
    "Reason",
    "Description",
    "Reported By",
    "Reported At",
    "Status",
    "Reviewed By",
    "Reviewed At",
];

/// Quote a field when it contains a comma, quote or line break. Embedded
/// quotes are doubled.
pub fn csv_escape(field: &str) -> String {
    if field.contains(&[',', '"', '\n', '\r'][..]) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn csv_row<I, S>(fields: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    fields
        .into_iter()
        .map(|f| csv_escape(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

impl Database {
    /// All reports as CSV, newest first, prefixed with a UTF-8 byte order
    /// mark so spreadsheet tools pick the right encoding.
    pub fn reports_csv(&self, session: &Session) -> Result<String> {
        self.require_moderator(session)?;
        let uploads: Vec<Upload> = self.load(keys::UPLOADS);
        let reports: Vec<Report> = self.list_reports(None);

        let mut lines = Vec::with_capacity(reports.len() + 1);
        lines.push(csv_row(HEADER));
        for report in &reports {
            let school = uploads
                .iter()
                .find(|u| u.id == report.upload_id)
                .map(|u| u.school_name.clone())
                .unwrap_or_else(|| "Unknown School".to_string());
            let reviewed_by = report
                .reviewed_by
                .and_then(|id| self.get_user(id))
                .map(|u| u.username)
                .unwrap_or_default();

            lines.push(csv_row([
                report.id.to_string(),
                report.upload_id.to_string(),
                school,
                report.reason.label().to_string(),
                report.description.clone(),
                report.reported_by_username.clone(),
                report.reported_at.to_rfc3339(),
                report.status.as_str().to_string(),
                reviewed_by,
                report.reviewed_at.map(|t| t.to_rfc3339()).unwrap_or_default(),
            ]));
        }

        Ok(format!("\u{FEFF}{}", lines.join("\n")))
    }
}
