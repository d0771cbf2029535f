//! Subcommands of the `yearbook` binary.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use yearbook_shared::{ReportStatus, Role};
use yearbook_store::{parse_backup, Database, FilterLogic, Session, SortBy, UploadFilter};

#[derive(Parser, Debug)]
#[command(name = "yearbook")]
#[command(about = "Yearbook Memories store administration", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub credentials: Credentials,

    #[command(subcommand)]
    pub command: Command,
}

/// Who to act as. Without credentials the session saved by `login` is used.
#[derive(Args, Debug, Default)]
pub struct Credentials {
    #[arg(long, global = true, env = "YEARBOOK_EMAIL")]
    pub email: Option<String>,

    #[arg(long, global = true, env = "YEARBOOK_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create an account
    Register {
        username: String,
        email: String,
        password: String,
    },
    /// Log in and remember the session
    Login { email: String, password: String },
    /// Forget the remembered session
    Logout,
    /// Show the admin dashboard
    Stats,
    /// List moderation reports, newest first
    Reports {
        #[arg(long)]
        status: Option<ReportStatus>,
    },
    /// Write all reports as CSV
    ExportReports { file: PathBuf },
    /// Write the current user's data to a JSON backup
    BackupExport { file: PathBuf },
    /// Merge a JSON backup into the current user's data
    BackupImport { file: PathBuf },
    /// Search uploads
    Search(SearchArgs),
    /// Change a user's role
    SetRole { username: String, role: Role },
    /// Show storage usage
    Usage,
}

#[derive(Args, Debug, Default)]
pub struct SearchArgs {
    #[arg(long)]
    pub school: Option<String>,
    #[arg(long)]
    pub city: Option<String>,
    #[arg(long)]
    pub country: Option<String>,
    #[arg(long)]
    pub year: Option<i32>,
    #[arg(long)]
    pub year_from: Option<i32>,
    #[arg(long)]
    pub year_to: Option<i32>,
    #[arg(long)]
    pub grade: Option<String>,
    /// Comma separated
    #[arg(long)]
    pub tags: Option<String>,
    #[arg(long)]
    pub username: Option<String>,
    /// Match any criterion instead of all
    #[arg(long)]
    pub any: bool,
    /// Free text split into school, city and country
    #[arg(long, conflicts_with_all = ["school", "city", "country"])]
    pub quick: Option<String>,
    #[arg(long, default_value = "date")]
    pub sort: SortBy,
    #[arg(long, default_value_t = 1)]
    pub page: usize,
}

impl SearchArgs {
    fn filter(&self) -> UploadFilter {
        let base = match &self.quick {
            Some(q) => yearbook_store::quick_query(q),
            None => UploadFilter {
                school: self.school.clone(),
                city: self.city.clone(),
                country: self.country.clone(),
                ..UploadFilter::default()
            },
        };
        UploadFilter {
            year: self.year,
            year_from: self.year_from,
            year_to: self.year_to,
            grade: self.grade.clone(),
            tags: self.tags.clone(),
            username: self.username.clone(),
            logic: if self.any { FilterLogic::Or } else { FilterLogic::And },
            ..base
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn session(db: &Database, credentials: &Credentials) -> Result<Session> {
    match (&credentials.email, &credentials.password) {
        (Some(email), Some(password)) => Ok(db.login(email, password)?),
        (Some(_), None) | (None, Some(_)) => bail!("--email and --password go together"),
        (None, None) => Ok(db.restore_session()?),
    }
}

pub fn run(db: &Database, cli: Cli) -> Result<()> {
    match cli.command {
        Command::Register {
            username,
            email,
            password,
        } => {
            let user = db.register(&username, &email, &password)?;
            print_json(&user)
        }
        Command::Login { email, password } => {
            let session = db.login(&email, &password)?;
            print_json(&session.user())
        }
        Command::Logout => {
            db.logout()?;
            info!("logged out");
            Ok(())
        }
        Command::Stats => {
            let session = session(db, &cli.credentials)?;
            print_json(&db.admin_stats(&session)?)
        }
        Command::Reports { status } => {
            let session = session(db, &cli.credentials)?;
            if !db.current_role(&session).is_some_and(|r| r.is_moderator()) {
                bail!("Moderator access required");
            }
            print_json(&db.list_reports(status))
        }
        Command::ExportReports { file } => {
            let session = session(db, &cli.credentials)?;
            let csv = db.reports_csv(&session)?;
            fs::write(&file, csv).with_context(|| format!("writing {}", file.display()))?;
            info!(path = %file.display(), "reports exported");
            Ok(())
        }
        Command::BackupExport { file } => {
            let session = session(db, &cli.credentials)?;
            let backup = db.export_backup(&session)?;
            fs::write(&file, serde_json::to_string_pretty(&backup)?)
                .with_context(|| format!("writing {}", file.display()))?;
            info!(path = %file.display(), uploads = backup.uploads.len(), "backup written");
            Ok(())
        }
        Command::BackupImport { file } => {
            let session = session(db, &cli.credentials)?;
            let json = fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let payload = parse_backup(&json)?;
            print_json(&db.import_backup(&session, &payload)?)
        }
        Command::Search(args) => {
            let session = session(db, &cli.credentials)?;
            let filter = args.filter();
            db.record_search(&filter)?;
            print_json(&db.browse(&session, &filter, args.sort, args.page))
        }
        Command::SetRole { username, role } => {
            let session = session(db, &cli.credentials)?;
            let target = db
                .find_user_by_username(&username)
                .with_context(|| format!("no user named {username}"))?;
            print_json(&db.update_user_role(&session, target.id, role)?)
        }
        Command::Usage => print_json(&db.usage()?),
    }
}
