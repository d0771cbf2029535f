//! v002 -- create every collection key empty so readers never see a gap.

use chrono::Utc;
use rusqlite::{params, Connection};

use crate::keys;

pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    let now = Utc::now().to_rfc3339();
    let mut stmt =
        conn.prepare("INSERT OR IGNORE INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)")?;

    for key in keys::ARRAY_COLLECTIONS {
        stmt.execute(params![key, "[]", now])?;
    }
    stmt.execute(params![keys::POPULAR_SEARCHES, "{}", now])?;
    Ok(())
}
