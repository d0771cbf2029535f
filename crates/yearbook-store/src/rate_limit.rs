//! Fixed-window rate limiting for uploads and reports.
//!
//! Each (action, actor) pair owns one window record under
//! `rateLimit_<action>_<actor>`. The first attempt opens a window; attempts
//! are counted until the limit, after which callers are refused until the
//! window expires and a fresh one opens.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use yearbook_shared::Actor;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::keys;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateLimitAction {
    Upload,
    Report,
}

impl RateLimitAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            RateLimitAction::Upload => "upload",
            RateLimitAction::Report => "report",
        }
    }
}

impl fmt::Display for RateLimitAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed { remaining: u32 },
    Limited { reset_in: u64, message: String },
}

impl RateLimitDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitDecision::Allowed { .. })
    }
}

/// Stored window. `reset_at` is epoch milliseconds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Window {
    count: u32,
    reset_at: i64,
}

fn window_key(action: RateLimitAction, actor: &Actor) -> String {
    format!("{}{}_{}", keys::RATE_LIMIT_PREFIX, action, actor)
}

impl Database {
    fn rate_limit_for(&self, action: RateLimitAction) -> u32 {
        match action {
            RateLimitAction::Upload => self.config().upload_rate_limit,
            RateLimitAction::Report => self.config().report_rate_limit,
        }
    }

    /// Count an attempt against the window and decide whether it may
    /// proceed. Refused attempts do not extend the window.
    pub fn check_rate_limit_at(
        &self,
        action: RateLimitAction,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<RateLimitDecision> {
        let key = window_key(action, actor);
        let limit = self.rate_limit_for(action);
        let now_ms = now.timestamp_millis();
        let window_ms = i64::try_from(self.config().rate_limit_window.as_millis()).unwrap_or(i64::MAX);

        let window = match self.get_opt::<Window>(&key) {
            Some(w) if now_ms < w.reset_at => w,
            _ => {
                let fresh = Window {
                    count: 1,
                    reset_at: now_ms.saturating_add(window_ms),
                };
                self.set(&key, &fresh)?;
                return Ok(RateLimitDecision::Allowed {
                    remaining: limit.saturating_sub(1),
                });
            }
        };

        if window.count >= limit {
            let wait_ms = (window.reset_at - now_ms).max(0) as u64;
            let reset_in = wait_ms.div_ceil(1000);
            warn!(action = %action, actor = %actor, reset_in, "rate limit hit");
            return Ok(RateLimitDecision::Limited {
                reset_in,
                message: format!("Too many {action} attempts. Please wait {reset_in} seconds."),
            });
        }

        let updated = Window {
            count: window.count + 1,
            reset_at: window.reset_at,
        };
        self.set(&key, &updated)?;
        Ok(RateLimitDecision::Allowed {
            remaining: limit.saturating_sub(updated.count),
        })
    }

    pub fn check_rate_limit(&self, action: RateLimitAction, actor: &Actor) -> Result<RateLimitDecision> {
        self.check_rate_limit_at(action, actor, Utc::now())
    }

    /// Like [`Database::check_rate_limit`], turning a refusal into
    /// [`StoreError::RateLimited`].
    pub(crate) fn enforce_rate_limit(&self, action: RateLimitAction, actor: &Actor) -> Result<()> {
        match self.check_rate_limit(action, actor)? {
            RateLimitDecision::Allowed { .. } => Ok(()),
            RateLimitDecision::Limited { reset_in, .. } => Err(StoreError::RateLimited {
                action: action.as_str(),
                reset_in,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    use crate::test_support::db;

    #[test]
    fn allows_up_to_the_limit_then_refuses() {
        let db = db();
        let actor = Actor::User(Uuid::new_v4());
        let t0 = Utc::now();

        for i in 0..5 {
            let decision = db.check_rate_limit_at(RateLimitAction::Report, &actor, t0).unwrap();
            assert_eq!(decision, RateLimitDecision::Allowed { remaining: 4 - i });
        }

        let decision = db
            .check_rate_limit_at(RateLimitAction::Report, &actor, t0 + Duration::milliseconds(500))
            .unwrap();
        match decision {
            RateLimitDecision::Limited { reset_in, message } => {
                assert_eq!(reset_in, 60);
                assert_eq!(message, "Too many report attempts. Please wait 60 seconds.");
            }
            other => panic!("expected limit, got {other:?}"),
        }
    }

    #[test]
    fn window_expires_at_reset_time() {
        let db = db();
        let actor = Actor::Anonymous;
        let t0 = Utc::now();

        for _ in 0..5 {
            db.check_rate_limit_at(RateLimitAction::Report, &actor, t0).unwrap();
        }
        let almost = t0 + Duration::seconds(59);
        assert!(!db
            .check_rate_limit_at(RateLimitAction::Report, &actor, almost)
            .unwrap()
            .is_allowed());

        let expired = t0 + Duration::seconds(60);
        assert_eq!(
            db.check_rate_limit_at(RateLimitAction::Report, &actor, expired).unwrap(),
            RateLimitDecision::Allowed { remaining: 4 }
        );
    }

    #[test]
    fn actions_and_actors_are_independent() {
        let db = db();
        let a = Actor::User(Uuid::new_v4());
        let b = Actor::User(Uuid::new_v4());
        let t0 = Utc::now();

        for _ in 0..5 {
            db.check_rate_limit_at(RateLimitAction::Report, &a, t0).unwrap();
        }
        assert!(db.check_rate_limit_at(RateLimitAction::Upload, &a, t0).unwrap().is_allowed());
        assert!(db.check_rate_limit_at(RateLimitAction::Report, &b, t0).unwrap().is_allowed());

        let keys = db.keys_with_prefix(keys::RATE_LIMIT_PREFIX).unwrap();
        assert_eq!(keys.len(), 3);
        assert!(keys.contains(&format!("rateLimit_report_{a}")));
    }

    #[test]
    fn corrupt_window_starts_fresh() {
        let db = db();
        let actor = Actor::Anonymous;
        db.put_raw(&window_key(RateLimitAction::Upload, &actor), "{oops").unwrap();

        assert_eq!(
            db.check_rate_limit(RateLimitAction::Upload, &actor).unwrap(),
            RateLimitDecision::Allowed { remaining: 9 }
        );
    }
}
