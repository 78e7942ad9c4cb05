//! Timestamp helpers

use chrono::{DateTime, SubsecRound, Utc};

/// Current time truncated to millisecond precision, so stored timestamps
/// survive a JSON round-trip unchanged.
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}
