//! Calendar bucketing of absolute instants.
//!
//! Two policies exist and are deliberately separate types so one cannot be
//! passed where the other is expected:
//! - [`LocalPolicy`] formats the wall-clock time in a configured IANA zone
//!   (default `Asia/Jakarta`). Dashboards and monthly reports use it.
//! - [`UtcPolicy`] reads UTC calendar fields directly. Only the 24h
//!   accumulated-rainfall report uses it.
//!
//! Keys are produced by formatting the zoned datetime, never by dividing
//! the UNIX timestamp, so zones with DST or non-hour offsets bucket
//! correctly.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Default zone for dashboards and local-day reports.
pub const DEFAULT_LOCAL_TZ: Tz = chrono_tz::Asia::Jakarta;

const DATE_FORMAT: &str = "%Y-%m-%d";
const HOUR_FORMAT: &str = "%Y-%m-%dT%H";

/// Date and hour bucket for one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketKeys {
    /// `YYYY-MM-DD`
    pub date_key: String,
    /// `YYYY-MM-DDTHH`
    pub hour_key: String,
}

/// Wall-clock bucketing in a fixed IANA timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalPolicy {
    tz: Tz,
}

impl Default for LocalPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_LOCAL_TZ)
    }
}

impl LocalPolicy {
    // ---
    pub const fn new(tz: Tz) -> Self {
        Self { tz }
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub fn keys(&self, instant: DateTime<Utc>) -> BucketKeys {
        // ---
        let local = instant.with_timezone(&self.tz);
        BucketKeys {
            date_key: local.format(DATE_FORMAT).to_string(),
            hour_key: local.format(HOUR_FORMAT).to_string(),
        }
    }

    pub fn date_key(&self, instant: DateTime<Utc>) -> String {
        instant.with_timezone(&self.tz).format(DATE_FORMAT).to_string()
    }
}

/// Strict UTC calendar-day bucketing.
///
/// Offers the same date/hour key pair as [`LocalPolicy`]. The counter
/// reducer only needs [`UtcPolicy::date_key`]; [`UtcPolicy::keys`] serves
/// callers that report UTC hours next to local ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UtcPolicy;

impl UtcPolicy {
    // ---
    pub fn keys(&self, instant: DateTime<Utc>) -> BucketKeys {
        BucketKeys {
            date_key: self.date_key(instant),
            hour_key: instant.format(HOUR_FORMAT).to_string(),
        }
    }

    pub fn date_key(&self, instant: DateTime<Utc>) -> String {
        instant.date_naive().format(DATE_FORMAT).to_string()
    }
}
