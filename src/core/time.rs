//! Wall-clock capture.
//!
//! Timestamps are metadata only: they are stamped onto drafts and exports
//! but excluded from every content-addressed identity. The engine takes a
//! `Clock` so a pass stays a pure function of its inputs.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Milliseconds since the Unix epoch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WallClock(pub u64);

impl WallClock {
    pub fn now() -> Self {
        use std::time::{SystemTime, UNIX_EPOCH};
        let ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        Self(ms)
    }

    /// RFC 3339 rendering for export stamps.
    pub fn to_rfc3339(self) -> String {
        let nanos = i128::from(self.0) * 1_000_000;
        OffsetDateTime::from_unix_timestamp_nanos(nanos)
            .ok()
            .and_then(|dt| dt.format(&Rfc3339).ok())
            .unwrap_or_else(|| "1970-01-01T00:00:00Z".to_string())
    }
}

/// Time source for commands and passes.
///
/// `Fixed` pins every stamp, which is what the determinism tests rely on.
#[derive(Clone, Copy, Debug)]
pub enum Clock {
    System,
    Fixed(WallClock),
}

impl Clock {
    pub fn now(&self) -> WallClock {
        match self {
            Clock::System => WallClock::now(),
            Clock::Fixed(at) => *at,
        }
    }
}

impl Default for Clock {
    fn default() -> Self {
        Clock::System
    }
}
