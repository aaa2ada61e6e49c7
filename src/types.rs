// src/types.rs

//! Small value types shared across the cache.

use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Canonical task name type used throughout the cache.
pub type TaskName = String;

/// Default fuzz window added to a task's last-run stamp before comparing it
/// against file modification times.
pub const DEFAULT_SKEW: Duration = Duration::from_millis(50);

/// Wall-clock instant with millisecond resolution.
///
/// Stored as milliseconds since the Unix epoch so it can be persisted in a
/// section and compared cheaply against file modification times.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    pub const fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    pub const fn as_millis(self) -> u64 {
        self.0
    }

    /// Convert a filesystem time. Times before the epoch clamp to zero.
    pub fn from_system_time(time: SystemTime) -> Self {
        let ms = time
            .duration_since(UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or(0);
        Self(ms)
    }

    pub fn to_system_time(self) -> SystemTime {
        UNIX_EPOCH + Duration::from_millis(self.0)
    }

    pub fn saturating_add(self, d: Duration) -> Self {
        let add = u64::try_from(d.as_millis()).unwrap_or(u64::MAX);
        Self(self.0.saturating_add(add))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// Options accepted by the source-fetch operations.
///
/// Mirrors the knobs a build step can pass when asking for its sources:
///
/// - `always_pass_through`: `cache_all_src` re-emits everything even when
///   nothing changed.
/// - `base`: override the computed base path of every result.
/// - `since`: only consider files modified after this time.
/// - `follow`: descend into symlinked directories during real scans.
/// - `allow_empty`: do not fail when a literal path matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceOptions {
    pub always_pass_through: bool,
    pub base: Option<PathBuf>,
    pub since: Option<Timestamp>,
    pub follow: bool,
    pub allow_empty: bool,
}

impl SourceOptions {
    pub fn with_base(mut self, base: impl Into<PathBuf>) -> Self {
        self.base = Some(base.into());
        self
    }

    pub fn always_pass_through(mut self, val: bool) -> Self {
        self.always_pass_through = val;
        self
    }

    pub fn since(mut self, since: Timestamp) -> Self {
        self.since = Some(since);
        self
    }

    pub fn follow(mut self, val: bool) -> Self {
        self.follow = val;
        self
    }

    pub fn allow_empty(mut self, val: bool) -> Self {
        self.allow_empty = val;
        self
    }
}
