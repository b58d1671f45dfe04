//! Local-vs-server clock offset tracking.

use parking_lot::RwLock;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::time::Instant;

/// The `Date` header has second precision; assume the midpoint of that second.
const DATE_HEADER_MIDPOINT_MS: i64 = 500;

/// Current local wall-clock time in milliseconds since the Unix epoch.
pub fn local_now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

#[derive(Debug)]
struct ClockState {
    /// `server_time - local_time` in milliseconds.
    offset_ms: i64,
    synced_at: Option<Instant>,
}

/// Keeps signed timestamps inside the exchange's receive window.
///
/// Read by every signed request, written only through `resync*`.
#[derive(Debug)]
pub struct ClockGuard {
    state: RwLock<ClockState>,
}

impl Default for ClockGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockGuard {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(ClockState {
                offset_ms: 0,
                synced_at: None,
            }),
        }
    }

    /// Offset in milliseconds (`server - local`).
    pub fn current_offset(&self) -> i64 {
        self.state.read().offset_ms
    }

    /// Estimated current server time in milliseconds.
    pub fn timestamp_ms(&self) -> i64 {
        local_now_ms() + self.current_offset()
    }

    /// Record a server timestamp observed now. Returns the new offset.
    pub fn resync(&self, server_time_ms: i64) -> i64 {
        self.resync_at(server_time_ms, local_now_ms())
    }

    /// Record a server timestamp fetched with the given round trip.
    ///
    /// The server stamped the response roughly half a round trip ago.
    pub fn resync_with_rtt(&self, server_time_ms: i64, rtt: Duration) -> i64 {
        let half_rtt = (rtt.as_millis() / 2) as i64;
        self.resync_at(server_time_ms + half_rtt, local_now_ms())
    }

    pub(crate) fn resync_at(&self, server_time_ms: i64, local_time_ms: i64) -> i64 {
        let offset = server_time_ms - local_time_ms;
        let mut state = self.state.write();
        state.offset_ms = offset;
        state.synced_at = Some(Instant::now());
        offset
    }

    /// When the offset was last refreshed.
    pub fn last_synced(&self) -> Option<Instant> {
        self.state.read().synced_at
    }

    /// True if never synced or the last sync is older than `max_age`.
    pub fn needs_resync(&self, max_age: Duration) -> bool {
        self.last_synced()
            .map_or(true, |at| at.elapsed() >= max_age)
    }
}

/// Server time estimate from an HTTP `Date` header (RFC 2822 / IMF-fixdate).
pub(crate) fn server_time_from_date_header(value: &str) -> Option<i64> {
    chrono::DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(|dt| dt.timestamp_millis() + DATE_HEADER_MIDPOINT_MS)
}
