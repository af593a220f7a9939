//! Time utilities for the simulation clock and service uptime

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Get current Unix timestamp in milliseconds
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as u64
}

/// Server start time for uptime tracking
static SERVER_START: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Initialize server start time (call once at startup)
pub fn init_server_time() {
    SERVER_START.get_or_init(Instant::now);
}

/// Get server uptime in seconds
pub fn uptime_secs() -> u64 {
    SERVER_START
        .get()
        .map(|start| start.elapsed().as_secs())
        .unwrap_or(0)
}

/// Default render/simulation rate
pub const DEFAULT_FRAME_RATE: u32 = 60;

/// Default room poll period
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// Default bound on a single store round-trip
pub const DEFAULT_STORE_TIMEOUT_MS: u64 = 5000;

/// Duration of one frame at `frame_rate` frames per second
pub fn frame_duration(frame_rate: u32) -> Duration {
    Duration::from_micros(1_000_000 / u64::from(frame_rate.max(1)))
}

/// Millisecond clock for the simulation.
///
/// Anchored to wall time so both peers of a room agree on spawn and cooldown
/// timestamps, but advanced by the tokio clock so it can be paused in tests.
#[derive(Debug, Clone, Copy)]
pub struct SimClock {
    epoch_ms: u64,
    started: tokio::time::Instant,
}

impl SimClock {
    pub fn new() -> Self {
        Self {
            epoch_ms: unix_millis(),
            started: tokio::time::Instant::now(),
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.epoch_ms + self.started.elapsed().as_millis() as u64
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new()
    }
}
