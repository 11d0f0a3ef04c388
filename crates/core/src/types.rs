// crates/core/src/types.rs
//! Shared types for the load-generator core.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Unique identifier for a spawned CPU worker. Never reused within a process.
pub type WorkerId = u64;

/// Result of a start request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// A new job was started.
    Started,
    /// A job was already running; nothing was changed.
    AlreadyRunning,
}

impl StartOutcome {
    /// Plain-text form used on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            StartOutcome::Started => "started",
            StartOutcome::AlreadyRunning => "already_running",
        }
    }
}

/// Point-in-time view of the job, flattened for the status endpoint and the
/// WebSocket push channel.
///
/// Field names and the epoch-seconds timestamp encoding are the wire format;
/// don't rename without versioning the API.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct StatusView {
    pub running: bool,
    pub started_at: Option<f64>,
    pub ends_at: Option<f64>,
    pub mem_mib: u64,
    pub cpu_workers: u64,
    pub worker_ids: Vec<WorkerId>,
    pub note: String,
    pub ticks: u64,
    pub now: f64,
    pub remaining_seconds: Option<i64>,
    pub mem_blocks_mib: u64,
}

/// Convert a timestamp to fractional epoch seconds for the wire.
pub(crate) fn epoch_secs(t: DateTime<Utc>) -> f64 {
    t.timestamp_micros() as f64 / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_outcome_wire_strings() {
        assert_eq!(StartOutcome::Started.as_str(), "started");
        assert_eq!(StartOutcome::AlreadyRunning.as_str(), "already_running");
    }

    #[test]
    fn test_status_view_json_round_trip() {
        let view = StatusView {
            running: true,
            started_at: Some(1000.0),
            ends_at: Some(1120.0),
            mem_mib: 1900,
            cpu_workers: 2,
            worker_ids: vec![1, 2],
            note: String::new(),
            ticks: 3,
            now: 1010.5,
            remaining_seconds: Some(109),
            mem_blocks_mib: 1900,
        };
        let json = serde_json::to_string(&view).unwrap();
        for field in [
            "running",
            "started_at",
            "ends_at",
            "mem_mib",
            "cpu_workers",
            "worker_ids",
            "note",
            "ticks",
            "now",
            "remaining_seconds",
            "mem_blocks_mib",
        ] {
            assert!(json.contains(field), "missing field {field} in {json}");
        }

        // The wire format must read back without loss.
        let back: StatusView = serde_json::from_str(&json).unwrap();
        assert!(back.running);
        assert_eq!(back.started_at, view.started_at);
        assert_eq!(back.ends_at, view.ends_at);
        assert_eq!(back.worker_ids, view.worker_ids);
        assert_eq!(back.remaining_seconds, view.remaining_seconds);
        assert_eq!(back.ticks, view.ticks);
        assert_eq!(back.mem_blocks_mib, view.mem_blocks_mib);
    }

    #[test]
    fn test_epoch_secs_subsecond_precision() {
        let t = DateTime::from_timestamp(1_700_000_000, 250_000_000).unwrap();
        let secs = epoch_secs(t);
        assert!((secs - 1_700_000_000.25).abs() < 1e-6);
    }
}
