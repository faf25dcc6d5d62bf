//! Last-cycle snapshot backing the human status page and JSON endpoint.
//!
//! The poller replaces the snapshot at the end of every cycle; HTTP
//! handlers only read it. The lock is the sole cross-cycle shared state
//! besides the metrics registry.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::RwLock;
use serde::Serialize;

/// One direction's channel table, raw cell values in header order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableStatus {
    pub header: Vec<String>,
    pub channels: Vec<Vec<String>>,
}

/// Everything the last poll cycle learned.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatusSnapshot {
    /// The modem status page URL being polled.
    pub source_url: String,
    /// Unix timestamp of the last completed cycle, if any.
    pub last_poll_unix: Option<u64>,
    /// Message of the most recent cycle failure, cleared on success.
    pub last_error: Option<String>,
    /// Completed cycles since startup.
    pub cycles: u64,
    pub downstream: TableStatus,
    pub upstream: TableStatus,
}

impl StatusSnapshot {
    /// Ready means at least one cycle has completed since startup.
    pub fn ready(&self) -> bool {
        self.last_poll_unix.is_some()
    }
}

/// Shared handle to the snapshot.
pub type SharedStatus = Arc<RwLock<StatusSnapshot>>;

/// Create the shared snapshot for a given source URL.
pub fn shared(source_url: &str) -> SharedStatus {
    Arc::new(RwLock::new(StatusSnapshot {
        source_url: source_url.to_string(),
        ..StatusSnapshot::default()
    }))
}

/// Current time as a unix timestamp.
pub fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ready_after_first_cycle() {
        let status = shared("http://modem/status_cgi");
        assert!(!status.read().ready());

        {
            let mut snapshot = status.write();
            snapshot.last_poll_unix = Some(now_unix());
            snapshot.cycles = 1;
        }
        assert!(status.read().ready());
        assert_eq!(status.read().source_url, "http://modem/status_cgi");
    }
}
