//! Heartbeat scheduling
//!
//! Tracks when the next heartbeat is due and whether the server has stopped
//! acknowledging them. Times are milliseconds on the client's monotonic clock.

use rand::Rng;

/// Heartbeat timer state
///
/// Inactive (interval 0) until a Hello arrives. The first beat after `start` is
/// sent after a random delay in `[0, interval)`, every later one after `interval`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeartbeatScheduler {
    interval_ms: u64,
    first_delay_ms: Option<u64>,
    last_send_at: u64,
    last_ack_at: Option<u64>,
    unacked_since: Option<u64>,
}

impl HeartbeatScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start beating at `interval_ms` with a random first delay
    pub fn start(&mut self, interval_ms: u64, now: u64) {
        let jitter = if interval_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..interval_ms)
        };
        self.start_with_first_delay(interval_ms, jitter, now);
    }

    /// Start beating with a fixed first delay
    pub fn start_with_first_delay(&mut self, interval_ms: u64, first_delay_ms: u64, now: u64) {
        self.interval_ms = interval_ms;
        self.first_delay_ms = Some(first_delay_ms);
        self.last_send_at = now;
        self.last_ack_at = Some(now);
        self.unacked_since = None;
        tracing::debug!(interval_ms, first_delay_ms, "Heartbeat started");
    }

    /// Stop beating and forget all timing state
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_active(&self) -> bool {
        self.interval_ms > 0
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    pub fn last_send_at(&self) -> u64 {
        self.last_send_at
    }

    pub fn last_ack_at(&self) -> Option<u64> {
        self.last_ack_at
    }

    /// Time of the oldest heartbeat that has not been acknowledged
    pub fn unacked_since(&self) -> Option<u64> {
        self.unacked_since
    }

    /// Time at which the next heartbeat should go out
    pub fn next_due_at(&self) -> Option<u64> {
        self.is_active().then(|| {
            self.last_send_at
                .saturating_add(self.first_delay_ms.unwrap_or(self.interval_ms))
        })
    }

    pub fn is_due(&self, now: u64) -> bool {
        self.next_due_at().is_some_and(|due| now >= due)
    }

    /// Record a heartbeat that went out at `now`
    pub fn record_send(&mut self, now: u64) {
        self.last_send_at = now;
        self.first_delay_ms = None;
        self.unacked_since.get_or_insert(now);
    }

    /// Record a Heartbeat ACK received at `now`
    pub fn record_ack(&mut self, now: u64) {
        self.last_ack_at = Some(now);
        self.unacked_since = None;
    }

    /// A heartbeat has gone unacknowledged for longer than one interval
    pub fn is_stalled(&self, now: u64) -> bool {
        self.is_active()
            && self
                .unacked_since
                .is_some_and(|since| now.saturating_sub(since) > self.interval_ms)
    }
}
