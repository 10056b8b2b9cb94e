//! Outbound send limiter
//!
//! Fixed window: at most `capacity` frames per `window_ms`. A rejected send is
//! simply not performed; nothing is queued.

/// Fixed-window limiter for outbound gateway frames
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimiter {
    enabled: bool,
    capacity: u32,
    window_ms: u64,
    window_start_at: u64,
    sent_count: u32,
}

impl RateLimiter {
    /// Frames allowed per window
    pub const CAPACITY: u32 = 120;
    /// Window length in milliseconds
    pub const WINDOW_MS: u64 = 60_000;

    /// Create a limiter with the platform budget, or a pass-through one when disabled
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            capacity: Self::CAPACITY,
            window_ms: Self::WINDOW_MS,
            window_start_at: 0,
            sent_count: 0,
        }
    }

    /// Create an enabled limiter with custom limits
    #[must_use]
    pub fn with_limits(capacity: u32, window_ms: u64) -> Self {
        Self {
            capacity,
            window_ms,
            ..Self::new(true)
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn sent_count(&self) -> u32 {
        self.sent_count
    }

    pub fn window_start_at(&self) -> u64 {
        self.window_start_at
    }

    /// Start a fresh window at `now`
    pub fn reset(&mut self, now: u64) {
        self.window_start_at = now;
        self.sent_count = 0;
    }

    /// Start a new window if the current one has run out; returns whether it did
    pub fn refresh(&mut self, now: u64) -> bool {
        if !self.enabled || now.saturating_sub(self.window_start_at) <= self.window_ms {
            return false;
        }
        tracing::trace!(sent = self.sent_count, "Rate window reset");
        self.reset(now);
        true
    }

    /// Take one send from the budget
    pub fn try_consume(&mut self, now: u64) -> bool {
        if !self.enabled {
            return true;
        }
        self.refresh(now);
        if self.sent_count >= self.capacity {
            return false;
        }
        self.sent_count += 1;
        true
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(true)
    }
}
