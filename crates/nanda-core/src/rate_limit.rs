pub const DEFAULT_LIMIT_PER_MIN: u32 = 60;

const WINDOW_SECS: u64 = 60;

/// Fixed-window admission counter aligned to wall-clock minutes.
///
/// Not synchronized; callers keep it behind the session lock.
#[derive(Debug, Clone)]
pub struct FixedWindowLimiter {
    limit: u32,
    window_id: u64,
    count: u32,
}

impl FixedWindowLimiter {
    pub fn new(limit_per_min: u32) -> Self {
        Self {
            limit: limit_per_min,
            window_id: 0,
            count: 0,
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Admissions recorded in the current window.
    pub fn window_count(&self) -> u32 {
        self.count
    }

    pub fn admit(&mut self) -> bool {
        self.admit_at(crate::epoch_secs())
    }

    /// Admission check against an explicit epoch-seconds clock reading.
    pub fn admit_at(&mut self, now_secs: u64) -> bool {
        let window = now_secs / WINDOW_SECS;
        if window != self.window_id {
            self.window_id = window;
            self.count = 0;
        }
        if self.count >= self.limit {
            return false;
        }
        self.count += 1;
        true
    }
}

impl Default for FixedWindowLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_LIMIT_PER_MIN)
    }
}
