use std::time::Instant;

use crate::rate_limit::FixedWindowLimiter;

/// Process-wide mutable state. Lives behind one exclusive lock owned by the
/// server; nothing in here synchronizes on its own.
#[derive(Debug)]
pub struct SessionState {
    started: Instant,
    started_epoch_secs: f64,
    message_count: u64,
    last_output: String,
    limiter: FixedWindowLimiter,
}

impl SessionState {
    pub fn new(limiter: FixedWindowLimiter) -> Self {
        Self {
            started: Instant::now(),
            started_epoch_secs: crate::epoch_secs_f64(),
            message_count: 0,
            last_output: String::new(),
            limiter,
        }
    }

    /// Whole seconds since the session was created.
    pub fn uptime_secs(&self) -> u64 {
        self.started.elapsed().as_secs()
    }

    /// Session start as epoch seconds, truncated like the persisted metric.
    pub fn started_epoch_secs(&self) -> f64 {
        self.started_epoch_secs.trunc()
    }

    pub fn message_count(&self) -> u64 {
        self.message_count
    }

    pub fn last_output(&self) -> &str {
        &self.last_output
    }

    pub fn limiter(&self) -> &FixedWindowLimiter {
        &self.limiter
    }

    pub fn limiter_mut(&mut self) -> &mut FixedWindowLimiter {
        &mut self.limiter
    }

    /// Record an accepted message and return the new message count.
    pub fn record_output(&mut self, output: String) -> u64 {
        self.last_output = output;
        self.message_count += 1;
        self.message_count
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(FixedWindowLimiter::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty() {
        let session = SessionState::default();
        assert_eq!(session.message_count(), 0);
        assert_eq!(session.last_output(), "");
        assert_eq!(session.uptime_secs(), 0);
        assert_eq!(session.limiter().limit(), 60);
        assert!(session.started_epoch_secs() > 0.0);
        assert_eq!(session.started_epoch_secs().fract(), 0.0);
    }

    #[test]
    fn record_output_tracks_latest_and_counts() {
        let mut session = SessionState::new(FixedWindowLimiter::new(5));
        assert_eq!(session.record_output("[nanda-go] a".into()), 1);
        assert_eq!(session.record_output("[nanda-go] b".into()), 2);
        assert_eq!(session.last_output(), "[nanda-go] b");
        assert_eq!(session.message_count(), 2);
    }

    #[test]
    fn limiter_is_reachable_through_session() {
        let mut session = SessionState::new(FixedWindowLimiter::new(1));
        assert!(session.limiter_mut().admit_at(120));
        assert!(!session.limiter_mut().admit_at(121));
        assert_eq!(session.limiter().window_count(), 1);
    }
}
