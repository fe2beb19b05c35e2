use std::time::{Duration, Instant};

use crate::state::TeleportState;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WaitError {
    #[error("teleport confirmation timed out after {0:?}")]
    TimedOut(Duration),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitStatus {
    Pending,
    Confirmed,
    EntityGone,
}

/// Poll-until-confirmed helper for callers that must not resume until the
/// teleport handshake completes. Checks at most once per `poll_interval`.
#[derive(Debug, Clone)]
pub struct ConfirmWait {
    started: Instant,
    timeout: Duration,
    poll_interval: Duration,
    next_check: Instant,
}

impl ConfirmWait {
    pub fn new(now: Instant, timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            started: now,
            timeout,
            poll_interval,
            next_check: now,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// `server_state` is `None` once the entity no longer exists.
    pub fn poll(&mut self, now: Instant, server_state: Option<TeleportState>) -> Result<WaitStatus, WaitError> {
        if now < self.next_check {
            return Ok(WaitStatus::Pending);
        }
        self.next_check = now + self.poll_interval;

        match server_state {
            None => Ok(WaitStatus::EntityGone),
            Some(state) if state.is_idle() => Ok(WaitStatus::Confirmed),
            Some(_) => {
                let waited = now.saturating_duration_since(self.started);
                if waited >= self.timeout {
                    Err(WaitError::TimedOut(waited))
                } else {
                    Ok(WaitStatus::Pending)
                }
            }
        }
    }
}
