//! Ordering and pacing of per-phase content list refreshes.
//!
//! Refresh requests for the same phase can overlap. Every request is stamped
//! and a response is only applied while its stamp is still the latest one
//! issued for that phase.

use std::{collections::HashMap, time::Duration};

use shared::domain::MerrillQuadrant;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

use crate::config::AuthoringSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshStamp {
    quadrant: MerrillQuadrant,
    sequence: u64,
}

impl RefreshStamp {
    pub fn quadrant(&self) -> MerrillQuadrant {
        self.quadrant
    }
}

#[derive(Debug, Default)]
pub struct RefreshSequencer {
    latest: HashMap<MerrillQuadrant, u64>,
}

impl RefreshSequencer {
    pub fn issue(&mut self, quadrant: MerrillQuadrant) -> RefreshStamp {
        let sequence = self.latest.entry(quadrant).or_insert(0);
        *sequence += 1;
        RefreshStamp {
            quadrant,
            sequence: *sequence,
        }
    }

    pub fn is_current(&self, stamp: &RefreshStamp) -> bool {
        let current = self.latest.get(&stamp.quadrant) == Some(&stamp.sequence);
        if !current {
            debug!(quadrant = ?stamp.quadrant, sequence = stamp.sequence, "refresh: dropping stale response");
        }
        current
    }
}

/// Collapses bursts of change notifications into one refresh after a quiet
/// period.
#[derive(Debug)]
pub struct RefreshDebouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl RefreshDebouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn from_settings(settings: &AuthoringSettings) -> Self {
        Self::new(settings.content_refresh_debounce())
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Starts the quiet period over.
    pub fn schedule(&mut self) {
        self.deadline = Some(Instant::now() + self.delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Consumes the pending refresh if its quiet period is over.
    pub fn take_due(&mut self) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= Instant::now() => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Waits out the pending quiet period. Returns false when nothing was
    /// scheduled.
    pub async fn wait_due(&mut self) -> bool {
        let Some(deadline) = self.deadline else {
            return false;
        };
        sleep_until(deadline).await;
        self.deadline = None;
        true
    }
}

impl Default for RefreshDebouncer {
    fn default() -> Self {
        Self::from_settings(&AuthoringSettings::default())
    }
}
