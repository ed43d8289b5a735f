//! Connection liveness.
//!
//! Contact is checked lazily: nothing times out in the background, a
//! participant just reads as disconnected once the window has passed.

use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;

use crate::participants::ParticipantId;

/// Last-contact bookkeeping for responsive participants.
#[derive(Clone, Debug)]
pub struct LivenessTracker {
    window: Duration,
    contacts: FxHashMap<ParticipantId, Instant>,
}

impl LivenessTracker {
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            contacts: FxHashMap::default(),
        }
    }

    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn record_contact(&mut self, id: &ParticipantId, now: Instant) {
        self.contacts.insert(id.clone(), now);
    }

    /// True until `window` has elapsed since the last contact, or if no
    /// contact was ever recorded.
    #[must_use]
    pub fn is_connected(&self, id: &ParticipantId, now: Instant) -> bool {
        match self.contacts.get(id) {
            Some(&last) => now.saturating_duration_since(last) < self.window,
            None => true,
        }
    }

    #[must_use]
    pub fn last_contact(&self, id: &ParticipantId) -> Option<Instant> {
        self.contacts.get(id).copied()
    }

    pub fn forget(&mut self, id: &ParticipantId) {
        self.contacts.remove(id);
    }

    pub fn clear(&mut self) {
        self.contacts.clear();
    }
}
