//! Playback state machine
//!
//! ```text
//!          begin            Started(id)
//!   Idle ───────► Pending ─────────────► Speaking
//!    ▲               │                      │
//!    └───────────────┴──────────────────────┘
//!      cancel / Ended(id) / Failed(id) / abandon
//! ```
//!
//! Events carry the request id they belong to. Anything that does not match
//! the active request is stale and ignored. Ids are unique across the
//! process, so controllers listening on the same provider never confuse
//! each other's requests.

use crate::speech::{RequestId, Utterance, VoiceDescriptor};
use log::debug;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_REQUEST: AtomicU64 = AtomicU64::new(1);

/// Playback state as shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Speaking,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    /// Submitted, waiting for the provider to confirm it started
    Pending(RequestId),
    Speaking(RequestId),
}

/// Tracks the single in-flight request
#[derive(Debug)]
pub struct Playback {
    phase: Phase,
    active: Option<Utterance>,
}

impl Default for Playback {
    fn default() -> Self {
        Self::new()
    }
}

impl Playback {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            active: None,
        }
    }

    /// `Speaking` only once the provider has confirmed the start
    pub fn state(&self) -> PlaybackState {
        match self.phase {
            Phase::Speaking(_) => PlaybackState::Speaking,
            Phase::Idle | Phase::Pending(_) => PlaybackState::Idle,
        }
    }

    /// True while a request is submitted or speaking
    pub fn is_active(&self) -> bool {
        self.phase != Phase::Idle
    }

    /// The request currently in flight
    pub fn active(&self) -> Option<&Utterance> {
        self.active.as_ref()
    }

    fn active_id(&self) -> Option<RequestId> {
        match self.phase {
            Phase::Idle => None,
            Phase::Pending(id) | Phase::Speaking(id) => Some(id),
        }
    }

    /// Create the next request and mark it pending
    ///
    /// Must only be called while idle.
    pub fn begin(&mut self, text: &str, voice: Option<VoiceDescriptor>) -> Utterance {
        debug_assert!(!self.is_active(), "begin while a request is in flight");

        let id = NEXT_REQUEST.fetch_add(1, Ordering::Relaxed);

        let utterance = Utterance {
            id,
            text: text.to_string(),
            voice,
        };
        debug!("Request {} pending", id);
        self.phase = Phase::Pending(id);
        self.active = Some(utterance.clone());
        utterance
    }

    /// Provider confirmed synthesis started
    pub fn started(&mut self, id: RequestId) -> bool {
        if self.phase != Phase::Pending(id) {
            debug!("Ignoring start for request {} in {:?}", id, self.phase);
            return false;
        }
        debug!("Request {} speaking", id);
        self.phase = Phase::Speaking(id);
        true
    }

    /// Provider reported completion or failure of a request
    pub fn finished(&mut self, id: RequestId) -> bool {
        if self.active_id() != Some(id) {
            debug!("Ignoring stale finish for request {}", id);
            return false;
        }
        debug!("Request {} finished", id);
        self.reset();
        true
    }

    /// User stopped playback; returns the request that was cut short
    pub fn cancel(&mut self) -> Option<RequestId> {
        let id = self.active_id();
        self.reset();
        id
    }

    fn reset(&mut self) {
        self.phase = Phase::Idle;
        self.active = None;
    }
}
