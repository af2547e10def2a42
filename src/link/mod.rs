//! # Gateway link state machine
//!
//! The node talks to its gateway through a small set of handshakes: activation
//! (announce the program, receive addresses and thresholds), reporting queued
//! readings, reconnecting with exponential backoff after a lost link, and
//! re-fetching parameters on the gateway's request.
//!
//! ```text
//! TriggerActivate ──▶ WaitActivate ──▶ InitSensor ──▶ SendQueue ◀──────────┐
//!        ▲                                              │   │               │
//!        │                              send failure    │   │ ack flag      │
//!        │                                              ▼   ▼               │
//!        │                          TriggerReconnect   TriggerUpdateParam   │
//!        │                                 │ ▲                │             │
//!        │                                 ▼ │ timeout        ▼             │
//!        │                           WaitReconnect ──────▶ WaitUpdateParam   │
//!        │                                 └───── response ─────────────────┘
//!        └──────────────────────── retries exhausted / ack fault
//! ```
//!
//! Each state is handled by one method of [`Node`](crate::node::Node); the
//! handler returns a [`Transition`] with the next state and how long the caller
//! should idle before the next dispatch.

#![deny(unsafe_code)]

pub mod backoff;

use core::fmt;

/// Idle time meaning "dispatch again immediately".
pub const NO_SLEEP: u32 = 0;

/// Operating mode of the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkState {
    /// Broadcast an activation request.
    #[default]
    TriggerActivate,
    /// Wait for the activation response.
    WaitActivate,
    /// Take the first measurement of every sensor.
    InitSensor,
    /// Report queued readings.
    SendQueue,
    /// Broadcast a reconnect request once the backoff has passed.
    TriggerReconnect,
    /// Wait for the reconnect response.
    WaitReconnect,
    /// Ask the gateway for new parameters.
    TriggerUpdateParam,
    /// Wait for the new parameters.
    WaitUpdateParam,
    /// Enter firmware update. Not implemented.
    TriggerFirmwareUpdate,
    /// Wait for firmware update. Not implemented.
    WaitFirmwareUpdate,
}

impl LinkState {
    /// Human readable name.
    pub fn name(&self) -> &'static str {
        match self {
            LinkState::TriggerActivate => "trigger-activate",
            LinkState::WaitActivate => "wait-activate",
            LinkState::InitSensor => "init-sensor",
            LinkState::SendQueue => "send-queue",
            LinkState::TriggerReconnect => "trigger-reconnect",
            LinkState::WaitReconnect => "wait-reconnect",
            LinkState::TriggerUpdateParam => "trigger-update-param",
            LinkState::WaitUpdateParam => "wait-update-param",
            LinkState::TriggerFirmwareUpdate => "trigger-fw-update",
            LinkState::WaitFirmwareUpdate => "wait-fw-update",
        }
    }
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for LinkState {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{}", self.name())
    }
}

/// Outcome of one state handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// State to dispatch next.
    pub next: LinkState,
    /// Time to idle before that dispatch (ms).
    pub sleep_ms: u32,
}

impl Transition {
    /// Moves to `next` after `sleep_ms`.
    pub fn to(next: LinkState, sleep_ms: u32) -> Self {
        Self { next, sleep_ms }
    }

    /// Moves to `next` without idling.
    pub fn now(next: LinkState) -> Self {
        Self::to(next, NO_SLEEP)
    }
}

/// Bookkeeping of the link machine across dispatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Session {
    /// Current state.
    pub state: LinkState,
    /// Consecutive send failures of trigger states.
    pub fail: u8,
    /// Retry counter of the current handshake.
    pub retry: u8,
    /// Timestamp of the last transmission.
    pub tx_time: u32,
    /// Earliest time for the next reconnect attempt.
    pub backoff_time: u32,
    /// Backoff interval used for `backoff_time`.
    pub backoff_interval: u32,
    /// `backoff_time` has to be computed again.
    pub recompute_backoff: bool,
}
