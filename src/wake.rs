//! Wake notification shared with interrupt handlers.
//!
//! An interrupt (timer, radio receive) sets the flag to cut the node's idle
//! period short. The main loop reads and clears it inside a critical section so
//! a wake-up raised between the read and the clear is never lost.
//!
//! ```rust
//! use subghz_iot::wake::WakeFlag;
//!
//! static WAKE: WakeFlag = WakeFlag::new();
//!
//! // In the interrupt handler:
//! WAKE.signal();
//!
//! // In the main loop:
//! assert!(WAKE.take());
//! assert!(!WAKE.take());
//! ```

#![deny(unsafe_code)]

use core::cell::Cell;

use critical_section::Mutex;

/// A single-slot wake-up notification.
pub struct WakeFlag {
    pending: Mutex<Cell<bool>>,
}

impl WakeFlag {
    /// Creates a cleared flag.
    pub const fn new() -> Self {
        Self {
            pending: Mutex::new(Cell::new(false)),
        }
    }

    /// Raises the flag. Safe to call from interrupt context.
    pub fn signal(&self) {
        critical_section::with(|cs| self.pending.borrow(cs).set(true));
    }

    /// Returns whether the flag is raised without clearing it.
    pub fn is_set(&self) -> bool {
        critical_section::with(|cs| self.pending.borrow(cs).get())
    }

    /// Clears the flag, returning whether it was raised.
    pub fn take(&self) -> bool {
        critical_section::with(|cs| self.pending.borrow(cs).replace(false))
    }
}

impl core::fmt::Debug for WakeFlag {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WakeFlag").field("pending", &self.is_set()).finish()
    }
}

impl Default for WakeFlag {
    fn default() -> Self {
        Self::new()
    }
}
