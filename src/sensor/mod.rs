//! # Sensor sampling and hysteresis
//!
//! Every configured sensor slot runs its own hysteresis machine (see
//! [`SensorState`]). A threshold crossing has to persist for the configured
//! interval before it is confirmed; a zero interval trips immediately. Confirmed
//! crossings, and keep-alive reports for sensors that have been quiet for too
//! long, are written to the reading queue.
//!
//! The hardware side is reached through the [`SensorDriver`] trait.
//!
//! ```text
//!              value > on                  on interval elapsed
//! ┌───────────┐ ─────────▶ ┌─────────────┐ ──────────────────▶ ┌──────────┐
//! │ OffStable │            │ OffUnstable │                     │ OnStable │
//! └───────────┘ ◀───────── └─────────────┘                     └──────────┘
//!              value <= on
//! ```
//!
//! The on side mirrors the diagram with the off threshold and interval.

#![deny(unsafe_code)]

mod state;

pub use state::SensorState;

use crate::error::Error;
use crate::queue::RingQueue;
use crate::reading::{Reading, Switch, Value, VoltageLevel};

/// Default number of sensor slots.
pub const DEFAULT_MAX_SENSORS: usize = 4;

/// Threshold used by a slot that has not been configured yet.
const UNCONFIGURED_THRESHOLD: f64 = 0.1;

/// A raw measurement returned by a [`SensorDriver`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Measurement {
    /// The measured value.
    pub value: Value,
    /// Decimal digits used when the value is reported.
    pub digits: u8,
    /// Optional driver-specific reason code, reported with off readings.
    pub reason: Option<i32>,
}

/// Hardware access for the sensors of a node.
pub trait SensorDriver {
    /// Measures the sensor with the given gateway-assigned index.
    fn measure(&mut self, index: u16) -> Measurement;

    /// Powers the sensors up.
    ///
    /// Returns `true` when the sensors need a warm-up period before the first
    /// measurement.
    fn activate(&mut self) -> bool;

    /// Powers the sensors down.
    fn deactivate(&mut self);

    /// Reads the current supply voltage level.
    fn voltage_level(&mut self) -> VoltageLevel;
}

/// On and off thresholds of one sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// The value has to exceed this to switch on.
    pub on_value: f64,
    /// How long the value has to stay above `on_value` (ms).
    pub on_interval_ms: u32,
    /// The value has to fall below this to switch off.
    pub off_value: f64,
    /// How long the value has to stay below `off_value` (ms).
    pub off_interval_ms: u32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            on_value: UNCONFIGURED_THRESHOLD,
            on_interval_ms: 0,
            off_value: UNCONFIGURED_THRESHOLD,
            off_interval_ms: 0,
        }
    }
}

/// Persistent state of one sensor slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorSlot {
    /// Gateway-assigned index, `None` while the slot is unused.
    pub index: Option<u16>,
    /// Last measurement.
    pub measurement: Measurement,
    /// Last measured value widened for comparison.
    pub comp_value: f64,
    /// Configured thresholds.
    pub thresholds: Thresholds,
    /// Start of the current on-side unstable period.
    pub on_start: u32,
    /// Start of the current off-side unstable period.
    pub off_start: u32,
    /// Current hysteresis state.
    pub state: SensorState,
    /// Supply voltage captured at the last save.
    pub voltage: VoltageLevel,
    /// Timestamp of the last reading written to the queue.
    pub last_save: u32,
    /// A reading has to be written at the end of this pass.
    pub save_request: bool,
}

impl SensorSlot {
    /// An unused slot with default thresholds.
    pub fn unassigned() -> Self {
        Self {
            index: None,
            measurement: Measurement::default(),
            comp_value: 0.0,
            thresholds: Thresholds::default(),
            on_start: 0,
            off_start: 0,
            state: SensorState::OffStable,
            voltage: VoltageLevel::default(),
            last_save: 0,
            save_request: false,
        }
    }

    /// Builds the queue entry for the current state of the slot.
    pub fn reading(&self, time: u32) -> Reading {
        Reading {
            value: self.measurement.value,
            digits: self.measurement.digits,
            index: self.index.unwrap_or_default(),
            state: if self.state.is_on() { Switch::On } else { Switch::Off },
            voltage: self.voltage,
            reason: self.measurement.reason,
            time,
        }
    }
}

impl Default for SensorSlot {
    fn default() -> Self {
        Self::unassigned()
    }
}

/// The fixed set of sensor slots of a node.
#[derive(Debug)]
pub struct SensorBank<const M: usize> {
    slots: [SensorSlot; M],
    keep_alive_ms: u32,
}

impl<const M: usize> SensorBank<M> {
    /// Creates a bank of unassigned slots.
    pub fn new(keep_alive_ms: u32) -> Self {
        Self {
            slots: [SensorSlot::unassigned(); M],
            keep_alive_ms,
        }
    }

    /// All slots in processing order.
    pub fn slots(&self) -> &[SensorSlot] {
        &self.slots
    }

    /// Mutable access to a slot.
    pub fn slot_mut(&mut self, slot: usize) -> Option<&mut SensorSlot> {
        self.slots.get_mut(slot)
    }

    /// Assigns an index and thresholds to a slot.
    pub fn configure(&mut self, slot: usize, index: u16, thresholds: Thresholds) -> Result<(), Error> {
        let s = self.slots.get_mut(slot).ok_or(Error::IndexOutOfRange)?;
        s.index = Some(index);
        s.thresholds = thresholds;
        Ok(())
    }

    /// Requests a save from every slot on the next pass.
    pub fn force_save_all(&mut self) {
        for slot in self.slots.iter_mut() {
            slot.save_request = true;
        }
    }

    fn measure_all<D: SensorDriver>(&mut self, driver: &mut D) {
        for slot in self.slots.iter_mut() {
            if let Some(index) = slot.index {
                slot.measurement = driver.measure(index);
            }
        }
    }

    /// Derives the initial state of every assigned slot from a fresh
    /// measurement and queues that first reading unconditionally.
    pub fn initialize<D: SensorDriver, const N: usize>(
        &mut self,
        driver: &mut D,
        now: u32,
        queue: &mut RingQueue<Reading, N>,
    ) {
        self.measure_all(driver);
        for slot in self.slots.iter_mut().filter(|s| s.index.is_some()) {
            slot.comp_value = slot.measurement.value.as_f64();
            slot.on_start = 0;
            slot.off_start = 0;
            slot.voltage = driver.voltage_level();
            slot.last_save = now;
            slot.state = if slot.comp_value >= slot.thresholds.off_value {
                SensorState::OnStable
            } else {
                SensorState::OffStable
            };
            if queue.write(slot.reading(now)).is_err() {
                warn!("initial reading dropped, queue full");
            }
        }
    }

    /// Runs one sampling pass over all assigned slots.
    ///
    /// Returns the number of readings written to the queue.
    pub fn sample<D: SensorDriver, const N: usize>(
        &mut self,
        driver: &mut D,
        now: u32,
        queue: &mut RingQueue<Reading, N>,
    ) -> usize {
        self.measure_all(driver);
        let mut saved = 0;
        for slot in self.slots.iter_mut().filter(|s| s.index.is_some()) {
            slot.comp_value = slot.measurement.value.as_f64();
            slot.judge(now);
            if now.wrapping_sub(slot.last_save) >= self.keep_alive_ms {
                debug!("keep alive");
                slot.save_request = true;
            }
            if slot.save_request {
                slot.save_request = false;
                slot.voltage = driver.voltage_level();
                match queue.write(slot.reading(now)) {
                    Ok(()) => {
                        slot.last_save = now;
                        saved += 1;
                    }
                    Err(_) => warn!("reading dropped, queue full"),
                }
            }
        }
        saved
    }
}

#[cfg(test)]
mod tests;
