//! Hysteresis transitions of a single sensor slot.

use super::SensorSlot;

/// Debounced on/off state of a sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SensorState {
    /// Off and below the on threshold.
    #[default]
    OffStable,
    /// Off, above the on threshold, waiting for the on interval to pass.
    OffUnstable,
    /// On and above the off threshold.
    OnStable,
    /// On, below the off threshold, waiting for the off interval to pass.
    OnUnstable,
}

impl SensorState {
    /// Returns `true` for both on states.
    pub fn is_on(&self) -> bool {
        matches!(self, SensorState::OnStable | SensorState::OnUnstable)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for SensorState {
    fn format(&self, f: defmt::Formatter) {
        match self {
            SensorState::OffStable => defmt::write!(f, "OffStable"),
            SensorState::OffUnstable => defmt::write!(f, "OffUnstable"),
            SensorState::OnStable => defmt::write!(f, "OnStable"),
            SensorState::OnUnstable => defmt::write!(f, "OnUnstable"),
        }
    }
}

impl SensorSlot {
    /// Runs one hysteresis step against the current comparison value.
    ///
    /// `now` is the timestamp of the sampling pass. A confirmed crossing sets the
    /// pending-save flag; the caller moves the reading into the queue.
    pub fn judge(&mut self, now: u32) {
        let value = self.comp_value;
        let th = self.thresholds;
        self.state = match self.state {
            SensorState::OffStable => {
                if value > th.on_value {
                    if th.on_interval_ms != 0 {
                        self.on_start = now;
                        SensorState::OffUnstable
                    } else {
                        self.save_request = true;
                        SensorState::OnStable
                    }
                } else {
                    SensorState::OffStable
                }
            }
            SensorState::OffUnstable => {
                if value <= th.on_value {
                    SensorState::OffStable
                } else if now.wrapping_sub(self.on_start) > th.on_interval_ms {
                    self.save_request = true;
                    SensorState::OnStable
                } else {
                    SensorState::OffUnstable
                }
            }
            SensorState::OnStable => {
                if value < th.off_value {
                    if th.off_interval_ms != 0 {
                        self.off_start = now;
                        SensorState::OnUnstable
                    } else {
                        self.save_request = true;
                        SensorState::OffStable
                    }
                } else {
                    SensorState::OnStable
                }
            }
            SensorState::OnUnstable => {
                if value >= th.off_value {
                    SensorState::OnStable
                } else if now.wrapping_sub(self.off_start) > th.off_interval_ms {
                    self.save_request = true;
                    SensorState::OffStable
                } else {
                    SensorState::OnUnstable
                }
            }
        };
    }
}
