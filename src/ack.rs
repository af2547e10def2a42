//! Enhanced-ACK interpretation.
//!
//! The gateway piggybacks three bytes on the MAC acknowledgement of every
//! report: a control flag and the sensing interval it wants the node to use.
//!
//! ```text
//! ┌──────┬─────────────────────┐
//! │ flag │ interval (s, u16 LE)│
//! └──────┴─────────────────────┘
//! ```

#![deny(unsafe_code)]

use core::fmt::Write;

use heapless::String;

use crate::error::{AckFault, Error};

/// Size of the piggybacked structure.
pub const EACK_SIZE: usize = 3;

/// Capacity of the diagnostic reply.
pub const DIAGNOSTIC_LEN: usize = 48;

/// Control flag sent by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckFlag {
    /// Keep reporting.
    Normal,
    /// Report every sensor at the next sampling pass.
    ForceSave,
    /// Fetch new parameters from the gateway.
    UpdateParams,
    /// Run the activation handshake again.
    Activate,
    /// Enter firmware update.
    FirmwareUpdate,
}

impl AckFlag {
    /// Decodes the flag byte.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(AckFlag::Normal),
            0x01 => Some(AckFlag::ForceSave),
            0x02 => Some(AckFlag::UpdateParams),
            0x03 => Some(AckFlag::Activate),
            0xf0 => Some(AckFlag::FirmwareUpdate),
            _ => None,
        }
    }
}

/// Interval limits applied to the gateway's request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalLimits {
    /// Requests above this are rejected (ms).
    pub max_interval_ms: u32,
    /// Requests above this are truncated to it (ms).
    pub keep_alive_ms: u32,
}

/// Result of interpreting an enhanced acknowledgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AckOutcome {
    /// Decoded flag, `None` if the flag or the size was invalid.
    pub flag: Option<AckFlag>,
    /// Sensing interval to adopt, `None` if it was invalid or missing.
    pub interval_ms: Option<u32>,
    /// Faults found while decoding.
    pub fault: AckFault,
}

impl AckOutcome {
    /// The acknowledgement as a result: `Err` when any fault was found.
    pub fn check(&self) -> Result<(), Error> {
        if self.fault.is_empty() {
            Ok(())
        } else {
            Err(Error::AckMalformed(self.fault))
        }
    }

    /// Renders the diagnostic reply sent to the gateway on a fault.
    pub fn diagnostic(&self) -> String<DIAGNOSTIC_LEN> {
        let mut msg = String::new();
        // Longest message is 44 bytes.
        let _ = msg.write_str("error, invalid EACK");
        if self.fault.unknown_flag() {
            let _ = msg.write_str(" [flag]");
        }
        if self.fault.interval_out_of_range() {
            let _ = msg.write_str(" [interval]");
        }
        if self.fault.wrong_size() {
            let _ = msg.write_str(" [size]");
        }
        msg
    }
}

/// Decodes the piggybacked bytes.
pub fn interpret(eack: &[u8], limits: IntervalLimits) -> AckOutcome {
    let mut fault = AckFault::NONE;

    let bytes: [u8; EACK_SIZE] = match eack.try_into() {
        Ok(bytes) => bytes,
        Err(_) => {
            fault.set_wrong_size();
            return AckOutcome {
                flag: None,
                interval_ms: None,
                fault,
            };
        }
    };

    let flag = AckFlag::from_byte(bytes[0]);
    if flag.is_none() {
        fault.set_unknown_flag();
    }

    let requested = u16::from_le_bytes([bytes[1], bytes[2]]) as u32 * 1000;
    let interval_ms = if requested > limits.max_interval_ms {
        fault.set_interval_out_of_range();
        None
    } else {
        Some(requested.min(limits.keep_alive_ms))
    };

    AckOutcome {
        flag,
        interval_ms,
        fault,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMITS: IntervalLimits = IntervalLimits {
        max_interval_ms: 3_600_000,
        keep_alive_ms: 1_800_000,
    };

    #[test]
    fn normal_ack() {
        let outcome = interpret(&[0x00, 60, 0], LIMITS);
        assert_eq!(outcome.flag, Some(AckFlag::Normal));
        assert_eq!(outcome.interval_ms, Some(60_000));
        assert_eq!(outcome.check(), Ok(()));
    }

    #[test]
    fn interval_capped_at_keep_alive() {
        // 2400 s
        let outcome = interpret(&[0x00, 0x60, 0x09], LIMITS);
        assert_eq!(outcome.interval_ms, Some(1_800_000));
        assert!(outcome.fault.is_empty());
    }

    #[test]
    fn interval_above_ceiling_rejected() {
        // 3601 s
        let outcome = interpret(&[0x00, 0x11, 0x0e], LIMITS);
        assert_eq!(outcome.interval_ms, None);
        assert!(outcome.fault.interval_out_of_range());
        assert_eq!(outcome.diagnostic().as_str(), "error, invalid EACK [interval]");
    }

    #[test]
    fn unknown_flag() {
        let outcome = interpret(&[0x07, 10, 0], LIMITS);
        assert_eq!(outcome.flag, None);
        assert_eq!(outcome.interval_ms, Some(10_000));
        assert!(matches!(outcome.check(), Err(Error::AckMalformed(f)) if f.unknown_flag()));
    }

    #[test]
    fn wrong_size() {
        let outcome = interpret(&[], LIMITS);
        assert!(outcome.fault.wrong_size());
        assert_eq!(outcome.diagnostic().as_str(), "error, invalid EACK [size]");
    }

    #[test]
    fn all_faults_listed() {
        let outcome = interpret(&[0x42, 0xff, 0xff], LIMITS);
        assert_eq!(outcome.diagnostic().as_str(), "error, invalid EACK [flag] [interval]");
    }

    #[test]
    fn flags_decode() {
        assert_eq!(AckFlag::from_byte(0x01), Some(AckFlag::ForceSave));
        assert_eq!(AckFlag::from_byte(0x02), Some(AckFlag::UpdateParams));
        assert_eq!(AckFlag::from_byte(0x03), Some(AckFlag::Activate));
        assert_eq!(AckFlag::from_byte(0xf0), Some(AckFlag::FirmwareUpdate));
        assert_eq!(AckFlag::from_byte(0x04), None);
    }
}
