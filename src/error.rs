//! Common error types for the sensor-reporting core

use core::fmt;

/// Faults detected while interpreting an enhanced acknowledgement.
///
/// Several faults can be present at once; they are reported together in the
/// diagnostic message sent back to the gateway.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct AckFault {
    bits: u8,
}

impl AckFault {
    const FLAG: u8 = 0x01;
    const INTERVAL: u8 = 0x02;
    const SIZE: u8 = 0x04;

    /// No fault.
    pub const NONE: AckFault = AckFault { bits: 0 };

    /// Returns `true` if no fault has been recorded.
    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// The flag byte carried an unknown value.
    pub fn unknown_flag(&self) -> bool {
        self.bits & Self::FLAG != 0
    }

    /// The sleep interval exceeded the hard ceiling.
    pub fn interval_out_of_range(&self) -> bool {
        self.bits & Self::INTERVAL != 0
    }

    /// The acknowledgement did not have the expected size.
    pub fn wrong_size(&self) -> bool {
        self.bits & Self::SIZE != 0
    }

    pub(crate) fn set_unknown_flag(&mut self) {
        self.bits |= Self::FLAG;
    }

    pub(crate) fn set_interval_out_of_range(&mut self) {
        self.bits |= Self::INTERVAL;
    }

    pub(crate) fn set_wrong_size(&mut self) {
        self.bits |= Self::SIZE;
    }
}

/// A common error type for the sensor-reporting core.
///
/// Queue misuse errors (`InvalidArgument`, `IndexOutOfRange`) indicate a
/// programming error and are never retried. Link errors are transient and only
/// select the next state of the link machine.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Error {
    /// The queue already holds its maximum number of readings.
    QueueFull,
    /// The queue holds no readings.
    QueueEmpty,
    /// A count of zero, or larger than the queue length, was passed.
    InvalidArgument,
    /// A cursor outside the occupied part of the queue was passed.
    IndexOutOfRange,
    /// An activation or reconnect payload could not be parsed.
    PayloadParse,
    /// The enhanced acknowledgement was malformed.
    AckMalformed(AckFault),
    /// No response arrived before the receive timeout.
    LinkTimeout,
    /// The transceiver reported a send failure.
    LinkSendFailure,
    /// The requested operation has no implementation (firmware update).
    Unimplemented,
    /// The program name does not fit the activation request.
    InvalidProgramName,
    /// A fixed-size buffer was too small.
    BufferOverflow,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::QueueFull => f.write_str("queue full"),
            Error::QueueEmpty => f.write_str("queue empty"),
            Error::InvalidArgument => f.write_str("invalid argument"),
            Error::IndexOutOfRange => f.write_str("index out of range"),
            Error::PayloadParse => f.write_str("payload parse error"),
            Error::AckMalformed(_) => f.write_str("malformed enhanced ack"),
            Error::LinkTimeout => f.write_str("link timeout"),
            Error::LinkSendFailure => f.write_str("link send failure"),
            Error::Unimplemented => f.write_str("not implemented"),
            Error::InvalidProgramName => f.write_str("invalid program name"),
            Error::BufferOverflow => f.write_str("buffer overflow"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for AckFault {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "AckFault(flag={}, interval={}, size={})",
            self.unknown_flag(),
            self.interval_out_of_range(),
            self.wrong_size()
        )
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::QueueFull => defmt::write!(f, "QueueFull"),
            Error::QueueEmpty => defmt::write!(f, "QueueEmpty"),
            Error::InvalidArgument => defmt::write!(f, "InvalidArgument"),
            Error::IndexOutOfRange => defmt::write!(f, "IndexOutOfRange"),
            Error::PayloadParse => defmt::write!(f, "PayloadParse"),
            Error::AckMalformed(fault) => defmt::write!(f, "AckMalformed({})", fault),
            Error::LinkTimeout => defmt::write!(f, "LinkTimeout"),
            Error::LinkSendFailure => defmt::write!(f, "LinkSendFailure"),
            Error::Unimplemented => defmt::write!(f, "Unimplemented"),
            Error::InvalidProgramName => defmt::write!(f, "InvalidProgramName"),
            Error::BufferOverflow => defmt::write!(f, "BufferOverflow"),
        }
    }
}
