//! Sensor readings as they travel from the hysteresis machine to the gateway.

use core::fmt::{self, Write};

/// A numeric sensor value tagged with its kind.
///
/// Sensor drivers report values in whatever width the hardware produces; the
/// kind is kept so the gateway receives the value in the same representation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    /// Signed 8-bit value.
    I8(i8),
    /// Unsigned 8-bit value.
    U8(u8),
    /// Signed 16-bit value.
    I16(i16),
    /// Unsigned 16-bit value.
    U16(u16),
    /// Signed 32-bit value.
    I32(i32),
    /// Unsigned 32-bit value.
    U32(u32),
    /// Single precision float.
    F32(f32),
    /// Double precision float.
    F64(f64),
}

impl Value {
    /// Widens the value for threshold comparison.
    pub fn as_f64(&self) -> f64 {
        match *self {
            Value::I8(v) => v as f64,
            Value::U8(v) => v as f64,
            Value::I16(v) => v as f64,
            Value::U16(v) => v as f64,
            Value::I32(v) => v as f64,
            Value::U32(v) => v as f64,
            Value::F32(v) => v as f64,
            Value::F64(v) => v,
        }
    }

    /// Writes the value in decimal. Floats are printed with `digits` decimals,
    /// integers ignore `digits`.
    pub fn write_to<W: Write>(&self, w: &mut W, digits: u8) -> fmt::Result {
        let digits = digits as usize;
        match *self {
            Value::I8(v) => write!(w, "{}", v),
            Value::U8(v) => write!(w, "{}", v),
            Value::I16(v) => write!(w, "{}", v),
            Value::U16(v) => write!(w, "{}", v),
            Value::I32(v) => write!(w, "{}", v),
            Value::U32(v) => write!(w, "{}", v),
            Value::F32(v) => write!(w, "{:.*}", digits, v as f64),
            Value::F64(v) => write!(w, "{:.*}", digits, v),
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::I8(0)
    }
}

/// Discretized supply voltage reported with every reading.
///
/// Codes follow the voltage-level-sense comparator of the radio MCU: 0 and 1 are
/// invalid, 2..=15 cover roughly 1.8 V to 4.7 V.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VoltageLevel(u8);

const VOLTAGE_LABELS: [&str; 16] = [
    "0", "0", "1.8", "1.95", "2.05", "2.15", "2.25", "2.35", "2.5", "2.7", "2.9", "3.2", "3.6",
    "4.0", "4.4", "4.7",
];

impl VoltageLevel {
    /// Highest valid level code.
    pub const MAX_CODE: u8 = 15;

    /// Creates a level from a comparator code; codes above 15 are clamped.
    pub fn new(code: u8) -> Self {
        Self(code.min(Self::MAX_CODE))
    }

    /// The raw level code.
    pub fn code(&self) -> u8 {
        self.0
    }

    /// The lower edge of the level in volts, as sent to the gateway.
    pub fn label(&self) -> &'static str {
        VOLTAGE_LABELS[self.0 as usize]
    }
}

/// Direction of the last confirmed threshold crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Switch {
    /// Value is below the off threshold.
    #[default]
    Off,
    /// Value is above the on threshold.
    On,
}

impl Switch {
    /// Wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Switch::Off => "off",
            Switch::On => "on",
        }
    }
}

/// A reading waiting in the queue for transmission.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Reading {
    /// The measured value.
    pub value: Value,
    /// Decimal digits used when formatting a float value.
    pub digits: u8,
    /// Sensor index assigned by the gateway.
    pub index: u16,
    /// State of the sensor when the reading was saved.
    pub state: Switch,
    /// Supply voltage snapshot.
    pub voltage: VoltageLevel,
    /// Driver-specific reason code, if any.
    pub reason: Option<i32>,
    /// Sampling timestamp in milliseconds.
    pub time: u32,
}

#[cfg(feature = "defmt")]
impl defmt::Format for Switch {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heapless::String;

    fn render(value: Value, digits: u8) -> String<32> {
        let mut out = String::new();
        value.write_to(&mut out, digits).unwrap();
        out
    }

    #[test]
    fn integers_ignore_digits() {
        assert_eq!(render(Value::I16(-42), 3).as_str(), "-42");
        assert_eq!(render(Value::U32(4_000_000_000), 0).as_str(), "4000000000");
    }

    #[test]
    fn floats_use_digits() {
        assert_eq!(render(Value::F32(23.456), 1).as_str(), "23.5");
        assert_eq!(render(Value::F64(1.0), 2).as_str(), "1.00");
    }

    #[test]
    fn widening_keeps_sign() {
        assert_eq!(Value::I8(-5).as_f64(), -5.0);
        assert_eq!(Value::U8(250).as_f64(), 250.0);
    }

    #[test]
    fn voltage_labels() {
        assert_eq!(VoltageLevel::new(0).label(), "0");
        assert_eq!(VoltageLevel::new(11).label(), "3.2");
        assert_eq!(VoltageLevel::new(200).label(), "4.7");
    }
}
