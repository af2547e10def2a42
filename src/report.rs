//! Queue report encoding.
//!
//! Single layout, one reading per frame:
//!
//! ```text
//! on,23,3.2,
//! off,17,3.2,4,1250
//! ```
//!
//! Multi layout, as many readings as fit in one frame:
//!
//! ```text
//! v2,0,on,23,3.2,,1,off,17.5,3.2,4,1250
//! ```
//!
//! The reason field is only filled for off readings that carry one. The
//! trailing gap is the age of the reading in milliseconds and is left out for
//! readings younger than [`MIN_REPORTED_GAP_MS`].
//!
//! A single reading renders to at most [`GROUP_LEN`] bytes; longer renderings
//! (huge floats, large `digits`) are cut off there. The oldest reading therefore
//! always fits a frame and the queue keeps draining.

use core::fmt::{self, Write};

use heapless::String;

use crate::config::Layout;
use crate::queue::RingQueue;
use crate::reading::{Reading, Switch};

/// Maximum size of a radio payload.
pub const MAX_PAYLOAD_LEN: usize = 240;

/// Readings younger than this are reported without their age.
pub const MIN_REPORTED_GAP_MS: u32 = 10;

/// Tag opening a multi-sensor report.
pub const MULTI_TAG: &str = "v2";

/// Longest rendering of a single reading.
pub const GROUP_LEN: usize = 100;

/// An encoded report and the number of readings it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// Payload to transmit.
    pub payload: String<MAX_PAYLOAD_LEN>,
    /// Readings included, to be dequeued once the report is delivered.
    pub count: usize,
}

/// Renders into a fixed buffer, dropping whatever does not fit.
struct Truncating<'a> {
    buf: &'a mut String<GROUP_LEN>,
    truncated: bool,
}

impl Write for Truncating<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for c in s.chars() {
            if self.buf.push(c).is_err() {
                self.truncated = true;
                break;
            }
        }
        Ok(())
    }
}

/// Renders one reading, prefixed with its index in the multi layout.
fn render_group(reading: &Reading, index: Option<u16>, now: u32) -> String<GROUP_LEN> {
    let mut group = String::new();
    let mut w = Truncating {
        buf: &mut group,
        truncated: false,
    };
    // Truncating never fails.
    let _ = match index {
        Some(index) => write!(w, ",{},", index).and_then(|_| write_fields(&mut w, reading, now)),
        None => write_fields(&mut w, reading, now),
    };
    if w.truncated {
        warn!("reading {} truncated to {} bytes", reading.index, GROUP_LEN);
    }
    group
}

fn write_fields<W: Write>(w: &mut W, reading: &Reading, now: u32) -> fmt::Result {
    write!(w, "{},", reading.state.as_str())?;
    reading.value.write_to(w, reading.digits)?;
    write!(w, ",{},", reading.voltage.label())?;
    if let (Switch::Off, Some(reason)) = (reading.state, reading.reason) {
        write!(w, "{}", reason)?;
    }
    let gap = now.wrapping_sub(reading.time);
    if gap > MIN_REPORTED_GAP_MS {
        write!(w, ",{}", gap)?;
    }
    Ok(())
}

/// Encodes the oldest readings of `queue` into one report.
///
/// Readings that would push the frame over [`MAX_PAYLOAD_LEN`] stay queued for
/// the next report. An empty queue yields an empty report.
pub fn encode<const N: usize>(queue: &RingQueue<Reading, N>, layout: Layout, now: u32) -> Report {
    let mut payload = String::new();
    let mut count = 0;

    match layout {
        Layout::Single => {
            if let Ok(reading) = queue.peek(queue.head()) {
                if payload.push_str(&render_group(reading, None, now)).is_ok() {
                    count = 1;
                }
            }
        }
        Layout::Multi => {
            // Fits by construction.
            let _ = payload.push_str(MULTI_TAG);
            let mut index = queue.head();
            while count < queue.len() {
                let Ok(reading) = queue.peek(index) else {
                    break;
                };
                if payload.push_str(&render_group(reading, Some(reading.index), now)).is_err() {
                    break;
                }
                count += 1;
                index = queue.next_index(index);
            }
        }
    }

    Report { payload, count }
}
