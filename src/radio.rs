//! Sub-GHz transceiver abstraction.
//!
//! The MAC/PHY stack is provided by the radio vendor; the node only needs to
//! open the channel, send a frame, poll for a received frame and read the data
//! piggybacked on the last enhanced acknowledgement.

#![deny(unsafe_code)]

use serde::Deserialize;

/// Broadcast PAN id and short address.
pub const BROADCAST: u16 = 0xffff;

/// Air bitrate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bitrate {
    /// 50 kbps.
    Kbps50,
    /// 100 kbps.
    Kbps100,
}

/// Transmit power.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxPower {
    /// 1 mW.
    Mw1,
    /// 20 mW.
    Mw20,
}

/// A sub-GHz transceiver with enhanced-ACK support.
pub trait Transceiver {
    /// Associated error type
    type Error: core::fmt::Debug;

    /// Opens the radio on `channel` for the given PAN.
    fn open(&mut self, channel: u8, pan_id: u16, bitrate: Bitrate, power: TxPower) -> Result<(), Self::Error>;

    /// Keeps the receiver on after the next transmission.
    fn rx_enable(&mut self) -> Result<(), Self::Error>;

    /// Switches the receiver off.
    fn rx_disable(&mut self) -> Result<(), Self::Error>;

    /// Sends `payload` and waits for the MAC acknowledgement.
    fn send(&mut self, pan_id: u16, addr: u16, payload: &[u8]) -> Result<(), Self::Error>;

    /// Copies the next received raw frame into `buf`, returning its length
    /// (0 if nothing was received).
    fn read_data(&mut self, buf: &mut [u8]) -> usize;

    /// Extracts the application payload from a raw frame.
    fn decode_frame<'a>(&self, raw: &'a [u8]) -> Option<&'a [u8]>;

    /// Application data attached to the acknowledgement of the last send.
    fn enhanced_ack(&self) -> &[u8];

    /// Sets the node's own short address.
    fn set_my_address(&mut self, addr: u16);

    /// Closes the radio.
    fn close(&mut self);
}
