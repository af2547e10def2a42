//! # subghz-iot - sub-GHz sensor node core
//!
//! The firmware core of a battery-powered sensor node that reports threshold
//! crossings to a gateway over an IEEE 802.15.4 sub-GHz link. This library is
//! designed for embedded systems and supports `no_std` environments; it never
//! allocates.
//!
//! ## Features
//!
//! ### Sensing
//! - **Hysteresis**: a threshold crossing must persist for a configured interval
//!   before it is reported
//! - **Keep-alive**: quiet sensors are reported periodically
//! - **Reading queue**: fixed-capacity ring buffer between sampling and reporting
//!
//! ### Gateway link
//! - **Activation**: the gateway assigns addresses, thresholds and the payload layout
//! - **Reporting**: queued readings are batched into frames of at most 240 bytes
//! - **Enhanced ACK**: the gateway steers the node through data piggybacked on
//!   the MAC acknowledgement
//! - **Reconnect**: exponential, jittered backoff after a lost link
//!
//! ## Usage
//!
//! Add this to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! subghz-iot = "0.1.0"
//! ```
//!
//! ### Running a node
//!
//! ```rust,no_run
//! use subghz_iot::config::NodeConfig;
//! use subghz_iot::identity::ProgramIdentity;
//! use subghz_iot::node::{Node, Platform};
//! use subghz_iot::wake::WakeFlag;
//! # use subghz_iot::radio::{Bitrate, Transceiver, TxPower};
//! # use subghz_iot::reading::VoltageLevel;
//! # use subghz_iot::sensor::{Measurement, SensorDriver};
//! # struct Radio;
//! # impl Transceiver for Radio {
//! #     type Error = ();
//! #     fn open(&mut self, _: u8, _: u16, _: Bitrate, _: TxPower) -> Result<(), ()> { Ok(()) }
//! #     fn rx_enable(&mut self) -> Result<(), ()> { Ok(()) }
//! #     fn rx_disable(&mut self) -> Result<(), ()> { Ok(()) }
//! #     fn send(&mut self, _: u16, _: u16, _: &[u8]) -> Result<(), ()> { Ok(()) }
//! #     fn read_data(&mut self, _: &mut [u8]) -> usize { 0 }
//! #     fn decode_frame<'a>(&self, raw: &'a [u8]) -> Option<&'a [u8]> { Some(raw) }
//! #     fn enhanced_ack(&self) -> &[u8] { &[0, 60, 0] }
//! #     fn set_my_address(&mut self, _: u16) {}
//! #     fn close(&mut self) {}
//! # }
//! # struct Sensors;
//! # impl SensorDriver for Sensors {
//! #     fn measure(&mut self, _: u16) -> Measurement { Measurement::default() }
//! #     fn activate(&mut self) -> bool { false }
//! #     fn deactivate(&mut self) {}
//! #     fn voltage_level(&mut self) -> VoltageLevel { VoltageLevel::new(11) }
//! # }
//! # struct Board;
//! # impl Platform for Board {
//! #     fn millis(&self) -> u32 { 0 }
//! #     fn wait_event(&mut self, _: &WakeFlag, _: u32) -> u32 { 0 }
//! # }
//! # struct Rng;
//! # impl rand_core::RngCore for Rng {
//! #     fn next_u32(&mut self) -> u32 { 4 }
//! #     fn next_u64(&mut self) -> u64 { 4 }
//! #     fn fill_bytes(&mut self, dest: &mut [u8]) { dest.fill(4) }
//! #     fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
//! #         dest.fill(4);
//! #         Ok(())
//! #     }
//! # }
//!
//! static WAKE: WakeFlag = WakeFlag::new();
//!
//! let identity = ProgramIdentity::from_path(r"C:\build\door_3.bin").unwrap();
//! let mut node: Node<_, _, _, _> =
//!     Node::new(NodeConfig::default(), &identity, Radio, Sensors, Board, Rng).unwrap();
//!
//! loop {
//!     node.poll(&WAKE);
//! }
//! ```
//!
//! ## Platform Support
//!
//! This library is designed to work on:
//! - Embedded microcontrollers (ARM Cortex-M, RISC-V, etc.)
//! - Any platform supporting Rust's `core` library and providing a
//!   `critical-section` implementation
//!
//! ## Optional Features
//!
//! - `std`: Enable standard library support (default: disabled)
//! - `defmt`: Route internal logging to defmt
//! - `log`: Route internal logging to the `log` facade

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(missing_docs)]
#![warn(missing_debug_implementations)]

#[macro_use]
mod fmt;

/// Error types shared by all modules.
pub mod error;

/// Fixed-capacity ring buffer holding readings until they are reported.
pub mod queue;

/// Measured values and queued readings.
pub mod reading;

/// Per-sensor hysteresis and keep-alive sampling.
pub mod sensor;

/// Transceiver abstraction.
pub mod radio;

/// Build-time tunables and gateway-assigned settings.
pub mod config;

/// Interpretation of the enhanced acknowledgement.
pub mod ack;

/// Encoding of queued readings into report frames.
pub mod report;

/// Link states, transitions and backoff arithmetic.
pub mod link;

/// Program name and version announced at activation.
pub mod identity;

/// Wake-up notification shared with interrupt handlers.
pub mod wake;

/// The node context and its main loop.
pub mod node;
