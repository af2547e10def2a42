//! Node configuration.
//!
//! Two kinds of configuration exist:
//!
//! * [`NodeConfig`]: tunables fixed at build or provisioning time (radio
//!   settings, retry ceilings, timing). It can be loaded from JSON.
//! * [`DeviceConfig`]: what the gateway assigns at activation (addresses,
//!   sensing interval, payload layout), filled from an [`Activation`] payload.
//!
//! # Activation payload
//!
//! ```text
//! activate,<pan>,<gateway addr>,<my addr>[,<index>,<on>,<on sec>,<off>,<off sec>]...
//! ```
//!
//! A payload of exactly eight fields is the legacy single-sensor form (the one
//! sensor gets index 0). Any other payload must carry a whole number of
//! five-field sensor groups, at most one per sensor slot.

#![deny(unsafe_code)]

use heapless::Vec;
use serde::Deserialize;

use crate::error::Error;
use crate::radio::{BROADCAST, Bitrate, TxPower};
use crate::sensor::Thresholds;

const HEADER_FIELDS: usize = 4;
const GROUP_FIELDS: usize = 5;
const LEGACY_FIELDS: usize = 8;

/// Build- or provisioning-time tunables of a node.
///
/// Every field has a default, so a JSON document only needs the values that
/// differ:
///
/// ```rust
/// use subghz_iot::config::NodeConfig;
///
/// let config = NodeConfig::from_json(r#"{"channel":33,"max_backoff_count":6}"#).unwrap();
/// assert_eq!(config.channel, 33);
/// assert_eq!(config.max_backoff_count, 6);
/// assert_eq!(config.rx_timeout_ms, 2_000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Radio channel.
    pub channel: u8,
    /// Air bitrate.
    pub bitrate: Bitrate,
    /// Transmit power.
    pub power: TxPower,
    /// Sleep after repeated tx failures and before sensors are ready (ms).
    pub default_sleep_ms: u32,
    /// How long to wait for a gateway response after a request (ms).
    pub rx_timeout_ms: u32,
    /// Consecutive tx failures tolerated before falling back to the default sleep.
    pub max_tx_fail: u8,
    /// Upper bound of the random delay after a tx failure (ms).
    pub tx_jitter_ms: u32,
    /// Activation attempts before the long cool-down.
    pub max_activate_retry: u8,
    /// Cool-down after the activation retries are exhausted (ms).
    pub activate_cooldown_ms: u32,
    /// Parameter update attempts before re-activation.
    pub max_update_param_retry: u8,
    /// Base delay between activation or update attempts (ms).
    pub retry_interval_ms: u32,
    /// Upper bound of the random part of the retry delay (ms).
    pub retry_jitter_ms: u32,
    /// Ceiling of the backoff exponent.
    pub max_backoff_count: u8,
    /// Backoff interval for the first reconnect attempt (ms).
    pub min_backoff_ms: u32,
    /// Longest time a sensor stays silent; also caps the sensing interval (ms).
    pub keep_alive_ms: u32,
    /// Largest sensing interval a gateway may request (ms).
    pub max_interval_ms: u32,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            channel: 36,
            bitrate: Bitrate::Kbps100,
            power: TxPower::Mw20,
            default_sleep_ms: 5_000,
            rx_timeout_ms: 2_000,
            max_tx_fail: 1,
            tx_jitter_ms: 1_000,
            max_activate_retry: 14,
            activate_cooldown_ms: 1_800_000,
            max_update_param_retry: 3,
            retry_interval_ms: 10_000,
            retry_jitter_ms: 500,
            max_backoff_count: 8,
            min_backoff_ms: 1_000,
            keep_alive_ms: 1_800_000,
            max_interval_ms: 3_600_000,
        }
    }
}

impl NodeConfig {
    /// Largest backoff exponent accepted by [`validate`](Self::validate).
    pub const BACKOFF_COUNT_LIMIT: u8 = 16;

    /// Parses a JSON document and validates the result.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let (config, _) =
            serde_json_core::from_str::<NodeConfig>(json).map_err(|_| Error::PayloadParse)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the relations between the tunables.
    pub fn validate(&self) -> Result<(), Error> {
        if self.min_backoff_ms == 0 || self.max_backoff_count > Self::BACKOFF_COUNT_LIMIT {
            return Err(Error::InvalidArgument);
        }
        if self.keep_alive_ms > self.max_interval_ms {
            return Err(Error::InvalidArgument);
        }
        Ok(())
    }
}

/// Report layout agreed at activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    /// One sensor, one reading per frame.
    #[default]
    Single,
    /// Several sensors, `v2`-tagged frames carrying as many readings as fit.
    Multi,
}

/// Settings assigned by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceConfig {
    /// PAN id of the gateway.
    pub gateway_pan_id: u16,
    /// Short address of the gateway.
    pub gateway_addr: u16,
    /// Short address assigned to this node.
    pub my_addr: u16,
    /// Interval between sampling passes (ms).
    pub sense_interval_ms: u32,
    /// Report layout.
    pub layout: Layout,
    /// Periodic sampling is running.
    pub enable_sense: bool,
}

impl DeviceConfig {
    /// An unactivated device using `sense_interval_ms` until the gateway sends
    /// its own interval.
    pub fn new(sense_interval_ms: u32) -> Self {
        Self {
            gateway_pan_id: BROADCAST,
            gateway_addr: BROADCAST,
            my_addr: BROADCAST,
            sense_interval_ms,
            layout: Layout::Single,
            enable_sense: false,
        }
    }

    /// Adopts the addresses and layout of an activation payload.
    pub fn apply<const M: usize>(&mut self, activation: &Activation<M>) {
        self.gateway_pan_id = activation.gateway_pan_id;
        self.gateway_addr = activation.gateway_addr;
        self.my_addr = activation.my_addr;
        self.layout = activation.layout;
    }
}

/// Header keyword of a gateway payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    /// Regular activation or reconnect response.
    Activate,
    /// Diagnostic payload; parsed but never applied.
    Debug,
}

/// Per-sensor parameters of an activation payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorParams {
    /// Gateway-assigned sensor index.
    pub index: u16,
    /// Thresholds with intervals converted to milliseconds.
    pub thresholds: Thresholds,
}

/// A parsed activation or reconnect payload for a node with `M` sensor slots.
#[derive(Debug, Clone, PartialEq)]
pub struct Activation<const M: usize> {
    /// Header keyword.
    pub kind: PayloadKind,
    /// PAN id of the gateway.
    pub gateway_pan_id: u16,
    /// Short address of the gateway.
    pub gateway_addr: u16,
    /// Short address assigned to this node.
    pub my_addr: u16,
    /// Report layout implied by the field count.
    pub layout: Layout,
    /// Sensor parameters in slot order.
    pub sensors: Vec<SensorParams, M>,
}

impl<const M: usize> Activation<M> {
    /// Parses a comma-separated payload. Empty fields are skipped.
    pub fn parse(payload: &str) -> Result<Self, Error> {
        let fields = || payload.split(',').map(str::trim).filter(|f| !f.is_empty());
        let count = fields().count();

        let (layout, groups) = if count == LEGACY_FIELDS {
            (Layout::Single, 1)
        } else if count >= HEADER_FIELDS
            && (count - HEADER_FIELDS) % GROUP_FIELDS == 0
            && (count - HEADER_FIELDS) / GROUP_FIELDS <= M
        {
            (Layout::Multi, (count - HEADER_FIELDS) / GROUP_FIELDS)
        } else {
            debug!("payload field count {} unmatched", count);
            return Err(Error::PayloadParse);
        };

        let mut it = fields();
        let header = it.next().ok_or(Error::PayloadParse)?;
        let kind = if header.starts_with("activate") {
            PayloadKind::Activate
        } else if header.starts_with("debug") {
            PayloadKind::Debug
        } else {
            return Err(Error::PayloadParse);
        };

        let gateway_pan_id = parse_u16(it.next())?;
        let gateway_addr = parse_u16(it.next())?;
        let my_addr = parse_u16(it.next())?;

        let mut sensors = Vec::new();
        for _ in 0..groups {
            let index = if layout == Layout::Single {
                0
            } else {
                parse_u16(it.next())?
            };
            let thresholds = Thresholds {
                on_value: parse_f64(it.next())?,
                on_interval_ms: parse_seconds(it.next())?,
                off_value: parse_f64(it.next())?,
                off_interval_ms: parse_seconds(it.next())?,
            };
            sensors
                .push(SensorParams { index, thresholds })
                .map_err(|_| Error::PayloadParse)?;
        }

        Ok(Self {
            kind,
            gateway_pan_id,
            gateway_addr,
            my_addr,
            layout,
            sensors,
        })
    }
}

/// Parses an unsigned integer with C-style base detection (`0x` hex, leading
/// `0` octal, decimal otherwise).
fn parse_uint(field: Option<&str>) -> Result<u32, Error> {
    let s = field.ok_or(Error::PayloadParse)?;
    let (digits, radix) = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        (hex, 16)
    } else if s.len() > 1 && s.starts_with('0') {
        (&s[1..], 8)
    } else {
        (s, 10)
    };
    u32::from_str_radix(digits, radix).map_err(|_| Error::PayloadParse)
}

fn parse_u16(field: Option<&str>) -> Result<u16, Error> {
    u16::try_from(parse_uint(field)?).map_err(|_| Error::PayloadParse)
}

fn parse_seconds(field: Option<&str>) -> Result<u32, Error> {
    Ok(parse_uint(field)?.saturating_mul(1000))
}

fn parse_f64(field: Option<&str>) -> Result<f64, Error> {
    field
        .ok_or(Error::PayloadParse)?
        .parse::<f64>()
        .map_err(|_| Error::PayloadParse)
}
