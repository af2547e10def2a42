//! # Sensor node
//!
//! [`Node`] owns everything the node needs: the gateway-assigned
//! configuration, the link session, the sensor slots, the reading queue, the
//! fixed rx buffer and the hardware collaborators. It is driven by a single
//! cooperative loop:
//!
//! 1. dispatch the handler of the current [`LinkState`],
//! 2. idle for the returned time, or until an interrupt raises the wake flag,
//! 3. run a sampling pass when the sensing interval has elapsed or the idle
//!    period was cut short.
//!
//! ```rust,no_run
//! # use subghz_iot::node::{Node, Platform};
//! # use subghz_iot::wake::WakeFlag;
//! # fn run<T, D, P, R>(mut node: Node<T, D, P, R>, wake: &WakeFlag) -> !
//! # where
//! #     T: subghz_iot::radio::Transceiver,
//! #     D: subghz_iot::sensor::SensorDriver,
//! #     P: Platform,
//! #     R: rand_core::RngCore,
//! # {
//! loop {
//!     node.poll(wake);
//! }
//! # }
//! ```

#![deny(unsafe_code)]

mod handlers;

use core::fmt;

use heapless::String;
use rand_core::RngCore;

use crate::config::{DeviceConfig, NodeConfig};
use crate::error::Error;
use crate::identity::{ACTIVATION_REQUEST_LEN, ProgramIdentity};
use crate::link::{LinkState, NO_SLEEP, Session, Transition};
use crate::queue::{DEFAULT_QUEUE_LEN, RingQueue};
use crate::radio::Transceiver;
use crate::reading::Reading;
use crate::report::MAX_PAYLOAD_LEN;
use crate::sensor::{DEFAULT_MAX_SENSORS, SensorBank, SensorDriver};
use crate::wake::WakeFlag;

/// Clock and idle primitive of the target.
pub trait Platform {
    /// Free-running millisecond counter. Expected to wrap at `u32::MAX`.
    fn millis(&self) -> u32;

    /// Idles until `timeout_ms` has passed or `wake` is raised.
    ///
    /// Returns the part of the timeout that was left when woken early, 0 when
    /// the full timeout elapsed. Must not clear `wake`.
    fn wait_event(&mut self, wake: &WakeFlag, timeout_ms: u32) -> u32;
}

/// A sensor node with `N` queue slots and `M` sensor slots.
///
/// The defaults match the reference hardware; spell the type as
/// `Node<_, _, _, _>` to use them.
pub struct Node<T, D, P, R, const N: usize = DEFAULT_QUEUE_LEN, const M: usize = DEFAULT_MAX_SENSORS>
where
    T: Transceiver,
    D: SensorDriver,
    P: Platform,
    R: RngCore,
{
    config: NodeConfig,
    device: DeviceConfig,
    session: Session,
    last_sense: u32,
    sleep_ms: u32,
    queue: RingQueue<Reading, N>,
    sensors: SensorBank<M>,
    activation_request: String<ACTIVATION_REQUEST_LEN>,
    rx_buf: [u8; MAX_PAYLOAD_LEN],
    last_error: Option<Error>,
    radio: T,
    driver: D,
    platform: P,
    rng: R,
}

impl<T, D, P, R, const N: usize, const M: usize> Node<T, D, P, R, N, M>
where
    T: Transceiver,
    D: SensorDriver,
    P: Platform,
    R: RngCore,
{
    /// Creates an unactivated node.
    ///
    /// # Errors
    ///
    /// Fails if `config` does not validate or the activation request for
    /// `identity` does not fit its buffer.
    pub fn new(
        config: NodeConfig,
        identity: &ProgramIdentity,
        radio: T,
        driver: D,
        platform: P,
        rng: R,
    ) -> Result<Self, Error> {
        config.validate()?;
        let activation_request = identity.activation_request()?;
        info!("node {} v{} starting", identity.name(), identity.version());
        Ok(Self {
            device: DeviceConfig::new(config.default_sleep_ms),
            session: Session::default(),
            last_sense: 0,
            sleep_ms: NO_SLEEP,
            queue: RingQueue::new(),
            sensors: SensorBank::new(config.keep_alive_ms),
            activation_request,
            rx_buf: [0; MAX_PAYLOAD_LEN],
            last_error: None,
            config,
            radio,
            driver,
            platform,
            rng,
        })
    }

    /// Current link state.
    pub fn state(&self) -> LinkState {
        self.session.state
    }

    /// Link bookkeeping.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Gateway-assigned configuration.
    pub fn device(&self) -> &DeviceConfig {
        &self.device
    }

    /// Tunables the node was built with.
    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Readings waiting for transmission.
    pub fn queue(&self) -> &RingQueue<Reading, N> {
        &self.queue
    }

    /// Sensor slots.
    pub fn sensors(&self) -> &SensorBank<M> {
        &self.sensors
    }

    /// Idle time returned by the last dispatch.
    pub fn sleep_ms(&self) -> u32 {
        self.sleep_ms
    }

    /// Timestamp of the last sampling pass.
    pub fn last_sense(&self) -> u32 {
        self.last_sense
    }

    /// The most recent error the link machine recovered from.
    pub fn last_error(&self) -> Option<Error> {
        self.last_error
    }

    /// The transceiver.
    pub fn radio(&self) -> &T {
        &self.radio
    }

    /// Mutable access to the transceiver.
    pub fn radio_mut(&mut self) -> &mut T {
        &mut self.radio
    }

    /// Mutable access to the sensor driver.
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Mutable access to the platform.
    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    /// Dispatches the handler of the current state once.
    pub fn step(&mut self) -> Transition {
        let from = self.session.state;
        let transition = match from {
            LinkState::TriggerActivate => self.trigger_activate(),
            LinkState::WaitActivate => self.wait_activate(),
            LinkState::InitSensor => self.init_sensor(),
            LinkState::SendQueue => self.send_queue(),
            LinkState::TriggerReconnect => self.trigger_reconnect(),
            LinkState::WaitReconnect => self.wait_reconnect(),
            LinkState::TriggerUpdateParam => self.trigger_update_param(),
            LinkState::WaitUpdateParam => self.wait_update_param(),
            LinkState::TriggerFirmwareUpdate => self.trigger_firmware_update(),
            LinkState::WaitFirmwareUpdate => self.wait_firmware_update(),
        };
        if transition.next != from {
            debug!("link {} -> {}", from, transition.next);
        }
        self.session.state = transition.next;
        self.sleep_ms = transition.sleep_ms;
        transition
    }

    /// Runs one iteration of the main loop.
    pub fn poll(&mut self, wake: &WakeFlag) -> LinkState {
        let transition = self.step();
        let remain = if transition.sleep_ms != NO_SLEEP {
            self.platform.wait_event(wake, transition.sleep_ms)
        } else {
            0
        };
        if self.device.enable_sense {
            let woke = wake.take();
            let elapsed = self.platform.millis().wrapping_sub(self.last_sense);
            if elapsed > self.device.sense_interval_ms || remain != 0 || woke {
                self.sample();
            }
        }
        transition.next
    }

    /// Runs one sampling pass over all sensors.
    ///
    /// Returns the number of readings queued.
    pub fn sample(&mut self) -> usize {
        let now = self.platform.millis();
        self.last_sense = now;
        self.sensors.sample(&mut self.driver, now, &mut self.queue)
    }
}

impl<T, D, P, R, const N: usize, const M: usize> fmt::Debug for Node<T, D, P, R, N, M>
where
    T: Transceiver,
    D: SensorDriver,
    P: Platform,
    R: RngCore,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("device", &self.device)
            .field("session", &self.session)
            .field("queued", &self.queue.len())
            .field("last_sense", &self.last_sense)
            .field("last_error", &self.last_error)
            .finish()
    }
}
