//! One handler per [`LinkState`].

use rand_core::RngCore;

use super::{Node, Platform};
use crate::ack::{self, AckFlag, IntervalLimits};
use crate::config::{Activation, PayloadKind};
use crate::error::Error;
use crate::link::backoff;
use crate::link::{LinkState, NO_SLEEP, Transition};
use crate::radio::{BROADCAST, Transceiver};
use crate::report;
use crate::sensor::SensorDriver;

/// Request sent to the gateway to fetch new parameters.
const UPDATE_REQUEST: &[u8] = b"update";

impl<T, D, P, R, const N: usize, const M: usize> Node<T, D, P, R, N, M>
where
    T: Transceiver,
    D: SensorDriver,
    P: Platform,
    R: RngCore,
{
    fn send_frame(&mut self, pan_id: u16, addr: u16, payload: &[u8], rx_on: bool) -> Result<(), T::Error> {
        self.radio
            .open(self.config.channel, pan_id, self.config.bitrate, self.config.power)?;
        if rx_on {
            self.radio.rx_enable()?;
        } else {
            self.radio.rx_disable()?;
        }
        self.radio.send(pan_id, addr, payload)
    }

    /// Sends one frame. The radio stays open afterwards only if `rx_on`.
    fn transmit(&mut self, pan_id: u16, addr: u16, payload: &[u8], rx_on: bool) -> Result<(), Error> {
        let result = self.send_frame(pan_id, addr, payload, rx_on);
        if !rx_on {
            self.radio.close();
        }
        self.session.tx_time = self.platform.millis();
        result.map_err(|_| {
            warn!("tx to {}:{} failed", pan_id, addr);
            Error::LinkSendFailure
        })
    }

    /// Uniform random value in `0..=max`.
    fn random_upto(&mut self, max: u32) -> u32 {
        match max.checked_add(1) {
            Some(bound) => self.rng.next_u32() % bound,
            None => self.rng.next_u32(),
        }
    }

    fn retry_interval(&mut self) -> u32 {
        let jitter = self.random_upto(self.config.retry_jitter_ms);
        self.config.retry_interval_ms.saturating_add(jitter)
    }

    /// Sleep after a failed request, falling back to the default sleep once
    /// `max_tx_fail` consecutive failures were seen.
    fn tx_failure_sleep(&mut self) -> u32 {
        if self.session.fail >= self.config.max_tx_fail {
            self.session.fail = 0;
            self.config.default_sleep_ms
        } else {
            self.session.fail += 1;
            self.random_upto(self.config.tx_jitter_ms)
        }
    }

    fn rx_timed_out(&self) -> bool {
        self.platform.millis().wrapping_sub(self.session.tx_time) > self.config.rx_timeout_ms
    }

    /// Polls the radio for a gateway payload.
    ///
    /// `None` if nothing arrived. `debug` payloads are reported as parse
    /// errors since they are never applied.
    fn receive(&mut self) -> Option<Result<Activation<M>, Error>> {
        let len = self.radio.read_data(&mut self.rx_buf);
        if len == 0 {
            return None;
        }
        let raw = &self.rx_buf[..len.min(self.rx_buf.len())];
        let parsed = self
            .radio
            .decode_frame(raw)
            .and_then(|payload| core::str::from_utf8(payload).ok())
            .ok_or(Error::PayloadParse)
            .and_then(|payload| Activation::<M>::parse(payload.trim_end_matches('\0')))
            .and_then(|activation| match activation.kind {
                PayloadKind::Activate => Ok(activation),
                PayloadKind::Debug => {
                    debug!("debug payload ignored");
                    Err(Error::PayloadParse)
                }
            });
        if parsed.is_err() {
            warn!("gateway payload rejected");
        }
        Some(parsed)
    }

    /// Adopts a gateway payload. Thresholds are only taken over on a full
    /// activation.
    fn apply(&mut self, activation: &Activation<M>, with_thresholds: bool) -> Result<(), Error> {
        if with_thresholds {
            for (slot, params) in activation.sensors.iter().enumerate() {
                self.sensors.configure(slot, params.index, params.thresholds)?;
            }
        }
        self.device.apply(activation);
        if self.device.my_addr != BROADCAST {
            self.radio.set_my_address(self.device.my_addr);
        }
        info!(
            "gateway {}:{}, my address {}",
            self.device.gateway_pan_id, self.device.gateway_addr, self.device.my_addr
        );
        Ok(())
    }

    /// Applies a full activation and powers the sensors up.
    fn activate_sensors(&mut self, activation: &Activation<M>) -> Result<Transition, Error> {
        self.apply(activation, true)?;
        self.session.retry = 0;
        let sleep = if self.driver.activate() {
            self.config.default_sleep_ms
        } else {
            NO_SLEEP
        };
        Ok(Transition::to(LinkState::InitSensor, sleep))
    }

    fn stop_sensing(&mut self) {
        self.driver.deactivate();
        self.device.enable_sense = false;
    }

    fn request(&mut self, state: LinkState, wait: LinkState, to_gateway: bool) -> Transition {
        let result = if to_gateway {
            let (pan_id, addr) = (self.device.gateway_pan_id, self.device.gateway_addr);
            self.transmit(pan_id, addr, UPDATE_REQUEST, true)
        } else {
            let request = self.activation_request.clone();
            self.transmit(BROADCAST, BROADCAST, request.as_bytes(), true)
        };
        match result {
            Ok(()) => {
                self.session.fail = 0;
                Transition::now(wait)
            }
            Err(e) => {
                self.radio.close();
                self.last_error = Some(e);
                let sleep = self.tx_failure_sleep();
                debug!("tx fail count {}, sleep {} ms", self.session.fail, sleep);
                Transition::to(state, sleep)
            }
        }
    }

    pub(super) fn trigger_activate(&mut self) -> Transition {
        self.request(LinkState::TriggerActivate, LinkState::WaitActivate, false)
    }

    pub(super) fn wait_activate(&mut self) -> Transition {
        match self.receive() {
            Some(Ok(activation)) => match self.activate_sensors(&activation) {
                Ok(transition) => transition,
                Err(e) => {
                    self.last_error = Some(e);
                    Transition::now(LinkState::WaitActivate)
                }
            },
            Some(Err(e)) => {
                self.last_error = Some(e);
                Transition::now(LinkState::WaitActivate)
            }
            None if self.rx_timed_out() => {
                self.radio.close();
                self.last_error = Some(Error::LinkTimeout);
                self.session.retry = self.session.retry.saturating_add(1);
                debug!("activate retry {}", self.session.retry);
                if self.session.retry <= self.config.max_activate_retry {
                    Transition::to(LinkState::TriggerActivate, self.retry_interval())
                } else {
                    warn!("activation retries exhausted, cooling down");
                    self.session.retry = 0;
                    Transition::to(LinkState::TriggerActivate, self.config.activate_cooldown_ms)
                }
            }
            None => Transition::now(LinkState::WaitActivate),
        }
    }

    pub(super) fn init_sensor(&mut self) -> Transition {
        let now = self.platform.millis();
        self.sensors.initialize(&mut self.driver, now, &mut self.queue);
        self.last_sense = now;
        self.device.enable_sense = true;
        Transition::now(LinkState::SendQueue)
    }

    /// Reads the enhanced ACK of the last report and picks the next state.
    fn handle_ack(&mut self) -> LinkState {
        let limits = IntervalLimits {
            max_interval_ms: self.config.max_interval_ms,
            keep_alive_ms: self.config.keep_alive_ms,
        };
        let outcome = ack::interpret(self.radio.enhanced_ack(), limits);

        let next = match outcome.flag {
            Some(AckFlag::ForceSave) => {
                self.sensors.force_save_all();
                LinkState::SendQueue
            }
            Some(AckFlag::UpdateParams) => LinkState::TriggerUpdateParam,
            Some(AckFlag::Activate) => LinkState::TriggerActivate,
            Some(AckFlag::FirmwareUpdate) => LinkState::TriggerFirmwareUpdate,
            Some(AckFlag::Normal) | None => LinkState::SendQueue,
        };

        if let Err(e) = outcome.check() {
            warn!("invalid enhanced ack: {}", e);
            let diagnostic = outcome.diagnostic();
            let (pan_id, addr) = (self.device.gateway_pan_id, self.device.gateway_addr);
            let _ = self.transmit(pan_id, addr, diagnostic.as_bytes(), false);
            self.last_error = Some(e);
            return LinkState::TriggerActivate;
        }

        if let Some(interval) = outcome.interval_ms {
            self.device.sense_interval_ms = interval;
        }
        next
    }

    pub(super) fn send_queue(&mut self) -> Transition {
        if self.queue.is_empty() {
            return Transition::to(LinkState::SendQueue, self.device.sense_interval_ms);
        }

        let now = self.platform.millis();
        let report = report::encode(&self.queue, self.device.layout, now);
        if report.count == 0 {
            warn!("no reading fits a frame");
            return Transition::to(LinkState::SendQueue, self.device.sense_interval_ms);
        }
        let (pan_id, addr) = (self.device.gateway_pan_id, self.device.gateway_addr);
        match self.transmit(pan_id, addr, report.payload.as_bytes(), false) {
            Ok(()) => {
                let next = self.handle_ack();
                if next != LinkState::SendQueue {
                    self.stop_sensing();
                }
                if let Err(e) = self.queue.dequeue(report.count) {
                    self.last_error = Some(e);
                }
                Transition::now(next)
            }
            Err(e) => {
                self.last_error = Some(e);
                self.session.recompute_backoff = true;
                Transition::now(LinkState::TriggerReconnect)
            }
        }
    }

    fn bump_backoff(&mut self) {
        self.session.retry = self
            .session
            .retry
            .saturating_add(1)
            .min(self.config.max_backoff_count);
        self.session.recompute_backoff = true;
    }

    pub(super) fn trigger_reconnect(&mut self) -> Transition {
        let now = self.platform.millis();
        let sense_time = self.last_sense.wrapping_add(self.device.sense_interval_ms);

        if self.session.recompute_backoff {
            self.session.recompute_backoff = false;
            let base = backoff::base_interval(self.session.retry, self.config.min_backoff_ms);
            let interval = backoff::jittered(base, self.rng.next_u32());
            self.session.backoff_interval = interval;
            self.session.backoff_time = now.wrapping_add(interval);
            debug!(
                "backoff retry {}, {} ms, until {}",
                self.session.retry, interval, self.session.backoff_time
            );
        }

        let wake_at = if backoff::is_later(self.session.backoff_time, sense_time) {
            self.session.backoff_time
        } else {
            sense_time
        };
        let sleep = backoff::remaining(now, wake_at);

        if backoff::is_later(self.session.backoff_time, now) {
            let request = self.activation_request.clone();
            match self.transmit(BROADCAST, BROADCAST, request.as_bytes(), true) {
                Ok(()) => return Transition::now(LinkState::WaitReconnect),
                Err(e) => {
                    self.radio.close();
                    self.last_error = Some(e);
                    self.bump_backoff();
                }
            }
        }
        Transition::to(LinkState::TriggerReconnect, sleep)
    }

    pub(super) fn wait_reconnect(&mut self) -> Transition {
        match self.receive() {
            Some(Ok(activation)) => match self.apply(&activation, false) {
                Ok(()) => {
                    info!("reconnected");
                    self.session.retry = 0;
                    self.session.backoff_time = 0;
                    Transition::now(LinkState::SendQueue)
                }
                Err(e) => {
                    self.last_error = Some(e);
                    Transition::now(LinkState::WaitReconnect)
                }
            },
            Some(Err(e)) => {
                self.last_error = Some(e);
                Transition::now(LinkState::WaitReconnect)
            }
            None if self.rx_timed_out() => {
                self.radio.close();
                self.last_error = Some(Error::LinkTimeout);
                self.bump_backoff();
                Transition::now(LinkState::TriggerReconnect)
            }
            None => Transition::now(LinkState::WaitReconnect),
        }
    }

    pub(super) fn trigger_update_param(&mut self) -> Transition {
        self.request(LinkState::TriggerUpdateParam, LinkState::WaitUpdateParam, true)
    }

    pub(super) fn wait_update_param(&mut self) -> Transition {
        match self.receive() {
            Some(Ok(activation)) => match self.activate_sensors(&activation) {
                Ok(transition) => transition,
                Err(e) => {
                    self.last_error = Some(e);
                    Transition::now(LinkState::WaitUpdateParam)
                }
            },
            Some(Err(e)) => {
                self.last_error = Some(e);
                Transition::now(LinkState::WaitUpdateParam)
            }
            None if self.rx_timed_out() => {
                self.radio.close();
                self.last_error = Some(Error::LinkTimeout);
                self.session.retry = self.session.retry.saturating_add(1);
                debug!("update retry {}", self.session.retry);
                if self.session.retry <= self.config.max_update_param_retry {
                    Transition::to(LinkState::TriggerUpdateParam, self.retry_interval())
                } else {
                    warn!("parameter update failed, activating again");
                    self.session.retry = 0;
                    self.stop_sensing();
                    Transition::now(LinkState::TriggerActivate)
                }
            }
            None => Transition::now(LinkState::WaitUpdateParam),
        }
    }

    pub(super) fn trigger_firmware_update(&mut self) -> Transition {
        warn!("firmware update requested, not supported");
        self.last_error = Some(Error::Unimplemented);
        Transition::now(LinkState::WaitFirmwareUpdate)
    }

    pub(super) fn wait_firmware_update(&mut self) -> Transition {
        self.last_error = Some(Error::Unimplemented);
        Transition::to(LinkState::TriggerActivate, self.config.default_sleep_ms)
    }
}
