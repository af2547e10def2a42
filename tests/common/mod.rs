#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};

use rand::rngs::mock::StepRng;
use subghz_iot::config::NodeConfig;
use subghz_iot::identity::ProgramIdentity;
use subghz_iot::link::LinkState;
use subghz_iot::node::{Node, Platform};
use subghz_iot::radio::{Bitrate, Transceiver, TxPower};
use subghz_iot::reading::{Value, VoltageLevel};
use subghz_iot::sensor::{Measurement, SensorDriver};
use subghz_iot::wake::WakeFlag;

/// A frame handed to the mock radio.
#[derive(Debug, Clone, PartialEq)]
pub struct Sent {
    pub pan_id: u16,
    pub addr: u16,
    pub payload: String,
    pub rx_on: bool,
}

#[derive(Debug, Default)]
pub struct MockRadio {
    pub sent: Vec<Sent>,
    pub inbox: VecDeque<Vec<u8>>,
    pub eack: Vec<u8>,
    pub fail_sends: usize,
    pub my_addr: Option<u16>,
    pub channel: Option<u8>,
    pub rx_on: bool,
    pub is_open: bool,
    pub closes: usize,
}

impl MockRadio {
    pub fn last_sent(&self) -> &Sent {
        self.sent.last().expect("nothing sent")
    }
}

impl Transceiver for MockRadio {
    type Error = ();

    fn open(&mut self, channel: u8, _pan_id: u16, _bitrate: Bitrate, _power: TxPower) -> Result<(), ()> {
        self.channel = Some(channel);
        self.is_open = true;
        Ok(())
    }

    fn rx_enable(&mut self) -> Result<(), ()> {
        self.rx_on = true;
        Ok(())
    }

    fn rx_disable(&mut self) -> Result<(), ()> {
        self.rx_on = false;
        Ok(())
    }

    fn send(&mut self, pan_id: u16, addr: u16, payload: &[u8]) -> Result<(), ()> {
        self.sent.push(Sent {
            pan_id,
            addr,
            payload: String::from_utf8_lossy(payload).into_owned(),
            rx_on: self.rx_on,
        });
        if self.fail_sends > 0 {
            self.fail_sends -= 1;
            return Err(());
        }
        Ok(())
    }

    fn read_data(&mut self, buf: &mut [u8]) -> usize {
        match self.inbox.pop_front() {
            Some(frame) => {
                let len = frame.len().min(buf.len());
                buf[..len].copy_from_slice(&frame[..len]);
                len
            }
            None => 0,
        }
    }

    fn decode_frame<'a>(&self, raw: &'a [u8]) -> Option<&'a [u8]> {
        Some(raw)
    }

    fn enhanced_ack(&self) -> &[u8] {
        &self.eack
    }

    fn set_my_address(&mut self, addr: u16) {
        self.my_addr = Some(addr);
    }

    fn close(&mut self) {
        self.is_open = false;
        self.closes += 1;
    }
}

#[derive(Debug, Default)]
pub struct MockDriver {
    pub values: HashMap<u16, i16>,
    pub needs_warm_up: bool,
    pub activations: usize,
    pub deactivations: usize,
}

impl MockDriver {
    pub fn set(&mut self, index: u16, value: i16) {
        self.values.insert(index, value);
    }
}

impl SensorDriver for MockDriver {
    fn measure(&mut self, index: u16) -> Measurement {
        Measurement {
            value: Value::I16(self.values.get(&index).copied().unwrap_or(0)),
            digits: 0,
            reason: None,
        }
    }

    fn activate(&mut self) -> bool {
        self.activations += 1;
        self.needs_warm_up
    }

    fn deactivate(&mut self) {
        self.deactivations += 1;
    }

    fn voltage_level(&mut self) -> VoltageLevel {
        VoltageLevel::new(11)
    }
}

/// A clock that only moves when told to, or when the node idles.
#[derive(Debug)]
pub struct MockPlatform {
    pub now: u32,
    pub waits: Vec<u32>,
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self {
            now: 1_000,
            waits: Vec::new(),
        }
    }
}

impl Platform for MockPlatform {
    fn millis(&self) -> u32 {
        self.now
    }

    fn wait_event(&mut self, wake: &WakeFlag, timeout_ms: u32) -> u32 {
        self.waits.push(timeout_ms);
        if wake.is_set() {
            self.now = self.now.wrapping_add(1);
            timeout_ms - 1
        } else {
            self.now = self.now.wrapping_add(timeout_ms);
            0
        }
    }
}

pub type TestNode = Node<MockRadio, MockDriver, MockPlatform, StepRng>;

pub const GATEWAY_PAN: u16 = 0x1234;
pub const GATEWAY_ADDR: u16 = 0x0001;
pub const MY_ADDR: u16 = 0x0042;

/// Legacy single-sensor activation: on above 10, off below 5, no debounce.
pub const LEGACY_ACTIVATION: &str = "activate,0x1234,1,0x42,10,0,5,0";

pub fn node_with(config: NodeConfig) -> TestNode {
    let identity = ProgramIdentity::new("door", 3).unwrap();
    Node::new(
        config,
        &identity,
        MockRadio::default(),
        MockDriver::default(),
        MockPlatform::default(),
        StepRng::new(0, 0),
    )
    .unwrap()
}

pub fn node() -> TestNode {
    node_with(NodeConfig::default())
}

pub fn advance(node: &mut TestNode, ms: u32) {
    let platform = node.platform_mut();
    platform.now = platform.now.wrapping_add(ms);
}

/// Runs the activation handshake with `payload` and stops in `InitSensor`.
pub fn activate_with(node: &mut TestNode, payload: &str) {
    assert_eq!(node.step().next, LinkState::WaitActivate);
    node.radio_mut().inbox.push_back(payload.as_bytes().to_vec());
    assert_eq!(node.step().next, LinkState::InitSensor);
}

/// Activates and takes the initial measurement, stopping in `SendQueue` with
/// the initial readings queued.
pub fn running(node: &mut TestNode, payload: &str) {
    activate_with(node, payload);
    assert_eq!(node.step().next, LinkState::SendQueue);
}
