use super::*;

const KEEP_ALIVE: u32 = 1_000;
const START: u32 = 100;

struct FixedDriver {
    value: i16,
}

impl SensorDriver for FixedDriver {
    fn measure(&mut self, _index: u16) -> Measurement {
        Measurement {
            value: Value::I16(self.value),
            digits: 0,
            reason: None,
        }
    }

    fn activate(&mut self) -> bool {
        false
    }

    fn deactivate(&mut self) {}

    fn voltage_level(&mut self) -> VoltageLevel {
        VoltageLevel::new(11)
    }
}

fn bank() -> SensorBank<2> {
    let mut bank = SensorBank::new(KEEP_ALIVE);
    bank.configure(0, 3, Thresholds::default()).unwrap();
    bank
}

#[test]
fn test_initialize_queues_every_assigned_slot() {
    let mut bank = bank();
    let mut driver = FixedDriver { value: 0 };
    let mut queue: RingQueue<Reading, 8> = RingQueue::new();

    bank.initialize(&mut driver, START, &mut queue);

    assert_eq!(queue.len(), 1);
    assert_eq!(queue.peek(queue.head()).unwrap().index, 3);
    assert_eq!(bank.slots()[0].state, SensorState::OffStable);
    assert_eq!(bank.slots()[0].last_save, START);
    assert_eq!(bank.slots()[1].index, None);
}

#[test]
fn test_keep_alive_boundary() {
    let mut bank = bank();
    let mut driver = FixedDriver { value: 0 };
    let mut queue: RingQueue<Reading, 8> = RingQueue::new();
    bank.initialize(&mut driver, START, &mut queue);

    assert_eq!(bank.sample(&mut driver, START + KEEP_ALIVE - 1, &mut queue), 0);
    assert_eq!(queue.len(), 1);
    assert_eq!(bank.slots()[0].last_save, START);

    assert_eq!(bank.sample(&mut driver, START + KEEP_ALIVE, &mut queue), 1);
    assert_eq!(queue.len(), 2);
    assert_eq!(bank.slots()[0].last_save, START + KEEP_ALIVE);
    // Saved without a state change.
    assert_eq!(bank.slots()[0].state, SensorState::OffStable);
}

#[test]
fn test_keep_alive_across_clock_wrap() {
    let mut bank = bank();
    let mut driver = FixedDriver { value: 0 };
    let mut queue: RingQueue<Reading, 8> = RingQueue::new();
    let start = u32::MAX - 400;
    bank.initialize(&mut driver, start, &mut queue);

    assert_eq!(bank.sample(&mut driver, start.wrapping_add(KEEP_ALIVE - 1), &mut queue), 0);
    assert_eq!(bank.sample(&mut driver, start.wrapping_add(KEEP_ALIVE), &mut queue), 1);
}

#[test]
fn test_full_queue_drops_event() {
    let mut bank = bank();
    let mut driver = FixedDriver { value: 0 };
    // Holds a single reading.
    let mut queue: RingQueue<Reading, 2> = RingQueue::new();
    bank.initialize(&mut driver, START, &mut queue);
    assert!(queue.is_full());

    driver.value = 5;
    assert_eq!(bank.sample(&mut driver, START + 10, &mut queue), 0);

    let slot = &bank.slots()[0];
    assert_eq!(slot.state, SensorState::OnStable);
    assert_eq!(slot.last_save, START);
    assert!(!slot.save_request);
    assert_eq!(queue.len(), 1);
    assert_eq!(queue.peek(queue.head()).unwrap().state, Switch::Off);
}

#[test]
fn test_force_save_all() {
    let mut bank = bank();
    let mut driver = FixedDriver { value: 0 };
    let mut queue: RingQueue<Reading, 8> = RingQueue::new();
    bank.initialize(&mut driver, START, &mut queue);

    bank.force_save_all();
    assert_eq!(bank.sample(&mut driver, START + 1, &mut queue), 1);
    assert!(!bank.slots()[0].save_request);
    // Unassigned slots are never sampled.
    assert!(bank.slots()[1].save_request);
}

#[test]
fn test_configure_out_of_range() {
    let mut bank = bank();
    assert_eq!(bank.configure(2, 0, Thresholds::default()), Err(Error::IndexOutOfRange));
}
