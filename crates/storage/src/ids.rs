#![forbid(unsafe_code)]

use std::sync::atomic::{AtomicI64, Ordering};

const SPACE_SHIFT: u32 = 60;
const MACHINE_SHIFT: u32 = 48;
const MACHINE_MASK: i64 = (1 << 12) - 1;
const COUNTER_MASK: i64 = (1 << MACHINE_SHIFT) - 1;

const ITEM_SPACE: i64 = 1;
const VERSION_SPACE: i64 = 2;
const SUCCESSOR_SPACE: i64 = 3;

/// Generates ids that are unique across cooperating instances: a 2-bit id
/// space, a 12-bit machine id and a 48-bit per-space counter. Counters start
/// at 1 and the space tag is nonzero, so no generated id ever equals the
/// root sentinel, and item ids never collide with version ids.
#[derive(Debug)]
pub struct IdGenerator {
    machine_id: i64,
    item_counter: AtomicI64,
    version_counter: AtomicI64,
    successor_counter: AtomicI64,
}

impl IdGenerator {
    pub fn new(machine_id: u16) -> Self {
        Self {
            machine_id: i64::from(machine_id) & MACHINE_MASK,
            item_counter: AtomicI64::new(1),
            version_counter: AtomicI64::new(1),
            successor_counter: AtomicI64::new(1),
        }
    }

    pub fn generate_item_id(&self) -> i64 {
        self.compose(ITEM_SPACE, &self.item_counter)
    }

    pub fn generate_version_id(&self) -> i64 {
        self.compose(VERSION_SPACE, &self.version_counter)
    }

    pub fn generate_successor_id(&self) -> i64 {
        self.compose(SUCCESSOR_SPACE, &self.successor_counter)
    }

    fn compose(&self, space: i64, counter: &AtomicI64) -> i64 {
        let count = counter.fetch_add(1, Ordering::Relaxed) & COUNTER_MASK;
        (space << SPACE_SHIFT) | (self.machine_id << MACHINE_SHIFT) | count
    }
}
