//! Aggregate state store
//!
//! Holds the most recent reading per (record type, sensor index) slot. The
//! decode loop calls [`StateStore::update`] after every successful decode;
//! the periodic snapshot writer calls [`StateStore::snapshot`] from its own
//! thread. Both run under one coarse exclusive lock spanning the whole slot
//! table, so a snapshot never observes a partially updated reading and an
//! update never lands inside a snapshot copy. Contention is negligible at
//! weather-station event rates, so the lock is not split.

use std::sync::{Arc, Mutex, PoisonError};

use crate::protocol::types::{Reading, RecordType, MAX_SENSORS};

/// Number of record types with a slot row
const TYPE_COUNT: usize = RecordType::ALL.len();

/// One slot row per record type, one slot per sensor index
///
/// `None` means the slot has never been observed.
type SlotTable = [[Option<Reading>; MAX_SENSORS]; TYPE_COUNT];

fn empty_table() -> SlotTable {
    std::array::from_fn(|_| std::array::from_fn(|_| None))
}

/// An independent copy of the slot table at one instant
#[derive(Debug, Clone)]
pub struct Snapshot {
    slots: SlotTable,
}

impl Snapshot {
    /// The reading in a slot, if that slot was ever observed
    pub fn get(&self, record_type: RecordType, sensor: u8) -> Option<&Reading> {
        self.slots[record_type.table_index()][(sensor & 0x0f) as usize].as_ref()
    }

    /// Iterate over all observed slots
    pub fn iter(&self) -> impl Iterator<Item = (RecordType, u8, &Reading)> {
        RecordType::ALL.into_iter().flat_map(move |record_type| {
            self.slots[record_type.table_index()]
                .iter()
                .enumerate()
                .filter_map(move |(sensor, slot)| {
                    slot.as_ref().map(|r| (record_type, sensor as u8, r))
                })
        })
    }

    /// Number of observed slots
    pub fn observed_count(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.observed_count() == 0
    }
}

/// Thread-safe table of last-known readings
///
/// Shared between the decode loop and the snapshot writer as
/// [`SharedState`].
#[derive(Debug, Default)]
pub struct StateStore {
    inner: Mutex<SlotTableBox>,
}

// Wrapper so Default stays derivable with the array table inside.
#[derive(Debug)]
struct SlotTableBox(SlotTable);

impl Default for SlotTableBox {
    fn default() -> Self {
        Self(empty_table())
    }
}

/// Handle shared between the decode loop and the snapshot writer
pub type SharedState = Arc<StateStore>;

impl StateStore {
    pub fn new() -> SharedState {
        Arc::new(Self::default())
    }

    /// Replace the slot for this reading's (type, sensor) key
    ///
    /// The sensor nibble is masked to the table width, so a decoded index
    /// can never fault the table.
    pub fn update(&self, reading: Reading) {
        let row = reading.record_type().table_index();
        let col = (reading.sensor_index() & 0x0f) as usize;
        let mut table = self.lock();
        table.0[row][col] = Some(reading);
    }

    /// Copy the entire table into an independent snapshot
    pub fn snapshot(&self) -> Snapshot {
        let table = self.lock();
        Snapshot {
            slots: table.0.clone(),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SlotTableBox> {
        // A poisoned lock only means a panic elsewhere; the table itself is
        // always in a consistent state between slot replacements.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
