//! Checksummed dual-tier parameter store.
//!
//! Two record blocks live in one byte-addressed store:
//!
//! ```text
//!  0                      N*MT                                N*(MT+CC)
//!  ┌──────┬──────┬───┬────┬──────────┬──────────┬───┬──────────┐
//!  │ MT 1 │ MT 2 │ … │MT N│   CC 1   │   CC 2   │ … │   CC N   │
//!  └──────┴──────┴───┴────┴──────────┴──────────┴───┴──────────┘
//!   MovingTargets (12 B)   ChamberConfig (24 B)
//! ```
//!
//! Each slot is the record's fixed-width postcard encoding, sealed with a
//! CRC-16 computed over the slot with the checksum field zeroed. A slot
//! that fails the check is reported and never trusted.
//!
//! ChamberConfig changes rarely and is written on every change.
//! MovingTargets carries the PID integral, so it changes every pass; it is
//! written immediately the first time after boot and then at most once per
//! save interval to spare EEPROM endurance.

pub mod crc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::app::ports::StoragePort;
use crate::chamber::{ChamberConfig, ChamberId, MovingTargets};
use crate::config::MAX_CHAMBERS;
use crate::error::{Error, RecordError};
use crate::timekeeping::time_up;

use crc::{RECORD_SEED, crc16};

/// Largest slot any record occupies.
pub const MAX_RECORD_SIZE: usize = 32;

// ───────────────────────────────────────────────────────────────
// Record trait
// ───────────────────────────────────────────────────────────────

/// Which block a record type lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Block {
    MovingTargets,
    ChamberConfig,
}

/// A fixed-size, checksummed record. The checksum must be the final
/// field, encoded as two little-endian bytes.
pub trait Record: Serialize + DeserializeOwned + Copy {
    const SIZE: usize;
    const BLOCK: Block;

    fn checksum(&self) -> u16;

    fn set_checksum(&mut self, crc: u16);

    /// Chamber id embedded in the record, if any.
    fn owner(&self) -> Option<u8> {
        None
    }
}

impl Record for MovingTargets {
    const SIZE: usize = 12;
    const BLOCK: Block = Block::MovingTargets;

    fn checksum(&self) -> u16 {
        self.checksum
    }

    fn set_checksum(&mut self, crc: u16) {
        self.checksum = crc;
    }
}

impl Record for ChamberConfig {
    const SIZE: usize = 24;
    const BLOCK: Block = Block::ChamberConfig;

    fn checksum(&self) -> u16 {
        self.checksum
    }

    fn set_checksum(&mut self, crc: u16) {
        self.checksum = crc;
    }

    fn owner(&self) -> Option<u8> {
        Some(self.chamber_id)
    }
}

// ───────────────────────────────────────────────────────────────
// Slot codec
// ───────────────────────────────────────────────────────────────

/// CRC over a slot image with its checksum bytes treated as zero.
fn slot_crc(slot: &[u8]) -> u16 {
    let body = slot.len() - 2;
    let crc = crc16(RECORD_SEED, &slot[..body]);
    crc16(crc, &[0, 0])
}

/// Encode `record` into a sealed slot image.
pub fn encode<R: Record>(record: &R) -> Result<heapless::Vec<u8, MAX_RECORD_SIZE>, RecordError> {
    let mut unsealed = *record;
    unsealed.set_checksum(0);

    let mut buf = [0u8; MAX_RECORD_SIZE];
    let used = postcard::to_slice(&unsealed, &mut buf)
        .map_err(|_| RecordError::Encode)?
        .len();
    if used != R::SIZE {
        return Err(RecordError::Encode);
    }

    let crc = slot_crc(&buf[..used]);
    buf[used - 2..used].copy_from_slice(&crc.to_le_bytes());
    heapless::Vec::from_slice(&buf[..used]).map_err(|_| RecordError::Encode)
}

/// Validate and decode a slot image.
///
/// The checksum is verified before decoding, so any corrupted byte is
/// reported as [`RecordError::Checksum`].
pub fn decode<R: Record>(slot: &[u8]) -> Result<R, RecordError> {
    if slot.len() < R::SIZE {
        return Err(RecordError::Decode);
    }
    let slot = &slot[..R::SIZE];
    let stored = u16::from_le_bytes([slot[R::SIZE - 2], slot[R::SIZE - 1]]);
    let computed = slot_crc(slot);
    if stored != computed {
        return Err(RecordError::Checksum { stored, computed });
    }
    postcard::from_bytes(slot).map_err(|_| RecordError::Decode)
}

// ───────────────────────────────────────────────────────────────
// Parameter store
// ───────────────────────────────────────────────────────────────

/// Outcome of a throttled MovingTargets save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// First save since boot, written immediately.
    WrittenFirst,
    /// Save interval elapsed, written.
    Written,
    /// Within the save interval, nothing written.
    Deferred,
}

#[derive(Debug, Clone, Copy, Default)]
struct Throttle {
    saved_once: bool,
    last_save_ms: u32,
}

/// Typed slot access over a [`StoragePort`].
pub struct ParamStore<S: StoragePort> {
    storage: S,
    chamber_count: u8,
    save_interval_ms: u32,
    throttle: [Throttle; MAX_CHAMBERS],
}

impl<S: StoragePort> ParamStore<S> {
    /// Wrap `storage`, checking both blocks fit.
    pub fn new(storage: S, chamber_count: u8, save_interval_ms: u32) -> Result<Self, Error> {
        let needed = usize::from(chamber_count) * (MovingTargets::SIZE + ChamberConfig::SIZE);
        if needed > storage.capacity() {
            return Err(Error::Record(RecordError::OutOfBounds));
        }
        Ok(Self {
            storage,
            chamber_count,
            save_interval_ms,
            throttle: [Throttle::default(); MAX_CHAMBERS],
        })
    }

    /// Byte offset of `R`'s slot for chamber `id`.
    pub fn slot_offset<R: Record>(&self, id: ChamberId) -> usize {
        let base = match R::BLOCK {
            Block::MovingTargets => 0,
            Block::ChamberConfig => usize::from(self.chamber_count) * MovingTargets::SIZE,
        };
        base + id.index() * R::SIZE
    }

    /// Read and validate `R` for chamber `id`.
    pub fn load<R: Record>(&self, id: ChamberId) -> Result<R, Error> {
        let mut slot = [0u8; MAX_RECORD_SIZE];
        self.storage
            .read(self.slot_offset::<R>(id), &mut slot[..R::SIZE])?;
        let record: R = decode(&slot[..R::SIZE])?;
        if let Some(found) = record.owner() {
            if found != id.get() {
                return Err(RecordError::ChamberMismatch {
                    expected: id.get(),
                    found,
                }
                .into());
            }
        }
        Ok(record)
    }

    /// Seal and write `R` for chamber `id`.
    pub fn save<R: Record>(&mut self, id: ChamberId, record: &R) -> Result<(), Error> {
        let slot = encode(record)?;
        let offset = self.slot_offset::<R>(id);
        self.storage.write(offset, &slot)?;
        Ok(())
    }

    /// Save MovingTargets subject to the per-chamber write throttle.
    pub fn save_moving_targets(
        &mut self,
        id: ChamberId,
        targets: &MovingTargets,
        now_ms: u32,
    ) -> Result<SaveOutcome, Error> {
        let throttle = self.throttle[id.index()];
        let outcome = if !throttle.saved_once {
            SaveOutcome::WrittenFirst
        } else if time_up(throttle.last_save_ms, now_ms, self.save_interval_ms) {
            SaveOutcome::Written
        } else {
            return Ok(SaveOutcome::Deferred);
        };

        self.save(id, targets)?;
        self.throttle[id.index()] = Throttle {
            saved_once: true,
            last_save_ms: now_ms,
        };
        Ok(outcome)
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }
}
