//! Fuzz target: persisted record decoding
//!
//! Arbitrary slot images must either decode to a record that re-encodes
//! to the same bytes, or be rejected. Never a panic.
//!
//! cargo fuzz run fuzz_record_decode

#![no_main]

use chamberctl::chamber::{ChamberConfig, MovingTargets};
use chamberctl::persistence::{Record, decode, encode};
use libfuzzer_sys::fuzz_target;

fn check<R: Record>(data: &[u8]) {
    let Some(slot) = data.get(..R::SIZE) else {
        return;
    };
    if let Ok(record) = decode::<R>(slot) {
        let again = encode(&record).expect("decoded record re-encodes");
        assert_eq!(&again[..], slot, "accepted slot is canonical");
    }
}

fuzz_target!(|data: &[u8]| {
    check::<MovingTargets>(data);
    check::<ChamberConfig>(data);
});
