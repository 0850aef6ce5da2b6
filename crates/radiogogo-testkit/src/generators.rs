//! Proptest generators for property-based testing.

use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;
use radiogogo_core::StationRef;
use std::collections::HashSet;

/// Generate a random station id.
pub fn station_ref() -> impl Strategy<Value = StationRef> {
    any::<[u8; 16]>().prop_map(StationRef::from_bytes)
}

/// Generate a set of up to `max` distinct station ids.
pub fn station_refs(max: usize) -> impl Strategy<Value = HashSet<StationRef>> {
    prop::collection::hash_set(station_ref(), 0..=max)
}

/// Generate a timestamp in years 0000 through 9999 with nanosecond precision,
/// the range a vote timestamp can be stored in.
pub fn timestamp() -> impl Strategy<Value = DateTime<Utc>> {
    (-62_167_219_200i64..=253_402_300_799i64, 0u32..1_000_000_000u32).prop_map(|(secs, nanos)| {
        Utc.timestamp_opt(secs, nanos).unwrap()
    })
}

/// One mutation of a station set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOp {
    Add(StationRef),
    Remove(StationRef),
}

impl SetOp {
    /// Apply to a model set.
    pub fn apply_to(&self, model: &mut HashSet<StationRef>) {
        match self {
            SetOp::Add(id) => {
                model.insert(*id);
            }
            SetOp::Remove(id) => {
                model.remove(id);
            }
        }
    }
}

/// Generate up to `max` operations over a pool of `pool` ids, so removes
/// regularly hit ids that were added.
pub fn set_ops(pool: u8, max: usize) -> impl Strategy<Value = Vec<SetOp>> {
    let op = (any::<bool>(), 0..pool.max(1)).prop_map(|(add, n)| {
        let id = StationRef::from_bytes([n; 16]);
        if add {
            SetOp::Add(id)
        } else {
            SetOp::Remove(id)
        }
    });
    prop::collection::vec(op, 0..=max)
}
