#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `guac-idpool` allocates and frees non-negative integer identifiers for
//! the layer, buffer, and stream pools a [`Client`](#client-usage) owns.
//!
//! # Design
//!
//! Grounded on `examples/original_source/libguac/include/pool.h`: a pool
//! has a `min_floor` below which `next()` always mints a fresh, strictly
//! increasing value, ignoring anything on the free list. Only once that
//! floor is satisfied does `next()` drain the FIFO free list before
//! extending the counter. This keeps IDs fresh early in a connection's life,
//! which matters because some clients cache layer resources indexed by id
//! and get confused if an id is recycled too soon after being freed.
//!
//! # Invariants
//!
//! - Every value returned by [`Pool::next`] is non-negative and, while held,
//!   unique among currently-held values from the same pool.
//! - The first `min_floor` values returned are `0, 1, 2, ..., min_floor - 1`
//!   in order, regardless of any `free` calls in between.
//! - After `min_floor` values have been issued, freed values reappear in the
//!   order they were freed (FIFO), before any new value is minted.

use std::collections::VecDeque;
use std::sync::Mutex;

/// A pool of reusable non-negative integer identifiers.
///
/// Thread-safe: every operation holds an internal mutex for its full
/// duration, matching the "lock held for the entirety of each operation"
/// contract placed on ID pools.
pub struct Pool {
    state: Mutex<PoolState>,
}

struct PoolState {
    min_floor: u64,
    issued: u64,
    next_value: i64,
    free_list: VecDeque<i64>,
}

impl Pool {
    /// Creates a new, empty pool with the given reuse floor.
    ///
    /// `min_floor` is the number of `next()` calls that must have returned a
    /// value before freed values are allowed to be handed back out.
    #[must_use]
    pub fn new(min_floor: u64) -> Self {
        Self {
            state: Mutex::new(PoolState {
                min_floor,
                issued: 0,
                next_value: 0,
                free_list: VecDeque::new(),
            }),
        }
    }

    /// Returns the next available identifier.
    ///
    /// Before `min_floor` identifiers have been issued, this always mints a
    /// new, strictly increasing value starting from 0, even if the free list
    /// is non-empty. Afterwards, the oldest freed value is returned first.
    pub fn next(&self) -> i64 {
        let mut state = self.state.lock().expect("pool mutex poisoned");
        state.issued += 1;

        if state.issued > state.min_floor {
            if let Some(value) = state.free_list.pop_front() {
                return value;
            }
        }

        let value = state.next_value;
        state.next_value += 1;
        value
    }

    /// Returns `value` to the pool so a future [`Self::next`] call may reuse
    /// it (subject to the reuse-floor guarantee).
    pub fn free(&self, value: i64) {
        let mut state = self.state.lock().expect("pool mutex poisoned");
        state.free_list.push_back(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_ids_ignore_free_list_before_floor() {
        let pool = Pool::new(4);
        let a = pool.next();
        pool.free(a);
        let b = pool.next();
        let c = pool.next();
        let d = pool.next();
        assert_eq!([a, b, c, d], [0, 1, 2, 3]);
    }

    #[test]
    fn freed_ids_reappear_fifo_after_floor_satisfied() {
        let pool = Pool::new(2);
        let a = pool.next(); // 0, issued=1
        let b = pool.next(); // 1, issued=2 (floor satisfied)
        pool.free(a);
        pool.free(b);
        let first = pool.next();
        let second = pool.next();
        assert_eq!(first, a);
        assert_eq!(second, b);
    }

    #[test]
    fn zero_floor_recycles_immediately() {
        let pool = Pool::new(0);
        let a = pool.next();
        pool.free(a);
        let b = pool.next();
        assert_eq!(a, b);
    }

    #[test]
    fn ids_stay_unique_while_held() {
        let pool = Pool::new(0);
        let mut held = std::collections::HashSet::new();
        for _ in 0..50 {
            let id = pool.next();
            assert!(held.insert(id), "id {id} issued twice while still held");
        }
    }
}
