//! Synthetic device under test
//!
//! Holds transmitted frames and releases them after a fixed delay plus a
//! seeded random extra delay. Frames whose delays overlap can come back out of
//! order, and a configurable share is dropped.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use tracing::trace;

pub struct DelayLine {
    base_delay_ticks: u64,
    variation_ticks: u64,
    loss_ratio: f64,
    rng: StdRng,
    // (release tick, arrival order, frame)
    in_flight: BinaryHeap<Reverse<(u64, u64, Vec<u8>)>>,
    arrivals: u64,
    dropped: u64,
}

impl DelayLine {
    pub fn new(base_delay_ticks: u64, variation_ticks: u64, loss_percent: f64, seed: u64) -> Self {
        Self {
            base_delay_ticks,
            variation_ticks,
            loss_ratio: (loss_percent / 100.0).clamp(0.0, 1.0),
            rng: StdRng::seed_from_u64(seed),
            in_flight: BinaryHeap::new(),
            arrivals: 0,
            dropped: 0,
        }
    }

    /// Accepts a frame sent at `now`.
    pub fn transmit(&mut self, frame: &[u8], now: u64) {
        if self.loss_ratio > 0.0 && self.rng.gen_bool(self.loss_ratio) {
            self.dropped += 1;
            trace!(now, "Frame dropped by device under test");
            return;
        }

        let extra = if self.variation_ticks > 0 {
            self.rng.gen_range(0..=self.variation_ticks)
        } else {
            0
        };
        let release = now + self.base_delay_ticks + extra;
        self.in_flight.push(Reverse((release, self.arrivals, frame.to_vec())));
        self.arrivals += 1;
    }

    /// Returns the next frame due at or before `now`.
    pub fn poll(&mut self, now: u64) -> Option<Vec<u8>> {
        match self.in_flight.peek() {
            Some(Reverse((release, _, _))) if *release <= now => {
                self.in_flight.pop().map(|Reverse((_, _, frame))| frame)
            }
            _ => None,
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}
