//! Generic per-channel diagnostic container holding both the unsmoothed and
//! smoothed value of every numeric quantity an exercise analyzer computes,
//! exposed on every analysis result for callers who want the raw signal
//! alongside the smoothed one.

use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawAngleSample {
    pub raw: f32,
    pub smoothed: f32,
}

#[derive(Debug, Clone)]
pub struct RawAngles<C: Eq + Hash> {
    samples: HashMap<C, RawAngleSample>,
}

impl<C: Eq + Hash> Default for RawAngles<C> {
    fn default() -> Self {
        Self {
            samples: HashMap::new(),
        }
    }
}

impl<C: Eq + Hash + Copy> RawAngles<C> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, channel: C, raw: f32, smoothed: f32) {
        self.samples.insert(channel, RawAngleSample { raw, smoothed });
    }

    #[must_use]
    pub fn get(&self, channel: &C) -> Option<RawAngleSample> {
        self.samples.get(channel).copied()
    }

    #[must_use]
    pub fn iter(&self) -> impl Iterator<Item = (&C, &RawAngleSample)> {
        self.samples.iter()
    }
}
