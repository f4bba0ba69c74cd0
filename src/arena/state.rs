//! Session state threaded through a generation pass
//!
//! Sections build on top of each other: the running origin offset carries
//! stacked height, the previous section's mesh size decides whether counts are
//! re-derived, and mesh groups keep one instancing bucket for the whole pass.

use glam::Vec3;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::sink::{BucketHandle, ObjectHandle};

/// Seed wrapper; a pass always restarts its stream from here
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn to_rng(&self) -> Pcg32 {
        Pcg32::seed_from_u64(self.seed)
    }
}

/// Mesh groups seen this pass, in first-use order, with their bucket
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UsedGroups {
    entries: Vec<(usize, Option<BucketHandle>)>,
}

impl UsedGroups {
    /// Slot of a group already registered this pass
    pub fn reroute_index(&self, group: usize) -> Option<usize> {
        self.entries.iter().position(|(g, _)| *g == group)
    }

    /// Record a group's bucket (or the lack of one); returns its slot
    pub fn insert(&mut self, group: usize, bucket: Option<BucketHandle>) -> usize {
        if let Some(slot) = self.reroute_index(group) {
            return slot;
        }
        self.entries.push((group, bucket));
        self.entries.len() - 1
    }

    pub fn bucket(&self, slot: usize) -> Option<BucketHandle> {
        self.entries.get(slot).and_then(|(_, b)| *b)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn groups(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries.iter().map(|(g, _)| *g)
    }
}

/// Accumulating state of one generation pass
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// Section start; Z accumulates stacked height
    pub origin_offset: Vec3,
    pub previous_mesh_size: Option<Vec3>,
    pub previous_tiles_per_side: Option<u32>,
    pub previous_last_position: Option<Vec3>,
    pub used_groups: UsedGroups,
    pub total_instances: usize,
    /// Actors spawned this pass (destroyed on wipe)
    pub spawned_objects: Vec<ObjectHandle>,
    pub rng_state: RngState,
    pub rng: Pcg32,
}

impl BuildContext {
    pub fn new(seed: u64) -> Self {
        let rng_state = RngState::new(seed);
        Self {
            origin_offset: Vec3::ZERO,
            previous_mesh_size: None,
            previous_tiles_per_side: None,
            previous_last_position: None,
            used_groups: UsedGroups::default(),
            total_instances: 0,
            spawned_objects: Vec::new(),
            rng: rng_state.to_rng(),
            rng_state,
        }
    }

    /// Back to the start-of-pass state (same seed)
    pub fn reset(&mut self) {
        *self = Self::new(self.rng_state.seed);
    }

    /// `current.x / previous.x`, or 1 with no previous section
    pub fn mesh_scale_ratio(&self, current: Vec3) -> f32 {
        match self.previous_mesh_size {
            Some(prev) if prev.x != 0.0 => current.x / prev.x,
            _ => 1.0,
        }
    }
}
