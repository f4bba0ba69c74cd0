//! Host-facing sinks
//!
//! The generator never renders or spawns anything itself. Completed
//! placements are handed to an [`InstanceSink`] (instanced meshes) or a
//! [`SpawnSink`] (standalone objects). [`MemorySink`] implements both and
//! keeps everything in vectors, for tests, previews and the demo binary.

use serde::{Deserialize, Serialize};

use crate::arena::config::{AssetKind, MeshGroupConfig, PlacementTransform};

/// Opaque handle to an instancing bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BucketHandle(pub u32);

/// Opaque handle to a spawned object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectHandle(pub u64);

/// An instance as the renderer holds it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InstanceRecord {
    pub bucket: BucketHandle,
    pub mesh_index: usize,
    /// Generator-local transform
    pub transform: PlacementTransform,
}

/// What a spawn request asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpawnKind {
    /// A class from an actor group
    Actor { group: usize, class_index: usize },
    /// A standalone copy of a group mesh (bake)
    StaticMesh { group: usize, mesh_index: usize },
}

pub trait InstanceSink {
    /// Create a bucket for a mesh group; `None` if the host cannot provide one
    fn register_group(&mut self, group: usize, config: &MeshGroupConfig) -> Option<BucketHandle>;

    /// Add one instance; `false` if the bucket is unknown
    fn add_instance(&mut self, bucket: BucketHandle, mesh_index: usize, transform: &PlacementTransform) -> bool;

    fn clear_all_instances(&mut self);

    /// Read back every live instance
    fn instances(&self) -> Vec<InstanceRecord>;
}

pub trait SpawnSink {
    fn spawn(&mut self, kind: SpawnKind, transform: &PlacementTransform) -> Option<ObjectHandle>;

    fn destroy(&mut self, handle: ObjectHandle);
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryBucket {
    pub group: usize,
    pub instances: Vec<(usize, PlacementTransform)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnedObject {
    pub handle: ObjectHandle,
    pub kind: SpawnKind,
    pub transform: PlacementTransform,
}

/// In-memory implementation of both sinks
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemorySink {
    pub buckets: Vec<MemoryBucket>,
    pub objects: Vec<SpawnedObject>,
    next_object: u64,
    /// Groups that refuse a bucket (simulates a host without the asset)
    #[serde(skip)]
    pub reject_groups: Vec<usize>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn instance_count(&self) -> usize {
        self.buckets.iter().map(|b| b.instances.len()).sum()
    }

    /// Every placement in emission order per bucket, buckets in creation order
    pub fn placements(&self) -> Vec<PlacementTransform> {
        self.buckets
            .iter()
            .flat_map(|b| b.instances.iter().map(|(_, t)| *t))
            .collect()
    }

    pub fn objects_of(&self, kind: AssetKind) -> impl Iterator<Item = &SpawnedObject> {
        self.objects.iter().filter(move |o| {
            matches!(
                (o.kind, kind),
                (SpawnKind::Actor { .. }, AssetKind::Actors) | (SpawnKind::StaticMesh { .. }, AssetKind::StaticMeshes)
            )
        })
    }
}

impl InstanceSink for MemorySink {
    fn register_group(&mut self, group: usize, _config: &MeshGroupConfig) -> Option<BucketHandle> {
        if self.reject_groups.contains(&group) {
            return None;
        }
        self.buckets.push(MemoryBucket {
            group,
            instances: Vec::new(),
        });
        Some(BucketHandle((self.buckets.len() - 1) as u32))
    }

    fn add_instance(&mut self, bucket: BucketHandle, mesh_index: usize, transform: &PlacementTransform) -> bool {
        match self.buckets.get_mut(bucket.0 as usize) {
            Some(b) => {
                b.instances.push((mesh_index, *transform));
                true
            }
            None => false,
        }
    }

    fn clear_all_instances(&mut self) {
        self.buckets.clear();
    }

    fn instances(&self) -> Vec<InstanceRecord> {
        self.buckets
            .iter()
            .enumerate()
            .flat_map(|(i, b)| {
                b.instances.iter().map(move |(mesh_index, transform)| InstanceRecord {
                    bucket: BucketHandle(i as u32),
                    mesh_index: *mesh_index,
                    transform: *transform,
                })
            })
            .collect()
    }
}

impl SpawnSink for MemorySink {
    fn spawn(&mut self, kind: SpawnKind, transform: &PlacementTransform) -> Option<ObjectHandle> {
        let handle = ObjectHandle(self.next_object);
        self.next_object += 1;
        self.objects.push(SpawnedObject {
            handle,
            kind,
            transform: *transform,
        });
        Some(handle)
    }

    fn destroy(&mut self, handle: ObjectHandle) {
        self.objects.retain(|o| o.handle != handle);
    }
}
