//! Spatial query provider for target acquisition.
//!
//! `SpatialQuery` is the seam to whatever physics backend the host runs.
//! The crate ships `WorldSpatialIndex`: a snapshot of `Targetable` and
//! `Occluder` entities with brute-force distance and segment/sphere tests
//! (no physics engine in the headless simulation).

use bevy::prelude::*;

/// Marks an entity auto-aim may lock onto.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Reflect)]
#[reflect(Component)]
pub struct Targetable {
    /// Bit mask matched against `TargetFilter::layers`
    pub layers: u32,
}

impl Default for Targetable {
    fn default() -> Self {
        Self { layers: 1 }
    }
}

/// Sphere blocking line of sight.
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct Occluder {
    pub radius: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TargetFilter {
    pub layers: u32,
    /// Never returned (the scanning weapon, its owner)
    pub exclude: Vec<Entity>,
}

impl TargetFilter {
    pub fn accepts(&self, entity: Entity, layers: u32) -> bool {
        self.layers & layers != 0 && !self.exclude.contains(&entity)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetCandidate {
    pub entity: Entity,
    pub position: Vec3,
    pub distance: f32,
}

pub trait SpatialQuery {
    /// Candidates within `radius` of `origin`, nearest first (ties by entity).
    fn candidates(&self, origin: Vec3, radius: f32, filter: &TargetFilter) -> Vec<TargetCandidate>;

    /// Line of sight from `from` to `to` is blocked.
    fn is_obstructed(&self, from: Vec3, to: Vec3) -> bool;
}

#[derive(Debug, Clone, Default)]
pub struct WorldSpatialIndex {
    targets: Vec<(Entity, Vec3, u32)>,
    occluders: Vec<(Vec3, f32)>,
}

impl WorldSpatialIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_target(&mut self, entity: Entity, position: Vec3, layers: u32) {
        self.targets.push((entity, position, layers));
    }

    pub fn add_occluder(&mut self, center: Vec3, radius: f32) {
        self.occluders.push((center, radius));
    }

    pub fn target_position(&self, entity: Entity) -> Option<Vec3> {
        self.targets
            .iter()
            .find(|(target, _, _)| *target == entity)
            .map(|(_, position, _)| *position)
    }
}

impl SpatialQuery for WorldSpatialIndex {
    fn candidates(&self, origin: Vec3, radius: f32, filter: &TargetFilter) -> Vec<TargetCandidate> {
        let mut candidates: Vec<TargetCandidate> = self
            .targets
            .iter()
            .filter(|(entity, _, layers)| filter.accepts(*entity, *layers))
            .map(|(entity, position, _)| TargetCandidate {
                entity: *entity,
                position: *position,
                distance: origin.distance(*position),
            })
            .filter(|candidate| candidate.distance <= radius)
            .collect();

        candidates.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then(a.entity.cmp(&b.entity))
        });
        candidates
    }

    fn is_obstructed(&self, from: Vec3, to: Vec3) -> bool {
        self.occluders
            .iter()
            .any(|(center, radius)| segment_hits_sphere(from, to, *center, *radius))
    }
}

/// Segment/sphere intersection. A sphere containing either endpoint does
/// not block (the shooter or the target stands inside it).
pub fn segment_hits_sphere(from: Vec3, to: Vec3, center: Vec3, radius: f32) -> bool {
    let radius_sq = radius * radius;
    if from.distance_squared(center) <= radius_sq || to.distance_squared(center) <= radius_sq {
        return false;
    }

    let segment = to - from;
    let length_sq = segment.length_squared();
    if length_sq <= f32::EPSILON {
        return false;
    }

    let t = ((center - from).dot(segment) / length_sq).clamp(0.0, 1.0);
    let closest = from + segment * t;
    closest.distance_squared(center) < radius_sq
}
