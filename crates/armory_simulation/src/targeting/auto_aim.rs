//! Auto-aim: periodic nearest-visible-target scan for one weapon.
//!
//! Scan = candidates within radius, nearest first, first unobstructed
//! wins. Identity-stable: the held target is kept as long as it is still
//! the nearest unobstructed candidate.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::spatial::{SpatialQuery, TargetCandidate, TargetFilter};

#[derive(Debug, Clone, Copy, PartialEq, Reflect, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoAimConfig {
    pub scan_radius: f32,
    /// Seconds between scans
    pub scan_interval: f32,
    /// Moving owner keeps (or loses) its target but never picks a new one
    pub only_acquire_when_idle: bool,
    /// Detection origin relative to the owner
    pub detection_offset: Vec3,
    /// Line-of-sight probe origin relative to the detection origin
    pub probe_offset: Vec3,
    pub layers: u32,
}

impl Default for AutoAimConfig {
    fn default() -> Self {
        Self {
            scan_radius: 10.0,
            scan_interval: 0.2,
            only_acquire_when_idle: false,
            detection_offset: Vec3::ZERO,
            probe_offset: Vec3::ZERO,
            layers: u32::MAX,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct AcquiredTarget {
    pub entity: Entity,
    pub position: Vec3,
    pub unobstructed: bool,
}

impl From<&TargetCandidate> for AcquiredTarget {
    fn from(candidate: &TargetCandidate) -> Self {
        Self {
            entity: candidate.entity,
            position: candidate.position,
            unobstructed: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum TargetChange {
    Found(Entity),
    Lost(Entity),
    Switched { from: Entity, to: Entity },
}

impl TargetChange {
    pub fn between(previous: Option<Entity>, next: Option<Entity>) -> Option<Self> {
        match (previous, next) {
            (None, None) => None,
            (None, Some(to)) => Some(TargetChange::Found(to)),
            (Some(from), None) => Some(TargetChange::Lost(from)),
            (Some(from), Some(to)) if from != to => Some(TargetChange::Switched { from, to }),
            _ => None,
        }
    }
}

#[derive(Component, Debug, Clone, PartialEq, Reflect)]
#[reflect(Component)]
pub struct AutoAim {
    pub config: AutoAimConfig,
    /// Counts down to the next scan (first scan on the first tick)
    pub scan_timer: f32,
    pub target: Option<AcquiredTarget>,
}

impl AutoAim {
    pub fn new(config: AutoAimConfig) -> Self {
        Self {
            config,
            scan_timer: 0.0,
            target: None,
        }
    }

    pub fn target_entity(&self) -> Option<Entity> {
        self.target.map(|target| target.entity)
    }

    /// Counts the scan timer down. True when a scan is due this tick.
    pub fn tick_timer(&mut self, delta: f32) -> bool {
        self.scan_timer -= delta;
        if self.scan_timer > crate::weapon::tasks::TIME_EPSILON {
            return false;
        }
        self.scan_timer = self.config.scan_interval.max(0.0);
        true
    }

    /// One scan from the scanner's own position. Returns the change, if any.
    pub fn scan(
        &mut self,
        origin: Vec3,
        owner_idle: bool,
        filter: &TargetFilter,
        query: &impl SpatialQuery,
    ) -> Option<TargetChange> {
        self.scan_from(origin, origin, owner_idle, filter, query)
    }

    /// One scan: candidates gathered around `detection_origin`, ranked by
    /// distance to `scanner_position` (ties by entity).
    pub fn scan_from(
        &mut self,
        detection_origin: Vec3,
        scanner_position: Vec3,
        owner_idle: bool,
        filter: &TargetFilter,
        query: &impl SpatialQuery,
    ) -> Option<TargetChange> {
        let probe = detection_origin + self.config.probe_offset;
        let mut candidates = query.candidates(detection_origin, self.config.scan_radius, filter);
        for candidate in candidates.iter_mut() {
            candidate.distance = scanner_position.distance(candidate.position);
        }
        candidates.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then(a.entity.cmp(&b.entity))
        });
        let visible = |candidate: &&TargetCandidate| !query.is_obstructed(probe, candidate.position);

        let next = if owner_idle || !self.config.only_acquire_when_idle {
            candidates.iter().find(visible).map(AcquiredTarget::from)
        } else {
            let current = self.target_entity();
            candidates
                .iter()
                .filter(|candidate| Some(candidate.entity) == current)
                .find(visible)
                .map(AcquiredTarget::from)
        };

        let change = TargetChange::between(self.target_entity(), next.map(|target| target.entity));
        self.target = next;
        change
    }

    /// Held target moved (between scans) or vanished.
    pub fn follow(&mut self, position: Option<Vec3>) -> Option<TargetChange> {
        let target = self.target.as_mut()?;
        match position {
            Some(position) => {
                target.position = position;
                None
            }
            None => {
                let lost = target.entity;
                self.target = None;
                Some(TargetChange::Lost(lost))
            }
        }
    }
}
