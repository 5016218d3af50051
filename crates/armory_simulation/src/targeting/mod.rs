//! Target acquisition (auto-aim).
//!
//! Early phase, before aim:
//! 1. `scan_targets`: held targets follow their entity, due scanners rescan
//! 2. `feed_auto_aim`: a held target overrides the weapon's aim

use bevy::prelude::*;

use crate::aim::AimState;
use crate::context::SimContext;
use crate::logger;
use crate::weapon::{MovementState, WeaponOwner};

pub mod auto_aim;
pub mod spatial;


pub use auto_aim::{AcquiredTarget, AutoAim, AutoAimConfig, TargetChange};
pub use spatial::{
    segment_hits_sphere, Occluder, SpatialQuery, TargetCandidate, TargetFilter, Targetable,
    WorldSpatialIndex,
};

/// Event: auto-aim target changed (exactly one per change).
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct TargetEvent {
    pub scanner: Entity,
    pub owner: Option<Entity>,
    pub change: TargetChange,
}

/// Snapshot of every targetable and occluder.
pub fn build_spatial_index(
    targetables: &Query<(Entity, &Transform, &Targetable)>,
    occluders: &Query<(&Transform, &Occluder)>,
) -> WorldSpatialIndex {
    let mut index = WorldSpatialIndex::new();
    for (entity, transform, targetable) in targetables.iter() {
        index.add_target(entity, transform.translation, targetable.layers);
    }
    for (transform, occluder) in occluders.iter() {
        index.add_occluder(transform.translation, occluder.radius);
    }
    index
}

/// System: follow held targets, rescan when the interval elapses.
pub fn scan_targets(
    mut scanners: Query<(Entity, &mut AutoAim, &Transform, Option<&WeaponOwner>)>,
    owners: Query<(&Transform, Option<&MovementState>)>,
    targetables: Query<(Entity, &Transform, &Targetable)>,
    occluders: Query<(&Transform, &Occluder)>,
    ctx: Res<SimContext>,
    mut events: EventWriter<TargetEvent>,
) {
    if scanners.is_empty() {
        return;
    }

    let index = build_spatial_index(&targetables, &occluders);

    let mut order: Vec<Entity> = scanners.iter().map(|(entity, ..)| entity).collect();
    order.sort();

    for scanner in order {
        let Ok((_, mut auto_aim, transform, owner)) = scanners.get_mut(scanner) else {
            continue;
        };

        let owner = owner.map(|owner| owner.0);
        let owner_data = owner.and_then(|owner| owners.get(owner).ok());
        let (base, idle) = match owner_data {
            Some((owner_transform, movement)) => (
                owner_transform.translation,
                movement.is_none_or(|movement| movement.is_idle()),
            ),
            None => (transform.translation, true),
        };

        let held = auto_aim.target_entity();
        let followed = held.and_then(|entity| auto_aim.follow(index.target_position(entity)));
        if let Some(change) = followed {
            logger::log(&format!("🎯 Scanner {:?}: target {:?} vanished", scanner, held));
            events.write(TargetEvent { scanner, owner, change });
        }

        if !auto_aim.tick_timer(ctx.delta) {
            continue;
        }

        let mut exclude = vec![scanner];
        exclude.extend(owner);
        let filter = TargetFilter {
            layers: auto_aim.config.layers,
            exclude,
        };

        let origin = base + auto_aim.config.detection_offset;
        if let Some(change) =
            auto_aim.scan_from(origin, transform.translation, idle, &filter, &index)
        {
            logger::log(&format!("🎯 Scanner {:?}: {:?}", scanner, change));
            events.write(TargetEvent { scanner, owner, change });
        }
    }
}

/// System: held target → script aim override (cleared when the target is lost).
pub fn feed_auto_aim(
    mut weapons: Query<(&AutoAim, &mut AimState, &Transform, Option<&WeaponOwner>)>,
    owners: Query<&Transform>,
) {
    for (auto_aim, mut aim, transform, owner) in weapons.iter_mut() {
        let origin = owner
            .and_then(|owner| owners.get(owner.0).ok())
            .map(|owner_transform| owner_transform.translation)
            .unwrap_or(transform.translation);

        let override_aim = auto_aim
            .target
            .map(|target| target.position - origin)
            .filter(|direction| direction.length_squared() > 1e-8);

        if aim.script_override != override_aim {
            aim.script_override = override_aim;
        }
    }
}
