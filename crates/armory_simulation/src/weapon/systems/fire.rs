//! Weapon evaluation (late phase).
//!
//! Порядок за тик:
//! 1. Queued commands (an interrupt lands before anything due this tick)
//! 2. Due suspended tasks resume (resume time, then scheduling order)
//! 3. One state case per weapon
//! 4. Effects → events / scheduler / despawn
//!
//! Weapons are processed in entity order so ammo pools shared between
//! weapons are paid deterministically.

use std::collections::BTreeMap;

use bevy::prelude::*;
use rand::Rng;

use crate::aim::AimState;
use crate::ammo::{AmmoAccess, AmmoLedger, AmmoPools, WeaponAmmo};
use crate::context::SimContext;
use crate::logger;
use crate::weapon::{
    DamageAreaToggled, ProjectileEmitter, ProjectileSpawnRequest, RecoilApplied, TaskScheduler,
    WeaponConfig, WeaponEffect, WeaponEventKind, WeaponKind, WeaponNotification, WeaponOwner,
    WeaponStateMachine, WeaponTask,
};
use crate::DeterministicRng;

/// System: run due tasks and tick every weapon state machine.
#[allow(clippy::too_many_arguments, clippy::type_complexity)]
pub fn process_weapons(
    mut weapons: Query<(
        Entity,
        &WeaponConfig,
        &mut WeaponStateMachine,
        Option<&mut WeaponAmmo>,
        Option<&WeaponOwner>,
        Option<&ProjectileEmitter>,
        Option<&AimState>,
        &Transform,
    )>,
    mut pools: ResMut<AmmoPools>,
    mut scheduler: ResMut<TaskScheduler>,
    mut rng: ResMut<DeterministicRng>,
    ctx: Res<SimContext>,
    mut commands: Commands,
    mut notifications: EventWriter<WeaponNotification>,
    mut spawns: EventWriter<ProjectileSpawnRequest>,
    mut recoils: EventWriter<RecoilApplied>,
    mut damage_areas: EventWriter<DamageAreaToggled>,
) {
    let now = ctx.now();

    let mut due: BTreeMap<Entity, Vec<WeaponTask>> = BTreeMap::new();
    for scheduled in scheduler.drain_due(now) {
        due.entry(scheduled.weapon).or_default().push(scheduled.task);
    }

    let mut order: Vec<Entity> = weapons.iter().map(|(entity, ..)| entity).collect();
    order.sort();

    let mut effects = Vec::new();
    for weapon in order {
        let Ok((_, config, mut machine, mut ammo, owner, emitter, aim, transform)) =
            weapons.get_mut(weapon)
        else {
            continue;
        };

        effects.clear();
        {
            let mut access = match ammo.as_deref_mut() {
                Some(ammo) => AmmoAccess::Ledger(AmmoLedger::new(ammo, &mut pools)),
                None => AmmoAccess::Unlimited,
            };

            machine.apply_commands(config, &ctx, &mut access, &mut effects);
            for task in due.remove(&weapon).unwrap_or_default() {
                machine.resume(task, config, &ctx, &mut access, &mut effects);
            }
            machine.evaluate(config, &ctx, &mut access, &mut effects);
        }

        if effects.is_empty() {
            continue;
        }

        let owner = owner.map(|owner| owner.0);
        let state = machine.state;

        for effect in effects.iter().copied() {
            match effect {
                WeaponEffect::Notify(kind) => {
                    if matches!(
                        kind,
                        WeaponEventKind::MeleeWindowOpened | WeaponEventKind::MeleeWindowClosed
                    ) {
                        damage_areas.write(DamageAreaToggled {
                            weapon,
                            owner,
                            enabled: kind == WeaponEventKind::MeleeWindowOpened,
                        });
                    }
                    notifications.write(WeaponNotification {
                        weapon,
                        owner,
                        kind,
                        state,
                    });
                }

                WeaponEffect::Fire => {
                    let direction = aim
                        .map(AimState::fire_direction)
                        .filter(|direction| *direction != Vec3::ZERO)
                        .unwrap_or_else(|| transform.rotation * Vec3::X);

                    if config.kind == WeaponKind::Projectile && emitter.is_none() {
                        logger::log_warning(&format!(
                            "Weapon {:?} ({}) fired without ProjectileEmitter, nothing spawned",
                            weapon, config.name
                        ));
                    }

                    if let Some(emitter) = emitter.filter(|_| config.kind == WeaponKind::Projectile) {
                        let axis = aim
                            .map(|aim| aim.variant.spread_axis())
                            .unwrap_or(Vec3::Z);
                        let position = emitter.spawn_position(transform.translation, transform.rotation);
                        for _ in 0..emitter.projectiles_per_shot {
                            spawns.write(ProjectileSpawnRequest {
                                weapon,
                                owner,
                                position,
                                direction: spread_direction(
                                    direction,
                                    axis,
                                    emitter.spread_degrees,
                                    &mut rng,
                                ),
                            });
                        }
                    }

                    if let Some(owner) = owner.filter(|_| config.recoil_force > 0.0) {
                        recoils.write(RecoilApplied {
                            owner,
                            weapon,
                            force: -direction * config.recoil_force,
                        });
                    }

                    logger::log(&format!("🔫 {} ({:?}) fired at t={:.3}", config.name, weapon, now));
                }

                WeaponEffect::Schedule { delay, task } => {
                    scheduler.schedule(weapon, now + delay, task);
                }

                WeaponEffect::CancelTasks => {
                    scheduler.cancel_interruptible(weapon);
                }

                WeaponEffect::Despawn => {
                    scheduler.cancel_all(weapon);
                    commands.entity(weapon).try_despawn();
                    logger::log_info(&format!("💥 {} ({:?}) destroyed", config.name, weapon));
                }
            }
        }
    }
}

/// Fire direction rotated by a random angle in `[-spread, spread]` degrees.
pub fn spread_direction(
    direction: Vec3,
    axis: Vec3,
    spread_degrees: f32,
    rng: &mut DeterministicRng,
) -> Vec3 {
    if spread_degrees <= 0.0 {
        return direction;
    }

    let angle = rng.rng.gen_range(-spread_degrees..=spread_degrees);
    (Quat::from_axis_angle(axis, angle.to_radians()) * direction).normalize_or_zero()
}
