//! ARMORY Simulation Core
//!
//! ECS-симуляция оружия на Bevy 0.16 (headless): weapon state machines,
//! charge/combo sequencers, ammo, auto-aim and aim direction.
//!
//! Tick (FixedUpdate):
//! - `advance_sim_context`: governing clock (frozen while paused)
//! - `ArmorySet::Early`: equip, command routing, target scans, aim, mounts
//! - `ArmorySet::Late`: charge sequencers, weapons (+ due tasks), combos,
//!   re-equip/unequip
//!
//! Rendering, audio, VFX and projectile flight live outside and talk to the
//! simulation through events only.

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

pub mod aim;
pub mod ammo;
pub mod charge;
pub mod combo;
pub mod context;
pub mod logger;
pub mod targeting;
pub mod weapon;

// Re-export основных типов
pub use aim::{AimConfig, AimDirector, AimInput, AimSource, AimState, AimVariant, RotationMode};
pub use ammo::{AmmoId, AmmoPools, AmmoReserve, Magazine, WeaponAmmo};
pub use charge::{ChargeEvent, ChargeEventKind, ChargeSequencer, ChargeStep};
pub use combo::{ComboEvent, ComboEventKind, ComboSequencer};
pub use context::{ClockMode, SimContext};
pub use logger::init_logger;
pub use targeting::{AutoAim, AutoAimConfig, Occluder, TargetChange, TargetEvent, Targetable};
pub use weapon::{
    CommandSource, DamageAreaToggled, EquipWeapon, MovementState, OwnerFacing,
    ProjectileEmitter, ProjectileSpawnRequest, RecoilApplied, ReequipWeapon, RejectReason,
    TaskScheduler, TriggerMode, UnequipWeapon, WeaponAction, WeaponCommand, WeaponConfig,
    WeaponEventKind, WeaponKind, WeaponMount, WeaponNotification, WeaponOwner, WeaponState,
    WeaponStateMachine,
};

/// Tick phases inside `FixedUpdate` (chained, skipped while paused).
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArmorySet {
    Early,
    Late,
}

/// Simulation settings, read once by `ArmoryPlugin`.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArmoryConfig {
    pub tick_hz: f32,
    pub seed: u64,
}

impl Default for ArmoryConfig {
    fn default() -> Self {
        Self {
            // 60Hz: легче считать интервалы
            tick_hz: 60.0,
            seed: 42,
        }
    }
}

/// Главный plugin симуляции оружия
///
/// Insert `ArmoryConfig` before adding the plugin to override tick rate/seed.
pub struct ArmoryPlugin;

impl Plugin for ArmoryPlugin {
    fn build(&self, app: &mut App) {
        let config = app
            .world()
            .get_resource::<ArmoryConfig>()
            .copied()
            .unwrap_or_default();

        app.insert_resource(config)
            .insert_resource(Time::<Fixed>::from_hz(config.tick_hz as f64))
            .insert_resource(context::SimContext::from_hz(config.tick_hz))
            .insert_resource(DeterministicRng::new(config.seed))
            .init_resource::<AmmoPools>()
            .init_resource::<TaskScheduler>();

        // Регистрация событий
        app.add_event::<WeaponCommand>()
            .add_event::<WeaponNotification>()
            .add_event::<ProjectileSpawnRequest>()
            .add_event::<RecoilApplied>()
            .add_event::<DamageAreaToggled>()
            .add_event::<EquipWeapon>()
            .add_event::<UnequipWeapon>()
            .add_event::<ReequipWeapon>()
            .add_event::<ChargeEvent>()
            .add_event::<ComboEvent>()
            .add_event::<TargetEvent>();

        app.configure_sets(
            FixedUpdate,
            (ArmorySet::Early, ArmorySet::Late)
                .chain()
                .run_if(context::simulation_running),
        );

        app.add_systems(
            FixedUpdate,
            context::advance_sim_context.before(ArmorySet::Early),
        );

        app.add_systems(
            FixedUpdate,
            (
                // Фаза 1: новые оружия + активный член combo
                weapon::equip_weapons,
                combo::sync_combo_activation,
                // Фаза 2: команды → state machines / sequencers
                weapon::route_weapon_commands,
                // Фаза 3: auto-aim → aim → позиция оружия
                targeting::scan_targets,
                targeting::feed_auto_aim,
                aim::update_aim,
                weapon::sync_weapon_mounts,
            )
                .chain()
                .in_set(ArmorySet::Early),
        );

        app.add_systems(
            FixedUpdate,
            (
                charge::update_charge_sequencers,
                weapon::process_weapons,
                combo::update_combo_sequencers,
                weapon::reequip_weapons,
                weapon::unequip_weapons,
            )
                .chain()
                .in_set(ArmorySet::Late),
        );
    }
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт minimal Bevy App для headless симуляции
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(ArmoryConfig {
            seed,
            ..ArmoryConfig::default()
        })
        .add_plugins(ArmoryPlugin);

    app
}

/// Snapshot мира для сравнения детерминизма
pub fn world_snapshot<T>(world: &mut World) -> Vec<u8>
where
    T: Component + std::fmt::Debug,
{
    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    // Сортируем по Entity для детерминизма
    entities.sort_by_key(|(entity, _)| *entity);

    let mut snapshot = Vec::new();
    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.to_bits().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
