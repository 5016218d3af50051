//! Weapon events: commands in, notifications/requests out.
//!
//! Flow:
//! 1. Input source / AI → `WeaponCommand` (early phase routing)
//! 2. State machine (late phase) → `WeaponNotification` for every transition
//! 3. `Use` → `ProjectileSpawnRequest` / `DamageAreaToggled` / `RecoilApplied`
//!
//! Everything outbound is observational: feedback, audio, UI read these
//! events and never write back into weapon state.

use bevy::prelude::*;

use super::components::{ProjectileEmitter, WeaponConfig, WeaponMount, WeaponState};
use crate::ammo::WeaponAmmo;

/// Discrete input signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum WeaponAction {
    FireStart,
    FireStop,
    Reload,
    Interrupt,
}

/// Who issued the command.
///
/// `Input` is subject to `input_authorized` and the re-trigger interval;
/// `Authorized` (charge/combo sequencers, AI) bypasses both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum CommandSource {
    Input,
    Authorized,
}

/// Event: command for a weapon, a charge weapon or a combo group.
#[derive(Event, Debug, Clone, Copy)]
pub struct WeaponCommand {
    /// Weapon entity (or charge/combo entity: routed to the right weapon)
    pub target: Entity,
    pub action: WeaponAction,
    pub source: CommandSource,
}

impl WeaponCommand {
    pub fn input(target: Entity, action: WeaponAction) -> Self {
        Self {
            target,
            action,
            source: CommandSource::Input,
        }
    }

    pub fn authorized(target: Entity, action: WeaponAction) -> Self {
        Self {
            target,
            action,
            source: CommandSource::Authorized,
        }
    }
}

/// Why a fire request did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum RejectReason {
    InputNotAuthorized,
    Reloading,
    RetriggerTooSoon,
    Inactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum WeaponEventKind {
    Started,
    Fired,
    Stopped,
    ReloadNeeded,
    ReloadImpossible,
    ReloadStarted,
    ReloadStopped,
    Interrupted,
    Rejected(RejectReason),
    MeleeWindowOpened,
    MeleeWindowClosed,
    DestroyScheduled,
    Destroyed,
    Unequipped,
    Reinitialized,
}

/// Event: notification sink for weapon transitions.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct WeaponNotification {
    pub weapon: Entity,
    pub owner: Option<Entity>,
    pub kind: WeaponEventKind,
    /// State of the weapon at the end of the tick that emitted this
    pub state: WeaponState,
}

/// Event: a projectile should be spawned (external spawner consumes it).
#[derive(Event, Debug, Clone, Copy)]
pub struct ProjectileSpawnRequest {
    pub weapon: Entity,
    pub owner: Option<Entity>,
    pub position: Vec3,
    /// Normalized
    pub direction: Vec3,
}

/// Event: recoil impulse for the owner.
#[derive(Event, Debug, Clone, Copy)]
pub struct RecoilApplied {
    pub owner: Entity,
    pub weapon: Entity,
    pub force: Vec3,
}

/// Event: melee damage window opened/closed.
#[derive(Event, Debug, Clone, Copy)]
pub struct DamageAreaToggled {
    pub weapon: Entity,
    pub owner: Option<Entity>,
    pub enabled: bool,
}

/// Event: spawn a weapon entity held by `owner`.
#[derive(Event, Debug, Clone)]
pub struct EquipWeapon {
    pub owner: Entity,
    pub config: WeaponConfig,
    pub ammo: Option<WeaponAmmo>,
    pub mount: WeaponMount,
    pub emitter: Option<ProjectileEmitter>,
}

impl EquipWeapon {
    pub fn new(owner: Entity, config: WeaponConfig) -> Self {
        Self {
            owner,
            config,
            ammo: None,
            mount: WeaponMount::default(),
            emitter: None,
        }
    }

    pub fn with_ammo(mut self, ammo: WeaponAmmo) -> Self {
        self.ammo = Some(ammo);
        self
    }

    pub fn with_emitter(mut self, emitter: ProjectileEmitter) -> Self {
        self.emitter = Some(emitter);
        self
    }

    pub fn with_mount(mut self, mount: WeaponMount) -> Self {
        self.mount = mount;
        self
    }
}

/// Event: unequip → magazine returned to the pool, weapon despawned.
#[derive(Event, Debug, Clone, Copy)]
pub struct UnequipWeapon {
    pub weapon: Entity,
}

/// Event: weapon equipped again → state machine reset to `Idle`.
#[derive(Event, Debug, Clone, Copy)]
pub struct ReequipWeapon {
    pub weapon: Entity,
}
