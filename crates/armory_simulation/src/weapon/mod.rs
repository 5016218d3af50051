//! Weapon module: state machine, suspended tasks, weapon systems.
//!
//! ECS ответственность:
//! - `WeaponConfig` + `WeaponStateMachine` + optional `WeaponAmmo` per weapon entity
//! - `TaskScheduler` resource for burst sub-shots, melee windows, delayed destroy
//! - Events out: notifications, spawn requests, recoil, melee damage windows
//!
//! Projectile spawning, VFX and audio live outside (they consume events).

pub mod components;
pub mod events;
pub mod systems;
pub mod tasks;

pub use components::*;
pub use events::{
    CommandSource, DamageAreaToggled, EquipWeapon, ProjectileSpawnRequest, RecoilApplied,
    ReequipWeapon, RejectReason, UnequipWeapon, WeaponAction, WeaponCommand, WeaponEventKind,
    WeaponNotification,
};
pub use systems::*;
pub use tasks::{ScheduledTask, TaskScheduler, WeaponTask, TIME_EPSILON};
