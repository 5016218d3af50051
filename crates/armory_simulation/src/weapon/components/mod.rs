//! Weapon components.

pub mod config;
pub mod mount;
pub mod owner;
pub mod state;


pub use config::{BurstConfig, TriggerMode, WeaponConfig, WeaponKind};
pub use mount::{ProjectileEmitter, WeaponMount};
pub use owner::{MovementState, OwnerFacing, WeaponOwner};
pub use state::{PendingCommand, WeaponEffect, WeaponState, WeaponStateMachine};
