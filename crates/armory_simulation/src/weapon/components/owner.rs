//! Owner-side components (the character holding weapons).
//!
//! Weapons reference their holder through `WeaponOwner(Entity)`: a plain
//! handle, never ownership. A despawned owner simply fails the lookup.

use bevy::prelude::*;

/// Non-owning handle from a weapon to the entity that holds it.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Reflect)]
#[reflect(Component)]
pub struct WeaponOwner(pub Entity);

/// Owner facing.
///
/// - `flipped`: planar characters mirror horizontally (facing -X)
/// - `yaw`: spatial characters rotate about +Y (radians, 0 = facing -Z)
#[derive(Component, Debug, Clone, Copy, PartialEq, Default, Reflect)]
#[reflect(Component)]
pub struct OwnerFacing {
    pub flipped: bool,
    pub yaw: f32,
}

impl OwnerFacing {
    pub fn right() -> Self {
        Self::default()
    }

    pub fn left() -> Self {
        Self {
            flipped: true,
            yaw: 0.0,
        }
    }

    pub fn yaw(yaw: f32) -> Self {
        Self { flipped: false, yaw }
    }

    /// +1 facing right, -1 flipped
    pub fn sign(&self) -> f32 {
        if self.flipped {
            -1.0
        } else {
            1.0
        }
    }
}

/// Movement state of the owner (auto-aim acquisition gate).
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
#[reflect(Component)]
pub enum MovementState {
    #[default]
    Idle,
    Moving,
    Airborne,
}

impl MovementState {
    pub fn is_idle(&self) -> bool {
        matches!(self, MovementState::Idle)
    }
}
