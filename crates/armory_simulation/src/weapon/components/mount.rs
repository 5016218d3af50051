//! Weapon placement + projectile emission.

use bevy::prelude::*;

/// Offset of the weapon from its owner (owner space, X mirrored when the
/// owner is flipped). Applied every early tick.
#[derive(Component, Debug, Clone, Copy, PartialEq, Default, Reflect)]
#[reflect(Component)]
pub struct WeaponMount {
    pub offset: Vec3,
}

impl WeaponMount {
    pub fn new(offset: Vec3) -> Self {
        Self { offset }
    }

    /// World position of the weapon for a given owner placement.
    pub fn world_position(&self, owner_position: Vec3, flipped: bool, owner_yaw: f32) -> Vec3 {
        let mut offset = self.offset;
        if flipped {
            offset.x = -offset.x;
        }
        owner_position + Quat::from_rotation_y(owner_yaw) * offset
    }
}

/// Binds a projectile weapon to the external spawner.
///
/// Projectile weapon without an emitter = configuration error (warning,
/// shot consumed but nothing spawned).
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct ProjectileEmitter {
    /// Muzzle offset in weapon-rotation space
    pub spawn_offset: Vec3,
    pub projectiles_per_shot: u32,
    /// Random spread half-angle (degrees), drawn from `DeterministicRng`
    pub spread_degrees: f32,
}

impl Default for ProjectileEmitter {
    fn default() -> Self {
        Self {
            spawn_offset: Vec3::ZERO,
            projectiles_per_shot: 1,
            spread_degrees: 0.0,
        }
    }
}

impl ProjectileEmitter {
    pub fn with_spread(mut self, projectiles_per_shot: u32, spread_degrees: f32) -> Self {
        self.projectiles_per_shot = projectiles_per_shot;
        self.spread_degrees = spread_degrees;
        self
    }

    pub fn spawn_position(&self, weapon_position: Vec3, weapon_rotation: Quat) -> Vec3 {
        weapon_position + weapon_rotation * self.spawn_offset
    }
}
