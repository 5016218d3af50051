//! Aim module: per-weapon aim direction from owner input.
//!
//! Weapons carry `AimDirector` + `AimState`; owners carry `AimInput` and
//! `OwnerFacing`. The aim system runs in the early phase so the late-phase
//! weapon tick fires along this tick's aim.

use bevy::prelude::*;

use crate::context::SimContext;
use crate::weapon::{OwnerFacing, WeaponOwner};

pub mod director;


pub use director::{
    relative_angle, snap_angle, world_rotation, wrap_degrees, AimConfig, AimDirector, AimInput,
    AimSource, AimState, AimVariant, PointerRay, RotationMode,
};

/// System: update every weapon's aim from its owner's input.
pub fn update_aim(
    mut weapons: Query<(&AimDirector, &mut AimState, &Transform, Option<&WeaponOwner>)>,
    owners: Query<(Option<&AimInput>, Option<&OwnerFacing>, &Transform)>,
    ctx: Res<SimContext>,
) {
    for (director, mut state, transform, owner) in weapons.iter_mut() {
        let owner_data = owner.and_then(|owner| owners.get(owner.0).ok());

        let (input, facing, origin) = match owner_data {
            Some((input, facing, owner_transform)) => (
                input.copied().unwrap_or_default(),
                facing.copied().unwrap_or_default(),
                owner_transform.translation,
            ),
            None => (AimInput::default(), OwnerFacing::default(), transform.translation),
        };

        state.update(director, &input, facing, origin, ctx.delta);
    }
}
