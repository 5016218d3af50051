//! Weapon placement (end of the early phase, after aim).

use bevy::prelude::*;

use crate::aim::AimState;
use crate::weapon::{OwnerFacing, WeaponMount, WeaponOwner};

/// System: weapon transform follows its owner and its aim.
pub fn sync_weapon_mounts(
    mut weapons: Query<(&WeaponMount, &WeaponOwner, &mut Transform, Option<&AimState>)>,
    owners: Query<(&Transform, Option<&OwnerFacing>), Without<WeaponMount>>,
) {
    for (mount, owner, mut transform, aim) in weapons.iter_mut() {
        let Ok((owner_transform, facing)) = owners.get(owner.0) else {
            continue;
        };
        let facing = facing.copied().unwrap_or_default();

        transform.translation =
            mount.world_position(owner_transform.translation, facing.flipped, facing.yaw);
        if let Some(aim) = aim {
            transform.rotation = aim.current_rotation;
        }
    }
}
