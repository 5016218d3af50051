//! Weapon lifecycle: equip → (re-equip) → unequip.

use bevy::prelude::*;

use crate::ammo::{AmmoLedger, AmmoPools, WeaponAmmo};
use crate::logger;
use crate::weapon::{
    EquipWeapon, ReequipWeapon, TaskScheduler, UnequipWeapon, WeaponConfig, WeaponEventKind,
    WeaponNotification, WeaponOwner, WeaponStateMachine,
};

/// System: spawn weapon entities for `EquipWeapon` (early phase).
pub fn equip_weapons(mut commands: Commands, mut events: EventReader<EquipWeapon>) {
    for equip in events.read() {
        let mut weapon = commands.spawn((
            equip.config.clone(),
            WeaponOwner(equip.owner),
            equip.mount,
        ));
        if let Some(ammo) = &equip.ammo {
            weapon.insert(ammo.clone());
        }
        if let Some(emitter) = equip.emitter {
            weapon.insert(emitter);
        }

        logger::log(&format!(
            "✅ Equipped {} on {:?} → {:?}",
            equip.config.name,
            equip.owner,
            weapon.id()
        ));
    }
}

/// System: unequip = loaded rounds back to the pool, then despawn.
pub fn unequip_weapons(
    mut events: EventReader<UnequipWeapon>,
    mut weapons: Query<(
        &WeaponConfig,
        &WeaponStateMachine,
        Option<&mut WeaponAmmo>,
        Option<&WeaponOwner>,
    )>,
    mut pools: ResMut<AmmoPools>,
    mut scheduler: ResMut<TaskScheduler>,
    mut commands: Commands,
    mut notifications: EventWriter<WeaponNotification>,
) {
    let mut handled: Vec<Entity> = Vec::new();

    for event in events.read() {
        if handled.contains(&event.weapon) {
            continue;
        }
        let Ok((config, machine, ammo, owner)) = weapons.get_mut(event.weapon) else {
            logger::log_warning(&format!("UnequipWeapon: {:?} is not a weapon", event.weapon));
            continue;
        };

        let returned = match ammo {
            Some(mut ammo) => AmmoLedger::new(&mut ammo, &mut pools).empty(),
            None => 0,
        };

        notifications.write(WeaponNotification {
            weapon: event.weapon,
            owner: owner.map(|owner| owner.0),
            kind: WeaponEventKind::Unequipped,
            state: machine.state,
        });

        scheduler.cancel_all(event.weapon);
        commands.entity(event.weapon).try_despawn();
        handled.push(event.weapon);

        logger::log(&format!(
            "Unequipped {} ({:?}), {} rounds returned",
            config.name, event.weapon, returned
        ));
    }
}

/// System: re-equip resets the state machine to `Idle`.
pub fn reequip_weapons(
    mut events: EventReader<ReequipWeapon>,
    mut weapons: Query<(&mut WeaponStateMachine, Option<&WeaponOwner>)>,
    mut scheduler: ResMut<TaskScheduler>,
    mut notifications: EventWriter<WeaponNotification>,
) {
    for event in events.read() {
        let Ok((mut machine, owner)) = weapons.get_mut(event.weapon) else {
            logger::log_warning(&format!("ReequipWeapon: {:?} is not a weapon", event.weapon));
            continue;
        };

        scheduler.cancel_all(event.weapon);
        machine.reinitialize();

        notifications.write(WeaponNotification {
            weapon: event.weapon,
            owner: owner.map(|owner| owner.0),
            kind: WeaponEventKind::Reinitialized,
            state: machine.state,
        });
    }
}
