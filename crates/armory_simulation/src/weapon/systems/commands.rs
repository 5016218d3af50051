//! Command routing (early phase).
//!
//! `WeaponCommand::target` may be a weapon, a charge entity or a combo
//! group. Weapons queue the command for their next late tick; charge and
//! combo entities translate it for the weapons they own.

use bevy::prelude::*;

use crate::charge::ChargeSequencer;
use crate::combo::ComboSequencer;
use crate::logger;
use crate::weapon::{CommandSource, WeaponAction, WeaponCommand, WeaponStateMachine};

/// System: route input/AI commands to state machines and sequencers.
pub fn route_weapon_commands(
    mut commands_in: EventReader<WeaponCommand>,
    mut weapons: Query<&mut WeaponStateMachine>,
    combos: Query<&ComboSequencer>,
    mut charges: Query<&mut ChargeSequencer>,
) {
    for command in commands_in.read() {
        if let Ok(combo) = combos.get(command.target) {
            let Some(weapon) = combo.active_weapon() else {
                logger::log_warning(&format!("Combo {:?} has no weapons", command.target));
                continue;
            };
            queue(&mut weapons, weapon, command.action, command.source);
            continue;
        }

        if let Ok(mut charge) = charges.get_mut(command.target) {
            match command.action {
                WeaponAction::FireStart => charge.press(),
                WeaponAction::FireStop => charge.release(),
                WeaponAction::Interrupt => {
                    charge.cancel();
                    for weapon in charge.weapons() {
                        queue(&mut weapons, weapon, WeaponAction::Interrupt, command.source);
                    }
                }
                WeaponAction::Reload => {
                    for weapon in charge.weapons() {
                        queue(&mut weapons, weapon, WeaponAction::Reload, command.source);
                    }
                }
            }
            continue;
        }

        queue(&mut weapons, command.target, command.action, command.source);
    }
}

fn queue(
    weapons: &mut Query<&mut WeaponStateMachine>,
    weapon: Entity,
    action: WeaponAction,
    source: CommandSource,
) {
    let Ok(mut machine) = weapons.get_mut(weapon) else {
        logger::log_warning(&format!(
            "WeaponCommand {:?} for {:?}: not a weapon",
            action, weapon
        ));
        return;
    };
    machine.request(action, source);
}
