//! Combo groups (ComboSequencer + systems).
//!
//! The group listens to `Started`/`Stopped` notifications of its members and
//! keeps exactly one member active. Commands addressed to the group entity
//! are routed to the active member.

use bevy::prelude::*;

use crate::context::SimContext;
use crate::weapon::{WeaponEventKind, WeaponNotification, WeaponStateMachine};

pub mod sequencer;


pub use sequencer::ComboSequencer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum ComboEventKind {
    Advanced { index: usize },
    Dropped,
}

/// Event: combo index changed.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct ComboEvent {
    pub combo: Entity,
    pub kind: ComboEventKind,
}

/// System: activate the current member, deactivate the rest.
pub fn sync_combo_activation(
    combos: Query<&ComboSequencer>,
    mut weapons: Query<&mut WeaponStateMachine>,
) {
    for combo in combos.iter() {
        apply_activation(combo, &mut weapons);
    }
}

/// System: advance/drop combos from this tick's weapon notifications.
pub fn update_combo_sequencers(
    mut combos: Query<(Entity, &mut ComboSequencer)>,
    mut notifications: EventReader<WeaponNotification>,
    mut weapons: Query<&mut WeaponStateMachine>,
    ctx: Res<SimContext>,
    mut events: EventWriter<ComboEvent>,
) {
    let notifications: Vec<WeaponNotification> = notifications.read().copied().collect();

    for (combo_entity, mut combo) in combos.iter_mut() {
        // Countdown armed this tick starts counting on the next one
        let mut armed = false;
        for notification in notifications.iter() {
            if !combo.contains(notification.weapon) {
                continue;
            }
            match notification.kind {
                WeaponEventKind::Started => combo.on_weapon_started(notification.weapon),
                WeaponEventKind::Stopped => {
                    if let Some(index) = combo.on_weapon_stopped(notification.weapon) {
                        armed = combo.countdown.is_some();
                        events.write(ComboEvent {
                            combo: combo_entity,
                            kind: ComboEventKind::Advanced { index },
                        });
                    }
                }
                _ => {}
            }
        }

        if !armed && combo.tick(ctx.delta) {
            crate::logger::log(&format!("Combo {:?} dropped back to 0", combo_entity));
            events.write(ComboEvent {
                combo: combo_entity,
                kind: ComboEventKind::Dropped,
            });
        }

        apply_activation(&combo, &mut weapons);
    }
}

fn apply_activation(combo: &ComboSequencer, weapons: &mut Query<&mut WeaponStateMachine>) {
    for (i, weapon) in combo.weapons.iter().enumerate() {
        let Ok(mut machine) = weapons.get_mut(*weapon) else {
            continue;
        };
        let active = i == combo.index;
        if machine.active != active {
            machine.active = active;
        }
    }
}
