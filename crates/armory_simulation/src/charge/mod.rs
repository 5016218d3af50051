//! Charge weapons: a sequencer entity that owns several step weapons.
//!
//! Commands addressed to the charge entity are routed here (press/release/
//! cancel). Step weapons themselves are ordinary weapon entities fired
//! through authorized one-shot commands.

use bevy::prelude::*;

use crate::context::SimContext;
use crate::logger;
use crate::weapon::{CommandSource, WeaponStateMachine};

pub mod sequencer;


pub use sequencer::{ChargeEventKind, ChargeInput, ChargeOutput, ChargeSequencer, ChargeStep};

/// Event: charge progress (feedback sink).
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct ChargeEvent {
    pub charge: Entity,
    pub kind: ChargeEventKind,
}

/// System: advance every charge sequencer (late phase, before weapons).
pub fn update_charge_sequencers(
    mut charges: Query<(Entity, &mut ChargeSequencer)>,
    mut weapons: Query<&mut WeaponStateMachine>,
    ctx: Res<SimContext>,
    mut events: EventWriter<ChargeEvent>,
) {
    let mut order: Vec<Entity> = charges.iter().map(|(entity, _)| entity).collect();
    order.sort();

    let mut outputs = Vec::new();
    for charge in order {
        let Ok((_, mut sequencer)) = charges.get_mut(charge) else {
            continue;
        };

        outputs.clear();
        sequencer.update(ctx.now(), &mut outputs);

        for output in outputs.iter().copied() {
            match output {
                ChargeOutput::Event(kind) => {
                    events.write(ChargeEvent { charge, kind });
                }
                ChargeOutput::Fire(weapon) => {
                    let Ok(mut machine) = weapons.get_mut(weapon) else {
                        logger::log_warning(&format!(
                            "Charge {:?}: step weapon {:?} has no state machine",
                            charge, weapon
                        ));
                        continue;
                    };
                    machine.request_one_shot(CommandSource::Authorized);
                    logger::log(&format!("⚡ Charge {:?} fires {:?}", charge, weapon));
                }
            }
        }
    }
}
