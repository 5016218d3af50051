//! Combo group: sibling weapons used in order, one at a time.

use bevy::prelude::*;

use crate::weapon::tasks::TIME_EPSILON;

#[derive(Component, Debug, Clone, PartialEq, Reflect)]
#[reflect(Component)]
pub struct ComboSequencer {
    pub weapons: Vec<Entity>,
    /// Always in `[0, weapons.len() - 1]` (0 for an empty group)
    pub index: usize,
    /// Idle for `drop_delay` after a swing → back to the first weapon
    pub droppable: bool,
    pub drop_delay: f32,
    /// Running drop countdown (`None` while a weapon is in use)
    pub countdown: Option<f32>,
}

impl ComboSequencer {
    pub fn new(weapons: Vec<Entity>) -> Self {
        Self {
            weapons,
            index: 0,
            droppable: false,
            drop_delay: 0.0,
            countdown: None,
        }
    }

    pub fn droppable(mut self, drop_delay: f32) -> Self {
        self.droppable = true;
        self.drop_delay = drop_delay;
        self
    }

    pub fn active_weapon(&self) -> Option<Entity> {
        self.weapons.get(self.index).copied()
    }

    pub fn contains(&self, weapon: Entity) -> bool {
        self.weapons.contains(&weapon)
    }

    /// Member started using: the combo is alive, stop the drop countdown.
    pub fn on_weapon_started(&mut self, weapon: Entity) {
        if self.active_weapon() == Some(weapon) {
            self.countdown = None;
        }
    }

    /// Member finished: advance to the next weapon. Returns the new index.
    pub fn on_weapon_stopped(&mut self, weapon: Entity) -> Option<usize> {
        if self.active_weapon() != Some(weapon) {
            return None;
        }

        self.index = (self.index + 1) % self.weapons.len();
        if self.droppable {
            self.countdown = Some(self.drop_delay);
        }
        Some(self.index)
    }

    /// Count the drop timer down. Returns true when the combo dropped.
    pub fn tick(&mut self, delta: f32) -> bool {
        let Some(remaining) = self.countdown.as_mut() else {
            return false;
        };

        *remaining -= delta;
        if *remaining > TIME_EPSILON {
            return false;
        }

        self.countdown = None;
        let dropped = self.index != 0;
        self.index = 0;
        dropped
    }
}
