//! Charge sequencer: hold the trigger, climb through steps, release to fire.
//!
//! Step `i` is active while `cumulative[i-1] <= e' < cumulative[i]`, where
//! `e'` is the hold time minus the leading delay. The last step stays active
//! forever. Pure logic: the system feeds it the sim time and turns
//! `ChargeOutput::Fire` into authorized one-shot weapon commands.

use bevy::prelude::*;

use crate::logger;

/// One charge level, backed by its own weapon.
#[derive(Debug, Clone, PartialEq, Reflect)]
pub struct ChargeStep {
    pub weapon: Entity,
    /// Seconds spent on this step before the next one
    pub duration: f32,
    /// Sum of durations up to and including this step (strictly increasing)
    pub cumulative: f32,
    /// Releasing on this step (not the last) still fires its weapon
    pub trigger_if_interrupted: bool,
    pub started: bool,
    pub completed: bool,
}

impl ChargeStep {
    pub fn new(weapon: Entity, duration: f32) -> Self {
        Self {
            weapon,
            duration,
            cumulative: 0.0,
            trigger_if_interrupted: false,
            started: false,
            completed: false,
        }
    }

    pub fn trigger_if_interrupted(mut self) -> Self {
        self.trigger_if_interrupted = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum ChargeInput {
    Press,
    Release,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum ChargeEventKind {
    Started,
    StepStarted(usize),
    StepCompleted(usize),
    /// Trigger released on `index` (`None` = still in the leading delay)
    Released { index: Option<usize>, fired: bool },
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargeOutput {
    Event(ChargeEventKind),
    /// Fire this weapon once (authorized)
    Fire(Entity),
}

#[derive(Component, Debug, Clone, PartialEq, Reflect)]
#[reflect(Component)]
pub struct ChargeSequencer {
    pub steps: Vec<ChargeStep>,
    /// Leading delay before step 0 becomes active
    pub delay_before_use: f32,
    /// Fire step 0's weapon as soon as the charge begins
    pub allow_initial_shot: bool,
    pub charge_started_at: Option<f32>,
    /// `None` = initial index (no step active yet)
    pub current_index: Option<usize>,
    pub held: bool,
    pending: Vec<ChargeInput>,
}

impl ChargeSequencer {
    pub fn new(steps: Vec<ChargeStep>) -> Self {
        let mut steps = steps;
        let mut total = 0.0;
        for step in steps.iter_mut() {
            total += step.duration.max(0.0);
            step.cumulative = total;
        }

        let sequencer = Self {
            steps,
            delay_before_use: 0.0,
            allow_initial_shot: false,
            charge_started_at: None,
            current_index: None,
            held: false,
            pending: Vec::new(),
        };

        for index in sequencer.unreachable_steps() {
            logger::log_warning(&format!(
                "Charge step {} has duration {}: cumulative durations must strictly increase",
                index, sequencer.steps[index].duration
            ));
        }
        sequencer
    }

    /// Steps whose cumulative duration does not exceed the previous one.
    pub fn unreachable_steps(&self) -> Vec<usize> {
        let mut previous = 0.0;
        let mut unreachable = Vec::new();
        for (index, step) in self.steps.iter().enumerate() {
            if step.cumulative <= previous {
                unreachable.push(index);
            }
            previous = step.cumulative;
        }
        unreachable
    }

    pub fn with_delay(mut self, delay: f32) -> Self {
        self.delay_before_use = delay.max(0.0);
        self
    }

    pub fn with_initial_shot(mut self) -> Self {
        self.allow_initial_shot = true;
        self
    }

    pub fn press(&mut self) {
        self.pending.push(ChargeInput::Press);
    }

    pub fn release(&mut self) {
        self.pending.push(ChargeInput::Release);
    }

    pub fn cancel(&mut self) {
        self.pending.push(ChargeInput::Cancel);
    }

    pub fn is_charging(&self) -> bool {
        self.charge_started_at.is_some()
    }

    pub fn last_index(&self) -> Option<usize> {
        self.steps.len().checked_sub(1)
    }

    /// Unique weapons of all steps, in step order.
    pub fn weapons(&self) -> Vec<Entity> {
        let mut weapons: Vec<Entity> = Vec::new();
        for step in &self.steps {
            if !weapons.contains(&step.weapon) {
                weapons.push(step.weapon);
            }
        }
        weapons
    }

    /// Active step after holding for `elapsed` seconds.
    pub fn step_index_at(&self, elapsed: f32) -> Option<usize> {
        let last = self.last_index()?;
        if elapsed < self.delay_before_use {
            return None;
        }

        let charged = elapsed - self.delay_before_use;
        let index = self
            .steps
            .iter()
            .position(|step| step.cumulative > charged)
            .unwrap_or(last);
        Some(index)
    }

    /// One tick at sim time `now`.
    pub fn update(&mut self, now: f32, out: &mut Vec<ChargeOutput>) {
        let pending = std::mem::take(&mut self.pending);
        for input in pending {
            match input {
                ChargeInput::Press => self.begin(now, out),
                ChargeInput::Release => self.finish(now, out),
                ChargeInput::Cancel => {
                    if self.is_charging() {
                        out.push(ChargeOutput::Event(ChargeEventKind::Cancelled));
                        self.reset();
                    }
                }
            }
        }

        if self.held {
            self.advance_to(now, out);
        }
    }

    fn begin(&mut self, now: f32, out: &mut Vec<ChargeOutput>) {
        if self.is_charging() || self.steps.is_empty() {
            return;
        }

        self.charge_started_at = Some(now);
        self.held = true;
        out.push(ChargeOutput::Event(ChargeEventKind::Started));

        if self.allow_initial_shot {
            out.push(ChargeOutput::Fire(self.steps[0].weapon));
        }
    }

    fn finish(&mut self, now: f32, out: &mut Vec<ChargeOutput>) {
        if !self.is_charging() {
            return;
        }

        self.advance_to(now, out);

        let fired_weapon = self.current_index.and_then(|index| {
            let step = &self.steps[index];
            let is_last = Some(index) == self.last_index();
            (is_last || step.trigger_if_interrupted).then_some(step.weapon)
        });

        if let Some(weapon) = fired_weapon {
            out.push(ChargeOutput::Fire(weapon));
        }
        out.push(ChargeOutput::Event(ChargeEventKind::Released {
            index: self.current_index,
            fired: fired_weapon.is_some(),
        }));

        self.reset();
    }

    fn advance_to(&mut self, now: f32, out: &mut Vec<ChargeOutput>) {
        let Some(started_at) = self.charge_started_at else {
            return;
        };

        let index = self.step_index_at(now - started_at);
        if index == self.current_index {
            return;
        }

        if let Some(previous) = self.current_index {
            self.steps[previous].completed = true;
            out.push(ChargeOutput::Event(ChargeEventKind::StepCompleted(previous)));
        }
        if let Some(next) = index {
            self.steps[next].started = true;
            out.push(ChargeOutput::Event(ChargeEventKind::StepStarted(next)));
        }
        self.current_index = index;
    }

    fn reset(&mut self) {
        self.charge_started_at = None;
        self.current_index = None;
        self.held = false;
        for step in self.steps.iter_mut() {
            step.started = false;
            step.completed = false;
        }
    }
}
