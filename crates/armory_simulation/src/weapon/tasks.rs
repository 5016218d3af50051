//! Suspended weapon tasks (burst sub-shots, melee windows, delayed destroy).
//!
//! A task = (weapon, resume time, continuation). Nothing blocks: the late
//! phase drains due tasks every tick and hands each continuation back to
//! its weapon's state machine. Interrupting a weapon removes its burst and
//! melee entries so no stale resume fires afterwards.

use bevy::prelude::*;

/// Tolerance for comparing accumulated sim time against resume times.
pub const TIME_EPSILON: f32 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum WeaponTask {
    BurstShot,
    MeleeWindowOpen,
    MeleeWindowClose,
    DestroyWeapon,
}

impl WeaponTask {
    /// Destruction is not part of the firing sequence and survives interrupts.
    pub fn is_interruptible(&self) -> bool {
        !matches!(self, WeaponTask::DestroyWeapon)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledTask {
    pub weapon: Entity,
    pub resume_at: f32,
    pub task: WeaponTask,
    sequence: u64,
}

#[derive(Resource, Debug, Default)]
pub struct TaskScheduler {
    tasks: Vec<ScheduledTask>,
    next_sequence: u64,
}

impl TaskScheduler {
    pub fn schedule(&mut self, weapon: Entity, resume_at: f32, task: WeaponTask) {
        self.tasks.push(ScheduledTask {
            weapon,
            resume_at,
            task,
            sequence: self.next_sequence,
        });
        self.next_sequence += 1;
    }

    /// Removes and returns every task due at `now`, ordered by resume time
    /// then scheduling order.
    pub fn drain_due(&mut self, now: f32) -> Vec<ScheduledTask> {
        let (mut due, pending): (Vec<_>, Vec<_>) = self
            .tasks
            .drain(..)
            .partition(|task| task.resume_at <= now + TIME_EPSILON);
        self.tasks = pending;

        due.sort_by(|a, b| {
            a.resume_at
                .total_cmp(&b.resume_at)
                .then(a.sequence.cmp(&b.sequence))
        });
        due
    }

    /// Cancel-on-interrupt: drops burst/melee continuations of one weapon.
    pub fn cancel_interruptible(&mut self, weapon: Entity) -> usize {
        let before = self.tasks.len();
        self.tasks
            .retain(|task| task.weapon != weapon || !task.task.is_interruptible());
        before - self.tasks.len()
    }

    /// Weapon gone: forget everything keyed to it.
    pub fn cancel_all(&mut self, weapon: Entity) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.weapon != weapon);
        before - self.tasks.len()
    }

    pub fn pending_for(&self, weapon: Entity) -> usize {
        self.tasks.iter().filter(|task| task.weapon == weapon).count()
    }

    pub fn has_pending(&self, weapon: Entity, task: WeaponTask) -> bool {
        self.tasks
            .iter()
            .any(|scheduled| scheduled.weapon == weapon && scheduled.task == task)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
