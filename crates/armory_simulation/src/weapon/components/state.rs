//! Weapon state machine (per weapon instance).
//!
//! # States
//!
//! ```text
//! Idle → Start → [DelayBeforeUse] → Use → DelayBetweenUses ─┬→ Use (auto, held)
//!                                                            └→ Stop → Idle
//! (no ammo) → ReloadNeeded → Idle
//!           → ReloadStart → Reload → ReloadStop → Idle
//! (any except reload) → Interrupted → Idle
//! ```
//!
//! Every late tick: queued commands are applied in arrival order, due
//! suspended tasks resume, then exactly one state case runs. The machine
//! never touches the ECS; it reports what happened through `WeaponEffect`s
//! that the weapon system turns into events, spawn requests and scheduled
//! tasks.

use bevy::prelude::*;

use super::config::{WeaponConfig, WeaponKind, TriggerMode};
use crate::ammo::AmmoAccess;
use crate::context::SimContext;
use crate::logger;
use crate::weapon::events::{CommandSource, RejectReason, WeaponAction, WeaponEventKind};
use crate::weapon::tasks::{WeaponTask, TIME_EPSILON};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Reflect)]
pub enum WeaponState {
    #[default]
    Idle,
    Start,
    DelayBeforeUse,
    Use,
    DelayBetweenUses,
    Stop,
    ReloadNeeded,
    ReloadStart,
    Reload,
    ReloadStop,
    Interrupted,
}

impl WeaponState {
    /// Reload cannot be interrupted.
    pub fn is_reload(&self) -> bool {
        matches!(
            self,
            WeaponState::ReloadStart | WeaponState::Reload | WeaponState::ReloadStop
        )
    }

    /// Trigger cycle in progress.
    pub fn is_firing(&self) -> bool {
        matches!(
            self,
            WeaponState::Start
                | WeaponState::DelayBeforeUse
                | WeaponState::Use
                | WeaponState::DelayBetweenUses
        )
    }
}

/// Output of a tick, consumed by the weapon system.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WeaponEffect {
    Notify(WeaponEventKind),
    /// One shot left the weapon (spawn request + recoil)
    Fire,
    Schedule { delay: f32, task: WeaponTask },
    /// Drop interruptible tasks of this weapon
    CancelTasks,
    /// Remove the weapon entity
    Despawn,
}

#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct PendingCommand {
    pub action: WeaponAction,
    pub source: CommandSource,
}

#[derive(Component, Debug, Clone, PartialEq, Reflect)]
#[reflect(Component)]
pub struct WeaponStateMachine {
    pub state: WeaponState,
    /// Combo members other than the current one are inactive
    pub active: bool,
    pub trigger_released: bool,
    pub reloading: bool,
    pub delay_before_use_counter: f32,
    pub delay_between_uses_counter: f32,
    pub reload_counter: f32,
    /// Sim time of the last shot (re-trigger interval)
    pub last_shot_at: Option<f32>,
    /// Sub-shots of the current burst still to fire
    pub burst_remaining: u32,
    pub melee_window_open: bool,
    pub destroy_scheduled: bool,
    pending: Vec<PendingCommand>,
}

impl Default for WeaponStateMachine {
    fn default() -> Self {
        Self {
            state: WeaponState::Idle,
            active: true,
            trigger_released: true,
            reloading: false,
            delay_before_use_counter: 0.0,
            delay_between_uses_counter: 0.0,
            reload_counter: 0.0,
            last_shot_at: None,
            burst_remaining: 0,
            melee_window_open: false,
            destroy_scheduled: false,
            pending: Vec::new(),
        }
    }
}

impl WeaponStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inactive() -> Self {
        Self {
            active: false,
            ..Self::default()
        }
    }

    /// Queue a command for the next late tick.
    pub fn request(&mut self, action: WeaponAction, source: CommandSource) {
        self.pending.push(PendingCommand { action, source });
    }

    /// Fire-start + fire-stop in the same tick: exactly one trigger cycle.
    pub fn request_one_shot(&mut self, source: CommandSource) {
        self.request(WeaponAction::FireStart, source);
        self.request(WeaponAction::FireStop, source);
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn is_reloading(&self) -> bool {
        self.reloading
    }

    pub fn burst_in_progress(&self) -> bool {
        self.burst_remaining > 0
    }

    /// Re-equip: back to a fresh `Idle`. `active` is left to the combo group.
    pub fn reinitialize(&mut self) {
        *self = Self {
            active: self.active,
            ..Self::default()
        };
    }

    /// Queued commands in arrival order. Runs before due tasks resume, so an
    /// interrupt beats a sub-shot that comes due in the same tick.
    pub fn apply_commands(
        &mut self,
        config: &WeaponConfig,
        ctx: &SimContext,
        ammo: &mut AmmoAccess,
        out: &mut Vec<WeaponEffect>,
    ) {
        let pending = std::mem::take(&mut self.pending);
        for command in pending {
            self.apply_command(command, config, ctx, ammo, out);
        }
    }

    /// Exactly one state case.
    pub fn evaluate(
        &mut self,
        config: &WeaponConfig,
        ctx: &SimContext,
        ammo: &mut AmmoAccess,
        out: &mut Vec<WeaponEffect>,
    ) {
        self.process_state(config, ctx, ammo, out);
    }

    fn apply_command(
        &mut self,
        command: PendingCommand,
        config: &WeaponConfig,
        ctx: &SimContext,
        ammo: &mut AmmoAccess,
        out: &mut Vec<WeaponEffect>,
    ) {
        match command.action {
            WeaponAction::FireStart => self.input_start(command.source, config, ctx, out),
            WeaponAction::FireStop => self.input_stop(),
            WeaponAction::Reload => {
                if self.active {
                    self.initiate_reload(config, ammo, out);
                }
            }
            WeaponAction::Interrupt => self.interrupt(config, out),
        }
    }

    fn input_start(
        &mut self,
        source: CommandSource,
        config: &WeaponConfig,
        ctx: &SimContext,
        out: &mut Vec<WeaponEffect>,
    ) {
        if !self.active {
            out.push(WeaponEffect::Notify(WeaponEventKind::Rejected(RejectReason::Inactive)));
            return;
        }

        if source == CommandSource::Input && !config.input_authorized {
            out.push(WeaponEffect::Notify(WeaponEventKind::Rejected(
                RejectReason::InputNotAuthorized,
            )));
            return;
        }

        if self.reloading {
            out.push(WeaponEffect::Notify(WeaponEventKind::Rejected(RejectReason::Reloading)));
            return;
        }

        if self.state != WeaponState::Idle {
            // Already cycling: holding keeps an auto weapon going
            self.trigger_released = false;
            return;
        }

        if source == CommandSource::Input
            && self.retrigger_blocked(config.time_between_uses, ctx.now())
        {
            out.push(WeaponEffect::Notify(WeaponEventKind::Rejected(
                RejectReason::RetriggerTooSoon,
            )));
            return;
        }

        self.trigger_released = false;
        self.state = WeaponState::Start;
        out.push(WeaponEffect::Notify(WeaponEventKind::Started));
    }

    fn input_stop(&mut self) {
        self.trigger_released = true;
    }

    fn retrigger_blocked(&self, interval: f32, now: f32) -> bool {
        self.last_shot_at
            .is_some_and(|last| now - last + TIME_EPSILON < interval)
    }

    /// Forces `Interrupted`. No-op for non-interruptable weapons, while
    /// reloading, or when there is nothing to interrupt.
    pub fn interrupt(&mut self, config: &WeaponConfig, out: &mut Vec<WeaponEffect>) {
        if !config.interruptable || self.state.is_reload() || self.reloading {
            return;
        }

        // ReloadNeeded is already a rest state: flush its notification first
        if self.state == WeaponState::ReloadNeeded {
            out.push(WeaponEffect::Notify(WeaponEventKind::ReloadNeeded));
            self.state = WeaponState::Idle;
        }

        if self.state == WeaponState::Idle && !self.burst_in_progress() && !self.melee_window_open {
            return;
        }

        self.burst_remaining = 0;
        out.push(WeaponEffect::CancelTasks);

        if self.melee_window_open {
            self.melee_window_open = false;
            out.push(WeaponEffect::Notify(WeaponEventKind::MeleeWindowClosed));
        }

        self.state = WeaponState::Interrupted;
        out.push(WeaponEffect::Notify(WeaponEventKind::Interrupted));
    }

    /// Reload request. Silent no-op while already reloading, for weapons
    /// without a magazine and for full magazines.
    pub fn initiate_reload(
        &mut self,
        config: &WeaponConfig,
        ammo: &mut AmmoAccess,
        out: &mut Vec<WeaponEffect>,
    ) {
        if self.reloading || self.state.is_reload() {
            return;
        }

        if !ammo.is_magazine_based() || ammo.is_magazine_full() {
            return;
        }

        if config.prevent_reload_if_empty && ammo.reserve_available() == Some(0) {
            out.push(WeaponEffect::Notify(WeaponEventKind::ReloadImpossible));
            if self.state.is_firing() {
                self.burst_remaining = 0;
                self.state = WeaponState::Stop;
            }
            return;
        }

        self.burst_remaining = 0;
        self.reloading = true;
        self.trigger_released = true;
        self.state = WeaponState::ReloadStart;
    }

    fn process_state(
        &mut self,
        config: &WeaponConfig,
        ctx: &SimContext,
        ammo: &mut AmmoAccess,
        out: &mut Vec<WeaponEffect>,
    ) {
        match self.state {
            WeaponState::Idle => {}

            WeaponState::Start => {
                if config.delay_before_use > 0.0 {
                    self.delay_before_use_counter = config.delay_before_use;
                    self.state = WeaponState::DelayBeforeUse;
                } else {
                    self.shoot_request(config, ammo, out);
                }
            }

            WeaponState::DelayBeforeUse => {
                self.delay_before_use_counter -= ctx.delta;

                if config.delay_before_use_release_interruption && self.trigger_released {
                    self.state = WeaponState::Stop;
                } else if self.delay_before_use_counter <= TIME_EPSILON {
                    self.shoot_request(config, ammo, out);
                }
            }

            WeaponState::Use => {
                if self.fire_once(config, ctx, ammo, out) {
                    self.delay_between_uses_counter = config.time_between_uses;
                    self.state = WeaponState::DelayBetweenUses;
                }
            }

            WeaponState::DelayBetweenUses => {
                self.delay_between_uses_counter -= ctx.delta;

                if config.time_between_uses_release_interruption && self.trigger_released {
                    self.burst_remaining = 0;
                    self.state = WeaponState::Stop;
                } else if self.delay_between_uses_counter <= TIME_EPSILON && !self.burst_in_progress() {
                    if config.trigger_mode == TriggerMode::Auto && !self.trigger_released {
                        self.shoot_request(config, ammo, out);
                    } else {
                        self.state = WeaponState::Stop;
                    }
                }
            }

            WeaponState::Stop => {
                out.push(WeaponEffect::Notify(WeaponEventKind::Stopped));
                self.state = WeaponState::Idle;
            }

            WeaponState::ReloadNeeded => {
                out.push(WeaponEffect::Notify(WeaponEventKind::ReloadNeeded));
                self.state = WeaponState::Idle;
            }

            WeaponState::ReloadStart => {
                out.push(WeaponEffect::Notify(WeaponEventKind::ReloadStarted));
                self.reload_counter = config.reload_time;
                self.state = WeaponState::Reload;
            }

            WeaponState::Reload => {
                self.reload_counter -= ctx.delta;
                if self.reload_counter <= TIME_EPSILON {
                    self.state = WeaponState::ReloadStop;
                }
            }

            WeaponState::ReloadStop => {
                let loaded = ammo.refill();
                logger::log(&format!("🔄 Reload complete: {} rounds loaded", loaded));
                self.reloading = false;
                self.state = WeaponState::Idle;
                out.push(WeaponEffect::Notify(WeaponEventKind::ReloadStopped));
            }

            WeaponState::Interrupted => {
                out.push(WeaponEffect::Notify(WeaponEventKind::Stopped));
                self.delay_before_use_counter = 0.0;
                self.delay_between_uses_counter = 0.0;
                self.trigger_released = true;
                self.state = WeaponState::Idle;
            }
        }
    }

    /// Ammo gate in front of `Use`.
    fn shoot_request(
        &mut self,
        config: &WeaponConfig,
        ammo: &mut AmmoAccess,
        out: &mut Vec<WeaponEffect>,
    ) {
        if self.reloading {
            return;
        }

        if !ammo.has_enough_ammo() {
            self.handle_out_of_ammo(config, ammo, out);
            return;
        }

        if config.is_burst() && !self.burst_in_progress() {
            self.burst_remaining = config.burst.map(|burst| burst.length).unwrap_or(0);
        }
        self.state = WeaponState::Use;
    }

    fn handle_out_of_ammo(
        &mut self,
        config: &WeaponConfig,
        ammo: &mut AmmoAccess,
        out: &mut Vec<WeaponEffect>,
    ) {
        self.burst_remaining = 0;

        if config.auto_reload && ammo.is_magazine_based() {
            self.initiate_reload(config, ammo, out);
            if !self.reloading && self.state.is_firing() {
                self.state = WeaponState::Stop;
            }
        } else {
            self.state = WeaponState::ReloadNeeded;
        }
    }

    /// The one-tick `Use` effect. Returns false when the shot was refused.
    fn fire_once(
        &mut self,
        config: &WeaponConfig,
        ctx: &SimContext,
        ammo: &mut AmmoAccess,
        out: &mut Vec<WeaponEffect>,
    ) -> bool {
        let outcome = match ammo.consume() {
            Ok(outcome) => outcome,
            Err(err) => {
                // Ammo gate failed between shoot_request and Use: logic error, never fire on it
                logger::log_error(&format!("Weapon reached Use without ammo: {}", err));
                self.burst_remaining = 0;
                self.state = WeaponState::ReloadNeeded;
                return false;
            }
        };

        self.last_shot_at = Some(ctx.now());
        out.push(WeaponEffect::Fire);
        out.push(WeaponEffect::Notify(WeaponEventKind::Fired));

        if let WeaponKind::Melee { damage_delay, .. } = config.kind {
            out.push(WeaponEffect::Schedule {
                delay: damage_delay,
                task: WeaponTask::MeleeWindowOpen,
            });
        }

        if self.burst_remaining > 0 {
            self.burst_remaining -= 1;
            if self.burst_remaining > 0 {
                out.push(WeaponEffect::Schedule {
                    delay: config.burst_interval(),
                    task: WeaponTask::BurstShot,
                });
            }
        }

        if outcome.exhausted && config.auto_destroy_when_empty && !self.destroy_scheduled {
            self.destroy_scheduled = true;
            out.push(WeaponEffect::Schedule {
                delay: config.auto_destroy_delay,
                task: WeaponTask::DestroyWeapon,
            });
            out.push(WeaponEffect::Notify(WeaponEventKind::DestroyScheduled));
        }

        true
    }

    /// Continuation of a suspended task.
    pub fn resume(
        &mut self,
        task: WeaponTask,
        config: &WeaponConfig,
        ctx: &SimContext,
        ammo: &mut AmmoAccess,
        out: &mut Vec<WeaponEffect>,
    ) {
        match task {
            WeaponTask::BurstShot => self.resume_burst(config, ctx, ammo, out),

            WeaponTask::MeleeWindowOpen => {
                if self.state == WeaponState::Interrupted {
                    return;
                }
                self.melee_window_open = true;
                out.push(WeaponEffect::Notify(WeaponEventKind::MeleeWindowOpened));
                if let WeaponKind::Melee { active_duration, .. } = config.kind {
                    out.push(WeaponEffect::Schedule {
                        delay: active_duration,
                        task: WeaponTask::MeleeWindowClose,
                    });
                }
            }

            WeaponTask::MeleeWindowClose => {
                if self.melee_window_open {
                    self.melee_window_open = false;
                    out.push(WeaponEffect::Notify(WeaponEventKind::MeleeWindowClosed));
                }
            }

            WeaponTask::DestroyWeapon => {
                out.push(WeaponEffect::Notify(WeaponEventKind::Destroyed));
                out.push(WeaponEffect::Despawn);
            }
        }
    }

    fn resume_burst(
        &mut self,
        config: &WeaponConfig,
        ctx: &SimContext,
        ammo: &mut AmmoAccess,
        out: &mut Vec<WeaponEffect>,
    ) {
        if !self.burst_in_progress() {
            return;
        }

        if !matches!(self.state, WeaponState::Use | WeaponState::DelayBetweenUses) {
            self.burst_remaining = 0;
            return;
        }

        let interval = config.burst_interval();
        if let Some(last) = self.last_shot_at {
            let since = ctx.now() - last;
            if since + TIME_EPSILON < interval {
                out.push(WeaponEffect::Schedule {
                    delay: interval - since,
                    task: WeaponTask::BurstShot,
                });
                return;
            }
        }

        if !ammo.has_enough_ammo() {
            self.handle_out_of_ammo(config, ammo, out);
            return;
        }

        if self.fire_once(config, ctx, ammo, out) {
            self.delay_between_uses_counter = config.time_between_uses;
            self.state = WeaponState::DelayBetweenUses;
        }
    }
}
