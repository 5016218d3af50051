//! Weapon configuration (static per weapon instance).
//!
//! Data-driven: every field has a default (`#[serde(default)]`), presets
//! below cover the common archetypes.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Semi-auto: one shot per trigger press. Auto: fires while held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect, Serialize, Deserialize)]
pub enum TriggerMode {
    #[default]
    SemiAuto,
    Auto,
}

/// What a single `Use` produces.
#[derive(Debug, Clone, Copy, PartialEq, Default, Reflect, Serialize, Deserialize)]
pub enum WeaponKind {
    /// Spawn request(s) for the external projectile spawner
    #[default]
    Projectile,
    /// Damage window: opens `damage_delay` after the swing, stays open for `active_duration`
    Melee {
        damage_delay: f32,
        active_duration: f32,
    },
}

/// One trigger pull → `length` sub-shots, `interval` seconds apart.
#[derive(Debug, Clone, Copy, PartialEq, Reflect, Serialize, Deserialize)]
pub struct BurstConfig {
    pub length: u32,
    pub interval: f32,
}

#[derive(Component, Debug, Clone, PartialEq, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
#[require(super::WeaponStateMachine, super::WeaponMount, Transform)]
#[serde(default)]
pub struct WeaponConfig {
    pub name: String,
    pub kind: WeaponKind,
    pub trigger_mode: TriggerMode,

    /// Wind-up before the first shot (seconds)
    pub delay_before_use: f32,
    /// Releasing the trigger during the wind-up cancels the shot
    pub delay_before_use_release_interruption: bool,

    /// Cooldown between shots (seconds); also the minimum re-trigger interval
    pub time_between_uses: f32,
    /// Releasing the trigger during the cooldown stops the weapon
    pub time_between_uses_release_interruption: bool,

    pub burst: Option<BurstConfig>,

    // === Reload ===
    pub reload_time: f32,
    /// Empty magazine on shoot request → reload instead of `ReloadNeeded`
    pub auto_reload: bool,
    /// Empty reserve → "reload impossible" instead of an (empty) reload
    pub prevent_reload_if_empty: bool,

    // === Lifecycle ===
    pub auto_destroy_when_empty: bool,
    pub auto_destroy_delay: f32,

    /// Can be forced into `Interrupted` (never while reloading)
    pub interruptable: bool,
    /// `false` → only authorized callers (sequencers, AI) may fire it
    pub input_authorized: bool,

    /// Impulse applied to the owner, opposite to the fire direction
    pub recoil_force: f32,
}

impl Default for WeaponConfig {
    fn default() -> Self {
        Self {
            name: "weapon".to_string(),
            kind: WeaponKind::Projectile,
            trigger_mode: TriggerMode::SemiAuto,
            delay_before_use: 0.0,
            delay_before_use_release_interruption: false,
            time_between_uses: 0.25,
            time_between_uses_release_interruption: false,
            burst: None,
            reload_time: 1.0,
            auto_reload: false,
            prevent_reload_if_empty: false,
            auto_destroy_when_empty: false,
            auto_destroy_delay: 0.0,
            interruptable: true,
            input_authorized: true,
            recoil_force: 0.0,
        }
    }
}

impl WeaponConfig {
    /// Semi-auto pistol
    pub fn pistol() -> Self {
        Self {
            name: "pistol".to_string(),
            time_between_uses: 0.3,
            reload_time: 1.2,
            auto_reload: true,
            recoil_force: 1.0,
            ..Self::default()
        }
    }

    /// Full-auto rifle
    pub fn assault_rifle() -> Self {
        Self {
            name: "assault_rifle".to_string(),
            trigger_mode: TriggerMode::Auto,
            time_between_uses: 0.1,
            reload_time: 2.0,
            auto_reload: true,
            recoil_force: 0.5,
            ..Self::default()
        }
    }

    /// 3-round burst rifle
    pub fn burst_rifle() -> Self {
        Self {
            name: "burst_rifle".to_string(),
            time_between_uses: 0.5,
            burst: Some(BurstConfig {
                length: 3,
                interval: 0.08,
            }),
            reload_time: 1.8,
            auto_reload: true,
            ..Self::default()
        }
    }

    /// Melee sword (no ammo)
    pub fn sword() -> Self {
        Self {
            name: "sword".to_string(),
            kind: WeaponKind::Melee {
                damage_delay: 0.1,
                active_duration: 0.2,
            },
            time_between_uses: 0.5,
            ..Self::default()
        }
    }

    /// Thrown weapon paid from a pool, destroyed when the pool runs dry
    pub fn grenade() -> Self {
        Self {
            name: "grenade".to_string(),
            delay_before_use: 0.3,
            delay_before_use_release_interruption: true,
            time_between_uses: 0.8,
            auto_destroy_when_empty: true,
            auto_destroy_delay: 0.5,
            ..Self::default()
        }
    }

    pub fn is_burst(&self) -> bool {
        self.burst.is_some_and(|burst| burst.length > 1)
    }

    pub fn burst_interval(&self) -> f32 {
        self.burst.map(|burst| burst.interval).unwrap_or(0.0)
    }
}
