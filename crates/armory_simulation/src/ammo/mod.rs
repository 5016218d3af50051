//! Ammo: shared named pools + per-weapon magazines.
//!
//! Архитектура:
//! - `AmmoPools` (Resource): shared integer counters keyed by `AmmoId`
//!   (storage only, persistence is the host's problem)
//! - `WeaponAmmo` (Component on the weapon): optional magazine + reserve kind
//! - `AmmoLedger`: the only code path that mutates either counter
//!   (check-then-decrement, never negative)
//!
//! A weapon without `WeaponAmmo` never runs out.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub mod ledger;


pub use ledger::{AmmoAccess, AmmoError, AmmoLedger, ConsumeOutcome};

/// Ammo identifier ("9mm", "shells", "arrows")
#[derive(Clone, Debug, PartialEq, Eq, Hash, Reflect, Serialize, Deserialize)]
pub struct AmmoId(pub String);

impl From<&str> for AmmoId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for AmmoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Shared ammo storage (one counter per ammo id).
#[derive(Resource, Debug, Clone, Default)]
pub struct AmmoPools {
    counters: HashMap<AmmoId, u32>,
}

impl AmmoPools {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pool(mut self, id: impl Into<AmmoId>, amount: u32) -> Self {
        self.set(id, amount);
        self
    }

    pub fn set(&mut self, id: impl Into<AmmoId>, amount: u32) {
        self.counters.insert(id.into(), amount);
    }

    /// `None` = pool was never registered.
    pub fn available(&self, id: &AmmoId) -> Option<u32> {
        self.counters.get(id).copied()
    }

    pub fn contains(&self, id: &AmmoId) -> bool {
        self.counters.contains_key(id)
    }

    /// Adds ammo (pickups, magazines returned on unequip). Saturating.
    pub fn add(&mut self, id: &AmmoId, amount: u32) {
        let counter = self.counters.entry(id.clone()).or_insert(0);
        *counter = counter.saturating_add(amount);
    }

    /// Takes up to `amount`, returns how much was actually taken.
    pub fn take_up_to(&mut self, id: &AmmoId, amount: u32) -> u32 {
        let Some(counter) = self.counters.get_mut(id) else {
            return 0;
        };
        let taken = amount.min(*counter);
        *counter -= taken;
        taken
    }

    /// Takes exactly `amount` or nothing.
    pub fn take_exact(&mut self, id: &AmmoId, amount: u32) -> bool {
        match self.counters.get_mut(id) {
            Some(counter) if *counter >= amount => {
                *counter -= amount;
                true
            }
            _ => false,
        }
    }
}

/// Local bounded counter (`0 ≤ loaded ≤ size`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect, Serialize, Deserialize)]
pub struct Magazine {
    pub size: u32,
    pub loaded: u32,
}

impl Magazine {
    pub fn full(size: u32) -> Self {
        Self { size, loaded: size }
    }

    pub fn empty(size: u32) -> Self {
        Self { size, loaded: 0 }
    }

    pub fn is_full(&self) -> bool {
        self.loaded >= self.size
    }

    pub fn missing(&self) -> u32 {
        self.size.saturating_sub(self.loaded)
    }
}

/// Where ammo comes from when the magazine is refilled (or, without a
/// magazine, where each shot is paid from).
#[derive(Debug, Clone, PartialEq, Eq, Reflect, Serialize, Deserialize)]
pub enum AmmoReserve {
    Infinite,
    Pool(AmmoId),
}

/// Ammo state of one weapon.
#[derive(Component, Debug, Clone, PartialEq, Reflect)]
#[reflect(Component)]
pub struct WeaponAmmo {
    pub magazine: Option<Magazine>,
    pub reserve: AmmoReserve,
    pub consumed_per_shot: u32,
}

impl Default for WeaponAmmo {
    fn default() -> Self {
        Self {
            magazine: None,
            reserve: AmmoReserve::Infinite,
            consumed_per_shot: 1,
        }
    }
}

impl WeaponAmmo {
    /// Magazine refilled from a shared pool.
    pub fn magazine(size: u32, pool: impl Into<AmmoId>) -> Self {
        Self {
            magazine: Some(Magazine::full(size)),
            reserve: AmmoReserve::Pool(pool.into()),
            consumed_per_shot: 1,
        }
    }

    /// Magazine with an endless reserve (reload always tops it up).
    pub fn magazine_infinite_reserve(size: u32) -> Self {
        Self {
            magazine: Some(Magazine::full(size)),
            reserve: AmmoReserve::Infinite,
            consumed_per_shot: 1,
        }
    }

    /// No local buffer: every shot is paid straight from the pool.
    pub fn pool(pool: impl Into<AmmoId>) -> Self {
        Self {
            magazine: None,
            reserve: AmmoReserve::Pool(pool.into()),
            consumed_per_shot: 1,
        }
    }

    pub fn with_consumed_per_shot(mut self, amount: u32) -> Self {
        self.consumed_per_shot = amount;
        self
    }

    pub fn with_loaded(mut self, loaded: u32) -> Self {
        if let Some(magazine) = self.magazine.as_mut() {
            magazine.loaded = loaded.min(magazine.size);
        }
        self
    }

    pub fn is_magazine_based(&self) -> bool {
        self.magazine.is_some()
    }

    pub fn loaded(&self) -> Option<u32> {
        self.magazine.map(|m| m.loaded)
    }
}
