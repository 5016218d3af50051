//! AmmoLedger: gatekeeper between a weapon and its ammo counters.

use super::{AmmoPools, AmmoReserve, WeaponAmmo};
use crate::logger;

/// Rejected consumption. Never crashes the tick: the state machine turns
/// it into `ReloadNeeded`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AmmoError {
    NotEnoughAmmo { required: u32, available: u32 },
}

impl std::fmt::Display for AmmoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AmmoError::NotEnoughAmmo { required, available } => write!(
                f,
                "not enough ammo: {} required, {} available",
                required, available
            ),
        }
    }
}

impl std::error::Error for AmmoError {}

/// Result of a successful `consume`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsumeOutcome {
    /// Counter the shot was paid from after the decrement (`None` = infinite)
    pub remaining: Option<u32>,
    /// Magazine + reserve can no longer pay for a single shot
    pub exhausted: bool,
}

/// Borrowed view over one weapon's ammo and the shared pools.
pub struct AmmoLedger<'a> {
    ammo: &'a mut WeaponAmmo,
    pools: &'a mut AmmoPools,
}

impl<'a> AmmoLedger<'a> {
    pub fn new(ammo: &'a mut WeaponAmmo, pools: &'a mut AmmoPools) -> Self {
        Self { ammo, pools }
    }

    pub fn ammo(&self) -> &WeaponAmmo {
        self.ammo
    }

    pub fn is_magazine_based(&self) -> bool {
        self.ammo.magazine.is_some()
    }

    pub fn is_magazine_full(&self) -> bool {
        self.ammo.magazine.map(|m| m.is_full()).unwrap_or(true)
    }

    /// Ammo left in the reserve (`None` = infinite).
    pub fn reserve_available(&self) -> Option<u32> {
        match &self.ammo.reserve {
            AmmoReserve::Infinite => None,
            AmmoReserve::Pool(id) => Some(self.pools.available(id).unwrap_or_else(|| {
                logger::log_warning(&format!(
                    "Ammo pool '{}' is not registered, treating it as empty",
                    id
                ));
                0
            })),
        }
    }

    /// Magazine: `loaded ≥ per_shot`. Pool weapon: `pool ≥ per_shot`.
    pub fn has_enough_ammo(&self) -> bool {
        let required = self.ammo.consumed_per_shot;
        match self.ammo.magazine {
            Some(magazine) => magazine.loaded >= required,
            None => self.reserve_available().map_or(true, |available| available >= required),
        }
    }

    /// Decrements the paying counter by `consumed_per_shot`.
    pub fn consume(&mut self) -> Result<ConsumeOutcome, AmmoError> {
        let required = self.ammo.consumed_per_shot;

        let remaining = match self.ammo.magazine.as_mut() {
            Some(magazine) => {
                if magazine.loaded < required {
                    return Err(AmmoError::NotEnoughAmmo {
                        required,
                        available: magazine.loaded,
                    });
                }
                magazine.loaded -= required;
                Some(magazine.loaded)
            }
            None => match &self.ammo.reserve {
                AmmoReserve::Infinite => None,
                AmmoReserve::Pool(id) => {
                    let id = id.clone();
                    if !self.pools.take_exact(&id, required) {
                        return Err(AmmoError::NotEnoughAmmo {
                            required,
                            available: self.pools.available(&id).unwrap_or(0),
                        });
                    }
                    self.pools.available(&id)
                }
            },
        };

        Ok(ConsumeOutcome {
            remaining,
            exhausted: self.is_exhausted(),
        })
    }

    /// Neither the magazine nor the reserve can pay for one more shot.
    pub fn is_exhausted(&self) -> bool {
        let required = self.ammo.consumed_per_shot;
        if required == 0 {
            return false;
        }

        let reserve_short = match &self.ammo.reserve {
            AmmoReserve::Infinite => false,
            AmmoReserve::Pool(id) => self.pools.available(id).unwrap_or(0) < required,
        };

        match self.ammo.magazine {
            Some(magazine) => magazine.loaded < required && reserve_short,
            None => reserve_short,
        }
    }

    /// Tops the magazine up from the reserve (bounded by what the pool has).
    /// Returns how many rounds were loaded. No-op for pool weapons.
    pub fn refill(&mut self) -> u32 {
        let Some(magazine) = self.ammo.magazine.as_mut() else {
            return 0;
        };

        let missing = magazine.missing();
        let loaded = match &self.ammo.reserve {
            AmmoReserve::Infinite => missing,
            AmmoReserve::Pool(id) => self.pools.take_up_to(id, missing),
        };
        magazine.loaded += loaded;
        loaded
    }

    /// Returns magazine-held ammo to the pool (unequip/save). Idempotent.
    pub fn empty(&mut self) -> u32 {
        let Some(magazine) = self.ammo.magazine.as_mut() else {
            return 0;
        };

        let returned = magazine.loaded;
        if returned == 0 {
            return 0;
        }

        magazine.loaded = 0;
        if let AmmoReserve::Pool(id) = &self.ammo.reserve {
            self.pools.add(id, returned);
        }
        returned
    }
}

/// Ammo as seen by the state machine: either a real ledger or nothing to
/// track (weapon without `WeaponAmmo`).
pub enum AmmoAccess<'a> {
    Unlimited,
    Ledger(AmmoLedger<'a>),
}

impl AmmoAccess<'_> {
    pub fn has_enough_ammo(&self) -> bool {
        match self {
            AmmoAccess::Unlimited => true,
            AmmoAccess::Ledger(ledger) => ledger.has_enough_ammo(),
        }
    }

    pub fn consume(&mut self) -> Result<ConsumeOutcome, AmmoError> {
        match self {
            AmmoAccess::Unlimited => Ok(ConsumeOutcome {
                remaining: None,
                exhausted: false,
            }),
            AmmoAccess::Ledger(ledger) => ledger.consume(),
        }
    }

    pub fn refill(&mut self) -> u32 {
        match self {
            AmmoAccess::Unlimited => 0,
            AmmoAccess::Ledger(ledger) => ledger.refill(),
        }
    }

    pub fn is_magazine_based(&self) -> bool {
        match self {
            AmmoAccess::Unlimited => false,
            AmmoAccess::Ledger(ledger) => ledger.is_magazine_based(),
        }
    }

    pub fn is_magazine_full(&self) -> bool {
        match self {
            AmmoAccess::Unlimited => true,
            AmmoAccess::Ledger(ledger) => ledger.is_magazine_full(),
        }
    }

    /// `None` = infinite.
    pub fn reserve_available(&self) -> Option<u32> {
        match self {
            AmmoAccess::Unlimited => None,
            AmmoAccess::Ledger(ledger) => ledger.reserve_available(),
        }
    }
}
