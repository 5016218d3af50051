//! Weapon systems.

pub mod commands;
pub mod fire;
pub mod lifecycle;
pub mod mount;

pub use commands::*;
pub use fire::*;
pub use lifecycle::*;
pub use mount::*;
