//! Domain model for the desk/bag containment hierarchy.
//!
//! # Responsibility
//! - Define the public handles callers hold (`ItemRef`, `BagRef`, `BagId`).
//! - Define the arena records the store links together.
//!
//! # Invariants
//! - Records never hold references to each other, only arena keys.
//! - A handle is only meaningful for the session epoch that issued it.

pub mod handle;
pub(crate) mod record;
