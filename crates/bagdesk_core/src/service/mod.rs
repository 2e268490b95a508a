//! Desk session services.
//!
//! # Responsibility
//! - Expose the caller-facing operations over one desk and its bags.
//! - Keep arena keys and storage locations private to the crate.

pub mod audit;
pub mod desk_service;
pub mod error;
mod inversion;
pub mod snapshot;
