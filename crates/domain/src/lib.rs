//! # thermodiff-domain
//!
//! Pure domain model for the thermodiff switching-differential controller.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **thermostat readings** (current / target temperature, hvac action)
//! - Define **differential configuration** and its bounds
//! - Define **pending adjustments** and the branch decision that creates them
//! - Define **events** (state-change records that wake the controller)
//! - Define **cycle outcomes** reported by the controller
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod adjustment;
pub mod cycle;
pub mod differential;
pub mod event;
pub mod thermostat;
