//! Board-agnostic core logic for the watch winder firmware
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Hardware abstraction traits (step queue, clock)
//! - Wrap-safe millisecond timekeeping
//! - Per-channel turns-per-day scheduling
//! - Turbo override state machine
//! - Mode switch debouncing and preset overlay
//! - Configuration type definitions

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

pub mod clock;
pub mod config;
pub mod engine;
pub mod traits;
