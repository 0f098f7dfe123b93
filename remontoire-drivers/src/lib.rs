//! Hardware driver implementations for the Remontoire watch winder
//!
//! Drivers implement the hardware seams defined in `remontoire-core`
//! against `embedded-hal` traits, so they stay portable across chips and
//! testable on the host.

#![no_std]
#![deny(unsafe_code)]

pub mod stepper;
