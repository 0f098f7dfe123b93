//! Stepper motor drivers
//!
//! The winder mechanisms use small geared unipolar steppers (28BYJ-48
//! class) behind ULN2003 darlington arrays, driven by direct coil
//! sequencing rather than a step/dir interface.

mod half4wire;

pub use half4wire::{steps_per_second, Half4Wire, MAX_SPS, MIN_SPS};
