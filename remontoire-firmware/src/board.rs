//! Board wiring and motion constants
//!
//! Wiring (assignments happen in `main`):
//!
//! | Signal                  | GPIO       |
//! |-------------------------|------------|
//! | Motor 1 IN1..IN4        | 2, 3, 4, 5 |
//! | Motor 2 IN1..IN4        | 6, 7, 8, 9 |
//! | Mode selector A / B     | 14, 15     |
//! | Run LED                 | 25         |
//!
//! The selector is a three-position switch to ground; both lines use the
//! internal pull-ups. Motors are 28BYJ-48 behind ULN2003 boards.

/// Steps per output rotation: 64 half-steps per rotor turn through the
/// 64:1 gearbox.
pub const STEPS_PER_REV: u32 = 4096;

/// Internal motor speed; tweak if the mechanism chatters.
pub const MOTOR_RPM: u16 = 15;

/// Descriptor reported in status queries while no radio layer is attached.
pub const NETWORK_DESC: &str = "rtt-console";
