//! Hardware abstraction traits
//!
//! The core consumes hardware exclusively through these seams. Drivers
//! implement them against real peripherals; tests implement them against
//! simulators.

mod stepper;

pub use stepper::{Clock, Direction, StepQueue};
