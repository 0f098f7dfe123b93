//! Core-facing contract with the configuration and status layer
//!
//! The winder is controlled by some external front-end (an HTTP server, a
//! serial console, a test harness - transport is explicitly out of scope
//! here). This crate pins down the *shapes* that cross that boundary:
//!
//! - [`Command`]: the three mutation entry points, carrying raw,
//!   unvalidated wire values. The engine clamps and defaults; a command
//!   never fails.
//! - [`StatusSnapshot`]: the read-only view of the whole machine.
//!
//! Commands must reach the engine only between scheduling ticks.

#![no_std]
#![deny(unsafe_code)]

pub mod command;
pub mod status;

pub use command::{Command, ConfigFrame, TurboRequest};
pub use status::{ChannelStatus, StatusSnapshot, TurboStatus, NETWORK_DESC_LEN};
