//! Rover control core
//!
//! Hardware-agnostic control logic for a small two-wheeled robot:
//! - Ultrasonic ranging driven by echo-pin edge events, median filtered
//! - Differential drive over two H-bridge channels with speed ramping
//! - Arbitration between remote (manual) driving and autonomous obstacle avoidance
//!
//! Everything here is generic over `embedded-hal` traits. The RP2350 firmware in
//! `main.rs` binds the concrete pins and spawns the workers from [`task`].

#![cfg_attr(not(test), no_std)]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

/// Shared state, events, drivers and control logic
pub mod system;
/// Long-running workers
pub mod task;

#[cfg(test)]
pub(crate) mod testing;
