//! Workers
//!
//! Each worker is a plain async function generic over the HAL pin types. The
//! firmware wraps them in `#[embassy_executor::task]`s bound to concrete pins;
//! tests drive them directly.
pub mod autonomous_drive;
pub mod distance_measure;
pub mod drive;
pub mod orchestrate;
