//! Drive Command Module
//!
//! What the manual and autonomous paths ask of the two motors on each tick.
//! A command names a per-side intent; the controller turns `Drive` targets
//! into ramped speeds and applies `Stop`/`Brake` directly.

/// Request for one motor
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SideCommand {
    /// Approach this speed (-100..=100) through the ramp
    Drive(f32),
    /// Stop applying power, allowing the motor to coast
    Stop,
    /// Apply brakes to stop immediately
    Brake,
}

/// Requests for both motors
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DriveCommand {
    pub left: SideCommand,
    pub right: SideCommand,
}

impl DriveCommand {
    pub const fn new(left: SideCommand, right: SideCommand) -> Self {
        Self { left, right }
    }

    /// Both motors toward the same speed
    pub const fn straight(speed: f32) -> Self {
        Self::new(SideCommand::Drive(speed), SideCommand::Drive(speed))
    }

    /// Both motors coasting
    pub const fn coast() -> Self {
        Self::new(SideCommand::Stop, SideCommand::Stop)
    }

    /// Both motors short-braked
    pub const fn brake() -> Self {
        Self::new(SideCommand::Brake, SideCommand::Brake)
    }
}
