//! System State Management
//!
//! The fields several workers look at concurrently. Each field has exactly one
//! writer:
//! - Operation mode: the orchestrator (remote events)
//! - Remote stick position: the orchestrator (remote events)
//! - Front distance: the distance worker (echo edges)
//!
//! Every field sits in its own atomic or critical-section cell. Readers may
//! see one field change between two reads; nothing here promises a consistent
//! view across fields.
//!
//! # Initial State
//! - Mode: Off
//! - Stick: centered (0, 0)
//! - Front distance: 0 cm, which reads as obstructed until the sensor
//!   publishes its first filtered sample

use core::cell::Cell;
use core::fmt;
use core::str::FromStr;
use core::sync::atomic::{AtomicU32, AtomicU8, Ordering};

use embassy_sync::blocking_mutex::{raw::CriticalSectionRawMutex, Mutex};

use crate::system::event::ParseError;

/// Robot operation modes defining who drives the motors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OperationMode {
    /// Motors coast, inputs are tracked but not acted on
    Off,
    /// Stick position is mixed into left/right speeds
    Manual,
    /// Obstacle avoidance drives, stick input is ignored
    Autonomous,
}

impl OperationMode {
    fn to_bits(self) -> u8 {
        match self {
            Self::Off => 0,
            Self::Manual => 1,
            Self::Autonomous => 2,
        }
    }

    fn from_bits(bits: u8) -> Self {
        match bits {
            1 => Self::Manual,
            2 => Self::Autonomous,
            _ => Self::Off,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Manual => "manual",
            Self::Autonomous => "autonomous",
        }
    }
}

impl FromStr for OperationMode {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "off" => Ok(Self::Off),
            "manual" => Ok(Self::Manual),
            "autonomous" => Ok(Self::Autonomous),
            _ => Err(ParseError::UnknownMode),
        }
    }
}

impl fmt::Display for OperationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Single-writer, multi-reader robot state
pub struct SharedState {
    mode: AtomicU8,
    /// f32 bits
    front_distance: AtomicU32,
    remote_position: Mutex<CriticalSectionRawMutex, Cell<(f32, f32)>>,
}

impl SharedState {
    pub const fn new() -> Self {
        Self {
            mode: AtomicU8::new(0),
            front_distance: AtomicU32::new(0),
            remote_position: Mutex::new(Cell::new((0.0, 0.0))),
        }
    }

    pub fn mode(&self) -> OperationMode {
        OperationMode::from_bits(self.mode.load(Ordering::Acquire))
    }

    pub(crate) fn set_mode(&self, mode: OperationMode) {
        self.mode.store(mode.to_bits(), Ordering::Release);
    }

    /// Latest filtered distance to whatever is in front, cm
    pub fn front_distance(&self) -> f32 {
        f32::from_bits(self.front_distance.load(Ordering::Acquire))
    }

    pub(crate) fn set_front_distance(&self, distance: f32) {
        self.front_distance.store(distance.to_bits(), Ordering::Release);
    }

    /// Latest stick position as (x, y)
    pub fn remote_position(&self) -> (f32, f32) {
        self.remote_position.lock(|position| position.get())
    }

    pub(crate) fn set_remote_position(&self, x: f32, y: f32) {
        self.remote_position.lock(|position| position.set((x, y)));
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_off_and_centered() {
        let state = SharedState::new();
        assert_eq!(state.mode(), OperationMode::Off);
        assert_eq!(state.remote_position(), (0.0, 0.0));
        assert_eq!(state.front_distance(), 0.0);
    }

    #[test]
    fn fields_round_trip() {
        let state = SharedState::new();
        state.set_mode(OperationMode::Autonomous);
        state.set_front_distance(17.25);
        state.set_remote_position(-30.0, 45.5);
        assert_eq!(state.mode(), OperationMode::Autonomous);
        assert_eq!(state.front_distance(), 17.25);
        assert_eq!(state.remote_position(), (-30.0, 45.5));
    }

    #[test]
    fn mode_parses_from_transport_strings() {
        assert_eq!("manual".parse::<OperationMode>(), Ok(OperationMode::Manual));
        assert_eq!("autonomous".parse::<OperationMode>(), Ok(OperationMode::Autonomous));
        assert_eq!("off".parse::<OperationMode>(), Ok(OperationMode::Off));
        assert_eq!(
            "Manual".parse::<OperationMode>(),
            Err(ParseError::UnknownMode)
        );
    }
}
