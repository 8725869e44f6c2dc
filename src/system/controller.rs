//! Controller
//!
//! Owns both motors and the shared state, and is the only way anything drives
//! the motors.
//!
//! # Mode Gate
//! Every motor command names the mode it was computed for. The controller
//! holds the motor lock while it compares that mode with the current one, and
//! mode changes take the same lock, so a command computed for a mode that has
//! just been left is never applied. Manual and autonomous paths can run
//! side by side without fighting over the motors.
//!
//! # Manual Driving
//! The stick position is mixed into left/right targets:
//! ```text
//! left  = clamp(y + x/2, -100, 100)
//! right = clamp(y - x/2, -100, 100)
//! ```
//! Targets inside the dead-zone (|t| < 7 left, < 10 right) coast that motor,
//! anything else is approached through the motor's [`SpeedRamp`], one step
//! per control tick. Stick events only move the ramp targets.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;

use crate::system::drive_command::{DriveCommand, SideCommand};
use crate::system::event::RemoteEvent;
use crate::system::motor::{MotorDirection, MotorDrive, MotorError, MAX_SPEED, MIN_SPEED};
use crate::system::speed_ramp::{SpeedRamp, DEFAULT_RAMP_STEP, IMMEDIATE_RAMP_STEP};
use crate::system::state::{OperationMode, SharedState};

/// Stick x deflection is divided by this before mixing
const X_FACTOR: f32 = 2.0;

/// Runtime tunables
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControllerConfig {
    /// Left targets with a smaller magnitude coast the motor
    pub left_dead_zone: f32,
    /// Right targets with a smaller magnitude coast the motor
    pub right_dead_zone: f32,
    /// Largest speed change per command
    pub ramp_step: f32,
}

impl ControllerConfig {
    /// Jump straight to each target instead of ramping
    pub const fn immediate() -> Self {
        Self {
            ramp_step: IMMEDIATE_RAMP_STEP,
            ..Self::DEFAULT
        }
    }

    const DEFAULT: Self = Self {
        left_dead_zone: 7.0,
        right_dead_zone: 10.0,
        ramp_step: DEFAULT_RAMP_STEP,
    };
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Outward view of the controller for the remote transport
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Snapshot {
    pub left_speed: f32,
    pub right_speed: f32,
    pub front_distance: f32,
    pub mode: OperationMode,
}

/// Left and right targets for a stick position, before the dead-zone
pub fn mix(x: f32, y: f32) -> (f32, f32) {
    let left = (y + x / X_FACTOR).clamp(MIN_SPEED, MAX_SPEED);
    let right = (y - x / X_FACTOR).clamp(MIN_SPEED, MAX_SPEED);
    (left, right)
}

/// Motor command for a stick position in manual mode
pub fn manual_command(x: f32, y: f32, config: &ControllerConfig) -> DriveCommand {
    let (left, right) = mix(x, y);
    DriveCommand::new(
        dead_zone(left, config.left_dead_zone),
        dead_zone(right, config.right_dead_zone),
    )
}

fn dead_zone(target: f32, threshold: f32) -> SideCommand {
    if libm::fabsf(target) < threshold {
        SideCommand::Stop
    } else {
        SideCommand::Drive(target)
    }
}

/// One motor and its ramp
struct Track<P, W> {
    motor: MotorDrive<P, W>,
    ramp: SpeedRamp,
}

impl<P, W> Track<P, W>
where
    P: OutputPin,
    W: SetDutyCycle,
{
    /// Applies one side's command
    ///
    /// `Drive` only retargets the ramp unless `step` is set, in which case the
    /// motor also moves one ramp step. `Stop` and `Brake` always act at once.
    fn apply(&mut self, command: SideCommand, step: bool) -> Result<(), MotorError> {
        match command {
            SideCommand::Drive(target) => {
                self.ramp.set_target(target);
                if step {
                    let current = self.motor.current_speed();
                    let next = self.ramp.next(current);
                    if next != current {
                        self.motor.set_speed(next)?;
                    }
                }
            }
            SideCommand::Stop => {
                self.ramp.set_target(0.0);
                if self.motor.direction() != MotorDirection::Coast {
                    self.motor.stop()?;
                }
            }
            SideCommand::Brake => {
                self.ramp.set_target(0.0);
                if self.motor.direction() != MotorDirection::Brake {
                    self.motor.brake()?;
                }
            }
        }
        Ok(())
    }
}

struct Tracks<P, W> {
    left: Track<P, W>,
    right: Track<P, W>,
}

/// Shared controller for both motors
pub struct Controller<P, W> {
    tracks: Mutex<CriticalSectionRawMutex, Tracks<P, W>>,
    state: SharedState,
    config: ControllerConfig,
}

impl<P, W> Controller<P, W>
where
    P: OutputPin,
    W: SetDutyCycle,
{
    /// Starts in `Off` mode with the stick centered
    pub fn new(
        left: MotorDrive<P, W>,
        right: MotorDrive<P, W>,
        config: ControllerConfig,
    ) -> Self {
        Self {
            tracks: Mutex::new(Tracks {
                left: Track {
                    motor: left,
                    ramp: SpeedRamp::new(config.ramp_step),
                },
                right: Track {
                    motor: right,
                    ramp: SpeedRamp::new(config.ramp_step),
                },
            }),
            state: SharedState::new(),
            config,
        }
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Applies one remote event
    ///
    /// In manual mode a stick move retargets both ramps right away and coasts
    /// any side that fell into its dead-zone. Speed itself only changes on
    /// control ticks.
    pub async fn update_state(&self, event: RemoteEvent) -> Result<(), MotorError> {
        match event {
            RemoteEvent::Position { x, y } => {
                self.apply_position(x, y).await?;
                self.retarget_manual().await?;
            }
            RemoteEvent::Mode(mode) => self.apply_mode(mode).await,
        }
        Ok(())
    }

    /// Stores the stick position
    ///
    /// A centered stick stops the left motor on the spot, whatever the mode.
    pub async fn apply_position(&self, x: f32, y: f32) -> Result<(), MotorError> {
        self.state.set_remote_position(x, y);
        if x == 0.0 && y == 0.0 {
            let mut tracks = self.tracks.lock().await;
            tracks.left.ramp.set_target(0.0);
            tracks.left.motor.stop()?;
        }
        Ok(())
    }

    /// Switches mode. The motors are left as they are; the next tick of the
    /// new mode decides what they do.
    pub async fn apply_mode(&self, mode: OperationMode) {
        let _tracks = self.tracks.lock().await;
        let previous = self.state.mode();
        if previous != mode {
            info!("Mode {} -> {}", previous, mode);
            self.state.set_mode(mode);
        }
    }

    /// Re-derives motor commands from the stored stick position and moves
    /// each motor one ramp step
    ///
    /// Returns `Ok(false)` without touching the motors unless in manual mode.
    pub async fn recompute_manual(&self) -> Result<bool, MotorError> {
        let (x, y) = self.state.remote_position();
        let command = manual_command(x, y, &self.config);
        self.gated(OperationMode::Manual, command, true).await
    }

    /// Like [`Self::recompute_manual`] but without the ramp step
    pub async fn retarget_manual(&self) -> Result<bool, MotorError> {
        let (x, y) = self.state.remote_position();
        let command = manual_command(x, y, &self.config);
        self.gated(OperationMode::Manual, command, false).await
    }

    /// Periodic re-evaluation for the modes that are driven from the stick
    /// position. Autonomous mode is left to its own worker.
    pub async fn control_tick(&self) -> Result<bool, MotorError> {
        match self.state.mode() {
            OperationMode::Manual => self.recompute_manual().await,
            OperationMode::Off => {
                let coast = DriveCommand::coast();
                self.drive_as(OperationMode::Off, coast).await
            }
            OperationMode::Autonomous => Ok(false),
        }
    }

    /// Applies one tick of `command` if `mode` is still the active mode
    ///
    /// Returns whether the command was applied.
    pub async fn drive_as(
        &self,
        mode: OperationMode,
        command: DriveCommand,
    ) -> Result<bool, MotorError> {
        self.gated(mode, command, true).await
    }

    async fn gated(
        &self,
        mode: OperationMode,
        command: DriveCommand,
        step: bool,
    ) -> Result<bool, MotorError> {
        let mut tracks = self.tracks.lock().await;
        if self.state.mode() != mode {
            return Ok(false);
        }
        tracks.left.apply(command.left, step)?;
        tracks.right.apply(command.right, step)?;
        Ok(true)
    }

    pub async fn snapshot(&self) -> Snapshot {
        let tracks = self.tracks.lock().await;
        Snapshot {
            left_speed: tracks.left.motor.current_speed(),
            right_speed: tracks.right.motor.current_speed(),
            front_distance: self.state.front_distance(),
            mode: self.state.mode(),
        }
    }
}
