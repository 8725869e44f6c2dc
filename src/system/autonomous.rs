//! Autonomous Behavior
//!
//! Obstacle avoidance as a two-phase timed state machine.
//!
//! # Phases
//! - **Forward motion**: both motors at 40. An obstruction closer than 60 cm
//!   starts a backward turn; 3 s without one starts a forward turn, so the
//!   robot does not run straight forever.
//! - **Turning**: one randomly chosen motor at ±50, the other coasting. After
//!   1.5 s, and only once the path is clear, back to forward motion.
//!
//! The state machine only computes commands. The caller decides whether
//! autonomous mode is active and applies them.

use nanorand::{Rng, WyRand};

use crate::system::drive_command::{DriveCommand, SideCommand};
use crate::system::motor::Side;

/// Anything closer than this (cm) blocks the way
pub const OBSTRUCTION_DISTANCE: f32 = 60.0;
/// Speed of both motors while driving forward
pub const CRUISE_SPEED: f32 = 40.0;
/// Speed of the turning motor
pub const TURN_SPEED: f32 = 50.0;
/// Forward motion without an obstruction before turning anyway
pub const BOREDOM_TIMEOUT_US: i64 = 3_000_000;
/// Minimum time spent turning
pub const TURN_DURATION_US: i64 = 1_500_000;

/// Which phase the behavior is in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    ForwardMotion,
    Turning,
}

/// Why a turn was started
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TurnKind {
    /// Obstruction ahead: pivot backward, away from it
    Backward,
    /// Boredom: pivot forward onto a new heading
    Forward,
}

/// Obstacle avoidance state machine
pub struct AutonomousBehavior {
    phase: Phase,
    entered_at: i64,
    command: DriveCommand,
    rng: WyRand,
}

impl AutonomousBehavior {
    /// Seed picks the sequence of turn sides
    pub fn new(seed: u64) -> Self {
        Self {
            phase: Phase::ForwardMotion,
            entered_at: 0,
            command: DriveCommand::straight(CRUISE_SPEED),
            rng: WyRand::new_seed(seed),
        }
    }

    /// (Re)enters forward motion, e.g. when autonomous mode is switched on
    pub fn start(&mut self, now_us: i64) -> DriveCommand {
        self.enter_forward(now_us);
        self.command
    }

    /// Advances by one control tick and returns the command to apply
    pub fn tick(&mut self, now_us: i64, front_distance: f32) -> DriveCommand {
        let obstructed = front_distance < OBSTRUCTION_DISTANCE;
        let in_phase = now_us - self.entered_at;

        match self.phase {
            Phase::ForwardMotion => {
                if obstructed {
                    info!("Obstruction at {} cm, turning away", front_distance);
                    self.enter_turn(now_us, TurnKind::Backward);
                } else if in_phase >= BOREDOM_TIMEOUT_US {
                    info!("No obstruction for a while, turning");
                    self.enter_turn(now_us, TurnKind::Forward);
                }
            }
            Phase::Turning => {
                if in_phase >= TURN_DURATION_US && !obstructed {
                    self.enter_forward(now_us);
                }
            }
        }
        self.command
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Command of the current phase
    pub fn command(&self) -> DriveCommand {
        self.command
    }

    fn enter_forward(&mut self, now_us: i64) {
        info!("Autonomous: forward motion");
        self.phase = Phase::ForwardMotion;
        self.entered_at = now_us;
        self.command = DriveCommand::straight(CRUISE_SPEED);
    }

    fn enter_turn(&mut self, now_us: i64, kind: TurnKind) {
        let side = if self.rng.generate_range(0_u8..2) == 0 {
            Side::Left
        } else {
            Side::Right
        };
        let speed = match kind {
            TurnKind::Backward => -TURN_SPEED,
            TurnKind::Forward => TURN_SPEED,
        };
        info!("Autonomous: {} turn on {} motor", kind, side);

        self.phase = Phase::Turning;
        self.entered_at = now_us;
        self.command = match side {
            Side::Left => DriveCommand::new(SideCommand::Drive(speed), SideCommand::Stop),
            Side::Right => DriveCommand::new(SideCommand::Stop, SideCommand::Drive(speed)),
        };
    }
}
