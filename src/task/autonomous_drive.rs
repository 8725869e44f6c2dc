//! Autonomous drive
//!
//! Runs the obstacle avoidance state machine every 10 ms while the robot is in
//! autonomous mode. Entering the mode always starts with forward motion; in any
//! other mode the worker only keeps time.

use core::convert::Infallible;

use embassy_time::{Duration, Ticker};
use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;

use crate::system::autonomous::AutonomousBehavior;
use crate::system::controller::Controller;
use crate::system::hardware::now_micros;
use crate::system::motor::MotorError;
use crate::system::state::OperationMode;

/// Autonomous loop period
pub const AUTONOMOUS_TICK: Duration = Duration::from_millis(10);

/// Tracks whether autonomous mode was active on the previous tick
pub struct AutonomousDriver {
    behavior: Option<AutonomousBehavior>,
    active: bool,
}

impl AutonomousDriver {
    /// The turn-side generator is seeded with the time of first activation
    pub const fn new() -> Self {
        Self {
            behavior: None,
            active: false,
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            behavior: Some(AutonomousBehavior::new(seed)),
            active: false,
        }
    }

    /// One tick. Returns whether a command reached the motors.
    pub async fn step<P, W>(
        &mut self,
        controller: &Controller<P, W>,
        now_us: i64,
    ) -> Result<bool, MotorError>
    where
        P: OutputPin,
        W: SetDutyCycle,
    {
        let state = controller.state();
        if state.mode() != OperationMode::Autonomous {
            self.active = false;
            return Ok(false);
        }

        let behavior = self
            .behavior
            .get_or_insert_with(|| AutonomousBehavior::new(now_us as u64));
        let command = if self.active {
            behavior.tick(now_us, state.front_distance())
        } else {
            self.active = true;
            behavior.start(now_us)
        };
        controller.drive_as(OperationMode::Autonomous, command).await
    }
}

impl Default for AutonomousDriver {
    fn default() -> Self {
        Self::new()
    }
}

/// Ends only if a motor write fails.
pub async fn autonomous_drive<P, W>(controller: &Controller<P, W>) -> Result<Infallible, MotorError>
where
    P: OutputPin,
    W: SetDutyCycle,
{
    info!("Autonomous drive started");
    let mut driver = AutonomousDriver::new();
    let mut ticker = Ticker::every(AUTONOMOUS_TICK);
    loop {
        ticker.next().await;
        driver.step(controller, now_micros()).await?;
    }
}
