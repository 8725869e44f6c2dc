//! Drive control tick
//!
//! Re-evaluates the motors every 10 ms from the stored stick position:
//! mixing in manual mode, coasting in off mode. Autonomous mode belongs to
//! the autonomous worker.

use core::convert::Infallible;

use embassy_time::{Duration, Ticker};
use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;

use crate::system::controller::Controller;
use crate::system::motor::MotorError;

/// Control loop period
pub const CONTROL_TICK: Duration = Duration::from_millis(10);

/// Log the stick position every N ticks
const LOG_EVERY_TICKS: u32 = 50;

/// Ends only if a motor write fails.
pub async fn drive<P, W>(controller: &Controller<P, W>) -> Result<Infallible, MotorError>
where
    P: OutputPin,
    W: SetDutyCycle,
{
    info!("Drive control started");
    let mut ticker = Ticker::every(CONTROL_TICK);
    let mut tick_n: u32 = 0;
    loop {
        ticker.next().await;
        tick_n = tick_n.wrapping_add(1);
        if tick_n % LOG_EVERY_TICKS == 0 {
            let (x, y) = controller.state().remote_position();
            debug!("Current state: x = {}, y = {}", x, y);
        }
        controller.control_tick().await?;
    }
}
