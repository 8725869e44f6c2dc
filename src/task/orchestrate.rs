//! Orchestrator
//!
//! Sole consumer of the remote event queue and sole writer of the stick
//! position and operation mode.

use core::convert::Infallible;

use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;

use crate::system::controller::Controller;
use crate::system::event::RemoteEventQueue;
use crate::system::motor::MotorError;

/// Applies remote events in arrival order, waiting indefinitely for the next
///
/// Ends only if a motor write fails.
pub async fn orchestrate<P, W>(
    controller: &Controller<P, W>,
    events: &RemoteEventQueue,
) -> Result<Infallible, MotorError>
where
    P: OutputPin,
    W: SetDutyCycle,
{
    info!("Orchestrator started");
    loop {
        let event = events.receive().await;
        trace!("remote event {}", event);
        controller.update_state(event).await?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::controller::ControllerConfig;
    use crate::system::event::RemoteEvent;
    use crate::system::motor::MotorDrive;
    use crate::system::state::OperationMode;
    use crate::testing::MotorProbe;
    use embassy_futures::block_on;
    use embassy_futures::select::{select, Either};

    #[test]
    fn queued_events_are_applied_in_order() {
        let left = MotorProbe::new();
        let right = MotorProbe::new();
        let controller = Controller::new(
            MotorDrive::new(left.in1.clone(), left.in2.clone(), left.pwm.clone()).unwrap(),
            MotorDrive::new(right.in1.clone(), right.in2.clone(), right.pwm.clone()).unwrap(),
            ControllerConfig::immediate(),
        );
        let events = RemoteEventQueue::new();
        events.try_send(RemoteEvent::Mode(OperationMode::Manual)).unwrap();
        events.try_send(RemoteEvent::position(0.0, 500.0).unwrap()).unwrap();

        let outcome = block_on(select(
            orchestrate(&controller, &events),
            core::future::ready(()),
        ));
        assert!(matches!(outcome, Either::Second(())));

        assert_eq!(controller.state().mode(), OperationMode::Manual);
        assert_eq!(controller.state().remote_position(), (0.0, 100.0));

        block_on(controller.control_tick()).unwrap();
        assert_eq!(left.pwm.percent(), 100.0);
        assert_eq!(right.pwm.percent(), 100.0);
    }

    #[test]
    fn motor_failure_ends_the_worker() {
        let left = MotorProbe::new();
        let right = MotorProbe::new();
        let controller = Controller::new(
            MotorDrive::new(left.in1.clone(), left.in2.clone(), left.pwm.clone()).unwrap(),
            MotorDrive::new(right.in1.clone(), right.in2.clone(), right.pwm.clone()).unwrap(),
            ControllerConfig::immediate(),
        );
        left.set_failing(true);
        let events = RemoteEventQueue::new();
        events.try_send(RemoteEvent::Mode(OperationMode::Manual)).unwrap();
        // centered stick stops the left motor at once
        events.try_send(RemoteEvent::position(0.0, 0.0).unwrap()).unwrap();

        let outcome = block_on(select(
            orchestrate(&controller, &events),
            core::future::ready(()),
        ));
        assert!(matches!(outcome, Either::First(Err(_))));
    }
}
