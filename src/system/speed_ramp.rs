//! Speed Ramp
//!
//! Limits how far a motor's commanded speed may move per control tick, so a
//! full-stick input turns into a linear ramp instead of a current spike.

use crate::system::motor::{MAX_SPEED, MIN_SPEED};

/// Default change per 10 ms tick (0 to full speed in one second)
pub const DEFAULT_RAMP_STEP: f32 = 1.0;

/// A step wide enough to cross the whole speed domain in one tick
pub const IMMEDIATE_RAMP_STEP: f32 = MAX_SPEED - MIN_SPEED;

/// Per-motor target and step size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedRamp {
    step: f32,
    target: f32,
}

impl SpeedRamp {
    pub const fn new(step: f32) -> Self {
        Self { step, target: 0.0 }
    }

    /// NaN reads as a stop
    pub fn set_target(&mut self, target: f32) {
        self.target = if target.is_nan() {
            0.0
        } else {
            target.clamp(MIN_SPEED, MAX_SPEED)
        };
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    /// Speed to command this tick, moving `current` toward the target
    ///
    /// Lands exactly on the target instead of stepping past it.
    pub fn next(&self, current: f32) -> f32 {
        let delta = self.target - current;
        if libm::fabsf(delta) <= self.step {
            self.target
        } else if delta > 0.0 {
            current + self.step
        } else {
            current - self.step
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ramps_linearly_then_lands_on_target() {
        let mut ramp = SpeedRamp::new(1.0);
        ramp.set_target(3.5);
        let mut speed = 0.0;
        let mut seen = [0.0; 4];
        for slot in seen.iter_mut() {
            speed = ramp.next(speed);
            *slot = speed;
        }
        assert_eq!(seen, [1.0, 2.0, 3.0, 3.5]);
        assert_eq!(ramp.next(speed), 3.5);
    }

    #[test]
    fn ramps_down_through_zero() {
        let mut ramp = SpeedRamp::new(10.0);
        ramp.set_target(-15.0);
        assert_eq!(ramp.next(10.0), 0.0);
        assert_eq!(ramp.next(0.0), -10.0);
        assert_eq!(ramp.next(-10.0), -15.0);
    }

    #[test]
    fn decelerates_toward_smaller_positive_target() {
        let mut ramp = SpeedRamp::new(5.0);
        ramp.set_target(20.0);
        assert_eq!(ramp.next(50.0), 45.0);
    }

    #[test]
    fn immediate_step_jumps() {
        let mut ramp = SpeedRamp::new(IMMEDIATE_RAMP_STEP);
        ramp.set_target(-100.0);
        assert_eq!(ramp.next(100.0), -100.0);
    }

    #[test]
    fn target_is_clamped() {
        let mut ramp = SpeedRamp::new(1.0);
        ramp.set_target(250.0);
        assert_eq!(ramp.target(), MAX_SPEED);
    }

    #[test]
    fn nan_target_ramps_to_stop() {
        let mut ramp = SpeedRamp::new(1.0);
        ramp.set_target(f32::NAN);
        assert_eq!(ramp.target(), 0.0);
        assert_eq!(ramp.next(0.0), 0.0);
        assert_eq!(ramp.next(-100.0), -99.0);
    }
}
