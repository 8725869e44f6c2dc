//! Motor Drive
//!
//! One DC motor on a TB6612FNG-style H-bridge channel: two direction inputs
//! (IN1/IN2) and one PWM input.
//!
//! # Pin States
//! | IN1  | IN2  | PWM        | Result                   |
//! |------|------|------------|--------------------------|
//! | low  | high | duty       | forward                  |
//! | high | low  | duty       | reverse                  |
//! | low  | low  | 0          | coast (free spin)        |
//! | high | high | don't care | short brake              |
//!
//! Speed is a signed percentage in [-100, 100]; the sign selects the direction
//! pins and the magnitude becomes the duty cycle.

use core::fmt;

use embedded_hal::digital::{self, OutputPin};
use embedded_hal::pwm::{self, SetDutyCycle};

/// Full forward
pub const MAX_SPEED: f32 = 100.0;
/// Full reverse
pub const MIN_SPEED: f32 = -100.0;

/// Denominator for duty writes, giving 0.1 % resolution
const DUTY_SCALE: u16 = 1000;

/// Hardware write failure on a motor channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotorError {
    /// A direction pin could not be driven
    Direction(digital::ErrorKind),
    /// The PWM duty could not be set
    Pwm(pwm::ErrorKind),
}

impl fmt::Display for MotorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direction(kind) => write!(f, "direction pin write failed: {kind:?}"),
            Self::Pwm(kind) => write!(f, "pwm duty write failed: {kind:?}"),
        }
    }
}

/// Last state applied to the direction pins
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotorDirection {
    Forward,
    Reverse,
    /// Both pins low - freewheeling
    Coast,
    /// Both pins high - short circuit braking
    Brake,
}

/// Which side of the chassis a motor drives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Side {
    Left,
    Right,
}

/// One motor channel
///
/// `current_speed` only changes after every hardware write for that command
/// succeeded, so it always describes what the bridge is actually doing.
pub struct MotorDrive<P, W> {
    in1: P,
    in2: P,
    pwm: W,
    current_speed: f32,
    direction: MotorDirection,
}

impl<P, W> MotorDrive<P, W>
where
    P: OutputPin,
    W: SetDutyCycle,
{
    /// Takes ownership of the pins and leaves the motor coasting
    pub fn new(in1: P, in2: P, pwm: W) -> Result<Self, MotorError> {
        let mut motor = Self {
            in1,
            in2,
            pwm,
            current_speed: 0.0,
            direction: MotorDirection::Coast,
        };
        motor.stop()?;
        Ok(motor)
    }

    /// Drives at `speed` percent, negative for reverse
    ///
    /// # Panics
    /// If `speed` is outside [-100, 100] or NaN. Callers clamp before this.
    pub fn set_speed(&mut self, speed: f32) -> Result<(), MotorError> {
        assert!(
            (MIN_SPEED..=MAX_SPEED).contains(&speed),
            "motor speed out of range"
        );

        if speed >= 0.0 {
            self.set_pins(false, true)?;
            self.set_duty(speed)?;
            self.direction = MotorDirection::Forward;
        } else {
            self.set_pins(true, false)?;
            self.set_duty(-speed)?;
            self.direction = MotorDirection::Reverse;
        }
        self.current_speed = speed;
        Ok(())
    }

    /// Releases the motor to spin freely
    pub fn stop(&mut self) -> Result<(), MotorError> {
        self.set_pins(false, false)?;
        self.set_duty(0.0)?;
        self.direction = MotorDirection::Coast;
        self.current_speed = 0.0;
        Ok(())
    }

    /// Shorts the motor terminals for a hard stop
    pub fn brake(&mut self) -> Result<(), MotorError> {
        self.set_pins(true, true)?;
        self.direction = MotorDirection::Brake;
        self.current_speed = 0.0;
        Ok(())
    }

    pub fn current_speed(&self) -> f32 {
        self.current_speed
    }

    pub fn direction(&self) -> MotorDirection {
        self.direction
    }

    fn set_pins(&mut self, in1_high: bool, in2_high: bool) -> Result<(), MotorError> {
        write_pin(&mut self.in1, in1_high)?;
        write_pin(&mut self.in2, in2_high)
    }

    fn set_duty(&mut self, percent: f32) -> Result<(), MotorError> {
        let num = libm::roundf(percent * (DUTY_SCALE as f32 / 100.0)) as u16;
        self.pwm
            .set_duty_cycle_fraction(num.min(DUTY_SCALE), DUTY_SCALE)
            .map_err(|e| MotorError::Pwm(pwm::Error::kind(&e)))
    }
}

fn write_pin<P: OutputPin>(pin: &mut P, high: bool) -> Result<(), MotorError> {
    let result = if high { pin.set_high() } else { pin.set_low() };
    result.map_err(|e| MotorError::Direction(digital::Error::kind(&e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakePin, FakePwm, MotorProbe};

    fn motor(probe: &MotorProbe) -> MotorDrive<FakePin, FakePwm> {
        MotorDrive::new(probe.in1.clone(), probe.in2.clone(), probe.pwm.clone()).unwrap()
    }

    #[test]
    fn new_motor_is_coasting() {
        let probe = MotorProbe::new();
        let m = motor(&probe);
        assert_eq!(probe.pins(), (false, false));
        assert_eq!(probe.pwm.percent(), 0.0);
        assert_eq!(m.current_speed(), 0.0);
        assert_eq!(m.direction(), MotorDirection::Coast);
    }

    #[test]
    fn reverse_sets_pins_and_duty() {
        let probe = MotorProbe::new();
        let mut m = motor(&probe);
        m.set_speed(-60.0).unwrap();
        assert_eq!(probe.pins(), (true, false));
        assert_eq!(probe.pwm.percent(), 60.0);
        assert_eq!(m.current_speed(), -60.0);
        assert_eq!(m.direction(), MotorDirection::Reverse);
    }

    #[test]
    fn zero_speed_is_forward_with_no_duty() {
        let probe = MotorProbe::new();
        let mut m = motor(&probe);
        m.set_speed(-20.0).unwrap();
        m.set_speed(0.0).unwrap();
        assert_eq!(probe.pins(), (false, true));
        assert_eq!(probe.pwm.percent(), 0.0);
        assert_eq!(m.direction(), MotorDirection::Forward);
    }

    #[test]
    fn stop_and_brake_are_distinct() {
        let probe = MotorProbe::new();
        let mut m = motor(&probe);
        m.set_speed(75.0).unwrap();
        assert_eq!(probe.pwm.percent(), 75.0);

        m.brake().unwrap();
        assert_eq!(probe.pins(), (true, true));
        assert_eq!(m.current_speed(), 0.0);
        assert_eq!(m.direction(), MotorDirection::Brake);

        m.stop().unwrap();
        assert_eq!(probe.pins(), (false, false));
        assert_eq!(probe.pwm.percent(), 0.0);
        assert_eq!(m.direction(), MotorDirection::Coast);
    }

    #[test]
    fn failed_write_keeps_last_speed() {
        let probe = MotorProbe::new();
        let mut m = motor(&probe);
        m.set_speed(40.0).unwrap();

        probe.pwm.set_failing(true);
        let err = m.set_speed(80.0).unwrap_err();
        assert_eq!(err, MotorError::Pwm(pwm::ErrorKind::Other));
        assert_eq!(m.current_speed(), 40.0);

        probe.pwm.set_failing(false);
        probe.in1.set_failing(true);
        let err = m.stop().unwrap_err();
        assert_eq!(err, MotorError::Direction(digital::ErrorKind::Other));
        assert_eq!(m.current_speed(), 40.0);
    }

    #[test]
    #[should_panic(expected = "motor speed out of range")]
    fn out_of_range_speed_panics() {
        let probe = MotorProbe::new();
        let mut m = motor(&probe);
        let _ = m.set_speed(100.5);
    }
}
