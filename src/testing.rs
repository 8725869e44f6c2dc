//! Host-side stand-ins for the HAL pins used in unit tests

use std::cell::Cell;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, ErrorType as DigitalErrorType, OutputPin};
use embedded_hal::pwm::{self, ErrorType as PwmErrorType, SetDutyCycle};

/// Full-scale duty of [`FakePwm`], one count per 0.1 %
pub const FAKE_PWM_MAX: u16 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FakeError;

impl digital::Error for FakeError {
    fn kind(&self) -> digital::ErrorKind {
        digital::ErrorKind::Other
    }
}

impl pwm::Error for FakeError {
    fn kind(&self) -> pwm::ErrorKind {
        pwm::ErrorKind::Other
    }
}

/// Output pin whose level stays observable after it is moved into a driver
#[derive(Debug, Clone, Default)]
pub struct FakePin {
    high: Rc<Cell<bool>>,
    writes: Rc<Cell<u32>>,
    fail: Rc<Cell<bool>>,
}

impl FakePin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_high(&self) -> bool {
        self.high.get()
    }

    pub fn writes(&self) -> u32 {
        self.writes.get()
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.set(fail);
    }

    fn write(&mut self, high: bool) -> Result<(), FakeError> {
        if self.fail.get() {
            return Err(FakeError);
        }
        self.high.set(high);
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }
}

impl DigitalErrorType for FakePin {
    type Error = FakeError;
}

impl OutputPin for FakePin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write(false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write(true)
    }
}

/// PWM channel recording the last duty written
#[derive(Debug, Clone, Default)]
pub struct FakePwm {
    duty: Rc<Cell<u16>>,
    fail: Rc<Cell<bool>>,
}

impl FakePwm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last duty cycle in percent
    pub fn percent(&self) -> f32 {
        self.duty.get() as f32 * 100.0 / FAKE_PWM_MAX as f32
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.set(fail);
    }
}

impl PwmErrorType for FakePwm {
    type Error = FakeError;
}

impl SetDutyCycle for FakePwm {
    fn max_duty_cycle(&self) -> u16 {
        FAKE_PWM_MAX
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        if self.fail.get() {
            return Err(FakeError);
        }
        self.duty.set(duty);
        Ok(())
    }
}

/// Delay that returns immediately
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

/// Handles onto one motor's pins, kept by the test after the pins are moved
#[derive(Debug, Clone)]
pub struct MotorProbe {
    pub in1: FakePin,
    pub in2: FakePin,
    pub pwm: FakePwm,
}

impl MotorProbe {
    pub fn new() -> Self {
        Self {
            in1: FakePin::new(),
            in2: FakePin::new(),
            pwm: FakePwm::new(),
        }
    }

    /// Direction pin levels as (in1, in2)
    pub fn pins(&self) -> (bool, bool) {
        (self.in1.is_high(), self.in2.is_high())
    }

    pub fn set_failing(&self, fail: bool) {
        self.in1.set_failing(fail);
        self.in2.set_failing(fail);
        self.pwm.set_failing(fail);
    }
}
