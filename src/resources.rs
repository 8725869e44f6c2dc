//! Hardware Resource Management
//!
//! Assigns the RP2350's pins and PWM slices to the firmware's subsystems, so
//! each one owns its hardware exclusively.
//!
//! # Resource Groups
//! - Range Sensor: HC-SR04 trigger and echo pins
//! - Motor Control: TB6612FNG standby pin plus direction pins and PWM slice
//!   for each motor

use assign_resources::assign_resources;
use embassy_rp::peripherals;

assign_resources! {
    /// HC-SR04 ultrasonic distance sensor pins
    range_sensor: RangeSensorResources {
        trigger_pin: PIN_15,
        echo_pin: PIN_14,
    },
    /// TB6612FNG dual motor driver pins and PWM channels
    motor_driver: MotorDriverResources {
        standby_pin: PIN_22,
        // Left motor: BIN1/BIN2 and PWMB
        left_slice: PWM_SLICE6,
        left_pwm_pin: PIN_28,
        left_in1_pin: PIN_21,
        left_in2_pin: PIN_20,
        // Right motor: AIN1/AIN2 and PWMA
        right_slice: PWM_SLICE5,
        right_pwm_pin: PIN_27,
        right_in1_pin: PIN_19,
        right_in2_pin: PIN_18,
    },
}
