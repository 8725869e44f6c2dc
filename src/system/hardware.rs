//! Hardware contract
//!
//! The core never talks to registers. It drives pins through `embedded-hal`:
//! - Direction and trigger pins: [`OutputPin`]
//! - Motor speed: [`SetDutyCycle`]
//! - Trigger pulse width: [`DelayNs`]
//!
//! Pin direction is fixed when the HAL pin is constructed, and the echo pin's
//! edge interrupt is owned by the HAL, which reports each edge to
//! [`EdgeQueue::on_edge`](crate::system::range_sensor::EdgeQueue::on_edge)
//! together with the level and a [`now_micros`] timestamp.

pub use embedded_hal::delay::DelayNs;
pub use embedded_hal::digital::OutputPin;
pub use embedded_hal::pwm::SetDutyCycle;

use embassy_time::Instant;

/// Microseconds since boot
pub fn now_micros() -> i64 {
    Instant::now().as_micros() as i64
}

/// Level transition seen on a digital input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Edge {
    /// Low to high
    Rising,
    /// High to low
    Falling,
}

impl Edge {
    /// Edge implied by the pin level read right after the transition
    pub fn from_level(is_high: bool) -> Self {
        if is_high {
            Self::Rising
        } else {
            Self::Falling
        }
    }
}
