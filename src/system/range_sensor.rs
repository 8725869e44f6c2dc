//! Ultrasonic Range Sensor
//!
//! HC-SR04 style ranging split between interrupt context and a worker.
//!
//! # Measurement Cycle
//! 1. [`RangeSensor::trigger`] pulses the trigger pin for 10 µs (idle → triggered)
//! 2. Echo pin rises: the edge is timestamped and queued (triggered → reading)
//! 3. Echo pin falls: the pulse width gives the round-trip time (reading → idle)
//!
//! Distance is `pulse_width_us / 58` cm. Each sample goes through a
//! [`RangeFilter`] and the median is what gets published.
//!
//! # Interrupt Hand-off
//! [`EdgeQueue::on_edge`] is the only thing that runs in interrupt context. It
//! does a non-blocking enqueue and nothing else; when the queue is full the new
//! edge is dropped and counted. The worker then sees an incomplete cycle and
//! the state machine resets itself.
//!
//! # Error Handling
//! - Edges out of order reset the state to idle without a sample
//! - A trigger while a cycle is still open counts as a missed reading and resets
//!   to idle, so the following trigger starts cleanly
//! - A failing trigger pin is returned to the caller

use core::fmt;
use core::sync::atomic::{AtomicU32, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, OutputPin};

use crate::system::hardware::Edge;
use crate::system::range_filter::RangeFilter;

/// Round-trip time of sound per centimeter of distance
pub const CM_ROUNDTRIP_US: f32 = 58.0;

/// Width of the trigger pulse
pub const TRIGGER_PULSE_US: u32 = 10;

/// Edges the hand-off queue holds
pub const EDGE_QUEUE_CAPACITY: usize = 3;

/// Log one of every N samples
const LOG_EVERY: u32 = 10;

/// Where the sensor is in its measurement cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorState {
    Idle,
    /// Trigger pulse sent, waiting for the echo to rise
    Triggered,
    /// Echo high, waiting for it to fall
    Reading,
}

/// Timestamped echo-pin transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EdgeEvent {
    pub edge: Edge,
    pub timestamp_us: i64,
}

/// One completed measurement
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reading {
    /// Distance from this echo alone, cm
    pub raw: f32,
    /// Median over the last three echoes, cm
    pub filtered: f32,
}

/// Trigger pin write failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TriggerError(pub digital::ErrorKind);

impl fmt::Display for TriggerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "trigger pin write failed: {:?}", self.0)
    }
}

/// Bounded queue carrying echo edges out of interrupt context
pub struct EdgeQueue {
    channel: Channel<CriticalSectionRawMutex, EdgeEvent, EDGE_QUEUE_CAPACITY>,
    dropped: AtomicU32,
}

impl EdgeQueue {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
            dropped: AtomicU32::new(0),
        }
    }

    /// Records an edge. Never blocks; returns false if the edge was dropped.
    pub fn on_edge(&self, edge: Edge, timestamp_us: i64) -> bool {
        match self.channel.try_send(EdgeEvent { edge, timestamp_us }) {
            Ok(()) => true,
            Err(_) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Waits for the next edge
    pub async fn receive(&self) -> EdgeEvent {
        self.channel.receive().await
    }

    /// Edges dropped since boot
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Default for EdgeQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Measurement state machine for one sensor
pub struct RangeSensor<T, D> {
    trigger: T,
    delay: D,
    state: SensorState,
    pulse_start: i64,
    filter: RangeFilter,
    samples: u32,
    missed: u32,
}

impl<T, D> RangeSensor<T, D>
where
    T: OutputPin,
    D: DelayNs,
{
    /// Takes the trigger pin and drives it low
    pub fn new(mut trigger: T, delay: D) -> Result<Self, TriggerError> {
        trigger.set_low().map_err(trigger_error)?;
        Ok(Self {
            trigger,
            delay,
            state: SensorState::Idle,
            pulse_start: 0,
            filter: RangeFilter::new(),
            samples: 0,
            missed: 0,
        })
    }

    /// Starts a measurement if the previous one finished
    ///
    /// Returns `Ok(false)` when the cycle was skipped.
    pub fn trigger(&mut self) -> Result<bool, TriggerError> {
        if self.state != SensorState::Idle {
            self.missed = self.missed.saturating_add(1);
            warn!(
                "Sensor is not idle, skipping read. State: {} ({} missed)",
                self.state,
                self.missed
            );
            self.state = SensorState::Idle;
            return Ok(false);
        }

        self.trigger.set_high().map_err(trigger_error)?;
        self.delay.delay_us(TRIGGER_PULSE_US);
        self.trigger.set_low().map_err(trigger_error)?;
        self.state = SensorState::Triggered;
        Ok(true)
    }

    /// Advances the state machine with one echo edge
    ///
    /// Returns a reading when the edge closes a rising/falling pair.
    pub fn handle_edge(&mut self, event: EdgeEvent) -> Option<Reading> {
        match (event.edge, self.state) {
            (Edge::Rising, SensorState::Triggered) => {
                self.state = SensorState::Reading;
                self.pulse_start = event.timestamp_us;
                None
            }
            (Edge::Falling, SensorState::Reading) => {
                self.state = SensorState::Idle;
                let elapsed = event.timestamp_us - self.pulse_start;
                if elapsed < 0 {
                    return None;
                }
                let raw = elapsed as f32 / CM_ROUNDTRIP_US;
                self.filter.push(raw);
                let filtered = self.filter.median();

                self.samples = self.samples.wrapping_add(1);
                if self.samples % LOG_EVERY == 0 {
                    debug!("Raw: {} Running median: {}", raw, filtered);
                }
                Some(Reading { raw, filtered })
            }
            _ => {
                trace!("edge {} while {}, resetting", event.edge, self.state);
                self.state = SensorState::Idle;
                None
            }
        }
    }

    pub fn state(&self) -> SensorState {
        self.state
    }

    /// Triggers skipped because a cycle was still open
    pub fn missed_readings(&self) -> u32 {
        self.missed
    }

    pub fn filter(&self) -> &RangeFilter {
        &self.filter
    }
}

fn trigger_error<E: digital::Error>(e: E) -> TriggerError {
    TriggerError(e.kind())
}
