//! Distance measurement workers
//!
//! Two workers share one [`RangeSensor`]:
//! - [`trigger_readings`] starts a measurement every 100 ms
//! - [`distance_measure`] consumes echo edges handed off by the interrupt and
//!   publishes the filtered distance
//!
//! The distance worker is the only writer of the front distance.

use core::convert::Infallible;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use embassy_time::{Duration, Ticker};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::system::range_sensor::{EdgeEvent, EdgeQueue, RangeSensor, Reading, TriggerError};
use crate::system::state::SharedState;

/// Time between trigger pulses
pub const MEASUREMENT_INTERVAL: Duration = Duration::from_millis(100);

/// Sensor shared between the trigger and distance workers
pub type SharedSensor<T, D> = Mutex<CriticalSectionRawMutex, RangeSensor<T, D>>;

/// Trigger worker
///
/// Ends only if the trigger pin fails.
pub async fn trigger_readings<T, D>(
    sensor: &SharedSensor<T, D>,
) -> Result<Infallible, TriggerError>
where
    T: OutputPin,
    D: DelayNs,
{
    info!("Distance trigger started");
    let mut ticker = Ticker::every(MEASUREMENT_INTERVAL);
    loop {
        ticker.next().await;
        sensor.lock().await.trigger()?;
    }
}

/// Distance worker
pub async fn distance_measure<T, D>(
    sensor: &SharedSensor<T, D>,
    edges: &EdgeQueue,
    state: &SharedState,
) -> !
where
    T: OutputPin,
    D: DelayNs,
{
    info!("Distance measurement started");
    loop {
        let event = edges.receive().await;
        process_edge(sensor, event, state).await;
    }
}

/// Feeds one edge to the sensor and publishes any completed reading
pub async fn process_edge<T, D>(
    sensor: &SharedSensor<T, D>,
    event: EdgeEvent,
    state: &SharedState,
) -> Option<Reading>
where
    T: OutputPin,
    D: DelayNs,
{
    let reading = sensor.lock().await.handle_edge(event);
    if let Some(reading) = reading {
        state.set_front_distance(reading.filtered);
    }
    reading
}
