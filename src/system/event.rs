//! Remote Events
//!
//! Values handed over by the remote transport (already decoded) and the queue
//! that carries them to the orchestrator.
//!
//! # Queue Behavior
//! - Capacity of 3 events, single consumer
//! - [`RemoteEventQueue::send`] waits at most 10 ms for room, then drops
//! - [`RemoteEventQueue::try_send`] drops immediately when full
//! - Every drop is counted and reported back to the producer
//!
//! # Boundary Validation
//! Strings and numbers from the transport are checked here, before an event
//! exists. A rejected message never reaches the controller.

use core::fmt;
use core::str::FromStr;
use core::sync::atomic::{AtomicU32, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_time::{with_timeout, Duration};

use crate::system::motor::{MAX_SPEED, MIN_SPEED};
use crate::system::state::OperationMode;

/// Events the queue holds before producers start dropping
pub const REMOTE_QUEUE_CAPACITY: usize = 3;

/// How long [`RemoteEventQueue::send`] waits for room
pub const SEND_TIMEOUT: Duration = Duration::from_millis(10);

/// Input from the remote control
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RemoteEvent {
    /// Stick moved, each axis in [-100, 100]
    Position { x: f32, y: f32 },
    /// Operation mode selected
    Mode(OperationMode),
}

impl RemoteEvent {
    /// Stick position clamped to the valid range
    pub fn position(x: f32, y: f32) -> Result<Self, ParseError> {
        if x.is_nan() || y.is_nan() {
            return Err(ParseError::NotANumber);
        }
        Ok(Self::Position {
            x: x.clamp(MIN_SPEED, MAX_SPEED),
            y: y.clamp(MIN_SPEED, MAX_SPEED),
        })
    }

    /// Maps a d-pad press or release onto a stick position
    ///
    /// A press deflects that axis fully; any release recenters the stick.
    pub fn from_direction(direction: Direction, action: Action) -> Self {
        let (x, y) = match action {
            Action::End => (0.0, 0.0),
            Action::Start => match direction {
                Direction::Up => (0.0, MAX_SPEED),
                Direction::Down => (0.0, MIN_SPEED),
                Direction::Left => (MIN_SPEED, 0.0),
                Direction::Right => (MAX_SPEED, 0.0),
            },
        };
        Self::Position { x, y }
    }
}

/// D-pad button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl FromStr for Direction {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(Self::Up),
            "right" => Ok(Self::Right),
            "down" => Ok(Self::Down),
            "left" => Ok(Self::Left),
            _ => Err(ParseError::UnknownDirection),
        }
    }
}

/// D-pad press or release
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Action {
    Start,
    End,
}

impl FromStr for Action {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(Self::Start),
            "end" => Ok(Self::End),
            _ => Err(ParseError::UnknownAction),
        }
    }
}

/// Malformed input at the transport boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    UnknownMode,
    UnknownDirection,
    UnknownAction,
    NotANumber,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::UnknownMode => "unrecognized mode",
            Self::UnknownDirection => "unrecognized direction",
            Self::UnknownAction => "unrecognized action",
            Self::NotANumber => "stick axis is not a number",
        })
    }
}

/// The event was dropped because the queue stayed full
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct QueueFull;

impl fmt::Display for QueueFull {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("queue full, event dropped")
    }
}

/// Bounded queue from the transport to the orchestrator
pub struct RemoteEventQueue {
    channel: Channel<CriticalSectionRawMutex, RemoteEvent, REMOTE_QUEUE_CAPACITY>,
    dropped: AtomicU32,
}

impl RemoteEventQueue {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
            dropped: AtomicU32::new(0),
        }
    }

    /// Enqueues an event, giving up after [`SEND_TIMEOUT`]
    pub async fn send(&self, event: RemoteEvent) -> Result<(), QueueFull> {
        match with_timeout(SEND_TIMEOUT, self.channel.send(event)).await {
            Ok(()) => Ok(()),
            Err(_) => Err(self.record_drop()),
        }
    }

    /// Enqueues an event without waiting
    pub fn try_send(&self, event: RemoteEvent) -> Result<(), QueueFull> {
        self.channel.try_send(event).map_err(|_| self.record_drop())
    }

    /// Waits for the next event
    pub async fn receive(&self) -> RemoteEvent {
        self.channel.receive().await
    }

    /// Events dropped since boot
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn record_drop(&self) -> QueueFull {
        let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
        warn!("remote event dropped, queue full ({} total)", dropped);
        QueueFull
    }
}

impl Default for RemoteEventQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::block_on;

    #[test]
    fn position_is_clamped_at_the_boundary() {
        assert_eq!(
            RemoteEvent::position(150.0, -120.0),
            Ok(RemoteEvent::Position { x: 100.0, y: -100.0 })
        );
        assert_eq!(
            RemoteEvent::position(f32::NAN, 0.0),
            Err(ParseError::NotANumber)
        );
    }

    #[test]
    fn dpad_maps_to_full_deflection() {
        let up = RemoteEvent::from_direction(Direction::Up, Action::Start);
        assert_eq!(up, RemoteEvent::Position { x: 0.0, y: 100.0 });
        let left = RemoteEvent::from_direction(Direction::Left, Action::Start);
        assert_eq!(left, RemoteEvent::Position { x: -100.0, y: 0.0 });
        let released = RemoteEvent::from_direction(Direction::Right, Action::End);
        assert_eq!(released, RemoteEvent::Position { x: 0.0, y: 0.0 });
    }

    #[test]
    fn unknown_strings_are_rejected() {
        assert_eq!("down".parse::<Direction>(), Ok(Direction::Down));
        assert_eq!("north".parse::<Direction>(), Err(ParseError::UnknownDirection));
        assert_eq!("end".parse::<Action>(), Ok(Action::End));
        assert_eq!("hold".parse::<Action>(), Err(ParseError::UnknownAction));
    }

    #[test]
    fn full_queue_drops_newest_and_counts() {
        let queue = RemoteEventQueue::new();
        for mode in [
            OperationMode::Manual,
            OperationMode::Autonomous,
            OperationMode::Off,
        ] {
            queue.try_send(RemoteEvent::Mode(mode)).unwrap();
        }
        assert_eq!(
            queue.try_send(RemoteEvent::Mode(OperationMode::Manual)),
            Err(QueueFull)
        );
        assert_eq!(queue.dropped(), 1);

        // Oldest is still delivered first, newest was the one lost
        let first = block_on(queue.receive());
        assert_eq!(first, RemoteEvent::Mode(OperationMode::Manual));
    }

    #[test]
    fn send_times_out_instead_of_blocking() {
        let queue = RemoteEventQueue::new();
        block_on(async {
            for _ in 0..REMOTE_QUEUE_CAPACITY {
                queue.send(RemoteEvent::Mode(OperationMode::Off)).await.unwrap();
            }
            let result = queue.send(RemoteEvent::Mode(OperationMode::Manual)).await;
            assert_eq!(result, Err(QueueFull));
        });
        assert_eq!(queue.dropped(), 1);
    }
}
