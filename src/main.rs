//! Robot firmware entry point
//!
//! Binds the RP2350 pins to the control core and spawns its workers.

#![no_std]
#![no_main]

use defmt::{error, info};
use embassy_executor::{InterruptExecutor, SendSpawner, Spawner};
use embassy_rp::block::ImageDef;
use embassy_rp::config::Config;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::interrupt;
use embassy_rp::interrupt::{InterruptExt, Priority};
use embassy_rp::pwm::{self, Pwm};
use embassy_sync::mutex::Mutex;
use embassy_time::{Delay, Duration, Ticker};
use resources::{AssignedResources, MotorDriverResources, RangeSensorResources};
use rover_control::system::controller::{Controller, ControllerConfig};
use rover_control::system::event::RemoteEventQueue;
use rover_control::system::hardware::{now_micros, Edge};
use rover_control::system::motor::MotorDrive;
use rover_control::system::range_sensor::{EdgeQueue, RangeSensor};
use rover_control::task::autonomous_drive::autonomous_drive;
use rover_control::task::distance_measure::{
    distance_measure, trigger_readings, SharedSensor,
};
use rover_control::task::drive::drive;
use rover_control::task::orchestrate::orchestrate;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

/// Firmware image type for bootloader
#[link_section = ".start_block"]
#[used]
pub static IMAGE_DEF: ImageDef = ImageDef::secure_exe();

/// Pin assignments
mod resources;

type RoverController = Controller<Output<'static>, Pwm<'static>>;
type Sensor = SharedSensor<Output<'static>, Delay>;

/// Motor PWM frequency, cheap DC motors run better at lower frequencies
const MOTOR_PWM_FREQ_HZ: u32 = 10_000;

/// Interval of the status report
const REPORT_INTERVAL: Duration = Duration::from_secs(5);

/// Runs the echo watcher above the thread-mode workers, so edges are
/// timestamped at interrupt priority
static EXECUTOR_EDGE: InterruptExecutor = InterruptExecutor::new();

static EDGES: EdgeQueue = EdgeQueue::new();
static EVENTS: RemoteEventQueue = RemoteEventQueue::new();
static CONTROLLER: StaticCell<RoverController> = StaticCell::new();
static SENSOR: StaticCell<Sensor> = StaticCell::new();
static STANDBY: StaticCell<Output<'static>> = StaticCell::new();

/// What the remote transport talks to once the firmware is up
pub struct Handles {
    /// Stick and mode events go in here
    pub events: &'static RemoteEventQueue,
    /// Source of status snapshots
    pub controller: &'static RoverController,
}

#[interrupt]
unsafe fn SWI_IRQ_1() {
    EXECUTOR_EDGE.on_interrupt()
}

/// Firmware entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_rp::init(Config::default());

    // Split the resources into separate groups for each task
    let r = split_resources!(p);

    interrupt::SWI_IRQ_1.set_priority(Priority::P2);
    let edge_spawner = EXECUTOR_EDGE.start(interrupt::SWI_IRQ_1);

    let handles = init(spawner, edge_spawner, r.range_sensor, r.motor_driver);
    spawner.spawn(report(handles)).unwrap();
}

/// Brings up the motors and the range sensor and spawns every worker
///
/// Both motors start stopped and the robot starts in `Off` mode.
fn init(
    spawner: Spawner,
    edge_spawner: SendSpawner,
    sensor: RangeSensorResources,
    motor_driver: MotorDriverResources,
) -> Handles {
    let (left, right) = motors(motor_driver);
    let controller =
        CONTROLLER.init(Controller::new(left, right, ControllerConfig::default()));

    let trigger = Output::new(sensor.trigger_pin, Level::Low);
    let range_sensor = SENSOR.init(Mutex::new(RangeSensor::new(trigger, Delay).unwrap()));
    let echo = Input::new(sensor.echo_pin, Pull::Down);

    edge_spawner.spawn(echo_watch(echo)).unwrap();
    spawner.spawn(distance_task(range_sensor, controller)).unwrap();
    spawner.spawn(trigger_task(range_sensor)).unwrap();
    spawner.spawn(orchestrate_task(controller)).unwrap();
    spawner.spawn(drive_task(controller)).unwrap();
    spawner.spawn(autonomous_task(controller)).unwrap();

    info!("Rover control initialized");
    Handles {
        events: &EVENTS,
        controller,
    }
}

fn motor_pwm_config() -> pwm::Config {
    let clock_freq_hz = embassy_rp::clocks::clk_sys_freq(); // 150MHz

    // Calculate minimum divider needed to keep period under 16-bit limit (65535)
    let divider = ((clock_freq_hz / MOTOR_PWM_FREQ_HZ) / 65535 + 1) as u8;
    let period = (clock_freq_hz / (MOTOR_PWM_FREQ_HZ * divider as u32)) as u16 - 1;

    let mut config = pwm::Config::default();
    config.divider = divider.into();
    config.top = period;
    config
}

type Motor = MotorDrive<Output<'static>, Pwm<'static>>;

/// Both motors, coasting, with the driver out of standby
fn motors(r: MotorDriverResources) -> (Motor, Motor) {
    STANDBY.init(Output::new(r.standby_pin, Level::High));

    let left_pwm = Pwm::new_output_a(r.left_slice, r.left_pwm_pin, motor_pwm_config());
    let left = MotorDrive::new(
        Output::new(r.left_in1_pin, Level::Low),
        Output::new(r.left_in2_pin, Level::Low),
        left_pwm,
    )
    .unwrap();

    let right_pwm = Pwm::new_output_b(r.right_slice, r.right_pwm_pin, motor_pwm_config());
    let right = MotorDrive::new(
        Output::new(r.right_in1_pin, Level::Low),
        Output::new(r.right_in2_pin, Level::Low),
        right_pwm,
    )
    .unwrap();

    (left, right)
}

/// Hands every echo-pin transition to the distance worker
#[embassy_executor::task]
async fn echo_watch(mut echo: Input<'static>) {
    loop {
        echo.wait_for_any_edge().await;
        let timestamp_us = now_micros();
        EDGES.on_edge(Edge::from_level(echo.is_high()), timestamp_us);
    }
}

#[embassy_executor::task]
async fn distance_task(sensor: &'static Sensor, controller: &'static RoverController) {
    distance_measure(sensor, &EDGES, controller.state()).await
}

#[embassy_executor::task]
async fn trigger_task(sensor: &'static Sensor) {
    if let Err(e) = trigger_readings(sensor).await {
        error!("Distance trigger stopped: {}", e);
    }
}

#[embassy_executor::task]
async fn orchestrate_task(controller: &'static RoverController) {
    if let Err(e) = orchestrate(controller, &EVENTS).await {
        error!("Orchestrator stopped: {}", e);
    }
}

#[embassy_executor::task]
async fn drive_task(controller: &'static RoverController) {
    if let Err(e) = drive(controller).await {
        error!("Drive control stopped: {}", e);
    }
}

#[embassy_executor::task]
async fn autonomous_task(controller: &'static RoverController) {
    if let Err(e) = autonomous_drive(controller).await {
        error!("Autonomous drive stopped: {}", e);
    }
}

/// Periodic status line until a remote transport takes over the handles
#[embassy_executor::task]
async fn report(handles: Handles) {
    let mut ticker = Ticker::every(REPORT_INTERVAL);
    loop {
        ticker.next().await;
        let snapshot = handles.controller.snapshot().await;
        info!(
            "{}: left {} right {} front {} cm, {} events dropped, {} edges dropped",
            snapshot.mode,
            snapshot.left_speed,
            snapshot.right_speed,
            snapshot.front_distance,
            handles.events.dropped(),
            EDGES.dropped()
        );
    }
}
