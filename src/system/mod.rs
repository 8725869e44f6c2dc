//! Core system components for robot operation
pub mod autonomous;
pub mod controller;
pub mod drive_command;
pub mod event;
pub mod hardware;
pub mod motor;
pub mod range_filter;
pub mod range_sensor;
pub mod speed_ramp;
pub mod state;
