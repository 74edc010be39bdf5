//! Application core — pure domain orchestration, zero I/O.
//!
//! The monitoring cycle lives in [`service`]. All interaction with
//! hardware, the broker and the dashboard happens through **port traits**
//! defined in [`ports`], keeping this layer testable without peripherals.

pub mod events;
pub mod ports;
pub mod service;
