//! Aquamon firmware library.
//!
//! Periodic monitoring loop for an aquaponics basin: sample the sensors,
//! derive and classify the water metrics, draw the dashboard and publish
//! the readings over MQTT. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod metrics;
pub mod pins;
pub mod reading;
pub mod safety;
pub mod telemetry;

pub mod adapters;
pub mod drivers;
pub mod sensors;
