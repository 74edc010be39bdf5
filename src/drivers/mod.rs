//! Hardware initialisation and low-level bus helpers.

pub mod hw_init;
pub mod onewire;
#[cfg(not(target_os = "espidf"))]
pub mod sim_i2c;
