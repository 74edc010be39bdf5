//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements         | Connects to                  |
//! |-------------|--------------------|------------------------------|
//! | `hardware`  | SensorPort         | ESP32 ADC, GPIO, 1-Wire, I2C |
//! | `mqtt`      | TelemetryPort      | ESP-IDF MQTT client          |
//! | `display`   | DisplayPort        | Serial console dashboard     |
//! | `log_sink`  | EventSink          | Serial log output            |
//! | `nvs`       | ConfigPort         | NVS / in-memory store        |
//! | `wifi`      | ConnectivityPort   | ESP-IDF WiFi STA             |
//! | `time`      | `DelayNs`          | FreeRTOS / thread sleep      |

pub mod device_id;
pub mod display;
pub mod hardware;
pub mod log_sink;
pub mod mqtt;
pub mod nvs;
pub mod time;
pub mod wifi;
