//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements         | Connects to                  |
//! |----------------|--------------------|------------------------------|
//! | `hardware`     | SensorPort         | Thermistor on ADC1           |
//! |                | ActuatorPort       | LEDC PWM (LED + fan)         |
//! | `log_sink`     | EventSink          | Serial log output            |
//! | `nvs`          | ConfigPort         | NVS / in-memory store        |
//! |                | StoragePort        |                              |
//! | `system`       | SystemPort         | esp_restart, WiFi NVS        |
//! | `wifi`         | (none)             | ESP-IDF WiFi STA             |
//! | `http_server`  | (none)             | ESP-IDF httpd → RequestBridge|
//! | `device_id`    | (none)             | eFuse MAC                    |

pub mod device_id;
pub mod hardware;
#[cfg(target_os = "espidf")]
pub mod http_server;
pub mod log_sink;
pub mod nvs;
pub mod system;
pub mod wifi;
