//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter       | Implements                       | Connects to              |
//! |---------------|----------------------------------|--------------------------|
//! | `config_file` | ConfigPort                       | `config.json` on SPIFFS  |
//! | `hardware`    | SensorPort, AlarmPort, PowerPort | ESP32 ADC, GPIO, reset   |
//! | `mqtt`        | StatusPort                       | ESP-IDF MQTT client      |
//! | `time`        | TimePort                         | ESP32 system timer       |
//! | `wifi`        | —                                | ESP-IDF WiFi STA         |

pub mod config_file;
pub mod hardware;
pub mod mqtt;
pub mod time;
pub mod wifi;
