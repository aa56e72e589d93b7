//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements      | Connects to                    |
//! |-------------|-----------------|--------------------------------|
//! | `eeprom`    | StoragePort     | In-memory EEPROM image         |
//! | `log_sink`  | DiagnosticSink  | `log` facade (serial console)  |
//! | `relay`     | ActuatorPort    | embedded-hal output pins       |
//! | `smoothing` | SensorPort      | Any probe bus (decorator)      |

pub mod eeprom;
pub mod log_sink;
pub mod relay;
pub mod smoothing;
