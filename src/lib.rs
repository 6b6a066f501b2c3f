mod client;
mod config;
mod diff;
mod error;
mod logger;
mod protocol;
mod thermostat;
mod types;

pub use client::{Ccm15Client, Ccm15ClientBuilder};
pub use config::Config;
pub use error::{Error, Result};
pub use logger::MessageLogMode;
pub use protocol::{
    adjust_set_temperature, decode_record, decode_status, encode_command, fan_code,
    fan_from_code, mode_code, mode_from_code, parse_status_xml, resolve_fan_mode,
    resolve_hvac_mode, ControlRequest, FAHRENHEIT_OFFSET, FAN_CODES, FAN_MODE_FALLBACK,
    HVAC_MODE_FALLBACK, MODE_CODES, STATUS_RECORD_LEN,
};
pub use thermostat::Thermostat;
pub use types::*;
