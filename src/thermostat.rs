use crate::protocol::adjust_set_temperature;
use crate::types::*;
use crate::{Error, Result};

const UNIQUE_ID_PREFIX: &str = "ccm15";

/// Entity state for one zone: the last decoded snapshot plus the mode,
/// fan speed and set temperature last confirmed by the controller.
#[derive(Debug, Clone)]
pub struct Thermostat {
    zone: ZoneId,
    name: String,
    status: ZoneStatus,
    set_temperature: i32,
    hvac_mode: HvacMode,
    fan_mode: FanMode,
    /// Last non-Off fan speed, restored when leaving a fan-off state.
    resume_fan_mode: FanMode,
}

impl Thermostat {
    pub fn new(name_prefix: &str, zone: ZoneId, status: ZoneStatus) -> Self {
        let resume_fan_mode = match status.fan {
            FanMode::Off => FanMode::Auto,
            fan => fan,
        };
        Self {
            name: format!("{name_prefix}_{}", zone.name()),
            zone,
            status,
            set_temperature: i32::from(status.set_temperature),
            hvac_mode: status.mode,
            fan_mode: status.fan,
            resume_fan_mode,
        }
    }

    /// Merge a freshly decoded snapshot. Returns `false` when it equals
    /// the previous one and nothing was touched.
    pub fn apply_status(&mut self, status: ZoneStatus) -> bool {
        if self.status == status {
            return false;
        }
        self.status = status;
        self.set_temperature = i32::from(status.set_temperature);
        self.hvac_mode = status.mode;
        self.fan_mode = status.fan;
        if status.fan != FanMode::Off {
            self.resume_fan_mode = status.fan;
        }
        true
    }

    pub fn intent(&self) -> ZoneIntent {
        ZoneIntent {
            hvac_mode: self.hvac_mode,
            fan_mode: self.fan_mode,
            set_temperature: self.set_temperature,
        }
    }

    /// Record an intent the controller accepted.
    pub fn commit_intent(&mut self, intent: &ZoneIntent) {
        self.hvac_mode = intent.hvac_mode;
        self.fan_mode = intent.fan_mode;
        self.set_temperature = intent.set_temperature;
        if intent.fan_mode != FanMode::Off {
            self.resume_fan_mode = intent.fan_mode;
        }
    }

    /// Switching to a different mode while the fan is off brings the fan
    /// back to its last running speed.
    pub fn request_hvac_mode(&self, mode: HvacMode) -> ZoneIntent {
        let mut intent = self.intent();
        if self.hvac_mode != mode && self.fan_mode == FanMode::Off {
            intent.fan_mode = self.resume_fan_mode;
        }
        intent.hvac_mode = mode;
        intent
    }

    /// Returns `None` while the zone is off: fan changes are ignored then.
    /// Turning the fan off also turns the zone off.
    pub fn request_fan_mode(&self, fan: FanMode) -> Option<ZoneIntent> {
        if self.hvac_mode == HvacMode::Off {
            return None;
        }
        let mut intent = self.intent();
        if fan == FanMode::Off {
            intent.hvac_mode = HvacMode::Off;
        }
        intent.fan_mode = fan;
        Some(intent)
    }

    pub fn request_temperature(&self, requested: f64) -> Result<ZoneIntent> {
        if !requested.is_finite() {
            return Err(Error::UnsupportedIntent(format!(
                "set temperature {requested}"
            )));
        }
        Ok(ZoneIntent {
            set_temperature: adjust_set_temperature(requested, self.set_temperature),
            ..self.intent()
        })
    }

    pub fn zone(&self) -> &ZoneId {
        &self.zone
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unique_id(&self) -> String {
        format!("{UNIQUE_ID_PREFIX}{}", slugify(&self.name))
    }

    pub fn status(&self) -> &ZoneStatus {
        &self.status
    }

    pub fn current_temperature(&self) -> i8 {
        self.status.current_temperature
    }

    pub fn target_temperature(&self) -> i32 {
        self.set_temperature
    }

    pub fn temperature_unit(&self) -> TemperatureUnit {
        self.status.unit
    }

    pub fn hvac_mode(&self) -> HvacMode {
        self.hvac_mode
    }

    pub fn fan_mode(&self) -> FanMode {
        self.fan_mode
    }

    pub fn hvac_modes(&self) -> &'static [HvacMode] {
        &HvacMode::ALL
    }

    pub fn fan_modes(&self) -> &'static [FanMode] {
        &FanMode::ALL
    }
}

fn slugify(s: &str) -> String {
    let mut slug = String::with_capacity(s.len());
    for c in s.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('_') {
            slug.push('_');
        }
    }
    while slug.ends_with('_') {
        slug.pop();
    }
    slug
}
