use std::fmt;

use crate::{Error, Result};

/// Textual prefix of every zone element in the status document.
pub const ZONE_PREFIX: &str = "ac";

/// Largest zone suffix that still fits the 32-bit control bitmask.
pub const MAX_ZONE_INDEX: u8 = 31;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HvacMode {
    Cool,
    Heat,
    Dry,
    FanOnly,
    Off,
    Auto,
}

impl HvacMode {
    pub const ALL: [HvacMode; 6] = [
        HvacMode::Cool,
        HvacMode::Heat,
        HvacMode::Dry,
        HvacMode::FanOnly,
        HvacMode::Off,
        HvacMode::Auto,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HvacMode::Cool => "cool",
            HvacMode::Heat => "heat",
            HvacMode::Dry => "dry",
            HvacMode::FanOnly => "fan_only",
            HvacMode::Off => "off",
            HvacMode::Auto => "auto",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "cool" => Some(HvacMode::Cool),
            "heat" => Some(HvacMode::Heat),
            "dry" => Some(HvacMode::Dry),
            "fan_only" => Some(HvacMode::FanOnly),
            "off" => Some(HvacMode::Off),
            "auto" => Some(HvacMode::Auto),
            _ => None,
        }
    }
}

impl fmt::Display for HvacMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FanMode {
    Auto,
    Low,
    Medium,
    High,
    Off,
}

impl FanMode {
    /// Fan speeds offered to users, in display order.
    pub const ALL: [FanMode; 5] = [
        FanMode::Off,
        FanMode::Auto,
        FanMode::Low,
        FanMode::Medium,
        FanMode::High,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FanMode::Auto => "auto",
            FanMode::Low => "low",
            FanMode::Medium => "medium",
            FanMode::High => "high",
            FanMode::Off => "off",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "auto" => Some(FanMode::Auto),
            "low" => Some(FanMode::Low),
            "medium" => Some(FanMode::Medium),
            "high" => Some(FanMode::High),
            "off" => Some(FanMode::Off),
            _ => None,
        }
    }
}

impl fmt::Display for FanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    pub fn symbol(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "\u{00b0}C",
            TemperatureUnit::Fahrenheit => "\u{00b0}F",
        }
    }
}

/// Mode a zone is pinned to by a device-side mode lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockMode {
    Cool,
    Heat,
}

/// Zone name plus the numeric suffix that addresses it in control requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ZoneId {
    index: u8,
    name: String,
}

impl ZoneId {
    /// Parse a zone name such as `ac0` or `ac12`.
    pub fn parse(name: &str) -> Result<Self> {
        let index = name
            .strip_prefix(ZONE_PREFIX)
            .filter(|suffix| !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()))
            .filter(|suffix| *suffix == "0" || !suffix.starts_with('0'))
            .and_then(|suffix| suffix.parse::<u8>().ok())
            .filter(|index| *index <= MAX_ZONE_INDEX)
            .ok_or_else(|| Error::InvalidZone(name.to_string()))?;
        Ok(Self {
            index,
            name: name.to_string(),
        })
    }

    pub fn from_index(index: u8) -> Result<Self> {
        Self::parse(&format!("{ZONE_PREFIX}{index}"))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn index(&self) -> u8 {
        self.index
    }

    /// `2^index`, the value sent as `ac0` in a control request.
    pub fn bitmask(&self) -> u32 {
        1u32 << self.index
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// One decoded status record. Compared by value between polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ZoneStatus {
    pub mode: HvacMode,
    pub fan: FanMode,
    /// Measured temperature as reported; never unit-adjusted.
    pub current_temperature: i8,
    pub set_temperature: u8,
    pub error_code: u8,
    pub unit: TemperatureUnit,
    pub locked: bool,
    /// `None` unless the mode lock is active and names cool or heat.
    pub lock_mode: Option<LockMode>,
    /// `None` unless the fan lock is active.
    pub lock_fan_speed: Option<u8>,
    /// 0 when no cool limit is set.
    pub cool_limit_temp: u8,
    /// 0 when no heat limit is set.
    pub heat_limit_temp: u8,
    pub remote_locked: bool,
}

impl ZoneStatus {
    pub fn cool_limit(&self) -> Option<u8> {
        (self.cool_limit_temp > 0).then_some(self.cool_limit_temp)
    }

    pub fn heat_limit(&self) -> Option<u8> {
        (self.heat_limit_temp > 0).then_some(self.heat_limit_temp)
    }

    pub fn has_error(&self) -> bool {
        self.error_code != 0
    }
}

/// Desired zone state for a single control request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneIntent {
    pub hvac_mode: HvacMode,
    pub fan_mode: FanMode,
    pub set_temperature: i32,
}

/// Events emitted by the diff engine when a zone's snapshot changes.
#[derive(Debug, Clone)]
pub enum Event {
    ZoneDiscovered { zone: ZoneId, status: ZoneStatus },
    ZoneModeChanged { zone: ZoneId, mode: HvacMode },
    ZoneFanChanged { zone: ZoneId, fan: FanMode },
    ZoneTemperatureChanged { zone: ZoneId, temperature: i8, unit: TemperatureUnit },
    ZoneSetpointChanged { zone: ZoneId, set_temperature: u8, unit: TemperatureUnit },
    ZoneUnitChanged { zone: ZoneId, unit: TemperatureUnit },
    ZoneErrorChanged { zone: ZoneId, code: u8 },
    ZoneLockChanged {
        zone: ZoneId,
        locked: bool,
        lock_mode: Option<LockMode>,
        lock_fan_speed: Option<u8>,
        remote_locked: bool,
    },
    ZoneLimitsChanged { zone: ZoneId, cool: Option<u8>, heat: Option<u8> },
}
