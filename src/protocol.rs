use std::fmt;

use quick_xml::Reader;
use quick_xml::events::Event as XmlEvent;

use crate::types::*;
use crate::{Error, Result};

pub const STATUS_PATH: &str = "/status.xml";
pub const CTRL_PATH: &str = "/ctrl.xml";

const STATUS_ROOT: &[u8] = b"response";

/// Raw record value the controller reports for an empty zone slot.
pub const ABSENT_MARKER: &str = "-";

pub const STATUS_RECORD_LEN: usize = 7;

/// Added to raw set and limit temperatures when the record is in Fahrenheit.
pub const FAHRENHEIT_OFFSET: u8 = 62;

pub const MODE_CODES: [(HvacMode, u8); 6] = [
    (HvacMode::Cool, 0),
    (HvacMode::Heat, 1),
    (HvacMode::Dry, 2),
    (HvacMode::FanOnly, 3),
    (HvacMode::Off, 4),
    (HvacMode::Auto, 5),
];

// Fan code 1 never appears in the table.
pub const FAN_CODES: [(FanMode, u8); 5] = [
    (FanMode::Auto, 0),
    (FanMode::Low, 2),
    (FanMode::Medium, 3),
    (FanMode::High, 4),
    (FanMode::Off, 5),
];

/// Mode substituted when a caller names a mode outside [`MODE_CODES`].
pub const HVAC_MODE_FALLBACK: HvacMode = HvacMode::Off;

/// Fan speed substituted when a caller names a speed outside [`FAN_CODES`].
pub const FAN_MODE_FALLBACK: FanMode = FanMode::Auto;

pub fn mode_code(mode: HvacMode) -> Option<u8> {
    MODE_CODES.iter().find(|(m, _)| *m == mode).map(|(_, c)| *c)
}

pub fn mode_from_code(code: u8) -> Option<HvacMode> {
    MODE_CODES.iter().find(|(_, c)| *c == code).map(|(m, _)| *m)
}

pub fn fan_code(fan: FanMode) -> Option<u8> {
    FAN_CODES.iter().find(|(f, _)| *f == fan).map(|(_, c)| *c)
}

pub fn fan_from_code(code: u8) -> Option<FanMode> {
    FAN_CODES.iter().find(|(_, c)| *c == code).map(|(f, _)| *f)
}

pub fn resolve_hvac_mode(name: &str) -> HvacMode {
    HvacMode::from_name(name).unwrap_or(HVAC_MODE_FALLBACK)
}

pub fn resolve_fan_mode(name: &str) -> FanMode {
    FanMode::from_name(name).unwrap_or(FAN_MODE_FALLBACK)
}

/// Integer set temperature for a requested value: ceiling when raising
/// above `current`, floor otherwise.
pub fn adjust_set_temperature(requested: f64, current: i32) -> i32 {
    if requested > f64::from(current) {
        requested.ceil() as i32
    } else {
        requested.floor() as i32
    }
}

fn field(byte: u8, shift: u8, mask: u8) -> u8 {
    (byte >> shift) & mask
}

fn flag(byte: u8, bit: u8) -> bool {
    (byte >> bit) & 1 != 0
}

/// Decode one zone's hex record. `Ok(None)` means the zone has no data.
///
/// Records shorter than two characters, the `-` marker, and hex that
/// decodes to fewer than [`STATUS_RECORD_LEN`] bytes are all absent.
pub fn decode_status(record: &str) -> Result<Option<ZoneStatus>> {
    let trimmed = record.trim().trim_matches(',');
    if trimmed == ABSENT_MARKER || trimmed.len() < 2 {
        return Ok(None);
    }

    let bytes =
        hex::decode(trimmed).map_err(|e| Error::MalformedRecord(format!("{trimmed:?}: {e}")))?;
    if bytes.len() < STATUS_RECORD_LEN {
        return Ok(None);
    }

    let record: [u8; STATUS_RECORD_LEN] = bytes.as_slice().try_into().map_err(|_| {
        Error::MalformedRecord(format!(
            "expected {STATUS_RECORD_LEN} bytes, got {}",
            bytes.len()
        ))
    })?;
    decode_record(&record).map(Some)
}

pub fn decode_record(b: &[u8; STATUS_RECORD_LEN]) -> Result<ZoneStatus> {
    let is_fahrenheit = flag(b[0], 0);
    let mut cool_limit_temp = field(b[0], 3, 0x1f);

    let mut heat_limit_temp = field(b[1], 0, 0x1f);
    let fan_lock_code = field(b[1], 5, 0x07);

    let mode_lock_code = field(b[2], 0, 0x03);
    let error_code = field(b[2], 2, 0x3f);

    let raw_mode = field(b[3], 2, 0x07);
    let raw_fan = field(b[3], 5, 0x07);
    let mode_lock_active = flag(b[3], 1);
    let mode = mode_from_code(raw_mode).ok_or(Error::UnknownModeCode(raw_mode))?;
    let fan = fan_from_code(raw_fan).ok_or(Error::UnknownFanCode(raw_fan))?;

    let mut set_temperature = field(b[4], 3, 0x1f);

    let unit = if is_fahrenheit {
        set_temperature += FAHRENHEIT_OFFSET;
        cool_limit_temp += FAHRENHEIT_OFFSET;
        heat_limit_temp += FAHRENHEIT_OFFSET;
        TemperatureUnit::Fahrenheit
    } else {
        TemperatureUnit::Celsius
    };

    if !flag(b[5], 3) {
        cool_limit_temp = 0;
    }
    if !flag(b[5], 4) {
        heat_limit_temp = 0;
    }
    let fan_lock_active = flag(b[5], 5);
    let remote_locked = flag(b[5], 6);

    let current_temperature = b[6] as i8;

    let lock_mode = match (mode_lock_active, mode_lock_code) {
        (true, 1) => Some(LockMode::Cool),
        (true, 2) => Some(LockMode::Heat),
        _ => None,
    };

    Ok(ZoneStatus {
        mode,
        fan,
        current_temperature,
        set_temperature,
        error_code,
        unit,
        locked: mode_lock_active
            || fan_lock_active
            || cool_limit_temp > 0
            || heat_limit_temp > 0
            || remote_locked,
        lock_mode,
        lock_fan_speed: fan_lock_active.then_some(fan_lock_code),
        cool_limit_temp,
        heat_limit_temp,
        remote_locked,
    })
}

/// Query parameters of one control request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlRequest {
    pub zone_bitmask: u32,
    pub mode_code: u8,
    pub fan_code: u8,
    pub temperature: i32,
}

impl ControlRequest {
    pub fn query_pairs(&self) -> [(&'static str, String); 5] {
        [
            ("ac0", self.zone_bitmask.to_string()),
            // Second zone group, always zero.
            ("ac1", "0".to_string()),
            ("mode", self.mode_code.to_string()),
            ("fan", self.fan_code.to_string()),
            ("temp", self.temperature.to_string()),
        ]
    }

    /// Path and query string relative to the controller's base URL.
    pub fn path(&self) -> String {
        format!("{CTRL_PATH}?{}", self)
    }
}

impl fmt::Display for ControlRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let query: Vec<String> = self
            .query_pairs()
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        f.write_str(&query.join("&"))
    }
}

pub fn encode_command(zone: &ZoneId, intent: &ZoneIntent) -> Result<ControlRequest> {
    let mode_code = mode_code(intent.hvac_mode)
        .ok_or_else(|| Error::UnsupportedIntent(format!("hvac mode {}", intent.hvac_mode)))?;
    let fan_code = fan_code(intent.fan_mode)
        .ok_or_else(|| Error::UnsupportedIntent(format!("fan mode {}", intent.fan_mode)))?;
    Ok(ControlRequest {
        zone_bitmask: zone.bitmask(),
        mode_code,
        fan_code,
        temperature: intent.set_temperature,
    })
}

/// Children of the `<response>` root, in document order, as (name, text).
pub fn parse_status_xml(body: &str) -> Result<Vec<(String, String)>> {
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut entries: Vec<(String, String)> = Vec::new();
    let mut depth = 0usize;
    let mut saw_root = false;

    loop {
        match reader.read_event()? {
            XmlEvent::Start(e) => {
                depth += 1;
                let name = e.name();
                match depth {
                    1 if name.as_ref() == STATUS_ROOT => saw_root = true,
                    1 => {
                        return Err(Error::Xml(format!(
                            "unexpected root <{}>",
                            String::from_utf8_lossy(name.as_ref())
                        )));
                    }
                    2 => entries.push((String::from_utf8_lossy(name.as_ref()).into_owned(), String::new())),
                    _ => {}
                }
            }
            XmlEvent::Empty(e) => {
                let name = e.name();
                match depth {
                    0 if name.as_ref() == STATUS_ROOT => saw_root = true,
                    1 => entries.push((String::from_utf8_lossy(name.as_ref()).into_owned(), String::new())),
                    _ => {}
                }
            }
            XmlEvent::Text(t) if depth == 2 => {
                if let Some((_, text)) = entries.last_mut() {
                    text.push_str(&t.unescape()?);
                }
            }
            XmlEvent::End(_) => depth = depth.saturating_sub(1),
            XmlEvent::Eof => break,
            _ => {}
        }
    }

    if !saw_root {
        return Err(Error::Xml("missing <response> root".to_string()));
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(hex: &str) -> ZoneStatus {
        decode_status(hex).unwrap().expect("record should be present")
    }

    #[test]
    fn decode_hand_computed_record() {
        let status = decode("0102030405060A");
        assert_eq!(status.unit, TemperatureUnit::Fahrenheit);
        assert_eq!(status.mode, HvacMode::Heat);
        assert_eq!(status.fan, FanMode::Auto);
        assert_eq!(status.current_temperature, 10);
        assert_eq!(status.set_temperature, 62);
        assert_eq!(status.error_code, 0);
        assert_eq!(status.cool_limit_temp, 0);
        assert_eq!(status.heat_limit_temp, 0);
        assert_eq!(status.lock_mode, None);
        assert_eq!(status.lock_fan_speed, None);
        assert!(!status.remote_locked);
        assert!(!status.locked);
    }

    #[test]
    fn decode_celsius_record() {
        let status = decode("00000080C00017");
        assert_eq!(status.unit, TemperatureUnit::Celsius);
        assert_eq!(status.mode, HvacMode::Cool);
        assert_eq!(status.fan, FanMode::High);
        assert_eq!(status.set_temperature, 24);
        assert_eq!(status.current_temperature, 23);
        assert!(!status.locked);
    }

    #[test]
    fn fahrenheit_offset_applies_to_set_and_limits_only() {
        let status = decode("91000080500817");
        assert_eq!(status.unit, TemperatureUnit::Fahrenheit);
        assert_eq!(status.set_temperature, 10 + FAHRENHEIT_OFFSET);
        assert_eq!(status.cool_limit_temp, 18 + FAHRENHEIT_OFFSET);
        assert_eq!(status.current_temperature, 0x17);
    }

    #[test]
    fn negative_current_temperature() {
        assert_eq!(decode("00000080C000C8").current_temperature, -56);
    }

    #[test]
    fn error_code_field() {
        let status = decode("00001480C00017");
        assert_eq!(status.error_code, 5);
        assert!(status.has_error());
        assert_eq!(status.lock_mode, None);
    }

    #[test]
    fn mode_lock_variants() {
        let cool = decode("00000182C00017");
        assert_eq!(cool.lock_mode, Some(LockMode::Cool));
        assert!(cool.locked);

        let heat = decode("00000282C00017");
        assert_eq!(heat.lock_mode, Some(LockMode::Heat));

        let other = decode("00000382C00017");
        assert_eq!(other.lock_mode, None);
        assert!(other.locked);

        let inactive = decode("00000180C00017");
        assert_eq!(inactive.lock_mode, None);
        assert!(!inactive.locked);
    }

    #[test]
    fn each_lock_source_sets_locked() {
        let fan = decode("00600080C02017");
        assert_eq!(fan.lock_fan_speed, Some(3));
        assert!(fan.locked);

        let cool = decode("90000080C00817");
        assert_eq!(cool.cool_limit(), Some(18));
        assert!(cool.locked);

        let heat = decode("00100080C01017");
        assert_eq!(heat.heat_limit(), Some(16));
        assert!(heat.locked);

        let remote = decode("00000080C04017");
        assert!(remote.remote_locked);
        assert!(remote.locked);
    }

    #[test]
    fn limit_values_cleared_without_active_bit() {
        let status = decode("90600080C00017");
        assert_eq!(status.cool_limit_temp, 0);
        assert_eq!(status.lock_fan_speed, None);
        assert!(!status.locked);
    }

    #[test]
    fn zero_celsius_limit_does_not_lock() {
        assert!(!decode("00000080C00817").locked);
        // Fahrenheit pushes the same raw zero to 62.
        let status = decode("01000080500817");
        assert_eq!(status.cool_limit_temp, 62);
        assert!(status.locked);
    }

    #[test]
    fn every_table_code_decodes() {
        for (mode, code) in MODE_CODES {
            let byte3 = code << 2;
            let status = decode(&format!("000000{byte3:02X}C00017"));
            assert_eq!(status.mode, mode);
        }
        for (fan, code) in FAN_CODES {
            let byte3 = code << 5;
            let status = decode(&format!("000000{byte3:02X}C00017"));
            assert_eq!(status.fan, fan);
        }
    }

    #[test]
    fn unknown_codes_are_errors() {
        assert!(matches!(
            decode_status("00000018C00017"),
            Err(Error::UnknownModeCode(6))
        ));
        assert!(matches!(
            decode_status("00000020C00017"),
            Err(Error::UnknownFanCode(1))
        ));
    }

    #[test]
    fn absent_records() {
        assert_eq!(decode_status("-").unwrap(), None);
        assert_eq!(decode_status("").unwrap(), None);
        assert_eq!(decode_status("0").unwrap(), None);
        assert_eq!(decode_status("000000").unwrap(), None);
    }

    #[test]
    fn malformed_records() {
        assert!(matches!(
            decode_status("zz000080C00017"),
            Err(Error::MalformedRecord(_))
        ));
        assert!(matches!(
            decode_status("00000080C0001700"),
            Err(Error::MalformedRecord(_))
        ));
    }

    #[test]
    fn surrounding_commas_are_stripped() {
        assert_eq!(decode(",00000080C00017,"), decode("00000080C00017"));
    }

    #[test]
    fn encode_heat_low_request() {
        let zone = ZoneId::parse("ac0").unwrap();
        let intent = ZoneIntent {
            hvac_mode: HvacMode::Heat,
            fan_mode: FanMode::Low,
            set_temperature: 24,
        };
        let req = encode_command(&zone, &intent).unwrap();
        assert_eq!(req.to_string(), "ac0=1&ac1=0&mode=1&fan=2&temp=24");
        assert_eq!(req.path(), "/ctrl.xml?ac0=1&ac1=0&mode=1&fan=2&temp=24");
    }

    #[test]
    fn encode_uses_zone_bitmask() {
        let zone = ZoneId::parse("ac3").unwrap();
        let intent = ZoneIntent {
            hvac_mode: HvacMode::Off,
            fan_mode: FanMode::Off,
            set_temperature: 20,
        };
        let req = encode_command(&zone, &intent).unwrap();
        assert_eq!(req.zone_bitmask, 8);
        assert_eq!(req.mode_code, 4);
        assert_eq!(req.fan_code, 5);
    }

    #[test]
    fn encode_codes_match_tables() {
        let zone = ZoneId::parse("ac0").unwrap();
        for mode in HvacMode::ALL {
            for fan in FanMode::ALL {
                let intent = ZoneIntent {
                    hvac_mode: mode,
                    fan_mode: fan,
                    set_temperature: 22,
                };
                let req = encode_command(&zone, &intent).unwrap();
                assert_eq!(mode_from_code(req.mode_code), Some(mode));
                assert_eq!(fan_from_code(req.fan_code), Some(fan));
            }
        }
    }

    #[test]
    fn fallback_policy_is_asymmetric() {
        assert_eq!(resolve_hvac_mode("heat"), HvacMode::Heat);
        assert_eq!(resolve_hvac_mode("heat_cool"), HvacMode::Off);
        assert_eq!(resolve_fan_mode("medium"), FanMode::Medium);
        assert_eq!(resolve_fan_mode("turbo"), FanMode::Auto);
    }

    #[test]
    fn set_temperature_rounds_away_from_current() {
        assert_eq!(adjust_set_temperature(22.3, 22), 23);
        assert_eq!(adjust_set_temperature(21.8, 22), 21);
        assert_eq!(adjust_set_temperature(22.0, 22), 22);
        assert_eq!(adjust_set_temperature(25.0, 22), 25);
        assert_eq!(adjust_set_temperature(-0.5, 3), -1);
    }

    #[test]
    fn parse_status_document() {
        let xml = "<response><ac0>00000080C00017</ac0><ac1>-</ac1><ac2/><mode>x</mode></response>";
        let entries = parse_status_xml(xml).unwrap();
        assert_eq!(
            entries,
            vec![
                ("ac0".to_string(), "00000080C00017".to_string()),
                ("ac1".to_string(), "-".to_string()),
                ("ac2".to_string(), String::new()),
                ("mode".to_string(), "x".to_string()),
            ]
        );
    }

    #[test]
    fn parse_status_document_with_declaration() {
        let xml = "<?xml version=\"1.0\"?>\n<response>\n  <ac0>0102030405060A</ac0>\n</response>\n";
        let entries = parse_status_xml(xml).unwrap();
        assert_eq!(entries, vec![("ac0".to_string(), "0102030405060A".to_string())]);
    }

    #[test]
    fn parse_status_rejects_other_roots() {
        assert!(matches!(parse_status_xml("<status><ac0>-</ac0></status>"), Err(Error::Xml(_))));
        assert!(matches!(parse_status_xml(""), Err(Error::Xml(_))));
    }
}
