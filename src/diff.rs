use std::collections::BTreeMap;

use crate::types::*;

/// Raw record changes between two polls as (zone name, old, new).
/// Zones missing from `current` are not reported.
pub(crate) fn diff_records(
    previous: &BTreeMap<String, String>,
    current: &BTreeMap<String, String>,
) -> Vec<(String, Option<String>, String)> {
    current
        .iter()
        .filter(|(name, record)| previous.get(*name) != Some(*record))
        .map(|(name, record)| (name.clone(), previous.get(name).cloned(), record.clone()))
        .collect()
}

/// Events for one zone's transition from `previous` to `current`.
pub(crate) fn status_events(
    zone: &ZoneId,
    previous: Option<&ZoneStatus>,
    current: &ZoneStatus,
) -> Vec<Event> {
    let Some(prev) = previous else {
        return vec![Event::ZoneDiscovered {
            zone: zone.clone(),
            status: *current,
        }];
    };

    let mut events = Vec::new();
    if prev == current {
        return events;
    }

    if prev.mode != current.mode {
        events.push(Event::ZoneModeChanged {
            zone: zone.clone(),
            mode: current.mode,
        });
    }
    if prev.fan != current.fan {
        events.push(Event::ZoneFanChanged {
            zone: zone.clone(),
            fan: current.fan,
        });
    }
    if prev.unit != current.unit {
        events.push(Event::ZoneUnitChanged {
            zone: zone.clone(),
            unit: current.unit,
        });
    }
    if prev.current_temperature != current.current_temperature {
        events.push(Event::ZoneTemperatureChanged {
            zone: zone.clone(),
            temperature: current.current_temperature,
            unit: current.unit,
        });
    }
    if prev.set_temperature != current.set_temperature || prev.unit != current.unit {
        events.push(Event::ZoneSetpointChanged {
            zone: zone.clone(),
            set_temperature: current.set_temperature,
            unit: current.unit,
        });
    }
    if prev.error_code != current.error_code {
        events.push(Event::ZoneErrorChanged {
            zone: zone.clone(),
            code: current.error_code,
        });
    }
    if prev.locked != current.locked
        || prev.lock_mode != current.lock_mode
        || prev.lock_fan_speed != current.lock_fan_speed
        || prev.remote_locked != current.remote_locked
    {
        events.push(Event::ZoneLockChanged {
            zone: zone.clone(),
            locked: current.locked,
            lock_mode: current.lock_mode,
            lock_fan_speed: current.lock_fan_speed,
            remote_locked: current.remote_locked,
        });
    }
    if prev.cool_limit_temp != current.cool_limit_temp
        || prev.heat_limit_temp != current.heat_limit_temp
    {
        events.push(Event::ZoneLimitsChanged {
            zone: zone.clone(),
            cool: current.cool_limit(),
            heat: current.heat_limit(),
        });
    }

    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::decode_status;

    fn status(record: &str) -> ZoneStatus {
        decode_status(record).unwrap().unwrap()
    }

    fn zone() -> ZoneId {
        ZoneId::parse("ac1").unwrap()
    }

    #[test]
    fn first_snapshot_is_discovery() {
        let events = status_events(&zone(), None, &status("00000080C00017"));
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], Event::ZoneDiscovered { zone, .. } if zone.name() == "ac1"));
    }

    #[test]
    fn identical_snapshots_produce_nothing() {
        let s = status("00000080C00017");
        assert!(status_events(&zone(), Some(&s), &s).is_empty());
    }

    #[test]
    fn temperature_change_only() {
        let prev = status("00000080C00017");
        let curr = status("00000080C00018");
        let events = status_events(&zone(), Some(&prev), &curr);
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            Event::ZoneTemperatureChanged { temperature: 24, unit: TemperatureUnit::Celsius, .. }
        ));
    }

    #[test]
    fn mode_fan_and_lock_changes() {
        let prev = status("00000080C00017");
        // heat (1 << 2) + low (2 << 5) + mode lock active, lock code heat
        let curr = status("00000246C00017");
        let events = status_events(&zone(), Some(&prev), &curr);
        let names: Vec<String> = events
            .iter()
            .map(|e| format!("{e:?}").split_whitespace().next().unwrap().to_string())
            .collect();
        assert_eq!(names, ["ZoneModeChanged", "ZoneFanChanged", "ZoneLockChanged"]);
        assert!(matches!(
            events[2],
            Event::ZoneLockChanged { locked: true, lock_mode: Some(LockMode::Heat), .. }
        ));
    }

    #[test]
    fn unit_switch_reports_setpoint() {
        let prev = status("00000080C00017");
        let curr = status("01000080C00017");
        let events = status_events(&zone(), Some(&prev), &curr);
        assert!(events.iter().any(|e| matches!(e, Event::ZoneUnitChanged { .. })));
        assert!(events.iter().any(|e| matches!(
            e,
            Event::ZoneSetpointChanged { set_temperature: 86, unit: TemperatureUnit::Fahrenheit, .. }
        )));
    }

    #[test]
    fn record_diff_reports_new_and_changed() {
        let prev = BTreeMap::from([
            ("ac0".to_string(), "00000080C00017".to_string()),
            ("ac1".to_string(), "-".to_string()),
        ]);
        let curr = BTreeMap::from([
            ("ac0".to_string(), "00000080C00018".to_string()),
            ("ac1".to_string(), "-".to_string()),
            ("ac2".to_string(), "-".to_string()),
        ]);
        let changes = diff_records(&prev, &curr);
        assert_eq!(
            changes,
            vec![
                (
                    "ac0".to_string(),
                    Some("00000080C00017".to_string()),
                    "00000080C00018".to_string()
                ),
                ("ac2".to_string(), None, "-".to_string()),
            ]
        );
    }
}
