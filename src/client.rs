use std::collections::BTreeMap;
use std::time::Duration;

use tracing::{debug, error, info, trace, warn};

use crate::config::{Config, DEFAULT_NAME};
use crate::diff::status_events;
use crate::logger::{MessageLogMode, MessageLogger};
use crate::protocol::{
    decode_status, encode_command, parse_status_xml, resolve_fan_mode, resolve_hvac_mode,
    STATUS_PATH,
};
use crate::thermostat::Thermostat;
use crate::types::*;
use crate::{Error, Result};

type EventCallback = Box<dyn Fn(&Event) + Send + Sync>;
type SnapshotCallback = Box<dyn Fn(&Thermostat) + Send + Sync>;

pub struct Ccm15ClientBuilder {
    host: String,
    port: u16,
    protocol: String,
    name: String,
    poll_timeout: Duration,
    command_timeout: Duration,
    event_callbacks: Vec<EventCallback>,
    snapshot_callbacks: Vec<SnapshotCallback>,
    log_mode: Option<MessageLogMode>,
    log_path: Option<String>,
}

impl Ccm15ClientBuilder {
    pub fn new(host: impl Into<String>) -> Self {
        let defaults = Config::default();
        Self {
            host: host.into(),
            port: defaults.port,
            protocol: "http".to_string(),
            name: DEFAULT_NAME.to_string(),
            poll_timeout: defaults.poll_timeout(),
            command_timeout: defaults.command_timeout(),
            event_callbacks: Vec::new(),
            snapshot_callbacks: Vec::new(),
            log_mode: None,
            log_path: None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.host.clone())
            .port(config.port)
            .name(config.name.clone())
            .poll_timeout(config.poll_timeout())
            .command_timeout(config.command_timeout())
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn protocol(mut self, proto: &str) -> Self {
        self.protocol = proto.to_string();
        self
    }

    /// Prefix for entity names, `{name}_{zone}`.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    pub fn on_event(mut self, f: impl Fn(&Event) + Send + Sync + 'static) -> Self {
        self.event_callbacks.push(Box::new(f));
        self
    }

    pub fn on_snapshot(mut self, f: impl Fn(&Thermostat) + Send + Sync + 'static) -> Self {
        self.snapshot_callbacks.push(Box::new(f));
        self
    }

    pub fn message_log(mut self, mode: MessageLogMode, path: impl Into<String>) -> Self {
        self.log_mode = Some(mode);
        self.log_path = Some(path.into());
        self
    }

    pub fn build(self) -> Result<Ccm15Client> {
        let http = reqwest::Client::builder().build()?;

        let logger = match (self.log_mode, self.log_path) {
            (Some(mode), Some(path)) => Some(MessageLogger::new(mode, &path)?),
            _ => None,
        };

        Ok(Ccm15Client {
            http,
            base_url: format!("{}://{}:{}", self.protocol, self.host, self.port),
            name: self.name,
            poll_timeout: self.poll_timeout,
            command_timeout: self.command_timeout,
            zones: BTreeMap::new(),
            event_callbacks: self.event_callbacks,
            snapshot_callbacks: self.snapshot_callbacks,
            logger,
        })
    }
}

pub struct Ccm15Client {
    http: reqwest::Client,
    base_url: String,
    name: String,
    poll_timeout: Duration,
    command_timeout: Duration,
    zones: BTreeMap<ZoneId, Thermostat>,
    event_callbacks: Vec<EventCallback>,
    snapshot_callbacks: Vec<SnapshotCallback>,
    logger: Option<MessageLogger>,
}

impl Ccm15Client {
    pub fn builder(host: impl Into<String>) -> Ccm15ClientBuilder {
        Ccm15ClientBuilder::new(host)
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ccm15ClientBuilder::from_config(config).build()
    }

    /// Fetch and decode every zone once. Absent zones are left out and
    /// malformed records are logged and skipped.
    pub async fn fetch_status(&mut self) -> Result<BTreeMap<ZoneId, ZoneStatus>> {
        let url = format!("{}{STATUS_PATH}", self.base_url);
        debug!(url = %url, "fetching status");

        if let Some(ref mut logger) = self.logger {
            logger.log_request("GET", STATUS_PATH);
        }

        let resp = self
            .http
            .get(&url)
            .timeout(self.poll_timeout)
            .send()
            .await?;
        let status = resp.status().as_u16();
        if status != 200 {
            return Err(Error::Status(status));
        }

        let body = resp.text().await?;
        let entries = parse_status_xml(&body)?;

        if let Some(ref mut logger) = self.logger {
            let records: BTreeMap<String, String> = entries.iter().cloned().collect();
            logger.log_poll(status, &records);
        }

        Ok(decode_zones(entries))
    }

    /// One poll cycle. A failed fetch leaves every zone untouched. Returns
    /// the number of zones whose snapshot changed.
    pub async fn poll(&mut self) -> usize {
        let statuses = match self.fetch_status().await {
            Ok(s) => s,
            Err(e) => {
                error!(error = %e, "status poll failed");
                if let Some(ref mut logger) = self.logger {
                    logger.log_poll_failure(&e.to_string());
                }
                return 0;
            }
        };

        let mut changed = 0;
        for (zone, status) in statuses {
            let events = if let Some(thermostat) = self.zones.get_mut(&zone) {
                let previous = *thermostat.status();
                if !thermostat.apply_status(status) {
                    trace!(zone = %zone, "status unchanged");
                    continue;
                }
                status_events(&zone, Some(&previous), &status)
            } else {
                debug!(zone = %zone, "discovered zone");
                let thermostat = Thermostat::new(&self.name, zone.clone(), status);
                self.zones.insert(zone.clone(), thermostat);
                status_events(&zone, None, &status)
            };
            changed += 1;

            for event in &events {
                for cb in &self.event_callbacks {
                    cb(event);
                }
            }
            if let Some(thermostat) = self.zones.get(&zone) {
                for cb in &self.snapshot_callbacks {
                    cb(thermostat);
                }
            }
        }

        if changed > 0 {
            debug!(count = changed, "zones updated from poll");
        }
        changed
    }

    pub fn zones(&self) -> impl Iterator<Item = &Thermostat> {
        self.zones.values()
    }

    pub fn zone(&self, zone: &ZoneId) -> Option<&Thermostat> {
        self.zones.get(zone)
    }

    // -- Command methods --

    pub async fn set_hvac_mode(&mut self, zone: &ZoneId, mode: HvacMode) -> Result<()> {
        let intent = self.thermostat(zone)?.request_hvac_mode(mode);
        self.send_intent("set_hvac_mode", zone, &intent).await
    }

    /// Unknown names fall back to [`crate::HVAC_MODE_FALLBACK`].
    pub async fn set_hvac_mode_named(&mut self, zone: &ZoneId, name: &str) -> Result<()> {
        let mode = resolve_hvac_mode(name);
        if HvacMode::from_name(name).is_none() {
            warn!(zone = %zone, requested = name, fallback = %mode, "unsupported hvac mode");
        }
        self.set_hvac_mode(zone, mode).await
    }

    /// Ignored while the zone is off.
    pub async fn set_fan_mode(&mut self, zone: &ZoneId, fan: FanMode) -> Result<()> {
        match self.thermostat(zone)?.request_fan_mode(fan) {
            Some(intent) => self.send_intent("set_fan_mode", zone, &intent).await,
            None => {
                debug!(zone = %zone, fan = %fan, "zone is off, fan change ignored");
                Ok(())
            }
        }
    }

    /// Unknown names fall back to [`crate::FAN_MODE_FALLBACK`].
    pub async fn set_fan_mode_named(&mut self, zone: &ZoneId, name: &str) -> Result<()> {
        let fan = resolve_fan_mode(name);
        if FanMode::from_name(name).is_none() {
            warn!(zone = %zone, requested = name, fallback = %fan, "unsupported fan mode");
        }
        self.set_fan_mode(zone, fan).await
    }

    pub async fn set_temperature(&mut self, zone: &ZoneId, requested: f64) -> Result<()> {
        let intent = self.thermostat(zone)?.request_temperature(requested)?;
        self.send_intent("set_temperature", zone, &intent).await
    }

    /// Re-send the zone's current local state.
    pub async fn push_state(&mut self, zone: &ZoneId) -> Result<()> {
        let intent = self.thermostat(zone)?.intent();
        self.send_intent("push_state", zone, &intent).await
    }

    // -- Helpers --

    fn thermostat(&self, zone: &ZoneId) -> Result<&Thermostat> {
        self.zones
            .get(zone)
            .ok_or_else(|| Error::InvalidZone(zone.name().to_string()))
    }

    /// Local state follows the intent only once the controller accepts it.
    async fn send_intent(&mut self, action: &str, zone: &ZoneId, intent: &ZoneIntent) -> Result<()> {
        let request = encode_command(zone, intent)?;
        let url = format!("{}{}", self.base_url, request.path());
        info!(zone = %zone, url = %url, "sending control request");

        let resp = match self
            .http
            .get(&url)
            .timeout(self.command_timeout)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                error!(zone = %zone, error = %e, "control request failed");
                if let Some(ref mut logger) = self.logger {
                    logger.log_command(action, zone.name(), &request.to_string(), None);
                }
                return Err(e.into());
            }
        };

        let status = resp.status().as_u16();
        if let Some(ref mut logger) = self.logger {
            logger.log_command(action, zone.name(), &request.to_string(), Some(status));
        }
        if status != 200 {
            error!(zone = %zone, status, "control request rejected");
            return Err(Error::Status(status));
        }
        debug!(zone = %zone, status, "control request ok");
        if let Some(thermostat) = self.zones.get_mut(zone) {
            thermostat.commit_intent(intent);
        }
        Ok(())
    }
}

fn decode_zones(entries: Vec<(String, String)>) -> BTreeMap<ZoneId, ZoneStatus> {
    let mut statuses = BTreeMap::new();
    for (name, record) in entries {
        let zone = match ZoneId::parse(&name) {
            Ok(zone) => zone,
            Err(_) => {
                trace!(element = %name, "ignoring non-zone element");
                continue;
            }
        };
        match decode_status(&record) {
            Ok(Some(status)) => {
                statuses.insert(zone, status);
            }
            Ok(None) => trace!(zone = %zone, "no data for zone"),
            Err(e) => warn!(zone = %zone, record = %record, error = %e, "skipping malformed status record"),
        }
    }
    statuses
}
