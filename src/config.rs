use serde::{Deserialize, Deserializer};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::predict::{GroundStation, PredictError};
use crate::tracker::{ControllerSettings, RigModel, RotorPolicy};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("station: {0}")]
    Station(String),
    #[error("station locator: {0}")]
    Locator(#[from] PredictError),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub station: StationConfig,
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub tracking: TrackingConfig,
    pub radio: RadioConfig,
    #[serde(default)]
    pub rotor: Option<RotorConfig>,
    #[serde(default)]
    pub web: Option<WebConfig>,
    #[serde(default)]
    pub api_keys: Vec<ApiKey>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StationConfig {
    pub name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Maidenhead locator, used when no coordinates are given.
    pub grid: Option<String>,
    #[serde(default)]
    pub altitude_m: f64,
}

impl StationConfig {
    pub fn ground_station(&self) -> Result<GroundStation, ConfigError> {
        match (self.latitude, self.longitude, &self.grid) {
            (Some(lat), Some(lon), _) => {
                if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
                    return Err(ConfigError::Station(format!(
                        "coordinates out of range: {}, {}",
                        lat, lon
                    )));
                }
                Ok(GroundStation::new(lat, lon, self.altitude_m))
            }
            (None, None, Some(grid)) => Ok(GroundStation::from_maidenhead(grid, self.altitude_m)?),
            _ => Err(ConfigError::Station(
                "set both latitude and longitude, or a grid locator".into(),
            )),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    pub tle_folder: PathBuf,
    pub transponder_folder: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    #[serde(deserialize_with = "deserialize_duration")]
    pub tick: Duration,
    #[serde(deserialize_with = "deserialize_duration")]
    pub flip_recheck: Duration,
    #[serde(deserialize_with = "deserialize_duration")]
    pub track_step: Duration,
    pub rotor_threshold_deg: f64,
    pub flip_threshold_deg: f64,
    pub retune_tolerance_hz: f64,
    pub no_flip: bool,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        let policy = RotorPolicy::default();
        let settings = ControllerSettings::default();
        Self {
            tick: Duration::from_secs(1),
            flip_recheck: Duration::from_secs(30),
            track_step: Duration::from_secs(10),
            rotor_threshold_deg: policy.rotor_threshold_deg,
            flip_threshold_deg: policy.flip_threshold_deg,
            retune_tolerance_hz: settings.retune_tolerance_hz,
            no_flip: policy.no_flip,
        }
    }
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    humantime::parse_duration(s.trim()).map_err(serde::de::Error::custom)
}

#[derive(Debug, Clone, Deserialize)]
pub struct RadioConfig {
    pub model: RigModel,
    #[serde(default)]
    pub connection: DeviceConnection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RotorConfig {
    #[serde(default)]
    pub connection: DeviceConnection,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeviceConnection {
    #[default]
    Dummy,
    /// `rigctld` or `rotctld` listening on `address` (host:port).
    Hamlib { address: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiKey {
    pub key: String,
    pub name: String,
    pub permissions: HashSet<Permission>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Read status and pass predictions.
    View,
    /// Select satellites and operate the rig.
    Control,
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)?;
        config.station.ground_station()?;
        Ok(config)
    }

    pub fn find_api_key(&self, key: &str) -> Option<&ApiKey> {
        self.api_keys.iter().find(|k| k.key == key)
    }

    pub fn controller_settings(&self) -> ControllerSettings {
        let t = &self.tracking;
        ControllerSettings {
            rig: self.radio.model,
            policy: RotorPolicy {
                flip_threshold_deg: t.flip_threshold_deg,
                rotor_threshold_deg: t.rotor_threshold_deg,
                no_flip: t.no_flip,
            },
            flip_recheck: chrono::Duration::from_std(t.flip_recheck)
                .unwrap_or_else(|_| ControllerSettings::default().flip_recheck),
            retune_tolerance_hz: t.retune_tolerance_hz,
        }
    }

    pub fn track_step(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.tracking.track_step)
            .unwrap_or_else(|_| chrono::Duration::seconds(crate::tracker::TRACK_STEP_SECONDS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
station:
  name: Home
  grid: FN31pr
  altitude_m: 20
catalog:
  tle_folder: ./tle
  transponder_folder: ./transponders
tracking:
  tick: 500ms
  flip_recheck: 1m
  no_flip: true
radio:
  model: ic9700
  connection:
    type: hamlib
    address: 127.0.0.1:4532
rotor:
  connection:
    type: hamlib
    address: 127.0.0.1:4533
web:
  bind: 127.0.0.1:9000
api_keys:
  - key: secret
    name: operator
    permissions: [view, control]
"#;

    const MINIMAL: &str = r#"
station:
  latitude: 52.1
  longitude: 5.2
catalog:
  tle_folder: tle
  transponder_folder: transponders
radio:
  model: dummy
"#;

    #[test]
    fn parses_full_config() {
        let config = Config::from_yaml(FULL).unwrap();
        let station = config.station.ground_station().unwrap();
        assert_eq!(station.maidenhead(6), "FN31PR");
        assert_eq!(station.altitude_m, 20.0);

        assert_eq!(config.tracking.tick, Duration::from_millis(500));
        assert_eq!(config.tracking.track_step, Duration::from_secs(10));
        assert_eq!(config.radio.model, RigModel::Ic9700);
        assert_eq!(
            config.radio.connection,
            DeviceConnection::Hamlib {
                address: "127.0.0.1:4532".into()
            }
        );
        assert_eq!(config.web.as_ref().unwrap().bind, "127.0.0.1:9000");

        let settings = config.controller_settings();
        assert!(settings.policy.no_flip);
        assert_eq!(settings.flip_recheck, chrono::Duration::minutes(1));

        let key = config.find_api_key("secret").unwrap();
        assert!(key.permissions.contains(&Permission::Control));
        assert!(config.find_api_key("other").is_none());
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let config = Config::from_yaml(MINIMAL).unwrap();
        assert_eq!(config.radio.connection, DeviceConnection::Dummy);
        assert!(config.rotor.is_none());
        assert!(config.web.is_none());
        assert_eq!(config.tracking.tick, Duration::from_secs(1));
        assert_eq!(config.tracking.rotor_threshold_deg, 10.0);
        assert_eq!(config.tracking.retune_tolerance_hz, 10.0);
    }

    #[test]
    fn station_needs_a_position() {
        let yaml = MINIMAL.replace("  longitude: 5.2\n", "");
        assert!(matches!(
            Config::from_yaml(&yaml),
            Err(ConfigError::Station(_))
        ));

        let yaml = MINIMAL
            .replace("  latitude: 52.1\n  longitude: 5.2\n", "  grid: ZZ99\n");
        assert!(matches!(Config::from_yaml(&yaml), Err(ConfigError::Locator(_))));
    }
}
