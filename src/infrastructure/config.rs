use crate::application::playback::{PlaybackSettings, SpeedCurve};
use crate::domain::filter::LmpFilter;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    #[serde(default)]
    pub server: ServerSettings,
    pub backend: BackendSettings,
    #[serde(default)]
    pub playback: PlaybackConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub default_filter: Option<LmpFilter>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackendSettings {
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PlaybackConfig {
    pub default_interval_ms: u64,
    pub speed_offset_ms: u64,
    pub min_speed: u64,
    pub max_speed: u64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            default_interval_ms: 1000,
            speed_offset_ms: 3100,
            min_speed: 100,
            max_speed: 3000,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DisplayConfig {
    pub network_zone: String,
    pub zones: Vec<String>,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            network_zone: "PJM".to_string(),
            zones: Vec::new(),
        }
    }
}

impl DashboardConfig {
    pub fn playback_settings(&self) -> anyhow::Result<PlaybackSettings> {
        let p = &self.playback;
        if p.min_speed > p.max_speed || p.max_speed >= p.speed_offset_ms {
            anyhow::bail!(
                "playback speed range {}..={} must sit below speed_offset_ms {}",
                p.min_speed,
                p.max_speed,
                p.speed_offset_ms
            );
        }

        Ok(PlaybackSettings {
            default_interval: Duration::from_millis(p.default_interval_ms.max(1)),
            speed: SpeedCurve {
                offset_ms: p.speed_offset_ms,
                min_control: p.min_speed,
                max_control: p.max_speed,
            },
            network_zone: self.display.network_zone.clone(),
            zones: self.display.zones.iter().cloned().collect::<BTreeSet<_>>(),
        })
    }
}

/// Reads `config/dashboard.*`, overridden by `DASHBOARD__SECTION__KEY` variables.
pub fn load_dashboard_config() -> anyhow::Result<DashboardConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/dashboard"))
        .add_source(config::Environment::with_prefix("DASHBOARD").separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml: &str) -> DashboardConfig {
        config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults_fill_missing_sections() {
        let cfg = parse(
            r#"
            [backend]
            base_url = "http://localhost:8000"
            "#,
        );
        assert_eq!(cfg.server.bind, "0.0.0.0:8080");
        assert_eq!(cfg.backend.timeout_secs, 30);
        assert!(cfg.default_filter.is_none());

        let settings = cfg.playback_settings().unwrap();
        assert_eq!(settings.default_interval, Duration::from_millis(1000));
        assert_eq!(settings.speed.interval_for(3000), Duration::from_millis(100));
        assert_eq!(settings.network_zone, "PJM");
    }

    #[test]
    fn test_zones_and_filter() {
        let cfg = parse(
            r#"
            [backend]
            base_url = "http://localhost:8000"

            [display]
            network_zone = "RTO"
            zones = ["DOM", "AEP", "PECO"]

            [default_filter]
            start_day = "2025-07-13"
            end_day = "2025-07-19"
            days_of_week = [2, 3, 4, 5, 6]
            start_hour = 15
            end_hour = 20
            "#,
        );
        let settings = cfg.playback_settings().unwrap();
        let zones: Vec<_> = settings.zones.iter().map(String::as_str).collect();
        assert_eq!(zones, vec!["AEP", "DOM", "PECO"]);
        assert_eq!(cfg.default_filter.unwrap().estimated_hours(), 25);
    }

    #[test]
    fn test_rejects_inverted_speed_range() {
        let mut cfg = parse(
            r#"
            [backend]
            base_url = "http://localhost:8000"
            "#,
        );
        cfg.playback.max_speed = 4000;
        assert!(cfg.playback_settings().is_err());
    }
}
