use anyhow::{anyhow, Result};
use chrono::{Datelike, NaiveDate, Utc, Weekday};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::sync::Arc;

use super::connection::CsvConnection;

/// Per-deployment event configuration: which weekday the event runs on
/// and the fixed cutoff date used for age classification across the
/// whole period.
#[derive(Debug, Clone, PartialEq)]
pub struct EventSettings {
    pub event_weekday: Weekday,
    pub classification_cutoff: NaiveDate,
}

impl Default for EventSettings {
    /// Sunday event; cutoff June 30 of the current year.
    fn default() -> Self {
        let year = Utc::now().date_naive().year();
        Self {
            event_weekday: Weekday::Sun,
            // June 30 exists in every year.
            classification_cutoff: NaiveDate::from_ymd_opt(year, 6, 30).unwrap(),
        }
    }
}

/// Intermediate struct for YAML serialization with string fields
#[derive(Debug, Serialize, Deserialize)]
struct YamlSettings {
    event_weekday: String,
    classification_cutoff: String,
}

/// YAML-backed settings repository, one `settings.yaml` beside the data.
#[derive(Clone)]
pub struct SettingsRepository {
    connection: Arc<CsvConnection>,
}

impl SettingsRepository {
    /// Create a new settings repository
    pub fn new(connection: Arc<CsvConnection>) -> Self {
        Self { connection }
    }

    /// Load settings, falling back to defaults when no file exists yet.
    pub fn load(&self) -> Result<EventSettings> {
        let path = self.connection.settings_file();
        if !path.exists() {
            return Ok(EventSettings::default());
        }

        let yaml_content = fs::read_to_string(&path)?;
        let yaml: YamlSettings = serde_yaml::from_str(&yaml_content)?;

        let event_weekday = parse_weekday(&yaml.event_weekday)
            .ok_or_else(|| anyhow!("unknown event weekday '{}'", yaml.event_weekday))?;
        let classification_cutoff =
            NaiveDate::parse_from_str(&yaml.classification_cutoff, "%Y-%m-%d").map_err(|e| {
                anyhow!(
                    "failed to parse classification cutoff '{}': {}",
                    yaml.classification_cutoff,
                    e
                )
            })?;

        Ok(EventSettings {
            event_weekday,
            classification_cutoff,
        })
    }

    /// Persist settings atomically.
    pub fn save(&self, settings: &EventSettings) -> Result<()> {
        let yaml = YamlSettings {
            event_weekday: weekday_name(settings.event_weekday).to_string(),
            classification_cutoff: settings
                .classification_cutoff
                .format("%Y-%m-%d")
                .to_string(),
        };
        let yaml_content = serde_yaml::to_string(&yaml)?;
        self.connection
            .write_atomic(&self.connection.settings_file(), yaml_content.as_bytes())?;
        info!(
            "Saved event settings: weekday={}, cutoff={}",
            yaml.event_weekday, yaml.classification_cutoff
        );
        Ok(())
    }
}

fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

fn parse_weekday(value: &str) -> Option<Weekday> {
    match value {
        "monday" => Some(Weekday::Mon),
        "tuesday" => Some(Weekday::Tue),
        "wednesday" => Some(Weekday::Wed),
        "thursday" => Some(Weekday::Thu),
        "friday" => Some(Weekday::Fri),
        "saturday" => Some(Weekday::Sat),
        "sunday" => Some(Weekday::Sun),
        _ => None,
    }
}
