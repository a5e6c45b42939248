use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

const DEFAULT_REACTIVATION_PERIOD_SECS: u64 = 120;

#[derive(Deserialize, Debug, Clone)]
pub struct ReminderSettings {
    pub reactivation_period_secs: u64,
}

impl ReminderSettings {
    pub fn reactivation_period(&self) -> Duration {
        Duration::from_secs(self.reactivation_period_secs)
    }
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            reactivation_period_secs: DEFAULT_REACTIVATION_PERIOD_SECS,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct AppSettings {
    pub reminders: ReminderSettings,
}

impl AppSettings {
    pub fn load() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name("appsettings").required(false))
            .add_source(File::with_name("appsettings.local").required(false))
            .add_source(Environment::with_prefix("APP").separator("__"));

        Self::from_builder(builder)
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, ConfigError> {
        let settings: Self = builder
            .set_default(
                "reminders.reactivation_period_secs",
                DEFAULT_REACTIVATION_PERIOD_SECS,
            )?
            .build()?
            .try_deserialize()?;

        if settings.reminders.reactivation_period_secs == 0 {
            return Err(ConfigError::Message(
                "reminders.reactivation_period_secs must be positive".to_owned(),
            ));
        }

        Ok(settings)
    }
}
