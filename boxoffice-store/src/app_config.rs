use serde::Deserialize;
use std::env;

use boxoffice_booking::policy::BookingRules;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub runtime: RuntimeConfig,
    pub sweeper: SweeperConfig,
    pub booking_rules: BookingRules,
    pub demo: DemoConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RuntimeConfig {
    pub event_channel_capacity: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SweeperConfig {
    pub interval_seconds: u64,
}

/// Venue the runtime binary seeds at startup so the engine has seats to
/// manage out of the box.
#[derive(Debug, Deserialize, Clone)]
pub struct DemoConfig {
    pub concert_title: String,
    pub venue: String,
    pub seat_count: u32,
    pub seat_price: i64,
    pub currency: String,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Add in the current environment file, default 'development'.
            // This file is optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add in a local configuration file that stays out of git
            .add_source(config::File::with_name("config/local").required(false))
            // Add in settings from the environment (with a prefix of BOXOFFICE)
            // E.g. `BOXOFFICE__SWEEPER__INTERVAL_SECONDS=5`
            .add_source(config::Environment::with_prefix("BOXOFFICE").separator("__"))
            .build()?;

        let loaded: Self = s.try_deserialize()?;
        loaded
            .booking_rules
            .validate()
            .map_err(config::ConfigError::Message)?;
        Ok(loaded)
    }
}
