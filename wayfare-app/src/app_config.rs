use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub booking_rules: BookingRules,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BookingRules {
    /// How long an unpaid booking holds its seats before the reconciler
    /// cancels it.
    #[serde(default = "default_payment_timeout_minutes")]
    pub payment_timeout_minutes: u64,
    /// How often the expiration sweep runs.
    #[serde(default = "default_sweep_interval_seconds")]
    pub sweep_interval_seconds: u64,
}

fn default_payment_timeout_minutes() -> u64 {
    10
}

fn default_sweep_interval_seconds() -> u64 {
    60
}

impl Default for BookingRules {
    fn default() -> Self {
        Self {
            payment_timeout_minutes: default_payment_timeout_minutes(),
            sweep_interval_seconds: default_sweep_interval_seconds(),
        }
    }
}

impl BookingRules {
    pub fn payment_timeout(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.payment_timeout_minutes as i64)
    }

    pub fn sweep_period(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.sweep_interval_seconds)
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(config::File::with_name("config/local").required(false))
            // Eg. `WAYFARE_BOOKING_RULES__PAYMENT_TIMEOUT_MINUTES=5`
            .add_source(config::Environment::with_prefix("WAYFARE").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
