// file: src/models/settings.rs
use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Setting {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub notifications_enabled: bool,
    pub dark_mode_enabled: bool,
    pub timezone: String, // IANA name, e.g. "America/Sao_Paulo"
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            notifications_enabled: true,
            dark_mode_enabled: false,
            timezone: "UTC".to_string(),
        }
    }
}

impl Settings {
    /// Dark mode off, notifications on. The timezone is not a preference
    /// and survives a reset.
    pub fn reset_preferences(&mut self) {
        self.notifications_enabled = true;
        self.dark_mode_enabled = false;
    }

    pub fn tz(&self) -> AppResult<chrono_tz::Tz> {
        chrono_tz::Tz::from_str(&self.timezone)
            .map_err(|_| AppError::config(format!("Unknown timezone: {}", self.timezone)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_default() {
        let settings = Settings::default();
        assert!(settings.notifications_enabled);
        assert!(!settings.dark_mode_enabled);
        assert_eq!(settings.timezone, "UTC");
    }

    #[test]
    fn test_reset_preferences_keeps_timezone() {
        let mut settings = Settings {
            notifications_enabled: false,
            dark_mode_enabled: true,
            timezone: "America/Sao_Paulo".to_string(),
        };
        settings.reset_preferences();

        assert!(settings.notifications_enabled);
        assert!(!settings.dark_mode_enabled);
        assert_eq!(settings.timezone, "America/Sao_Paulo");
    }

    #[test]
    fn test_tz() {
        let mut settings = Settings::default();
        assert_eq!(settings.tz().unwrap(), chrono_tz::UTC);

        settings.timezone = "Mars/Olympus_Mons".to_string();
        assert!(matches!(settings.tz(), Err(AppError::Config(_))));
    }
}
