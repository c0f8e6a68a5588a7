use chrono_tz::Tz;
use log::LevelFilter;
use seatduty_api::client::DEFAULT_BASE_URL;
use std::str::FromStr;

pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Asia::Jerusalem;

#[derive(Debug, Clone)]
pub struct AppSettings {
    pub full_screen: bool,
    pub log_level: Option<LevelFilter>,
    /// Base URL of the seatduty proxy.
    pub api_url: String,
    /// Zone used for every date shown on screen.
    pub timezone: Tz,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            full_screen: false,
            log_level: None,
            api_url: DEFAULT_BASE_URL.to_string(),
            timezone: DEFAULT_TIMEZONE,
        }
    }
}

impl AppSettings {
    pub fn load() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();
        Self {
            full_screen: false,
            log_level: get("SEATDUTY_LOG").and_then(|v| LevelFilter::from_str(v.trim()).ok()),
            api_url: get("SEATDUTY_API_URL").unwrap_or(defaults.api_url),
            timezone: get("SEATDUTY_TZ")
                .and_then(|v| Tz::from_str(v.trim()).ok())
                .unwrap_or(defaults.timezone),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> AppSettings {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppSettings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_without_environment() {
        let s = settings(&[]);
        assert_eq!(s.api_url, DEFAULT_BASE_URL);
        assert_eq!(s.timezone, DEFAULT_TIMEZONE);
        assert_eq!(s.log_level, None);
    }

    #[test]
    fn environment_overrides_are_read() {
        let s = settings(&[
            ("SEATDUTY_API_URL", "http://proxy:8080"),
            ("SEATDUTY_TZ", "Europe/London"),
            ("SEATDUTY_LOG", "debug"),
        ]);
        assert_eq!(s.api_url, "http://proxy:8080");
        assert_eq!(s.timezone, chrono_tz::Europe::London);
        assert_eq!(s.log_level, Some(LevelFilter::Debug));
    }

    #[test]
    fn invalid_values_fall_back() {
        let s = settings(&[("SEATDUTY_TZ", "Mars/Olympus"), ("SEATDUTY_API_URL", "  ")]);
        assert_eq!(s.timezone, DEFAULT_TIMEZONE);
        assert_eq!(s.api_url, DEFAULT_BASE_URL);
    }
}
