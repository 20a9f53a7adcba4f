use std::env;
use std::path::PathBuf;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_base_url: String,
    pub api_token: String,
    pub preferences_path: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            api_base_url: env::var("MEDBOOK_API_BASE_URL")
                .unwrap_or_else(|_| {
                    warn!("MEDBOOK_API_BASE_URL not set, using empty value");
                    String::new()
                }),
            api_token: env::var("MEDBOOK_API_TOKEN")
                .unwrap_or_else(|_| {
                    warn!("MEDBOOK_API_TOKEN not set, using empty value");
                    String::new()
                }),
            preferences_path: env::var("MEDBOOK_PREFS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_preferences_path()),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.api_base_url.is_empty() && !self.api_token.is_empty()
    }
}

fn default_preferences_path() -> PathBuf {
    env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".medbook")
        .join("preferences.json")
}
