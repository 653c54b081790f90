use std::{collections::HashMap, fs, path::Path, time::Duration};

use serde::Deserialize;
use tracing::warn;

pub const SETTINGS_FILE: &str = "gat.toml";
const ENV_PREFIX: &str = "GAT__";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthoringSettings {
    pub server_url: String,
    pub username: String,
    pub course_folder_path: String,
    pub browser_session_key: String,
    pub read_only: bool,
    pub default_recall_allowed_attempts: u32,
    pub default_practice_allowed_attempts: u32,
    pub content_refresh_debounce_ms: u64,
    /// Base of the domain content server used to build preview URLs.
    pub domain_content_url: Option<String>,
}

impl Default for AuthoringSettings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8080".into(),
            username: "author".into(),
            course_folder_path: String::new(),
            browser_session_key: String::new(),
            read_only: false,
            default_recall_allowed_attempts: 3,
            default_practice_allowed_attempts: 3,
            content_refresh_debounce_ms: 2500,
            domain_content_url: None,
        }
    }
}

impl AuthoringSettings {
    pub fn content_refresh_debounce(&self) -> Duration {
        Duration::from_millis(self.content_refresh_debounce_ms)
    }

    fn apply(&mut self, key: &str, value: &str) {
        match key {
            "server_url" => self.server_url = value.to_string(),
            "username" => self.username = value.to_string(),
            "course_folder_path" => self.course_folder_path = value.to_string(),
            "browser_session_key" => self.browser_session_key = value.to_string(),
            "domain_content_url" => self.domain_content_url = Some(value.to_string()),
            "read_only" => match value.trim().parse::<bool>() {
                Ok(parsed) => self.read_only = parsed,
                Err(_) => warn!(key, value, "config: ignoring non-boolean value"),
            },
            "default_recall_allowed_attempts" => {
                parse_into(key, value, &mut self.default_recall_allowed_attempts)
            }
            "default_practice_allowed_attempts" => {
                parse_into(key, value, &mut self.default_practice_allowed_attempts)
            }
            "content_refresh_debounce_ms" => {
                parse_into(key, value, &mut self.content_refresh_debounce_ms)
            }
            _ => {}
        }
    }
}

fn parse_into<T: std::str::FromStr>(key: &str, value: &str, slot: &mut T) {
    match value.trim().parse::<T>() {
        Ok(parsed) => *slot = parsed,
        Err(_) => warn!(key, value, "config: ignoring non-numeric value"),
    }
}

/// Defaults, then `gat.toml` in the working directory, then `GAT__*` variables.
pub fn load_settings() -> AuthoringSettings {
    load_settings_from(Path::new(SETTINGS_FILE), std::env::vars())
}

pub fn load_settings_from(
    file: &Path,
    env: impl IntoIterator<Item = (String, String)>,
) -> AuthoringSettings {
    let mut settings = AuthoringSettings::default();

    if let Ok(raw) = fs::read_to_string(file) {
        match toml::from_str::<HashMap<String, toml::Value>>(&raw) {
            Ok(file_cfg) => {
                for (key, value) in file_cfg {
                    let value = match value {
                        toml::Value::String(text) => text,
                        other => other.to_string(),
                    };
                    settings.apply(&key, &value);
                }
            }
            Err(err) => warn!(path = %file.display(), "config: unreadable settings file: {err}"),
        }
    }

    for (key, value) in env {
        if let Some(name) = key.strip_prefix(ENV_PREFIX) {
            settings.apply(&name.to_ascii_lowercase(), &value);
        }
    }

    settings
}
