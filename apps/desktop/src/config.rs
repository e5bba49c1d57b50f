use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "dashboard.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_url: String,
    pub student_id: Option<String>,
    pub standard: Option<u32>,
    pub notice_delay_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:8000".into(),
            student_id: None,
            standard: None,
            notice_delay_ms: 3_000,
        }
    }
}

impl Settings {
    pub fn notice_delay(&self) -> Duration {
        Duration::from_millis(self.notice_delay_ms)
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_url: Option<String>,
    student_id: Option<String>,
    standard: Option<u32>,
    notice_delay_ms: Option<u64>,
}

/// Defaults, then the config file, then environment overrides.
pub fn load_settings(config_path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let (path, required) = match config_path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };
    match fs::read_to_string(&path) {
        Ok(raw) => apply_file(&mut settings, &raw)
            .with_context(|| format!("invalid config file '{}'", path.display()))?,
        Err(err) if required => {
            return Err(err).with_context(|| format!("failed to read '{}'", path.display()));
        }
        Err(_) => {}
    }

    apply_env(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg: FileSettings = toml::from_str(raw)?;
    if let Some(v) = file_cfg.api_url {
        settings.api_url = v;
    }
    if let Some(v) = file_cfg.student_id {
        settings.student_id = Some(v);
    }
    if let Some(v) = file_cfg.standard {
        settings.standard = Some(v);
    }
    if let Some(v) = file_cfg.notice_delay_ms {
        settings.notice_delay_ms = v;
    }
    Ok(())
}

fn apply_env(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("API_URL") {
        settings.api_url = v;
    }
    if let Some(v) = var("APP__API_URL") {
        settings.api_url = v;
    }

    if let Some(v) = var("STUDENT_ID") {
        settings.student_id = Some(v);
    }
    if let Some(v) = var("APP__STUDENT_ID") {
        settings.student_id = Some(v);
    }

    if let Some(v) = var("APP__STANDARD") {
        if let Ok(parsed) = v.trim().parse::<u32>() {
            settings.standard = Some(parsed);
        }
    }

    if let Some(v) = var("APP__NOTICE_DELAY_MS") {
        if let Ok(parsed) = v.trim().parse::<u64>() {
            settings.notice_delay_ms = parsed;
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
