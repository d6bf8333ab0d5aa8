use std::{env, fs, time::Duration};

use aggregator::DEFAULT_FAN_OUT_LIMIT;
use toml::Value;
use tracing::warn;
use upstream::{UpstreamConfig, DEFAULT_BASE_URL};

#[derive(Debug, Clone)]
pub struct Settings {
    pub server_bind: String,
    pub upstream_base_url: String,
    pub access_token: Option<String>,
    pub page_limit: u32,
    pub fan_out_limit: usize,
    pub request_timeout_seconds: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:8080".into(),
            upstream_base_url: DEFAULT_BASE_URL.into(),
            access_token: None,
            page_limit: 100,
            fan_out_limit: DEFAULT_FAN_OUT_LIMIT,
            request_timeout_seconds: 30,
        }
    }
}

impl Settings {
    pub fn upstream_config(&self) -> UpstreamConfig {
        UpstreamConfig {
            base_url: self.upstream_base_url.clone(),
            access_token: self.access_token.clone(),
            page_limit: self.page_limit,
            request_timeout: Duration::from_secs(self.request_timeout_seconds),
        }
    }
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("server.toml") {
        match toml::from_str::<toml::Table>(&raw) {
            Ok(file_cfg) => apply_file_overrides(&mut settings, &file_cfg),
            Err(error) => warn!(%error, "ignoring malformed server.toml"),
        }
    }

    apply_env_overrides(&mut settings);
    settings
}

// Settings are read key by key from the parsed table: numbers may be
// written as TOML integers or quoted strings, and one bad value never
// discards the rest of the file.
fn apply_file_overrides(settings: &mut Settings, file_cfg: &toml::Table) {
    if let Some(v) = str_setting(file_cfg, "bind_addr") {
        settings.server_bind = v;
    }
    if let Some(v) = str_setting(file_cfg, "upstream_base_url") {
        settings.upstream_base_url = v;
    }
    if let Some(v) = str_setting(file_cfg, "access_token") {
        settings.access_token = non_empty(&v);
    }
    if let Some(parsed) = int_setting(file_cfg, "page_limit").and_then(|v| u32::try_from(v).ok()) {
        settings.page_limit = parsed;
    }
    if let Some(parsed) =
        int_setting(file_cfg, "fan_out_limit").and_then(|v| usize::try_from(v).ok())
    {
        settings.fan_out_limit = parsed;
    }
    if let Some(parsed) = int_setting(file_cfg, "request_timeout_seconds") {
        settings.request_timeout_seconds = parsed;
    }
}

fn str_setting(table: &toml::Table, key: &str) -> Option<String> {
    table
        .get(key)
        .and_then(Value::as_str)
        .map(|v| v.to_string())
}

fn int_setting(table: &toml::Table, key: &str) -> Option<u64> {
    match table.get(key)? {
        Value::Integer(v) => u64::try_from(*v).ok(),
        Value::String(v) => v.parse().ok(),
        _ => None,
    }
}

fn apply_env_overrides(settings: &mut Settings) {
    if let Ok(v) = env::var("SERVER_BIND") {
        settings.server_bind = v;
    }
    if let Ok(v) = env::var("APP__BIND_ADDR") {
        settings.server_bind = v;
    }

    if let Ok(v) = env::var("UPSTREAM_BASE_URL") {
        settings.upstream_base_url = v;
    }
    if let Ok(v) = env::var("APP__UPSTREAM_BASE_URL") {
        settings.upstream_base_url = v;
    }

    if let Ok(v) = env::var("ACCESS_TOKEN") {
        settings.access_token = non_empty(&v);
    }
    if let Ok(v) = env::var("APP__ACCESS_TOKEN") {
        settings.access_token = non_empty(&v);
    }

    if let Ok(v) = env::var("APP__PAGE_LIMIT") {
        if let Ok(parsed) = v.parse::<u32>() {
            settings.page_limit = parsed;
        }
    }
    if let Ok(v) = env::var("APP__FAN_OUT_LIMIT") {
        if let Ok(parsed) = v.parse::<usize>() {
            settings.fan_out_limit = parsed;
        }
    }
    if let Ok(v) = env::var("APP__REQUEST_TIMEOUT_SECONDS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout_seconds = parsed;
        }
    }
}

// A blank token is the same as no token; the aggregator refuses to run
// without a real credential.
fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
