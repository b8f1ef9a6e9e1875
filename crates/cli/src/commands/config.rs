use std::env;
use std::fs;
use std::path::Path;

use reimbly_core::config::{resolve_config_path, AppConfig, LoadOptions};
use toml::Value;

use super::CommandResult;

/// Prints the effective configuration as text, or a JSON failure outcome with exit code 2.
pub fn run() -> CommandResult {
    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => CommandResult::text(render(&config, resolve_config_path(None).as_deref())),
        Err(error) => CommandResult::failure(
            "config",
            "config_validation",
            format!("config validation failed: {error}"),
            2,
        ),
    }
}

fn render(config: &AppConfig, config_file_path: Option<&Path>) -> String {
    let config_file_doc = load_config_file_doc(config_file_path);
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path)
    };

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line(
        "reports.amount_scale",
        &config.reports.amount_scale.to_string(),
        source("reports.amount_scale", &["REIMBLY_REPORTS_AMOUNT_SCALE"]),
    ));
    lines.push(render_line(
        "reports.max_description_chars",
        &config.reports.max_description_chars.to_string(),
        source("reports.max_description_chars", &["REIMBLY_REPORTS_MAX_DESCRIPTION_CHARS"]),
    ));

    lines.push(render_line(
        "notifications.enabled",
        &config.notifications.enabled.to_string(),
        source("notifications.enabled", &["REIMBLY_NOTIFICATIONS_ENABLED"]),
    ));
    lines.push(render_line(
        "notifications.review_base_url",
        config.notifications.review_base_url.as_deref().unwrap_or("<unset>"),
        source("notifications.review_base_url", &["REIMBLY_NOTIFICATIONS_REVIEW_BASE_URL"]),
    ));

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        source("logging.level", &["REIMBLY_LOGGING_LEVEL", "REIMBLY_LOG_LEVEL"]),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        source("logging.format", &["REIMBLY_LOGGING_FORMAT", "REIMBLY_LOG_FORMAT"]),
    ));

    lines.join("\n")
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) =
        env_keys.iter().find(|key| env::var(key).is_ok_and(|value| !value.trim().is_empty()))
    {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
