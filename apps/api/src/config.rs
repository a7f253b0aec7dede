use std::time::Duration;

use anyhow::{Context, Result};

use crate::layout::LayoutConfig;
use crate::llm_client::DEFAULT_MODEL;

const DEFAULT_DEBOUNCE_MS: u64 = 250;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or unparseable.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Text improvement is disabled when unset.
    pub anthropic_api_key: Option<String>,
    pub llm_model: String,
    pub port: u16,
    pub rust_log: String,
    pub layout_debounce: Duration,
    pub layout: LayoutConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup, so parsing is testable without
    /// touching the process environment.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let defaults = LayoutConfig::default();
        let mut layout = defaults;
        layout.page_height_px = parse_or(&get, "LAYOUT_PAGE_HEIGHT_PX", defaults.page_height_px)?;
        layout.min_space.section_title = parse_or(
            &get,
            "LAYOUT_MIN_SPACE_SECTION_TITLE_PX",
            defaults.min_space.section_title,
        )?;
        layout.min_space.header =
            parse_or(&get, "LAYOUT_MIN_SPACE_HEADER_PX", defaults.min_space.header)?;
        layout.unit_tolerance_px =
            parse_or(&get, "LAYOUT_UNIT_TOLERANCE_PX", defaults.unit_tolerance_px)?;
        layout.push_buffer_px = parse_or(&get, "LAYOUT_PUSH_BUFFER_PX", defaults.push_buffer_px)?;

        Ok(Config {
            database_url: get("DATABASE_URL")
                .context("Required environment variable 'DATABASE_URL' is not set")?,
            anthropic_api_key: get("ANTHROPIC_API_KEY"),
            llm_model: get("LLM_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            port: parse_or(&get, "PORT", 8080)?,
            rust_log: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            layout_debounce: Duration::from_millis(parse_or(
                &get,
                "LAYOUT_DEBOUNCE_MS",
                DEFAULT_DEBOUNCE_MS,
            )?),
            layout: layout.sanitized(),
        })
    }
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        None => Ok(default),
    }
}
