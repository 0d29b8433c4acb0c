use crate::whatsapp::normalize_phone;
use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_path: String,
    pub repository_path: PathBuf,
    pub catalog_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub max_workers: usize,
    pub public_base_url: String,
    /// Shows issued sign-in links in the page instead of only logging them.
    pub dev_mode: bool,
    pub cookie_secure: bool,
    pub fb_cookie: Option<String>,
    pub scraper_delay_ms: u64,
    pub whatsapp: WhatsAppConfig,
}

#[derive(Debug, Clone, Default)]
pub struct WhatsAppConfig {
    /// Agency number that receives contact requests, normalised to digits with country code.
    pub agency_number: Option<String>,
    pub token: Option<String>,
    pub phone_number_id: Option<String>,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();
        Self::from_vars(|key| env::var(key).ok())
    }

    pub fn from_vars<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| var(key).filter(|v| !v.trim().is_empty());
        let agency_number = non_empty("WHATSAPP_NUMERO_AGENCIA")
            .map(|raw| {
                normalize_phone(&raw).with_context(|| {
                    format!("WHATSAPP_NUMERO_AGENCIA is not a valid phone number: {raw}")
                })
            })
            .transpose()?;

        Ok(Self {
            database_path: var("DATABASE_PATH")
                .unwrap_or_else(|| "propiedades.sqlite3".to_string()),
            repository_path: var("REPOSITORIO_PATH")
                .unwrap_or_else(|| "resultados/repositorio_propiedades.json".to_string())
                .into(),
            catalog_path: var("CATALOGO_PATH")
                .unwrap_or_else(|| "resultados/propiedades_estructuradas.json".to_string())
                .into(),
            host: var("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: var("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            max_workers: var("MAX_WORKERS")
                .unwrap_or_else(|| "8".to_string())
                .parse()
                .context("MAX_WORKERS must be a positive number")?,
            public_base_url: var("PUBLIC_BASE_URL")
                .unwrap_or_else(|| "http://127.0.0.1:8080".to_string())
                .trim_end_matches('/')
                .to_string(),
            dev_mode: parse_flag(var("DEV_MODE")),
            cookie_secure: parse_flag(var("COOKIE_SECURE")),
            fb_cookie: non_empty("FB_COOKIE"),
            scraper_delay_ms: var("SCRAPER_DELAY_MS")
                .unwrap_or_else(|| "2000".to_string())
                .parse()
                .context("SCRAPER_DELAY_MS must be a number of milliseconds")?,
            whatsapp: WhatsAppConfig {
                agency_number,
                token: non_empty("WHATSAPP_TOKEN"),
                phone_number_id: non_empty("WHATSAPP_PHONE_NUMBER_ID"),
            },
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_flag(value: Option<String>) -> bool {
    matches!(
        value.as_deref().map(str::trim).map(str::to_ascii_lowercase).as_deref(),
        Some("1" | "true" | "yes" | "on")
    )
}
