use std::path::PathBuf;

use anyhow::Context as _;
use url::Url;

pub const SUPPORT_CONTACT_VAR: &str = "APICONF_SUPPORT_CONTACT";
pub const DATA_DIR_VAR: &str = "APICONF_DATA_DIR";
pub const SOURCE_URL_VAR: &str = "APICONF_SOURCE_URL";

pub const DEFAULT_SUPPORT_CONTACT: &str = "support@apiconf.net";
pub const DEFAULT_DATA_DIR: &str = "data";

/// Process-wide settings shared by every tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub support_contact: String,
    pub data_dir: PathBuf,
    pub source_url: Option<Url>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            support_contact: DEFAULT_SUPPORT_CONTACT.to_owned(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            source_url: None,
        }
    }
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut settings = Self::default();
        if let Some(contact) = var(SUPPORT_CONTACT_VAR) {
            settings.support_contact = contact;
        }
        if let Some(dir) = var(DATA_DIR_VAR) {
            settings.data_dir = PathBuf::from(dir);
        }
        if let Some(raw) = var(SOURCE_URL_VAR) {
            let url = parse_source_url(&raw)
                .with_context(|| format!("invalid {SOURCE_URL_VAR}={raw:?}"))?;
            settings.source_url = Some(url);
        }
        Ok(settings)
    }
}

pub fn parse_source_url(raw: &str) -> anyhow::Result<Url> {
    let url = Url::parse(raw.trim()).context("parse scraping service url")?;
    if url.scheme() != "http" && url.scheme() != "https" {
        anyhow::bail!("scraping service url must be http/https: {url}");
    }
    Ok(url)
}
