use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};

use crate::config::{self, Settings};
use crate::source::{ConferenceSource, HttpBundleSource, StaticSource};
use crate::store::LocalFsConferenceStore;
use crate::tools::ConferenceTools;

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(flatten)]
    pub settings: SettingsArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch conference data, optionally focused on one page.
    Scrape(ScrapeArgs),
    /// Print the consolidated conference information view.
    Info,
    /// Refresh the local speakers/schedule cache.
    Update,
    /// Print the JSON description of every tool.
    Tools,
    /// Invoke a tool by name with a JSON argument object.
    Call(CallArgs),
    /// Print the cached speakers and schedule documents.
    Cached,
}

#[derive(Debug, Args)]
pub struct ScrapeArgs {
    /// Page URL to focus on (spaces or registration).
    #[arg(long)]
    pub url: Option<String>,
}

#[derive(Debug, Args)]
pub struct CallArgs {
    /// Tool name.
    pub name: String,

    /// Tool arguments as a JSON object.
    #[arg(long, default_value = "{}")]
    pub args: String,
}

/// Overrides for the `APICONF_*` environment settings.
#[derive(Debug, Clone, Default, Args)]
pub struct SettingsArgs {
    /// Directory holding `speakers.json` and `schedule.json`.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Scraping service endpoint returning the section bundle as JSON.
    #[arg(long, global = true, conflicts_with = "bundle")]
    pub source_url: Option<String>,

    /// Read the section bundle from a JSON file instead of the scraping service.
    #[arg(long, global = true)]
    pub bundle: Option<PathBuf>,

    /// Support contact included in every response.
    #[arg(long, global = true)]
    pub support_contact: Option<String>,
}

impl SettingsArgs {
    pub fn settings(&self) -> anyhow::Result<Settings> {
        let mut settings = Settings::from_env().context("load settings from environment")?;
        if let Some(dir) = &self.data_dir {
            settings.data_dir = dir.clone();
        }
        if let Some(raw) = &self.source_url {
            settings.source_url =
                Some(config::parse_source_url(raw).context("parse --source-url")?);
        }
        if let Some(contact) = self
            .support_contact
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
        {
            settings.support_contact = contact.to_owned();
        }
        Ok(settings)
    }

    pub fn source(&self, settings: &Settings) -> anyhow::Result<Arc<dyn ConferenceSource>> {
        if let Some(path) = &self.bundle {
            return Ok(Arc::new(StaticSource::from_file(path)?));
        }
        let endpoint = settings.source_url.clone().ok_or_else(|| {
            anyhow::anyhow!(
                "a scraping service is required: pass --source-url, set {}, or pass --bundle",
                config::SOURCE_URL_VAR
            )
        })?;
        Ok(Arc::new(HttpBundleSource::new(endpoint)?))
    }

    pub fn tools(&self) -> anyhow::Result<ConferenceTools> {
        let settings = self.settings()?;
        let source = self.source(&settings).context("build conference source")?;
        tracing::debug!(?settings, "conference tools configured");
        Ok(ConferenceTools::new(
            source,
            Arc::new(LocalFsConferenceStore::new(settings.data_dir)),
            settings.support_contact,
        ))
    }
}
