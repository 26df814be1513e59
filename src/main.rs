use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;
use serde::Serialize;

use apiconf_agent::cli::{Cli, Command};
use apiconf_agent::store::{ConferenceStore as _, LocalFsConferenceStore};
use apiconf_agent::tools::{
    ConferenceInfoRequest, ScrapeRequest, ToolRegistry, UpdateConferenceDataRequest,
};

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    apiconf_agent::logging::init(apiconf_agent::logging::CLI_FILTER).context("init logging")?;

    let cli = Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    match cli.command {
        Command::Scrape(args) => {
            let tools = cli.settings.tools()?;
            print_json(&tools.scrape(ScrapeRequest { url: args.url }).await)?;
        }
        Command::Info => {
            let tools = cli.settings.tools()?;
            print_json(&tools.get_conference_info(ConferenceInfoRequest {}).await)?;
        }
        Command::Update => {
            let tools = cli.settings.tools()?;
            print_json(
                &tools
                    .update_conference_data(UpdateConferenceDataRequest {})
                    .await,
            )?;
        }
        Command::Tools => {
            print_json(&ToolRegistry::specs())?;
        }
        Command::Call(args) => {
            let arguments: serde_json::Value =
                serde_json::from_str(&args.args).context("parse --args as JSON")?;
            let registry = ToolRegistry::new(std::sync::Arc::new(cli.settings.tools()?));
            print_json(&registry.dispatch(&args.name, arguments).await)?;
        }
        Command::Cached => {
            let settings = cli.settings.settings()?;
            let store = LocalFsConferenceStore::new(settings.data_dir);
            let speakers = store.get_speakers().await.context("load speakers")?;
            let schedule = store.get_schedule().await.context("load schedule")?;
            print_json(&serde_json::json!({
                "speakers": speakers,
                "schedule": schedule,
            }))?;
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let text = serde_json::to_string_pretty(value).context("serialize output")?;
    println!("{text}");
    Ok(())
}
