use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser;

use apiconf_agent::cli::SettingsArgs;
use apiconf_agent::tools::ToolRegistry;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct ServerArgs {
    #[arg(long, default_value = "127.0.0.1:8080")]
    addr: SocketAddr,

    #[command(flatten)]
    settings: SettingsArgs,
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return std::process::ExitCode::FAILURE;
    }
    std::process::ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    apiconf_agent::logging::init(apiconf_agent::logging::SERVER_FILTER)?;

    let args = ServerArgs::parse();
    tracing::info!(?args, "starting apiconf-tools-server");

    let tools = args.settings.tools().context("configure conference tools")?;
    let app = apiconf_agent::server::router(ToolRegistry::new(Arc::new(tools)));

    let listener = tokio::net::TcpListener::bind(args.addr)
        .await
        .map_err(|err| anyhow::anyhow!("bind {}: {err}", args.addr))?;
    tracing::info!(addr = %args.addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(?err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
