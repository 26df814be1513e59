use anyhow::Context as _;
use tracing_subscriber::EnvFilter;

/// Default directives for the one-shot CLI: tool envelopes go to stdout, so
/// only warnings reach stderr unless `RUST_LOG` says otherwise.
pub const CLI_FILTER: &str = "warn";

/// Default directives for the long-running tool server.
pub const SERVER_FILTER: &str = "info,tower_http=debug";

pub fn init(default_filter: &str) -> anyhow::Result<()> {
    let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(&directives)
            .with_context(|| format!("parse {}={directives:?}", EnvFilter::DEFAULT_ENV))?,
        _ => EnvFilter::try_new(default_filter).context("build default log filter")?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!("initialize tracing subscriber: {err}"))?;

    Ok(())
}
