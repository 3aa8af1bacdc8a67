use anyhow::{anyhow, Result};
use is_terminal::IsTerminal;
use std::sync::Arc;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use zonewarden::auth::BootstrapState;
use zonewarden::logging::DEFAULT_DIRECTIVES;
use zonewarden::upstream::DynUpstream;
use zonewarden::{AppState, Config, HttpUpstream, LogFilter, SharedConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let log_filter = tracing_init();

    let mut first_args = std::env::args().take(2);
    let (program_name, config_file) = (
        first_args.next().unwrap_or("zonewarden".to_string()),
        first_args.next(),
    );

    let config = config_init(&program_name, config_file)?;
    let tokens = config.token_store().await?;
    let upstream: DynUpstream = Arc::new(HttpUpstream::new(
        &config.upstream_base_url,
        &config.master_api_key,
        config.upstream_timeout,
    )?);

    let state = AppState::new(config.clone(), tokens, upstream, log_filter)?;
    if state.admin.bootstrap_state().await == BootstrapState::Unconfigured {
        tracing::warn!("no administrator token exists yet, create one with the master key");
    }

    tracing::info!("forwarding to {}", &config.upstream_base_url);
    tracing::info!("API listening on {}", &config.api_bind_addr);
    let api_handle = tokio::spawn(zonewarden::new_http(state));

    tokio::select! {
        _ = signal::ctrl_c() => {
            tracing::info!("quitting from signal");
        },
        Ok(api_res) = api_handle => {
            if let Err(err) = api_res {
                return Err(err.into())
            }
        }
    }
    tracing::info!("goodbye");
    Ok(())
}

fn tracing_init() -> LogFilter {
    let (log_filter, filter_layer) = LogFilter::new(
        EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_DIRECTIVES.into()),
    );
    tracing_subscriber::registry()
        .with(filter_layer)
        .with(tracing_subscriber::fmt::layer().with_ansi(std::io::stdout().is_terminal()))
        .init();
    log_filter
}

fn config_init(program_name: &str, config_file: Option<String>) -> Result<SharedConfig> {
    match config_file {
        None => Err(anyhow!("usage: {program_name} /path/to/config.json")),
        Some(config_file) => {
            let config = Config::try_from_file(&config_file)?;
            tracing::debug!("loaded config from {config_file}: {config:?}");
            Ok(Arc::new(config))
        }
    }
}
