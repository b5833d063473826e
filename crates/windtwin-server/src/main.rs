// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of WindTwin.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use windtwin_server::api;
use windtwin_server::config::ServiceConfig;
use windtwin_server::wiring;

/// Wind-farm telemetry to digital-twin service
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, env = "WINDTWIN_CONFIG", default_value = "windtwin.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    info!(path = %cli.config.display(), "Loading configuration");
    let config = ServiceConfig::from_file(&cli.config)?;

    let collaborators = wiring::http_collaborators(&config)?;
    info!(twins = %config.twins.base_url, "Collaborators ready");
    let state = wiring::assemble(collaborators, &config).start();
    let app = api::router(state);

    let addr = format!("{}:{}", config.server.bind_address, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("🌬️ WindTwin listening on {addr}");
    axum::serve(listener, app).await?;

    Ok(())
}
