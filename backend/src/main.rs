//! Accounts server entry-point: loads settings, wires adapters and serves the
//! REST API.

mod server;

use color_eyre::eyre::{Result, WrapErr};
use ortho_config::OrthoConfig;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

use server::{AccountsSettings, build_http_state, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AccountsSettings::load_from_iter(std::env::args_os())
        .wrap_err("load accounts settings")?;
    let bind_addr = settings.bind_addr()?;
    let http_state = build_http_state(&settings).await?;

    create_server(http_state, bind_addr)
        .wrap_err_with(|| format!("bind {bind_addr}"))?
        .await
        .wrap_err("run accounts server")
}
