//! Server construction and adapter wiring.

mod config;

pub use config::AccountsSettings;

use std::net::SocketAddr;
use std::sync::Arc;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use color_eyre::eyre::{Result, WrapErr};
use mockable::DefaultClock;
use tracing::{info, warn};
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

use accounts::Trace;
#[cfg(debug_assertions)]
use accounts::doc::ApiDoc;
use accounts::domain::AccountService;
use accounts::inbound::http::accounts::configure;
use accounts::inbound::http::state::HttpState;
use accounts::outbound::crypto::Argon2PasswordHasher;
use accounts::outbound::memory::InMemoryAccountStore;
use accounts::outbound::persistence::{
    DbPool, DieselAccountStore, PoolConfig, run_pending_migrations,
};

/// Choose the store from settings and bundle the resulting service.
///
/// With a database URL, migrations are applied before the pool is built.
/// Without one, accounts live in process memory and vanish on restart.
///
/// # Errors
/// Fails when the Argon2 costs are rejected, migrations cannot be applied or
/// the pool cannot be built.
pub async fn build_http_state(settings: &AccountsSettings) -> Result<HttpState> {
    let hasher = Arc::new(
        Argon2PasswordHasher::new(settings.argon2_params())
            .wrap_err("configure password hasher")?,
    );

    match settings.database_url() {
        Some(url) => {
            run_pending_migrations(url)
                .await
                .wrap_err("apply database migrations")?;
            let pool = DbPool::new(PoolConfig::new(url).with_max_size(settings.pool_max_size))
                .await
                .wrap_err("build database pool")?;
            info!(max_size = settings.pool_max_size, "using PostgreSQL account store");
            let store = Arc::new(DieselAccountStore::new(pool));
            Ok(HttpState::from_service(Arc::new(AccountService::new(
                store, hasher,
            ))))
        }
        None => {
            warn!("no database configured; accounts are kept in memory only");
            let store = Arc::new(InMemoryAccountStore::new(Arc::new(DefaultClock)));
            Ok(HttpState::from_service(Arc::new(AccountService::new(
                store, hasher,
            ))))
        }
    }
}

fn build_app(
    http_state: web::Data<HttpState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let app = App::new()
        .app_data(http_state)
        .wrap(Trace)
        .configure(configure);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app
}

/// Construct the Actix HTTP server.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(http_state: HttpState, bind_addr: SocketAddr) -> std::io::Result<Server> {
    let http_state = web::Data::new(http_state);
    let server = HttpServer::new(move || build_app(http_state.clone()))
        .bind(bind_addr)?
        .run();
    info!(%bind_addr, "accounts server listening");
    Ok(server)
}
