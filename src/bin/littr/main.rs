use actix_session::{storage::CookieSessionStore, SessionMiddleware};
use actix_web::cookie::Key;
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use anyhow::Context;
use littr::api::{DbKeyStore, KeyStore};
use littr::config::Config;
use littr::db::init_db;
use littr::logging::Fields;
use littr::middleware::{ClientCtx, RequestLog};
use std::sync::Arc;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    init_lib_mods();
    let config = littr::config::init()?;
    littr::logging::init(config.env);

    let db = init_db(&config.database_url)
        .await
        .context("Failed to create pool")?;
    let secret_key = session_key(config);
    let key_store: Arc<dyn KeyStore> = Arc::new(DbKeyStore { db });

    log::info!(
        "{} starting",
        Fields::new()
            .with("listen", &config.listen)
            .with("host", &config.host_name)
            .with("api", &config.listen_api_url)
            .with("env", format!("{:?}", config.env))
    );

    HttpServer::new(move || {
        let key_store: Data<Arc<dyn KeyStore>> = Data::new(key_store.clone());

        // Order of middleware IS IMPORTANT and is in REVERSE EXECUTION ORDER.
        App::new()
            .app_data(key_store)
            .wrap(littr::web::error::error_handlers())
            .wrap(ClientCtx::default())
            .wrap(SessionMiddleware::new(
                CookieSessionStore::default(),
                secret_key.clone(),
            ))
            .wrap(RequestLog)
            .configure(littr::api::configure)
            .configure(littr::web::configure)
    })
    .bind(&config.listen)?
    .run()
    .await?;

    Ok(())
}

/// Initialize third party crates we rely on but don't have control over.
fn init_lib_mods() {
    if let Err(e) = dotenv::dotenv() {
        eprintln!("No .env loaded: {}", e);
    }
}

/// Cookie signing key from SESSION_KEY. Sessions do not survive a restart
/// when it has to be generated.
fn session_key(config: &Config) -> Key {
    match config.session_key.as_deref().map(str::as_bytes) {
        Some(bytes) => match Key::try_from(bytes) {
            Ok(key) => return key,
            Err(e) => log::warn!("SESSION_KEY unusable ({}), generating one", e),
        },
        None => log::warn!("SESSION_KEY is not set, generating one"),
    }
    Key::generate()
}
