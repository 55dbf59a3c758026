use once_cell::sync::OnceCell;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use std::time::Duration;

static DB_POOL: OnceCell<DatabaseConnection> = OnceCell::new();

/// Panics if init_db has not completed.
#[inline(always)]
pub fn get_db_pool() -> &'static DatabaseConnection {
    DB_POOL.get().expect("init_db() must run before get_db_pool()")
}

/// Opens the database URL and initializes the DB_POOL static.
pub async fn init_db(database_url: &str) -> Result<&'static DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(database_url.to_owned());
    opt.max_connections(100)
        .min_connections(5)
        .connect_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(8))
        .sqlx_logging(true);

    let pool = Database::connect(opt).await?;
    if DB_POOL.set(pool).is_err() {
        log::warn!("init_db() called twice, keeping the first pool.");
    }
    Ok(get_db_pool())
}
