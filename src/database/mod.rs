use deadpool_postgres::{Config, ManagerConfig, Pool, RecyclingMethod, Runtime};
use tokio_postgres::types::FromSql;
use tokio_postgres::{NoTls, Row};

use crate::error::{Result, RowError};

pub mod source;
pub mod target;

pub use source::PgSource;
pub use target::PgTarget;

pub type DbPool = Pool;

/// Build a pool for `database_url` and make sure the server answers.
pub async fn connect(label: &str, database_url: &str) -> Result<DbPool> {
    let mut cfg = Config::new();
    cfg.url = Some(database_url.to_string());
    cfg.manager = Some(ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    });

    let pool = cfg.create_pool(Some(Runtime::Tokio1), NoTls)?;
    let client = pool.get().await?;
    client.execute("SELECT 1", &[]).await?;

    log::info!("Connected to {}", label);
    Ok(pool)
}

/// Read one column, turning a conversion failure into a row-level error.
pub(crate) fn column<'a, T: FromSql<'a>>(
    row: &'a Row,
    name: &'static str,
) -> std::result::Result<T, RowError> {
    row.try_get(name)
        .map_err(|source| RowError::Decode { column: name, source })
}
