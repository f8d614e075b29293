mod config;
mod database;
mod error;
mod identity;
mod models;
mod normalize;
mod reconcile;
mod store;
#[cfg(test)]
mod testing;

use crate::config::{MigrationConfig, SummaryFormat};
use crate::database::{PgSource, PgTarget};
use crate::reconcile::Migrator;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Load environment variables
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = MigrationConfig::from_env().map_err(|err| {
        log::error!("{err}");
        err
    })?;

    log::info!("🚀 Starting SmartPro data migration");

    let target_pool = database::connect("unified database", &config.target_url)
        .await
        .map_err(|err| {
            log::error!("Failed to connect to unified database: {err:?}");
            err
        })?;

    let mut sources = Vec::with_capacity(config.sources.len());
    for source in &config.sources {
        let pool = database::connect(source.schema.label(), &source.url)
            .await
            .map_err(|err| {
                log::error!("Failed to connect to {}: {err:?}", source.schema.label());
                err
            })?;
        sources.push(PgSource::new(source.schema, pool));
    }

    let migrator = Migrator::new(sources, PgTarget::new(target_pool));
    let summary = migrator.run().await.map_err(|err| {
        log::error!("Migration aborted: {err}");
        err
    })?;

    match config.summary_format {
        SummaryFormat::Text => summary.log(),
        SummaryFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
    }

    log::info!("🎉 Migration completed");
    Ok(())
}
