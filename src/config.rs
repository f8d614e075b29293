use std::env;

use crate::database::source::LegacySchema;
use crate::error::{MigrateError, Result};

/// Source variables in processing order. Earlier sources win fill-null merges.
const SOURCE_VARS: [(&str, LegacySchema); 3] = [
    ("CONTRACT_DB_URL", LegacySchema::ContractManagement),
    ("SERVICES_DB_URL", LegacySchema::ServicesHub),
    ("OLD_PROJECT_DB_URL", LegacySchema::LegacyProject),
];

const TARGET_VARS: [&str; 2] = ["UNIFIED_DB_URL", "NEW_PROJECT_DB_URL"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryFormat {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub schema: LegacySchema,
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct MigrationConfig {
    pub target_url: String,
    pub sources: Vec<SourceConfig>,
    pub summary_format: SummaryFormat,
}

impl MigrationConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let present = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let target_url = TARGET_VARS
            .iter()
            .find_map(|key| present(key))
            .ok_or_else(|| {
                MigrateError::Config("UNIFIED_DB_URL (or NEW_PROJECT_DB_URL) must be set".into())
            })?;

        let mut sources = Vec::new();
        for (key, schema) in SOURCE_VARS {
            match present(key) {
                Some(url) => sources.push(SourceConfig { schema, url }),
                None => log::warn!("{} not set, skipping {}", key, schema.label()),
            }
        }

        let summary_format = match present("MIGRATION_SUMMARY_FORMAT").as_deref() {
            Some("json") => SummaryFormat::Json,
            Some("text") | None => SummaryFormat::Text,
            Some(other) => {
                return Err(MigrateError::Config(format!(
                    "MIGRATION_SUMMARY_FORMAT must be `text` or `json`, got `{other}`"
                )))
            }
        };

        Ok(Self {
            target_url,
            sources,
            summary_format,
        })
    }
}
