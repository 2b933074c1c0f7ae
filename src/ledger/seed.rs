use crate::error::PersistError;
use crate::ledger::SqliteLedger;
use crate::models::PlatformRole;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Properties and platforms to upsert at startup
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub platforms: Vec<SeedPlatform>,
    #[serde(default)]
    pub properties: Vec<SeedProperty>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedPlatform {
    pub name: String,
    #[serde(default)]
    pub commission_percentage: f64,
    /// Inferred from the name when omitted
    pub role: Option<PlatformRole>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedProperty {
    pub name: String,
    pub airbnb_ical: Option<String>,
    pub booking_ical: Option<String>,
}

impl SeedFile {
    pub fn load(path: &Path) -> Result<Self, PersistError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| PersistError::Seed(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&raw)
            .map_err(|e| PersistError::Seed(format!("{}: {}", path.display(), e)))
    }
}

/// Upsert everything in `seed`; returns (platforms, properties) written.
pub fn apply_seed(ledger: &SqliteLedger, seed: &SeedFile) -> Result<(usize, usize), PersistError> {
    for platform in &seed.platforms {
        ledger.upsert_platform(&platform.name, platform.commission_percentage, platform.role)?;
    }
    for property in &seed.properties {
        ledger.upsert_property(
            &property.name,
            property.airbnb_ical.as_deref(),
            property.booking_ical.as_deref(),
        )?;
    }
    info!(
        "Seeded {} platforms and {} properties",
        seed.platforms.len(),
        seed.properties.len()
    );
    Ok((seed.platforms.len(), seed.properties.len()))
}
