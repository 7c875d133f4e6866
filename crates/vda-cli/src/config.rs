//! Configuration loading and management.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use vda_core::{CategoryMap, DateOrder, ServiceColumns, ShiftColumns};

/// Application configuration.
///
/// Column names, the category mapping, and the date-order preference all
/// live here so a differently-shaped export can be consumed without code
/// changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the shifts CSV export.
    pub shifts_csv: PathBuf,
    /// Path to the services CSV export.
    pub services_csv: PathBuf,
    /// Preferred reading of ambiguous numeric dates.
    pub date_order: DateOrder,
    /// Column names in the shifts dataset.
    pub shift_columns: ShiftColumns,
    /// Column names in the services dataset.
    pub service_columns: ServiceColumns,
    /// Raw tag → display label mapping for categories.
    pub categories: CategoryMap,
    /// Display categories counted as emergency work in the report split.
    pub emergency_categories: BTreeSet<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            shifts_csv: PathBuf::from("turni.csv"),
            services_csv: PathBuf::from("servizi.csv"),
            date_order: DateOrder::default(),
            shift_columns: ShiftColumns::default(),
            service_columns: ServiceColumns::default(),
            categories: CategoryMap::default(),
            emergency_categories: ["Soccorso ECHO", "Emergenza 118"]
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }
}

impl Config {
    /// Loads configuration from default locations.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from(None)
    }

    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (VDA_*)
        figment = figment.merge(Env::prefixed("VDA_"));

        figment.extract()
    }
}

/// Returns the platform-specific config directory for vda.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("vda"))
}
