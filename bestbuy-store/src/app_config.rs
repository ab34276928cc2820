use bestbuy_catalog::{CurrencyAssumption, PriceWindow, ResolverConfig, UpcValidation};
use bestbuy_core::ScanOptions;
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    #[serde(default)]
    pub pricing: PricingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Postgres,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// JSON seed loaded at startup (memory) or into an empty database (postgres)
    pub seed_path: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct PricingConfig {
    #[serde(default)]
    pub upc_validation: UpcValidation,
    #[serde(default)]
    pub currency_assumption: CurrencyAssumption,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_max_age_hours")]
    pub max_age_hours: i64,
    #[serde(default)]
    pub include_out_of_stock: bool,
    #[serde(default = "default_result_limit")]
    pub result_limit: usize,
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_max_age_hours() -> i64 {
    168
}

fn default_result_limit() -> usize {
    10
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            upc_validation: UpcValidation::default(),
            currency_assumption: CurrencyAssumption::default(),
            currency: default_currency(),
            max_age_hours: default_max_age_hours(),
            include_out_of_stock: false,
            result_limit: default_result_limit(),
        }
    }
}

impl PricingConfig {
    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            upc_validation: self.upc_validation,
            currency_assumption: self.currency_assumption,
            currency: self.currency.clone(),
        }
    }

    /// Reject window and limit settings a scan could not honour.
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        self.scan_options()
            .window
            .validate()
            .map_err(|e| config::ConfigError::Message(format!("pricing: {}", e)))?;
        if self.result_limit == 0 {
            return Err(config::ConfigError::Message(
                "pricing: result_limit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Defaults for scans that do not override them per request
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            window: PriceWindow {
                max_age_hours: self.max_age_hours,
                include_out_of_stock: self.include_out_of_stock,
            },
            limit: self.result_limit,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Per-environment overrides are optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `BESTBUY_PRICING__UPC_VALIDATION=strict`
            .add_source(config::Environment::with_prefix("BESTBUY").separator("__"))
            .build()?;

        let config: Self = s.try_deserialize()?;
        config.pricing.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml: &str) -> Config {
        config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .expect("Failed to build config")
            .try_deserialize()
            .expect("Failed to deserialize config")
    }

    #[test]
    fn test_pricing_defaults_when_section_missing() {
        let config = parse(
            r#"
            [server]
            port = 8000

            [storage]
            backend = "memory"
            "#,
        );

        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert!(config.database.is_none());
        assert_eq!(config.pricing.resolver_config(), ResolverConfig::default());
        assert_eq!(config.pricing.scan_options(), ScanOptions::default());
    }

    #[test]
    fn test_strict_postgres_config() {
        let config = parse(
            r#"
            [server]
            port = 9000

            [storage]
            backend = "postgres"
            seed_path = "data/seed.json"

            [database]
            url = "postgres://localhost/bestbuy"

            [pricing]
            upc_validation = "strict"
            currency_assumption = "single_currency_only"
            max_age_hours = 24
            include_out_of_stock = true
            "#,
        );

        assert_eq!(config.storage.backend, StorageBackend::Postgres);
        assert_eq!(config.database.as_ref().map(|d| d.max_connections), Some(5));
        assert_eq!(config.pricing.upc_validation, UpcValidation::Strict);

        let options = config.pricing.scan_options();
        assert_eq!(options.window.max_age_hours, 24);
        assert!(options.window.include_out_of_stock);
    }

    #[test]
    fn test_pricing_window_out_of_range_is_rejected() {
        let config = parse(
            r#"
            [server]
            port = 8000

            [storage]
            backend = "memory"

            [pricing]
            max_age_hours = 9223372036854775807
            "#,
        );
        assert!(config.pricing.validate().is_err());

        let zero_limit = PricingConfig {
            result_limit: 0,
            ..Default::default()
        };
        assert!(zero_limit.validate().is_err());
        assert!(PricingConfig::default().validate().is_ok());
    }
}
