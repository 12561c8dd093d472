use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use logging::init_tracing;
pub use settings::{
    Config, DatabaseConfig, ExchangeRateConfig, LogConfig, Secrets, ServerConfig, SessionConfig,
    SyncConfig,
};

/// Prefix for environment overrides, e.g. `ADBOARD__SERVER__ADDR=127.0.0.1:8080`.
const ENV_PREFIX: &str = "ADBOARD";

/// Loads the application configuration from `config.toml` and the environment.
///
/// This function is the primary entry point for this crate. The file is optional:
/// every section has defaults, and `ADBOARD__<SECTION>__<KEY>` variables override
/// whatever the file sets. The result is validated before it is returned.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(Path::new("config.toml"))
}

/// Like `load_config`, reading the file at `path`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;

    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.try_deserialize::<Config>()?;
    config.validate()?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;
    use rust_decimal_macros::dec;

    fn parse(toml: &str) -> Result<Config, ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize::<Config>()?;
        config.validate()?;
        Ok(config)
    }

    #[test]
    fn empty_file_gives_defaults() {
        let config = parse("").unwrap();
        assert_eq!(config.server.addr.port(), 3000);
        assert_eq!(config.exchange_rate.ttl_secs, 1800);
        assert_eq!(config.exchange_rate.fallback_rate, dec!(36.5));
        assert_eq!(config.sync.range, "Data!A2:AC");
        assert!(config.team_groups.is_empty());
    }

    #[test]
    fn reads_sections_and_team_groups() {
        let config = parse(
            r#"
            [server]
            addr = "127.0.0.1:8080"

            [sync]
            interval_secs = 600

            [team_groups]
            Lotto = ["Alpha", "Beta"]
            Football = ["Gamma"]
            "#,
        )
        .unwrap();
        assert_eq!(config.server.addr.port(), 8080);
        assert_eq!(config.sync.interval_secs, Some(600));
        assert_eq!(config.team_groups["Lotto"], vec!["Alpha", "Beta"]);
    }

    #[test]
    fn rejects_empty_group_and_zero_ttl() {
        assert!(matches!(
            parse("[team_groups]\nLotto = []"),
            Err(ConfigError::ValidationError(_))
        ));
        assert!(matches!(
            parse("[exchange_rate]\nttl_secs = 0"),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn rejects_out_of_range_ttls_and_windows() {
        for toml in [
            "[exchange_rate]\nttl_secs = 10000000000000000",
            "[session]\nttl_days = -1",
            "[session]\nttl_days = 0",
            "[session]\nttl_days = 9223372036854775807",
            "[session]\nonline_window_secs = 0",
            "[session]\nonline_window_secs = 100000000000000",
        ] {
            assert!(
                matches!(parse(toml), Err(ConfigError::ValidationError(_))),
                "{toml}"
            );
        }
        let config = parse("[session]\nttl_days = 365\nonline_window_secs = 86400").unwrap();
        assert_eq!(config.session.ttl_days, 365);
    }
}
