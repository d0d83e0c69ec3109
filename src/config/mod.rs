// Configuration module entry point
// Loads layered configuration and holds the shared runtime state

mod state;
mod types;

use std::net::SocketAddr;

// Re-export public types
pub use state::AppState;
pub use types::Config;

/// Default config file, looked up without extension
pub const DEFAULT_CONFIG_PATH: &str = "geoapi";

impl Config {
    /// Load configuration using `GEOAPI_CONFIG` as file path when set
    pub fn load() -> Result<Self, config::ConfigError> {
        let path = std::env::var("GEOAPI_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(&path, std::env::var("PORT").ok())
    }

    /// Load configuration from specified file path (without extension)
    ///
    /// `port_override` takes precedence over every other source.
    pub fn load_from(
        config_path: &str,
        port_override: Option<String>,
    ) -> Result<Self, config::ConfigError> {
        Self::load_with_env(config_path, environment(), port_override)
    }

    fn load_with_env(
        config_path: &str,
        env: config::Environment,
        port_override: Option<String>,
    ) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(env)
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 5000)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.request_timeout", 30)?
            .set_default("performance.keep_alive", true)?
            .set_default("performance.shutdown_grace", 10)?
            .set_default("http.server_name", "geoapi")?
            .set_default("http.enable_cors", true)?
            .set_default("http.max_body_size", 10_485_760)? // 10MB
            .set_override_option("server.port", port_override)?
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

/// `GEOAPI_<SECTION>__<KEY>`, e.g. `GEOAPI_SERVER__WORKERS=4`
fn environment() -> config::Environment {
    config::Environment::with_prefix("GEOAPI")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}
