#[cfg(test)]
pub mod test {
    use confique::Config;
    use serde::{Deserialize, Serialize};

    #[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq)]
    pub struct AppConfig {
        /// Minimum log level.
        #[config(default = "info")]
        pub log_level: String,

        /// HTTP listener settings.
        #[config(nested)]
        pub http: HttpConfig,

        /// Database settings.
        #[config(nested)]
        pub db: DatabaseConfig,
    }

    #[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq)]
    pub struct HttpConfig {
        /// Interface to bind.
        #[config(default = "0.0.0.0")]
        pub host: String,

        /// Port to listen on.
        #[config(default = 8080)]
        pub port: u16,
    }

    #[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq)]
    pub struct DatabaseConfig {
        pub user: Option<String>,

        pub password: Option<String>,

        #[config(default = "0.0.0.0")]
        pub host: String,

        #[config(default = 5432)]
        pub port: u16,
    }

    /// Flat config used by the env fallback scenarios.
    #[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq)]
    pub struct ServerConfig {
        #[config(default = "info")]
        pub log_level: String,

        #[config(default = "0.0.0.0")]
        pub host: String,

        #[config(default = 8080)]
        pub port: u16,
    }

    /// Only a nested database section, for the `.env` scenarios.
    #[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq)]
    pub struct DbOnlyConfig {
        #[config(nested)]
        pub db: DbSection,
    }

    #[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq)]
    pub struct DbSection {
        #[config(default = "0.0.0.0")]
        pub host: String,

        #[config(default = 5432)]
        pub port: u16,
    }

    // -- Same content, declared with camelCase names ---------------------------

    #[allow(non_snake_case)]
    #[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq)]
    pub struct CamelConfig {
        #[config(default = "info")]
        pub logLevel: String,

        #[config(nested)]
        pub serverConfig: CamelServer,
    }

    #[allow(non_snake_case)]
    #[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq)]
    pub struct CamelServer {
        #[config(default = 30)]
        pub readTimeout: u32,

        #[config(default = false)]
        pub enableTls: bool,
    }

    #[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq)]
    pub struct SnakeConfig {
        #[config(default = "info")]
        pub log_level: String,

        #[config(nested)]
        pub server_config: SnakeServer,
    }

    #[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq)]
    pub struct SnakeServer {
        #[config(default = 30)]
        pub read_timeout: u32,

        #[config(default = false)]
        pub enable_tls: bool,
    }

    /// Two sibling names that the matcher cannot tell apart.
    #[allow(non_snake_case)]
    #[derive(Config, Debug)]
    pub struct AmbiguousConfig {
        #[config(default = "info")]
        pub log_level: String,

        #[config(default = "debug")]
        pub logLevel: String,
    }

    #[test]
    fn app_config_loads_defaults() {
        let config = AppConfig::builder().load().unwrap();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.http.host, "0.0.0.0");
        assert_eq!(config.http.port, 8080);
        assert_eq!(config.db.port, 5432);
        assert_eq!(config.db.user, None);
    }
}
