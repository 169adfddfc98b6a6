//! Naming conventions for bind keys and the field-name matcher used on decode.
//!
//! The same config struct may declare its names in `snake_case` or in
//! `camelCase`, and the keys found in a source may come from either spelling
//! or from env vars that collapse words without separators. [`names_match`]
//! treats all of those as the same name.

/// How bind keys are turned into environment variable names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NamingConvention {
    /// `serverConfig.port` → `SERVER_CONFIG_PORT`.
    #[default]
    SnakeCase,
    /// `server_config.port` → `SERVERCONFIGPORT`.
    Collapsed,
}

impl NamingConvention {
    /// Rewrite a dotted bind key into the key stored for this convention.
    ///
    /// Dots are kept, so the result still nests.
    pub fn store_key(self, key: &str) -> String {
        match self {
            NamingConvention::SnakeCase => camel_to_snake(key),
            NamingConvention::Collapsed => strip_underscores(key),
        }
    }

    /// Build the environment variable name for a dotted bind key.
    pub fn env_var_name(self, key: &str, prefix: Option<&str>) -> String {
        let stored = self.store_key(key);
        let separator = match self {
            NamingConvention::SnakeCase => "_",
            NamingConvention::Collapsed => "",
        };
        let name = stored
            .replace(['.', '-', ' '], separator)
            .to_uppercase();

        match prefix.map(|p| p.trim_end_matches('_')) {
            Some(p) if !p.is_empty() => format!("{}_{name}", p.to_uppercase()),
            _ => name,
        }
    }
}

/// Insert `_` before every interior ASCII uppercase letter and lowercase the result.
///
/// `serverConfig` → `server_config`. The first character never gets a separator.
pub fn camel_to_snake(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + 4);
    for (i, ch) in input.chars().enumerate() {
        if i > 0 && ch.is_ascii_uppercase() {
            out.push('_');
        }
        out.push(ch);
    }
    out.to_lowercase()
}

/// Remove every `_`.
pub fn strip_underscores(input: &str) -> String {
    input.replace('_', "")
}

/// Field-name matcher: a map key and a declared field name are the same name
/// if they are equal ignoring case, equal after camel→snake normalization, or
/// equal (ignoring case) once all underscores are removed.
pub fn names_match(map_key: &str, field_name: &str) -> bool {
    map_key.eq_ignore_ascii_case(field_name)
        || camel_to_snake(map_key) == camel_to_snake(field_name)
        || strip_underscores(map_key).eq_ignore_ascii_case(&strip_underscores(field_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camel_to_snake_inserts_separators() {
        assert_eq!(camel_to_snake("serverConfig"), "server_config");
        assert_eq!(camel_to_snake("logLevel"), "log_level");
        assert_eq!(camel_to_snake("maxIdleConns"), "max_idle_conns");
    }

    #[test]
    fn camel_to_snake_leading_upper_has_no_separator() {
        assert_eq!(camel_to_snake("LogLevel"), "log_level");
        assert_eq!(camel_to_snake("A"), "a");
    }

    #[test]
    fn camel_to_snake_leaves_snake_alone() {
        assert_eq!(camel_to_snake("log_level"), "log_level");
        assert_eq!(camel_to_snake("db.host"), "db.host");
    }

    #[test]
    fn camel_to_snake_handles_dotted_paths() {
        assert_eq!(camel_to_snake("serverConfig.readTimeout"), "server_config.read_timeout");
    }

    #[test]
    fn strip_underscores_collapses() {
        assert_eq!(strip_underscores("log_level"), "loglevel");
        assert_eq!(strip_underscores("db.max_conns"), "db.maxconns");
    }

    #[test]
    fn snake_env_var_names() {
        let c = NamingConvention::SnakeCase;
        assert_eq!(c.env_var_name("log_level", None), "LOG_LEVEL");
        assert_eq!(c.env_var_name("logLevel", None), "LOG_LEVEL");
        assert_eq!(c.env_var_name("db.host", None), "DB_HOST");
        assert_eq!(c.env_var_name("serverConfig.port", Some("app")), "APP_SERVER_CONFIG_PORT");
    }

    #[test]
    fn collapsed_env_var_names() {
        let c = NamingConvention::Collapsed;
        assert_eq!(c.env_var_name("log_level", None), "LOGLEVEL");
        assert_eq!(c.env_var_name("logLevel", None), "LOGLEVEL");
        assert_eq!(c.env_var_name("db.max_conns", Some("APP")), "APP_DBMAXCONNS");
    }

    #[test]
    fn prefix_trailing_underscore_trimmed() {
        let c = NamingConvention::SnakeCase;
        assert_eq!(c.env_var_name("port", Some("MYAPP_")), "MYAPP_PORT");
        assert_eq!(c.env_var_name("port", Some("")), "PORT");
    }

    #[test]
    fn store_key_keeps_dots() {
        assert_eq!(NamingConvention::SnakeCase.store_key("serverConfig.port"), "server_config.port");
        assert_eq!(NamingConvention::Collapsed.store_key("db.max_conns"), "db.maxconns");
    }

    #[test]
    fn matcher_case_insensitive() {
        assert!(names_match("LOG_LEVEL", "log_level"));
        assert!(names_match("Host", "host"));
    }

    #[test]
    fn matcher_camel_vs_snake() {
        assert!(names_match("log_level", "logLevel"));
        assert!(names_match("serverConfig", "server_config"));
    }

    #[test]
    fn matcher_collapsed() {
        assert!(names_match("loglevel", "log_level"));
        assert!(names_match("loglevel", "logLevel"));
        assert!(names_match("LOG_LEVEL", "logLevel"));
        assert!(names_match("SERVERCONFIG", "serverConfig"));
    }

    #[test]
    fn matcher_rejects_different_names() {
        assert!(!names_match("host", "port"));
        assert!(!names_match("log", "log_level"));
    }
}
