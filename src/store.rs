//! The layered key/value store: a `toml::Table` that sources fill and the
//! decoder reads.
//!
//! Sources produce tables whose keys may be spelled differently from the
//! config struct's declared names (`LOG_LEVEL`, `loglevel`, `serverConfig`).
//! [`reconcile`] renames them to the declared names before decoding.

use confique::meta::{FieldKind, Meta};
use toml::{Table, Value};

use crate::naming::names_match;

/// Insert `value` at a dotted path, creating intermediate sections.
///
/// A scalar sitting where a section is needed is replaced by the section.
pub fn insert_path(table: &mut Table, dotted_key: &str, value: Value) {
    let segments: Vec<&str> = dotted_key.split('.').collect();
    insert_segments(table, &segments, value);
}

fn insert_segments(table: &mut Table, segments: &[&str], value: Value) {
    let Some((first, rest)) = segments.split_first() else {
        return;
    };

    if rest.is_empty() {
        table.insert(first.to_string(), value);
        return;
    }

    let entry = table
        .entry(first.to_string())
        .or_insert_with(|| Value::Table(Table::new()));
    if !entry.is_table() {
        *entry = Value::Table(Table::new());
    }
    if let Value::Table(sub) = entry {
        insert_segments(sub, rest, value);
    }
}

/// Deep-merge `overlay` on top of `base`. Sections merge key by key;
/// anything else in `overlay` replaces what `base` had.
pub fn deep_merge(mut base: Table, overlay: Table) -> Table {
    for (key, overlay_val) in overlay {
        let merged = match (base.remove(&key), overlay_val) {
            (Some(Value::Table(base_tbl)), Value::Table(overlay_tbl)) => {
                Value::Table(deep_merge(base_tbl, overlay_tbl))
            }
            (_, overlay_val) => overlay_val,
        };
        base.insert(key, merged);
    }
    base
}

/// Rename the keys of `table` to the field names declared in `meta`.
///
/// An exact name wins over a fuzzy match. Keys that match no field are kept
/// as they are; the decoder ignores them. Two keys that land on the same
/// section are merged.
pub fn reconcile(meta: &Meta, table: Table) -> Table {
    let mut out = Table::new();

    for (key, value) in table {
        let field = meta
            .fields
            .iter()
            .find(|f| f.name == key)
            .or_else(|| meta.fields.iter().find(|f| names_match(&key, f.name)));

        let Some(field) = field else {
            out.insert(key, value);
            continue;
        };

        let value = match (&field.kind, value) {
            (FieldKind::Nested { meta, .. }, Value::Table(sub)) => Value::Table(reconcile(meta, sub)),
            (_, value) => value,
        };

        let name = field.name.to_string();
        match (out.remove(&name), value) {
            (Some(Value::Table(existing)), Value::Table(incoming)) => {
                out.insert(name, Value::Table(deep_merge(existing, incoming)));
            }
            (_, value) => {
                out.insert(name, value);
            }
        }
    }

    out
}

/// Convert a parsed YAML document into a store. `null` entries are dropped.
pub fn from_yaml(doc: serde_yaml::Value) -> Result<Table, String> {
    match doc {
        serde_yaml::Value::Null => Ok(Table::new()),
        serde_yaml::Value::Mapping(map) => Ok(yaml_mapping(map)),
        serde_yaml::Value::Tagged(tagged) => from_yaml(tagged.value),
        other => Err(format!("top level is not a mapping (found {})", yaml_kind(&other))),
    }
}

fn yaml_mapping(map: serde_yaml::Mapping) -> Table {
    let mut table = Table::new();
    for (key, value) in map {
        let key = match key {
            serde_yaml::Value::String(s) => s,
            serde_yaml::Value::Number(n) => n.to_string(),
            serde_yaml::Value::Bool(b) => b.to_string(),
            _ => continue,
        };
        if let Some(value) = yaml_value(value) {
            table.insert(key, value);
        }
    }
    table
}

fn yaml_value(value: serde_yaml::Value) -> Option<Value> {
    match value {
        serde_yaml::Value::Null => None,
        serde_yaml::Value::Bool(b) => Some(Value::Boolean(b)),
        serde_yaml::Value::Number(n) => match n.as_i64() {
            Some(i) => Some(Value::Integer(i)),
            None => n.as_f64().map(Value::Float),
        },
        serde_yaml::Value::String(s) => Some(Value::String(s)),
        serde_yaml::Value::Sequence(seq) => {
            Some(Value::Array(seq.into_iter().filter_map(yaml_value).collect()))
        }
        serde_yaml::Value::Mapping(map) => Some(Value::Table(yaml_mapping(map))),
        serde_yaml::Value::Tagged(tagged) => yaml_value(tagged.value),
    }
}

fn yaml_kind(value: &serde_yaml::Value) -> &'static str {
    match value {
        serde_yaml::Value::Null => "null",
        serde_yaml::Value::Bool(_) => "bool",
        serde_yaml::Value::Number(_) => "number",
        serde_yaml::Value::String(_) => "string",
        serde_yaml::Value::Sequence(_) => "sequence",
        serde_yaml::Value::Mapping(_) => "mapping",
        serde_yaml::Value::Tagged(_) => "tagged value",
    }
}

/// Convert a parsed JSON document into a store. `null` entries are dropped.
pub fn from_json(doc: serde_json::Value) -> Result<Table, String> {
    match doc {
        serde_json::Value::Null => Ok(Table::new()),
        serde_json::Value::Object(map) => Ok(json_object(map)),
        serde_json::Value::Array(_) => Err("top level is not an object (found array)".into()),
        _ => Err("top level is not an object (found scalar)".into()),
    }
}

fn json_object(map: serde_json::Map<String, serde_json::Value>) -> Table {
    map.into_iter()
        .filter_map(|(key, value)| json_value(value).map(|v| (key, v)))
        .collect()
}

fn json_value(value: serde_json::Value) -> Option<Value> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::Bool(b) => Some(Value::Boolean(b)),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Some(Value::Integer(i)),
            None => n.as_f64().map(Value::Float),
        },
        serde_json::Value::String(s) => Some(Value::String(s)),
        serde_json::Value::Array(items) => {
            Some(Value::Array(items.into_iter().filter_map(json_value).collect()))
        }
        serde_json::Value::Object(map) => Some(Value::Table(json_object(map))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::{AppConfig, CamelConfig};
    use confique::Config;

    fn table(toml_str: &str) -> Table {
        toml_str.parse::<Table>().unwrap()
    }

    #[test]
    fn insert_path_creates_sections() {
        let mut t = Table::new();
        insert_path(&mut t, "db.host", Value::String("localhost".into()));
        insert_path(&mut t, "db.port", Value::Integer(5432));
        insert_path(&mut t, "level", Value::String("warn".into()));
        assert_eq!(t["db"]["host"].as_str().unwrap(), "localhost");
        assert_eq!(t["db"]["port"].as_integer().unwrap(), 5432);
        assert_eq!(t["level"].as_str().unwrap(), "warn");
    }

    #[test]
    fn insert_path_replaces_scalar_with_section() {
        let mut t = table(r#"db = "flat""#);
        insert_path(&mut t, "db.host", Value::String("x".into()));
        assert_eq!(t["db"]["host"].as_str().unwrap(), "x");
    }

    #[test]
    fn deep_merge_recurses_into_sections() {
        let base = table("[db]\nhost = \"a\"\nport = 1\n");
        let overlay = table("[db]\nport = 2\n");
        let merged = deep_merge(base, overlay);
        assert_eq!(merged["db"]["host"].as_str().unwrap(), "a");
        assert_eq!(merged["db"]["port"].as_integer().unwrap(), 2);
    }

    #[test]
    fn deep_merge_scalar_replaces_section() {
        let merged = deep_merge(table("[db]\nhost = \"a\"\n"), table(r#"db = "flat""#));
        assert_eq!(merged["db"].as_str().unwrap(), "flat");
    }

    #[test]
    fn reconcile_renames_env_spellings() {
        let input = table("LOG_LEVEL = \"warn\"\n[HTTP]\nPORT = 9000\n");
        let out = reconcile(&AppConfig::META, input);
        assert_eq!(out["log_level"].as_str().unwrap(), "warn");
        assert_eq!(out["http"]["port"].as_integer().unwrap(), 9000);
    }

    #[test]
    fn reconcile_maps_snake_keys_onto_camel_fields() {
        let input = table("log_level = \"warn\"\n[server_config]\nread_timeout = 5\n");
        let out = reconcile(&CamelConfig::META, input);
        assert_eq!(out["logLevel"].as_str().unwrap(), "warn");
        assert_eq!(out["serverConfig"]["readTimeout"].as_integer().unwrap(), 5);
    }

    #[test]
    fn reconcile_maps_collapsed_keys() {
        let input = table("loglevel = \"error\"\n[serverconfig]\nenabletls = true\n");
        let out = reconcile(&CamelConfig::META, input);
        assert_eq!(out["logLevel"].as_str().unwrap(), "error");
        assert!(out["serverConfig"]["enableTls"].as_bool().unwrap());
    }

    #[test]
    fn reconcile_merges_colliding_sections() {
        let input = table("[server_config]\nread_timeout = 5\n[serverConfig]\nenableTls = true\n");
        let out = reconcile(&CamelConfig::META, input);
        let server = out["serverConfig"].as_table().unwrap();
        assert_eq!(server["readTimeout"].as_integer().unwrap(), 5);
        assert!(server["enableTls"].as_bool().unwrap());
    }

    #[test]
    fn reconcile_keeps_unknown_keys() {
        let out = reconcile(&AppConfig::META, table("extra = 1\n"));
        assert_eq!(out["extra"].as_integer().unwrap(), 1);
    }

    #[test]
    fn yaml_nulls_dropped_and_nesting_kept() {
        let doc: serde_yaml::Value =
            serde_yaml::from_str("log_level: warn\nhttp:\n  host: ~\n  port: 8000\n").unwrap();
        let t = from_yaml(doc).unwrap();
        assert_eq!(t["log_level"].as_str().unwrap(), "warn");
        assert!(t["http"].as_table().unwrap().get("host").is_none());
        assert_eq!(t["http"]["port"].as_integer().unwrap(), 8000);
    }

    #[test]
    fn yaml_empty_document_is_empty_store() {
        let doc: serde_yaml::Value = serde_yaml::from_str("").unwrap();
        assert!(from_yaml(doc).unwrap().is_empty());
    }

    #[test]
    fn yaml_non_mapping_rejected() {
        let doc: serde_yaml::Value = serde_yaml::from_str("- a\n- b\n").unwrap();
        let err = from_yaml(doc).unwrap_err();
        assert!(err.contains("sequence"));
    }

    #[test]
    fn json_converts_numbers_and_arrays() {
        let doc: serde_json::Value =
            serde_json::from_str(r#"{"rate": 1.5, "port": 80, "tags": ["a", null, "b"]}"#).unwrap();
        let t = from_json(doc).unwrap();
        assert_eq!(t["rate"].as_float().unwrap(), 1.5);
        assert_eq!(t["port"].as_integer().unwrap(), 80);
        assert_eq!(t["tags"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn json_array_top_level_rejected() {
        let doc: serde_json::Value = serde_json::from_str("[1, 2]").unwrap();
        assert!(from_json(doc).is_err());
    }
}
