//! Bind-key derivation from a config type's static schema.
//!
//! Walks confique's `Meta` tree depth-first in declaration order. Every leaf
//! field becomes one [`BindKey`]; nested sections only contribute their
//! name as a dotted prefix.

use confique::meta::{Expr, FieldKind, LeafKind, Meta};

use crate::error::LayerfigError;
use crate::naming::names_match;

/// A single leaf field's lookup key, declared default and doc comment.
#[derive(Debug, Clone)]
pub struct BindKey {
    /// Dotted path of declared names, e.g. `"db.host"`.
    pub path: String,
    /// The `#[config(default = ...)]` value, if any.
    pub default: Option<Expr>,
    /// Doc comment lines joined with `\n`.
    pub doc: String,
}

/// Derive the ordered bind keys for a config schema.
pub fn derive_keys(meta: &Meta) -> Vec<BindKey> {
    let mut keys = Vec::new();
    collect(meta, "", &mut keys);
    keys
}

fn collect(meta: &Meta, prefix: &str, keys: &mut Vec<BindKey>) {
    for field in meta.fields {
        let path = if prefix.is_empty() {
            field.name.to_string()
        } else {
            format!("{prefix}.{}", field.name)
        };

        match &field.kind {
            FieldKind::Nested { meta, .. } => collect(meta, &path, keys),
            FieldKind::Leaf { kind, .. } => {
                let default = match kind {
                    LeafKind::Required { default } => default.clone(),
                    LeafKind::Optional => None,
                };
                keys.push(BindKey {
                    path,
                    default,
                    doc: field
                        .doc
                        .iter()
                        .map(|line| line.trim())
                        .collect::<Vec<_>>()
                        .join("\n"),
                });
            }
        }
    }
}

/// Reject schemas where two sibling fields are the same name to the matcher.
///
/// Decoding such a struct would depend on which spelling a source happened
/// to use, so it is refused before any source is read.
pub fn check_unambiguous(meta: &Meta) -> Result<(), LayerfigError> {
    check_level(meta, "")
}

fn check_level(meta: &Meta, prefix: &str) -> Result<(), LayerfigError> {
    for (i, field) in meta.fields.iter().enumerate() {
        if let Some(other) = meta.fields[i + 1..]
            .iter()
            .find(|other| names_match(field.name, other.name))
        {
            return Err(LayerfigError::InvalidTarget {
                reason: format!(
                    "fields '{prefix}{}' and '{prefix}{}' of {} map to the same key",
                    field.name, other.name, meta.name
                ),
            });
        }

        if let FieldKind::Nested { meta: nested, .. } = &field.kind {
            check_level(nested, &format!("{prefix}{}.", field.name))?;
        }
    }
    Ok(())
}
