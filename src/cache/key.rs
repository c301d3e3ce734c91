//! Stable cache-key derivation.

use crate::error::Result;
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Derives `"{namespace}:{sha256-hex}"` from the canonical JSON form of
/// `params`.
///
/// Canonicalization relies on serde_json serializing object keys in sorted
/// order, so two parameter sets that are semantically equal always hash to
/// the same key regardless of field declaration order.
pub fn derive_key<T: Serialize>(namespace: &str, params: &T) -> Result<String> {
    let canonical = serde_json::to_string(&serde_json::to_value(params)?)?;
    let digest = Sha256::digest(canonical.as_bytes());
    Ok(format!("{}:{:x}", namespace, digest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FilterParams, LogLevel};
    use serde_json::json;

    #[test]
    fn test_equal_params_equal_keys() {
        let a = FilterParams {
            text_query: Some("timeout".into()),
            level: Some(LogLevel::Error),
            ..Default::default()
        };
        let b = a.clone();
        assert_eq!(
            derive_key("search", &a).unwrap(),
            derive_key("search", &b).unwrap()
        );
    }

    #[test]
    fn test_any_field_change_changes_key() {
        let a = FilterParams::default();
        let b = FilterParams {
            page: 2,
            ..Default::default()
        };
        assert_ne!(
            derive_key("search", &a).unwrap(),
            derive_key("search", &b).unwrap()
        );
    }

    #[test]
    fn test_namespace_is_part_of_key() {
        let params = FilterParams::default();
        let search = derive_key("search", &params).unwrap();
        let export = derive_key("export", &params).unwrap();
        assert!(search.starts_with("search:"));
        assert!(export.starts_with("export:"));
        assert_ne!(search, export);
    }

    #[test]
    fn test_key_ignores_json_field_order() {
        let a = json!({"page": 1, "query": "x"});
        let b = json!({"query": "x", "page": 1});
        assert_eq!(
            derive_key("search", &a).unwrap(),
            derive_key("search", &b).unwrap()
        );
    }
}
