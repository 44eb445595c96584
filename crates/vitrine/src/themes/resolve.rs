//! Config Resolver
//!
//! Merges a theme's declared schema with whatever the operator saved. Pure and
//! total: malformed saved values are replaced by schema defaults, never
//! reported as errors.

use serde_json::{Map, Value};
use tracing::debug;

use crate::manifest::{ConfigSchema, FieldDescriptor, FieldKind};

/// A fully resolved configuration object, ready for rendering
pub type ThemeConfig = Map<String, Value>;

/// Default value for every field in `schema`.
pub fn schema_defaults(schema: &ConfigSchema) -> ThemeConfig {
    schema
        .iter()
        .map(|(key, field)| (key.clone(), default_value(field)))
        .collect()
}

/// Shallow-merge `saved` over the schema defaults.
///
/// `list` fields only accept an array and `boolean` fields only accept a
/// boolean; anything else keeps the default verbatim. Keys not in the schema
/// pass through unchanged. A non-object `saved` counts as empty.
pub fn resolve_config(schema: &ConfigSchema, saved: &Value) -> ThemeConfig {
    let mut resolved = schema_defaults(schema);
    let Some(saved) = saved.as_object() else {
        if !saved.is_null() {
            debug!("Ignoring non-object saved config: {}", saved);
        }
        return resolved;
    };

    for (key, value) in saved {
        match schema.get(key).map(|field| field.kind) {
            Some(FieldKind::List) if !value.is_array() => {
                debug!("Config field '{}' expects a list, keeping default", key);
            }
            Some(FieldKind::Boolean) if !value.is_boolean() => {
                debug!("Config field '{}' expects a boolean, keeping default", key);
            }
            _ => {
                resolved.insert(key.clone(), value.clone());
            }
        }
    }

    resolved
}

fn default_value(field: &FieldDescriptor) -> Value {
    match field.kind {
        FieldKind::Boolean => Value::Bool(field.default.as_ref().is_some_and(is_truthy)),
        FieldKind::List => match &field.default {
            Some(Value::Array(items)) => Value::Array(items.clone()),
            _ => Value::Array(Vec::new()),
        },
        FieldKind::Color | FieldKind::Text | FieldKind::Url => match &field.default {
            Some(value) if !value.is_null() => value.clone(),
            _ => Value::String(String::new()),
        },
    }
}

/// JSON truthiness: `null`, `false`, `0`, `NaN` and `""` are false.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn schema() -> ConfigSchema {
        serde_json::from_value(json!({
            "accentColor": {"kind": "color", "default": "#2563eb"},
            "tagline": {"kind": "text"},
            "homepage": {"kind": "url", "default": null},
            "showSidebar": {"kind": "boolean", "default": "yes"},
            "compact": {"kind": "boolean"},
            "links": {
                "kind": "list",
                "default": [],
                "fields": {"label": {"kind": "text"}, "href": {"kind": "url"}}
            },
            "badges": {"kind": "list", "default": "not-a-list"}
        }))
        .unwrap()
    }

    #[test]
    fn test_defaults_per_kind() {
        let defaults = schema_defaults(&schema());
        assert_eq!(defaults["accentColor"], json!("#2563eb"));
        assert_eq!(defaults["tagline"], json!(""));
        assert_eq!(defaults["homepage"], json!(""));
        assert_eq!(defaults["showSidebar"], json!(true));
        assert_eq!(defaults["compact"], json!(false));
        assert_eq!(defaults["links"], json!([]));
        assert_eq!(defaults["badges"], json!([]));
    }

    #[test]
    fn test_empty_saved_config_uses_color_default() {
        let resolved = resolve_config(&schema(), &json!({}));
        assert_eq!(resolved["accentColor"], json!("#2563eb"));
    }

    #[test]
    fn test_corrupted_list_keeps_default() {
        for corrupted in [json!("corrupted"), json!(42), json!({"href": "/"}), json!(null)] {
            let resolved = resolve_config(&schema(), &json!({ "links": corrupted }));
            assert_eq!(resolved["links"], json!([]));
        }
    }

    #[test]
    fn test_saved_list_is_taken_verbatim() {
        let links = json!([{"label": "Home", "href": "/"}, {"unexpected": true}]);
        let resolved = resolve_config(&schema(), &json!({ "links": links.clone() }));
        assert_eq!(resolved["links"], links);
    }

    #[test]
    fn test_boolean_fields_are_always_booleans() {
        let inputs = [
            json!({}),
            json!({"showSidebar": "false", "compact": 1}),
            json!({"showSidebar": null, "compact": "yes"}),
            json!({"showSidebar": false, "compact": true}),
            json!("garbage"),
        ];
        for saved in inputs {
            let resolved = resolve_config(&schema(), &saved);
            assert!(resolved["showSidebar"].is_boolean(), "saved: {}", saved);
            assert!(resolved["compact"].is_boolean(), "saved: {}", saved);
        }

        let resolved = resolve_config(&schema(), &json!({"showSidebar": false, "compact": true}));
        assert_eq!(resolved["showSidebar"], json!(false));
        assert_eq!(resolved["compact"], json!(true));
    }

    #[test]
    fn test_saved_values_override_and_extra_keys_pass_through() {
        let resolved = resolve_config(
            &schema(),
            &json!({"accentColor": "#000000", "legacyFlag": "kept"}),
        );
        assert_eq!(resolved["accentColor"], json!("#000000"));
        assert_eq!(resolved["legacyFlag"], json!("kept"));
        assert_eq!(resolved["tagline"], json!(""));
    }

    #[test]
    fn test_non_object_saved_config_is_ignored() {
        let resolved = resolve_config(&schema(), &json!([1, 2, 3]));
        assert_eq!(resolved, schema_defaults(&schema()));
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!(0.0)));
        assert!(!is_truthy(&json!("")));
        assert!(is_truthy(&json!("false")));
        assert!(is_truthy(&json!([])));
        assert!(is_truthy(&json!(-1)));
    }
}
