use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde_json::Value;

/// Property values as shown in the details panel: strings unquoted, lists joined.
pub fn format_property(value: &Value) -> String {
    match value {
        Value::Null => "none".to_owned(),
        Value::String(text) => text.clone(),
        Value::Array(items) => items
            .iter()
            .map(format_property)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

pub fn format_percent(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}%")
    } else {
        format!("{value:.1}%")
    }
}

/// Deterministic jitter in `-1.0..=1.0` per id.
pub fn stable_pair(id: &str) -> (f32, f32) {
    let mut hasher = DefaultHasher::new();
    id.hash(&mut hasher);
    let hash = hasher.finish();

    let x = ((hash & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    let y = (((hash >> 32) & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    ((x * 2.0) - 1.0, (y * 2.0) - 1.0)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn properties_read_naturally() {
        assert_eq!(format_property(&json!("CORP.LOCAL")), "CORP.LOCAL");
        assert_eq!(format_property(&json!(["a", 2, true])), "a, 2, true");
        assert_eq!(format_property(&json!(null)), "none");
        assert_eq!(format_property(&json!({"k": 1})), r#"{"k":1}"#);
    }

    #[test]
    fn percentages_drop_needless_decimals() {
        assert_eq!(format_percent(40.0), "40%");
        assert_eq!(format_percent(12.4), "12.4%");
    }

    #[test]
    fn jitter_is_stable_and_bounded() {
        let first = stable_pair("S-1-5-21-500");
        assert_eq!(first, stable_pair("S-1-5-21-500"));
        assert!((-1.0..=1.0).contains(&first.0));
        assert!((-1.0..=1.0).contains(&first.1));
    }
}
