//! Field lookup across the spellings the backend has been seen to use.
//!
//! Every logical field is named once in snake_case; the camelCase and
//! PascalCase spellings are derived from it and probed in a fixed order.

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Casing {
    Snake,
    Camel,
    Pascal,
}

/// Analysis payloads are mostly snake_case.
pub const ANALYSIS_ORDER: &[Casing] = &[Casing::Snake, Casing::Camel, Casing::Pascal];
/// Round records are mostly camelCase.
pub const ROUND_ORDER: &[Casing] = &[Casing::Camel, Casing::Snake, Casing::Pascal];

pub fn spell(snake: &str, casing: Casing) -> String {
    match casing {
        Casing::Snake => snake.to_string(),
        Casing::Camel | Casing::Pascal => {
            let mut out = String::with_capacity(snake.len());
            let mut upper = casing == Casing::Pascal;
            for ch in snake.chars() {
                if ch == '_' {
                    upper = true;
                } else if upper {
                    out.extend(ch.to_uppercase());
                    upper = false;
                } else {
                    out.push(ch);
                }
            }
            out
        }
    }
}

/// Read-only view over a JSON object with alias-aware accessors.
#[derive(Clone, Copy)]
pub struct Fields<'a> {
    obj: &'a Value,
    order: &'static [Casing],
}

impl<'a> Fields<'a> {
    pub fn new(obj: &'a Value, order: &'static [Casing]) -> Self {
        Self { obj, order }
    }

    /// First non-null value under any spelling of `snake`.
    pub fn value(&self, snake: &str) -> Option<&'a Value> {
        let map = self.obj.as_object()?;
        self.order
            .iter()
            .filter_map(|casing| map.get(&spell(snake, *casing)))
            .find(|v| !v.is_null())
    }

    /// Like `value`, also trying extra literal names afterwards.
    pub fn value_or(&self, snake: &str, extra: &[&str]) -> Option<&'a Value> {
        self.value(snake).or_else(|| {
            let map = self.obj.as_object()?;
            extra
                .iter()
                .filter_map(|name| map.get(*name))
                .find(|v| !v.is_null())
        })
    }

    pub fn has(&self, snake: &str) -> bool {
        self.value(snake).is_some()
    }

    pub fn nested(&self, snake: &str) -> Option<Fields<'a>> {
        self.value(snake)
            .filter(|v| v.is_object())
            .map(|v| Fields::new(v, self.order))
    }

    pub fn text(&self, snake: &str) -> Option<String> {
        self.value(snake).and_then(as_text)
    }

    pub fn int(&self, snake: &str) -> Option<i64> {
        self.value(snake).and_then(as_i64)
    }

    pub fn float(&self, snake: &str) -> Option<f64> {
        self.value(snake).and_then(as_f64)
    }

    pub fn flag(&self, snake: &str) -> Option<bool> {
        self.value(snake).and_then(as_bool)
    }

    pub fn strings(&self, snake: &str) -> Vec<String> {
        self.value(snake).map(as_string_list).unwrap_or_default()
    }

    /// Object elements of an array field, each wrapped as `Fields`.
    pub fn objects(&self, snake: &str) -> Vec<Fields<'a>> {
        match self.value(snake) {
            Some(Value::Array(items)) => items
                .iter()
                .filter(|item| item.is_object())
                .map(|item| Fields::new(item, self.order))
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Non-empty text; scalars are rendered, containers are rejected.
pub fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

pub fn as_string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(as_text).collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_spellings() {
        assert_eq!(spell("ai_analysis_json", Casing::Snake), "ai_analysis_json");
        assert_eq!(spell("ai_analysis_json", Casing::Camel), "aiAnalysisJson");
        assert_eq!(spell("ai_analysis_json", Casing::Pascal), "AiAnalysisJson");
        assert_eq!(spell("reasoning", Casing::Pascal), "Reasoning");
    }

    #[test]
    fn test_preference_order() {
        let obj = json!({"round_number": 1, "roundNumber": 2, "RoundNumber": 3});
        assert_eq!(Fields::new(&obj, ROUND_ORDER).int("round_number"), Some(2));
        assert_eq!(Fields::new(&obj, ANALYSIS_ORDER).int("round_number"), Some(1));
    }

    #[test]
    fn test_null_falls_through_to_next_spelling() {
        let obj = json!({"aiAnalysisJson": null, "AiAnalysisJson": "{}"});
        let fields = Fields::new(&obj, ROUND_ORDER);
        assert_eq!(fields.text("ai_analysis_json").as_deref(), Some("{}"));
    }

    #[test]
    fn test_lenient_scalars() {
        let obj = json!({"count": "4", "ok": "TRUE", "score": 0.5, "empty": ""});
        let fields = Fields::new(&obj, ANALYSIS_ORDER);
        assert_eq!(fields.int("count"), Some(4));
        assert_eq!(fields.flag("ok"), Some(true));
        assert_eq!(fields.float("score"), Some(0.5));
        assert_eq!(fields.text("empty"), None);
    }

    #[test]
    fn test_non_object_has_no_fields() {
        let arr = json!([1, 2]);
        assert!(Fields::new(&arr, ANALYSIS_ORDER).value("anything").is_none());
    }
}
