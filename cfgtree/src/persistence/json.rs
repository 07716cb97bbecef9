use serde_json::Value;

use super::{expect_object, ConfigFormat};
use crate::error::Result;
use crate::section::Section;

/// Pretty-printed JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormat;

impl ConfigFormat for JsonFormat {
    fn name(&self) -> &'static str {
        "json"
    }

    fn parse(&self, text: &str) -> Result<Value> {
        if text.trim().is_empty() {
            return expect_object(Value::Null);
        }
        expect_object(serde_json::from_str(text)?)
    }

    fn render(&self, section: &Section, with_defaults: bool) -> Result<String> {
        let values = section.export(with_defaults, false, true)?;
        Ok(serde_json::to_string_pretty(&values)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Config;
    use serde_json::json;

    #[test]
    fn test_dict_items_round_trip() {
        let config = Config::from_schema(json!({
            "hosts": {"@type": "dict", "@default": {}},
            "name": "svc"
        }))
        .unwrap();
        config.set_value("hosts", json!({"a": 1})).unwrap();
        let text = config.json().dumps(false).unwrap();
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, json!({"hosts": {"@type": "dict", "a": 1}}));

        let fresh = Config::new();
        fresh.json().loads(&text, true).unwrap();
        let hosts = fresh.get_item("hosts").unwrap();
        assert_eq!(hosts.item_type(), crate::ItemType::Dict);
        assert_eq!(hosts.get().unwrap(), Some(json!({"a": 1})));
    }

    #[test]
    fn test_parse_error_surfaces() {
        let config = Config::from_schema(json!({"a": 1})).unwrap();
        assert!(matches!(
            config.json().loads("{not json", false),
            Err(crate::Error::Json(_))
        ));
    }
}
