use serde_json::Value;

use super::{expect_object, ConfigFormat};
use crate::error::Result;
use crate::section::Section;

/// YAML documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlFormat;

impl ConfigFormat for YamlFormat {
    fn name(&self) -> &'static str {
        "yaml"
    }

    fn parse(&self, text: &str) -> Result<Value> {
        if text.trim().is_empty() {
            return expect_object(Value::Null);
        }
        expect_object(serde_yaml::from_str(text)?)
    }

    fn render(&self, section: &Section, with_defaults: bool) -> Result<String> {
        let values = section.export(with_defaults, false, true)?;
        Ok(serde_yaml::to_string(&values)?)
    }
}
