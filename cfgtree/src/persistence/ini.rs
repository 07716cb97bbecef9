use ::ini::Ini;
use serde_json::{Map, Value};

use super::ConfigFormat;
use crate::error::{Error, Result};
use crate::section::Section;

/// Section that holds top-level items in INI files.
pub const INI_ROOT_SECTION: &str = "NO_SECTION";

const DEFAULT_SECTION: &str = "DEFAULT";

/// INI files: one level of sections, string values.
///
/// Top-level items go to `[NO_SECTION]`, items of a first-level section to
/// a header named after it. Deeper trees cannot be written. On reading, the
/// header-less part of the file, `[DEFAULT]` and `[NO_SECTION]` all map to
/// top-level items.
#[derive(Debug, Clone, Copy, Default)]
pub struct IniFormat;

impl ConfigFormat for IniFormat {
    fn name(&self) -> &'static str {
        "ini"
    }

    fn parse(&self, text: &str) -> Result<Value> {
        let ini = Ini::load_from_str(text)?;
        let mut root = Map::new();
        for (header, properties) in &ini {
            let target = match header {
                None | Some(DEFAULT_SECTION | INI_ROOT_SECTION) => &mut root,
                Some(name) => {
                    let entry = root
                        .entry(name.to_string())
                        .or_insert_with(|| Value::Object(Map::new()));
                    let Value::Object(map) = entry else {
                        return Err(Error::TypeMismatch {
                            expected: "section".to_string(),
                            actual: format!("item '{name}'"),
                        });
                    };
                    map
                }
            };
            for (key, value) in properties.iter() {
                target.insert(key.to_string(), Value::String(value.to_string()));
            }
        }
        Ok(Value::Object(root))
    }

    fn render(&self, section: &Section, with_defaults: bool) -> Result<String> {
        let separator = section.separator();
        let mut top = Vec::new();
        let mut nested = Vec::new();
        for (path, item) in section.iter_items(true) {
            if !item.has_value() || (!with_defaults && item.is_default()) {
                continue;
            }
            match path.as_slice() {
                [name] => top.push((name.clone(), item.str_value())),
                [header, name] => nested.push((header.clone(), name.clone(), item.str_value())),
                _ => {
                    return Err(Error::IniDepth {
                        path: path.join(&separator),
                    })
                }
            }
        }

        let mut ini = Ini::new();
        for (name, value) in top {
            ini.with_section(Some(INI_ROOT_SECTION)).set(name, value);
        }
        for (header, name, value) in nested {
            ini.with_section(Some(header)).set(name, value);
        }
        let mut out = Vec::new();
        ini.write_to(&mut out)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }
}
