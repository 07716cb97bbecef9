//! Property-based tests for typing, paths and value export.

use crate::path::ToPath;
use crate::types::{parse_bool, ItemType};
use crate::{Config, Item, Section};
use proptest::prelude::*;
use serde_json::{json, Map, Value};

// Names that are valid keys: no separator, no meta or private prefix
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,8}"
}

// Scalar defaults of every guessable kind
fn scalar_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        (-1.0e6f64..1.0e6).prop_map(|f| json!(f)),
        "[a-zA-Z ]{0,12}".prop_map(Value::String),
    ]
}

// A two-level schema: sections of scalar items
fn schema_strategy() -> impl Strategy<Value = Value> {
    prop::collection::btree_map(
        key_strategy(),
        prop::collection::btree_map(key_strategy(), scalar_strategy(), 1..5),
        1..4,
    )
    .prop_map(|sections| {
        let mut root = Map::new();
        for (name, items) in sections {
            root.insert(name, Value::Object(items.into_iter().collect()));
        }
        Value::Object(root)
    })
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 500,
        .. ProptestConfig::default()
    })]

    // Guessing a scalar and coercing it through the guessed type is lossless
    #[test]
    fn guessed_type_accepts_its_value(value in scalar_strategy()) {
        let item_type = ItemType::guess(&value);
        prop_assert!(item_type.accepts(&value));
        prop_assert_eq!(item_type.deserialize(&value).unwrap(), value);
    }

    // Booleans always guess as bool, never as a number
    #[test]
    fn booleans_guess_as_bool(flag in any::<bool>()) {
        prop_assert_eq!(ItemType::guess(&Value::Bool(flag)), ItemType::Bool);
    }

    // Integers survive the text round trip through their type
    #[test]
    fn int_text_round_trip(n in any::<i64>()) {
        prop_assert_eq!(ItemType::Int.parse_str(&n.to_string()).unwrap(), Value::from(n));
    }

    // Token parsing ignores case and surrounding whitespace
    #[test]
    fn bool_tokens_case_insensitive(
        token in prop::sample::select(vec!["yes", "on", "true", "1", "no", "off", "false", "0"]),
        upper in any::<bool>()
    ) {
        let raw = if upper { token.to_uppercase() } else { token.to_string() };
        let expected = matches!(token, "yes" | "on" | "true" | "1");
        prop_assert_eq!(parse_bool(&format!("  {raw} ")).unwrap(), expected);
    }

    // Dotted and segmented paths address the same node
    #[test]
    fn path_forms_agree(segments in prop::collection::vec(key_strategy(), 1..6)) {
        let dotted = segments.join(".");
        prop_assert_eq!(dotted.to_segments(".").unwrap(), segments.clone());
        prop_assert_eq!(segments.to_segments(".").unwrap(), segments);
    }

    // Exporting values and loading them into a fresh tree reproduces them
    #[test]
    fn dump_then_load_reproduces_values(schema in schema_strategy(), flat in any::<bool>()) {
        let config = Config::from_schema(schema.clone()).unwrap();
        let exported = config.dump_values(true, flat).unwrap();
        let fresh = Config::from_schema(schema).unwrap();
        fresh.reset().unwrap();
        fresh.load_values(&exported, false, flat).unwrap();
        prop_assert_eq!(fresh.dump_values(true, flat).unwrap(), exported);
    }

    // A JSON export with defaults rebuilds the same tree from nothing
    #[test]
    fn json_export_rebuilds_empty_tree(schema in schema_strategy()) {
        let config = Config::from_schema(schema).unwrap();
        let text = config.json().dumps(true).unwrap();
        let rebuilt = Config::new();
        rebuilt.json().loads(&text, true).unwrap();
        prop_assert_eq!(
            rebuilt.dump_values(true, false).unwrap(),
            config.dump_values(true, false).unwrap()
        );
    }

    // Iteration lists every declared item exactly once
    #[test]
    fn iteration_visits_each_item_once(schema in schema_strategy()) {
        let section = Section::from_schema(schema.clone()).unwrap();
        let expected: usize = schema
            .as_object()
            .unwrap()
            .values()
            .map(|items| items.as_object().unwrap().len())
            .sum();
        prop_assert_eq!(section.iter_items(true).len(), expected);
    }

    // Setting a value then resetting always returns to the default
    #[test]
    fn reset_restores_default(default in any::<i64>(), value in any::<i64>()) {
        let item = Item::builder().default(default).build().unwrap();
        item.set(value).unwrap();
        item.reset().unwrap();
        prop_assert!(item.is_default());
        prop_assert_eq!(item.get().unwrap(), Some(Value::from(default)));
    }
}
