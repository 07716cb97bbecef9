//! Integration tests for tree construction, resolution and hooks.
//!
//! These exercise the public API the way an application would: declare a
//! tree from a schema, address it by path, and observe it through hooks.

mod common;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use cfgtree::{Config, Error, HookKind, Item, ItemType, Node, Schema, Section, Settings};
use common::uploads_config;
use serde_json::json;

// ============================================================================
// Resolution
// ============================================================================

#[test]
fn test_paths_reach_the_same_item() {
    let config = uploads_config();
    let dotted = config.get_item("uploads.db.user").unwrap();
    let segmented = config.get_item(&["uploads", "db", "user"]).unwrap();
    let mixed = config.get_item(&["uploads.db", "user"]).unwrap();
    assert!(dotted.ptr_eq(&segmented));
    assert!(dotted.ptr_eq(&mixed));
    assert_eq!(dotted.path(), vec!["uploads", "db", "user"]);
}

#[test]
fn test_custom_separator() {
    let config = Config::from_schema_with_settings(
        common::uploads_schema(),
        Settings::default().with_separator("/"),
    )
    .unwrap();
    assert_eq!(config.get("uploads/db/user").unwrap(), Some(json!("root")));
    assert!(config.resolve("uploads.db").unwrap_err().is_not_found());
}

#[test]
fn test_required_item() {
    let config = uploads_config();
    let err = config.get("uploads.db.password").unwrap_err();
    assert!(err.is_required_value_missing());
    assert!(err.to_string().contains("uploads.db.password"));
    assert_eq!(
        config.get_or("uploads.db.password", "fallback").unwrap(),
        json!("fallback")
    );
    config.set_value("uploads.db.password", "secret").unwrap();
    assert_eq!(
        config.get("uploads.db.password").unwrap(),
        Some(json!("secret"))
    );
}

#[test]
fn test_type_coercion_through_tree() {
    let config = uploads_config();
    config.set_value("uploads.threads", "16").unwrap();
    assert_eq!(config.get("uploads.threads").unwrap(), Some(json!(16)));
    assert_eq!(config.get_item("uploads.threads").unwrap().to_string(), "16");

    let err = config.set_value("uploads.threads", "many").unwrap_err();
    assert!(matches!(err, Error::ValueMismatch { .. }));
    assert_eq!(config.get("uploads.threads").unwrap(), Some(json!(16)));

    let err = config.set_value("uploads.enabled", json!([1])).unwrap_err();
    assert!(matches!(err, Error::TypeMismatch { .. }));
}

#[test]
fn test_bool_tokens() {
    let config = uploads_config();
    for (token, expected) in [("Yes", true), ("off", false), ("T", true), ("0", false)] {
        config.set_value("uploads.enabled", token).unwrap();
        assert_eq!(config.get("uploads.enabled").unwrap(), Some(json!(expected)));
        assert_eq!(config.get_item("uploads.enabled").unwrap().to_string(), token);
    }
}

// ============================================================================
// Hooks
// ============================================================================

#[test]
fn test_not_found_auto_vivifies() {
    let config = uploads_config();
    config.on_not_found(|section, name| {
        let node = if name.ends_with("_section") {
            Node::Section(section.add_section(name, Section::new())?)
        } else {
            Node::Item(section.add_item(name, Item::builder().default(0).build()?)?)
        };
        Ok(Some(node))
    });

    let item = config.get_item("uploads.new_section.counter").unwrap();
    assert_eq!(item.path(), vec!["uploads", "new_section", "counter"]);
    assert!(config.contains("uploads.new_section.counter"));
    assert_eq!(item.get().unwrap(), Some(json!(0)));
}

#[test]
fn test_value_changed_bubbles_to_root() {
    let config = uploads_config();
    let changes = Rc::new(RefCell::new(Vec::new()));
    let seen = Rc::clone(&changes);
    config.on_value_changed(move |item, change| {
        seen.borrow_mut().push((
            item.path().join("."),
            change.old_value.clone(),
            change.new_value.clone(),
        ));
        Ok(())
    });
    config.set_value("uploads.db.port", 6543).unwrap();
    config.set_value("uploads.db.port", 6543).unwrap();
    config.get_item("uploads.db.port").unwrap().reset().unwrap();

    assert_eq!(
        *changes.borrow(),
        vec![
            ("uploads.db.port".to_string(), None, Some(json!(6543))),
            ("uploads.db.port".to_string(), Some(json!(6543)), Some(json!(6543))),
            ("uploads.db.port".to_string(), Some(json!(6543)), None),
        ]
    );
}

#[test]
fn test_nearest_handler_short_circuits() {
    let config = uploads_config();
    let db = config.get_section("uploads.db").unwrap();
    let answered_by = Rc::new(RefCell::new(Vec::new()));

    let log = Rc::clone(&answered_by);
    db.on_not_found(move |_, name| {
        log.borrow_mut().push(format!("db:{name}"));
        Ok((name == "host").then(|| Node::Item(Item::new())))
    });
    let log = Rc::clone(&answered_by);
    config.on_not_found(move |_, name| {
        log.borrow_mut().push(format!("root:{name}"));
        Ok(None)
    });

    assert!(config.resolve("uploads.db.host").is_ok());
    assert!(config.resolve("uploads.db.schema").is_err());
    assert_eq!(
        *answered_by.borrow(),
        vec!["db:host", "db:schema", "root:schema"]
    );
}

#[test]
fn test_hook_errors_abort_the_operation() {
    let config = uploads_config();
    config.on_item_added(|_, alias, _| {
        if alias.starts_with("forbidden") {
            Err(Error::Schema {
                message: format!("'{alias}' is reserved"),
            })
        } else {
            Ok(())
        }
    });
    assert!(config.add_item("allowed", Item::new()).is_ok());
    assert!(matches!(
        config.add_item("forbidden_key", Item::new()),
        Err(Error::Schema { .. })
    ));
}

#[test]
fn test_raw_hook_registration() {
    let config = uploads_config();
    let kinds = Rc::new(RefCell::new(Vec::new()));
    for kind in [HookKind::ItemAdded, HookKind::SectionAdded] {
        let kinds = Rc::clone(&kinds);
        config.register_hook(kind, move |event| {
            kinds.borrow_mut().push(event.kind());
            Ok(None)
        });
    }
    let extra = config.add_section("extra", Section::new()).unwrap();
    extra.add_item("flag", Item::new()).unwrap();
    assert_eq!(
        *kinds.borrow(),
        vec![HookKind::SectionAdded, HookKind::ItemAdded]
    );
}

#[test]
fn test_hooks_off_when_disabled_explicitly() {
    let config = Config::from_schema_with_settings(
        json!({"a": 1}),
        Settings::default().with_hooks_enabled(false),
    )
    .unwrap();
    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);
    config.on_value_changed(move |_, _| {
        counter.set(counter.get() + 1);
        Ok(())
    });
    config.set_value("a", 2).unwrap();
    assert_eq!(calls.get(), 0);
}

// ============================================================================
// Structure
// ============================================================================

#[test]
fn test_iteration_is_deterministic() {
    let config = uploads_config();
    let items: Vec<String> = config
        .iter_items(true)
        .into_iter()
        .map(|(path, _)| path.join("."))
        .collect();
    assert_eq!(
        items,
        vec![
            "uploads.enabled",
            "uploads.threads",
            "uploads.tmp_dir",
            "uploads.db.user",
            "uploads.db.password",
            "uploads.db.port",
            "greeting",
        ]
    );
}

#[test]
fn test_equivalent_schemas_dump_equally() {
    #[derive(serde::Serialize)]
    struct Db {
        user: &'static str,
        port: u16,
    }

    let from_map = Section::from_schema(json!({"db": {"user": "root", "port": 5432}})).unwrap();
    let from_struct = Section::from_schema(vec![(
        "db",
        Schema::from_serialize(&Db {
            user: "root",
            port: 5432,
        })
        .unwrap(),
    )])
    .unwrap();
    let from_pairs = Section::from_schema(vec![(
        "db",
        Schema::pairs(vec![("user", Schema::from("root")), ("port", Schema::from(5432))]),
    )])
    .unwrap();

    let expected = from_map.dump_values(true, false).unwrap();
    assert_eq!(from_struct.dump_values(true, false).unwrap(), expected);
    assert_eq!(from_pairs.dump_values(true, false).unwrap(), expected);
}

#[test]
fn test_keyword_named_children() {
    let config = Config::from_schema(json!({"match": {"type": "exact", "fn": "lower"}})).unwrap();
    assert_eq!(config.get("match_.type_").unwrap(), Some(json!("exact")));
    assert_eq!(config.get(&["match", "fn_"]).unwrap(), Some(json!("lower")));
}

#[test]
fn test_is_default_conflates_explicit_default() {
    let config = uploads_config();
    assert!(config.is_default());
    config.set_value("uploads.threads", 1).unwrap();
    assert!(config.is_default());
    assert_eq!(config.dump_values(false, false).unwrap(), json!({}));
    config.set_value("uploads.threads", 2).unwrap();
    assert!(!config.is_default());
}

#[test]
fn test_guessed_types() {
    let config = Config::from_schema(json!({
        "flag": true,
        "count": 1,
        "ratio": 0.5,
        "name": "x",
        "tags": [],
        "nothing": null
    }))
    .unwrap();
    let types: Vec<ItemType> = config
        .iter_items(false)
        .into_iter()
        .map(|(_, item)| item.item_type())
        .collect();
    assert_eq!(
        types,
        vec![
            ItemType::Bool,
            ItemType::Int,
            ItemType::Float,
            ItemType::Str,
            ItemType::List,
            ItemType::Str,
        ]
    );
}
