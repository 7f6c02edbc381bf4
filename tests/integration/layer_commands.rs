//! `layer`, `layerset` and `query` against the mock device.

use vk::device::keys;
use vk::error::{Missing, VkError};

use crate::common::harness::{Event, Harness};

const APP: &str = "com.foo.bar";

#[test]
fn test_add_global_layers_keeps_order() {
    let h = Harness::new();
    h.device.seed_prop(keys::GLOBAL_LAYERS, "VK_LAYER_b");

    h.run(&["layer", "--add", "VK_LAYER_a:VK_LAYER_b:VK_LAYER_c"])
        .unwrap();

    assert_eq!(
        h.snapshot().global_layers.to_value(),
        "VK_LAYER_b:VK_LAYER_a:VK_LAYER_c"
    );
    assert!(h.output.has_message("Successfully updated active layers"));
    assert!(h.output.last_layer_state().is_some());
}

#[test]
fn test_add_then_remove_in_one_edit() {
    let h = Harness::new();
    h.run(&["layer", "--add", "VK_LAYER_a:VK_LAYER_b", "--remove", "VK_LAYER_a"])
        .unwrap();
    assert_eq!(h.snapshot().global_layers.to_value(), "VK_LAYER_b");
}

#[test]
fn test_remove_all_token() {
    let h = Harness::new();
    h.device.seed_prop(keys::GLOBAL_LAYERS, "VK_LAYER_a:VK_LAYER_b");
    h.run(&["layer", "--remove", "*"]).unwrap();
    assert!(h.snapshot().global_layers.is_empty());
}

#[test]
fn test_per_app_edit_enables_app_layers() {
    let h = Harness::with_apps(&[APP]);
    h.run(&["layer", "--app", APP, "--set", "VK_LAYER_x:VK_LAYER_y"])
        .unwrap();

    let state = h.snapshot();
    assert!(state.enabled);
    assert_eq!(state.app.as_deref(), Some(APP));
    assert_eq!(state.app_layers.to_value(), "VK_LAYER_x:VK_LAYER_y");
    assert!(state.global_layers.is_empty());
    assert_eq!(h.store().last_app(), Some(APP));
}

#[test]
fn test_unknown_app_is_rejected_before_any_write() {
    let h = Harness::with_apps(&[APP]);
    let err = h
        .run(&["layer", "--app", "com.not.installed", "--add", "VK_LAYER_a"])
        .unwrap_err();
    assert!(matches!(err, VkError::NotFound { kind: Missing::App, .. }));
    assert!(h.device.operations().is_empty());
}

#[test]
fn test_conflicting_flags_touch_nothing() {
    let h = Harness::new();

    let err = h.run(&["layer", "--add", "VK_LAYER_a", "--clear"]).unwrap_err();
    assert!(matches!(err, VkError::UsageConflict(_)));

    let err = h
        .run(&["layer", "--set", "VK_LAYER_a", "--remove", "VK_LAYER_b"])
        .unwrap_err();
    assert!(matches!(err, VkError::UsageConflict(_)));

    assert!(h.device.operations().is_empty());
}

#[test]
fn test_clear_resets_every_key() {
    let h = Harness::new();
    h.device.seed_prop(keys::GLOBAL_LAYERS, "VK_LAYER_g");
    h.device.seed_setting(keys::ENABLE_APP_LAYERS, "1");
    h.device.seed_setting(keys::DEBUG_APP, APP);
    h.device.seed_setting(keys::APP_LAYERS, "VK_LAYER_a");

    h.run(&["layer", "--clear"]).unwrap();

    let state = h.snapshot();
    assert!(!state.enabled);
    assert_eq!(state.app, None);
    assert!(state.app_layers.is_empty());
    assert!(state.global_layers.is_empty());
    assert!(h.output.has_message("Clear all relevant layer settings"));
}

#[test]
fn test_preset_save_load_delete() {
    let h = Harness::new();
    h.device.seed_prop(keys::GLOBAL_LAYERS, "VK_LAYER_g");
    h.device.seed_setting(keys::DEBUG_APP, APP);
    h.device.seed_setting(keys::APP_LAYERS, "VK_LAYER_a:VK_LAYER_b");

    h.run(&["layerset", "validation", "--save"]).unwrap();

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(h.settings_path()).unwrap()).unwrap();
    assert_eq!(
        raw["layerset"]["validation"],
        serde_json::json!(["VK_LAYER_g", APP, "VK_LAYER_a:VK_LAYER_b"])
    );

    h.run(&["layer", "--clear"]).unwrap();
    h.run(&["layerset", "validation", "--load"]).unwrap();

    let state = h.snapshot();
    assert_eq!(state.global_layers.to_value(), "VK_LAYER_g");
    assert_eq!(state.app.as_deref(), Some(APP));
    assert_eq!(state.app_layers.to_value(), "VK_LAYER_a:VK_LAYER_b");
    // Loading leaves the enable flag as the clear set it.
    assert!(!state.enabled);

    h.run(&["layerset", "validation", "--delete"]).unwrap();
    assert!(!h.store().contains("validation"));
}

#[test]
fn test_overwriting_a_preset_asks_first() {
    let h = Harness::new();
    h.device.seed_prop(keys::GLOBAL_LAYERS, "VK_LAYER_old");
    h.run(&["layerset", "p", "--save"]).unwrap();
    h.device.seed_prop(keys::GLOBAL_LAYERS, "VK_LAYER_new");

    let err = h.answer(&["layerset", "p", "--save"], &["n"]).unwrap_err();
    assert!(err.is_clean_abort());
    assert_eq!(h.store().get("p").unwrap().global_layers, "VK_LAYER_old");

    h.answer(&["layerset", "p", "--save"], &["y"]).unwrap();
    assert_eq!(h.store().get("p").unwrap().global_layers, "VK_LAYER_new");
}

#[test]
fn test_load_from_menu() {
    let h = Harness::new();
    for (name, layer) in [("first", "VK_LAYER_1"), ("second", "VK_LAYER_2")] {
        h.device.seed_prop(keys::GLOBAL_LAYERS, layer);
        h.run(&["layerset", name, "--save"]).unwrap();
    }
    h.device.seed_prop(keys::GLOBAL_LAYERS, "");

    h.answer(&["layerset", "?", "--load"], &["5", "2"]).unwrap();

    assert_eq!(h.snapshot().global_layers.to_value(), "VK_LAYER_2");
    assert!(h.output.has_message("Load preset 'second'"));
}

#[test]
fn test_missing_presets() {
    let h = Harness::new();

    let err = h.run(&["layerset", "nope", "--load"]).unwrap_err();
    assert!(matches!(err, VkError::NotFound { kind: Missing::Preset, .. }));

    let err = h.run(&["layerset", "nope", "--delete"]).unwrap_err();
    assert!(matches!(err, VkError::NotFound { kind: Missing::Preset, .. }));

    let err = h.run(&["layerset", "?", "--load"]).unwrap_err();
    assert!(matches!(err, VkError::NotFound { kind: Missing::Preset, .. }));
}

#[test]
fn test_query_presets_in_saved_order() {
    let h = Harness::new();
    for name in ["zeta", "alpha", "mid"] {
        h.run(&["layerset", name, "--save"]).unwrap();
    }
    h.output.clear();

    h.run(&["query", "--layerset"]).unwrap();

    let listed: Vec<String> = h
        .output
        .events()
        .into_iter()
        .find_map(|e| match e {
            Event::Presets(p) => Some(p.into_iter().map(|(n, _)| n).collect()),
            _ => None,
        })
        .unwrap();
    assert_eq!(listed, vec!["zeta", "alpha", "mid"]);
}

#[test]
fn test_query_layers_and_apps() {
    let h = Harness::new();
    h.device.set_packages(&["com.a.b", "com.c.d"], &[]);
    h.device.seed_prop(keys::GLOBAL_LAYERS, "VK_LAYER_g");

    h.run(&["query", "--layer", "--detailed"]).unwrap();
    h.run(&["query", "--app"]).unwrap();

    let state = h.output.last_layer_state().unwrap();
    assert_eq!(state.global_layers.to_value(), "VK_LAYER_g");
    assert!(h.output.events().iter().any(|e| matches!(
        e,
        Event::Packages(p) if p == &["com.a.b".to_string(), "com.c.d".to_string()]
    )));
    assert!(h.device.operations().is_empty());
}
