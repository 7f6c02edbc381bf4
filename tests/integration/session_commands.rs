//! Commands that run an app under a temporarily activated layer.
//!
//! Whatever happens inside, the four layer keys and every side property must
//! read back as they were before the command.

use std::cell::RefCell;

use vk::commands::CANCEL_HINT;
use vk::device::keys;
use vk::device::mock::{MockDevice, Operation};
use vk::error::{Missing, Result, VkError};
use vk::prompt::Prompt;

use crate::common::harness::Harness;

const APP: &str = "com.foo.bar";
const TRACE: &str = "/sdcard/vk_trace_repo/com.foo.bar/com.foo.bar-test.gfxr";

fn seeded(apps: &[&str]) -> Harness {
    let h = Harness::with_apps(apps);
    h.device.seed_prop(keys::GLOBAL_LAYERS, "VK_LAYER_g");
    h.device.seed_setting(keys::ENABLE_APP_LAYERS, "0");
    h.device.seed_setting(keys::DEBUG_APP, "com.other.app");
    h.device.seed_setting(keys::APP_LAYERS, "VK_LAYER_x");
    h
}

fn prop(device: &MockDevice, key: &str) -> String {
    device.prop(key).unwrap_or_default()
}

/// Operator that waits until the api_dump layer has written its file, then
/// gives `answer` (or presses ctrl+c when `answer` is `None`).
struct DumpOperator<'a> {
    device: &'a MockDevice,
    answer: Option<&'static str>,
    dumped: RefCell<Option<String>>,
    shown: RefCell<Vec<String>>,
}

impl<'a> DumpOperator<'a> {
    fn new(device: &'a MockDevice, answer: Option<&'static str>) -> Self {
        Self {
            device,
            answer,
            dumped: RefCell::new(None),
            shown: RefCell::new(Vec::new()),
        }
    }

    fn dumped(&self) -> String {
        self.dumped.borrow().clone().expect("Operator was never asked")
    }
}

impl Prompt for DumpOperator<'_> {
    fn ask(&self, _question: &str) -> Result<String> {
        let path = prop(self.device, keys::API_DUMP_LOG_FILENAME);
        self.device.seed_file(&path, b"vkCreateInstance");
        *self.dumped.borrow_mut() = Some(path);
        self.answer
            .map(ToString::to_string)
            .ok_or(VkError::Interrupted)
    }

    fn show(&self, line: &str) {
        self.shown.borrow_mut().push(line.to_string());
    }
}

// === dump-api ===

#[test]
fn test_dump_api_pulls_and_cleans_up() {
    let h = seeded(&[APP]);
    h.device.install_app_layer(APP, "libVkLayer_api_dump.so");
    let before = h.snapshot();
    let dest = h.host_path("out");
    let operator = DumpOperator::new(&h.device, Some("sp"));

    h.run_with(
        &["dump-api", "--app", APP, "-f", "json", "-d", dest.to_str().unwrap()],
        &operator,
    )
    .unwrap();

    let dumped = operator.dumped();
    assert!(dumped.starts_with("/sdcard/Android/data/com.foo.bar/files/"));
    assert!(dumped.ends_with(".api.json"));
    assert!(h.device.file(&dumped).is_none());

    let pulled: Vec<_> = std::fs::read_dir(&dest).unwrap().map(|e| e.unwrap().path()).collect();
    assert_eq!(pulled.len(), 1);
    let name = pulled[0].file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("com.foo.bar_") && name.ends_with(".api.json"));
    assert_eq!(std::fs::read(&pulled[0]).unwrap(), b"vkCreateInstance");

    h.device.assert_contains(&Operation::StartApp {
        app: APP.to_string(),
    });
    assert_eq!(h.snapshot(), before);
    assert_eq!(prop(&h.device, keys::API_DUMP_LOG_FILENAME), "");
    assert_eq!(prop(&h.device, keys::API_DUMP_OUTPUT_FORMAT), "");
}

#[test]
fn test_dump_api_stop_without_pull_still_deletes() {
    let h = seeded(&[APP]);
    h.device.install_app_layer(APP, "libVkLayer_api_dump.so");
    let dest = h.host_path("out");
    let operator = DumpOperator::new(&h.device, Some("s"));

    h.run_with(&["dump-api", "--app", APP, "-d", dest.to_str().unwrap()], &operator)
        .unwrap();

    assert!(!dest.exists());
    h.device.assert_contains(&Operation::RemoveFile {
        path: operator.dumped(),
    });
}

#[test]
fn test_dump_api_interrupted_restores_and_deletes() {
    let h = seeded(&[APP]);
    h.device.install_app_layer(APP, "libVkLayer_api_dump.so");
    let before = h.snapshot();
    let operator = DumpOperator::new(&h.device, None);

    let err = h.run_with(&["dump-api", "--app", APP], &operator).unwrap_err();

    assert!(matches!(err, VkError::Interrupted));
    assert!(h.device.file(&operator.dumped()).is_none());
    assert!(h.output.has_message("API dump is canceled."));
    assert_eq!(h.snapshot(), before);
    assert_eq!(prop(&h.device, keys::API_DUMP_LOG_FILENAME), "");
}

#[test]
fn test_dump_tells_operator_how_to_cancel() {
    let h = seeded(&[APP]);
    h.device.install_app_layer(APP, "libVkLayer_api_dump.so");
    let operator = DumpOperator::new(&h.device, Some("s"));

    h.run_with(&["dump-api", "--app", APP], &operator).unwrap();

    assert_eq!(*operator.shown.borrow(), vec![CANCEL_HINT.to_string()]);
}

#[test]
fn test_dump_api_requires_layer_binary() {
    let h = seeded(&[APP]);
    let err = h.run(&["dump-api", "--app", APP]).unwrap_err();
    assert!(matches!(err, VkError::NotFound { kind: Missing::Layer, .. }));
    assert!(h.device.operations().is_empty());
}

// === dump-img ===

#[test]
fn test_dump_img_grants_storage_and_removes_folder() {
    let h = seeded(&[APP]);
    h.device.install_app_layer(APP, "libVkLayer_screenshot.so");
    let before = h.snapshot();

    h.answer(&["dump-img", "--app", APP, "-r", "10-5-3"], &["S"]).unwrap();

    h.device.assert_contains(&Operation::Shell {
        command: "pm grant com.foo.bar android.permission.WRITE_EXTERNAL_STORAGE".to_string(),
    });
    h.device.assert_contains(&Operation::SetProp {
        key: keys::SCREENSHOT_FRAMES.to_string(),
        value: "10-5-3".to_string(),
    });
    let removed = h.device.operations().into_iter().find_map(|op| match op {
        Operation::RemoveDir { path } => Some(path),
        _ => None,
    });
    let removed = removed.expect("Screenshot folder was not removed");
    assert!(removed.starts_with("/sdcard/Android/vkcli/com.foo.bar_"));
    assert!(!h.device.has_dir(&removed));

    assert_eq!(h.snapshot(), before);
    assert_eq!(prop(&h.device, keys::SCREENSHOT_FRAMES), "");
    assert_eq!(prop(&h.device, keys::SCREENSHOT_DIR), "");
}

#[test]
fn test_global_dump_img_pulls_folder() {
    let h = seeded(&[]);
    h.device.install_global_layer("libVkLayer_screenshot.so");
    let before = h.snapshot();
    let dest = h.host_path("shots");

    h.answer(&["dump-img", "-d", dest.to_str().unwrap()], &["x", "sp"])
        .unwrap();

    let pulled: Vec<String> = std::fs::read_dir(&dest)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(pulled.len(), 1);
    assert!(pulled[0].starts_with("screenshot_") && pulled[0].ends_with(".imgs"));

    // Global sessions never drive an app.
    assert!(
        !h.device
            .operations()
            .iter()
            .any(|op| matches!(op, Operation::StartApp { .. }))
    );
    assert_eq!(h.snapshot(), before);
}

// === record ===

#[test]
fn test_record_sets_capture_props_and_remembers_trace() {
    let h = seeded(&[APP]);
    h.device.set_app_lifetime(APP, 2);
    let before = h.snapshot();

    h.run(&["record", APP, "-f", "test", "--frames", "5"]).unwrap();

    h.device.assert_contains(&Operation::MakeDir {
        path: "/sdcard/vk_trace_repo/com.foo.bar".to_string(),
    });
    h.device.assert_contains(&Operation::SetProp {
        key: keys::CAPTURE_FILE.to_string(),
        value: TRACE.to_string(),
    });
    h.device.assert_contains(&Operation::SetProp {
        key: keys::CAPTURE_FRAMES.to_string(),
        value: "5".to_string(),
    });
    h.device.assert_contains(&Operation::PutSetting {
        key: keys::APP_LAYERS.to_string(),
        value: "VK_LAYER_LUNARG_gfxreconstruct".to_string(),
    });
    h.device.assert_contains(&Operation::StartApp {
        app: APP.to_string(),
    });

    assert_eq!(h.snapshot(), before);
    assert_eq!(prop(&h.device, keys::CAPTURE_FILE), "");
    assert_eq!(prop(&h.device, keys::CAPTURE_FRAMES), "");

    let store = h.store();
    assert_eq!(store.last_trace(), Some("com.foo.bar-test.gfxr"));
    assert_eq!(store.last_app(), Some(APP));
    assert!(h.output.has_message(&format!("Finish recording {TRACE}")));
}

#[test]
fn test_record_existing_trace_declined() {
    let h = seeded(&[APP]);
    h.device.seed_file(TRACE, b"old");

    let err = h.answer(&["record", APP, "-f", "test.gfxr"], &["n"]).unwrap_err();

    assert!(err.is_clean_abort());
    assert_eq!(h.device.file(TRACE).unwrap(), b"old");
    assert!(
        !h.device
            .operations()
            .iter()
            .any(|op| matches!(op, Operation::SetProp { .. }))
    );
    assert_eq!(h.store().last_trace(), None);
}

#[test]
fn test_record_then_pull_trace_and_log() {
    let h = seeded(&[APP]);
    h.device.seed_file(TRACE, b"trace");
    h.device.seed_file(&format!("{TRACE}.log"), b"log");
    let dest = h.host_path("traces");

    h.answer(
        &["record", APP, "-f", "test", "--log", "--pull", dest.to_str().unwrap()],
        &["y"],
    )
    .unwrap();

    h.device.assert_contains(&Operation::SetProp {
        key: keys::CAPTURE_LOG_FILE.to_string(),
        value: format!("{TRACE}.log"),
    });
    assert_eq!(std::fs::read(dest.join("com.foo.bar-test.gfxr")).unwrap(), b"trace");
    assert_eq!(std::fs::read(dest.join("com.foo.bar-test.gfxr.log")).unwrap(), b"log");
    assert_eq!(h.output.transfers().len(), 2);
}

#[test]
fn test_record_failure_inside_session_restores() {
    let h = seeded(&[APP]);
    let before = h.snapshot();
    h.device
        .fail_when(|op| matches!(op, Operation::StartApp { .. }));

    let err = h.run(&["record", APP]).unwrap_err();

    assert!(matches!(err, VkError::ExecutionFailure { .. }));
    assert_eq!(h.snapshot(), before);
    assert_eq!(prop(&h.device, keys::CAPTURE_FILE), "");
    assert_eq!(h.store().last_trace(), None);
}

// === validate ===

#[test]
fn test_validate_with_sync_checks() {
    let h = seeded(&[APP]);
    h.device
        .install_app_layer(APP, "libVkLayer_khronos_validation.so");
    h.device.seed_prop(keys::VALIDATION_ENABLES, "previous");
    let before = h.snapshot();

    h.run(&["validate", "--app", APP, "--check-sync"]).unwrap();

    h.device.assert_contains(&Operation::SetProp {
        key: keys::VALIDATION_ENABLES.to_string(),
        value: "VK_VALIDATION_FEATURE_ENABLE_SYNCHRONIZATION_VALIDATION_EXT".to_string(),
    });
    h.device.assert_contains(&Operation::UnlockScreen);
    h.device.assert_contains(&Operation::PutSetting {
        key: keys::DEBUG_APP.to_string(),
        value: APP.to_string(),
    });

    assert_eq!(h.snapshot(), before);
    assert_eq!(prop(&h.device, keys::VALIDATION_ENABLES), "previous");
    assert!(h.output.has_message("Finish validating com.foo.bar"));
}

#[test]
fn test_validate_requires_app_layer() {
    let h = seeded(&[APP]);
    h.device
        .install_global_layer("libVkLayer_khronos_validation.so");

    let err = h.run(&["validate", "--app", APP]).unwrap_err();

    assert!(matches!(err, VkError::NotFound { kind: Missing::Layer, .. }));
    assert!(
        !h.device
            .operations()
            .iter()
            .any(|op| matches!(op, Operation::PutSetting { .. }))
    );
}
