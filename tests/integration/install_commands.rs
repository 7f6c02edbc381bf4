//! `install`: copying layer binaries onto the device.

use std::path::PathBuf;

use vk::device::mock::Operation;
use vk::device::{global_layer_dir, keys};
use vk::error::{Missing, VkError};

use crate::common::harness::Harness;

const APP: &str = "com.foo.bar";

/// Host folder with two layer binaries and one unrelated file.
fn layer_folder(h: &Harness) -> PathBuf {
    let dir = h.host_path("layers");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("libVkLayer_b.so"), b"b").unwrap();
    std::fs::write(dir.join("libVkLayer_a.so"), b"a").unwrap();
    std::fs::write(dir.join("README.md"), b"docs").unwrap();
    dir
}

fn shell(command: &str) -> Operation {
    Operation::Shell {
        command: command.to_string(),
    }
}

#[test]
fn test_global_install_of_folder() {
    let h = Harness::with_apps(&[APP]);
    h.device.seed_prop(keys::BUILD_TYPE, "userdebug");
    let dir = layer_folder(&h);

    h.run(&["install", dir.to_str().unwrap()]).unwrap();

    let global = global_layer_dir();
    h.device.assert_contains(&Operation::Exec {
        args: vec!["root".to_string()],
    });
    h.device.assert_contains(&shell("setenforce 0"));
    h.device.assert_contains(&shell(&format!("chmod +x {global}/libVkLayer_a.so")));
    assert_eq!(h.device.file(&format!("{global}/libVkLayer_a.so")).unwrap(), b"a");
    assert_eq!(h.device.file(&format!("{global}/libVkLayer_b.so")).unwrap(), b"b");
    assert!(h.device.file(&format!("{global}/README.md")).is_none());

    assert_eq!(h.store().layer_dir(), Some(dir.as_path()));
}

#[test]
fn test_app_install_on_user_build_goes_through_run_as() {
    let h = Harness::with_apps(&[APP]);
    h.device.seed_prop(keys::BUILD_TYPE, "user");
    let dir = layer_folder(&h);
    h.store().set_layer_dir(&dir).unwrap();

    h.answer(&["install", "--app", APP, "?"], &["2"]).unwrap();

    h.device.assert_contains(&Operation::Push {
        src: dir.join("libVkLayer_b.so").display().to_string(),
        dst: "/data/local/tmp".to_string(),
    });
    h.device
        .assert_contains(&shell("run-as com.foo.bar cp /data/local/tmp/libVkLayer_b.so ."));
    assert!(
        !h.device
            .operations()
            .iter()
            .any(|op| matches!(op, Operation::Exec { .. }))
    );
}

#[test]
fn test_app_install_by_name_from_last_folder() {
    let h = Harness::with_apps(&[APP]);
    h.device.seed_prop(keys::BUILD_TYPE, "userdebug");
    let dir = layer_folder(&h);
    h.store().set_layer_dir(&dir).unwrap();

    h.run(&["install", "--app", APP, "libVkLayer_a"]).unwrap();

    h.device.assert_contains(&Operation::Push {
        src: dir.join("libVkLayer_a.so").display().to_string(),
        dst: "/data/data/com.foo.bar".to_string(),
    });
    h.device
        .assert_contains(&shell("chmod +x /data/data/com.foo.bar/libVkLayer_a.so"));
    assert!(h.output.has_message("Install layers to 'com.foo.bar' successfully."));
}

#[test]
fn test_unresolvable_layers() {
    let h = Harness::with_apps(&[APP]);

    let err = h.run(&["install", "?"]).unwrap_err();
    assert!(matches!(err, VkError::NotFound { kind: Missing::HostPath, .. }));

    let err = h.run(&["install", "libVkLayer_missing"]).unwrap_err();
    assert!(matches!(err, VkError::NotFound { kind: Missing::HostPath, .. }));

    assert!(h.device.operations().is_empty());
}

#[test]
fn test_empty_folder_installs_nothing() {
    let h = Harness::with_apps(&[APP]);
    let dir = h.host_path("empty");
    std::fs::create_dir_all(&dir).unwrap();

    h.run(&["install", dir.to_str().unwrap()]).unwrap();

    assert!(h.output.has_message("Found no layers"));
    assert!(h.device.operations().is_empty());
}
