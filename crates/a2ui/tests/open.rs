use std::fs;

use a2ui::TrustMode;
use a2ui::ValidationError;
use camino::Utf8Path;
use serde_json::json;
use tempfile::tempdir;

fn dangling_update() -> serde_json::Value {
    json!({"surfaceUpdate": {"surfaceId": "main", "components": [
        {"id": "root", "component": {"Column": {"children": ["ghost"]}}}
    ]}})
}

#[test]
fn open_without_configuration_is_permissive() {
    let dir = tempdir().unwrap();
    let mut processor = a2ui::open(Utf8Path::from_path(dir.path()).unwrap(), None).unwrap();

    assert_eq!(processor.trust(), TrustMode::Permissive);
    processor.process_value(dangling_update()).unwrap();
}

#[test]
fn open_in_validate_mode_rejects_broken_payloads() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("a2ui.toml"),
        "[processing]\ntrust = \"validate\"\n",
    )
    .unwrap();
    let mut processor = a2ui::open(Utf8Path::from_path(dir.path()).unwrap(), None).unwrap();

    assert_eq!(processor.trust(), TrustMode::Validate);
    let err = processor.process_value(dangling_update()).unwrap_err();
    assert!(matches!(
        err.validation(),
        Some(ValidationError::DanglingReference { .. })
    ));
}

#[test]
fn configured_limits_reach_the_validator() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("a2ui.toml"),
        "[processing]\ntrust = \"validate\"\n[validation]\nmax_global_depth = 3\n",
    )
    .unwrap();
    let mut processor = a2ui::open(Utf8Path::from_path(dir.path()).unwrap(), None).unwrap();

    let err = processor
        .process_value(json!({"updateDataModel": {
            "surfaceId": "main",
            "path": "/a",
            "value": {"b": {"c": {"d": 1}}}
        }}))
        .unwrap_err();
    assert_eq!(
        err.validation(),
        Some(&ValidationError::GlobalRecursionLimitExceeded { limit: 3 })
    );
}

#[test]
fn invalid_configuration_is_reported() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a2ui.toml"), "debug = \"loud\"\n").unwrap();

    let err = a2ui::open(Utf8Path::from_path(dir.path()).unwrap(), None).unwrap_err();
    assert!(matches!(err, a2ui::Error::Config(_)));
}
