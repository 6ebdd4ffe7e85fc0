use std::fs;

use mmwave_hardware::FileLimitStore;
use mmwave_hardware::error::HwError;
use mmwave_traits::LimitStore;
use rstest::rstest;
use tempfile::tempdir;

#[rstest]
fn missing_file_is_empty_and_save_creates_it() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("limits.toml");
    let mut store = FileLimitStore::open(&path).unwrap();
    assert_eq!(store.load("max_distance"), None);

    store.save("max_distance", 3.5).unwrap();
    store.save("min_tilt_angle", -45.0).unwrap();
    assert!(path.exists());
    assert!(!path.with_extension("new").exists(), "temp file renamed away");

    let reopened = FileLimitStore::open(&path).unwrap();
    assert_eq!(reopened.load("max_distance"), Some(3.5));
    assert_eq!(reopened.load("min_tilt_angle"), Some(-45.0));
}

#[rstest]
fn accepts_integer_values() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("limits.toml");
    fs::write(&path, "max_tilt_angle = 30\n").unwrap();
    let store = FileLimitStore::open(&path).unwrap();
    assert_eq!(store.load("max_tilt_angle"), Some(30.0));
}

#[rstest]
fn garbage_is_a_parse_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("limits.toml");
    fs::write(&path, "max_distance = \"far\"\n").unwrap();
    let err = FileLimitStore::open(&path).unwrap_err();
    assert!(matches!(err, HwError::Parse { .. }), "got {err:?}");
}
