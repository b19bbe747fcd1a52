use hotspot_viewer::app::{load_catalog, open_preferences};
use hotspot_viewer::config::{AppConfig, AppConfigOverrides, ViewerConfig};
use hotspot_viewer::params::KEY_AUTO_ROTATE;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
fn shipped_config_and_anchor_file_load() {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let config = AppConfig::load(root.join("config/app.json")).expect("app config parses");
    assert_eq!(config.viewer.spinners.len(), 1);

    let viewer = ViewerConfig { anchors_path: Some(root.join("data/aircraft_anchors.json")), ..config.viewer };
    let catalog = load_catalog(&viewer).expect("anchor file loads");
    assert_eq!(catalog.len(), 3);
    assert!(catalog.get("Двигатель").is_some());
}

#[test]
fn duplicate_anchor_ids_are_rejected_in_debug_builds() {
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("anchors.json");
    fs::write(
        &path,
        r#"[{"id":"a","position":[0,0,0],"content":"x"},{"id":"a","position":[1,0,0],"content":"y"}]"#,
    )
    .expect("write anchors");
    let viewer = ViewerConfig { anchors_path: Some(path), ..ViewerConfig::default() };
    let result = load_catalog(&viewer);
    if cfg!(debug_assertions) {
        assert!(result.is_err());
    } else {
        assert_eq!(result.expect("duplicates tolerated").len(), 1);
    }
}

#[test]
fn ephemeral_preferences_never_touch_disk() {
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("prefs.json");
    let mut config = AppConfig::default();
    config.apply_overrides(&AppConfigOverrides {
        prefs_path: Some(path.clone()),
        ephemeral_prefs: Some(true),
        ..AppConfigOverrides::default()
    });

    let mut store = open_preferences(&config.viewer);
    store.set(KEY_AUTO_ROTATE, &false).expect("write preference");
    assert!(!path.exists());
}

#[test]
fn configured_preference_path_is_used() {
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("prefs.json");
    let config = ViewerConfig { prefs_path: Some(path.clone()), ..ViewerConfig::default() };

    let mut store = open_preferences(&config);
    store.set(KEY_AUTO_ROTATE, &false).expect("write preference");
    assert!(path.exists());
    assert!(!open_preferences(&config).get(KEY_AUTO_ROTATE, true));
}
