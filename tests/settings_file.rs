use action_overlay::settings::OverlaySettings;
use tempfile::tempdir;

#[test]
fn missing_file_yields_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("absent.json");
    let settings = OverlaySettings::load(path.to_str().unwrap()).expect("defaults");
    assert_eq!(settings, OverlaySettings::default());
}

#[test]
fn save_then_load_keeps_custom_values() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("overlay_settings.json");
    let path = path.to_str().unwrap();

    let settings = OverlaySettings {
        capture_settle_ms: 25,
        debug_logging: true,
        ..OverlaySettings::default()
    };
    settings.save(path).expect("save settings");

    let loaded = OverlaySettings::load(path).expect("load settings");
    assert_eq!(loaded.capture_settle_ms, 25);
    assert!(loaded.debug_logging);
    assert_eq!(loaded.width, 600);
}

#[test]
fn invalid_json_is_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ not json").unwrap();
    assert!(OverlaySettings::load(path.to_str().unwrap()).is_err());
}
