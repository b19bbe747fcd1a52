use hotspot_viewer::input::{Input, InputEvent};
use std::io::Write;
use tempfile::NamedTempFile;
use winit::keyboard::{Key, NamedKey};

#[test]
fn remapped_panel_and_close_keys_override_defaults() {
    let mut temp = NamedTempFile::new().expect("temp input config");
    write!(temp, r#"{{"bindings":{{"toggle_panel":["k"],"close_detail":["q"]}}}}"#).expect("write remap config");

    let mut input = Input::from_config(temp.path());

    assert!(!input.take_toggle_panel(), "no events yet");
    assert!(!input.take_close_detail(), "no events yet");

    input.push(InputEvent::Key { key: Key::Character("k".into()), pressed: true });
    assert!(input.take_toggle_panel(), "custom key toggles the panel");

    input.push(InputEvent::Key { key: Key::Character("p".into()), pressed: true });
    assert!(!input.take_toggle_panel(), "default key no longer fires once remapped");

    input.push(InputEvent::Key { key: Key::Character("Q".into()), pressed: true });
    assert!(input.take_close_detail(), "bindings are case-insensitive");

    input.push(InputEvent::Key { key: Key::Named(NamedKey::Escape), pressed: true });
    assert!(!input.take_close_detail(), "original binding is ignored after remapping");

    input.push(InputEvent::Key { key: Key::Character("h".into()), pressed: true });
    assert!(input.take_toggle_hotspots(), "unmapped actions keep their defaults");
}

#[test]
fn unreadable_config_keeps_default_bindings() {
    let mut temp = NamedTempFile::new().expect("temp input config");
    write!(temp, "not json").expect("write config");

    let mut input = Input::from_config(temp.path());
    input.push(InputEvent::Key { key: Key::Character("r".into()), pressed: true });
    assert!(input.take_toggle_rotation());
}
