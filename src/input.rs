use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{Key, NamedKey};

pub struct Input {
    bindings: InputBindings,
    wheel: f32,
    toggle_panel_pressed: bool,
    toggle_rotation_pressed: bool,
    toggle_hotspots_pressed: bool,
    close_detail_pressed: bool,
    cursor_pos: Option<(f32, f32)>,
    drag_delta: (f32, f32),
    left_pressed: bool,
    left_clicked: bool,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(path: impl AsRef<Path>) -> Self {
        let bindings = InputBindings::load_or_default(path);
        Self::with_bindings(bindings)
    }

    fn with_bindings(bindings: InputBindings) -> Self {
        Self {
            bindings,
            wheel: 0.0,
            toggle_panel_pressed: false,
            toggle_rotation_pressed: false,
            toggle_hotspots_pressed: false,
            close_detail_pressed: false,
            cursor_pos: None,
            drag_delta: (0.0, 0.0),
            left_pressed: false,
            left_clicked: false,
        }
    }

    pub fn push(&mut self, ev: InputEvent) {
        match ev {
            InputEvent::Key { key, pressed } => {
                self.apply_key_binding(&key, pressed);
            }
            InputEvent::Wheel { delta } => {
                self.wheel += delta;
            }
            InputEvent::MouseButton { button: MouseButton::Left, pressed } => {
                if pressed {
                    self.left_clicked = true;
                    self.left_pressed = true;
                } else {
                    self.left_pressed = false;
                }
            }
            InputEvent::MouseButton { .. } => {}
            InputEvent::CursorPos { x, y } => {
                if let (true, Some((px, py))) = (self.left_pressed, self.cursor_pos) {
                    self.drag_delta.0 += x - px;
                    self.drag_delta.1 += y - py;
                }
                self.cursor_pos = Some((x, y));
            }
            InputEvent::CursorLeft => {
                self.cursor_pos = None;
                self.left_pressed = false;
            }
            InputEvent::Other => {}
        }
    }

    pub fn clear_frame(&mut self) {
        self.drag_delta = (0.0, 0.0);
        self.wheel = 0.0;
        self.left_clicked = false;
    }

    pub fn consume_wheel_delta(&mut self) -> Option<f32> {
        if self.wheel.abs() > 0.0 {
            let d = self.wheel;
            self.wheel = 0.0;
            Some(d)
        } else {
            None
        }
    }

    /// Cursor travel in pixels while the left button was held, since the last call.
    pub fn take_drag_delta(&mut self) -> (f32, f32) {
        std::mem::take(&mut self.drag_delta)
    }

    pub fn take_toggle_panel(&mut self) -> bool {
        std::mem::take(&mut self.toggle_panel_pressed)
    }

    pub fn take_toggle_rotation(&mut self) -> bool {
        std::mem::take(&mut self.toggle_rotation_pressed)
    }

    pub fn take_toggle_hotspots(&mut self) -> bool {
        std::mem::take(&mut self.toggle_hotspots_pressed)
    }

    pub fn take_close_detail(&mut self) -> bool {
        std::mem::take(&mut self.close_detail_pressed)
    }

    pub fn take_left_click(&mut self) -> bool {
        std::mem::take(&mut self.left_clicked)
    }

    pub fn left_held(&self) -> bool {
        self.left_pressed
    }

    pub fn cursor_position(&self) -> Option<(f32, f32)> {
        self.cursor_pos
    }

    fn apply_key_binding(&mut self, key: &Key, pressed: bool) {
        if !pressed {
            return;
        }
        if let Some(binding_key) = InputKeyBinding::from_event_key(key) {
            let actions: Vec<_> = self.bindings.actions_for_key(&binding_key).collect();
            for action in actions {
                self.trigger_action(action);
            }
        }
    }

    fn trigger_action(&mut self, action: InputAction) {
        match action {
            InputAction::TogglePanel => self.toggle_panel_pressed = true,
            InputAction::ToggleAutoRotate => self.toggle_rotation_pressed = true,
            InputAction::ToggleHotspots => self.toggle_hotspots_pressed = true,
            InputAction::CloseDetail => self.close_detail_pressed = true,
        }
    }
}

impl Default for Input {
    fn default() -> Self {
        Self::with_bindings(InputBindings::default())
    }
}

#[derive(Debug, Clone)]
struct InputBindings {
    key_to_actions: HashMap<InputKeyBinding, Vec<InputAction>>,
}

impl InputBindings {
    fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<InputConfigFile>(&contents) {
                Ok(config) => Self::from_config(config, &path.display().to_string()),
                Err(err) => {
                    log::warn!(
                        "[input] Failed to parse {}: {err}. Falling back to default bindings.",
                        path.display()
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!("[input] Failed to read {}: {err}. Falling back to default bindings.", path.display());
                Self::default()
            }
        }
    }

    fn from_config(config: InputConfigFile, origin: &str) -> Self {
        let overrides = config.into_overrides(origin);
        let mut action_map = Self::default_action_map();
        for (action, keys) in overrides {
            action_map.insert(action, keys);
        }
        Self::from_action_map(action_map)
    }

    fn default_action_map() -> HashMap<InputAction, Vec<InputKeyBinding>> {
        use InputAction::*;
        let mut map = HashMap::new();
        map.insert(TogglePanel, vec![InputKeyBinding::character("p")]);
        map.insert(ToggleAutoRotate, vec![InputKeyBinding::character("r")]);
        map.insert(ToggleHotspots, vec![InputKeyBinding::character("h")]);
        map.insert(CloseDetail, vec![InputKeyBinding::named(NamedKeyCode::Escape)]);
        map
    }

    fn from_action_map(action_map: HashMap<InputAction, Vec<InputKeyBinding>>) -> Self {
        let mut key_to_actions: HashMap<InputKeyBinding, Vec<InputAction>> = HashMap::new();
        for (action, keys) in action_map {
            for key in keys {
                key_to_actions.entry(key).or_default().push(action);
            }
        }
        Self { key_to_actions }
    }

    fn actions_for_key(&self, key: &InputKeyBinding) -> impl Iterator<Item = InputAction> + '_ {
        self.key_to_actions.get(key).into_iter().flatten().copied()
    }
}

impl Default for InputBindings {
    fn default() -> Self {
        Self::from_action_map(Self::default_action_map())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum InputKeyBinding {
    Character(String),
    Named(NamedKeyCode),
}

impl InputKeyBinding {
    fn character(ch: &str) -> Self {
        Self::Character(ch.to_lowercase())
    }

    fn named(named: NamedKeyCode) -> Self {
        Self::Named(named)
    }

    fn from_event_key(key: &Key) -> Option<Self> {
        match key {
            Key::Character(ch) if !ch.is_empty() => Some(Self::Character(ch.to_lowercase())),
            Key::Named(named) => NamedKeyCode::from_named_key(named).map(Self::Named),
            _ => None,
        }
    }

    fn from_config_value(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_lowercase();
        if normalized.is_empty() {
            return None;
        }
        if let Some(named) = NamedKeyCode::from_str(&normalized) {
            return Some(Self::Named(named));
        }
        (normalized.chars().count() == 1).then_some(Self::Character(normalized))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum NamedKeyCode {
    Escape,
    Space,
    Tab,
    Enter,
}

impl NamedKeyCode {
    fn from_named_key(key: &NamedKey) -> Option<Self> {
        match key {
            NamedKey::Escape => Some(Self::Escape),
            NamedKey::Space => Some(Self::Space),
            NamedKey::Tab => Some(Self::Tab),
            NamedKey::Enter => Some(Self::Enter),
            _ => None,
        }
    }

    fn from_str(value: &str) -> Option<Self> {
        match value {
            "escape" | "esc" => Some(Self::Escape),
            "space" => Some(Self::Space),
            "tab" => Some(Self::Tab),
            "enter" | "return" => Some(Self::Enter),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum InputAction {
    TogglePanel,
    ToggleAutoRotate,
    ToggleHotspots,
    CloseDetail,
}

impl InputAction {
    fn from_str(value: &str) -> Option<Self> {
        match value {
            "toggle_panel" => Some(Self::TogglePanel),
            "toggle_auto_rotate" => Some(Self::ToggleAutoRotate),
            "toggle_hotspots" => Some(Self::ToggleHotspots),
            "close_detail" => Some(Self::CloseDetail),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct InputConfigFile {
    #[serde(default)]
    bindings: HashMap<String, Vec<String>>,
}

impl InputConfigFile {
    fn into_overrides(self, origin: &str) -> HashMap<InputAction, Vec<InputKeyBinding>> {
        let mut overrides = HashMap::new();
        for (action_name, keys) in self.bindings {
            let Some(action) = InputAction::from_str(&action_name.trim().to_lowercase()) else {
                log::warn!("[input] {origin}: unknown action '{action_name}', ignoring.");
                continue;
            };
            let mut parsed = Vec::new();
            for key in keys {
                match InputKeyBinding::from_config_value(&key) {
                    Some(binding) => parsed.push(binding),
                    None => log::warn!("[input] {origin}: unknown key '{key}' for action '{action_name}', ignoring."),
                }
            }
            if parsed.is_empty() {
                log::warn!("[input] {origin}: action '{action_name}' has no valid keys, keeping defaults.");
                continue;
            }
            overrides.insert(action, parsed);
        }
        overrides
    }
}

pub enum InputEvent {
    Key { key: Key, pressed: bool },
    Wheel { delta: f32 },
    MouseButton { button: MouseButton, pressed: bool },
    CursorPos { x: f32, y: f32 },
    CursorLeft,
    Other,
}

impl InputEvent {
    pub fn from_window_event(ev: &WindowEvent) -> Self {
        match ev {
            WindowEvent::MouseWheel { delta, .. } => {
                let d = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    // roughly one notch per 40 logical pixels of trackpad travel
                    MouseScrollDelta::PixelDelta(p) => p.y as f32 / 40.0,
                };
                InputEvent::Wheel { delta: d }
            }
            WindowEvent::CursorMoved { position, .. } => {
                InputEvent::CursorPos { x: position.x as f32, y: position.y as f32 }
            }
            WindowEvent::CursorLeft { .. } => InputEvent::CursorLeft,
            WindowEvent::MouseInput { state, button, .. } => {
                InputEvent::MouseButton { button: *button, pressed: *state == ElementState::Pressed }
            }
            WindowEvent::KeyboardInput { event, .. } => InputEvent::Key {
                key: event.logical_key.clone(),
                pressed: event.state == ElementState::Pressed,
            },
            _ => InputEvent::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drag_delta_accumulates_only_while_left_is_held() {
        let mut input = Input::new();
        input.push(InputEvent::CursorPos { x: 10.0, y: 10.0 });
        input.push(InputEvent::CursorPos { x: 20.0, y: 10.0 });
        assert_eq!(input.take_drag_delta(), (0.0, 0.0));

        input.push(InputEvent::MouseButton { button: MouseButton::Left, pressed: true });
        input.push(InputEvent::CursorPos { x: 25.0, y: 13.0 });
        input.push(InputEvent::CursorPos { x: 30.0, y: 12.0 });
        assert_eq!(input.take_drag_delta(), (10.0, 2.0));
        assert!(input.take_left_click());
        assert!(!input.take_left_click());
    }

    #[test]
    fn key_releases_do_not_trigger_actions() {
        let mut input = Input::new();
        input.push(InputEvent::Key { key: Key::Named(NamedKey::Escape), pressed: false });
        assert!(!input.take_close_detail());
        input.push(InputEvent::Key { key: Key::Named(NamedKey::Escape), pressed: true });
        assert!(input.take_close_detail());
    }

    #[test]
    fn clear_frame_drops_per_frame_state_but_keeps_the_pointer() {
        let mut input = Input::new();
        input.push(InputEvent::CursorPos { x: 5.0, y: 5.0 });
        input.push(InputEvent::MouseButton { button: MouseButton::Left, pressed: true });
        input.push(InputEvent::CursorPos { x: 9.0, y: 5.0 });
        input.push(InputEvent::Wheel { delta: 1.5 });
        input.push(InputEvent::Other);

        input.clear_frame();
        assert_eq!(input.consume_wheel_delta(), None);
        assert_eq!(input.take_drag_delta(), (0.0, 0.0));
        assert!(!input.take_left_click());
        assert!(input.left_held());
        assert_eq!(input.cursor_position(), Some((9.0, 5.0)));

        input.push(InputEvent::CursorLeft);
        assert!(!input.left_held());
        assert_eq!(input.cursor_position(), None);
    }
}
