use stagepreview::config::KeyBindings;
use stagepreview::interaction::{KeyAction, MouseButton};
use std::collections::HashMap;
use winit::event::MouseScrollDelta;
use winit::keyboard::{KeyCode, PhysicalKey};

/// Wheel units per notch.
const WHEEL_NOTCH: f32 = 120.0;

/// Keys that can be bound by name.
const BINDABLE_KEYS: &[KeyCode] = &[
    KeyCode::KeyA,
    KeyCode::KeyB,
    KeyCode::KeyC,
    KeyCode::KeyD,
    KeyCode::KeyE,
    KeyCode::KeyF,
    KeyCode::KeyG,
    KeyCode::KeyH,
    KeyCode::KeyI,
    KeyCode::KeyJ,
    KeyCode::KeyK,
    KeyCode::KeyL,
    KeyCode::KeyM,
    KeyCode::KeyN,
    KeyCode::KeyO,
    KeyCode::KeyP,
    KeyCode::KeyQ,
    KeyCode::KeyR,
    KeyCode::KeyS,
    KeyCode::KeyT,
    KeyCode::KeyU,
    KeyCode::KeyV,
    KeyCode::KeyW,
    KeyCode::KeyX,
    KeyCode::KeyY,
    KeyCode::KeyZ,
    KeyCode::Digit0,
    KeyCode::Digit1,
    KeyCode::Digit2,
    KeyCode::Digit3,
    KeyCode::Digit4,
    KeyCode::Digit5,
    KeyCode::Digit6,
    KeyCode::Digit7,
    KeyCode::Digit8,
    KeyCode::Digit9,
    KeyCode::Numpad0,
    KeyCode::Numpad1,
    KeyCode::Numpad2,
    KeyCode::Numpad3,
    KeyCode::Numpad4,
    KeyCode::Numpad5,
    KeyCode::Numpad6,
    KeyCode::Numpad7,
    KeyCode::Numpad8,
    KeyCode::Numpad9,
    KeyCode::Escape,
    KeyCode::Space,
    KeyCode::Tab,
    KeyCode::Enter,
    KeyCode::Backspace,
    KeyCode::Delete,
    KeyCode::ShiftLeft,
    KeyCode::ShiftRight,
    KeyCode::ControlLeft,
    KeyCode::ControlRight,
    KeyCode::AltLeft,
    KeyCode::AltRight,
    KeyCode::ArrowUp,
    KeyCode::ArrowDown,
    KeyCode::ArrowLeft,
    KeyCode::ArrowRight,
    KeyCode::PageUp,
    KeyCode::PageDown,
    KeyCode::Home,
    KeyCode::End,
    KeyCode::F1,
    KeyCode::F2,
    KeyCode::F3,
    KeyCode::F4,
    KeyCode::F5,
    KeyCode::F6,
    KeyCode::F7,
    KeyCode::F8,
    KeyCode::F9,
    KeyCode::F10,
    KeyCode::F11,
    KeyCode::F12,
];

/// Looks up a key by its `KeyCode` variant name, e.g. `"KeyW"`.
pub fn parse_key_code(name: &str) -> Option<KeyCode> {
    BINDABLE_KEYS
        .iter()
        .copied()
        .find(|code| format!("{code:?}") == name)
}

/// Physical key to action table built from the key bindings.
#[derive(Debug, Default)]
pub struct KeyMap {
    actions: HashMap<KeyCode, KeyAction>,
}

impl KeyMap {
    pub fn from_bindings(keys: &KeyBindings) -> Self {
        let bindings = [
            (&keys.move_forward, KeyAction::MoveForward),
            (&keys.move_backward, KeyAction::MoveBackward),
            (&keys.move_left, KeyAction::MoveLeft),
            (&keys.move_right, KeyAction::MoveRight),
            (&keys.move_up, KeyAction::MoveUp),
            (&keys.move_down, KeyAction::MoveDown),
            (&keys.lock_x, KeyAction::LockX),
            (&keys.lock_y, KeyAction::LockY),
            (&keys.lock_z, KeyAction::LockZ),
            (&keys.cancel, KeyAction::Cancel),
            (&keys.start_drag, KeyAction::StartKeyDrag),
            (&keys.front_view, KeyAction::FrontView),
            (&keys.right_view, KeyAction::RightView),
            (&keys.top_view, KeyAction::TopView),
            (&keys.toggle_orthographic, KeyAction::ToggleOrthographic),
            (&keys.start_flight, KeyAction::StartFlight),
            (&keys.toggle_rails, KeyAction::ToggleRails),
        ];

        let mut actions = HashMap::new();
        for (name, action) in bindings {
            let Some(code) = parse_key_code(name) else {
                log::warn!("unknown key {name:?} bound to {action:?}; binding ignored");
                continue;
            };
            if let Some(previous) = actions.insert(code, action) {
                log::warn!("{name} bound to both {previous:?} and {action:?}; keeping {action:?}");
            }
        }
        Self { actions }
    }

    pub fn action(&self, key: PhysicalKey) -> Option<KeyAction> {
        match key {
            PhysicalKey::Code(code) => self.actions.get(&code).copied(),
            PhysicalKey::Unidentified(_) => None,
        }
    }
}

pub fn map_mouse_button(button: winit::event::MouseButton) -> Option<MouseButton> {
    match button {
        winit::event::MouseButton::Left => Some(MouseButton::Left),
        winit::event::MouseButton::Right => Some(MouseButton::Right),
        winit::event::MouseButton::Middle => Some(MouseButton::Middle),
        _ => None,
    }
}

/// Converts a scroll to wheel units, positive away from the user.
pub fn wheel_delta(delta: MouseScrollDelta) -> i32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => (y * WHEEL_NOTCH).round() as i32,
        MouseScrollDelta::PixelDelta(position) => position.y.round() as i32,
    }
}
