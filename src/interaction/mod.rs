//! Viewport input: events coming from the window and the responses the
//! window has to act on.

pub mod drag;
pub mod ticker;

pub use drag::{AxisLocks, DragController, DragState, InteractionContext};
pub use ticker::FixedStep;

use glam::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Bound keys, already resolved from the key bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAction {
    MoveForward,
    MoveBackward,
    MoveLeft,
    MoveRight,
    MoveUp,
    MoveDown,
    LockX,
    LockY,
    LockZ,
    Cancel,
    StartKeyDrag,
    FrontView,
    RightView,
    TopView,
    ToggleOrthographic,
    StartFlight,
    ToggleRails,
}

/// Positions are window pixels with the origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    MouseDown { button: MouseButton, position: Vec2 },
    MouseMove { position: Vec2, left_held: bool },
    MouseUp { button: MouseButton, position: Vec2 },
    /// 120 per wheel notch, positive away from the user.
    Wheel { delta: i32 },
    /// Raw pointer motion in pixels, used while looking around.
    LookDelta(Vec2),
    Key { action: KeyAction, pressed: bool },
}

/// What the window should do after an event was handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputResponse {
    pub redraw: bool,
    pub hide_cursor: bool,
    pub show_cursor: bool,
    pub center_cursor: bool,
}

impl InputResponse {
    pub fn redraw() -> Self {
        Self {
            redraw: true,
            ..Self::default()
        }
    }

    pub fn merge(self, other: Self) -> Self {
        Self {
            redraw: self.redraw || other.redraw,
            hide_cursor: self.hide_cursor || other.hide_cursor,
            show_cursor: self.show_cursor || other.show_cursor,
            center_cursor: self.center_cursor || other.center_cursor,
        }
    }
}
