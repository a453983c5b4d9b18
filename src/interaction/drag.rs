//! Selection and drag state machine for the viewport.
//!
//! A left click picks the nearest object (or rail waypoint when rails are
//! shown). Releasing arms a drag; pressing again and moving drags the
//! selection across the plane of the face that was clicked. Positions are
//! written back to the editor as `X`/`Y`/`Z` parameters and the proxies are
//! refreshed from what the editor then reports.
//!
//! ```text
//! MouseUp -> MouseDown -> SelectObject | MouseUp
//! SelectObject -> (release) DragWait -> (move) DragObject -> (release) DragWait
//! ```

use super::{InputEvent, InputResponse, KeyAction, MouseButton};
use crate::geometry::{ray_plane_distance, Ray};
use crate::render::{CameraMode, CameraRig, PickHit, PickKey, PickTarget, Picker};
use crate::scene::{ObjectId, ParamSet, RailSet, SceneEditor, SceneRuntime};
use glam::{Vec2, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    MouseUp,
    MouseDown,
    SelectObject,
    DragWait,
    DragObject,
}

/// Axis locks held while dragging. A lock keeps only its own component.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AxisLocks {
    pub x: bool,
    pub y: bool,
    pub z: bool,
}

impl AxisLocks {
    pub fn any(&self) -> bool {
        self.x || self.y || self.z
    }

    pub fn apply(&self, mut delta: Vec3) -> Vec3 {
        if self.x {
            delta.y = 0.0;
            delta.z = 0.0;
        }
        if self.y {
            delta.x = 0.0;
            delta.z = 0.0;
        }
        if self.z {
            delta.x = 0.0;
            delta.y = 0.0;
        }
        delta
    }
}

/// Plane the selection slides in, captured when it was grabbed.
#[derive(Debug, Clone, Copy, PartialEq)]
struct GrabPlane {
    point: Vec3,
    normal: Vec3,
    /// Added to the cursor hit so the grabbed point stays under the cursor.
    offset: Vec3,
}

impl GrabPlane {
    fn from_hit(hit: &PickHit) -> Self {
        Self {
            point: hit.plane_point,
            normal: hit.normal,
            offset: hit.grab_offset,
        }
    }

    /// Camera-facing plane through `anchor`, grabbed where `ray` crosses it.
    fn facing(anchor: Vec3, normal: Vec3, ray: &Ray) -> Option<Self> {
        let t = ray_plane_distance(ray, anchor, normal)?;
        Some(Self {
            point: anchor,
            normal,
            offset: anchor - ray.at(t),
        })
    }
}

/// Borrowed scene state an input event may touch.
pub struct InteractionContext<'a> {
    pub camera: &'a mut CameraRig,
    pub runtime: &'a mut SceneRuntime,
    pub editor: &'a mut dyn SceneEditor,
    /// Present while rails are shown; waypoints can only be picked then.
    pub rails: Option<&'a mut RailSet>,
    pub viewport: Vec2,
}

#[derive(Debug, Default)]
pub struct DragController {
    state: DragState,
    selection: Vec<ObjectId>,
    waypoint: Option<(usize, usize)>,
    grab: Option<GrabPlane>,
    cursor: Vec2,
    locks: AxisLocks,
    free_look: bool,
    key_drag: bool,
    snapshot_taken: bool,
    moved: bool,
    waypoint_start: Option<Vec3>,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    /// Selected objects; the first one is the primary selection.
    pub fn selection(&self) -> &[ObjectId] {
        &self.selection
    }

    pub fn selected_waypoint(&self) -> Option<(usize, usize)> {
        self.waypoint
    }

    pub fn axis_locks(&self) -> AxisLocks {
        self.locks
    }

    pub fn is_free_look(&self) -> bool {
        self.free_look
    }

    pub fn is_key_dragging(&self) -> bool {
        self.key_drag
    }

    /// Where the primary selection currently sits.
    pub fn anchor_position(&self, runtime: &SceneRuntime, rails: Option<&RailSet>) -> Option<Vec3> {
        if let Some((rail, waypoint)) = self.waypoint {
            return rails?.waypoint(rail, waypoint).map(|frame| frame.position());
        }
        let primary = self.selection.first()?;
        runtime.get(*primary).map(|proxy| proxy.position)
    }

    /// Replaces the selection. A non-empty selection is ready to drag.
    pub fn set_selection(&mut self, ids: &[ObjectId], runtime: &mut SceneRuntime) {
        for proxy in runtime.iter_mut() {
            proxy.selected = ids.contains(&proxy.id());
        }
        self.selection = ids
            .iter()
            .copied()
            .filter(|id| runtime.contains(*id))
            .collect();
        self.waypoint = None;
        self.state = if self.selection.is_empty() {
            DragState::MouseUp
        } else {
            DragState::DragWait
        };
    }

    pub fn clear_selection(&mut self, runtime: &mut SceneRuntime) {
        self.set_selection(&[], runtime);
    }

    /// Drops an object that left the scene.
    pub fn forget(&mut self, id: ObjectId) {
        self.selection.retain(|selected| *selected != id);
        if self.selection.is_empty() && self.waypoint.is_none() {
            self.end_drag();
            self.state = DragState::MouseUp;
        }
    }

    /// Back to the idle state with nothing selected. Free look is kept.
    pub fn reset(&mut self, runtime: &mut SceneRuntime) {
        self.clear_selection(runtime);
        self.end_drag();
        self.grab = None;
        self.state = DragState::MouseUp;
    }

    pub fn handle(&mut self, event: InputEvent, ctx: &mut InteractionContext<'_>) -> InputResponse {
        match event {
            InputEvent::MouseDown { button, position } => {
                self.cursor = position;
                match button {
                    MouseButton::Left => self.left_down(ctx),
                    MouseButton::Right => self.right_down(ctx),
                    MouseButton::Middle => InputResponse::default(),
                }
            }
            InputEvent::MouseMove {
                position,
                left_held,
            } => {
                self.cursor = position;
                self.mouse_move(left_held, ctx)
            }
            InputEvent::MouseUp { button, position } => {
                let moved = position != self.cursor;
                self.cursor = position;
                self.mouse_up(button, moved, ctx)
            }
            InputEvent::Wheel { delta } => {
                ctx.camera.zoom(delta);
                InputResponse::redraw()
            }
            InputEvent::LookDelta(delta) => {
                if !self.free_look {
                    return InputResponse::default();
                }
                ctx.camera.mouse_look(delta);
                InputResponse {
                    redraw: true,
                    center_cursor: true,
                    ..InputResponse::default()
                }
            }
            InputEvent::Key { action, pressed } => self.key(action, pressed, ctx),
        }
    }

    fn left_down(&mut self, ctx: &mut InteractionContext<'_>) -> InputResponse {
        if !matches!(self.state, DragState::MouseUp | DragState::DragWait) {
            return InputResponse::default();
        }
        if self.key_drag {
            self.key_drag = false;
            self.commit(ctx);
            return InputResponse::redraw();
        }

        let previous = self.state;
        self.state = DragState::MouseDown;

        let ray = ctx.camera.ray(self.cursor, ctx.viewport);
        let mut targets = ctx.runtime.pick_targets();
        if let Some(rails) = ctx.rails.as_deref() {
            targets.extend(waypoint_targets(rails));
        }

        let Some(hit) = Picker::pick(&ray, &targets) else {
            self.clear_selection(ctx.runtime);
            self.grab = None;
            self.state = DragState::MouseUp;
            return InputResponse::redraw();
        };

        self.grab = Some(GrabPlane::from_hit(&hit));
        match hit.key {
            PickKey::Object(id) if self.waypoint.is_none() && self.selection.first() == Some(&id) => {
                self.state = previous;
            }
            PickKey::Object(id) => {
                self.set_selection(&[id], ctx.runtime);
                ctx.editor.go_to_object(id);
                self.state = DragState::SelectObject;
                log::debug!("selected {id}");
            }
            PickKey::RailWaypoint { rail, waypoint } if self.waypoint == Some((rail, waypoint)) => {
                self.state = previous;
            }
            PickKey::RailWaypoint { rail, waypoint } => {
                self.clear_selection(ctx.runtime);
                self.waypoint = Some((rail, waypoint));
                ctx.editor.refresh_rail_panel(rail, waypoint);
                self.state = DragState::SelectObject;
                log::debug!("selected waypoint {waypoint} of rail {rail}");
            }
        }
        InputResponse::redraw()
    }

    fn right_down(&mut self, ctx: &mut InteractionContext<'_>) -> InputResponse {
        if self.key_drag {
            self.cancel(ctx);
            return InputResponse::redraw();
        }
        if self.state == DragState::DragObject || ctx.camera.mode() == CameraMode::ScriptedFlight {
            return InputResponse::default();
        }
        self.free_look = true;
        ctx.camera.begin_free_look();
        InputResponse {
            hide_cursor: true,
            center_cursor: true,
            ..InputResponse::default()
        }
    }

    fn mouse_move(&mut self, left_held: bool, ctx: &mut InteractionContext<'_>) -> InputResponse {
        if self.free_look {
            return InputResponse::default();
        }
        if self.key_drag {
            return self.drag_to_cursor(ctx);
        }
        if left_held && matches!(self.state, DragState::DragWait | DragState::DragObject) {
            self.state = DragState::DragObject;
            return self.drag_to_cursor(ctx);
        }
        InputResponse::default()
    }

    fn mouse_up(&mut self, button: MouseButton, moved: bool, ctx: &mut InteractionContext<'_>) -> InputResponse {
        match button {
            MouseButton::Right if self.free_look => {
                self.free_look = false;
                ctx.camera.end_free_look();
                InputResponse {
                    show_cursor: true,
                    ..InputResponse::default()
                }
            }
            MouseButton::Left if !self.key_drag => {
                let mut response = InputResponse::default();
                if moved && self.state == DragState::DragObject {
                    response = self.drag_to_cursor(ctx);
                }
                self.commit(ctx);
                if matches!(self.state, DragState::SelectObject | DragState::DragObject) {
                    self.state = DragState::DragWait;
                }
                response
            }
            _ => InputResponse::default(),
        }
    }

    fn key(&mut self, action: KeyAction, pressed: bool, ctx: &mut InteractionContext<'_>) -> InputResponse {
        match action {
            KeyAction::MoveForward
            | KeyAction::MoveBackward
            | KeyAction::MoveLeft
            | KeyAction::MoveRight
            | KeyAction::MoveUp
            | KeyAction::MoveDown => {
                let held = pressed && self.free_look;
                let movement = ctx.camera.movement_mut();
                match action {
                    KeyAction::MoveForward => movement.move_forward = held,
                    KeyAction::MoveBackward => movement.move_backward = held,
                    KeyAction::MoveLeft => movement.move_left = held,
                    KeyAction::MoveRight => movement.move_right = held,
                    KeyAction::MoveUp => movement.move_up = held,
                    _ => movement.move_down = held,
                }
            }
            KeyAction::LockX | KeyAction::LockY | KeyAction::LockZ => {
                let locked = pressed && !self.free_look;
                match action {
                    KeyAction::LockX => self.locks.x = locked,
                    KeyAction::LockY => self.locks.y = locked,
                    _ => self.locks.z = locked,
                }
                return InputResponse::redraw();
            }
            _ if !pressed => {}
            KeyAction::Cancel => {
                if self.key_drag {
                    self.cancel(ctx);
                    return InputResponse::redraw();
                }
                if self.state == DragState::DragObject {
                    self.cancel(ctx);
                    self.state = DragState::MouseUp;
                    return InputResponse::redraw();
                }
            }
            KeyAction::StartKeyDrag => {
                let has_selection = !self.selection.is_empty() || self.waypoint.is_some();
                if has_selection && !self.free_look && !self.key_drag {
                    self.key_drag = true;
                    self.grab = None;
                }
            }
            KeyAction::FrontView => {
                ctx.camera.front_view();
                return InputResponse::redraw();
            }
            KeyAction::RightView => {
                ctx.camera.right_view();
                return InputResponse::redraw();
            }
            KeyAction::TopView => {
                ctx.camera.top_view();
                return InputResponse::redraw();
            }
            KeyAction::ToggleOrthographic => {
                ctx.camera.toggle_orthographic();
                return InputResponse::redraw();
            }
            KeyAction::StartFlight | KeyAction::ToggleRails => {}
        }
        InputResponse::default()
    }

    /// Moves the selection so the grabbed point follows the cursor.
    fn drag_to_cursor(&mut self, ctx: &mut InteractionContext<'_>) -> InputResponse {
        let Some(anchor) = self.anchor(ctx) else {
            return InputResponse::default();
        };
        let ray = ctx.camera.ray(self.cursor, ctx.viewport);
        let (forward, _, _) = ctx.camera.basis();

        let target = if ctx.camera.state().orthographic {
            // Slide in the camera plane through the selection, no grab offset.
            let Some(t) = ray_plane_distance(&ray, anchor, forward) else {
                return InputResponse::default();
            };
            ray.at(t)
        } else {
            let grab = match self.grab {
                Some(grab) => grab,
                None => {
                    let Some(grab) = GrabPlane::facing(anchor, -forward, &ray) else {
                        return InputResponse::default();
                    };
                    self.grab = Some(grab);
                    grab
                }
            };
            match ray_plane_distance(&ray, grab.point, grab.normal) {
                Some(t) if t > 0.0 => ray.at(t) + grab.offset,
                _ => return InputResponse::default(),
            }
        };

        self.begin_move(anchor, ctx);
        let delta = self.locks.apply(target - anchor);
        self.translate_selection(delta, ctx);
        self.moved = true;
        InputResponse::redraw()
    }

    /// Position of the primary selection as the editor or rail stores it.
    fn anchor(&self, ctx: &InteractionContext<'_>) -> Option<Vec3> {
        if let Some((rail, waypoint)) = self.waypoint {
            let rails = ctx.rails.as_deref()?;
            return rails.waypoint(rail, waypoint).map(|frame| frame.position());
        }
        let primary = self.selection.first()?;
        ctx.editor
            .read_parameters(*primary)
            .map(|params| stored_position(&params))
    }

    fn begin_move(&mut self, anchor: Vec3, ctx: &mut InteractionContext<'_>) {
        if self.snapshot_taken {
            return;
        }
        self.snapshot_taken = true;
        log::debug!("drag started at {anchor}");
        // Rails are not part of the editor's document, so its undo cannot restore them.
        if self.waypoint.is_some() {
            self.waypoint_start = Some(anchor);
        } else {
            ctx.editor.create_undo_snapshot();
        }
    }

    fn translate_selection(&mut self, delta: Vec3, ctx: &mut InteractionContext<'_>) {
        if let Some((rail, waypoint)) = self.waypoint {
            if let Some(frame) = ctx
                .rails
                .as_deref_mut()
                .and_then(|rails| rails.waypoint_mut(rail, waypoint))
            {
                frame.set_position(frame.position() + delta);
                ctx.editor.refresh_rail_panel(rail, waypoint);
            }
            return;
        }
        for &id in &self.selection {
            let Some(params) = ctx.editor.read_parameters(id) else {
                continue;
            };
            let position = stored_position(&params) + delta;
            ctx.editor.set_value(id, "X", &format!("{}", position.x));
            ctx.editor.set_value(id, "Y", &format!("{}", position.y));
            ctx.editor.set_value(id, "Z", &format!("{}", position.z));
            refresh_proxy(id, ctx);
        }
    }

    /// Ends a move, keeping its result.
    fn commit(&mut self, ctx: &mut InteractionContext<'_>) {
        if self.moved {
            if let Some((rail, waypoint)) = self.waypoint {
                ctx.editor.refresh_rail_panel(rail, waypoint);
            } else if let Some(&primary) = self.selection.first() {
                ctx.editor.mark_changed();
                ctx.editor.update_object_info(primary);
            }
        }
        self.end_drag();
    }

    /// Ends a move, putting everything back where it started.
    fn cancel(&mut self, ctx: &mut InteractionContext<'_>) {
        if self.snapshot_taken {
            match (self.waypoint, self.waypoint_start) {
                // Waypoints are put back from the saved start, not through undo.
                (Some((rail, waypoint)), Some(start)) => {
                    if let Some(frame) = ctx
                        .rails
                        .as_deref_mut()
                        .and_then(|rails| rails.waypoint_mut(rail, waypoint))
                    {
                        frame.set_position(start);
                    }
                    ctx.editor.refresh_rail_panel(rail, waypoint);
                }
                _ => {
                    if ctx.editor.undo() {
                        for &id in &self.selection {
                            refresh_proxy(id, ctx);
                        }
                    } else {
                        log::warn!("drag cancelled but the editor had nothing to undo");
                    }
                }
            }
        }
        self.end_drag();
    }

    fn end_drag(&mut self) {
        self.key_drag = false;
        self.snapshot_taken = false;
        self.moved = false;
        self.waypoint_start = None;
    }
}

fn waypoint_targets(rails: &RailSet) -> impl Iterator<Item = PickTarget> + '_ {
    rails
        .all_rails()
        .iter()
        .enumerate()
        .flat_map(|(rail_index, rail)| {
            rail.waypoints
                .iter()
                .enumerate()
                .map(move |(index, frame)| PickTarget::waypoint(rail_index, index, frame))
        })
}

fn stored_position(params: &ParamSet) -> Vec3 {
    Vec3::new(params.get_f32("X"), params.get_f32("Y"), params.get_f32("Z"))
}

fn refresh_proxy(id: ObjectId, ctx: &mut InteractionContext<'_>) {
    let Some(params) = ctx.editor.read_parameters(id) else {
        return;
    };
    if let Some(proxy) = ctx.runtime.get_mut(id) {
        proxy.update(&params);
    }
}
