use crate::geometry::{screen_to_ray, Ray, ViewFrame};
use glam::{Mat4, Quat, Vec2, Vec3};
use std::f32::consts::{FRAC_PI_2, PI};

pub const DEFAULT_FOV_DEG: f32 = 70.0;
pub const NEAR_PLANE: f32 = 100.0;
pub const FAR_PLANE: f32 = 10_000_000.0;
pub const MIN_ORTHO_ZOOM: f32 = 0.025;
pub const PITCH_LIMIT: f32 = FRAC_PI_2 - 0.001;
/// Distance of the preset views from the origin.
pub const PRESET_DISTANCE: f32 = 10_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CameraMode {
    #[default]
    Idle,
    FreeLook,
    ScriptedFlight,
}

/// Movement keys currently held.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CameraMovement {
    pub move_forward: bool,
    pub move_backward: bool,
    pub move_left: bool,
    pub move_right: bool,
    pub move_up: bool,
    pub move_down: bool,
}

impl CameraMovement {
    fn axes(&self) -> (f32, f32, f32) {
        let axis = |positive: bool, negative: bool| match (positive, negative) {
            (true, false) => 1.0,
            (false, true) => -1.0,
            _ => 0.0,
        };
        (
            axis(self.move_forward, self.move_backward),
            axis(self.move_right, self.move_left),
            axis(self.move_up, self.move_down),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    /// Radians about the view direction. Only scripted flights set it.
    pub roll: f32,
    pub fov_deg: f32,
    /// World units per pixel in orthographic mode.
    pub ortho_zoom: f32,
    pub orthographic: bool,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            yaw: 0.0,
            pitch: 0.0,
            roll: 0.0,
            fov_deg: DEFAULT_FOV_DEG,
            ortho_zoom: 10.0,
            orthographic: false,
        }
    }
}

/// Tuning values taken from the preview settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraTuning {
    /// Units moved per free-look tick.
    pub move_speed: f32,
    /// Forward movement follows pitch instead of staying horizontal.
    pub move_along_pitch: bool,
    /// Radians per pixel of mouse movement.
    pub look_sensitivity: f32,
    /// Units moved per wheel unit in perspective mode.
    pub dolly_scale: f32,
}

impl Default for CameraTuning {
    fn default() -> Self {
        Self {
            move_speed: 100.0,
            move_along_pitch: true,
            look_sensitivity: 0.01,
            dolly_scale: 10_000.0 / 4_800.0,
        }
    }
}

pub struct CameraRig {
    state: CameraState,
    mode: CameraMode,
    movement: CameraMovement,
    velocity: Vec3,
    tuning: CameraTuning,
}

impl CameraRig {
    pub fn new(tuning: CameraTuning) -> Self {
        Self {
            state: CameraState::default(),
            mode: CameraMode::Idle,
            movement: CameraMovement::default(),
            velocity: Vec3::ZERO,
            tuning,
        }
    }

    pub fn state(&self) -> &CameraState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut CameraState {
        &mut self.state
    }

    pub fn mode(&self) -> CameraMode {
        self.mode
    }

    pub fn tuning(&self) -> &CameraTuning {
        &self.tuning
    }

    pub fn set_tuning(&mut self, tuning: CameraTuning) {
        self.tuning = tuning;
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    pub fn movement(&self) -> &CameraMovement {
        &self.movement
    }

    pub fn movement_mut(&mut self) -> &mut CameraMovement {
        &mut self.movement
    }

    /// (forward, right, up).
    pub fn basis(&self) -> (Vec3, Vec3, Vec3) {
        let (forward, right, up) = camera_basis(self.state.yaw, self.state.pitch);
        if self.state.roll == 0.0 {
            return (forward, right, up);
        }
        let roll = Quat::from_axis_angle(forward, self.state.roll);
        (forward, roll * right, roll * up)
    }

    pub fn view_matrix(&self) -> Mat4 {
        let (forward, _, up) = self.basis();
        let eye = self.state.position;
        Mat4::look_at_rh(eye, eye + forward, up)
    }

    pub fn projection_matrix(&self, viewport: Vec2) -> Mat4 {
        let width = viewport.x.max(1.0);
        let height = viewport.y.max(1.0);
        if self.state.orthographic {
            let half_width = width * 0.5 * self.state.ortho_zoom;
            let half_height = height * 0.5 * self.state.ortho_zoom;
            Mat4::orthographic_rh_gl(
                -half_width,
                half_width,
                -half_height,
                half_height,
                -FAR_PLANE,
                FAR_PLANE,
            )
        } else {
            let fov = self.state.fov_deg.clamp(1.0, 179.0).to_radians();
            Mat4::perspective_rh_gl(fov, width / height, NEAR_PLANE, FAR_PLANE)
        }
    }

    pub fn view_frame(&self) -> ViewFrame {
        let (forward, right, up) = self.basis();
        ViewFrame {
            position: self.state.position,
            forward,
            right,
            up,
            ortho_zoom: self.state.orthographic.then_some(self.state.ortho_zoom),
        }
    }

    /// Ray through a window pixel.
    pub fn ray(&self, screen: Vec2, viewport: Vec2) -> Ray {
        screen_to_ray(
            screen,
            viewport,
            &self.projection_matrix(viewport),
            &self.view_matrix(),
            &self.view_frame(),
        )
    }

    pub fn begin_free_look(&mut self) {
        self.mode = CameraMode::FreeLook;
        self.velocity = Vec3::ZERO;
    }

    pub fn end_free_look(&mut self) {
        if self.mode == CameraMode::FreeLook {
            self.mode = CameraMode::Idle;
        }
        self.movement = CameraMovement::default();
        self.velocity = Vec3::ZERO;
    }

    /// Turns the camera by a mouse delta in pixels.
    pub fn mouse_look(&mut self, delta: Vec2) {
        self.state.yaw += delta.x * self.tuning.look_sensitivity;
        self.state.pitch -= delta.y * self.tuning.look_sensitivity;
        self.state.pitch = self.state.pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.state.yaw = wrap_angle(self.state.yaw);
    }

    /// One free-look integration step. Returns whether the camera moved.
    pub fn tick_free_look(&mut self) -> bool {
        let (forward_amount, right_amount, up_amount) = self.movement.axes();
        if forward_amount == 0.0 && right_amount == 0.0 && up_amount == 0.0 {
            self.velocity = Vec3::ZERO;
            return false;
        }

        let (forward, right) = if self.state.orthographic {
            // Snap to the nearest quarter turn so panning follows the screen axes.
            let yaw = (self.state.yaw / FRAC_PI_2).round() * FRAC_PI_2;
            let (forward, right, _) = camera_basis(yaw, 0.0);
            (forward, right)
        } else if self.tuning.move_along_pitch {
            let (forward, right, _) = self.basis();
            (forward, right)
        } else {
            let (forward, right, _) = camera_basis(self.state.yaw, 0.0);
            (forward, right)
        };

        let direction = forward * forward_amount + right * right_amount + Vec3::Y * up_amount;
        self.velocity = direction * self.tuning.move_speed;
        self.state.position += self.velocity;
        true
    }

    /// Applies a wheel delta (120 per notch).
    pub fn zoom(&mut self, wheel: i32) {
        if self.state.orthographic {
            let steps = -(wheel / 100);
            self.state.ortho_zoom =
                (self.state.ortho_zoom * 1.1f32.powi(steps)).max(MIN_ORTHO_ZOOM);
        } else {
            let (forward, _, _) = self.basis();
            self.state.position += forward * (wheel as f32 * self.tuning.dolly_scale);
        }
    }

    pub fn front_view(&mut self) {
        self.state.yaw = FRAC_PI_2;
        self.state.pitch = 0.0;
        self.state.position = Vec3::new(0.0, 0.0, -PRESET_DISTANCE);
    }

    pub fn right_view(&mut self) {
        self.state.yaw = PI;
        self.state.pitch = 0.0;
        self.state.position = Vec3::new(PRESET_DISTANCE, 0.0, 0.0);
    }

    pub fn top_view(&mut self) {
        self.state.yaw = 0.0;
        self.state.pitch = -PITCH_LIMIT;
        self.state.position = Vec3::new(0.0, PRESET_DISTANCE, 0.0);
    }

    pub fn toggle_orthographic(&mut self) {
        self.state.orthographic = !self.state.orthographic;
    }

    /// Places the camera `distance` units along -X from `target`, facing +X.
    pub fn zoom_to(&mut self, target: Vec3, distance: f32) {
        self.state.yaw = 0.0;
        self.state.pitch = 0.0;
        self.state.position = target - Vec3::X * distance;
    }

    /// Backs away from `center` along the current view direction until `extent` fits.
    pub fn frame_bounds(&mut self, center: Vec3, extent: Vec3) {
        let radius = extent.max_element();
        let distance = if radius > 0.0 { radius * 3.0 } else { 3.0 };
        let (forward, _, _) = self.basis();
        self.state.position = center - forward * distance;
    }

    /// Turns toward `target`. No-op when already there.
    pub fn look_at(&mut self, target: Vec3) {
        let displacement = target - self.state.position;
        let length = displacement.length();
        if length <= f32::EPSILON || !length.is_finite() {
            return;
        }
        self.state.yaw = displacement.z.atan2(displacement.x);
        self.state.pitch = (displacement.y / length)
            .clamp(-1.0, 1.0)
            .asin()
            .clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    pub fn begin_flight(&mut self) {
        self.mode = CameraMode::ScriptedFlight;
        self.movement = CameraMovement::default();
        self.velocity = Vec3::ZERO;
    }

    /// Moves the camera to a flight pose. `roll` is in radians.
    pub fn apply_flight_pose(&mut self, position: Vec3, target: Vec3, roll: f32, fov_deg: f32) {
        self.state.position = position;
        self.look_at(target);
        self.state.roll = if roll.is_finite() { roll } else { 0.0 };
        if fov_deg.is_finite() {
            self.state.fov_deg = fov_deg;
        }
    }

    pub fn end_flight(&mut self) {
        if self.mode == CameraMode::ScriptedFlight {
            self.mode = CameraMode::Idle;
        }
        self.state.roll = 0.0;
        self.state.fov_deg = DEFAULT_FOV_DEG;
    }
}

fn camera_basis(yaw: f32, pitch: f32) -> (Vec3, Vec3, Vec3) {
    let cos_pitch = pitch.cos();
    let forward = Vec3::new(yaw.cos() * cos_pitch, pitch.sin(), yaw.sin() * cos_pitch);
    let right = Vec3::new(-yaw.sin(), 0.0, yaw.cos());
    let up = right.cross(forward).normalize_or_zero();
    (forward, right, up)
}

fn wrap_angle(angle: f32) -> f32 {
    if !angle.is_finite() {
        return 0.0;
    }
    (angle + PI).rem_euclid(PI * 2.0) - PI
}
