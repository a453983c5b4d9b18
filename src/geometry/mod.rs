//! Rotation helpers, rays and screen unprojection.
//!
//! Angles handed to the rotation helpers are in degrees, matching the
//! values stored in scene parameters. Euler rotations are applied X first,
//! then Y, then Z.

use glam::{Mat4, Vec2, Vec3, Vec4};

/// Distance an orthographic ray origin is pulled back behind the camera.
pub const ORTHO_PULLBACK: f32 = 10_000.0;

pub fn rotate_around_x(v: Vec3, degrees: f32) -> Vec3 {
    let (s, c) = degrees.to_radians().sin_cos();
    Vec3::new(v.x, v.y * c - v.z * s, v.y * s + v.z * c)
}

pub fn rotate_around_y(v: Vec3, degrees: f32) -> Vec3 {
    // Negated angle: positive yaw turns +X toward -Z.
    let (s, c) = (-degrees).to_radians().sin_cos();
    Vec3::new(v.x * c - v.z * s, v.y, v.x * s + v.z * c)
}

pub fn rotate_around_z(v: Vec3, degrees: f32) -> Vec3 {
    let (s, c) = degrees.to_radians().sin_cos();
    Vec3::new(v.x * c - v.y * s, v.x * s + v.y * c, v.z)
}

/// Applies `rotation_deg` (x, y, z) as Z * Y * X.
pub fn rotate_euler(v: Vec3, rotation_deg: Vec3) -> Vec3 {
    let v = rotate_around_x(v, rotation_deg.x);
    let v = rotate_around_y(v, rotation_deg.y);
    rotate_around_z(v, rotation_deg.z)
}

/// Exact inverse of [`rotate_euler`].
pub fn unrotate_euler(v: Vec3, rotation_deg: Vec3) -> Vec3 {
    let v = rotate_around_z(v, -rotation_deg.z);
    let v = rotate_around_y(v, -rotation_deg.y);
    rotate_around_x(v, -rotation_deg.x)
}

/// Matrix form of [`rotate_euler`].
pub fn euler_matrix(rotation_deg: Vec3) -> Mat4 {
    Mat4::from_rotation_z(rotation_deg.z.to_radians())
        * Mat4::from_rotation_y(rotation_deg.y.to_radians())
        * Mat4::from_rotation_x(rotation_deg.x.to_radians())
}

/// Translate * Rz * Ry * Rx * Scale.
pub fn compose_transform(position: Vec3, rotation_deg: Vec3, scale: Vec3) -> Mat4 {
    Mat4::from_translation(position) * euler_matrix(rotation_deg) * Mat4::from_scale(scale)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Builds a ray, normalizing `direction`.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Signed distance along `ray` to the plane through `point` with `normal`.
///
/// Returns `None` when the ray is parallel to the plane or the inputs
/// produce a non-finite distance.
pub fn ray_plane_distance(ray: &Ray, point: Vec3, normal: Vec3) -> Option<f32> {
    let denom = ray.direction.dot(normal);
    let t = (point - ray.origin).dot(normal) / denom;
    t.is_finite().then_some(t)
}

/// Camera position and basis used to build picking rays.
#[derive(Debug, Clone, Copy)]
pub struct ViewFrame {
    pub position: Vec3,
    pub forward: Vec3,
    pub right: Vec3,
    pub up: Vec3,
    /// World units per pixel when orthographic.
    pub ortho_zoom: Option<f32>,
}

/// Casts a ray through the pixel `screen` of a `viewport`-sized view.
///
/// Screen coordinates have their origin at the top-left corner.
pub fn screen_to_ray(
    screen: Vec2,
    viewport: Vec2,
    projection: &Mat4,
    view: &Mat4,
    frame: &ViewFrame,
) -> Ray {
    if let Some(zoom) = frame.ortho_zoom {
        let dx = screen.x - viewport.x * 0.5;
        let dy = viewport.y * 0.5 - screen.y;
        let origin = frame.position - frame.forward * ORTHO_PULLBACK
            + frame.right * (dx * zoom)
            + frame.up * (dy * zoom);
        return Ray::new(origin, frame.forward);
    }

    let width = viewport.x.max(1.0);
    let height = viewport.y.max(1.0);
    let ndc_x = 2.0 * screen.x / width - 1.0;
    let ndc_y = 1.0 - 2.0 * screen.y / height;

    let eye = projection.inverse() * Vec4::new(ndc_x, ndc_y, -1.0, 1.0);
    let eye = Vec4::new(eye.x, eye.y, -1.0, 0.0);
    let world = (view.inverse() * eye).truncate().normalize_or_zero();

    if world == Vec3::ZERO || !world.is_finite() {
        return Ray::new(frame.position, frame.forward);
    }
    Ray::new(frame.position, world)
}
