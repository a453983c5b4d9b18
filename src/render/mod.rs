pub mod camera;
pub mod flight;
pub mod headless;
pub mod pick;

pub use camera::{CameraMode, CameraMovement, CameraRig, CameraState};
pub use flight::ScriptedFlight;
pub use headless::HeadlessRenderer;
pub use pick::{PickHit, PickKey, PickTarget, Picker};

use crate::assets::{BoundingBox, DrawModes, LoadedTexture, ParsedModel};
use glam::{Mat4, Vec3};

/// Renderer-side geometry built once and drawn many times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderableId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u64);

/// Built-in shapes used when an object has no model of its own.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DefaultPrimitive {
    Cube { half_extent: f32 },
    /// Double-sided quad in the YZ plane, `offset` along X.
    Flag { width: f32, height: f32, offset: f32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub renderable: RenderableId,
    pub transform: Mat4,
    pub color: [f32; 4],
    pub texture: Option<TextureId>,
    pub passes: DrawModes,
    /// Selection box drawn around the object in its local space.
    pub outline: Option<(BoundingBox, [f32; 4])>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment {
    pub from: Vec3,
    pub to: Vec3,
}

impl LineSegment {
    pub fn new(from: Vec3, to: Vec3) -> Self {
        Self { from, to }
    }
}

/// Per-frame view setup handed to the renderer before any draw call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSetup {
    pub view: Mat4,
    pub projection: Mat4,
    pub clear_color: [f32; 4],
}

/// The GPU side of the viewport.
///
/// Resource creation and destruction is driven by the resource cache;
/// draw submission by the session once per frame.
pub trait Renderer {
    fn build_model(&mut self, model: &ParsedModel, passes: DrawModes) -> RenderableId;
    fn build_primitive(&mut self, primitive: DefaultPrimitive) -> RenderableId;
    fn upload_texture(&mut self, texture: &LoadedTexture) -> TextureId;
    fn destroy(&mut self, renderable: RenderableId);
    fn destroy_texture(&mut self, texture: TextureId);

    fn begin_frame(&mut self, setup: &FrameSetup);
    fn submit(&mut self, call: DrawCall);
    fn draw_lines(&mut self, lines: &[LineSegment], color: [f32; 4]);
    fn end_frame(&mut self);
}
