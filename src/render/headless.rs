//! Renderer that keeps no GPU state.
//!
//! Allocates ids, tracks which are alive and records the last frame's
//! submissions. The viewport shell uses it to report frame statistics and
//! the tests use it to observe resource ownership.

use super::{
    DefaultPrimitive, DrawCall, FrameSetup, LineSegment, RenderableId, Renderer, TextureId,
};
use crate::assets::{DrawModes, LoadedTexture, ParsedModel};
use std::collections::BTreeSet;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FrameStats {
    pub draw_calls: usize,
    pub line_segments: usize,
}

#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    next_id: u64,
    live: BTreeSet<RenderableId>,
    destroyed: Vec<RenderableId>,
    live_textures: BTreeSet<TextureId>,
    setup: Option<FrameSetup>,
    calls: Vec<DrawCall>,
    lines: Vec<(LineSegment, [f32; 4])>,
    last_stats: FrameStats,
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn live_renderables(&self) -> usize {
        self.live.len()
    }

    pub fn live_textures(&self) -> usize {
        self.live_textures.len()
    }

    pub fn destroyed_renderables(&self) -> &[RenderableId] {
        &self.destroyed
    }

    /// Draw calls submitted since the last `begin_frame`.
    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    pub fn lines(&self) -> &[(LineSegment, [f32; 4])] {
        &self.lines
    }

    pub fn frame_setup(&self) -> Option<&FrameSetup> {
        self.setup.as_ref()
    }

    pub fn last_stats(&self) -> FrameStats {
        self.last_stats
    }
}

impl Renderer for HeadlessRenderer {
    fn build_model(&mut self, model: &ParsedModel, passes: DrawModes) -> RenderableId {
        let id = RenderableId(self.allocate());
        log::trace!(
            "built {:?} from {} primitives ({:?})",
            id,
            model.primitives.len(),
            passes
        );
        self.live.insert(id);
        id
    }

    fn build_primitive(&mut self, primitive: DefaultPrimitive) -> RenderableId {
        let id = RenderableId(self.allocate());
        log::trace!("built {:?} as {:?}", id, primitive);
        self.live.insert(id);
        id
    }

    fn upload_texture(&mut self, texture: &LoadedTexture) -> TextureId {
        let id = TextureId(self.allocate());
        log::trace!("uploaded {}x{} texture as {:?}", texture.width, texture.height, id);
        self.live_textures.insert(id);
        id
    }

    fn destroy(&mut self, renderable: RenderableId) {
        if self.live.remove(&renderable) {
            self.destroyed.push(renderable);
        } else {
            log::warn!("destroy of unknown renderable {:?}", renderable);
        }
    }

    fn destroy_texture(&mut self, texture: TextureId) {
        self.live_textures.remove(&texture);
    }

    fn begin_frame(&mut self, setup: &FrameSetup) {
        self.setup = Some(*setup);
        self.calls.clear();
        self.lines.clear();
    }

    fn submit(&mut self, call: DrawCall) {
        if !self.live.contains(&call.renderable) {
            log::warn!("draw of released renderable {:?}", call.renderable);
        }
        self.calls.push(call);
    }

    fn draw_lines(&mut self, lines: &[LineSegment], color: [f32; 4]) {
        self.lines.extend(lines.iter().map(|line| (*line, color)));
    }

    fn end_frame(&mut self) {
        self.last_stats = FrameStats {
            draw_calls: self.calls.len(),
            line_segments: self.lines.len(),
        };
    }
}
