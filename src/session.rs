//! One open scene in the preview viewport.
//!
//! `PreviewSession` owns everything the viewport needs between frames: the
//! object proxies, the resource cache, the camera, the drag controller,
//! rails and the demo fly-through. The editor that holds the real scene is
//! only borrowed per call.

use crate::animation::DemoAnimation;
use crate::assets::{ModelLoader, ResourceCache, TextureLoader};
use crate::config::{Palette, PreviewSettings};
use crate::interaction::{
    DragController, FixedStep, InputEvent, InputResponse, InteractionContext, KeyAction,
};
use crate::render::flight::FLIGHT_TICK_HZ;
use crate::render::{
    CameraMode, CameraRig, FrameSetup, LineSegment, Renderer, ScriptedFlight,
};
use crate::scene::rails::WAYPOINT_HALF_EXTENT;
use crate::scene::{ModelContext, ObjectId, ParameterStore, RailSet, SceneEditor, SceneObjectProxy, SceneRuntime};
use glam::{Vec2, Vec3};
use std::path::{Path, PathBuf};

/// Free-look integration rate.
pub const FREE_LOOK_TICK_HZ: f32 = 60.0;
const ORIGIN_AXIS_LENGTH: f32 = 100_000.0;
const AXIS_LOCK_LINE_LENGTH: f32 = 100_000.0;
const DEMO_CROSS_SIZE: f32 = 100.0;

const AXIS_COLORS: [[f32; 4]; 3] = [
    [1.0, 0.0, 0.0, 1.0],
    [0.0, 1.0, 0.0, 1.0],
    [0.0, 0.0, 1.0, 1.0],
];
const DEMO_TARGET_COLOR: [f32; 4] = [220.0 / 255.0, 40.0 / 255.0, 100.0 / 255.0, 1.0];
const DEMO_CAMERA_COLOR: [f32; 4] = [50.0 / 255.0, 50.0 / 255.0, 220.0 / 255.0, 1.0];
const DEMO_TARGET_PATH_COLOR: [f32; 4] = [120.0 / 255.0, 10.0 / 255.0, 10.0 / 255.0, 1.0];
const DEMO_CAMERA_PATH_COLOR: [f32; 4] = [10.0 / 255.0, 10.0 / 255.0, 120.0 / 255.0, 1.0];

pub struct PreviewSession {
    settings: PreviewSettings,
    palette: Palette,
    scene_root: PathBuf,
    cache: ResourceCache,
    runtime: SceneRuntime,
    models: Box<dyn ModelLoader>,
    textures: Box<dyn TextureLoader>,
    camera: CameraRig,
    controller: DragController,
    rails: Option<RailSet>,
    rails_visible: bool,
    demo: Option<DemoAnimation>,
    demo_visible: bool,
    flight: Option<ScriptedFlight>,
    look_ticker: FixedStep,
    flight_ticker: FixedStep,
    viewport: Vec2,
}

impl PreviewSession {
    pub fn new(
        settings: PreviewSettings,
        scene_root: impl Into<PathBuf>,
        models: Box<dyn ModelLoader>,
        textures: Box<dyn TextureLoader>,
    ) -> Self {
        let palette = settings.palette();
        let scene_root = scene_root.into();
        log::info!("preview session opened for {}", scene_root.display());
        Self {
            palette,
            cache: ResourceCache::new(settings.object_draw_mode),
            camera: CameraRig::new(settings.camera_tuning()),
            settings,
            scene_root,
            runtime: SceneRuntime::new(),
            models,
            textures,
            controller: DragController::new(),
            rails: None,
            rails_visible: false,
            demo: None,
            demo_visible: true,
            flight: None,
            look_ticker: FixedStep::new(FREE_LOOK_TICK_HZ),
            flight_ticker: FixedStep::new(FLIGHT_TICK_HZ),
            viewport: Vec2::new(1280.0, 720.0),
        }
    }

    pub fn settings(&self) -> &PreviewSettings {
        &self.settings
    }

    /// Applies new settings. Draw modes only affect models loaded afterwards.
    pub fn apply_settings(&mut self, settings: PreviewSettings) {
        self.palette = settings.palette();
        self.cache.set_draw_modes(settings.object_draw_mode);
        self.camera.set_tuning(settings.camera_tuning());
        self.settings = settings;
    }

    pub fn scene_root(&self) -> &Path {
        &self.scene_root
    }

    pub fn camera(&self) -> &CameraRig {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut CameraRig {
        &mut self.camera
    }

    pub fn runtime(&self) -> &SceneRuntime {
        &self.runtime
    }

    pub fn cache(&self) -> &ResourceCache {
        &self.cache
    }

    pub fn controller(&self) -> &DragController {
        &self.controller
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewport = Vec2::new(width.max(1) as f32, height.max(1) as f32);
    }

    /// Switches to another scene directory, dropping every proxy and cached model.
    pub fn change_scene(&mut self, scene_root: impl Into<PathBuf>, renderer: &mut dyn Renderer) {
        self.release_all();
        self.cache.clear(renderer);
        self.controller.reset(&mut self.runtime);
        self.scene_root = scene_root.into();
        log::info!("scene changed to {}", self.scene_root.display());
    }

    /// Re-reads one object. New drawable objects get a proxy and a model;
    /// existing ones only refresh their transform and colour.
    pub fn update_object(
        &mut self,
        id: ObjectId,
        store: &dyn ParameterStore,
        renderer: &mut dyn Renderer,
    ) {
        let Some(params) = store.read_parameters(id) else {
            self.remove_object(id);
            return;
        };
        let params = self.cache.refresh_params(id, params).clone();

        if let Some(proxy) = self.runtime.get_mut(id) {
            if !proxy.update(&params) {
                log::debug!("{} {id} is no longer drawable", proxy.name());
                self.remove_object(id);
            }
            return;
        }

        let name = store.object_name(id).unwrap_or_default();
        let mut proxy = SceneObjectProxy::new(id, name);
        let mut ctx = ModelContext {
            cache: &mut self.cache,
            renderer,
            models: self.models.as_mut(),
            textures: self.textures.as_mut(),
            scene_root: &self.scene_root,
            model_extension: &self.settings.model_extension,
        };
        proxy.generate_model(&params, &mut ctx);
        if proxy.is_drawable() {
            proxy.selected = self.controller.selection().contains(&id);
            self.runtime.insert(proxy);
        } else {
            self.cache.forget_params(id);
        }
    }

    /// Rebuilds every proxy from the store, keeping the selection.
    pub fn update_all_objects(&mut self, store: &dyn ParameterStore, renderer: &mut dyn Renderer) {
        let selection = self.controller.selection().to_vec();
        self.release_all();
        for id in store.object_ids() {
            self.update_object(id, store, renderer);
        }
        self.controller.set_selection(&selection, &mut self.runtime);
        log::info!("built {} scene objects", self.runtime.len());
    }

    /// Reloads the model of `id` and of every other object with the same name.
    pub fn update_object_model(
        &mut self,
        id: ObjectId,
        store: &dyn ParameterStore,
        renderer: &mut dyn Renderer,
    ) {
        let Some(name) = self.runtime.get(id).map(|proxy| proxy.name().to_string()) else {
            self.update_object(id, store, renderer);
            return;
        };
        for other in self.runtime.ids_named(&name) {
            let Some(params) = store.read_parameters(other) else {
                continue;
            };
            let params = self.cache.refresh_params(other, params).clone();
            let Some(proxy) = self.runtime.get_mut(other) else {
                continue;
            };
            let mut ctx = ModelContext {
                cache: &mut self.cache,
                renderer: &mut *renderer,
                models: self.models.as_mut(),
                textures: self.textures.as_mut(),
                scene_root: &self.scene_root,
                model_extension: &self.settings.model_extension,
            };
            proxy.generate_model(&params, &mut ctx);
            if !proxy.is_drawable() {
                self.remove_object(other);
            }
        }
    }

    /// Drops the proxy of a deleted object. Its model stays cached.
    pub fn remove_object(&mut self, id: ObjectId) {
        if let Some(mut proxy) = self.runtime.remove(id) {
            proxy.release(&mut self.cache);
        }
        self.cache.forget_params(id);
        self.controller.forget(id);
    }

    pub fn select_object(&mut self, id: Option<ObjectId>) {
        match id {
            Some(id) => self.controller.set_selection(&[id], &mut self.runtime),
            None => self.controller.clear_selection(&mut self.runtime),
        }
    }

    pub fn set_selected(&mut self, ids: &[ObjectId]) {
        self.controller.set_selection(ids, &mut self.runtime);
    }

    pub fn selected_objects(&self) -> &[ObjectId] {
        self.controller.selection()
    }

    /// Moves the camera next to an object, as the editor's "go to" does.
    pub fn zoom_to_object(&mut self, id: ObjectId, distance: f32) -> bool {
        let Some(proxy) = self.runtime.get(id) else {
            return false;
        };
        self.camera.zoom_to(proxy.position, distance);
        true
    }

    pub fn rails(&self) -> Option<&RailSet> {
        self.rails.as_ref()
    }

    pub fn rails_mut(&mut self) -> Option<&mut RailSet> {
        self.rails.as_mut()
    }

    pub fn set_rails(&mut self, rails: Option<RailSet>) {
        self.rails = rails;
    }

    pub fn rails_visible(&self) -> bool {
        self.rails_visible
    }

    pub fn set_rails_visible(&mut self, visible: bool) {
        self.rails_visible = visible;
    }

    pub fn demo(&self) -> Option<&DemoAnimation> {
        self.demo.as_ref()
    }

    pub fn set_demo(&mut self, demo: Option<DemoAnimation>) {
        if demo.is_none() {
            self.stop_scripted_flight();
        }
        self.demo = demo;
    }

    pub fn set_demo_visible(&mut self, visible: bool) {
        self.demo_visible = visible;
    }

    pub fn is_flying(&self) -> bool {
        self.flight.is_some()
    }

    /// Plays the demo fly-through from its first frame, replacing a running one.
    pub fn start_scripted_flight(&mut self) -> bool {
        let Some(demo) = &self.demo else {
            log::warn!("no demo animation loaded; nothing to fly");
            return false;
        };
        if self.camera.mode() == CameraMode::FreeLook {
            return false;
        }
        self.camera.begin_flight();
        self.flight = Some(ScriptedFlight::new());
        self.flight_ticker.reset();
        log::info!("scripted flight started ({} frames)", demo.duration());
        true
    }

    pub fn stop_scripted_flight(&mut self) {
        if self.flight.take().is_some() {
            self.camera.end_flight();
            log::info!("scripted flight stopped");
        }
    }

    /// Routes one input event. Returns what the window has to do.
    pub fn handle_input(&mut self, event: InputEvent, editor: &mut dyn SceneEditor) -> InputResponse {
        if let InputEvent::Key {
            action,
            pressed: true,
        } = event
        {
            match action {
                KeyAction::StartFlight => {
                    return InputResponse {
                        redraw: self.start_scripted_flight(),
                        ..InputResponse::default()
                    };
                }
                KeyAction::ToggleRails => {
                    self.rails_visible = !self.rails_visible;
                    return InputResponse::redraw();
                }
                _ => {}
            }
        }

        let rails = if self.rails_visible {
            self.rails.as_mut()
        } else {
            None
        };
        let mut ctx = InteractionContext {
            camera: &mut self.camera,
            runtime: &mut self.runtime,
            editor,
            rails,
            viewport: self.viewport,
        };
        let response = self.controller.handle(event, &mut ctx);
        if !self.controller.is_free_look() {
            self.look_ticker.reset();
        }
        response
    }

    /// Advances free look and scripted flight by `dt` seconds.
    /// Returns whether the camera moved.
    pub fn advance(&mut self, dt: f32) -> bool {
        let mut moved = false;
        if self.controller.is_free_look() {
            for _ in 0..self.look_ticker.advance(dt) {
                moved |= self.camera.tick_free_look();
            }
        }

        if let (Some(flight), Some(demo)) = (self.flight.as_mut(), self.demo.as_ref()) {
            for _ in 0..self.flight_ticker.advance(dt) {
                if !flight.tick(demo, &mut self.camera) {
                    self.flight = None;
                    break;
                }
                moved = true;
            }
        }
        moved
    }

    /// Draws one frame. Returns the number of objects submitted.
    pub fn render_frame(&mut self, renderer: &mut dyn Renderer) -> usize {
        renderer.begin_frame(&FrameSetup {
            view: self.camera.view_matrix(),
            projection: self.camera.projection_matrix(self.viewport),
            clear_color: self.palette.void,
        });

        if self.settings.show_origin {
            for (axis, color) in [Vec3::X, Vec3::Y, Vec3::Z].into_iter().zip(AXIS_COLORS) {
                renderer.draw_lines(&[LineSegment::new(Vec3::ZERO, axis * ORIGIN_AXIS_LENGTH)], color);
            }
        }
        self.draw_axis_locks(renderer);
        if self.rails_visible {
            self.draw_rails(renderer);
        }
        if self.demo_visible {
            self.draw_demo(renderer);
        }

        let eye = self.camera.state().position;
        let objects = self.palette.objects();
        let mut drawn = 0;
        for proxy in self.runtime.iter() {
            if proxy.position.distance(eye) >= self.settings.draw_distance {
                continue;
            }
            if let Some(call) = proxy.draw_call(&mut self.cache, renderer, &objects) {
                renderer.submit(call);
                drawn += 1;
            }
        }
        renderer.end_frame();
        drawn
    }

    /// Releases every renderer resource the session holds.
    pub fn teardown(&mut self, renderer: &mut dyn Renderer) {
        self.release_all();
        self.cache.teardown(renderer);
        self.controller.reset(&mut self.runtime);
        log::info!("preview session closed");
    }

    fn release_all(&mut self) {
        for mut proxy in self.runtime.drain() {
            proxy.release(&mut self.cache);
        }
    }

    fn draw_axis_locks(&self, renderer: &mut dyn Renderer) {
        let locks = self.controller.axis_locks();
        if !locks.any() {
            return;
        }
        let Some(center) = self
            .controller
            .anchor_position(&self.runtime, self.rails.as_ref())
        else {
            return;
        };
        for ((locked, axis), color) in [locks.x, locks.y, locks.z]
            .into_iter()
            .zip([Vec3::X, Vec3::Y, Vec3::Z])
            .zip(AXIS_COLORS)
        {
            if locked {
                let reach = axis * AXIS_LOCK_LINE_LENGTH;
                renderer.draw_lines(&[LineSegment::new(center - reach, center + reach)], color);
            }
        }
    }

    fn draw_rails(&self, renderer: &mut dyn Renderer) {
        let Some(rails) = &self.rails else {
            return;
        };
        let selected = self.controller.selected_waypoint();
        for (rail_index, rail) in rails.all_rails().iter().enumerate() {
            for (index, frame) in rail.waypoints.iter().enumerate() {
                let color = if selected == Some((rail_index, index)) {
                    self.palette.rail_selected
                } else {
                    self.palette.rail
                };
                renderer.draw_lines(&wire_cube(frame.position(), WAYPOINT_HALF_EXTENT), color);
            }
            let color = if selected.map(|(rail, _)| rail) == Some(rail_index) {
                self.palette.rail_node_selected
            } else {
                self.palette.rail_node
            };
            let segments: Vec<LineSegment> = rail
                .segments()
                .into_iter()
                .map(|(from, to)| LineSegment::new(from, to))
                .collect();
            renderer.draw_lines(&segments, color);
        }
    }

    fn draw_demo(&self, renderer: &mut dyn Renderer) {
        let Some(demo) = &self.demo else {
            return;
        };
        let points = demo.path_points();
        for (target, camera) in &points {
            renderer.draw_lines(&cross(*target, DEMO_CROSS_SIZE), DEMO_TARGET_COLOR);
            renderer.draw_lines(&cross(*camera, DEMO_CROSS_SIZE), DEMO_CAMERA_COLOR);
        }
        let path = |pick: fn(&(Vec3, Vec3)) -> Vec3| -> Vec<LineSegment> {
            points
                .windows(2)
                .map(|pair| LineSegment::new(pick(&pair[0]), pick(&pair[1])))
                .collect()
        };
        renderer.draw_lines(&path(|point| point.0), DEMO_TARGET_PATH_COLOR);
        renderer.draw_lines(&path(|point| point.1), DEMO_CAMERA_PATH_COLOR);
    }
}

fn cross(center: Vec3, size: f32) -> [LineSegment; 3] {
    [Vec3::X, Vec3::Y, Vec3::Z].map(|axis| LineSegment::new(center - axis * size, center + axis * size))
}

/// The twelve edges of an axis-aligned cube.
fn wire_cube(center: Vec3, half_extent: f32) -> Vec<LineSegment> {
    let corner = |x: f32, y: f32, z: f32| center + Vec3::new(x, y, z) * half_extent;
    let mut edges = Vec::with_capacity(12);
    for a in [-1.0, 1.0] {
        for b in [-1.0, 1.0] {
            edges.push(LineSegment::new(corner(-1.0, a, b), corner(1.0, a, b)));
            edges.push(LineSegment::new(corner(a, -1.0, b), corner(a, 1.0, b)));
            edges.push(LineSegment::new(corner(a, b, -1.0), corner(a, b, 1.0)));
        }
    }
    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{AxisChannels, Channel, JointAnimation, Keyframe};
    use crate::assets::{LoadError, LoadedTexture, ParsedModel, Primitive, PrimitiveKind};
    use crate::interaction::MouseButton;
    use crate::render::camera::DEFAULT_FOV_DEG;
    use crate::render::HeadlessRenderer;
    use crate::scene::{MemoryDocument, ParamSet, Rail, RailWaypoint, Renderable};
    use std::collections::HashSet;

    /// Loads a small triangle for every path it was told exists.
    struct KnownModels(HashSet<PathBuf>);

    impl ModelLoader for KnownModels {
        fn load_model(
            &mut self,
            path: &Path,
            _texture: Option<&Path>,
        ) -> Result<ParsedModel, LoadError> {
            if !self.0.contains(path) {
                return Err(LoadError::NotFound {
                    path: path.display().to_string(),
                });
            }
            Ok(ParsedModel {
                positions: vec![[-50.0, 0.0, -50.0], [50.0, 100.0, 50.0], [0.0, 0.0, 0.0]],
                primitives: vec![Primitive {
                    kind: PrimitiveKind::Triangles,
                    indices: vec![0, 1, 2],
                    translucent: false,
                }],
                ..ParsedModel::default()
            })
        }
    }

    struct NoTextures;

    impl TextureLoader for NoTextures {
        fn load_texture(&mut self, path: &Path) -> Result<LoadedTexture, LoadError> {
            Err(LoadError::NotFound {
                path: path.display().to_string(),
            })
        }
    }

    fn root() -> PathBuf {
        PathBuf::from("scene")
    }

    fn session_with(settings: PreviewSettings, known: &[&str]) -> PreviewSession {
        let known = known
            .iter()
            .map(|path| crate::assets::resolve_scene_path(&root(), path))
            .collect();
        PreviewSession::new(
            settings,
            root(),
            Box::new(KnownModels(known)),
            Box::new(NoTextures),
        )
    }

    fn session(known: &[&str]) -> PreviewSession {
        session_with(PreviewSettings::default(), known)
    }

    fn at(x: &str, y: &str, z: &str, extra: &[(&str, &str)]) -> ParamSet {
        let mut params = ParamSet::from_pairs([("X", x), ("Y", y), ("Z", z)]);
        for (key, value) in extra {
            params.set(*key, *value);
        }
        params
    }

    fn demo() -> DemoAnimation {
        let line = |from: f32, to: f32| Channel::new(vec![Keyframe::new(0.0, from), Keyframe::new(10.0, to)]);
        DemoAnimation {
            look_at: JointAnimation {
                translation: AxisChannels::new(line(0.0, 1_000.0), Channel::constant(0.0), Channel::constant(0.0)),
                ..JointAnimation::default()
            },
            look_from: JointAnimation {
                translation: AxisChannels::new(
                    Channel::constant(0.0),
                    Channel::constant(500.0),
                    Channel::constant(-2_000.0),
                ),
                scale: AxisChannels::new(Channel::default(), Channel::constant(45.0), Channel::default()),
                ..JointAnimation::default()
            },
        }
    }

    #[test]
    fn building_the_scene_shares_models_and_skips_unplaced_objects() {
        let mut renderer = HeadlessRenderer::new();
        let mut document = MemoryDocument::new();
        let coin = [("Model", "Coin")];
        let a = document.add_object("Coin", at("0", "0", "0", &coin));
        let b = document.add_object("Coin", at("500", "0", "0", &coin));
        let unplaced = document.add_object("Manager", ParamSet::from_pairs([("Model", "Coin")]));
        let mut session = session(&["mapobj/coin.json"]);

        session.update_all_objects(&document, &mut renderer);
        assert_eq!(session.runtime().len(), 2);
        assert!(!session.runtime().contains(unplaced));
        assert!(session.cache().params(unplaced).is_none());
        assert_eq!(session.cache().load_count(), 1);
        let handle_a = session.runtime().get(a).unwrap().renderable();
        let handle_b = session.runtime().get(b).unwrap().renderable();
        assert!(matches!(handle_a, Renderable::Model(_)));
        assert_eq!(handle_a, handle_b);
        assert!(session.cache().params(a).is_some());
    }

    #[test]
    fn rebuilding_the_scene_reuses_cached_models() {
        let mut renderer = HeadlessRenderer::new();
        let mut document = MemoryDocument::new();
        let id = document.add_object("Coin", at("0", "0", "0", &[("Model", "Coin")]));
        let mut session = session(&["mapobj/coin.json"]);

        session.update_all_objects(&document, &mut renderer);
        let first = session.runtime().get(id).unwrap().renderable();
        session.update_all_objects(&document, &mut renderer);
        assert_eq!(session.cache().load_count(), 1);
        assert_eq!(session.runtime().get(id).unwrap().renderable(), first);
        let Renderable::Model(handle) = first else {
            panic!("expected model");
        };
        assert_eq!(session.cache().model(handle).unwrap().users(), 1);
        assert_eq!(renderer.live_renderables(), 1);
    }

    #[test]
    fn deleted_object_model_stays_cached_for_re_adding() {
        let mut renderer = HeadlessRenderer::new();
        let mut document = MemoryDocument::new();
        let coin = [("Model", "Coin")];
        let id = document.add_object("Coin", at("0", "0", "0", &coin));
        let mut session = session(&["mapobj/coin.json"]);
        session.update_all_objects(&document, &mut renderer);
        let Renderable::Model(handle) = session.runtime().get(id).unwrap().renderable() else {
            panic!("expected model");
        };

        document.remove_object(id);
        session.remove_object(id);
        assert!(!session.runtime().contains(id));
        assert_eq!(session.cache().model(handle).unwrap().users(), 0);
        assert_eq!(renderer.live_renderables(), 1);

        let again = document.add_object("Coin", at("50", "0", "0", &coin));
        session.update_object(again, &document, &mut renderer);
        assert_eq!(session.cache().load_count(), 1);
        assert_eq!(
            session.runtime().get(again).unwrap().renderable(),
            Renderable::Model(handle)
        );

        // Only clearing the cache frees it.
        session.change_scene(root(), &mut renderer);
        assert!(session.cache().model(handle).is_none());
        assert_eq!(renderer.live_renderables(), 0);
    }

    #[test]
    fn object_losing_its_position_is_dropped() {
        let mut renderer = HeadlessRenderer::new();
        let mut document = MemoryDocument::new();
        let id = document.add_object("Coin", at("0", "0", "0", &[]));
        let mut session = session(&[]);
        session.update_all_objects(&document, &mut renderer);
        session.select_object(Some(id));
        assert_eq!(session.selected_objects(), &[id]);

        document.set_value(id, "Y", "up");
        session.update_object(id, &document, &mut renderer);
        assert!(!session.runtime().contains(id));
        assert!(session.selected_objects().is_empty());
        assert!(session.cache().params(id).is_none());
    }

    #[test]
    fn updating_an_object_refreshes_its_transform() {
        let mut renderer = HeadlessRenderer::new();
        let mut document = MemoryDocument::new();
        let id = document.add_object("Coin", at("0", "0", "0", &[]));
        let mut session = session(&[]);
        session.update_object(id, &document, &mut renderer);

        document.set_value(id, "X", "250");
        session.update_object(id, &document, &mut renderer);
        assert_eq!(session.runtime().get(id).unwrap().position, Vec3::new(250.0, 0.0, 0.0));
        assert_eq!(session.cache().params(id).unwrap().get("X"), Some("250"));
    }

    #[test]
    fn model_change_regenerates_objects_sharing_the_name() {
        let mut renderer = HeadlessRenderer::new();
        let mut document = MemoryDocument::new();
        let model = [("DisplayModel", "mapobj/coin.json")];
        let a = document.add_object("Coin", at("0", "0", "0", &model));
        let b = document.add_object("Coin", at("300", "0", "0", &model));
        let door = document.add_object("Door", at("600", "0", "0", &model));
        let mut session = session(&["mapobj/coin.json", "mapobj/bigcoin.json"]);
        session.update_all_objects(&document, &mut renderer);
        let before = session.runtime().get(door).unwrap().renderable();

        document.set_value(a, "DisplayModel", "mapobj/bigcoin.json");
        document.set_value(b, "DisplayModel", "mapobj/bigcoin.json");
        session.update_object_model(a, &document, &mut renderer);

        let a_model = session.runtime().get(a).unwrap().renderable();
        assert_ne!(a_model, before);
        assert_eq!(session.runtime().get(b).unwrap().renderable(), a_model);
        assert_eq!(session.runtime().get(door).unwrap().renderable(), before);
        assert_eq!(session.cache().model_count(), 2);
    }

    #[test]
    fn frame_draws_nearby_objects_and_overlays() {
        let mut renderer = HeadlessRenderer::new();
        let mut document = MemoryDocument::new();
        document.add_object("Near", at("1000", "0", "0", &[]));
        document.add_object("Far", at("900000", "0", "0", &[]));
        let mut session = session(&[]);
        session.update_all_objects(&document, &mut renderer);

        assert_eq!(session.render_frame(&mut renderer), 1);
        // Origin axes only.
        assert_eq!(renderer.lines().len(), 3);
        assert_eq!(renderer.frame_setup().unwrap().clear_color, [0.0, 0.0, 0.0, 1.0]);

        let mut start = RailWaypoint::at(0, 0, 0);
        start.connect(1);
        session.set_rails(Some(RailSet::new(vec![Rail {
            name: "path".to_string(),
            waypoints: vec![start, RailWaypoint::at(500, 0, 0)],
        }])));
        session.render_frame(&mut renderer);
        assert_eq!(renderer.lines().len(), 3);

        session.set_rails_visible(true);
        session.render_frame(&mut renderer);
        // Two wire cubes and one connection on top of the axes.
        assert_eq!(renderer.lines().len(), 3 + 24 + 1);
    }

    #[test]
    fn hidden_origin_draws_no_axes() {
        let mut renderer = HeadlessRenderer::new();
        let settings = PreviewSettings {
            show_origin: false,
            ..PreviewSettings::default()
        };
        let mut session = session_with(settings, &[]);
        session.render_frame(&mut renderer);
        assert!(renderer.lines().is_empty());
    }

    #[test]
    fn toggle_rails_key_flips_visibility() {
        let mut document = MemoryDocument::new();
        let mut session = session(&[]);
        let toggle = InputEvent::Key {
            action: KeyAction::ToggleRails,
            pressed: true,
        };
        assert!(session.handle_input(toggle, &mut document).redraw);
        assert!(session.rails_visible());
        session.handle_input(toggle, &mut document);
        assert!(!session.rails_visible());
    }

    #[test]
    fn flight_plays_at_fixed_rate_and_ends() {
        let mut document = MemoryDocument::new();
        let mut session = session(&[]);
        let start = InputEvent::Key {
            action: KeyAction::StartFlight,
            pressed: true,
        };
        assert!(!session.handle_input(start, &mut document).redraw);

        session.set_demo(Some(demo()));
        assert!(session.handle_input(start, &mut document).redraw);
        assert_eq!(session.camera().mode(), CameraMode::ScriptedFlight);

        // One tick at 200 Hz applies frame 0.
        assert!(session.advance(0.005));
        assert!((session.camera().state().position - Vec3::new(0.0, 500.0, -2_000.0)).length() < 1e-3);
        assert_eq!(session.camera().state().fov_deg, 45.0);

        for _ in 0..20 {
            session.advance(0.05);
        }
        assert!(!session.is_flying());
        assert_eq!(session.camera().mode(), CameraMode::Idle);
        assert_eq!(session.camera().state().fov_deg, DEFAULT_FOV_DEG);
    }

    #[test]
    fn free_look_moves_camera_only_while_held() {
        let mut document = MemoryDocument::new();
        let mut session = session(&[]);
        let response = session.handle_input(
            InputEvent::MouseDown {
                button: MouseButton::Right,
                position: Vec2::new(10.0, 10.0),
            },
            &mut document,
        );
        assert!(response.hide_cursor);
        session.handle_input(
            InputEvent::Key {
                action: KeyAction::MoveForward,
                pressed: true,
            },
            &mut document,
        );
        assert!(session.advance(0.04));
        assert!(session.camera().state().position.x > 0.0);

        session.handle_input(
            InputEvent::MouseUp {
                button: MouseButton::Right,
                position: Vec2::new(10.0, 10.0),
            },
            &mut document,
        );
        let parked = session.camera().state().position;
        assert!(!session.advance(0.5));
        assert_eq!(session.camera().state().position, parked);
    }

    #[test]
    fn clicking_in_the_viewport_selects_through_the_editor() {
        let mut renderer = HeadlessRenderer::new();
        let mut document = MemoryDocument::new();
        let id = document.add_object("Coin", at("1000", "0", "0", &[]));
        let mut session = session(&[]);
        session.update_all_objects(&document, &mut renderer);
        session.resize(800, 600);

        session.handle_input(
            InputEvent::MouseDown {
                button: MouseButton::Left,
                position: Vec2::new(400.0, 300.0),
            },
            &mut document,
        );
        assert_eq!(session.selected_objects(), &[id]);
        assert_eq!(document.focused(), Some(id));
        assert!(session.runtime().get(id).unwrap().selected);
    }

    #[test]
    fn changing_scene_and_teardown_release_everything() {
        let mut renderer = HeadlessRenderer::new();
        let mut document = MemoryDocument::new();
        document.add_object("Coin", at("0", "0", "0", &[("Model", "Coin")]));
        let mut session = session(&["mapobj/coin.json"]);
        session.update_all_objects(&document, &mut renderer);
        session.render_frame(&mut renderer);
        assert_eq!(session.cache().model_count(), 1);

        session.change_scene("other", &mut renderer);
        assert!(session.runtime().is_empty());
        assert_eq!(session.cache().model_count(), 0);
        assert_eq!(session.scene_root(), Path::new("other"));

        session.render_frame(&mut renderer);
        session.teardown(&mut renderer);
        assert_eq!(renderer.live_renderables(), 0);
    }

    #[test]
    fn zoom_to_object_parks_camera_beside_it() {
        let mut renderer = HeadlessRenderer::new();
        let mut document = MemoryDocument::new();
        let id = document.add_object("Coin", at("100", "200", "300", &[]));
        let mut session = session(&[]);
        session.update_all_objects(&document, &mut renderer);
        assert!(session.zoom_to_object(id, 1_000.0));
        assert_eq!(session.camera().state().position, Vec3::new(-900.0, 200.0, 300.0));
        assert!(!session.zoom_to_object(ObjectId(99), 1_000.0));
    }
}
