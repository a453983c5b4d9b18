//! Model, texture and parameter caching.
//!
//! The cache owns every renderer resource created for scene objects.
//! Models are keyed by the concatenation of path, texture override and
//! forced draw mode; an object referencing a slot that was filled from a
//! different source triggers a reload that replaces the slot. Entries stay
//! resident after their last user lets go and are only freed by
//! [`ResourceCache::clear`] or [`ResourceCache::teardown`].

mod loader;
mod model;

pub use loader::{
    resolve_scene_path, ImageTextureLoader, JsonModelLoader, LoadError, ModelLoader,
    TextureLoader,
};
pub use model::{BoundingBox, LoadedTexture, ParsedModel, Primitive, PrimitiveKind};

use crate::render::{DefaultPrimitive, RenderableId, Renderer, TextureId};
use crate::scene::{ObjectId, ParamSet};
use std::collections::HashMap;
use std::path::Path;

/// Half extent of the placeholder cube drawn for objects without a model.
pub const CUBE_HALF_EXTENT: f32 = 64.0;
pub const FLAG_WIDTH: f32 = 64.0;
pub const FLAG_HEIGHT: f32 = 64.0;
pub const FLAG_OFFSET: f32 = 0.0;

/// Which material passes get drawn.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize,
)]
pub enum DrawModes {
    None,
    Normal,
    Effects,
    #[default]
    Both,
}

impl DrawModes {
    pub const NAMES: [&'static str; 4] = ["None", "Normal", "Effects", "Both"];

    /// Parses a mode name as written in scene parameters.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim() {
            "None" => Some(Self::None),
            "Normal" => Some(Self::Normal),
            "Effects" => Some(Self::Effects),
            "Both" => Some(Self::Both),
            _ => None,
        }
    }

    pub fn index(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Normal => 1,
            Self::Effects => 2,
            Self::Both => 3,
        }
    }

    fn from_index(bits: u8) -> Self {
        match bits & 3 {
            1 => Self::Normal,
            2 => Self::Effects,
            3 => Self::Both,
            _ => Self::None,
        }
    }

    pub fn union(self, other: Self) -> Self {
        Self::from_index(self.index() | other.index())
    }

    pub fn draws_normal(self) -> bool {
        self.index() & 1 != 0
    }

    pub fn draws_effects(self) -> bool {
        self.index() & 2 != 0
    }
}

/// Everything that identifies a loaded model.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelSource {
    /// Path relative to the scene root, lower case.
    pub path: String,
    /// Texture override relative to the scene root, or empty.
    pub texture: String,
    /// Mode forced by the object; `None` when the object forces nothing.
    pub force_mode: DrawModes,
}

impl ModelSource {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            texture: String::new(),
            force_mode: DrawModes::None,
        }
    }

    pub fn with_texture(mut self, texture: impl Into<String>) -> Self {
        self.texture = texture.into();
        self
    }

    pub fn with_force_mode(mut self, mode: DrawModes) -> Self {
        self.force_mode = mode;
        self
    }

    /// Cache slot key. Distinct sources may share a key; the cache reloads on mismatch.
    pub fn key(&self) -> String {
        format!("{}{}{}", self.path, self.texture, self.force_mode.index())
    }
}

/// Opaque reference to a cached model. Never reused within a cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelHandle(u64);

#[derive(Debug, Clone)]
pub struct CachedModel {
    pub source: ModelSource,
    pub renderable: RenderableId,
    pub bounds: BoundingBox,
    pub passes: DrawModes,
    handle: ModelHandle,
    users: usize,
}

impl CachedModel {
    pub fn handle(&self) -> ModelHandle {
        self.handle
    }

    pub fn users(&self) -> usize {
        self.users
    }
}

pub struct ResourceCache {
    models: HashMap<String, CachedModel>,
    handle_keys: HashMap<ModelHandle, String>,
    flag_textures: HashMap<String, TextureId>,
    params: HashMap<ObjectId, ParamSet>,
    cube: Option<RenderableId>,
    flag: Option<RenderableId>,
    draw_modes: DrawModes,
    next_handle: u64,
    load_count: usize,
}

impl ResourceCache {
    pub fn new(draw_modes: DrawModes) -> Self {
        Self {
            models: HashMap::new(),
            handle_keys: HashMap::new(),
            flag_textures: HashMap::new(),
            params: HashMap::new(),
            cube: None,
            flag: None,
            draw_modes,
            next_handle: 1,
            load_count: 0,
        }
    }

    pub fn draw_modes(&self) -> DrawModes {
        self.draw_modes
    }

    /// Takes effect for models loaded afterwards.
    pub fn set_draw_modes(&mut self, modes: DrawModes) {
        self.draw_modes = modes;
    }

    /// Number of model loads performed since creation.
    pub fn load_count(&self) -> usize {
        self.load_count
    }

    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    /// Returns the handle for `source`, loading it on a miss.
    ///
    /// Each successful call counts as one user of the returned handle;
    /// pair it with [`ResourceCache::release`].
    pub fn get_or_load(
        &mut self,
        source: &ModelSource,
        scene_root: &Path,
        renderer: &mut dyn Renderer,
        loader: &mut dyn ModelLoader,
    ) -> Result<ModelHandle, LoadError> {
        let key = source.key();
        if let Some(entry) = self.models.get_mut(&key) {
            if entry.source == *source {
                entry.users += 1;
                log::debug!("model cache hit: {key}");
                return Ok(entry.handle);
            }
            log::debug!("model cache slot {key} reused by a different source, reloading");
        }

        let model_path = resolve_scene_path(scene_root, &source.path);
        let texture_path =
            (!source.texture.is_empty()).then(|| resolve_scene_path(scene_root, &source.texture));
        let parsed = loader.load_model(&model_path, texture_path.as_deref())?;
        self.load_count += 1;

        let passes = self.draw_modes.union(source.force_mode);
        let renderable = renderer.build_model(&parsed, passes);
        let handle = ModelHandle(self.next_handle);
        self.next_handle += 1;
        let entry = CachedModel {
            source: source.clone(),
            renderable,
            bounds: parsed.real_bounds(),
            passes,
            handle,
            users: 1,
        };
        log::debug!("loaded model {} as {:?}", source.path, handle);

        if let Some(previous) = self.models.insert(key.clone(), entry) {
            self.handle_keys.remove(&previous.handle);
            renderer.destroy(previous.renderable);
        }
        self.handle_keys.insert(handle, key);
        Ok(handle)
    }

    /// Resolves a handle; `None` once its entry was replaced or cleared.
    pub fn model(&self, handle: ModelHandle) -> Option<&CachedModel> {
        let key = self.handle_keys.get(&handle)?;
        self.models.get(key)
    }

    /// Drops one user of `handle`. The model stays cached with no users.
    pub fn release(&mut self, handle: ModelHandle) {
        let Some(entry) = self
            .handle_keys
            .get(&handle)
            .and_then(|key| self.models.get_mut(key))
        else {
            return;
        };
        entry.users = entry.users.saturating_sub(1);
        if entry.users == 0 {
            log::debug!("model {} has no users left", entry.source.path);
        }
    }

    /// Flag texture for `path`, uploaded once. Missing or broken files yield `None`.
    pub fn flag_texture(
        &mut self,
        path: &str,
        scene_root: &Path,
        renderer: &mut dyn Renderer,
        loader: &mut dyn TextureLoader,
    ) -> Option<TextureId> {
        if let Some(texture) = self.flag_textures.get(path) {
            return Some(*texture);
        }
        match loader.load_texture(&resolve_scene_path(scene_root, path)) {
            Ok(texture) => {
                let id = renderer.upload_texture(&texture);
                self.flag_textures.insert(path.to_string(), id);
                Some(id)
            }
            Err(err) => {
                log::warn!("flag texture unavailable: {err}");
                None
            }
        }
    }

    pub fn flag_texture_count(&self) -> usize {
        self.flag_textures.len()
    }

    pub fn cube(&mut self, renderer: &mut dyn Renderer) -> RenderableId {
        *self.cube.get_or_insert_with(|| {
            renderer.build_primitive(DefaultPrimitive::Cube {
                half_extent: CUBE_HALF_EXTENT,
            })
        })
    }

    pub fn flag(&mut self, renderer: &mut dyn Renderer) -> RenderableId {
        *self.flag.get_or_insert_with(|| {
            renderer.build_primitive(DefaultPrimitive::Flag {
                width: FLAG_WIDTH,
                height: FLAG_HEIGHT,
                offset: FLAG_OFFSET,
            })
        })
    }

    /// Stores the latest parameters read for an object.
    pub fn refresh_params(&mut self, id: ObjectId, params: ParamSet) -> &ParamSet {
        self.params.insert(id, params);
        &self.params[&id]
    }

    pub fn params(&self, id: ObjectId) -> Option<&ParamSet> {
        self.params.get(&id)
    }

    pub fn forget_params(&mut self, id: ObjectId) {
        self.params.remove(&id);
    }

    /// Releases every model, flag texture and cached parameter set.
    ///
    /// Outstanding handles stop resolving. Default primitives survive.
    pub fn clear(&mut self, renderer: &mut dyn Renderer) {
        for (_, entry) in self.models.drain() {
            renderer.destroy(entry.renderable);
        }
        for (_, texture) in self.flag_textures.drain() {
            renderer.destroy_texture(texture);
        }
        self.handle_keys.clear();
        self.params.clear();
    }

    /// [`ResourceCache::clear`] plus the default primitives.
    pub fn teardown(&mut self, renderer: &mut dyn Renderer) {
        self.clear(renderer);
        if let Some(cube) = self.cube.take() {
            renderer.destroy(cube);
        }
        if let Some(flag) = self.flag.take() {
            renderer.destroy(flag);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::headless::HeadlessRenderer;
    use std::path::PathBuf;

    /// Hands out the same triangle for every path it knows about.
    #[derive(Default)]
    struct CountingLoader {
        known: Vec<PathBuf>,
        loads: Vec<(PathBuf, Option<PathBuf>)>,
    }

    impl CountingLoader {
        fn knowing(paths: &[&str]) -> Self {
            Self {
                known: paths
                    .iter()
                    .map(|path| resolve_scene_path(Path::new("/scene"), path))
                    .collect(),
                loads: Vec::new(),
            }
        }
    }

    impl ModelLoader for CountingLoader {
        fn load_model(
            &mut self,
            path: &Path,
            texture: Option<&Path>,
        ) -> Result<ParsedModel, LoadError> {
            self.loads
                .push((path.to_path_buf(), texture.map(Path::to_path_buf)));
            if !self.known.iter().any(|known| known == path) {
                return Err(LoadError::NotFound {
                    path: path.display().to_string(),
                });
            }
            Ok(ParsedModel {
                positions: vec![[-100.0, 0.0, -100.0], [100.0, 50.0, 100.0], [0.0, 0.0, 0.0]],
                primitives: vec![Primitive {
                    kind: PrimitiveKind::Triangles,
                    indices: vec![0, 1, 2],
                    translucent: false,
                }],
                fallback_bounds: BoundingBox::default(),
                texture: None,
            })
        }
    }

    fn root() -> &'static Path {
        Path::new("/scene")
    }

    #[test]
    fn identical_sources_share_one_load() {
        let mut cache = ResourceCache::new(DrawModes::Both);
        let mut renderer = HeadlessRenderer::new();
        let mut loader = CountingLoader::knowing(&["mapobj/coin.json"]);
        let source = ModelSource::new("mapobj/coin.json");

        let first = cache
            .get_or_load(&source, root(), &mut renderer, &mut loader)
            .unwrap();
        let second = cache
            .get_or_load(&source, root(), &mut renderer, &mut loader)
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(loader.loads.len(), 1);
        assert_eq!(cache.load_count(), 1);
        assert_eq!(renderer.live_renderables(), 1);
        let model = cache.model(first).unwrap();
        assert_eq!(model.users(), 2);
        assert_eq!(model.bounds.max, [100.0, 50.0, 100.0]);
    }

    #[test]
    fn colliding_key_with_new_texture_reloads_and_invalidates() {
        let mut cache = ResourceCache::new(DrawModes::Both);
        let mut renderer = HeadlessRenderer::new();
        let mut loader = CountingLoader::knowing(&["mapobj/sky.json", "mapobj/sky.jsona"]);

        // "mapobj/sky.json" + "a" and "mapobj/sky.jsona" + "" map to the same slot.
        let textured = ModelSource::new("mapobj/sky.json").with_texture("a");
        let plain = ModelSource::new("mapobj/sky.jsona");
        assert_eq!(textured.key(), plain.key());

        let old = cache
            .get_or_load(&plain, root(), &mut renderer, &mut loader)
            .unwrap();
        let old_renderable = cache.model(old).unwrap().renderable;
        let new = cache
            .get_or_load(&textured, root(), &mut renderer, &mut loader)
            .unwrap();

        assert_ne!(old, new);
        assert!(cache.model(old).is_none());
        assert_eq!(cache.model(new).unwrap().source, textured);
        assert_eq!(loader.loads.len(), 2);
        assert_eq!(
            loader.loads[1].1.as_deref(),
            Some(Path::new("/scene/a"))
        );
        assert!(renderer.destroyed_renderables().contains(&old_renderable));
        assert_eq!(cache.model_count(), 1);
    }

    #[test]
    fn texture_override_changes_the_key() {
        let plain = ModelSource::new("mapobj/door.json");
        let textured = plain.clone().with_texture("mapobj/door_red.bmt");
        let forced = plain.clone().with_force_mode(DrawModes::Effects);
        assert_ne!(plain.key(), textured.key());
        assert_ne!(plain.key(), forced.key());
    }

    #[test]
    fn releasing_last_user_keeps_the_model_cached() {
        let mut cache = ResourceCache::new(DrawModes::Both);
        let mut renderer = HeadlessRenderer::new();
        let mut loader = CountingLoader::knowing(&["mapobj/coin.json"]);
        let source = ModelSource::new("mapobj/coin.json");
        let handle = cache
            .get_or_load(&source, root(), &mut renderer, &mut loader)
            .unwrap();
        cache
            .get_or_load(&source, root(), &mut renderer, &mut loader)
            .unwrap();

        cache.release(handle);
        assert_eq!(cache.model(handle).unwrap().users(), 1);
        cache.release(handle);
        assert_eq!(cache.model(handle).unwrap().users(), 0);
        assert_eq!(renderer.live_renderables(), 1);
        cache.release(handle);
        assert_eq!(cache.model(handle).unwrap().users(), 0);

        // Reacquiring hits the resident entry without loading again.
        let again = cache
            .get_or_load(&source, root(), &mut renderer, &mut loader)
            .unwrap();
        assert_eq!(again, handle);
        assert_eq!(cache.load_count(), 1);
        assert_eq!(cache.model(handle).unwrap().users(), 1);

        cache.clear(&mut renderer);
        assert!(cache.model(handle).is_none());
        assert_eq!(renderer.live_renderables(), 0);

        // A fresh load after clearing never reuses the old handle.
        let reloaded = cache
            .get_or_load(&source, root(), &mut renderer, &mut loader)
            .unwrap();
        assert_ne!(reloaded, handle);
        assert_eq!(cache.load_count(), 2);
    }

    #[test]
    fn load_failures_are_reported() {
        let mut cache = ResourceCache::new(DrawModes::Both);
        let mut renderer = HeadlessRenderer::new();
        let mut loader = CountingLoader::default();
        let err = cache
            .get_or_load(
                &ModelSource::new("mapobj/missing.json"),
                root(),
                &mut renderer,
                &mut loader,
            )
            .unwrap_err();
        assert!(matches!(err, LoadError::NotFound { .. }));
        assert_eq!(cache.model_count(), 0);
    }

    #[test]
    fn forced_mode_adds_to_global_passes() {
        let mut cache = ResourceCache::new(DrawModes::Normal);
        let mut renderer = HeadlessRenderer::new();
        let mut loader = CountingLoader::knowing(&["mapobj/water.json"]);
        let source = ModelSource::new("mapobj/water.json").with_force_mode(DrawModes::Effects);
        let handle = cache
            .get_or_load(&source, root(), &mut renderer, &mut loader)
            .unwrap();
        assert_eq!(cache.model(handle).unwrap().passes, DrawModes::Both);
    }

    #[test]
    fn clear_releases_everything_but_primitives() {
        let mut cache = ResourceCache::new(DrawModes::Both);
        let mut renderer = HeadlessRenderer::new();
        let mut loader = CountingLoader::knowing(&["mapobj/coin.json"]);
        let cube = cache.cube(&mut renderer);
        assert_eq!(cache.cube(&mut renderer), cube);
        let handle = cache
            .get_or_load(
                &ModelSource::new("mapobj/coin.json"),
                root(),
                &mut renderer,
                &mut loader,
            )
            .unwrap();
        cache.refresh_params(ObjectId(7), ParamSet::default());

        cache.clear(&mut renderer);
        assert!(cache.model(handle).is_none());
        assert!(cache.params(ObjectId(7)).is_none());
        assert_eq!(renderer.live_renderables(), 1);

        cache.teardown(&mut renderer);
        assert_eq!(renderer.live_renderables(), 0);
    }

    #[test]
    fn draw_mode_names_and_union() {
        assert_eq!(DrawModes::from_name("Effects"), Some(DrawModes::Effects));
        assert_eq!(DrawModes::from_name("Sparkly"), None);
        assert_eq!(DrawModes::None.union(DrawModes::Normal), DrawModes::Normal);
        assert_eq!(DrawModes::Normal.union(DrawModes::Effects), DrawModes::Both);
        assert!(DrawModes::Both.draws_effects());
        assert!(!DrawModes::Normal.draws_effects());
    }
}
