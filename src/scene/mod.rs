pub mod color;
pub mod document;
pub mod params;
pub mod rails;
pub mod serialization;

pub use document::{DocumentObject, MemoryDocument};
pub use params::{ObjectId, ParamSet, ParameterStore, SceneEditor};
pub use rails::{Rail, RailSet, RailWaypoint};

use crate::assets::{
    BoundingBox, DrawModes, ModelHandle, ModelLoader, ModelSource, ResourceCache, TextureLoader,
    CUBE_HALF_EXTENT, FLAG_HEIGHT, FLAG_OFFSET, FLAG_WIDTH,
};
use crate::geometry::compose_transform;
use crate::render::{DrawCall, PickKey, PickTarget, Renderer, TextureId};
use glam::{Mat4, Vec3};
use std::collections::BTreeMap;
use std::path::Path;

/// What a proxy draws.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Renderable {
    /// Not drawable.
    None,
    /// Placeholder cube; no model resolved or the load failed.
    Cube,
    Model(ModelHandle),
    Flag { texture: Option<TextureId> },
}

/// Everything needed to turn parameters into geometry.
pub struct ModelContext<'a> {
    pub cache: &'a mut ResourceCache,
    pub renderer: &'a mut dyn Renderer,
    pub models: &'a mut dyn ModelLoader,
    pub textures: &'a mut dyn TextureLoader,
    pub scene_root: &'a Path,
    pub model_extension: &'a str,
}

/// Colours used for objects that do not carry their own.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectPalette {
    pub object: [f32; 4],
    pub selected: [f32; 4],
}

/// Renderable stand-in for one placed object.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneObjectProxy {
    id: ObjectId,
    name: String,
    pub position: Vec3,
    /// Degrees, applied X then Y then Z.
    pub rotation_deg: Vec3,
    pub scale: Vec3,
    pub color: [f32; 4],
    pub selected: bool,
    drawable: bool,
    renderable: Renderable,
    bounds: BoundingBox,
}

impl SceneObjectProxy {
    pub fn new(id: ObjectId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            position: Vec3::ZERO,
            rotation_deg: Vec3::ZERO,
            scale: Vec3::ONE,
            color: color::WHITE,
            selected: false,
            drawable: false,
            renderable: Renderable::None,
            bounds: BoundingBox::cube(CUBE_HALF_EXTENT),
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_drawable(&self) -> bool {
        self.drawable
    }

    pub fn renderable(&self) -> Renderable {
        self.renderable
    }

    /// Local, unscaled bounds.
    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    /// Re-reads the transform and colour. Returns whether the object can be drawn.
    pub fn update(&mut self, params: &ParamSet) -> bool {
        let position = (
            params.parse_f32("X"),
            params.parse_f32("Y"),
            params.parse_f32("Z"),
        );
        let (Some(x), Some(y), Some(z)) = position else {
            self.drawable = false;
            return false;
        };
        self.position = Vec3::new(x, y, z);
        self.drawable = true;

        self.rotation_deg = read_triple(params, ["Pitch", "Yaw", "Roll"])
            .or_else(|| read_triple(params, ["RotationX", "RotationY", "RotationZ"]))
            .unwrap_or(Vec3::ZERO);
        self.scale = read_triple(params, ["ScaleX", "ScaleY", "ScaleZ"]).unwrap_or(Vec3::ONE);
        self.color = params
            .get("DisplayColor")
            .map(color::parse_display_color)
            .unwrap_or(color::WHITE);
        true
    }

    /// Updates the transform and resolves the renderable through the cache.
    pub fn generate_model(&mut self, params: &ParamSet, ctx: &mut ModelContext<'_>) {
        let previous = self.renderable;
        self.renderable = if self.update(params) {
            self.resolve_renderable(params, ctx)
        } else {
            Renderable::None
        };
        // Release after acquiring so an unchanged model never drops to zero users.
        if let Renderable::Model(handle) = previous {
            ctx.cache.release(handle);
        }
    }

    fn resolve_renderable(&mut self, params: &ParamSet, ctx: &mut ModelContext<'_>) -> Renderable {
        let model = params.get_or_empty("Model");
        let flag_key = format!("{model}_flag");
        let is_flag = params.contains_key("FlagTexture")
            || params.contains_key(&flag_key)
            || params.get_or_empty("Flag").eq_ignore_ascii_case("true");
        if is_flag {
            let texture_path = params
                .get(&flag_key)
                .or_else(|| params.get("FlagTexture"))
                .map(str::to_string)
                .unwrap_or_else(|| format!("mapobj/{}.bti", model.to_lowercase()));
            let texture =
                ctx.cache
                    .flag_texture(&texture_path, ctx.scene_root, ctx.renderer, ctx.textures);
            self.bounds = BoundingBox::new(
                Vec3::new(FLAG_OFFSET - 1.0, 0.0, 0.0),
                Vec3::new(FLAG_OFFSET + 1.0, FLAG_HEIGHT, FLAG_WIDTH),
            );
            return Renderable::Flag { texture };
        }

        let Some(source) = model_source(params, model, ctx.model_extension) else {
            self.bounds = BoundingBox::cube(CUBE_HALF_EXTENT);
            return Renderable::Cube;
        };
        match ctx
            .cache
            .get_or_load(&source, ctx.scene_root, ctx.renderer, ctx.models)
        {
            Ok(handle) => {
                self.bounds = ctx
                    .cache
                    .model(handle)
                    .map(|cached| cached.bounds)
                    .unwrap_or_else(|| BoundingBox::cube(CUBE_HALF_EXTENT));
                Renderable::Model(handle)
            }
            Err(err) => {
                log::warn!("{} {}: falling back to cube: {err}", self.name, self.id);
                self.bounds = BoundingBox::cube(CUBE_HALF_EXTENT);
                Renderable::Cube
            }
        }
    }

    /// Gives the model back to the cache, which keeps it resident.
    pub fn release(&mut self, cache: &mut ResourceCache) {
        if let Renderable::Model(handle) = self.renderable {
            cache.release(handle);
        }
        self.renderable = Renderable::None;
    }

    pub fn world_matrix(&self) -> Mat4 {
        compose_transform(self.position, self.rotation_deg, self.scale)
    }

    pub fn pick_target(&self) -> Option<PickTarget> {
        self.drawable.then(|| PickTarget {
            key: PickKey::Object(self.id),
            pivot: self.position,
            bounds: self.bounds.scaled(self.scale),
            rotation_deg: self.rotation_deg,
        })
    }

    /// Builds this frame's draw call, or `None` when not drawable.
    pub fn draw_call(
        &self,
        cache: &mut ResourceCache,
        renderer: &mut dyn Renderer,
        palette: &ObjectPalette,
    ) -> Option<DrawCall> {
        if !self.drawable {
            return None;
        }
        let outline = self.selected.then_some((self.bounds, palette.selected));
        let cube_color = if self.selected {
            palette.selected
        } else {
            palette.object
        };
        let transform = self.world_matrix();
        let call = match self.renderable {
            Renderable::None => return None,
            Renderable::Model(handle) => match cache.model(handle) {
                Some(model) => DrawCall {
                    renderable: model.renderable,
                    transform,
                    color: self.color,
                    texture: None,
                    passes: model.passes,
                    outline,
                },
                None => cube_call(cache, renderer, transform, cube_color),
            },
            Renderable::Cube => cube_call(cache, renderer, transform, cube_color),
            Renderable::Flag { texture } => DrawCall {
                renderable: cache.flag(renderer),
                transform,
                color: self.color,
                texture,
                passes: DrawModes::Both,
                outline,
            },
        };
        Some(call)
    }
}

fn cube_call(
    cache: &mut ResourceCache,
    renderer: &mut dyn Renderer,
    transform: Mat4,
    color: [f32; 4],
) -> DrawCall {
    DrawCall {
        renderable: cache.cube(renderer),
        transform,
        color,
        texture: None,
        passes: DrawModes::Normal,
        outline: None,
    }
}

/// All three keys present; each value parse-or-zero.
fn read_triple(params: &ParamSet, keys: [&str; 3]) -> Option<Vec3> {
    keys.iter()
        .all(|key| params.contains_key(key))
        .then(|| Vec3::new(params.get_f32(keys[0]), params.get_f32(keys[1]), params.get_f32(keys[2])))
}

/// Resolves which model file, texture and forced mode an object uses.
fn model_source(params: &ParamSet, model: &str, extension: &str) -> Option<ModelSource> {
    let path = match params.get("DisplayModel") {
        Some(display) => display.to_lowercase(),
        None if model.is_empty() => return None,
        None => match params.get(model) {
            Some(named) => named.to_lowercase(),
            None => format!("mapobj/{}.{}", model.to_lowercase(), extension),
        },
    };
    let texture = params
        .get("DisplayTexture")
        .or_else(|| params.get(&format!("{model}_tex")))
        .map(str::to_lowercase)
        .unwrap_or_default();
    let force_mode = params
        .get("ForceDrawMode")
        .or_else(|| params.get(&format!("{path}_mode")))
        .and_then(DrawModes::from_name)
        .unwrap_or(DrawModes::None);
    Some(
        ModelSource::new(path)
            .with_texture(texture)
            .with_force_mode(force_mode),
    )
}

/// Proxies for every placed object, keyed by id.
#[derive(Debug, Default)]
pub struct SceneRuntime {
    proxies: BTreeMap<ObjectId, SceneObjectProxy>,
}

impl SceneRuntime {
    pub fn new() -> Self {
        Self {
            proxies: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, proxy: SceneObjectProxy) -> Option<SceneObjectProxy> {
        self.proxies.insert(proxy.id(), proxy)
    }

    pub fn remove(&mut self, id: ObjectId) -> Option<SceneObjectProxy> {
        self.proxies.remove(&id)
    }

    pub fn get(&self, id: ObjectId) -> Option<&SceneObjectProxy> {
        self.proxies.get(&id)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut SceneObjectProxy> {
        self.proxies.get_mut(&id)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.proxies.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SceneObjectProxy> {
        self.proxies.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut SceneObjectProxy> {
        self.proxies.values_mut()
    }

    pub fn ids(&self) -> Vec<ObjectId> {
        self.proxies.keys().copied().collect()
    }

    /// Ids of every proxy whose object carries `name`.
    pub fn ids_named(&self, name: &str) -> Vec<ObjectId> {
        self.proxies
            .values()
            .filter(|proxy| proxy.name() == name)
            .map(SceneObjectProxy::id)
            .collect()
    }

    pub fn pick_targets(&self) -> Vec<PickTarget> {
        self.proxies
            .values()
            .filter_map(SceneObjectProxy::pick_target)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }

    /// Removes every proxy, returning them so their models can be released.
    pub fn drain(&mut self) -> Vec<SceneObjectProxy> {
        std::mem::take(&mut self.proxies).into_values().collect()
    }
}
