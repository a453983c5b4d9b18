use super::model::{LoadedTexture, ParsedModel};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("file not found: {path}")]
    NotFound { path: String },
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse model {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to decode texture {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: image::ImageError,
    },
    #[error("model {path} has no primitives")]
    Empty { path: String },
}

/// Produces model geometry from a file below the scene root.
pub trait ModelLoader {
    /// `texture` is an optional texture archive overriding the model's own.
    fn load_model(&mut self, path: &Path, texture: Option<&Path>)
        -> Result<ParsedModel, LoadError>;
}

pub trait TextureLoader {
    fn load_texture(&mut self, path: &Path) -> Result<LoadedTexture, LoadError>;
}

/// Reads models stored as JSON mesh documents.
#[derive(Debug, Default)]
pub struct JsonModelLoader;

impl ModelLoader for JsonModelLoader {
    fn load_model(
        &mut self,
        path: &Path,
        texture: Option<&Path>,
    ) -> Result<ParsedModel, LoadError> {
        let json = read_existing(path)?;
        let mut model: ParsedModel =
            serde_json::from_str(&json).map_err(|source| LoadError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        if model.primitives.is_empty() {
            return Err(LoadError::Empty {
                path: path.display().to_string(),
            });
        }
        // A missing override is not an error; the model keeps its own textures.
        model.texture = texture
            .filter(|texture| texture.is_file())
            .map(|texture| texture.display().to_string());
        Ok(model)
    }
}

/// Decodes textures with the `image` crate.
#[derive(Debug, Default)]
pub struct ImageTextureLoader;

impl TextureLoader for ImageTextureLoader {
    fn load_texture(&mut self, path: &Path) -> Result<LoadedTexture, LoadError> {
        if !path.is_file() {
            return Err(LoadError::NotFound {
                path: path.display().to_string(),
            });
        }
        let image = image::open(path).map_err(|source| LoadError::Decode {
            path: path.display().to_string(),
            source,
        })?;
        let rgba = image.to_rgba8();
        Ok(LoadedTexture {
            width: rgba.width(),
            height: rgba.height(),
            rgba: rgba.into_raw(),
        })
    }
}

/// Joins a scene-relative path, accepting either separator.
pub fn resolve_scene_path(scene_root: &Path, relative: &str) -> PathBuf {
    relative
        .split(['/', '\\'])
        .filter(|part| !part.is_empty())
        .fold(scene_root.to_path_buf(), |path, part| path.join(part))
}

fn read_existing(path: &Path) -> Result<String, LoadError> {
    if !path.is_file() {
        return Err(LoadError::NotFound {
            path: path.display().to_string(),
        });
    }
    std::fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        let nonce = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!(
            "stagepreview_{}_{}_{}",
            std::process::id(),
            nonce,
            name
        ))
    }

    #[test]
    fn scene_paths_accept_both_separators() {
        let root = Path::new("/levels/bianco0");
        assert_eq!(
            resolve_scene_path(root, "mapobj\\coin.bti"),
            Path::new("/levels/bianco0/mapobj/coin.bti")
        );
        assert_eq!(
            resolve_scene_path(root, "mapobj/coin.json"),
            Path::new("/levels/bianco0/mapobj/coin.json")
        );
    }

    #[test]
    fn missing_model_is_not_found() {
        let mut loader = JsonModelLoader;
        let err = loader
            .load_model(&temp_path("missing.json"), None)
            .unwrap_err();
        assert!(matches!(err, LoadError::NotFound { .. }));
    }

    #[test]
    fn json_model_loads_and_ignores_missing_texture() {
        let path = temp_path("model.json");
        std::fs::write(
            &path,
            r#"{
                "positions": [[0,0,0],[10,0,0],[0,10,0]],
                "primitives": [{"kind": "triangles", "indices": [0,1,2]}]
            }"#,
        )
        .unwrap();
        let mut loader = JsonModelLoader;
        let model = loader
            .load_model(&path, Some(&temp_path("nope.bmt")))
            .unwrap();
        assert_eq!(model.positions.len(), 3);
        assert_eq!(model.texture, None);
        assert!(!model.primitives[0].translucent);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn model_without_primitives_is_rejected() {
        let path = temp_path("empty.json");
        std::fs::write(&path, r#"{"positions": [], "primitives": []}"#).unwrap();
        let err = JsonModelLoader.load_model(&path, None).unwrap_err();
        assert!(matches!(err, LoadError::Empty { .. }));
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn texture_loader_decodes_png() {
        let path = temp_path("flag.png");
        let image = image::RgbaImage::from_pixel(2, 3, image::Rgba([255, 0, 0, 255]));
        image.save(&path).unwrap();
        let texture = ImageTextureLoader.load_texture(&path).unwrap();
        assert_eq!((texture.width, texture.height), (2, 3));
        assert_eq!(texture.rgba.len(), 2 * 3 * 4);
        let _ = std::fs::remove_file(path);
    }
}
