//! Preview settings, stored as JSON.
//!
//! Every field has a default so partial files load. Key bindings are
//! written as winit `KeyCode` names (`"KeyW"`, `"Digit1"`, `"Escape"`).

use crate::assets::DrawModes;
use crate::render::camera::CameraTuning;
use crate::scene::color::parse_hex_color;
use crate::scene::ObjectPalette;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read settings at {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse settings at {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid colour {value:?} for {field}")]
    Color { field: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    pub move_forward: String,
    pub move_backward: String,
    pub move_left: String,
    pub move_right: String,
    pub move_up: String,
    pub move_down: String,
    pub lock_x: String,
    pub lock_y: String,
    pub lock_z: String,
    pub cancel: String,
    pub start_drag: String,
    pub front_view: String,
    pub right_view: String,
    pub top_view: String,
    pub toggle_orthographic: String,
    pub start_flight: String,
    pub toggle_rails: String,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            move_forward: "KeyW".to_string(),
            move_backward: "KeyS".to_string(),
            move_left: "KeyA".to_string(),
            move_right: "KeyD".to_string(),
            move_up: "KeyE".to_string(),
            move_down: "KeyQ".to_string(),
            lock_x: "KeyX".to_string(),
            lock_y: "KeyY".to_string(),
            lock_z: "KeyZ".to_string(),
            cancel: "Escape".to_string(),
            start_drag: "KeyG".to_string(),
            front_view: "Digit1".to_string(),
            right_view: "Digit3".to_string(),
            top_view: "Digit7".to_string(),
            toggle_orthographic: "Digit5".to_string(),
            start_flight: "KeyP".to_string(),
            toggle_rails: "KeyR".to_string(),
        }
    }
}

/// Colours as `#RRGGBB` or `#AARRGGBB`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ColorSettings {
    pub void: String,
    pub object: String,
    pub object_selected: String,
    pub rail: String,
    pub rail_selected: String,
    pub rail_node: String,
    pub rail_node_selected: String,
}

impl Default for ColorSettings {
    fn default() -> Self {
        Self {
            void: "#000000".to_string(),
            object: "#0000FF".to_string(),
            object_selected: "#FF0000".to_string(),
            rail: "#FFFF00".to_string(),
            rail_selected: "#FF8000".to_string(),
            rail_node: "#00FF00".to_string(),
            rail_node_selected: "#00FFFF".to_string(),
        }
    }
}

/// Parsed [`ColorSettings`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub void: [f32; 4],
    pub object: [f32; 4],
    pub object_selected: [f32; 4],
    pub rail: [f32; 4],
    pub rail_selected: [f32; 4],
    pub rail_node: [f32; 4],
    pub rail_node_selected: [f32; 4],
}

impl Palette {
    pub fn objects(&self) -> ObjectPalette {
        ObjectPalette {
            object: self.object,
            selected: self.object_selected,
        }
    }
}

impl ColorSettings {
    pub fn palette(&self) -> Result<Palette, ConfigError> {
        let parse = |field: &'static str, value: &str| {
            parse_hex_color(value).ok_or_else(|| ConfigError::Color {
                field,
                value: value.to_string(),
            })
        };
        Ok(Palette {
            void: parse("void", &self.void)?,
            object: parse("object", &self.object)?,
            object_selected: parse("object_selected", &self.object_selected)?,
            rail: parse("rail", &self.rail)?,
            rail_selected: parse("rail_selected", &self.rail_selected)?,
            rail_node: parse("rail_node", &self.rail_node)?,
            rail_node_selected: parse("rail_node_selected", &self.rail_node_selected)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PreviewSettings {
    /// Units moved per free-look tick.
    pub camera_speed: f32,
    /// Forward movement follows the camera pitch.
    pub camera_move_y: bool,
    pub mouse_sensitivity: f32,
    pub wheel_dolly_scale: f32,
    pub object_draw_mode: DrawModes,
    /// Objects farther than this from the camera are skipped.
    pub draw_distance: f32,
    /// Extension appended to estimated model paths.
    pub model_extension: String,
    pub show_origin: bool,
    pub colors: ColorSettings,
    pub keys: KeyBindings,
}

impl Default for PreviewSettings {
    fn default() -> Self {
        let tuning = CameraTuning::default();
        Self {
            camera_speed: tuning.move_speed,
            camera_move_y: tuning.move_along_pitch,
            mouse_sensitivity: tuning.look_sensitivity,
            wheel_dolly_scale: tuning.dolly_scale,
            object_draw_mode: DrawModes::Both,
            draw_distance: 500_000.0,
            model_extension: "json".to_string(),
            show_origin: true,
            colors: ColorSettings::default(),
            keys: KeyBindings::default(),
        }
    }
}

impl PreviewSettings {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let settings: Self = serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        settings.colors.palette()?;
        Ok(settings)
    }

    pub fn camera_tuning(&self) -> CameraTuning {
        CameraTuning {
            move_speed: self.camera_speed,
            move_along_pitch: self.camera_move_y,
            look_sensitivity: self.mouse_sensitivity,
            dolly_scale: self.wheel_dolly_scale,
        }
    }

    /// Colours, falling back to the defaults when a value does not parse.
    pub fn palette(&self) -> Palette {
        self.colors.palette().unwrap_or_else(|err| {
            log::warn!("{err}; using default colours");
            default_palette()
        })
    }
}

fn default_palette() -> Palette {
    let opaque = |r: f32, g: f32, b: f32| [r, g, b, 1.0];
    Palette {
        void: opaque(0.0, 0.0, 0.0),
        object: opaque(0.0, 0.0, 1.0),
        object_selected: opaque(1.0, 0.0, 0.0),
        rail: opaque(1.0, 1.0, 0.0),
        rail_selected: opaque(1.0, 128.0 / 255.0, 0.0),
        rail_node: opaque(0.0, 1.0, 0.0),
        rail_node_selected: opaque(0.0, 1.0, 1.0),
    }
}
