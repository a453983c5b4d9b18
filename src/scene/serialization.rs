use crate::animation::DemoAnimation;
use crate::scene::{MemoryDocument, RailSet};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SerializationError>;

fn save_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json)?;
    Ok(())
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let json = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

pub fn save_document_to_file(document: &MemoryDocument, path: &Path) -> Result<()> {
    save_json(document, path)
}

pub fn load_document_from_file(path: &Path) -> Result<MemoryDocument> {
    load_json(path)
}

pub fn save_rails_to_file(rails: &RailSet, path: &Path) -> Result<()> {
    save_json(rails, path)
}

pub fn load_rails_from_file(path: &Path) -> Result<RailSet> {
    load_json(path)
}

pub fn load_demo_from_file(path: &Path) -> Result<DemoAnimation> {
    load_json(path)
}

#[cfg(test)]
mod tests {
    use crate::scene::{
        MemoryDocument, ParamSet, ParameterStore, Rail, RailSet, RailWaypoint, SceneEditor,
    };

    fn temp_file(label: &str) -> std::path::PathBuf {
        let mut path = std::env::temp_dir();
        let nonce = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        path.push(format!(
            "stagepreview_{}_{}_{}.json",
            label,
            std::process::id(),
            nonce
        ));
        path
    }

    #[test]
    fn test_empty_document_serialization() {
        let document = MemoryDocument::new();
        let json = serde_json::to_string_pretty(&document).unwrap();
        let loaded: MemoryDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded.objects().len(), 0);
    }

    #[test]
    fn test_editor_state_is_not_serialized() {
        let mut document = MemoryDocument::new();
        let id = document.add_object(
            "Coin",
            ParamSet::from_pairs([("X", "1"), ("Y", "2"), ("Z", "3")]),
        );
        document.create_undo_snapshot();
        document.go_to_object(id);
        document.mark_changed();

        let json = serde_json::to_string_pretty(&document).unwrap();
        assert!(!json.contains("undo"));
        assert!(!json.contains("focused"));

        let loaded: MemoryDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded.undo_depth(), 0);
        assert!(!loaded.is_changed());
        assert_eq!(loaded.read_parameters(id).unwrap().get("Y"), Some("2"));
    }

    #[test]
    fn test_save_load_stress_loop_via_file() {
        let mut document = MemoryDocument::new();
        document.add_object(
            "Coin",
            ParamSet::from_pairs([("X", "1"), ("Y", "2"), ("Z", "3"), ("Model", "coin")]),
        );
        document.add_object(
            "Door",
            ParamSet::from_pairs([("X", "-5"), ("Y", "0"), ("Z", "12.5")]),
        );

        let path = temp_file("document");
        for _ in 0..50 {
            super::save_document_to_file(&document, &path).unwrap();
            document = super::load_document_from_file(&path).unwrap();
            assert_eq!(document.objects().len(), 2);
            assert_eq!(document.objects()[0].params.get("Model"), Some("coin"));
        }

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_rails_roundtrip_via_file() {
        let mut start = RailWaypoint::at(0, 100, -200);
        start.connect(1);
        let rails = RailSet::new(vec![Rail {
            name: "path_a".to_string(),
            waypoints: vec![start, RailWaypoint::at(300, 100, -200)],
        }]);
        let path = temp_file("rails");
        super::save_rails_to_file(&rails, &path).unwrap();
        let loaded = super::load_rails_from_file(&path).unwrap();
        assert_eq!(loaded, rails);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_demo_with_missing_channels_loads() {
        let path = temp_file("demo");
        std::fs::write(
            &path,
            r#"{
                "look_at": {"translation": {"x": [{"time": 0, "value": 10}]}},
                "look_from": {}
            }"#,
        )
        .unwrap();
        let demo = super::load_demo_from_file(&path).unwrap();
        assert_eq!(demo.target(0.0).x, 10.0);
        assert_eq!(demo.field_of_view_deg(0.0), crate::render::camera::DEFAULT_FOV_DEG);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = super::load_rails_from_file(&temp_file("missing")).unwrap_err();
        assert!(matches!(err, super::SerializationError::Io(_)));
    }
}
