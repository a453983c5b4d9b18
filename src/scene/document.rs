//! In-memory scene document with snapshot undo.
//!
//! Stands in for the hosting editor when the preview runs on its own:
//! it stores object parameters, keeps a bounded undo stack and records
//! the editor notifications it receives.

use super::params::{ObjectId, ParamSet, ParameterStore, SceneEditor};

const MAX_UNDO_DEPTH: usize = 100;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DocumentObject {
    pub id: ObjectId,
    pub name: String,
    pub params: ParamSet,
}

#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct MemoryDocument {
    objects: Vec<DocumentObject>,
    #[serde(skip)]
    undo: Vec<Vec<DocumentObject>>,
    #[serde(skip)]
    changed: bool,
    #[serde(skip)]
    focused: Option<ObjectId>,
    #[serde(skip)]
    info_object: Option<ObjectId>,
    #[serde(skip)]
    rail_panel: Option<(usize, usize)>,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an object with the next free id.
    pub fn add_object(&mut self, name: impl Into<String>, params: ParamSet) -> ObjectId {
        let id = ObjectId(
            self.objects
                .iter()
                .map(|object| object.id.0 + 1)
                .max()
                .unwrap_or(1),
        );
        self.objects.push(DocumentObject {
            id,
            name: name.into(),
            params,
        });
        id
    }

    pub fn remove_object(&mut self, id: ObjectId) -> Option<DocumentObject> {
        let index = self.objects.iter().position(|object| object.id == id)?;
        Some(self.objects.remove(index))
    }

    pub fn objects(&self) -> &[DocumentObject] {
        &self.objects
    }

    fn object(&self, id: ObjectId) -> Option<&DocumentObject> {
        self.objects.iter().find(|object| object.id == id)
    }

    pub fn is_changed(&self) -> bool {
        self.changed
    }

    pub fn clear_changed(&mut self) {
        self.changed = false;
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    /// Object most recently passed to `go_to_object`.
    pub fn focused(&self) -> Option<ObjectId> {
        self.focused
    }

    /// Object most recently passed to `update_object_info`.
    pub fn info_object(&self) -> Option<ObjectId> {
        self.info_object
    }

    pub fn rail_panel(&self) -> Option<(usize, usize)> {
        self.rail_panel
    }
}

impl ParameterStore for MemoryDocument {
    fn object_ids(&self) -> Vec<ObjectId> {
        self.objects.iter().map(|object| object.id).collect()
    }

    fn object_name(&self, id: ObjectId) -> Option<String> {
        self.object(id).map(|object| object.name.clone())
    }

    fn read_parameters(&self, id: ObjectId) -> Option<ParamSet> {
        self.object(id).map(|object| object.params.clone())
    }

    fn set_value(&mut self, id: ObjectId, key: &str, value: &str) -> bool {
        let Some(object) = self.objects.iter_mut().find(|object| object.id == id) else {
            return false;
        };
        if !object.params.contains_key(key) {
            return false;
        }
        object.params.set(key, value);
        true
    }
}

impl SceneEditor for MemoryDocument {
    fn create_undo_snapshot(&mut self) {
        self.undo.push(self.objects.clone());
        if self.undo.len() > MAX_UNDO_DEPTH {
            self.undo.remove(0);
        }
    }

    fn undo(&mut self) -> bool {
        match self.undo.pop() {
            Some(snapshot) => {
                self.objects = snapshot;
                self.changed = true;
                true
            }
            None => false,
        }
    }

    fn mark_changed(&mut self) {
        self.changed = true;
    }

    fn go_to_object(&mut self, id: ObjectId) {
        self.focused = Some(id);
    }

    fn update_object_info(&mut self, id: ObjectId) {
        self.info_object = Some(id);
    }

    fn refresh_rail_panel(&mut self, rail: usize, waypoint: usize) {
        self.rail_panel = Some((rail, waypoint));
    }
}
