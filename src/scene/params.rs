//! Object parameters and the editor collaborator interface.

/// Stable identity of a placed object, assigned by the scene document.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct ObjectId(pub u64);

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Ordered key/value parameters of one object.
///
/// Values are kept as text; numeric readers decide how to treat bad input.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ParamSet {
    entries: Vec<(String, String)>,
}

impl ParamSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut params = Self::new();
        for (key, value) in pairs {
            params.set(key, value);
        }
        params
    }

    /// Inserts or overwrites, keeping the original position of an existing key.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(existing, _)| existing == key)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value.as_str())
    }

    /// Value of `key`, or an empty string when absent.
    pub fn get_or_empty(&self, key: &str) -> &str {
        self.get(key).unwrap_or("")
    }

    /// Strict numeric read: `None` when absent or unparsable.
    pub fn parse_f32(&self, key: &str) -> Option<f32> {
        self.get(key)?.trim().parse().ok()
    }

    /// Lenient numeric read: absent or unparsable values read as zero.
    pub fn get_f32(&self, key: &str) -> f32 {
        self.parse_f32(key).unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Read/write access to the parameters of placed objects.
pub trait ParameterStore {
    fn object_ids(&self) -> Vec<ObjectId>;
    fn object_name(&self, id: ObjectId) -> Option<String>;
    fn read_parameters(&self, id: ObjectId) -> Option<ParamSet>;
    /// Returns false when the object or key does not exist.
    fn set_value(&mut self, id: ObjectId, key: &str, value: &str) -> bool;
}

/// The editor hosting the scene document.
pub trait SceneEditor: ParameterStore {
    fn create_undo_snapshot(&mut self);
    /// Restores the latest snapshot. Returns false when there was none.
    fn undo(&mut self) -> bool;
    fn mark_changed(&mut self);
    fn go_to_object(&mut self, id: ObjectId);
    fn update_object_info(&mut self, id: ObjectId);
    fn refresh_rail_panel(&mut self, rail: usize, waypoint: usize);
}
