//! Keyframed joint animation with linear interpolation.
//!
//! Demo animations drive the scripted camera: joint 0 is the point the
//! camera looks at, joint 1 is the camera position relative to it.

use crate::render::camera::DEFAULT_FOV_DEG;
use glam::{Mat3, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Keyframe {
    pub time: f32,
    pub value: f32,
}

impl Keyframe {
    pub fn new(time: f32, value: f32) -> Self {
        Self { time, value }
    }
}

/// One animated scalar.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
#[serde(from = "Vec<Keyframe>", into = "Vec<Keyframe>")]
pub struct Channel {
    keys: Vec<Keyframe>,
}

impl From<Vec<Keyframe>> for Channel {
    fn from(keys: Vec<Keyframe>) -> Self {
        Self::new(keys)
    }
}

impl From<Channel> for Vec<Keyframe> {
    fn from(channel: Channel) -> Self {
        channel.keys
    }
}

impl Channel {
    /// Keys are sorted by time.
    pub fn new(mut keys: Vec<Keyframe>) -> Self {
        keys.retain(|key| key.time.is_finite());
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { keys }
    }

    pub fn constant(value: f32) -> Self {
        Self::new(vec![Keyframe::new(0.0, value)])
    }

    pub fn keys(&self) -> &[Keyframe] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Time of the last key.
    pub fn duration(&self) -> f32 {
        self.keys.last().map(|key| key.time).unwrap_or(0.0)
    }

    /// Linear sample clamped to the first and last key; `None` without keys.
    pub fn sample(&self, time: f32) -> Option<f32> {
        let first = self.keys.first()?;
        let last = self.keys.last()?;
        if time <= first.time {
            return Some(first.value);
        }
        if time >= last.time {
            return Some(last.value);
        }

        let next = self.keys.partition_point(|key| key.time <= time);
        let a = self.keys[next - 1];
        let b = self.keys[next];
        let span = b.time - a.time;
        if span <= f32::EPSILON {
            return Some(b.value);
        }
        let t = (time - a.time) / span;
        Some(a.value + (b.value - a.value) * t)
    }
}

/// Independent x/y/z channels.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct AxisChannels {
    #[serde(default)]
    pub x: Channel,
    #[serde(default)]
    pub y: Channel,
    #[serde(default)]
    pub z: Channel,
}

impl AxisChannels {
    pub fn new(x: Channel, y: Channel, z: Channel) -> Self {
        Self { x, y, z }
    }

    pub fn sample(&self, time: f32, default: f32) -> Vec3 {
        Vec3::new(
            self.x.sample(time).unwrap_or(default),
            self.y.sample(time).unwrap_or(default),
            self.z.sample(time).unwrap_or(default),
        )
    }

    pub fn duration(&self) -> f32 {
        self.x.duration().max(self.y.duration()).max(self.z.duration())
    }

    /// Sorted, de-duplicated key times across the three axes.
    pub fn key_times(&self) -> Vec<f32> {
        let mut times: Vec<f32> = [&self.x, &self.y, &self.z]
            .into_iter()
            .flat_map(|channel| channel.keys().iter().map(|key| key.time))
            .collect();
        times.sort_by(f32::total_cmp);
        times.dedup();
        times
    }
}

/// Samples a joint's transform at a point in time (animation frames).
pub trait JointSampler {
    fn position(&self, time: f32) -> Vec3;
    /// Degrees.
    fn rotation(&self, time: f32) -> Vec3;
    fn scale(&self, time: f32) -> Vec3;
    /// Largest key time across all channels.
    fn duration(&self) -> f32;
}

#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct JointAnimation {
    #[serde(default)]
    pub translation: AxisChannels,
    #[serde(default)]
    pub rotation: AxisChannels,
    #[serde(default)]
    pub scale: AxisChannels,
}

impl JointSampler for JointAnimation {
    fn position(&self, time: f32) -> Vec3 {
        self.translation.sample(time, 0.0)
    }

    fn rotation(&self, time: f32) -> Vec3 {
        self.rotation.sample(time, 0.0)
    }

    fn scale(&self, time: f32) -> Vec3 {
        self.scale.sample(time, 1.0)
    }

    fn duration(&self) -> f32 {
        self.translation
            .duration()
            .max(self.rotation.duration())
            .max(self.scale.duration())
    }
}

/// Camera fly-through recorded as two joints.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct DemoAnimation {
    pub look_at: JointAnimation,
    pub look_from: JointAnimation,
}

impl DemoAnimation {
    /// Playback length, taken from the look-at joint.
    pub fn duration(&self) -> f32 {
        self.look_at.duration()
    }

    pub fn target(&self, time: f32) -> Vec3 {
        self.look_at.position(time)
    }

    /// Camera position: the look-from offset orbited and scaled by the look-at joint.
    pub fn camera_position(&self, time: f32) -> Vec3 {
        let at = self.look_at.position(time);
        let rotation = self.look_at.rotation(time) * (std::f32::consts::PI / 180.0);
        let orbit = Mat3::from_rotation_x(-rotation.x)
            * Mat3::from_rotation_y(rotation.y)
            * Mat3::from_rotation_z(rotation.z)
            * Mat3::from_diagonal(self.look_at.scale(time));
        at + orbit * self.look_from.position(time)
    }

    /// Camera roll in degrees, the look-from joint's X rotation.
    pub fn roll_deg(&self, time: f32) -> f32 {
        self.look_from.rotation(time).x
    }

    /// Field of view in degrees, stored in the look-from joint's Y scale.
    /// Without that channel the default field of view is used.
    pub fn field_of_view_deg(&self, time: f32) -> f32 {
        self.look_from
            .scale
            .y
            .sample(time)
            .unwrap_or(DEFAULT_FOV_DEG)
    }

    /// Key times of the look-at position.
    pub fn key_times(&self) -> Vec<f32> {
        self.look_at.translation.key_times()
    }

    /// (target, camera) positions at every key time.
    pub fn path_points(&self) -> Vec<(Vec3, Vec3)> {
        self.key_times()
            .into_iter()
            .map(|time| (self.target(time), self.camera_position(time)))
            .collect()
    }
}
