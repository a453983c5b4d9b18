//! Rails: named paths of connected waypoints.

use glam::Vec3;

pub const MAX_CONNECTIONS: usize = 8;
/// Half extent of the box drawn and picked around every waypoint.
pub const WAYPOINT_HALF_EXTENT: f32 = 64.0;

#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct RailWaypoint {
    pub x: i16,
    pub y: i16,
    pub z: i16,
    #[serde(default)]
    pub pitch: i16,
    #[serde(default)]
    pub yaw: i16,
    #[serde(default)]
    pub roll: i16,
    #[serde(default)]
    pub connection_count: u8,
    #[serde(default)]
    pub connections: [i16; MAX_CONNECTIONS],
}

impl RailWaypoint {
    pub fn at(x: i16, y: i16, z: i16) -> Self {
        Self {
            x,
            y,
            z,
            ..Self::default()
        }
    }

    pub fn position(&self) -> Vec3 {
        Vec3::new(self.x as f32, self.y as f32, self.z as f32)
    }

    /// Rounds and clamps to the i16 range.
    pub fn set_position(&mut self, position: Vec3) {
        self.x = saturate_i16(position.x);
        self.y = saturate_i16(position.y);
        self.z = saturate_i16(position.z);
    }

    /// Rotation in degrees as (pitch, yaw, roll).
    pub fn rotation_deg(&self) -> Vec3 {
        Vec3::new(self.pitch as f32, self.yaw as f32, self.roll as f32)
    }

    pub fn connect(&mut self, target: i16) -> bool {
        let count = self.connection_count as usize;
        if count >= MAX_CONNECTIONS {
            return false;
        }
        self.connections[count] = target;
        self.connection_count += 1;
        true
    }

    /// Connection targets that exist in a rail of `frame_count` waypoints.
    pub fn valid_connections(&self, frame_count: usize) -> impl Iterator<Item = usize> + '_ {
        let count = (self.connection_count as usize).min(MAX_CONNECTIONS);
        self.connections[..count]
            .iter()
            .filter_map(move |&target| {
                usize::try_from(target)
                    .ok()
                    .filter(|&target| target < frame_count)
            })
    }
}

fn saturate_i16(value: f32) -> i16 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(i16::MIN as f32, i16::MAX as f32) as i16
}

#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct Rail {
    pub name: String,
    pub waypoints: Vec<RailWaypoint>,
}

impl Rail {
    /// Line segments between each waypoint and its valid connections.
    pub fn segments(&self) -> Vec<(Vec3, Vec3)> {
        let count = self.waypoints.len();
        self.waypoints
            .iter()
            .flat_map(|waypoint| {
                waypoint.valid_connections(count).map(move |target| {
                    (waypoint.position(), self.waypoints[target].position())
                })
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct RailSet {
    rails: Vec<Rail>,
}

impl RailSet {
    pub fn new(rails: Vec<Rail>) -> Self {
        Self { rails }
    }

    pub fn all_rails(&self) -> &[Rail] {
        &self.rails
    }

    pub fn rail(&self, index: usize) -> Option<&Rail> {
        self.rails.get(index)
    }

    pub fn rail_mut(&mut self, index: usize) -> Option<&mut Rail> {
        self.rails.get_mut(index)
    }

    pub fn waypoint(&self, rail: usize, waypoint: usize) -> Option<&RailWaypoint> {
        self.rail(rail)?.waypoints.get(waypoint)
    }

    pub fn waypoint_mut(&mut self, rail: usize, waypoint: usize) -> Option<&mut RailWaypoint> {
        self.rail_mut(rail)?.waypoints.get_mut(waypoint)
    }
}
