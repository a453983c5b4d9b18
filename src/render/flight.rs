//! Camera fly-through driven by a demo animation.

use super::camera::CameraRig;
use crate::animation::DemoAnimation;

/// Flight ticks per second; one animation frame per tick.
pub const FLIGHT_TICK_HZ: f32 = 200.0;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScriptedFlight {
    frame: f32,
    finished: bool,
}

impl ScriptedFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Animation frame applied by the next tick.
    pub fn frame(&self) -> f32 {
        self.frame
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Applies the current frame and advances. Returns false once playback is over.
    pub fn tick(&mut self, demo: &DemoAnimation, camera: &mut CameraRig) -> bool {
        if self.finished {
            return false;
        }
        if self.frame > demo.duration() {
            self.finished = true;
            camera.end_flight();
            log::info!("scripted flight finished after {} frames", self.frame);
            return false;
        }
        camera.apply_flight_pose(
            demo.camera_position(self.frame),
            demo.target(self.frame),
            demo.roll_deg(self.frame).to_radians(),
            demo.field_of_view_deg(self.frame),
        );
        self.frame += 1.0;
        true
    }
}
