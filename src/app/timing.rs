use std::time::{Duration, Instant};
use winit::window::Window;

pub struct FrameTiming {
    last_frame_time: Option<Instant>,
    last_fps_time: Instant,
    frame_count: u32,
    pub frame_dt: f32,
    base_title: String,
    status: String,
}

impl FrameTiming {
    pub fn new(base_title: String) -> Self {
        Self {
            last_frame_time: None,
            last_fps_time: Instant::now(),
            frame_count: 0,
            frame_dt: 1.0 / 60.0,
            base_title,
            status: String::new(),
        }
    }

    /// Text shown after the title, e.g. camera position and selection.
    pub fn set_status(&mut self, status: String) {
        self.status = status;
    }

    /// Measures the frame and refreshes the title twice a second.
    pub fn update(&mut self, window: Option<&Window>, now: Instant) {
        let dt_duration = if let Some(last) = self.last_frame_time {
            now.saturating_duration_since(last)
        } else {
            Duration::from_millis(16)
        };
        self.last_frame_time = Some(now);
        self.frame_dt = dt_duration.as_secs_f32().max(0.0);

        self.frame_count = self.frame_count.saturating_add(1);
        let elapsed = now.saturating_duration_since(self.last_fps_time);
        if elapsed.as_secs_f32() >= 0.5 {
            let fps = self.frame_count as f32 / elapsed.as_secs_f32();
            if let Some(window) = window {
                window.set_title(&self.title(fps));
            }
            self.frame_count = 0;
            self.last_fps_time = now;
        }
    }

    fn title(&self, fps: f32) -> String {
        if self.status.is_empty() {
            format!("{} - {:.1} fps", self.base_title, fps)
        } else {
            format!("{} - {} - {:.1} fps", self.base_title, self.status, fps)
        }
    }
}
