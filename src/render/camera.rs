use crate::render::{RenderStates, Scene};
use macroquad::prelude::*;

/// A view on the world that can trail a target and stay inside limits.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    view: Rect,
    /// Screen area in fractions of the window, the whole window when unset.
    viewport: Option<Rect>,
    frames_delay: u32,
    limits: Option<Rect>,
}

impl Camera {
    /// A camera showing `view`, following targets exactly.
    pub fn new(view: Rect) -> Self {
        Camera {
            view,
            viewport: None,
            frames_delay: 1,
            limits: None,
        }
    }

    /// Center of the view.
    pub fn center(&self) -> Vec2 {
        self.view.center()
    }

    /// Recenters the view, then applies limits.
    pub fn set_center(&mut self, center: Vec2) {
        self.view.x = center.x - self.view.w / 2.0;
        self.view.y = center.y - self.view.h / 2.0;
        self.clamp_to_limits();
    }

    /// Shifts the center by `offset`.
    pub fn move_by(&mut self, offset: Vec2) {
        self.set_center(self.center() + offset);
    }

    /// Size of the view in world units.
    pub fn size(&self) -> Vec2 {
        self.view.size()
    }

    /// Resizes around the current center.
    pub fn set_size(&mut self, size: Vec2) {
        let center = self.center();
        self.view.w = size.x;
        self.view.h = size.y;
        self.set_center(center);
    }

    /// Screen area in fractions of the window.
    pub fn viewport(&self) -> Option<Rect> {
        self.viewport
    }

    /// Sets the screen area; `None` means the whole window.
    pub fn set_viewport(&mut self, viewport: Option<Rect>) {
        self.viewport = viewport;
    }

    /// Frames needed to catch up with a target.
    pub fn frames_delay(&self) -> u32 {
        self.frames_delay
    }

    /// Frames needed to catch up with a target. 0 is treated as 1.
    pub fn set_frames_delay(&mut self, frames: u32) {
        self.frames_delay = frames.max(1);
    }

    /// World area the view is kept inside.
    pub fn limits(&self) -> Option<Rect> {
        self.limits
    }

    /// Sets or clears the limits and applies them now.
    pub fn set_limits(&mut self, limits: Option<Rect>) {
        self.limits = limits;
        self.clamp_to_limits();
    }

    /// Moves toward `target` by a `1 / frames_delay` step, then applies limits.
    pub fn update(&mut self, target: Option<Vec2>) {
        if let Some(target) = target {
            let center = self.center();
            self.set_center(center + (target - center) / self.frames_delay as f32);
        }
    }

    /// World rectangle currently seen.
    pub fn visible_rect(&self) -> Rect {
        self.view
    }

    fn clamp_to_limits(&mut self) {
        let Some(limits) = self.limits else { return };
        self.view.x = clamp_axis(self.view.x, self.view.w, limits.x, limits.w);
        self.view.y = clamp_axis(self.view.y, self.view.h, limits.y, limits.h);
    }

    /// macroquad camera for a window of `screen` pixels; y grows downwards.
    pub fn camera2d_for(&self, screen: Vec2) -> Camera2D {
        let viewport = self.viewport.map(|v| {
            (
                (v.x * screen.x) as i32,
                (v.y * screen.y) as i32,
                (v.w * screen.x) as i32,
                (v.h * screen.y) as i32,
            )
        });
        Camera2D {
            target: self.center(),
            zoom: vec2(2.0 / self.view.w.max(1.0), -2.0 / self.view.h.max(1.0)),
            viewport,
            ..Default::default()
        }
    }

    /// [`Camera::camera2d_for`] the current window.
    pub fn to_camera2d(&self) -> Camera2D {
        self.camera2d_for(vec2(screen_width(), screen_height()))
    }

    /// Draws `scene` through this camera, then restores the screen camera.
    pub fn render(&self, scene: &mut Scene) {
        set_camera(&self.to_camera2d());
        scene.render(&RenderStates {
            view: Some(self.visible_rect()),
            ..Default::default()
        });
        set_default_camera();
    }
}

/// Keeps `[start, start + len)` inside `[min, min + range)`; centers it when
/// it does not fit.
fn clamp_axis(start: f32, len: f32, min: f32, range: f32) -> f32 {
    if len >= range {
        min + (range - len) / 2.0
    } else {
        start.clamp(min, min + range - len)
    }
}
