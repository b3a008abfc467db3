#[cfg(test)]
#[path = "camera_test.rs"]
mod camera_test;

use serde::{Deserialize, Serialize};

use crate::consts::{FIT_PADDING, MAX_SCALE, MIN_SCALE};

/// A point in either screen or canvas space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle in canvas space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Smallest rectangle containing both `self` and `other`.
    #[must_use]
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = (self.x + self.width).max(other.x + other.width);
        let bottom = (self.y + self.height).max(other.y + other.height);
        Rect { x, y, width: right - x, height: bottom - y }
    }
}

/// Camera state for pan/zoom on the infinite canvas.
///
/// `pan_x` / `pan_y` are in screen pixels. `scale` is clamped to
/// [`MIN_SCALE`, `MAX_SCALE`]; every mutation clamps silently.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub pan_x: f64,
    pub pan_y: f64,
    pub scale: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self { pan_x: 0.0, pan_y: 0.0, scale: 1.0 }
    }
}

impl Camera {
    /// Convert a screen-space point to canvas coordinates.
    #[must_use]
    pub fn screen_to_canvas(&self, screen: Point) -> Point {
        Point {
            x: (screen.x - self.pan_x) / self.scale,
            y: (screen.y - self.pan_y) / self.scale,
        }
    }

    /// Convert a canvas-space point to screen coordinates.
    #[must_use]
    pub fn canvas_to_screen(&self, canvas: Point) -> Point {
        Point {
            x: canvas.x * self.scale + self.pan_x,
            y: canvas.y * self.scale + self.pan_y,
        }
    }

    /// Convert a screen-space distance (pixels) to canvas-space distance.
    #[must_use]
    pub fn screen_dist_to_canvas(&self, screen_dist: f64) -> f64 {
        screen_dist / self.scale
    }

    /// Scale by `factor`, clamped to the permitted range.
    ///
    /// With an anchor (the cursor position under wheel-zoom), pan offsets
    /// are re-solved so the canvas point under the anchor stays under it
    /// after rescaling. Without one (button zoom), pan is left unchanged.
    #[must_use]
    pub fn zoom_by(&self, factor: f64, anchor: Option<Point>) -> Camera {
        let scale = (self.scale * factor).clamp(MIN_SCALE, MAX_SCALE);
        match anchor {
            Some(p) => {
                let zoom_point = self.screen_to_canvas(p);
                Camera {
                    pan_x: p.x - zoom_point.x * scale,
                    pan_y: p.y - zoom_point.y * scale,
                    scale,
                }
            }
            None => Camera { scale, ..*self },
        }
    }

    /// Shift the pan offset. Unclamped; the canvas is conceptually infinite.
    #[must_use]
    pub fn pan_by(&self, dx: f64, dy: f64) -> Camera {
        Camera { pan_x: self.pan_x + dx, pan_y: self.pan_y + dy, scale: self.scale }
    }

    /// The canvas-space rectangle currently visible in a viewport of the
    /// given screen size.
    #[must_use]
    pub fn visible_rect(&self, viewport_width: f64, viewport_height: f64) -> Rect {
        let top_left = self.screen_to_canvas(Point::new(0.0, 0.0));
        Rect {
            x: top_left.x,
            y: top_left.y,
            width: viewport_width / self.scale,
            height: viewport_height / self.scale,
        }
    }

    /// Camera that frames all of `content` in the viewport ("reset view").
    ///
    /// The scale never exceeds 1.0, so fitting small content does not zoom
    /// in past 100%. An empty slice degrades to the default camera.
    #[must_use]
    pub fn fit_to_content(content: &[Rect], viewport_width: f64, viewport_height: f64) -> Camera {
        let Some((first, rest)) = content.split_first() else {
            return Camera::default();
        };
        let bbox = rest.iter().fold(*first, |acc, r| acc.union(r));

        let scale = (viewport_width / (bbox.width + FIT_PADDING))
            .min(viewport_height / (bbox.height + FIT_PADDING))
            .min(1.0)
            .clamp(MIN_SCALE, MAX_SCALE);

        Camera {
            pan_x: (viewport_width - bbox.width * scale) / 2.0 - bbox.x * scale,
            pan_y: (viewport_height - bbox.height * scale) / 2.0 - bbox.y * scale,
            scale,
        }
    }
}
