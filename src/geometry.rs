//! Plane geometry shared by the field, the pulses and the beam.
//!
//! All coordinates are in canvas dot space (one terminal cell is 2x4 dots).

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn lerp(self, to: Point, t: f32) -> Point {
        Point {
            x: self.x + (to.x - self.x) * t,
            y: self.y + (to.y - self.y) * t,
        }
    }

    pub fn distance(self, other: Point) -> f32 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

/// Axis-aligned rectangle, `top < bottom` (y grows downward)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    pub const fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self { left, top, right, bottom }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn center_x(&self) -> f32 {
        (self.left + self.right) / 2.0
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left && p.x <= self.right && p.y >= self.top && p.y <= self.bottom
    }

    /// Closest point on the rectangle outline (inside) or area (outside).
    ///
    /// Inside points snap to the nearest edge, checked top, bottom, left, right;
    /// the first edge wins a tie. Outside points are clamped per axis.
    pub fn closest_point(&self, p: Point) -> Point {
        if !self.contains(p) {
            return Point {
                x: p.x.clamp(self.left, self.right),
                y: p.y.clamp(self.top, self.bottom),
            };
        }

        let edges = [
            ((p.y - self.top).abs(), Point::new(p.x, self.top)),
            ((p.y - self.bottom).abs(), Point::new(p.x, self.bottom)),
            ((p.x - self.left).abs(), Point::new(self.left, p.y)),
            ((p.x - self.right).abs(), Point::new(self.right, p.y)),
        ];

        let mut best = edges[0];
        for edge in &edges[1..] {
            if edge.0 < best.0 {
                best = *edge;
            }
        }
        best.1
    }

    /// Sample `n` points clockwise around the outline starting at the top-left corner.
    pub fn perimeter_samples(&self, n: usize) -> Vec<Point> {
        let per_edge = (n / 4).max(1);
        let mut points = Vec::with_capacity(per_edge * 4);
        let step = |i: usize| i as f32 / per_edge as f32;

        for i in 0..per_edge {
            points.push(Point::new(self.left + self.width() * step(i), self.top));
        }
        for i in 0..per_edge {
            points.push(Point::new(self.right, self.top + (self.bottom - self.top) * step(i)));
        }
        for i in 0..per_edge {
            points.push(Point::new(self.right - self.width() * step(i), self.bottom));
        }
        for i in 0..per_edge {
            points.push(Point::new(self.left, self.bottom - (self.bottom - self.top) * step(i)));
        }
        points
    }
}

/// Cubic ease-out: fast start, soft landing.
#[inline]
pub fn ease_out_cubic(t: f32) -> f32 {
    1.0 - (1.0 - t).powi(3)
}
