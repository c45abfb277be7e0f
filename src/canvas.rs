//! Drawing surface for the pulse network, rasterized to braille dots.

use crate::colors::scheme_color;
use crate::geometry::Point;
use crate::terminal::Terminal;

// Braille constants (2x4 dot grid per character)
const BRAILLE_BASE: u32 = 0x2800;
pub const DOTS_X: usize = 2;
pub const DOTS_Y: usize = 4;

// Per-frame persistence of the intensity grid
const DECAY_RATE: f32 = 0.55;
const VISIBLE_THRESHOLD: f32 = 0.08;

/// Stroke style: `alpha` in 0..=1, `glow` is a blur radius in the 0..30 range.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stroke {
    pub alpha: f32,
    pub glow: f32,
}

impl Stroke {
    pub const fn new(alpha: f32, glow: f32) -> Self {
        Self { alpha, glow }
    }

    pub const fn plain(alpha: f32) -> Self {
        Self { alpha, glow: 0.0 }
    }
}

pub trait Canvas {
    /// Drawable size in dots
    fn size(&self) -> (f32, f32);

    fn dot(&mut self, p: Point, stroke: Stroke);

    fn line(&mut self, from: Point, to: Point, stroke: Stroke) {
        let steps = from.distance(to).ceil().max(1.0) as usize;
        for i in 0..=steps {
            self.dot(from.lerp(to, i as f32 / steps as f32), stroke);
        }
    }

    fn polyline(&mut self, points: &[Point], stroke: Stroke) {
        for pair in points.windows(2) {
            self.line(pair[0], pair[1], stroke);
        }
    }
}

/// Intensity grid at braille resolution with trail decay.
pub struct BrailleCanvas {
    grid_w: usize,
    grid_h: usize,
    grid: Vec<f32>,
}

impl BrailleCanvas {
    pub fn new(cols: u16, rows: u16) -> Self {
        let grid_w = cols as usize * DOTS_X;
        let grid_h = rows as usize * DOTS_Y;
        Self {
            grid_w,
            grid_h,
            grid: vec![0.0; grid_w * grid_h],
        }
    }

    pub fn resize(&mut self, cols: u16, rows: u16) {
        *self = Self::new(cols, rows);
    }

    /// Fade the previous frame
    pub fn decay(&mut self) {
        for val in &mut self.grid {
            *val *= DECAY_RATE;
        }
    }

    pub fn intensity(&self, x: usize, y: usize) -> f32 {
        if x < self.grid_w && y < self.grid_h {
            self.grid[y * self.grid_w + x]
        } else {
            0.0
        }
    }

    fn plot(&mut self, x: i32, y: i32, value: f32) {
        if x < 0 || y < 0 {
            return;
        }
        let (x, y) = (x as usize, y as usize);
        if x < self.grid_w && y < self.grid_h {
            let cell = &mut self.grid[y * self.grid_w + x];
            *cell = cell.max(value);
        }
    }

    /// Blit the grid into the terminal back buffer
    pub fn blit(&self, term: &mut Terminal, scheme: u8) {
        let cols = self.grid_w / DOTS_X;
        let rows = self.grid_h / DOTS_Y;

        for char_y in 0..rows {
            for char_x in 0..cols {
                let mut code: u32 = 0;
                let mut max_intensity: f32 = 0.0;

                for dy in 0..DOTS_Y {
                    for dx in 0..DOTS_X {
                        let intensity = self.intensity(char_x * DOTS_X + dx, char_y * DOTS_Y + dy);
                        if intensity > VISIBLE_THRESHOLD {
                            code |= braille_bit(dx, dy);
                            max_intensity = max_intensity.max(intensity);
                        }
                    }
                }

                if code != 0 {
                    let ch = char::from_u32(BRAILLE_BASE + code).unwrap_or(' ');
                    let level = ((max_intensity * 4.0) as u8).min(3);
                    let (color, bold) = scheme_color(scheme, level, max_intensity > 0.7);
                    term.set(char_x as i32, char_y as i32, ch, Some(color), bold);
                }
            }
        }
    }
}

impl Canvas for BrailleCanvas {
    fn size(&self) -> (f32, f32) {
        (self.grid_w as f32, self.grid_h as f32)
    }

    fn dot(&mut self, p: Point, stroke: Stroke) {
        let (x, y) = (p.x.round() as i32, p.y.round() as i32);
        self.plot(x, y, stroke.alpha);

        if stroke.glow > 0.0 {
            let halo = stroke.alpha * (stroke.glow / 60.0).min(0.5);
            for (dx, dy) in [(-1, 0), (1, 0), (0, -1), (0, 1)] {
                self.plot(x + dx, y + dy, halo);
            }
        }
    }
}

/// Braille dot positions:
/// 0 3
/// 1 4
/// 2 5
/// 6 7
fn braille_bit(dx: usize, dy: usize) -> u32 {
    match (dx, dy) {
        (0, 3) => 1 << 6,
        (1, 3) => 1 << 7,
        (0, row) => 1 << row,
        (_, row) => 1 << (row + 3),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn braille_bits_match_unicode_layout() {
        assert_eq!(braille_bit(0, 0), 0x01);
        assert_eq!(braille_bit(0, 2), 0x04);
        assert_eq!(braille_bit(1, 0), 0x08);
        assert_eq!(braille_bit(1, 2), 0x20);
        assert_eq!(braille_bit(0, 3), 0x40);
        assert_eq!(braille_bit(1, 3), 0x80);
    }

    #[test]
    fn line_covers_both_endpoints() {
        let mut canvas = BrailleCanvas::new(10, 4);
        canvas.line(Point::new(1.0, 1.0), Point::new(12.0, 1.0), Stroke::plain(0.9));
        assert_eq!(canvas.intensity(1, 1), 0.9);
        assert_eq!(canvas.intensity(12, 1), 0.9);
        assert_eq!(canvas.intensity(6, 1), 0.9);
        assert_eq!(canvas.intensity(6, 2), 0.0);
    }

    #[test]
    fn glow_adds_dim_halo_and_decay_fades() {
        let mut canvas = BrailleCanvas::new(4, 2);
        canvas.dot(Point::new(3.0, 3.0), Stroke::new(1.0, 30.0));
        assert_eq!(canvas.intensity(3, 3), 1.0);
        assert_eq!(canvas.intensity(4, 3), 0.5);

        canvas.decay();
        assert!(canvas.intensity(3, 3) < 1.0);
    }

    #[test]
    fn off_canvas_dots_are_ignored() {
        let mut canvas = BrailleCanvas::new(2, 1);
        canvas.dot(Point::new(-5.0, 1.0), Stroke::plain(1.0));
        canvas.dot(Point::new(100.0, 1.0), Stroke::plain(1.0));
        assert!(canvas.grid.iter().all(|v| *v == 0.0));
    }
}
