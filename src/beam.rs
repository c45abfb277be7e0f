//! Two-phase flourish fired on search submit: a comet runs around the
//! search box outline, then a curtain of beams drops from its bottom edge.

use crate::canvas::{Canvas, Stroke};
use crate::geometry::{Point, Rect};

const CONTOUR_STEP: f32 = 0.04;
const VERTICAL_STEP: f32 = 0.015;

const PERIMETER_SAMPLES: usize = 80;
const TRAIL_SEGMENTS: usize = 8;
const TRAIL_OFFSET: f32 = 0.03;
const SEGMENT_SPAN: f32 = 0.12;

const BEAM_LINES: usize = 6;
const BEAM_SPACING: f32 = 8.0;
const BEAM_DELAY: f32 = 0.08;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BeamPhase {
    Contour { progress: f32 },
    Vertical { progress: f32 },
}

#[derive(Debug)]
pub struct PerimeterBeam {
    phase: BeamPhase,
    opacity: f32,
}

impl Default for PerimeterBeam {
    fn default() -> Self {
        Self::new()
    }
}

impl PerimeterBeam {
    pub fn new() -> Self {
        Self {
            phase: BeamPhase::Contour { progress: 0.0 },
            opacity: 1.0,
        }
    }

    #[allow(dead_code)]
    pub fn phase(&self) -> BeamPhase {
        self.phase
    }

    /// Step one frame. Returns false once the vertical phase has completed;
    /// the caller drops the effect at that point.
    pub fn advance(&mut self) -> bool {
        match &mut self.phase {
            BeamPhase::Contour { progress } => {
                *progress += CONTOUR_STEP;
                if *progress >= 1.0 {
                    self.phase = BeamPhase::Vertical { progress: 0.0 };
                }
                true
            }
            BeamPhase::Vertical { progress } => {
                *progress += VERTICAL_STEP;
                *progress < 1.0
            }
        }
    }

    pub fn draw(&self, canvas: &mut dyn Canvas, rect: Rect) {
        match self.phase {
            BeamPhase::Contour { progress } => self.draw_contour(canvas, rect, progress),
            BeamPhase::Vertical { progress } => self.draw_vertical(canvas, rect, progress),
        }
    }

    fn draw_contour(&self, canvas: &mut dyn Canvas, rect: Rect, progress: f32) {
        let path = rect.perimeter_samples(PERIMETER_SAMPLES);
        let last = path.len().saturating_sub(1) as f32;

        for i in 0..TRAIL_SEGMENTS {
            let head = progress - i as f32 * TRAIL_OFFSET;
            if head <= 0.0 {
                continue;
            }
            let tail = (head - SEGMENT_SPAN).max(0.0);
            let from = (tail * last).floor() as usize;
            let to = ((head.min(1.0) * last).ceil() as usize).min(path.len() - 1);
            if to <= from {
                continue;
            }

            let alpha = (1.0 - i as f32 / TRAIL_SEGMENTS as f32) * 0.8 * self.opacity;
            canvas.polyline(&path[from..=to], Stroke::new(alpha, 20.0));
        }
    }

    fn draw_vertical(&self, canvas: &mut dyn Canvas, rect: Rect, progress: f32) {
        let (_, canvas_h) = canvas.size();
        let max_len = (canvas_h - rect.bottom).max(0.0);
        let first_x = rect.center_x() - BEAM_SPACING * (BEAM_LINES - 1) as f32 / 2.0;

        for i in 0..BEAM_LINES {
            let adjusted = (progress - i as f32 * BEAM_DELAY).clamp(0.0, 1.0);
            if adjusted <= 0.0 {
                continue;
            }
            let len = (adjusted * max_len).min(max_len);
            let x = first_x + i as f32 * BEAM_SPACING;
            let alpha = self.opacity * (1.0 - adjusted * 0.5);
            canvas.line(
                Point::new(x, rect.bottom),
                Point::new(x, rect.bottom + len),
                Stroke::new(alpha, 15.0),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Lines(Vec<(Point, Point, Stroke)>);

    impl Canvas for Lines {
        fn size(&self) -> (f32, f32) {
            (400.0, 300.0)
        }
        fn dot(&mut self, _p: Point, _stroke: Stroke) {}
        fn line(&mut self, from: Point, to: Point, stroke: Stroke) {
            self.0.push((from, to, stroke));
        }
    }

    const BOX: Rect = Rect::new(100.0, 100.0, 300.0, 200.0);

    #[test]
    fn contour_then_vertical_then_retire() {
        let mut beam = PerimeterBeam::new();
        let mut transitions = 0;
        let mut frames = 0;
        let mut was_contour = true;

        while beam.advance() {
            frames += 1;
            let is_contour = matches!(beam.phase(), BeamPhase::Contour { .. });
            if was_contour && !is_contour {
                transitions += 1;
            }
            assert!(was_contour || !is_contour, "vertical must never go back to contour");
            was_contour = is_contour;
            assert!(frames < 200);
        }

        assert_eq!(transitions, 1);
        assert!(matches!(beam.phase(), BeamPhase::Vertical { progress } if progress >= 1.0));
    }

    #[test]
    fn contour_trail_fades_toward_tail() {
        let beam = PerimeterBeam {
            phase: BeamPhase::Contour { progress: 0.5 },
            opacity: 1.0,
        };
        let mut canvas = Lines::default();
        beam.draw(&mut canvas, BOX);

        assert!(!canvas.0.is_empty());
        let alphas: Vec<f32> = canvas.0.iter().map(|(_, _, s)| s.alpha).collect();
        assert!((alphas[0] - 0.8).abs() < 1e-6);
        assert!(alphas.windows(2).all(|w| w[0] >= w[1]));
        for (from, to, _) in &canvas.0 {
            assert!(BOX.contains(*from) && BOX.contains(*to));
        }
    }

    #[test]
    fn vertical_lines_are_staggered_and_centered() {
        let beam = PerimeterBeam {
            phase: BeamPhase::Vertical { progress: 0.3 },
            opacity: 1.0,
        };
        let mut canvas = Lines::default();
        beam.draw(&mut canvas, BOX);

        // lines 0..=3 have started (0.3 - 3 * 0.08 > 0), 4 and 5 have not
        assert_eq!(canvas.0.len(), 4);
        let (from, to, stroke) = canvas.0[0];
        assert_eq!(from, Point::new(180.0, 200.0));
        assert!((to.y - (200.0 + 0.3 * 100.0)).abs() < 1e-3);
        assert!((stroke.alpha - 0.85).abs() < 1e-6);

        let xs: Vec<f32> = canvas.0.iter().map(|(f, _, _)| f.x).collect();
        assert_eq!(xs, vec![180.0, 188.0, 196.0, 204.0]);
    }
}
