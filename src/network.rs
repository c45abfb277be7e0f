//! Live pulse network: particle field, sparks, search box and beam.
//!
//! Controls:
//! - Type: feed the search box (typing mode)
//! - Enter: submit, fires the perimeter beam
//! - Tab: minor pulse
//! - F1: Help, F2: Color scheme
//! - Esc / Ctrl+C: Quit

use crate::canvas::{BrailleCanvas, Canvas, Stroke, DOTS_X, DOTS_Y};
use crate::colors::{accent, ColorState};
use crate::config::NetworkConfig;
use crate::field::ParticleField;
use crate::geometry::Rect;
use crate::help::{draw_frame, render_help_overlay, NETWORK_HELP};
use crate::mode::Mode;
use crate::pulse::PulseEngine;
use crate::registry::{NodeRegistry, PulseTriggers, TypingSignal};
use crate::terminal::Terminal;
use crossterm::event::{KeyCode, KeyModifiers};
use crossterm::style::Color;
use rand::prelude::*;
use std::io;
use std::time::Instant;

const MAX_QUERY_CHARS: usize = 120;
const LINK_ALPHA: f32 = 0.1;
const NODE_ALPHA: f32 = 0.45;

#[derive(Debug, PartialEq, Eq)]
pub enum KeyAction {
    None,
    Edited,
    Submit,
    Minor,
    ToggleHelp,
    Quit,
}

/// Search input state
#[derive(Debug, Default)]
pub struct SearchBox {
    query: String,
}

impl SearchBox {
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Typing intensity: number of characters entered
    pub fn intensity(&self) -> usize {
        self.query.chars().count()
    }

    pub fn base_mode(&self) -> Mode {
        if self.query.is_empty() { Mode::Idle } else { Mode::Typing }
    }

    pub fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> KeyAction {
        let ctrl = modifiers.contains(KeyModifiers::CONTROL);
        match code {
            KeyCode::Esc => KeyAction::Quit,
            KeyCode::Char('c') if ctrl => KeyAction::Quit,
            KeyCode::Char('u') if ctrl => {
                self.query.clear();
                KeyAction::Edited
            }
            KeyCode::Enter => KeyAction::Submit,
            KeyCode::Tab => KeyAction::Minor,
            KeyCode::F(1) => KeyAction::ToggleHelp,
            KeyCode::Backspace => {
                self.query.pop();
                KeyAction::Edited
            }
            KeyCode::Char(c) if !ctrl && self.intensity() < MAX_QUERY_CHARS => {
                self.query.push(c);
                KeyAction::Edited
            }
            _ => KeyAction::None,
        }
    }
}

/// Search box placement in cells: (x, y, w, h)
fn search_box_cells(cols: u16, rows: u16) -> (usize, usize, usize, usize) {
    let w = ((cols as usize) / 2).clamp(12, 60).min(cols as usize);
    let h = 3.min(rows as usize);
    let x = (cols as usize).saturating_sub(w) / 2;
    let y = (rows as usize) / 3;
    (x, y, w, h)
}

/// The same box in canvas dot space
pub fn search_box_rect(cols: u16, rows: u16) -> Rect {
    let (x, y, w, h) = search_box_cells(cols, rows);
    Rect::new(
        (x * DOTS_X) as f32,
        (y * DOTS_Y) as f32,
        ((x + w) * DOTS_X) as f32,
        ((y + h) * DOTS_Y) as f32,
    )
}

fn draw_field(field: &ParticleField, canvas: &mut BrailleCanvas) {
    for (from, to) in field.links() {
        canvas.line(from, to, Stroke::plain(LINK_ALPHA));
    }
    for pos in field.positions() {
        canvas.dot(pos, Stroke::new(NODE_ALPHA, 10.0));
    }
}

fn draw_chrome(term: &mut Terminal, search: &SearchBox, colors: &ColorState, mode: Mode) {
    let (cols, rows) = term.size();
    let (x, y, w, h) = search_box_cells(cols, rows);
    let color = accent(colors.scheme);

    // Clear the interior so sparks never overwrite the text
    for cy in y + 1..y + h.saturating_sub(1) {
        term.set_str((x + 1) as i32, cy as i32, &" ".repeat(w.saturating_sub(2)), None, false);
    }
    draw_frame(term, x, y, w, h, color);

    let inner = w.saturating_sub(4);
    let shown: String = if search.query().is_empty() {
        "Rechercher une entreprise, un SIREN...".chars().take(inner).collect()
    } else {
        let skip = search.intensity().saturating_sub(inner);
        search.query().chars().skip(skip).collect()
    };
    let text_color = if search.query().is_empty() { Color::DarkGrey } else { Color::White };
    term.set_str((x + 2) as i32, (y + 1) as i32, &shown, Some(text_color), false);

    let status = format!(" {:?} | {} chars | {} | F1 help ", mode, search.intensity(), colors.name());
    term.set_str(1, rows as i32 - 1, &status, Some(Color::DarkGrey), false);
}

/// Run the pulse network until the user quits
pub fn run(config: NetworkConfig) -> io::Result<()> {
    let mut term = Terminal::new(true)?;
    let mut rng = match config.seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };

    let (mut cols, mut rows) = term.size();
    let mut canvas = BrailleCanvas::new(cols, rows);
    let (dots_w, dots_h) = canvas.size();

    let registry = NodeRegistry::new();
    let typing = TypingSignal::new();
    let triggers = PulseTriggers::new();

    let mut field = ParticleField::new(config.field.clone(), dots_w, dots_h, registry.clone(), &mut rng);
    let engine_rng = StdRng::seed_from_u64(rng.gen());
    let mut engine = PulseEngine::new(
        registry,
        typing.clone(),
        triggers.clone(),
        search_box_rect(cols, rows),
        engine_rng,
    );

    let mut search = SearchBox::default();
    let mut colors = ColorState::new(config.scheme);
    let mut show_help = false;
    let start = Instant::now();

    tracing::info!(cols, rows, nodes = config.field.nodes, seed = ?config.seed, "pulse network started");

    'frames: loop {
        let (new_w, new_h) = crossterm::terminal::size().unwrap_or((cols, rows));
        if new_w != cols || new_h != rows {
            cols = new_w;
            rows = new_h;
            term.resize(cols, rows);
            term.clear_screen()?;
            canvas.resize(cols, rows);
            let (w, h) = canvas.size();
            field.resize(w, h);
            engine.set_target(search_box_rect(cols, rows));
            tracing::debug!(cols, rows, "resized");
        }

        while let Some((code, mods)) = term.check_key()? {
            if colors.handle_key(code) {
                continue;
            }
            match search.handle_key(code, mods) {
                KeyAction::Quit => break 'frames,
                KeyAction::Submit => {
                    tracing::info!(query = search.query(), "search submitted");
                    triggers.major();
                }
                KeyAction::Minor => triggers.minor(),
                KeyAction::ToggleHelp => show_help = !show_help,
                KeyAction::Edited | KeyAction::None => {}
            }
        }

        // Guard against zero-size terminal
        if cols == 0 || rows == 0 {
            term.sleep(0.1);
            continue;
        }

        let now = start.elapsed().as_secs_f64() * 1000.0;
        typing.set(search.intensity());
        engine.set_base_mode(search.base_mode());
        field.tick(now);

        canvas.decay();
        draw_field(&field, &mut canvas);
        engine.frame(now, &mut canvas);

        term.clear();
        canvas.blit(&mut term, colors.scheme);
        let mode = engine.mode(now);
        draw_chrome(&mut term, &search, &colors, mode);
        if show_help {
            render_help_overlay(&mut term, NETWORK_HELP);
        }
        term.present()?;

        term.sleep(config.time_step);
    }

    engine.dispose();
    tracing::info!("pulse network stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typing_drives_intensity_and_mode() {
        let mut search = SearchBox::default();
        assert_eq!(search.base_mode(), Mode::Idle);

        for c in "Pappers".chars() {
            assert_eq!(search.handle_key(KeyCode::Char(c), KeyModifiers::NONE), KeyAction::Edited);
        }
        assert_eq!(search.intensity(), 7);
        assert_eq!(search.base_mode(), Mode::Typing);

        search.handle_key(KeyCode::Backspace, KeyModifiers::NONE);
        assert_eq!(search.query(), "Papper");

        search.handle_key(KeyCode::Char('u'), KeyModifiers::CONTROL);
        assert_eq!(search.intensity(), 0);
        assert_eq!(search.base_mode(), Mode::Idle);
    }

    #[test]
    fn control_keys_map_to_actions() {
        let mut search = SearchBox::default();
        assert_eq!(search.handle_key(KeyCode::Enter, KeyModifiers::NONE), KeyAction::Submit);
        assert_eq!(search.handle_key(KeyCode::Tab, KeyModifiers::NONE), KeyAction::Minor);
        assert_eq!(search.handle_key(KeyCode::F(1), KeyModifiers::NONE), KeyAction::ToggleHelp);
        assert_eq!(search.handle_key(KeyCode::Esc, KeyModifiers::NONE), KeyAction::Quit);
        assert_eq!(search.handle_key(KeyCode::Char('c'), KeyModifiers::CONTROL), KeyAction::Quit);
        assert!(search.query().is_empty());
    }

    #[test]
    fn search_rect_is_inside_canvas() {
        for (cols, rows) in [(80, 24), (200, 60), (20, 5)] {
            let rect = search_box_rect(cols, rows);
            assert!(rect.left >= 0.0 && rect.top >= 0.0);
            assert!(rect.right <= (cols as usize * DOTS_X) as f32);
            assert!(rect.bottom <= (rows as usize * DOTS_Y) as f32);
            assert!(rect.width() > 0.0);
        }
    }

    #[test]
    fn headless_frame_renders_chrome() {
        let mut term = Terminal::headless(80, 24);
        let mut search = SearchBox::default();
        search.handle_key(KeyCode::Char('x'), KeyModifiers::NONE);
        draw_chrome(&mut term, &search, &ColorState::new(0), Mode::Typing);

        let (x, y, _, _) = search_box_cells(80, 24);
        assert_eq!(term.get(x as u16, y as u16).map(|c| c.ch), Some('┌'));
        assert_eq!(term.get((x + 2) as u16, (y + 1) as u16).map(|c| c.ch), Some('x'));
    }
}
