use crate::terminal::Terminal;
use crossterm::style::Color;

pub const NETWORK_HELP: &str = "\
PULSE NETWORK
─────────────────
 type    Feed the search box
 Bksp    Delete character
 Ctrl+U  Clear search box
 Enter   Submit (major pulse)
 Tab     Minor pulse
 F2      Color scheme
 F1      Close help
 Esc     Quit";

/// Render a centered help overlay box with the provided text into the back buffer.
pub fn render_help_overlay(term: &mut Terminal, help_text: &str) {
    if help_text.is_empty() {
        return;
    }
    let (width, height) = term.size();

    let lines: Vec<&str> = help_text.lines().collect();
    let max_width = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    let box_width = max_width + 4; // 2 chars padding each side
    let box_height = lines.len() + 2; // 1 row padding top/bottom

    // Center the box
    let start_x = (width as usize).saturating_sub(box_width) / 2;
    let start_y = (height as usize).saturating_sub(box_height) / 2;

    draw_frame(term, start_x, start_y, box_width, box_height, Color::White);

    for (i, line) in lines.iter().enumerate() {
        let y = start_y + 1 + i;
        let padding = max_width.saturating_sub(line.chars().count());
        let padded = format!(" {}{} ", line, " ".repeat(padding));
        term.set_str((start_x + 1) as i32, y as i32, &padded, Some(Color::Grey), false);
    }
}

/// Draw a single-line box outline; the interior is left untouched.
pub fn draw_frame(term: &mut Terminal, x: usize, y: usize, w: usize, h: usize, color: Color) {
    if w < 2 || h < 2 {
        return;
    }
    let (x0, y0) = (x as i32, y as i32);
    let (x1, y1) = ((x + w - 1) as i32, (y + h - 1) as i32);

    term.set(x0, y0, '┌', Some(color), false);
    term.set(x1, y0, '┐', Some(color), false);
    term.set(x0, y1, '└', Some(color), false);
    term.set(x1, y1, '┘', Some(color), false);
    for cx in x0 + 1..x1 {
        term.set(cx, y0, '─', Some(color), false);
        term.set(cx, y1, '─', Some(color), false);
    }
    for cy in y0 + 1..y1 {
        term.set(x0, cy, '│', Some(color), false);
        term.set(x1, cy, '│', Some(color), false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlay_is_centered() {
        let mut term = Terminal::headless(40, 12);
        render_help_overlay(&mut term, "ab\ncd");
        // box is 6x4, centered at (17, 4)
        assert_eq!(term.get(17, 4).map(|c| c.ch), Some('┌'));
        assert_eq!(term.get(22, 7).map(|c| c.ch), Some('┘'));
        assert_eq!(term.get(19, 5).map(|c| c.ch), Some('a'));
    }

    #[test]
    fn network_help_fits_small_terminals() {
        let widest = NETWORK_HELP.lines().map(|l| l.chars().count()).max().unwrap_or(0);
        assert!(widest + 4 <= 80);
        assert!(NETWORK_HELP.lines().count() + 2 <= 24);
    }
}
