use crossterm::event::KeyCode;
use crossterm::style::Color;

/// Number of selectable schemes
pub const SCHEME_COUNT: u8 = 5;

/// Shared color scheme state
#[derive(Clone, Copy)]
pub struct ColorState {
    pub scheme: u8,
}

impl ColorState {
    pub fn new(default_scheme: u8) -> Self {
        Self { scheme: default_scheme % SCHEME_COUNT }
    }

    /// Handle color scheme key input. Returns true if key was handled.
    pub fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::F(2) => self.scheme = (self.scheme + 1) % SCHEME_COUNT,
            _ => return false,
        }
        true
    }

    pub fn name(&self) -> &'static str {
        match self.scheme {
            1 => "ember",
            2 => "violet",
            3 => "mono",
            4 => "matrix",
            _ => "tailor",
        }
    }
}

/// Get color from scheme based on intensity (0-3)
pub fn scheme_color(scheme: u8, intensity: u8, bold: bool) -> (Color, bool) {
    match scheme {
        1 => match intensity {  // Red/Yellow (ember)
            0 => (Color::DarkRed, false),
            1 => (Color::Red, false),
            2 => (Color::DarkYellow, bold),
            _ => (Color::Yellow, true),
        },
        2 => match intensity {  // Blue/Magenta (violet)
            0 => (Color::DarkBlue, false),
            1 => (Color::Blue, false),
            2 => (Color::Magenta, bold),
            _ => (Color::AnsiValue(13), true),  // Bright magenta
        },
        3 => match intensity {  // White/Grey (mono)
            0 => (Color::DarkGrey, false),
            1 => (Color::Grey, false),
            2 => (Color::White, bold),
            _ => (Color::White, true),
        },
        4 => match intensity {  // Green (matrix)
            0 => (Color::DarkGreen, false),
            1 => (Color::Green, false),
            2 => (Color::Green, true),
            _ => (Color::AnsiValue(10), true),  // Bright green
        },
        _ => match intensity {  // Default: Blue/Cyan (tailor)
            0 => (Color::DarkBlue, false),
            1 => (Color::DarkCyan, false),
            2 => (Color::Cyan, bold),
            _ => (Color::AnsiValue(14), true),  // Bright cyan
        },
    }
}

/// Accent color for chrome (search box border, labels) in the given scheme
pub fn accent(scheme: u8) -> Color {
    scheme_color(scheme, 2, false).0
}
