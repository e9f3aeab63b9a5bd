use ratatui::style::Color;

use crate::state::board::Tile;

/// Colours of the terminal frontend.
pub struct Theme;

impl Theme {
    pub const BORDER: Color = Color::Rgb(90, 90, 110);
    pub const TITLE: Color = Color::Rgb(255, 120, 170);
    pub const TEXT: Color = Color::Rgb(220, 220, 230);
    pub const MUTED: Color = Color::Rgb(110, 110, 125);
    pub const EMPTY: Color = Color::Rgb(45, 45, 55);
    pub const DRINK: Color = Color::Rgb(255, 170, 60);
    pub const OVERLAY: Color = Color::Rgb(255, 230, 120);

    /// Colour of a locked or falling tile.
    pub fn tile(tile: Tile) -> Color {
        match tile {
            Tile::Red => Color::Rgb(230, 60, 60),
            Tile::Orange => Color::Rgb(255, 150, 40),
            Tile::Yellow => Color::Rgb(245, 220, 60),
            Tile::Green => Color::Rgb(80, 200, 90),
            Tile::LightBlue => Color::Rgb(90, 200, 240),
            Tile::Blue => Color::Rgb(60, 100, 230),
            Tile::Purple => Color::Rgb(170, 80, 220),
        }
    }

    /// Face drawn for a mood index.
    pub fn face(mood: u8) -> (&'static str, Color) {
        match mood {
            0 => ("(^_^)", Color::Rgb(120, 220, 120)),
            1 => ("(o_o)", Color::Rgb(240, 210, 90)),
            2 => ("(O_O;)", Color::Rgb(255, 140, 60)),
            _ => ("(x_x)", Color::Rgb(230, 60, 60)),
        }
    }
}
