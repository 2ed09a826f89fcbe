use ratatui::style::Color;

/// Player colors, indexed by roster position.
pub const PLAYER_PALETTE: [Color; 8] = [
    Color::Rgb(0xff, 0x41, 0x36),
    Color::Rgb(0x00, 0x74, 0xd9),
    Color::Rgb(0x2e, 0xcc, 0x40),
    Color::Rgb(0xff, 0xdc, 0x00),
    Color::Rgb(0xb1, 0x0d, 0xc9),
    Color::Rgb(0xff, 0x85, 0x1b),
    Color::Rgb(0x7f, 0xdb, 0xff),
    Color::Rgb(0xf0, 0x12, 0xbe),
];

/// Color for the player at `roster_index`; wraps around once the roster is
/// longer than the palette.
pub fn player_color(roster_index: usize) -> Color {
    PLAYER_PALETTE[roster_index % PLAYER_PALETTE.len()]
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;

    #[test]
    fn player_color__roster_longer_than_palette__cycles() {
        assert_eq!(player_color(0), PLAYER_PALETTE[0]);
        assert_eq!(player_color(7), PLAYER_PALETTE[7]);
        assert_eq!(player_color(8), PLAYER_PALETTE[0]);
        assert_eq!(player_color(17), PLAYER_PALETTE[1]);
    }
}
