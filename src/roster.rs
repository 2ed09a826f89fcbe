use crate::{
    palette,
    snapshot::Player,
};
use itertools::Itertools;
use ratatui::style::Color;

/// Shown in place of the property list for players who own nothing.
pub const NO_PROPERTIES: &str = "None";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RosterEntry {
    pub name: String,
    pub money: i64,
    pub properties: String,
    pub color: Color,
    pub is_current: bool,
}

/// Builds the roster from scratch. Entries keep the snapshot's player order
/// and share the board markers' colors.
pub fn render(players: &[Player], current_player_name: &str) -> Vec<RosterEntry> {
    players
        .iter()
        .enumerate()
        .map(|(index, player)| RosterEntry {
            name: player.name.clone(),
            money: player.money,
            properties: if player.properties.is_empty() {
                NO_PROPERTIES.to_string()
            } else {
                player.properties.iter().join(", ")
            },
            color: palette::player_color(index),
            is_current: player.name == current_player_name,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;
    use crate::test_helpers::player;

    #[test]
    fn render__players__keeps_order_and_palette_colors() {
        // given
        let mut amy = player("amy", 0);
        amy.properties = vec!["Cotton Street".into(), "Bamboo Ave".into()];
        let bob = player("bob", 3);

        // when
        let roster = render(&[amy, bob], "bob");

        // then
        assert_eq!(roster.len(), 2);
        assert_eq!(roster[0].name, "amy");
        assert_eq!(roster[0].properties, "Cotton Street, Bamboo Ave");
        assert_eq!(roster[0].color, palette::PLAYER_PALETTE[0]);
        assert!(!roster[0].is_current);
        assert_eq!(roster[1].properties, NO_PROPERTIES);
        assert_eq!(roster[1].color, palette::PLAYER_PALETTE[1]);
        assert!(roster[1].is_current);
    }

    #[test]
    fn render__unknown_current_player__highlights_nobody() {
        let roster = render(&[player("amy", 0), player("bob", 1)], "carol");
        assert!(roster.iter().all(|entry| !entry.is_current));
    }

    #[test]
    fn render__current_player_match_is_exact() {
        let roster = render(&[player("Amy", 0)], "amy");
        assert!(!roster[0].is_current);
    }
}
