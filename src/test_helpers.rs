//! Snapshot fixtures shared by unit and integration tests.

use crate::snapshot::{
    Player,
    Space,
    SpaceKind,
    StateSnapshot,
};

const CYCLE: [SpaceKind; 6] = [
    SpaceKind::Property,
    SpaceKind::Chance,
    SpaceKind::Property,
    SpaceKind::Tax,
    SpaceKind::Property,
    SpaceKind::FreeParking,
];

/// A board of `len` spaces starting on GO, cycling through the other kinds.
pub fn board(len: usize) -> Vec<Space> {
    (0..len)
        .map(|i| {
            let kind = if i == 0 {
                SpaceKind::Go
            } else {
                CYCLE[(i - 1) % CYCLE.len()]
            };
            let name = match kind {
                SpaceKind::Go => "GO".to_string(),
                other => format!("{} {i}", other.wire_name()),
            };
            Space {
                name,
                kind,
                owner: None,
                image_url: None,
            }
        })
        .collect()
}

pub fn player(name: &str, position: i64) -> Player {
    Player {
        name: name.to_string(),
        money: 1500,
        properties: Vec::new(),
        position,
    }
}

pub fn snapshot(board_len: usize, players: Vec<Player>, log: &[&str]) -> StateSnapshot {
    let current_player_name = players
        .first()
        .map(|p| p.name.clone())
        .unwrap_or_default();
    StateSnapshot {
        players,
        board: board(board_len),
        log: log.iter().map(|line| line.to_string()).collect(),
        current_player_name,
    }
}
