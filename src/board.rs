//! Retained board view.
//!
//! Static geometry (one cell per space, the center region, track sizing) is
//! built only when the board length changes. Every other snapshot only
//! touches the transient parts: owner annotations and player markers.

use crate::{
    layout::{
        self,
        GridPos,
        GridSpan,
        Track,
    },
    palette,
    snapshot::{
        Player,
        Space,
        SpaceKind,
        StateSnapshot,
    },
};
use ratatui::style::Color;
use tracing::{
    debug,
    warn,
};

/// Identity of a retained view node. Ids are never reused, so a node that
/// keeps its id across snapshots was not recreated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

#[derive(Debug, Default)]
struct NodeIds {
    next: u64,
}

impl NodeIds {
    fn allocate(&mut self) -> NodeId {
        self.next += 1;
        NodeId(self.next)
    }
}

#[derive(Clone, Debug)]
pub struct SpaceCell {
    pub node: NodeId,
    pub index: usize,
    pub pos: GridPos,
    pub name: String,
    pub kind: SpaceKind,
    pub image_url: Option<String>,
    pub owner: Option<OwnerAnnotation>,
    pub markers: Vec<PlayerMarker>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OwnerAnnotation {
    pub node: NodeId,
    pub owner: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerMarker {
    pub node: NodeId,
    pub color: Color,
    /// Shown when the marker is hovered or listed; the player's name.
    pub label: String,
}

#[derive(Clone, Debug)]
pub struct CenterRegion {
    pub node: NodeId,
    pub span: GridSpan,
    pub title: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoardUpdate {
    pub rebuilt: bool,
    pub markers: usize,
}

#[derive(Debug)]
pub struct BoardView {
    title: String,
    fingerprint: Option<usize>,
    side: usize,
    tracks: Vec<Track>,
    cells: Vec<SpaceCell>,
    center: Option<CenterRegion>,
    ids: NodeIds,
    rebuilds: u64,
}

impl BoardView {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            fingerprint: None,
            side: 0,
            tracks: Vec::new(),
            cells: Vec::new(),
            center: None,
            ids: NodeIds::default(),
            rebuilds: 0,
        }
    }

    /// Brings the view in line with `snapshot`. Returns `None`, leaving the
    /// view untouched, when the board cannot be laid out.
    pub fn reconcile(&mut self, snapshot: &StateSnapshot) -> Option<BoardUpdate> {
        let board_len = snapshot.board.len();
        let Some(side) = layout::side_length(board_len) else {
            if board_len == 0 {
                debug!("no board in snapshot");
            } else {
                warn!(board_len, "board has no perimeter layout, skipping board render");
            }
            return None;
        };

        let rebuilt = self.fingerprint != Some(board_len);
        if rebuilt {
            self.rebuild(&snapshot.board, side);
        }
        self.clear_markers();
        self.sync_owners(&snapshot.board);
        let markers = self.place_markers(&snapshot.players);
        debug!(rebuilt, markers, "board reconciled");
        Some(BoardUpdate { rebuilt, markers })
    }

    fn rebuild(&mut self, board: &[Space], side: usize) {
        debug!(
            previous = ?self.fingerprint,
            board_len = board.len(),
            side,
            "board topology changed, rebuilding geometry"
        );
        let mut cells = Vec::with_capacity(board.len());
        for (index, space) in board.iter().enumerate() {
            let Some(pos) = layout::position(index, side) else {
                continue;
            };
            cells.push(SpaceCell {
                node: self.ids.allocate(),
                index,
                pos,
                name: space.name.clone(),
                kind: space.kind,
                image_url: space.image_url.clone(),
                owner: None,
                markers: Vec::new(),
            });
        }
        self.cells = cells;
        self.center = layout::interior(side).map(|span| CenterRegion {
            node: self.ids.allocate(),
            span,
            title: self.title.clone(),
        });
        self.tracks = layout::tracks(side);
        self.side = side;
        self.fingerprint = Some(board.len());
        self.rebuilds += 1;
    }

    fn clear_markers(&mut self) {
        for cell in &mut self.cells {
            cell.markers.clear();
        }
    }

    fn sync_owners(&mut self, board: &[Space]) {
        for (cell, space) in self.cells.iter_mut().zip(board) {
            let wanted = match space.kind {
                SpaceKind::Property => space.owner.as_deref(),
                _ => None,
            };
            match (cell.owner.as_mut(), wanted) {
                (Some(annotation), Some(owner)) => {
                    if annotation.owner != owner {
                        annotation.owner = owner.to_string();
                    }
                }
                (None, Some(owner)) => {
                    cell.owner = Some(OwnerAnnotation {
                        node: self.ids.allocate(),
                        owner: owner.to_string(),
                    });
                }
                (Some(_), None) => cell.owner = None,
                (None, None) => {}
            }
        }
    }

    fn place_markers(&mut self, players: &[Player]) -> usize {
        let board_len = self.cells.len();
        let mut placed = 0;
        for (roster_index, player) in players.iter().enumerate() {
            let Some(index) = player.board_index(board_len) else {
                warn!(
                    player = %player.name,
                    position = player.position,
                    board_len,
                    "player position is off the board, no marker placed"
                );
                continue;
            };
            let marker = PlayerMarker {
                node: self.ids.allocate(),
                color: palette::player_color(roster_index),
                label: player.name.clone(),
            };
            self.cells[index].markers.push(marker);
            placed += 1;
        }
        placed
    }

    pub fn side(&self) -> usize {
        self.side
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn cells(&self) -> &[SpaceCell] {
        &self.cells
    }

    pub fn cell(&self, index: usize) -> Option<&SpaceCell> {
        self.cells.get(index)
    }

    pub fn center(&self) -> Option<&CenterRegion> {
        self.center.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// How many times the static geometry has been built.
    pub fn rebuilds(&self) -> u64 {
        self.rebuilds
    }

    pub fn marker_count(&self) -> usize {
        self.cells.iter().map(|cell| cell.markers.len()).sum()
    }
}
