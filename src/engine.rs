//! View state for one client session and the gate that decides which
//! server responses get rendered.

use crate::{
    board::{
        BoardUpdate,
        BoardView,
    },
    log_view::LogView,
    roster::{
        self,
        RosterEntry,
    },
    snapshot::StateSnapshot,
};
use std::fmt;
use tracing::debug;

/// Order in which a snapshot-producing request was issued.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestSeq(u64);

impl RequestSeq {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestSeq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hands out strictly increasing [`RequestSeq`]s.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    last: u64,
}

impl RequestSequencer {
    pub fn issue(&mut self) -> RequestSeq {
        self.last += 1;
        RequestSeq(self.last)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderReport {
    /// `None` when the board could not be laid out and was skipped.
    pub board: Option<BoardUpdate>,
    pub log_redrawn: bool,
    pub roster_len: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied(RenderReport),
    /// A response to a newer request was already rendered.
    Stale { seq: RequestSeq, newest: RequestSeq },
}

#[derive(Debug)]
pub struct SyncEngine {
    board: BoardView,
    log: LogView,
    roster: Vec<RosterEntry>,
    current_player_name: String,
    newest_applied: Option<RequestSeq>,
}

impl SyncEngine {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            board: BoardView::new(title),
            log: LogView::default(),
            roster: Vec::new(),
            current_player_name: String::new(),
            newest_applied: None,
        }
    }

    /// Renders `snapshot` unless a response to a later request has already
    /// been rendered.
    pub fn apply(&mut self, seq: RequestSeq, snapshot: &StateSnapshot) -> ApplyOutcome {
        if let Some(newest) = self.newest_applied
            && seq <= newest
        {
            debug!(%seq, %newest, "discarding stale snapshot");
            return ApplyOutcome::Stale { seq, newest };
        }
        self.newest_applied = Some(seq);

        let board = self.board.reconcile(snapshot);
        self.roster = roster::render(&snapshot.players, &snapshot.current_player_name);
        self.current_player_name = snapshot.current_player_name.clone();
        let log_redrawn = self.log.reconcile(&snapshot.log);
        ApplyOutcome::Applied(RenderReport {
            board,
            log_redrawn,
            roster_len: self.roster.len(),
        })
    }

    pub fn board(&self) -> &BoardView {
        &self.board
    }

    pub fn log(&self) -> &LogView {
        &self.log
    }

    pub fn log_mut(&mut self) -> &mut LogView {
        &mut self.log
    }

    pub fn roster(&self) -> &[RosterEntry] {
        &self.roster
    }

    pub fn current_player_name(&self) -> &str {
        &self.current_player_name
    }

    pub fn newest_applied(&self) -> Option<RequestSeq> {
        self.newest_applied
    }

    pub fn has_rendered(&self) -> bool {
        self.newest_applied.is_some()
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;
    use crate::test_helpers::{
        player,
        snapshot,
    };

    #[test]
    fn apply__first_snapshot__renders_every_view() {
        // given
        let mut seqs = RequestSequencer::default();
        let mut engine = SyncEngine::new("MINI MONOPOLY");
        let snap = snapshot(12, vec![player("amy", 0), player("bob", 5)], &["amy joined"]);

        // when
        let outcome = engine.apply(seqs.issue(), &snap);

        // then
        let ApplyOutcome::Applied(report) = outcome else {
            panic!("expected snapshot to be applied, got {outcome:?}");
        };
        assert!(report.board.unwrap().rebuilt);
        assert!(report.log_redrawn);
        assert_eq!(report.roster_len, 2);
        assert_eq!(engine.board().marker_count(), 2);
        assert_eq!(engine.current_player_name(), "amy");
        assert!(engine.roster()[0].is_current);
    }

    #[test]
    fn apply__older_response_after_newer__is_discarded() {
        // given
        let mut seqs = RequestSequencer::default();
        let older = seqs.issue();
        let newer = seqs.issue();
        let mut engine = SyncEngine::new("");
        let fresh = snapshot(12, vec![player("amy", 7)], &["amy rolled 7"]);
        let stale = snapshot(12, vec![player("amy", 0)], &[]);
        engine.apply(newer, &fresh);

        // when
        let outcome = engine.apply(older, &stale);

        // then
        assert_eq!(
            outcome,
            ApplyOutcome::Stale {
                seq: older,
                newest: newer
            }
        );
        assert_eq!(engine.board().cell(7).unwrap().markers.len(), 1);
        assert_eq!(engine.log().lines().to_vec(), vec!["amy rolled 7".to_string()]);
        assert_eq!(engine.newest_applied(), Some(newer));
    }

    #[test]
    fn apply__same_seq_twice__second_is_discarded() {
        let mut engine = SyncEngine::new("");
        let snap = snapshot(12, Vec::new(), &[]);
        assert!(matches!(engine.apply(RequestSeq(1), &snap), ApplyOutcome::Applied(_)));
        assert!(matches!(engine.apply(RequestSeq(1), &snap), ApplyOutcome::Stale { .. }));
        assert!(matches!(engine.apply(RequestSeq(2), &snap), ApplyOutcome::Applied(_)));
    }

    #[test]
    fn apply__unchanged_snapshot__only_markers_are_recreated() {
        // given
        let mut seqs = RequestSequencer::default();
        let mut engine = SyncEngine::new("");
        let snap = snapshot(12, vec![player("amy", 4)], &["hello"]);
        engine.apply(seqs.issue(), &snap);

        // when
        let outcome = engine.apply(seqs.issue(), &snap);

        // then
        let ApplyOutcome::Applied(report) = outcome else {
            panic!("expected snapshot to be applied");
        };
        assert!(!report.board.unwrap().rebuilt);
        assert!(!report.log_redrawn);
        assert_eq!(engine.board().rebuilds(), 1);
        assert_eq!(engine.log().redraws(), 1);
    }
}
