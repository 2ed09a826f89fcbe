//! Background worker that talks to the game server.
//!
//! The worker polls the game state on a fixed period and forwards command
//! submissions. Each request is stamped with a [`RequestSeq`] when it is
//! issued; polls and commands may be in flight at the same time, and their
//! results are sent back in completion order for the engine to sort out.

use crate::{
    command::{
        CommandForm,
        CommandRequest,
        ValidationError,
    },
    engine::{
        RequestSeq,
        RequestSequencer,
    },
    server_client::GameServer,
    snapshot::StateSnapshot,
};
use color_eyre::eyre::{
    Report,
    Result,
    eyre,
};
use futures::{
    FutureExt,
    StreamExt,
    future::{
        AbortHandle,
        Abortable,
        BoxFuture,
    },
    stream::FuturesUnordered,
};
use std::time::Duration;
use tokio::{
    sync::mpsc,
    time::{
        self,
        MissedTickBehavior,
    },
};
use tracing::{
    debug,
    warn,
};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

#[derive(Debug)]
pub enum SyncCommand {
    Submit(CommandRequest),
    Shutdown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestOrigin {
    Poll,
    Command,
}

#[derive(Debug)]
pub enum SyncEvent {
    Snapshot {
        seq: RequestSeq,
        origin: RequestOrigin,
        snapshot: StateSnapshot,
    },
    Failed {
        seq: RequestSeq,
        origin: RequestOrigin,
        error: Report,
    },
}

impl SyncEvent {
    pub fn origin(&self) -> RequestOrigin {
        match self {
            SyncEvent::Snapshot { origin, .. } | SyncEvent::Failed { origin, .. } => {
                *origin
            }
        }
    }
}

/// Validates command forms and hands valid ones to the worker.
#[derive(Clone)]
pub struct CommandSubmitter {
    cmd_tx: mpsc::UnboundedSender<SyncCommand>,
}

impl CommandSubmitter {
    pub fn new(cmd_tx: mpsc::UnboundedSender<SyncCommand>) -> Self {
        Self { cmd_tx }
    }

    /// Queues the command for sending. An invalid form is rejected here and
    /// never reaches the network.
    pub fn submit(&self, form: &CommandForm) -> Result<CommandRequest, SubmitError> {
        let request = form.validate()?;
        self.cmd_tx
            .send(SyncCommand::Submit(request.clone()))
            .map_err(|_| SubmitError::WorkerStopped)?;
        Ok(request)
    }
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("sync worker is not running")]
    WorkerStopped,
}

async fn fetch_state<S: GameServer>(server: S, seq: RequestSeq) -> SyncEvent {
    let origin = RequestOrigin::Poll;
    match server.game_state().await {
        Ok(snapshot) => SyncEvent::Snapshot {
            seq,
            origin,
            snapshot,
        },
        Err(error) => SyncEvent::Failed { seq, origin, error },
    }
}

async fn send_command<S: GameServer>(
    server: S,
    seq: RequestSeq,
    request: CommandRequest,
) -> SyncEvent {
    let origin = RequestOrigin::Command;
    match server.submit_command(request).await {
        Ok(snapshot) => SyncEvent::Snapshot {
            seq,
            origin,
            snapshot,
        },
        Err(error) => SyncEvent::Failed { seq, origin, error },
    }
}

struct PendingPoll {
    seq: RequestSeq,
    abort: AbortHandle,
}

/// Runs until told to shut down or until nobody listens for events. The
/// first poll is issued immediately. At most one poll is in flight; ticks
/// that land while it is pending are skipped. A pending poll older than a
/// delivered command response is aborted.
pub async fn sync_worker<S: GameServer>(
    poll_interval: Duration,
    server: S,
    mut cmd_rx: mpsc::UnboundedReceiver<SyncCommand>,
    event_tx: mpsc::UnboundedSender<SyncEvent>,
) -> Result<()> {
    let mut sequencer = RequestSequencer::default();
    // `None` marks an aborted poll.
    let mut in_flight: FuturesUnordered<BoxFuture<'static, Option<SyncEvent>>> =
        FuturesUnordered::new();
    let mut ticker = time::interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut poll_pending: Option<PendingPoll> = None;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Some(pending) = &poll_pending {
                    debug!(pending = %pending.seq, "previous poll still in flight, skipping tick");
                    continue;
                }
                let seq = sequencer.issue();
                debug!(%seq, "polling game state");
                let (abort, registration) = AbortHandle::new_pair();
                let fetch = Abortable::new(fetch_state(server.clone(), seq), registration);
                poll_pending = Some(PendingPoll { seq, abort });
                in_flight.push(fetch.map(Result::ok).boxed());
            }
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(SyncCommand::Submit(request)) => {
                        let seq = sequencer.issue();
                        debug!(%seq, player = %request.player, "submitting command");
                        let send = send_command(server.clone(), seq, request);
                        in_flight.push(send.map(Some).boxed());
                    }
                    Some(SyncCommand::Shutdown) | None => break,
                }
            }
            Some(finished) = in_flight.next(), if !in_flight.is_empty() => {
                let Some(event) = finished else {
                    continue;
                };
                if event.origin() == RequestOrigin::Poll {
                    poll_pending = None;
                } else if let SyncEvent::Snapshot { seq, .. } = &event
                    && let Some(stale) = poll_pending.take_if(|pending| pending.seq < *seq)
                {
                    debug!(stale = %stale.seq, newer = %seq, "aborting out-of-date poll");
                    stale.abort.abort();
                }
                if let SyncEvent::Failed { seq, origin, error } = &event {
                    warn!(%seq, ?origin, %error, "game server request failed");
                }
                if event_tx.send(event).is_err() {
                    return Err(eyre!("sync event receiver dropped"));
                }
            }
        }
    }
    if !in_flight.is_empty() {
        debug!(pending = in_flight.len(), "dropping in-flight requests on shutdown");
    }
    Ok(())
}
