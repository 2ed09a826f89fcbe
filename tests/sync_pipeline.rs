#![allow(non_snake_case)]
use board_client::{
    client::{
        AppController,
        create_game,
    },
    command::{
        CommandForm,
        CommandRequest,
        NewGameForm,
        NewGameRequest,
    },
    engine::{
        ApplyOutcome,
        SyncEngine,
    },
    server_client::GameServer,
    snapshot::{
        SpaceKind,
        StateSnapshot,
    },
    sync::{
        CommandSubmitter,
        RequestOrigin,
        SyncCommand,
        SyncEvent,
        sync_worker,
    },
    test_helpers::{
        player,
        snapshot,
    },
};
use color_eyre::eyre::{
    Result,
    eyre,
};
use std::{
    sync::{
        Arc,
        Mutex,
    },
    time::Duration,
};
use tokio::sync::{
    Notify,
    mpsc,
};

const NEVER: Duration = Duration::from_secs(3600);

#[derive(Default)]
struct FakeState {
    state: Option<StateSnapshot>,
    after_command: Option<StateSnapshot>,
    polls: usize,
    commands: Vec<CommandRequest>,
    new_games: Vec<NewGameRequest>,
}

#[derive(Clone, Default)]
struct FakeGameServer {
    inner: Arc<Mutex<FakeState>>,
    poll_gate: Option<Arc<Notify>>,
}

impl FakeGameServer {
    fn serving(state: StateSnapshot) -> Self {
        let server = Self::default();
        server.inner.lock().unwrap().state = Some(state);
        server
    }

    fn polls(&self) -> usize {
        self.inner.lock().unwrap().polls
    }

    fn commands(&self) -> Vec<CommandRequest> {
        self.inner.lock().unwrap().commands.clone()
    }
}

impl GameServer for FakeGameServer {
    async fn game_state(&self) -> Result<StateSnapshot> {
        let state = {
            let mut inner = self.inner.lock().unwrap();
            inner.polls += 1;
            inner.state.clone()
        };
        if let Some(gate) = &self.poll_gate {
            gate.notified().await;
        }
        state.ok_or_else(|| eyre!("connection refused"))
    }

    async fn submit_command(&self, request: CommandRequest) -> Result<StateSnapshot> {
        let mut inner = self.inner.lock().unwrap();
        inner.commands.push(request);
        inner
            .after_command
            .clone()
            .or_else(|| inner.state.clone())
            .ok_or_else(|| eyre!("connection refused"))
    }

    async fn new_game(&self, request: NewGameRequest) -> Result<()> {
        self.inner.lock().unwrap().new_games.push(request);
        Ok(())
    }
}

struct Worker {
    cmd_tx: mpsc::UnboundedSender<SyncCommand>,
    event_rx: mpsc::UnboundedReceiver<SyncEvent>,
    handle: tokio::task::JoinHandle<Result<()>>,
}

fn spawn_worker(server: FakeGameServer, poll_interval: Duration) -> Worker {
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let handle = tokio::spawn(sync_worker(poll_interval, server, cmd_rx, event_tx));
    Worker {
        cmd_tx,
        event_rx,
        handle,
    }
}

async fn next_event(worker: &mut Worker) -> SyncEvent {
    tokio::time::timeout(Duration::from_secs(5), worker.event_rx.recv())
        .await
        .expect("timed out waiting for sync event")
        .expect("worker closed the event channel")
}

#[tokio::test]
async fn sync_worker__first_poll__is_issued_immediately() {
    // given
    let server = FakeGameServer::serving(snapshot(
        12,
        vec![player("amy", 2)],
        &["amy joined"],
    ));
    let mut worker = spawn_worker(server, NEVER);
    let mut engine = SyncEngine::new("MINI MONOPOLY");

    // when
    let event = next_event(&mut worker).await;

    // then
    let SyncEvent::Snapshot {
        seq,
        origin,
        snapshot,
    } = event
    else {
        panic!("expected a snapshot");
    };
    assert_eq!(origin, RequestOrigin::Poll);
    assert_eq!(seq.value(), 1);
    assert!(matches!(engine.apply(seq, &snapshot), ApplyOutcome::Applied(_)));
    assert_eq!(engine.board().cell(2).unwrap().markers.len(), 1);
}

#[tokio::test]
async fn sync_worker__unreachable_server__view_is_left_alone() {
    // given
    let server = FakeGameServer::default();
    let mut worker = spawn_worker(server, NEVER);
    let mut controller = AppController::new("MINI MONOPOLY");

    // when
    let event = next_event(&mut worker).await;
    assert_eq!(event.origin(), RequestOrigin::Poll);
    controller.handle_sync_event(event);

    // then
    assert!(!controller.engine().has_rendered());
    assert!(controller.engine().board().is_empty());
    assert_eq!(controller.errors().len(), 1);
}

#[tokio::test]
async fn submit__empty_player_name__never_reaches_server() {
    // given
    let server = FakeGameServer::serving(snapshot(8, Vec::new(), &[]));
    let mut worker = spawn_worker(server.clone(), NEVER);
    let submitter = CommandSubmitter::new(worker.cmd_tx.clone());
    let form = CommandForm {
        player_name: "  ".into(),
        message: "!roll".into(),
    };

    // when
    let result = submitter.submit(&form);
    next_event(&mut worker).await;

    // then
    assert!(result.is_err());
    assert!(server.commands().is_empty());
}

#[tokio::test]
async fn submit__valid_command__response_is_rendered() {
    // given
    let server = FakeGameServer::serving(snapshot(12, vec![player("amy", 0)], &[]));
    server.inner.lock().unwrap().after_command = Some(snapshot(
        12,
        vec![player("amy", 4)],
        &["amy rolled 4"],
    ));
    let mut worker = spawn_worker(server.clone(), NEVER);
    let mut controller = AppController::new("MINI MONOPOLY");
    let submitter = CommandSubmitter::new(worker.cmd_tx.clone());
    controller.handle_sync_event(next_event(&mut worker).await);

    // when
    controller
        .submit_command(&submitter, &CommandForm {
            player_name: "amy".into(),
            message: "!roll".into(),
        })
        .unwrap();
    let event = next_event(&mut worker).await;

    // then
    assert_eq!(event.origin(), RequestOrigin::Command);
    assert!(controller.handle_sync_event(event));
    assert_eq!(
        server.commands(),
        vec![CommandRequest {
            player: "amy".into(),
            message: "!roll".into(),
        }]
    );
    assert_eq!(controller.engine().board().cell(4).unwrap().markers.len(), 1);
    assert_eq!(
        controller.engine().log().lines().to_vec(),
        vec!["amy rolled 4".to_string()]
    );
}

#[tokio::test]
async fn sync_worker__poll_older_than_command_response__is_aborted() {
    // given
    let gate = Arc::new(Notify::new());
    let mut server = FakeGameServer::serving(snapshot(12, vec![player("amy", 0)], &[]));
    server.poll_gate = Some(gate.clone());
    server.inner.lock().unwrap().after_command =
        Some(snapshot(12, vec![player("amy", 9)], &["amy rolled 9"]));
    let mut worker = spawn_worker(server.clone(), NEVER);
    let mut controller = AppController::new("");
    while server.polls() == 0 {
        tokio::task::yield_now().await;
    }

    // when
    worker
        .cmd_tx
        .send(SyncCommand::Submit(CommandRequest {
            player: "amy".into(),
            message: "!roll".into(),
        }))
        .unwrap();
    let command_event = next_event(&mut worker).await;
    assert_eq!(command_event.origin(), RequestOrigin::Command);
    controller.handle_sync_event(command_event);
    gate.notify_one();
    let late =
        tokio::time::timeout(Duration::from_millis(200), worker.event_rx.recv()).await;

    // then
    assert!(late.is_err(), "out-of-date poll was delivered");
    assert_eq!(controller.engine().board().cell(9).unwrap().markers.len(), 1);
    assert!(controller.engine().board().cell(0).unwrap().markers.is_empty());
    assert_eq!(controller.engine().newest_applied().map(|s| s.value()), Some(2));
}

#[tokio::test]
async fn sync_worker__hung_poll__later_ticks_are_skipped() {
    // given
    let gate = Arc::new(Notify::new());
    let mut server = FakeGameServer::serving(snapshot(8, Vec::new(), &[]));
    server.poll_gate = Some(gate.clone());
    let mut worker = spawn_worker(server.clone(), Duration::from_millis(10));

    // when
    tokio::time::sleep(Duration::from_millis(200)).await;

    // then
    assert_eq!(server.polls(), 1);

    // when
    gate.notify_one();
    let event = next_event(&mut worker).await;

    // then
    assert_eq!(event.origin(), RequestOrigin::Poll);
    assert!(matches!(event, SyncEvent::Snapshot { .. }));
    tokio::time::timeout(Duration::from_secs(5), async {
        while server.polls() < 2 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("polling did not resume");
}

#[tokio::test]
async fn sync_worker__shutdown__stops_cleanly() {
    // given
    let server = FakeGameServer::serving(snapshot(8, Vec::new(), &[]));
    let mut worker = spawn_worker(server, NEVER);
    next_event(&mut worker).await;

    // when
    worker.cmd_tx.send(SyncCommand::Shutdown).unwrap();

    // then
    let result = worker.handle.await.unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn create_game__invalid_board_size__is_not_sent() {
    // given
    let server = FakeGameServer::default();
    let form = NewGameForm {
        board_size: 10,
        image_urls: Vec::new(),
    };

    // when
    let result = create_game(&server, &form).await;

    // then
    assert!(result.is_err());
    assert!(server.inner.lock().unwrap().new_games.is_empty());
}

#[tokio::test]
async fn create_game__valid_form__sends_size_and_images() {
    // given
    let server = FakeGameServer::default();
    let form = NewGameForm {
        board_size: 16,
        image_urls: vec![
            (SpaceKind::Go, "https://img.example/go.png".into()),
            (SpaceKind::Jail, String::new()),
        ],
    };

    // when
    create_game(&server, &form).await.unwrap();

    // then
    let new_games = server.inner.lock().unwrap().new_games.clone();
    assert_eq!(new_games.len(), 1);
    assert_eq!(new_games[0].board_size, 16);
    assert_eq!(new_games[0].image_urls.len(), 1);
    assert!(new_games[0].image_urls.contains_key(&SpaceKind::Go));
}
