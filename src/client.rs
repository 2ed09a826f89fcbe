use crate::{
    board::BoardView,
    command::{
        CommandForm,
        NewGameForm,
    },
    config::AppConfig,
    engine::{
        ApplyOutcome,
        SyncEngine,
    },
    log_view::LogView,
    roster::RosterEntry,
    server_client::{
        GameServer,
        GameServerClient,
    },
    sync::{
        CommandSubmitter,
        RequestOrigin,
        SubmitError,
        SyncCommand,
        SyncEvent,
        sync_worker,
    },
    ui::{
        self,
        LogScroll,
    },
};
use chrono::{
    DateTime,
    Local,
};
use color_eyre::eyre::{
    Result,
    WrapErr,
    eyre,
};
use tokio::sync::mpsc;
use tracing::{
    debug,
    error,
    info,
    warn,
};

const MAX_ERRORS: usize = 50;

/// Borrowed view of everything the UI draws in one frame.
pub struct AppView<'a> {
    pub board: &'a BoardView,
    pub roster: &'a [RosterEntry],
    pub log: &'a LogView,
    pub status: &'a str,
    pub errors: &'a [String],
    pub last_sync: Option<DateTime<Local>>,
}

impl<'a> AppView<'a> {
    pub fn from_engine(
        engine: &'a SyncEngine,
        status: &'a str,
        errors: &'a [String],
        last_sync: Option<DateTime<Local>>,
    ) -> Self {
        Self {
            board: engine.board(),
            roster: engine.roster(),
            log: engine.log(),
            status,
            errors,
            last_sync,
        }
    }
}

pub struct AppController {
    engine: SyncEngine,
    status: String,
    errors: Vec<String>,
    last_sync: Option<DateTime<Local>>,
    polls_failing: bool,
}

impl AppController {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            engine: SyncEngine::new(title),
            status: String::from("Connecting..."),
            errors: Vec::new(),
            last_sync: None,
            polls_failing: false,
        }
    }

    pub fn engine(&self) -> &SyncEngine {
        &self.engine
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn view(&self) -> AppView<'_> {
        AppView::from_engine(&self.engine, &self.status, &self.errors, self.last_sync)
    }

    fn set_status(&mut self, message: impl Into<String>) {
        self.status = message.into();
        self.errors.clear();
    }

    fn push_errors(&mut self, mut items: Vec<String>) {
        if items.is_empty() {
            return;
        }
        for item in &items {
            error!("{}", item);
        }
        self.errors.append(&mut items);
        if self.errors.len() > MAX_ERRORS {
            let drain = self.errors.len() - MAX_ERRORS;
            self.errors.drain(0..drain);
        }
    }

    /// Applies one worker result. Returns true when the server accepted a
    /// submitted command, meaning the message input should be cleared.
    pub fn handle_sync_event(&mut self, event: SyncEvent) -> bool {
        match event {
            SyncEvent::Snapshot {
                seq,
                origin,
                snapshot,
            } => {
                match self.engine.apply(seq, &snapshot) {
                    ApplyOutcome::Applied(_) => self.last_sync = Some(Local::now()),
                    ApplyOutcome::Stale { newest, .. } => {
                        debug!(%seq, %newest, ?origin, "ignored out-of-date response");
                    }
                }
                match origin {
                    RequestOrigin::Command => {
                        self.set_status("Command sent");
                        true
                    }
                    RequestOrigin::Poll => {
                        if self.polls_failing {
                            self.polls_failing = false;
                            self.set_status("Reconnected to game server");
                        } else if !self.engine.current_player_name().is_empty() {
                            let turn =
                                format!("{}'s turn", self.engine.current_player_name());
                            if self.errors.is_empty() && self.status != turn {
                                self.status = turn;
                            }
                        }
                        false
                    }
                }
            }
            SyncEvent::Failed { seq, origin, error } => {
                let message = match origin {
                    RequestOrigin::Poll => {
                        self.polls_failing = true;
                        format!("Could not fetch game state ({seq}): {error:#}")
                    }
                    RequestOrigin::Command => {
                        format!("Command failed ({seq}): {error:#}")
                    }
                };
                self.push_errors(vec![message]);
                false
            }
        }
    }

    /// Validates the form and queues it. Validation problems are shown to the
    /// user; only a stopped worker is an error.
    pub fn submit_command(
        &mut self,
        submitter: &CommandSubmitter,
        form: &CommandForm,
    ) -> Result<()> {
        match submitter.submit(form) {
            Ok(request) => {
                self.set_status(format!(
                    "Sending '{}' as {}...",
                    request.message, request.player
                ));
                Ok(())
            }
            Err(SubmitError::Invalid(err)) => {
                self.push_errors(vec![err.to_string()]);
                Ok(())
            }
            Err(err @ SubmitError::WorkerStopped) => Err(eyre!(err)),
        }
    }

    pub fn scroll_log(&mut self, scroll: LogScroll, height: usize) {
        let log = self.engine.log_mut();
        match scroll {
            LogScroll::Up(rows) => log.scroll_up(rows, height),
            LogScroll::Down(rows) => log.scroll_down(rows, height),
            LogScroll::End => log.scroll_to_end(),
        }
    }
}

/// Asks the server to start a fresh game. The form is checked locally first
/// so an invalid size never reaches the server.
pub async fn create_game<S: GameServer>(server: &S, form: &NewGameForm) -> Result<()> {
    let request = form.validate()?;
    let board_size = request.board_size;
    server
        .new_game(request)
        .await
        .wrap_err("Could not start a new game")?;
    info!(board_size, "started new game");
    Ok(())
}

pub async fn run_app(config: AppConfig) -> Result<()> {
    let server = GameServerClient::new(config.server_url.clone())?;
    let controller = AppController::new(config.title.clone());
    let mut ui_state = ui::UiState::new(config.player_name.clone());
    let mut input_events = ui::input_event_stream();

    info!(server = %server, "Starting UI");
    ui::terminal_enter(&mut ui_state)?;
    let res = run_loop(
        controller,
        server,
        &config,
        &mut ui_state,
        &mut input_events,
    )
    .await;
    ui::terminal_exit()?;
    res
}

async fn run_loop<S: GameServer>(
    mut controller: AppController,
    server: S,
    config: &AppConfig,
    ui_state: &mut ui::UiState,
    input_events: &mut ui::InputEventReceiver,
) -> Result<()> {
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let worker = tokio::spawn(sync_worker(
        config.poll_interval,
        server,
        cmd_rx,
        event_tx,
    ));
    let submitter = CommandSubmitter::new(cmd_tx.clone());
    let mut worker_closed = false;

    ui::draw(ui_state, &controller.view()).wrap_err("initial draw failed")?;

    loop {
        tokio::select! {
            maybe_event = event_rx.recv() => {
                let Some(event) = maybe_event else {
                    warn!("sync worker channel closed");
                    worker_closed = true;
                    break;
                };
                if controller.handle_sync_event(event) {
                    ui_state.clear_message();
                }
                ui::draw(ui_state, &controller.view())
                    .wrap_err("draw after sync event failed")?;
            }
            _ = tokio::signal::ctrl_c() => {
                break;
            }
            raw_ev = ui::next_raw_event(input_events) => {
                let event = raw_ev?;
                let Some(ev) = ui::interpret_event(ui_state, event) else {
                    continue;
                };
                match ev {
                    ui::UserEvent::Quit => break,
                    ui::UserEvent::Submit => {
                        controller.submit_command(&submitter, ui_state.form())?;
                    }
                    ui::UserEvent::ScrollLog(scroll) => {
                        controller.scroll_log(scroll, ui_state.log_height());
                    }
                    ui::UserEvent::Redraw => {}
                }
                ui::draw(ui_state, &controller.view())
                    .wrap_err("draw after input failed")?;
            }
        }
    }

    let _ = cmd_tx.send(SyncCommand::Shutdown);
    match worker.await {
        Ok(Ok(())) => {
            if worker_closed {
                return Err(eyre!(
                    "Sync worker exited unexpectedly; check the game server connection"
                ));
            }
        }
        Ok(Err(err)) => {
            return Err(err).wrap_err("sync worker failed");
        }
        Err(err) => {
            return Err(eyre!(err)).wrap_err("sync worker panicked");
        }
    }
    Ok(())
}
