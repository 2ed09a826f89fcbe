use crate::{
    command::{
        NewGameForm,
        parse_image_arg,
    },
    snapshot::SpaceKind,
    sync::DEFAULT_POLL_INTERVAL,
};
use clap::{
    Parser,
    Subcommand,
};
use color_eyre::eyre::{
    Result,
    WrapErr,
    eyre,
};
use std::{
    path::PathBuf,
    time::Duration,
};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5002";
pub const DEFAULT_TITLE: &str = "MINI MONOPOLY";
const LOG_FILE_NAME: &str = "board-client.log";

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Base URL of the game server
    #[arg(long, default_value = DEFAULT_SERVER_URL)]
    pub server_url: String,

    #[arg(long, default_value_t = DEFAULT_POLL_INTERVAL.as_millis() as u64)]
    pub poll_interval_ms: u64,

    /// Prefill the player name field
    #[arg(short, long)]
    pub player: Option<String>,

    /// Directory for the client log file
    #[arg(long, default_value = "./logs")]
    pub log_dir: String,

    /// Text shown in the middle of the board
    #[arg(long, default_value = DEFAULT_TITLE)]
    pub title: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a new game on the server, then open it
    NewGame {
        #[arg(long)]
        board_size: i64,

        /// Background image for a space type, as TYPE=URL (repeatable)
        #[arg(long = "image", value_parser = image_arg)]
        images: Vec<(SpaceKind, String)>,
    },
}

fn image_arg(raw: &str) -> Result<(SpaceKind, String), String> {
    parse_image_arg(raw).map_err(|e| e.to_string())
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server_url: String,
    pub poll_interval: Duration,
    pub player_name: Option<String>,
    pub title: String,
}

impl Args {
    pub fn app_config(&self) -> Result<AppConfig> {
        if self.poll_interval_ms == 0 {
            return Err(eyre!("--poll-interval-ms must be greater than zero"));
        }
        Ok(AppConfig {
            server_url: self.server_url.clone(),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            player_name: self.player.clone(),
            title: self.title.clone(),
        })
    }

    pub fn new_game_form(&self) -> Option<NewGameForm> {
        match &self.command {
            Some(Command::NewGame { board_size, images }) => Some(NewGameForm {
                board_size: *board_size,
                image_urls: images.clone(),
            }),
            None => None,
        }
    }

    pub fn log_dir(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.log_dir).into_owned())
    }
}

/// Sends tracing output to a file; the terminal belongs to the UI. Keep the
/// returned guard alive for the life of the process.
pub fn init_tracing(log_dir: PathBuf) -> Result<WorkerGuard> {
    std::fs::create_dir_all(&log_dir)
        .wrap_err_with(|| format!("failed to create log directory {}", log_dir.display()))?;
    let appender = tracing_appender::rolling::never(log_dir, LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|e| eyre!("failed to install tracing subscriber: {e}"))?;
    Ok(guard)
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;

    #[test]
    fn parse__defaults__match_server_defaults() {
        let args = Args::try_parse_from(["board-client"]).unwrap();
        let config = args.app_config().unwrap();
        assert_eq!(config.server_url, DEFAULT_SERVER_URL);
        assert_eq!(config.poll_interval, Duration::from_millis(2000));
        assert_eq!(config.title, DEFAULT_TITLE);
        assert!(args.new_game_form().is_none());
    }

    #[test]
    fn parse__new_game_with_images__builds_form() {
        // given
        let argv = [
            "board-client",
            "--player",
            "amy",
            "new-game",
            "--board-size",
            "16",
            "--image",
            "GO=https://img.example/go.png",
            "--image",
            "TAX=",
        ];

        // when
        let args = Args::try_parse_from(argv).unwrap();

        // then
        let form = args.new_game_form().unwrap();
        assert_eq!(form.board_size, 16);
        assert_eq!(
            form.image_urls,
            vec![
                (SpaceKind::Go, "https://img.example/go.png".to_string()),
                (SpaceKind::Tax, String::new()),
            ]
        );
        assert_eq!(args.app_config().unwrap().player_name.as_deref(), Some("amy"));
    }

    #[test]
    fn parse__unknown_image_type__is_rejected() {
        let argv = ["board-client", "new-game", "--board-size", "12", "--image", "LAVA=x"];
        assert!(Args::try_parse_from(argv).is_err());
    }

    #[test]
    fn app_config__zero_poll_interval__is_rejected() {
        let args = Args::try_parse_from(["board-client", "--poll-interval-ms", "0"]).unwrap();
        assert!(args.app_config().is_err());
    }
}
