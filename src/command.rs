//! Local validation for everything the client sends to the server.
//! Nothing here performs I/O; a form that fails validation never becomes a
//! request.

use crate::snapshot::SpaceKind;
use std::collections::BTreeMap;

pub const MIN_BOARD_SIZE: i64 = 8;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Player Name and Command are required.")]
    MissingCommandFields,
    #[error("Board Size must be a multiple of 4 and at least 8 (got {0}).")]
    InvalidBoardSize(i64),
    #[error("Unknown space type '{0}'.")]
    UnknownSpaceKind(String),
}

/// A chat-style command typed by a player, e.g. `!roll`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandRequest {
    pub player: String,
    pub message: String,
}

/// The two text inputs of the command form.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandForm {
    pub player_name: String,
    pub message: String,
}

impl CommandForm {
    pub fn new(player_name: impl Into<String>) -> Self {
        Self {
            player_name: player_name.into(),
            message: String::new(),
        }
    }

    pub fn validate(&self) -> Result<CommandRequest, ValidationError> {
        let player = self.player_name.trim();
        let message = self.message.trim();
        if player.is_empty() || message.is_empty() {
            return Err(ValidationError::MissingCommandFields);
        }
        Ok(CommandRequest {
            player: player.to_string(),
            message: message.to_string(),
        })
    }

    pub fn clear_message(&mut self) {
        self.message.clear();
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewGameRequest {
    pub board_size: u32,
    /// Background image per space type. Types without an image are absent.
    pub image_urls: BTreeMap<SpaceKind, String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NewGameForm {
    pub board_size: i64,
    pub image_urls: Vec<(SpaceKind, String)>,
}

impl NewGameForm {
    pub fn validate(&self) -> Result<NewGameRequest, ValidationError> {
        let board_size = self.board_size;
        if board_size < MIN_BOARD_SIZE || board_size % 4 != 0 {
            return Err(ValidationError::InvalidBoardSize(board_size));
        }
        let board_size = u32::try_from(board_size)
            .map_err(|_| ValidationError::InvalidBoardSize(board_size))?;
        let image_urls = self
            .image_urls
            .iter()
            .filter(|(_, url)| !url.trim().is_empty())
            .map(|(kind, url)| (*kind, url.trim().to_string()))
            .collect();
        Ok(NewGameRequest {
            board_size,
            image_urls,
        })
    }
}

/// Parses a `TYPE=URL` pair as given on the command line.
pub fn parse_image_arg(raw: &str) -> Result<(SpaceKind, String), ValidationError> {
    let (kind, url) = raw.split_once('=').unwrap_or((raw, ""));
    let kind = SpaceKind::from_wire_name(kind)
        .ok_or_else(|| ValidationError::UnknownSpaceKind(kind.trim().to_string()))?;
    Ok((kind, url.trim().to_string()))
}
