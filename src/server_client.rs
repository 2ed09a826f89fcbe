use std::{
    collections::BTreeMap,
    fmt,
    future::Future,
    time::Duration,
};

use color_eyre::eyre::{
    Result,
    WrapErr,
    eyre,
};
use serde::{
    Deserialize,
    Serialize,
};

use crate::{
    command::{
        CommandRequest,
        NewGameRequest,
    },
    snapshot::{
        Player,
        Space,
        SpaceKind,
        StateSnapshot,
    },
};

/// Upper bound for any single request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// The authoritative game server, as seen by the client.
pub trait GameServer: Clone + Send + Sync + 'static {
    fn game_state(&self) -> impl Future<Output = Result<StateSnapshot>> + Send;

    /// Sends a player command; the server answers with the state after the
    /// command was applied.
    fn submit_command(
        &self,
        request: CommandRequest,
    ) -> impl Future<Output = Result<StateSnapshot>> + Send;

    fn new_game(&self, request: NewGameRequest) -> impl Future<Output = Result<()>> + Send;
}

#[derive(Clone)]
pub struct GameServerClient {
    base_url: String,
    http: reqwest::Client,
}

impl GameServerClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .wrap_err("failed to build HTTP client for game server")?;
        Ok(Self { base_url, http })
    }

    async fn read_snapshot(
        res: reqwest::Response,
        context: &'static str,
    ) -> Result<StateSnapshot> {
        let status = res.status();
        let bytes = res
            .bytes()
            .await
            .wrap_err("failed to read game server response body")?;
        if !status.is_success() {
            let body = String::from_utf8_lossy(&bytes);
            return Err(eyre!(
                "game server responded with {status} when {context}: {body}"
            ));
        }
        let dto: StateSnapshotDto =
            serde_json::from_slice(&bytes).wrap_err("invalid game state payload")?;
        Ok(dto.into())
    }
}

impl GameServer for GameServerClient {
    async fn game_state(&self) -> Result<StateSnapshot> {
        let url = format!("{}/api/game_state", self.base_url);
        let res = self
            .http
            .get(url)
            .send()
            .await
            .wrap_err("game server request failed")?;
        Self::read_snapshot(res, "fetching game state").await
    }

    async fn submit_command(&self, request: CommandRequest) -> Result<StateSnapshot> {
        let url = format!("{}/api/command", self.base_url);
        let res = self
            .http
            .post(url)
            .json(&CommandDto::from(request))
            .send()
            .await
            .wrap_err("game server request failed")?;
        Self::read_snapshot(res, "submitting command").await
    }

    async fn new_game(&self, request: NewGameRequest) -> Result<()> {
        let url = format!("{}/api/new_game", self.base_url);
        let res = self
            .http
            .post(url)
            .json(&NewGameDto::from(request))
            .send()
            .await
            .wrap_err("game server request failed")?;
        let status = res.status();
        if !status.is_success() {
            let body = res
                .text()
                .await
                .unwrap_or_else(|_| "<unavailable body>".to_string());
            return Err(eyre!(
                "game server responded with {status} when creating a new game: {body}"
            ));
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct CommandDto {
    player: String,
    message: String,
}

#[derive(Serialize)]
struct NewGameDto {
    board_size: u32,
    image_urls: BTreeMap<&'static str, String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StateSnapshotDto {
    #[serde(default)]
    players: Vec<PlayerDto>,
    #[serde(default)]
    board: Vec<SpaceDto>,
    #[serde(default)]
    log: Vec<String>,
    #[serde(default)]
    current_player_name: Option<String>,
}

#[derive(Deserialize)]
struct PlayerDto {
    name: String,
    #[serde(default)]
    money: i64,
    #[serde(default)]
    properties: Vec<String>,
    #[serde(default)]
    position: i64,
}

/// Spaces arrive as structured records; older servers send the descriptive
/// text instead.
#[derive(Deserialize)]
#[serde(untagged)]
enum SpaceDto {
    Record(SpaceRecordDto),
    Legacy(String),
}

#[derive(Deserialize)]
struct SpaceRecordDto {
    name: String,
    #[serde(rename = "type", default = "unknown_kind")]
    kind: SpaceKindDto,
    #[serde(default)]
    owner: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
}

fn unknown_kind() -> SpaceKindDto {
    SpaceKindDto::Unknown
}

#[derive(Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum SpaceKindDto {
    Property,
    Chance,
    Tax,
    Go,
    Jail,
    FreeParking,
    GoToJail,
    #[serde(other)]
    Unknown,
}

impl From<CommandRequest> for CommandDto {
    fn from(value: CommandRequest) -> Self {
        CommandDto {
            player: value.player,
            message: value.message,
        }
    }
}

impl From<NewGameRequest> for NewGameDto {
    fn from(value: NewGameRequest) -> Self {
        NewGameDto {
            board_size: value.board_size,
            image_urls: value
                .image_urls
                .into_iter()
                .map(|(kind, url)| (kind.wire_name(), url))
                .collect(),
        }
    }
}

impl From<StateSnapshotDto> for StateSnapshot {
    fn from(dto: StateSnapshotDto) -> Self {
        StateSnapshot {
            players: dto.players.into_iter().map(Into::into).collect(),
            board: dto.board.into_iter().map(Into::into).collect(),
            log: dto.log,
            current_player_name: dto.current_player_name.unwrap_or_default(),
        }
    }
}

impl From<PlayerDto> for Player {
    fn from(dto: PlayerDto) -> Self {
        Player {
            name: dto.name,
            money: dto.money,
            properties: dto.properties,
            position: dto.position,
        }
    }
}

impl From<SpaceDto> for Space {
    fn from(dto: SpaceDto) -> Self {
        match dto {
            SpaceDto::Record(record) => Space {
                name: record.name,
                kind: record.kind.into(),
                owner: non_empty(record.owner),
                image_url: non_empty(record.image_url),
            },
            SpaceDto::Legacy(text) => Space::from_legacy_text(&text),
        }
    }
}

impl From<SpaceKindDto> for SpaceKind {
    fn from(value: SpaceKindDto) -> Self {
        match value {
            SpaceKindDto::Property => SpaceKind::Property,
            SpaceKindDto::Chance => SpaceKind::Chance,
            SpaceKindDto::Tax => SpaceKind::Tax,
            SpaceKindDto::Go => SpaceKind::Go,
            SpaceKindDto::Jail => SpaceKind::Jail,
            SpaceKindDto::FreeParking => SpaceKind::FreeParking,
            SpaceKindDto::GoToJail => SpaceKind::GoToJail,
            SpaceKindDto::Unknown => SpaceKind::Unknown,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl fmt::Display for GameServerClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base_url)
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;
    use serde_json::json;

    fn decode(value: serde_json::Value) -> StateSnapshot {
        let dto: StateSnapshotDto = serde_json::from_value(value).unwrap();
        dto.into()
    }

    #[test]
    fn state_snapshot__structured_payload__decodes_into_model() {
        // given
        let payload = json!({
            "players": [
                {"name": "amy", "money": 1440, "properties": ["Cotton Street"], "position": 1}
            ],
            "board": [
                {"name": "GO", "type": "GO", "image_url": "https://img.example/go.png"},
                {"name": "Cotton Street", "type": "PROPERTY", "owner": "amy"},
                {"name": "Chance", "type": "CHANCE", "owner": null, "image_url": ""},
                {"name": "Lava", "type": "LAVA"}
            ],
            "log": ["amy bought Cotton Street"],
            "currentPlayerName": "amy"
        });

        // when
        let snapshot = decode(payload);

        // then
        assert_eq!(snapshot.players[0].properties, vec!["Cotton Street".to_string()]);
        assert_eq!(snapshot.board[0].kind, SpaceKind::Go);
        assert_eq!(
            snapshot.board[0].image_url.as_deref(),
            Some("https://img.example/go.png")
        );
        assert_eq!(snapshot.board[1].owner.as_deref(), Some("amy"));
        assert_eq!(snapshot.board[2].image_url, None);
        assert_eq!(snapshot.board[3].kind, SpaceKind::Unknown);
        assert_eq!(snapshot.current_player_name, "amy");
    }

    #[test]
    fn state_snapshot__legacy_text_spaces__fall_back_to_display_text() {
        // given
        let payload = json!({
            "players": [],
            "board": [
                "[GO]",
                "[Pearl Sq (Pink) - Price: $140, Rent: $10, Owner: bob]",
                "garbled"
            ],
            "log": [],
            "currentPlayerName": null
        });

        // when
        let snapshot = decode(payload);

        // then
        assert_eq!(snapshot.board[0].name, "GO");
        assert_eq!(snapshot.board[1].name, "Pearl Sq");
        assert_eq!(snapshot.board[1].kind, SpaceKind::Property);
        assert_eq!(snapshot.board[1].owner.as_deref(), Some("bob"));
        assert_eq!(snapshot.board[2].name, "garbled");
        assert_eq!(snapshot.current_player_name, "");
    }

    #[test]
    fn new_game_dto__serializes_type_names_as_keys() {
        // given
        let mut image_urls = BTreeMap::new();
        image_urls.insert(SpaceKind::FreeParking, "https://img.example/fp.png".to_string());
        let request = NewGameRequest {
            board_size: 16,
            image_urls,
        };

        // when
        let value = serde_json::to_value(NewGameDto::from(request)).unwrap();

        // then
        assert_eq!(
            value,
            json!({
                "board_size": 16,
                "image_urls": {"FREE_PARKING": "https://img.example/fp.png"}
            })
        );
    }

    #[test]
    fn new__trailing_slash__is_trimmed() {
        let client = GameServerClient::new("http://127.0.0.1:5002/").unwrap();
        assert_eq!(client.to_string(), "http://127.0.0.1:5002");
    }
}
