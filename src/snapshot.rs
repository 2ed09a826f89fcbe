use std::fmt;

/// Complete game state as returned by the server. Never mutated by the
/// client; each one fully replaces the previous one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StateSnapshot {
    pub players: Vec<Player>,
    pub board: Vec<Space>,
    pub log: Vec<String>,
    pub current_player_name: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Player {
    pub name: String,
    pub money: i64,
    /// Names of owned spaces, in the order the server lists them.
    pub properties: Vec<String>,
    pub position: i64,
}

impl Player {
    /// The board index this player stands on, if it is valid for a board of
    /// `board_len` spaces.
    pub fn board_index(&self, board_len: usize) -> Option<usize> {
        usize::try_from(self.position)
            .ok()
            .filter(|index| *index < board_len)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Space {
    pub name: String,
    pub kind: SpaceKind,
    pub owner: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SpaceKind {
    Property,
    Chance,
    Tax,
    Go,
    Jail,
    FreeParking,
    GoToJail,
    /// A type this client does not know, or a legacy text-only space.
    Unknown,
}

impl SpaceKind {
    pub const ALL: [SpaceKind; 7] = [
        SpaceKind::Property,
        SpaceKind::Chance,
        SpaceKind::Tax,
        SpaceKind::Go,
        SpaceKind::Jail,
        SpaceKind::FreeParking,
        SpaceKind::GoToJail,
    ];

    pub fn wire_name(&self) -> &'static str {
        match self {
            SpaceKind::Property => "PROPERTY",
            SpaceKind::Chance => "CHANCE",
            SpaceKind::Tax => "TAX",
            SpaceKind::Go => "GO",
            SpaceKind::Jail => "JAIL",
            SpaceKind::FreeParking => "FREE_PARKING",
            SpaceKind::GoToJail => "GO_TO_JAIL",
            SpaceKind::Unknown => "UNKNOWN",
        }
    }

    pub fn from_wire_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.wire_name().eq_ignore_ascii_case(name.trim()))
    }
}

impl fmt::Display for SpaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl Space {
    /// Builds a space from the legacy descriptive form, e.g.
    /// `[Cotton Street (Light Blue) - Price: $60, Rent: $2, Owner: bob]`.
    ///
    /// Text that does not have the bracketed shape is kept verbatim as the
    /// display name.
    pub fn from_legacy_text(text: &str) -> Self {
        let name = legacy_name(text).unwrap_or(text).to_string();
        let is_property = text.contains("Price:");
        Space {
            name,
            kind: if is_property {
                SpaceKind::Property
            } else {
                SpaceKind::Unknown
            },
            owner: if is_property {
                legacy_owner(text)
            } else {
                None
            },
            image_url: None,
        }
    }
}

fn legacy_name(text: &str) -> Option<&str> {
    let inner = text.trim().strip_prefix('[')?;
    let end = [" (", " -", "]"]
        .iter()
        .filter_map(|sep| inner.find(sep))
        .min()?;
    let name = inner[..end].trim();
    (!name.is_empty()).then_some(name)
}

fn legacy_owner(text: &str) -> Option<String> {
    let (_, rest) = text.split_once("Owner: ")?;
    let owner: String = rest
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .collect();
    (!owner.is_empty()).then_some(owner)
}
