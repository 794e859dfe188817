use serde::{Deserialize, Serialize};

/// A single top-level comment as returned by the feed. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub reply_id: u64,
    pub uid: u64,
    pub uname: String,
    pub msg: String,
    /// Publication time, unix seconds.
    pub ctime: i64,
    pub oid: u64,
}

/// Type code of a comment board on the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub enum BoardKind {
    Video,
    DynamicImage,
    Article,
    Dynamic,
    Other(u32),
}

impl BoardKind {
    pub fn code(self) -> u32 {
        match self {
            BoardKind::Video => 1,
            BoardKind::DynamicImage => 11,
            BoardKind::Article => 12,
            BoardKind::Dynamic => 17,
            BoardKind::Other(code) => code,
        }
    }
}

impl From<u32> for BoardKind {
    fn from(code: u32) -> Self {
        match code {
            1 => BoardKind::Video,
            11 => BoardKind::DynamicImage,
            12 => BoardKind::Article,
            17 => BoardKind::Dynamic,
            other => BoardKind::Other(other),
        }
    }
}

impl From<BoardKind> for u32 {
    fn from(kind: BoardKind) -> Self {
        kind.code()
    }
}

impl Default for BoardKind {
    fn default() -> Self {
        BoardKind::Dynamic
    }
}

/// The monitored comment feed plus its running totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub oid: u64,
    pub kind: BoardKind,
    pub name: String,
    pub dynamic_id: u64,
    /// Video id when the board belongs to a video, empty otherwise.
    pub bv_id: String,
    /// Total comments including nested replies.
    pub all_count: i64,
    /// Top-level comments only.
    pub count: i64,
}

impl Board {
    pub fn new(name: impl Into<String>, oid: u64, kind: BoardKind) -> Self {
        Self {
            oid,
            kind,
            name: name.into(),
            ..Default::default()
        }
    }

    /// Stable identity of the board.
    pub fn key(&self) -> (u64, BoardKind) {
        (self.oid, self.kind)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub uid: u64,
    pub uname: String,
    pub alias: String,
}

/// An account whose activity and follower count are tracked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorAccount {
    pub account: Account,
    pub follower: i64,
}

impl MonitorAccount {
    pub fn new(uid: u64, alias: impl Into<String>) -> Self {
        Self {
            account: Account {
                uid,
                alias: alias.into(),
                ..Default::default()
            },
            follower: 0,
        }
    }

    pub fn uid(&self) -> u64 {
        self.account.uid
    }

    pub fn alias(&self) -> &str {
        &self.account.alias
    }
}
