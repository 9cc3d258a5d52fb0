use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Position {
    #[serde(rename = "L")]
    Left,
    #[serde(rename = "M")]
    Middle,
    #[serde(rename = "R")]
    Right,
}

impl Default for Position {
    fn default() -> Self {
        Position::Middle
    }
}

impl Position {
    pub fn as_str(&self) -> &'static str {
        match self {
            Position::Left => "L",
            Position::Middle => "M",
            Position::Right => "R",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum RecordStatus {
    Pending,
    Hit,
    Miss,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Pending => "pending",
            RecordStatus::Hit => "hit",
            RecordStatus::Miss => "miss",
        }
    }
}

/// Resolution of a pending record. There is no way back to `Pending`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Outcome {
    Hit,
    Miss,
}

impl From<Outcome> for RecordStatus {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Hit => RecordStatus::Hit,
            Outcome::Miss => RecordStatus::Miss,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LedgerRecord {
    pub id: i64,
    pub name: String,
    pub number: String,
    pub position: Position,
    pub created_at_ms: i64,
    pub status: RecordStatus,
}

/// Field updates for a confirmed record. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecordPatch {
    pub name: Option<String>,
    pub number: Option<String>,
    pub position: Option<Position>,
    pub status: Option<Outcome>,
}
