use std::collections::BTreeMap;

use rocket::serde::json::Value;
use rocket::serde::{Deserialize, Serialize};

use super::*;

pub const PLAYER_ID_LEN: usize = 32;
pub const NAME_LEN: usize = 64;
pub const DESCRIPTION_LEN: usize = 256;
pub const SCORING_LEN: usize = 256;

/// A crowd-sourced game, as stored in the `games` table.
#[derive(Clone, Serialize, Deserialize, PartialEq, Debug)]
#[serde(crate = "rocket::serde")]
pub struct Game {
    pub id: GameId,
    /// The player who created the game.
    pub player_id: String,
    pub name: String,
    pub description: String,
    pub scoring: String,
    pub timestamp: Option<String>,
}

impl Columns for Game {
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "player_id",
        "name",
        "description",
        "scoring",
        "timestamp",
    ];
}

impl Game {
    pub(super) fn from_row(row: &sqlx::any::AnyRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get_unchecked::<GameId, _>("id")?,
            player_id: row.try_get_unchecked::<String, _>("player_id")?,
            name: row.try_get_unchecked::<String, _>("name")?,
            description: row.try_get_unchecked::<String, _>("description")?,
            scoring: row.try_get_unchecked::<String, _>("scoring")?,
            timestamp: row.try_get_unchecked::<Option<String>, _>("timestamp")?,
        })
    }

    /// Plain column-to-value mapping of this game.
    pub fn to_fields(&self) -> BTreeMap<String, Value> {
        match rocket::serde::json::serde_json::to_value(self) {
            Ok(Value::Object(map)) => project::<Self, _, _, _>(map),
            _ => BTreeMap::new(),
        }
    }
}

/// Untrusted input for creating or replacing a game.
/// Only the writable columns are accepted, anything else is dropped.
#[derive(Clone, Default, Deserialize, Debug)]
#[serde(crate = "rocket::serde")]
pub struct GameDraft {
    pub player_id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub scoring: Option<String>,
}

impl Columns for GameDraft {
    const COLUMNS: &'static [&'static str] = &["player_id", "name", "description", "scoring"];
}

/// Form submission of a game. Fields may repeat, the first value wins.
#[derive(Clone, Default, FromForm, Debug)]
pub struct GameForm {
    pub player_id: Vec<String>,
    pub name: Vec<String>,
    pub description: Vec<String>,
    pub scoring: Vec<String>,
}

impl From<GameForm> for GameDraft {
    fn from(form: GameForm) -> Self {
        Self {
            player_id: first(form.player_id),
            name: first(form.name),
            description: first(form.description),
            scoring: first(form.scoring),
        }
    }
}

/// A game that passed validation and can be written to the store.
#[derive(Clone, PartialEq, Debug)]
pub struct NewGame {
    pub player_id: String,
    pub name: String,
    pub description: String,
    pub scoring: String,
}

impl GameDraft {
    pub fn validate(self) -> RequestResult<NewGame> {
        Ok(NewGame {
            player_id: required("player_id", self.player_id, PLAYER_ID_LEN)?,
            name: required("name", self.name, NAME_LEN)?,
            description: required("description", self.description, DESCRIPTION_LEN)?,
            scoring: required("scoring", self.scoring, SCORING_LEN)?,
        })
    }
}

pub(super) fn first(values: Vec<String>) -> Option<String> {
    values.into_iter().next()
}

pub(super) fn required(
    field: &'static str,
    value: Option<String>,
    max: usize,
) -> RequestResult<String> {
    let value = value.ok_or(RequestError::MissingField { field })?;
    bounded(field, value, max)
}

pub(super) fn bounded(field: &'static str, value: String, max: usize) -> RequestResult<String> {
    if value.chars().count() > max {
        return Err(RequestError::FieldTooLong { field, max });
    }
    Ok(value)
}
