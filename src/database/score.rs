use rocket::serde::{Deserialize, Serialize};

use super::game::{bounded, first, required, PLAYER_ID_LEN};
use super::*;

pub const SCORE_LEN: usize = 32;
pub const EXPLANATION_LEN: usize = 256;
pub const FEEDBACK_LEN: usize = 256;

/// One player's result for a game, as stored in the `game_scores` table.
/// The score is free text, not a number.
#[derive(Clone, Serialize, Deserialize, PartialEq, Debug)]
#[serde(crate = "rocket::serde")]
pub struct GameScore {
    pub id: ScoreId,
    pub game_id: GameId,
    pub player_id: String,
    pub score: String,
    pub explanation: Option<String>,
    pub feedback: Option<String>,
}

impl Columns for GameScore {
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "game_id",
        "player_id",
        "score",
        "explanation",
        "feedback",
    ];
}

impl GameScore {
    pub(super) fn from_row(row: &sqlx::any::AnyRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get_unchecked::<ScoreId, _>("id")?,
            game_id: row.try_get_unchecked::<GameId, _>("game_id")?,
            player_id: row.try_get_unchecked::<String, _>("player_id")?,
            score: row.try_get_unchecked::<String, _>("score")?,
            explanation: row.try_get_unchecked::<Option<String>, _>("explanation")?,
            feedback: row.try_get_unchecked::<Option<String>, _>("feedback")?,
        })
    }
}

/// Untrusted input for a score submission.
#[derive(Clone, Default, Deserialize, Debug)]
#[serde(crate = "rocket::serde")]
pub struct GameScoreDraft {
    pub game_id: Option<GameId>,
    pub player_id: Option<String>,
    pub score: Option<String>,
    pub explanation: Option<String>,
    pub feedback: Option<String>,
}

impl Columns for GameScoreDraft {
    const COLUMNS: &'static [&'static str] =
        &["game_id", "player_id", "score", "explanation", "feedback"];
}

/// Form submission of a score. The browser client appends its hidden
/// `player_id` and `game_id` inputs on every round, so fields may repeat.
/// The first value wins.
#[derive(Clone, Default, FromForm, Debug)]
pub struct GameScoreForm {
    pub game_id: Vec<String>,
    pub player_id: Vec<String>,
    pub score: Vec<String>,
    pub explanation: Vec<String>,
    pub feedback: Vec<String>,
}

impl GameScoreForm {
    pub fn into_draft(self) -> RequestResult<GameScoreDraft> {
        let game_id = first(self.game_id)
            .map(|game_id| {
                game_id
                    .trim()
                    .parse::<GameId>()
                    .map_err(|_| RequestError::MalformedBody {
                        reason: format!("game_id {:?} is not an integer", game_id),
                    })
            })
            .transpose()?;

        Ok(GameScoreDraft {
            game_id,
            player_id: first(self.player_id),
            score: first(self.score),
            explanation: first(self.explanation),
            feedback: first(self.feedback),
        })
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct NewGameScore {
    pub game_id: GameId,
    pub player_id: String,
    pub score: String,
    pub explanation: Option<String>,
    pub feedback: Option<String>,
}

impl GameScoreDraft {
    pub fn validate(self) -> RequestResult<NewGameScore> {
        let game_id = self.game_id.ok_or(RequestError::MissingField { field: "game_id" })?;
        Ok(NewGameScore {
            game_id,
            player_id: required("player_id", self.player_id, PLAYER_ID_LEN)?,
            score: required("score", self.score, SCORE_LEN)?,
            explanation: self
                .explanation
                .map(|value| bounded("explanation", value, EXPLANATION_LEN))
                .transpose()?,
            feedback: self
                .feedback
                .map(|value| bounded("feedback", value, FEEDBACK_LEN))
                .transpose()?,
        })
    }
}
