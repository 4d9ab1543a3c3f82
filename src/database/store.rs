use std::collections::BTreeMap;
use std::str::FromStr;

use rand::seq::SliceRandom;
use rocket::serde::json::Value;
use rocket::serde::{Deserialize, Serialize};
use sqlx::any::{AnyConnectOptions, AnyKind, AnyPoolOptions};

use super::*;

/// Response to a successful game submission.
#[derive(Clone, Serialize, Deserialize, PartialEq, Debug)]
#[serde(crate = "rocket::serde")]
pub struct SavedGame {
    pub id: GameId,
    pub player_id: String,
}

/// Response to a successful score submission.
#[derive(Clone, Serialize, Deserialize, PartialEq, Debug)]
#[serde(crate = "rocket::serde")]
pub struct SavedGameScore {
    pub id: ScoreId,
    pub player_id: String,
    pub game_id: GameId,
}

/// Response to a matchmaking query.
/// `game` is only present when `status` is true.
#[derive(Clone, Serialize, Deserialize, PartialEq, Debug)]
#[serde(crate = "rocket::serde")]
pub struct FoundGame {
    pub status: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game: Option<BTreeMap<String, Value>>,
}

impl From<Option<Game>> for FoundGame {
    fn from(game: Option<Game>) -> Self {
        Self {
            status: game.is_some(),
            game: game.map(|game| game.to_fields()),
        }
    }
}

/// Handle to the relational store holding games and their scores.
/// Every operation runs in its own transaction.
pub struct Store {
    pool: DatabasePool,
    kind: AnyKind,
}

impl Store {
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let options = AnyConnectOptions::from_str(database_url)?;
        let kind = options.kind();
        let pool = AnyPoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;
        Ok(Self { pool, kind })
    }

    #[cfg(test)]
    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }

    /// Creates the `games` and `game_scores` tables if they are missing.
    pub async fn create_schema(&self) -> Result<(), sqlx::Error> {
        let (games, game_scores) = match self.kind {
            AnyKind::Postgres => (
                "CREATE TABLE IF NOT EXISTS games (
                    id SERIAL PRIMARY KEY,
                    player_id VARCHAR(32) NOT NULL,
                    name VARCHAR(64) NOT NULL,
                    description VARCHAR(256) NOT NULL,
                    scoring VARCHAR(256) NOT NULL,
                    timestamp TIMESTAMPTZ DEFAULT CURRENT_TIMESTAMP
                )",
                "CREATE TABLE IF NOT EXISTS game_scores (
                    id SERIAL PRIMARY KEY,
                    game_id INTEGER NOT NULL REFERENCES games (id),
                    player_id VARCHAR(32) NOT NULL,
                    score VARCHAR(32) NOT NULL,
                    explanation VARCHAR(256),
                    feedback VARCHAR(256)
                )",
            ),
            AnyKind::Sqlite => (
                "CREATE TABLE IF NOT EXISTS games (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    player_id VARCHAR(32) NOT NULL,
                    name VARCHAR(64) NOT NULL,
                    description VARCHAR(256) NOT NULL,
                    scoring VARCHAR(256) NOT NULL,
                    timestamp TIMESTAMP DEFAULT CURRENT_TIMESTAMP
                )",
                "CREATE TABLE IF NOT EXISTS game_scores (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    game_id INTEGER NOT NULL REFERENCES games (id),
                    player_id VARCHAR(32) NOT NULL,
                    score VARCHAR(32) NOT NULL,
                    explanation VARCHAR(256),
                    feedback VARCHAR(256)
                )",
            ),
        };

        sqlx::query(games).execute(&self.pool).await?;
        sqlx::query(game_scores).execute(&self.pool).await?;
        log::info!("database schema is ready");
        Ok(())
    }

    /// Saves a game for its creator. A player keeps at most one game:
    /// if they already have one, that row is overwritten in place and keeps its id,
    /// so scores recorded against it stay attached.
    pub async fn save_game(&self, game: NewGame) -> RequestResult<SavedGame> {
        let mut transaction = self.pool.begin().await?;

        // Writing before any plain read lets SQLite take the write lock up front,
        // so concurrent saves wait for each other instead of failing
        let replaced = sqlx::query(
            "UPDATE games SET name = $2, description = $3, scoring = $4
            WHERE id = (SELECT MIN(id) FROM games WHERE player_id = $1)
            RETURNING id",
        )
        .bind(game.player_id.as_str())
        .bind(game.name.as_str())
        .bind(game.description.as_str())
        .bind(game.scoring.as_str())
        .fetch_optional(&mut transaction)
        .await?;

        let id = match replaced {
            Some(row) => {
                let id = row.try_get_unchecked::<GameId, _>("id")?;
                log::info!("player {} replaced game {}", game.player_id, id);
                id
            }
            None => {
                let row = sqlx::query(
                    "INSERT INTO games (player_id, name, description, scoring) VALUES ($1, $2, $3, $4) RETURNING id",
                )
                .bind(game.player_id.as_str())
                .bind(game.name.as_str())
                .bind(game.description.as_str())
                .bind(game.scoring.as_str())
                .fetch_one(&mut transaction)
                .await?;
                let id = row.try_get_unchecked::<GameId, _>("id")?;
                log::info!("player {} created game {}", game.player_id, id);
                id
            }
        };

        transaction.commit().await?;

        Ok(SavedGame {
            id,
            player_id: game.player_id,
        })
    }

    /// Records a score. Every submission creates a new row.
    pub async fn save_game_score(&self, score: NewGameScore) -> RequestResult<SavedGameScore> {
        let mut transaction = self.pool.begin().await?;

        // Foreign keys are not enforced by every backend, so the insert checks the game itself
        let row = sqlx::query(
            "INSERT INTO game_scores (game_id, player_id, score, explanation, feedback)
            SELECT $1, $2, $3, $4, $5
            WHERE EXISTS (SELECT 1 FROM games WHERE id = $1)
            RETURNING id",
        )
        .bind(score.game_id)
        .bind(score.player_id.as_str())
        .bind(score.score.as_str())
        .bind(score.explanation.clone())
        .bind(score.feedback.clone())
        .fetch_optional(&mut transaction)
        .await?;

        let id = match row {
            Some(row) => row.try_get_unchecked::<ScoreId, _>("id")?,
            None => {
                return Err(RequestError::NoSuchGame {
                    game_id: score.game_id,
                })
            }
        };

        transaction.commit().await?;
        log::info!(
            "saved score {} for game {} by player {}",
            id,
            score.game_id,
            score.player_id
        );

        Ok(SavedGameScore {
            id,
            player_id: score.player_id,
            game_id: score.game_id,
        })
    }

    /// Picks a random game that `player_id` neither created nor scored yet.
    pub async fn find_game_to_play(&self, player_id: &str) -> RequestResult<Option<Game>> {
        let mut transaction = self.pool.begin().await?;

        let rows = sqlx::query(&format!(
            "SELECT {} FROM games WHERE player_id <> $1 AND NOT EXISTS (
                SELECT 1 FROM game_scores
                WHERE game_scores.game_id = games.id AND game_scores.player_id = $1
            )",
            game_select_list()
        ))
        .bind(player_id)
        .fetch_all(&mut transaction)
        .await?;

        transaction.commit().await?;

        let eligible = rows
            .iter()
            .map(Game::from_row)
            .collect::<Result<Vec<_>, _>>()?;
        log::debug!(
            "{} games are eligible for player {}",
            eligible.len(),
            player_id
        );

        Ok(choose(eligible))
    }

    pub async fn game(&self, game_id: GameId) -> RequestResult<Option<Game>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM games WHERE id = $1",
            game_select_list()
        ))
        .bind(game_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(Game::from_row).transpose()?)
    }

    /// Scores recorded for a game, oldest first.
    pub async fn scores_for_game(&self, game_id: GameId) -> RequestResult<Vec<GameScore>> {
        if self.game(game_id).await?.is_none() {
            return Err(RequestError::NoSuchGame { game_id });
        }

        let rows = sqlx::query(&format!(
            "SELECT {} FROM game_scores WHERE game_id = $1 ORDER BY id",
            GameScore::select_list()
        ))
        .bind(game_id)
        .fetch_all(&self.pool)
        .await?;

        let scores = rows
            .iter()
            .map(GameScore::from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(scores)
    }
}

/// Column list for games, with the timestamp rendered as text
/// since the `Any` driver cannot decode timestamps.
fn game_select_list() -> String {
    Game::COLUMNS
        .iter()
        .map(|&column| match column {
            "timestamp" => "CAST(timestamp AS TEXT) AS timestamp".to_owned(),
            column => column.to_owned(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn choose(games: Vec<Game>) -> Option<Game> {
    games.choose(&mut rand::thread_rng()).cloned()
}
