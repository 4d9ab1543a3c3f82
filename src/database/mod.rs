use rocket::serde::json::Json;
use rocket::{catch, get, post, FromForm, Request, State};
use sqlx::Row;

mod game;
mod projection;
mod request_error;
pub mod requests;
mod score;
mod store;

pub use game::{Game, GameDraft, GameForm, NewGame};
pub use projection::{project, Columns};
pub use request_error::*;
pub use score::{GameScore, GameScoreDraft, GameScoreForm, NewGameScore};
pub use store::{FoundGame, SavedGame, SavedGameScore, Store};

pub type DatabasePool = sqlx::any::AnyPool;
pub type GameId = i32;
pub type ScoreId = i32;
