use rocket::form::Form;
use rocket::http::Status;
use rocket::serde::json::serde_json::{self, json, Map, Value};

use super::*;

/// Builds a draft from a JSON object, keeping only the columns the draft declares.
fn draft_from_json<D>(object: Map<String, Value>) -> RequestResult<D>
where
    D: Columns + rocket::serde::DeserializeOwned,
{
    let fields = project::<D, _, _, _>(object).into_iter().collect();
    serde_json::from_value(Value::Object(fields)).map_err(|error| RequestError::MalformedBody {
        reason: error.to_string(),
    })
}

/// Creates a game for the submitting player,
/// or replaces the one they already have.
#[post("/save_game", data = "<form>", format = "form")]
pub async fn save_game(
    form: Form<GameForm>,
    store: &State<Store>,
) -> RequestResult<Json<SavedGame>> {
    let game = GameDraft::from(form.into_inner()).validate()?;
    Ok(Json(store.save_game(game).await?))
}

#[post("/save_game", data = "<object>", format = "json")]
pub async fn save_game_json(
    object: Json<Map<String, Value>>,
    store: &State<Store>,
) -> RequestResult<Json<SavedGame>> {
    let game = draft_from_json::<GameDraft>(object.into_inner())?.validate()?;
    Ok(Json(store.save_game(game).await?))
}

/// Records a new score for an existing game.
#[post("/save_game_score", data = "<form>", format = "form")]
pub async fn save_game_score(
    form: Form<GameScoreForm>,
    store: &State<Store>,
) -> RequestResult<Json<SavedGameScore>> {
    let score = form.into_inner().into_draft()?.validate()?;
    Ok(Json(store.save_game_score(score).await?))
}

#[post("/save_game_score", data = "<object>", format = "json")]
pub async fn save_game_score_json(
    object: Json<Map<String, Value>>,
    store: &State<Store>,
) -> RequestResult<Json<SavedGameScore>> {
    let score = draft_from_json::<GameScoreDraft>(object.into_inner())?.validate()?;
    Ok(Json(store.save_game_score(score).await?))
}

/// Picks a random game the player has neither created nor scored.
#[get("/find_game_to_play/<player_id>")]
pub async fn find_game_to_play(
    player_id: &str,
    store: &State<Store>,
) -> RequestResult<Json<FoundGame>> {
    let game = store.find_game_to_play(player_id).await?;
    Ok(Json(FoundGame::from(game)))
}

/// Lists every score recorded for a game.
#[get("/games/<game_id>/scores")]
pub async fn get_scores(
    game_id: GameId,
    store: &State<Store>,
) -> RequestResult<Json<Vec<GameScore>>> {
    Ok(Json(store.scores_for_game(game_id).await?))
}

/// Errors raised before a handler runs (unparseable bodies, unknown routes)
/// get the same JSON body as the handlers' own errors.
#[catch(default)]
pub fn json_error(status: Status, request: &Request<'_>) -> (Status, Json<Value>) {
    log::warn!(
        "{} {} failed: {}",
        request.method(),
        request.uri(),
        status
    );
    (status, Json(json!({ "error": status.reason_lossy() })))
}
