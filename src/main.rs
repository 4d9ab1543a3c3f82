use rocket::fairing::{self, AdHoc};
use rocket::fs::{FileServer, NamedFile};
use rocket::http::{ContentType, Header, Status};
use rocket::{catchers, get, routes, Build, Request, Response, Rocket, State};

mod config;
mod database;

use crate::config::{Config, ConfigError};
use crate::database::{requests, Store};

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("server error: {0}")]
    Rocket(#[from] rocket::Error),
}

#[rocket::main]
async fn main() -> Result<(), ServerError> {
    let config = Config::from_env()?;
    let _ = rocket(config).launch().await?;
    Ok(())
}

pub fn rocket(config: Config) -> Rocket<Build> {
    let database_url = config.database_url.clone();
    let max_connections = config.max_connections;

    rocket::custom(config.figment())
        .attach(AdHoc::try_on_ignite("Game store", move |rocket| {
            open_store(rocket, database_url, max_connections)
        }))
        .attach(AdHoc::on_ignite("Static files", mount_static_files))
        .attach(AdHoc::on_response("Unity build encoding", |request, response| {
            Box::pin(async move { mark_unity_build(request, response) })
        }))
        .register("/", catchers![requests::json_error])
        .mount(
            "/",
            routes![
                index,
                requests::save_game,
                requests::save_game_json,
                requests::save_game_score,
                requests::save_game_score_json,
                requests::find_game_to_play,
                requests::get_scores,
            ],
        )
        .manage(config)
}

/// Connects to the database and makes sure the tables exist.
async fn open_store(
    rocket: Rocket<Build>,
    database_url: String,
    max_connections: u32,
) -> fairing::Result {
    let store = match Store::connect(&database_url, max_connections).await {
        Ok(store) => store,
        Err(error) => {
            log::error!("failed to connect to the database: {}", error);
            return Err(rocket);
        }
    };

    if let Err(error) = store.create_schema().await {
        log::error!("failed to create the database schema: {}", error);
        return Err(rocket);
    }

    Ok(rocket.manage(store))
}

async fn mount_static_files(rocket: Rocket<Build>) -> Rocket<Build> {
    let static_dir = match rocket.state::<Config>() {
        Some(config) => config.static_dir.clone(),
        None => return rocket,
    };

    if !static_dir.is_dir() {
        log::warn!(
            "static directory {} does not exist, serving the API only",
            static_dir.display()
        );
        return rocket;
    }

    rocket.mount("/", FileServer::from(static_dir).rank(20))
}

/// Unity WebGL builds ship pre-gzipped `.unityweb` files and
/// expect the browser to inflate them.
fn mark_unity_build(request: &Request<'_>, response: &mut Response<'_>) {
    if response.status() == Status::Ok && request.uri().path().as_str().ends_with(".unityweb") {
        response.set_header(ContentType::Binary);
        response.set_header(Header::new("Content-Encoding", "gzip"));
    }
}

#[get("/")]
async fn index(config: &State<Config>) -> Option<NamedFile> {
    NamedFile::open(config.static_dir.join("index.html"))
        .await
        .ok()
}
