use std::sync::Arc;

use backend::{
    catchers::{bad_request, internal_error, not_found, unauthorized, unprocessable_entity},
    cors::CORS,
    queries::PgStore,
    routes::{all_options, cast_vote, create_poll, get_poll, list_polls, login, register, AppState},
    store::{MemoryStore, PollStore},
};
use include_dir::{include_dir, Dir};
use rocket::{catchers, fs::NamedFile, routes};
use sqlx::postgres::PgPoolOptions;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

static STATIC_DIR: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/static");

#[rocket::get("/<path..>")]
async fn spa_handler(path: std::path::PathBuf, temp_dir: &rocket::State<std::path::PathBuf>) -> Option<NamedFile> {
    let file_path = temp_dir.join(&path);
    if file_path.exists() && file_path.is_file() {
        NamedFile::open(&file_path).await.ok()
    } else {
        NamedFile::open(temp_dir.join("index.html")).await.ok()
    }
}

async fn build_store() -> Result<Arc<dyn PollStore>, Box<dyn std::error::Error>> {
    match std::env::var("DATABASE_URL") {
        Ok(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(&url)
                .await?;
            sqlx::migrate!("./migrations").run(&pool).await?;
            info!("Migrations complete");
            Ok(Arc::new(PgStore::new(pool)))
        }
        Err(_) => {
            warn!("DATABASE_URL not set - polls will be kept in memory only");
            Ok(Arc::new(MemoryStore::default()))
        }
    }
}

#[rocket::main]
async fn main() -> Result<(), rocket::Error> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting poll server");

    let store = match build_store().await {
        Ok(store) => store,
        Err(e) => {
            error!("Failed to initialize storage: {e}");
            std::process::exit(1);
        }
    };

    let temp_dir = std::env::temp_dir().join(format!("poll_static_{}", Uuid::new_v4()));
    std::fs::create_dir_all(&temp_dir).expect("Failed to create temp directory");
    STATIC_DIR.extract(&temp_dir).expect("Failed to extract static files");

    let _rocket = rocket::build()
        .attach(CORS)
        .manage(AppState::new(store))
        .manage(temp_dir)
        .mount(
            "/api",
            routes![
                register,
                login,
                create_poll,
                list_polls,
                get_poll,
                cast_vote,
                all_options
            ],
        )
        .mount("/", routes![spa_handler])
        .register(
            "/",
            catchers![
                bad_request,
                unauthorized,
                not_found,
                unprocessable_entity,
                internal_error
            ],
        )
        .launch()
        .await?;

    Ok(())
}
