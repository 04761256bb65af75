#[macro_use]
extern crate rocket;

mod api;
mod catalogue;
mod db;
mod env;
mod error;
mod models;
mod schema;
mod stats;
mod telemetry;
#[cfg(test)]
mod test;
mod validation;

use rocket::{Build, Rocket};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use telemetry::TelemetryFairing;
use tracing::{error, info};

#[rocket::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init_tracing();
    if let Err(e) = env::load_environment() {
        error!("Failed to load environment files: {}", e);
    }

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite:fahrschul_tracker.db?mode=rwc".to_string());

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    schema::apply_schema(&pool).await?;

    let _ = init_rocket(pool).launch().await?;

    telemetry::shutdown_telemetry();
    Ok(())
}

pub fn init_rocket(pool: SqlitePool) -> Rocket<Build> {
    info!("Starting driving school tracker");

    rocket::build()
        .manage(pool)
        .mount(
            "/api",
            routes![
                api::health,
                api::training_categories,
                api::list_students,
                api::create_student,
                api::get_student,
                api::update_student,
                api::delete_student,
                api::update_fahrten,
                api::add_practice_hour,
                api::remove_practice_hour,
                api::upsert_progress,
                api::list_progress,
                api::update_progress,
                api::overall_progress,
                api::progress_stats,
                api::create_note,
                api::list_notes,
                api::delete_note,
                api::list_practice_hours,
                api::create_practice_hour,
                api::delete_practice_hour,
                api::create_status_check,
                api::list_status_checks,
            ],
        )
        .attach(TelemetryFairing)
}
