use std::process::ExitCode;

use anyhow::Context;
use env_logger::Env;
use log::info;

use herc_reader::{
    core::repository::sqlite::SqliteJobRepository,
    people::{configuration, run_import_user_job},
    settings::Settings,
};

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let settings = Settings::load().context("unable to load settings")?;
    info!("Starting with {:?}", settings);

    let pool = configuration::connect(&settings.database_url)
        .await
        .with_context(|| format!("unable to open {}", settings.database_url))?;

    if settings.initialize_schema {
        configuration::initialize_schema(&pool)
            .await
            .context("unable to initialize the schema")?;
    }

    let repository = SqliteJobRepository::new(&pool);
    repository.initialize()?;

    let execution = run_import_user_job(&settings.resources_dir, &pool, &repository)?;

    pool.close().await;

    if execution.is_completed() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
