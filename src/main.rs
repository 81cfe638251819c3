use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dental_scheduler::commands::{self, Cli};
use dental_scheduler::config::Config;
use dental_scheduler::{i18n, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Logs go to stderr so command output stays pipeable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dental_scheduler=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    tracing::debug!(
        "Starting {} against {}",
        i18n::tr(Some(config.lang.as_str()), "app.name", None),
        config.api.base_url
    );

    let state = AppState::new(config).await?;

    match commands::run(&state, cli.command).await {
        Ok(output) => {
            println!("{}", output);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            tracing::debug!("Command failed: {:?}", e);
            eprintln!("{}", e.user_message(state.lang()));
            Ok(ExitCode::FAILURE)
        }
    }
}
