/// Pupmatch - dog adoption matching service
///
/// Users register, set adoption preferences and swipe through dogs one at a
/// time, marking each liked, disliked or undecided.

mod account;
mod api;
mod auth;
mod catalog;
mod config;
mod context;
mod db;
mod error;
mod jobs;
mod ledger;
mod matching;
mod metrics;
mod preference;
mod rate_limit;
mod server;

use config::{LogFormat, LoggingConfig, ServerConfig};
use context::AppContext;
use error::AppResult;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> AppResult<()> {
    let config = ServerConfig::from_env()?;

    init_tracing(&config.logging);

    print_banner();

    let ctx = Arc::new(AppContext::new(config).await?);

    let scheduler = Arc::new(jobs::JobScheduler::new(Arc::clone(&ctx)));
    scheduler.start();

    server::serve((*ctx).clone()).await?;

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_new(&logging.level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    match logging.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
    }
}

fn print_banner() {
    println!(
        r#"
     ____              __  ___      __       __
    / __ \__  ______  /  |/  /___ _/ /______/ /_
   / /_/ / / / / __ \/ /|_/ / __ `/ __/ ___/ __ \
  / ____/ /_/ / /_/ / /  / / /_/ / /_/ /__/ / / /
 /_/    \__,_/ .___/_/  /_/\__,_/\__/\___/_/ /_/
            /_/
        Dog adoption matching v{}
        "#,
        env!("CARGO_PKG_VERSION")
    );
}
