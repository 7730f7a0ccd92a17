use std::time::Duration;

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter, Layer, Registry};

use crate::config::BotConfig;
use crate::discord::bot::TriviaBot;
use crate::store::TriviaStore;

mod config;
mod discord;
mod matcher;
mod store;

/// How long a user has to answer once the question is published.
pub(crate) const ANSWER_TIMEOUT: Duration = Duration::from_secs(30);
/// Minimum similarity ratio for a fuzzy answer match.
pub(crate) const MATCH_THRESHOLD: f64 = 0.75;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (_file_guard, _stdout_guard) = init_logging();

    let config = BotConfig::from_env()?;
    let store = TriviaStore::load(config.scores_path.clone(), config.questions_path.clone());

    let mut bot = TriviaBot::new(store, &config).await?;
    bot.run().await
}

fn init_logging() -> (tracing_appender::non_blocking::WorkerGuard, tracing_appender::non_blocking::WorkerGuard) {
    let file_appender = tracing_appender::rolling::hourly("logs/", "winter_trivia.log");
    let (non_blocking, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::Layer::new()
        .compact()
        .with_ansi(false)
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .with_writer(non_blocking)
        .with_filter(LevelFilter::WARN);

    let (non_blocking, stdout_guard) = tracing_appender::non_blocking(std::io::stdout());
    let stdout_layer = tracing_subscriber::fmt::Layer::new()
        .compact()
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .with_writer(non_blocking)
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")));

    Registry::default().with(file_layer).with(stdout_layer).init();

    (file_guard, stdout_guard)
}
