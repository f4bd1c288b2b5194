//! Herald notifier binary entrypoint.

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use herald_common::config::AppConfig;
use herald_common::redis_pool::create_redis_pool;
use herald_engine::queue::RedisDispatchQueue;
use herald_notifier::dispatcher::Dispatcher;
use herald_notifier::email::ResendEmailTransport;
use herald_notifier::telegram::TelegramBotTransport;
use herald_notifier::transport::{EmailTransport, TelegramTransport};
use herald_notifier::worker::DispatchWorker;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "herald_notifier=info,herald_engine=info".into()),
        )
        .json()
        .init();

    tracing::info!("Herald notifier starting...");

    // Load configuration
    let config = AppConfig::from_env()?;

    // Connect to Redis
    let redis = create_redis_pool(&config.redis_url).await?;
    let queue = Arc::new(RedisDispatchQueue::new(
        redis,
        config.dispatch_queue_key.clone(),
    ));

    // Build channel transports
    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()?;

    let email: Option<Arc<dyn EmailTransport>> =
        match (&config.resend_api_key, &config.email_from) {
            (Some(key), Some(from)) => Some(Arc::new(ResendEmailTransport::new(
                client.clone(),
                config.resend_api_url.clone(),
                key.clone(),
                from.clone(),
            ))),
            _ => {
                tracing::warn!("RESEND_API_KEY or EMAIL_FROM not set; email delivery disabled");
                None
            }
        };

    let telegram: Option<Arc<dyn TelegramTransport>> = match &config.telegram_bot_token {
        Some(token) => Some(Arc::new(TelegramBotTransport::new(
            client.clone(),
            config.telegram_api_url.clone(),
            token.clone(),
        ))),
        None => {
            tracing::warn!("TELEGRAM_BOT_TOKEN not set; Telegram delivery disabled");
            None
        }
    };

    let mut worker = DispatchWorker::new(
        queue,
        Dispatcher::new(email, telegram),
        config.worker_poll_interval_ms,
        config.worker_batch_size,
    );

    // Stop claiming on Ctrl+C; sends already claimed still finish
    worker
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
            tracing::info!("Received shutdown signal, stopping gracefully...");
        })
        .await;

    tracing::info!("Herald notifier stopped.");
    Ok(())
}
